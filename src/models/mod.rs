// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod collector;
pub mod report;
pub mod user;
pub mod ward;
pub mod ward_task;

pub use collector::{Collector, CollectorProfile, CollectorStatus};
pub use report::{CollectorAssignment, Report, ReportStatus, ReportType};
pub use user::Resident;
pub use ward::{WardNumber, WardSchedule};
pub use ward_task::{TaskStatus, TransitionError, WardTask};
