// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod assignment;
pub mod notifications;
pub mod password;
pub mod ward_tasks;
pub mod wards;

pub use assignment::{AssignmentResolver, ReconcileSummary};
pub use notifications::{EmailMessage, EmailSender, NotificationSummary, ResendMailer};
pub use ward_tasks::{StatusUpdate, TaskStatusView, TaskView, WardDayStatus, WardTaskManager};
pub use wards::{WardRegistry, WardRegistryError};
