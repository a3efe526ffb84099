// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wardwatch: municipal waste pickup tracking
//!
//! This crate provides the backend API for citizen waste reports, per-ward
//! collector assignment and daily ward pickup tasks.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{AssignmentResolver, EmailSender, WardRegistry, WardTaskManager};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub wards: Arc<WardRegistry>,
    pub mailer: Arc<dyn EmailSender>,
}

impl AppState {
    pub fn assignment_resolver(&self) -> AssignmentResolver {
        AssignmentResolver::new(self.db.clone())
    }

    pub fn ward_task_manager(&self) -> WardTaskManager {
        WardTaskManager::new(self.db.clone(), self.wards.clone(), self.mailer.clone())
    }
}
