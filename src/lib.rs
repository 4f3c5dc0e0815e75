//! ManageBac Assignment Checker Library
//!
//! Logs into a ManageBac portal, extracts the task list, classifies it by
//! status and urgency, and renders reports (plus an optional email digest).

pub mod analysis;
pub mod classify;
pub mod config;
pub mod due_date;
pub mod logger;
pub mod notify;
pub mod report;
pub mod runner;
pub mod scrapers;
pub mod sorter;
pub mod storage;
pub mod types;

pub use types::*;
