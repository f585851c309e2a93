#![forbid(unsafe_code)]

//! Core domain model and business logic for mesoplan.
//!
//! This crate provides:
//! - Domain types (templates, progression schedules, compiled routines)
//! - Exercise catalog and program definition loading
//! - Equipment-aware load rounding and set expansion
//! - The plan compiler
//! - Idempotent synchronization with the remote routine service
//! - Weekly volume/frequency analysis

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod program;
pub mod rounding;
pub mod expand;
pub mod compiler;
pub mod remote;
pub mod retry;
pub mod resolver;
pub mod hash_cache;
pub mod sync;
pub mod analysis;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::Catalog;
pub use config::Config;
pub use program::{ten_rep_mesocycle, Program};
pub use compiler::PlanCompiler;
pub use remote::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
pub use retry::RetryPolicy;
pub use hash_cache::RoutineHashCache;
pub use sync::{sync_with_config, SyncEngine, SyncReport, SyncSettings, UpsertOutcome};
pub use analysis::{analyze_week, MuscleReport};
