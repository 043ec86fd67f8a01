//! quizgrade-tracker — Task tracker integrations.
//!
//! Implements the `TaskTracker` trait for Asana, plus an in-memory mock,
//! and loads the quizgrade configuration file.

pub mod asana;
pub mod config;
pub mod mock;

pub use config::{create_tracker, load_config, QuizgradeConfig, TrackerConfig};
pub use quizgrade_core::error::TrackerError;
