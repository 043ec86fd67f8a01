//! quizgrade-core — Answer keys, field normalization, and grading.
//!
//! This crate defines the data model, the grading engine with its fuzzy
//! concept matcher, and the review orchestration that the rest of quizgrade
//! builds on. Tracker I/O is reached only through the [`traits::TaskTracker`]
//! trait.

pub mod engine;
pub mod error;
pub mod feedback;
pub mod grader;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod report;
pub mod results;
pub mod statistics;
pub mod traits;
