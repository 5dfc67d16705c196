//! Scoring engine for coach-driven volleyball player evaluations.
//!
//! Coaches record raw metric values per player and exercise; the engine normalizes them,
//! spreads them over weighted skills, rolls them up into skill, category and overall
//! scores, decides an outcome and derives badges.

pub mod config;
pub mod error;
pub mod evaluation;
pub mod telemetry;
