pub mod config;
pub mod engine;
pub mod filter;
pub mod validation;

pub use config::*;
pub use engine::{CompositeScore, ElectiveScore, ParentScore, ScoreAggregator};
pub use filter::{FilterToken, NormalizedFilter, SubjectFilter};
pub use validation::validate_scoring;
