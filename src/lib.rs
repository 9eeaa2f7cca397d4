pub mod config;
pub mod cost;
pub mod output;
pub mod results;
pub mod scoring;
