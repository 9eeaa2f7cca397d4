pub mod config;
pub mod engine;
pub mod price;

pub use config::{validate_efficiency, EfficiencyWeights};
pub use engine::{rank_by_efficiency, CostCalculator, CostRow};
pub use price::PriceTable;
