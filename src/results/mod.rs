pub mod audit;
pub mod loader;
pub mod types;

pub use audit::audit_records;
pub use loader::{load_results, load_token_usage};
pub use types::{
    discover_models, models_by_sheet, records_on_sheet, split_sheet_name, Price,
    QuestionResult, ResultRecord, SectionTokens, SheetModel, SheetModels, TokenUsage,
    TokenUsageMap, NO_ANSWER,
};
