pub mod formatter;

pub use formatter::{
    format_cost, format_cost_table, format_cost_tsv, format_detail, format_models, format_score,
    format_score_table, format_score_tsv, format_subjects, format_tokens, should_use_colors,
};
