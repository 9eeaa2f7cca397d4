use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::cost::CostRow;
use crate::results::SheetModels;
use crate::scoring::{CompositeScore, SubjectHierarchy, SubjectKind};

const NO_RESULTS: &str = "No results found.";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score without a trailing ".0" (96, 87.5)
pub fn format_score(score: f64) -> String {
    let formatted = format!("{:.1}", score);
    formatted
        .strip_suffix(".0")
        .map(str::to_string)
        .unwrap_or(formatted)
}

/// Format a token count in compact notation (850, 1.2k, 3.4M)
pub fn format_tokens(tokens: u64) -> String {
    let value = tokens as f64;
    let formatted = if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        format!("{}", tokens)
    };

    // Trim trailing .0 (e.g., "1.0k" -> "1k")
    formatted.replace(".0M", "M").replace(".0k", "k")
}

/// Format a test cost in dollars, "-" when no cost is known
pub fn format_cost(row: &CostRow) -> String {
    if row.cost_known {
        format!("${:.2}", row.total_cost)
    } else {
        "-".to_string()
    }
}

/// Share of `max` in percent, 0 when `max` is not positive
fn percent(score: f64, max: f64) -> f64 {
    if max > 0.0 {
        score / max * 100.0
    } else {
        0.0
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a model name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn fit_name(name: &str, fixed_width: usize) -> String {
    match get_terminal_width() {
        Some(width) if width > fixed_width + 10 => truncate_name(name, width - fixed_width),
        Some(_) => truncate_name(name, 20),
        None => name.to_string(),
    }
}

/// Format ranked scores as a table: Index, Score/Max, Percent, Model
/// Index column: 3 chars (fits "99."), right-aligned
pub fn format_score_table(scores: &[CompositeScore], max_score: f64, use_colors: bool) -> String {
    if scores.is_empty() {
        return NO_RESULTS.to_string();
    }

    let max_str = format_score(max_score);
    let score_width = max_str.len().max(5);
    let separator = "  ";

    scores
        .iter()
        .enumerate()
        .map(|(idx, score)| {
            let index_str = format!("{:>2}.", idx + 1);
            let score_str = format!(
                "{:>width$}/{}",
                format_score(score.total),
                max_str,
                width = score_width
            );
            let pct_str = format!("{:>5.1}%", percent(score.total, max_score));

            let fixed_width = index_str.len() + 1 + score_str.len() + pct_str.len() + separator.len() * 2;
            let model = fit_name(&score.model, fixed_width);

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    score_str.bold(),
                    separator,
                    pct_str.cyan(),
                    separator,
                    model
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, score_str, separator, pct_str, separator, model
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format ranked scores as tab-separated values for scripting
/// Columns: total, model, then one total per parent subject (no headers, no colors)
pub fn format_score_tsv(scores: &[CompositeScore]) -> String {
    scores
        .iter()
        .map(|score| {
            let mut columns = vec![format_score(score.total), score.model.clone()];
            columns.extend(score.parents.iter().map(|p| format_score(p.total)));
            columns.join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a per-subject breakdown of one model (detail view)
pub fn format_detail(score: &CompositeScore, hierarchy: &SubjectHierarchy, use_colors: bool) -> String {
    let mut lines = Vec::new();

    if use_colors {
        lines.push(format!("{}", score.model.bold()));
    } else {
        lines.push(score.model.clone());
    }

    for parent in &score.parents {
        let Some(subject) = hierarchy.get(&parent.name) else {
            continue;
        };
        let max = format_score(subject.max_score);
        let total = format!("{}/{}", format_score(parent.total), max);

        let electives = parent
            .electives
            .iter()
            .map(|e| format!("{} {}", e.name, format_score(e.score)))
            .collect::<Vec<_>>()
            .join(", ");

        let parts = match subject.kind() {
            SubjectKind::Sectionless => String::new(),
            SubjectKind::CommonElective { common, .. } => format!(
                " ({} {} + elective avg {}; {})",
                common,
                format_score(parent.common),
                format_score(parent.elective_avg),
                electives
            ),
            SubjectKind::Grouped { .. } => format!(
                " (avg {}; {})",
                format_score(parent.elective_avg),
                electives
            ),
        };

        let total = if use_colors {
            format!("{}", total.bold())
        } else {
            total
        };
        lines.push(format!("  {}: {}{}", parent.name, total, parts));
    }

    lines.push(format!(
        "  Total: {}/{}",
        format_score(score.total),
        format_score(hierarchy.max_score())
    ));
    lines.join("\n")
}

/// Format cost rows as a table: Index, Efficiency, Cost, Tokens in/out, Score, Model
/// Rows without a known cost show "-" for efficiency and cost
pub fn format_cost_table(rows: &[CostRow], use_colors: bool) -> String {
    if rows.is_empty() {
        return NO_RESULTS.to_string();
    }

    let separator = "  ";

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let index_str = format!("{:>2}.", idx + 1);
            let efficiency_str = if row.cost_known {
                format!("{:>5.1}", row.efficiency)
            } else {
                format!("{:>5}", "-")
            };
            let cost_str = format!("{:>8}", format_cost(row));
            let tokens_str = format!(
                "{:>6}/{:<6}",
                format_tokens(row.input_tokens),
                format_tokens(row.output_tokens)
            );
            let score_str = format!("{:>6}", format_score(row.score));

            let fixed_width = index_str.len()
                + 1
                + efficiency_str.len()
                + cost_str.len()
                + tokens_str.len()
                + score_str.len()
                + separator.len() * 4;
            let model = fit_name(&row.model, fixed_width);

            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    efficiency_str.bold(),
                    separator,
                    cost_str.green(),
                    separator,
                    tokens_str.dimmed(),
                    separator,
                    score_str,
                    separator,
                    model
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}",
                    index_str,
                    efficiency_str,
                    separator,
                    cost_str,
                    separator,
                    tokens_str,
                    separator,
                    score_str,
                    separator,
                    model
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format cost rows as tab-separated values for scripting
/// Columns: efficiency, total_cost, input_tokens, output_tokens, score, model
pub fn format_cost_tsv(rows: &[CostRow]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{:.1}\t{:.4}\t{}\t{}\t{}\t{}",
                row.efficiency,
                row.total_cost,
                row.input_tokens,
                row.output_tokens,
                format_score(row.score),
                row.model
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// List models per sheet with their accuracy, flagging unanswered questions
pub fn format_models(groups: &[SheetModels], use_colors: bool) -> String {
    if groups.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut lines = Vec::new();
    for group in groups {
        let header = format!("{} ({} models)", group.sheet, group.models.len());
        if use_colors {
            lines.push(format!("{}", header.bold()));
        } else {
            lines.push(header);
        }

        for entry in &group.models {
            let accuracy = format!("{:>5.1}%", entry.accuracy * 100.0);
            let accuracy = if use_colors {
                format!("{}", accuracy.cyan())
            } else {
                accuracy
            };
            let line = match entry.unanswered {
                0 => format!("  {}  {}", accuracy, entry.model),
                n => format!("  {}  {} ({} unanswered)", accuracy, entry.model, n),
            };
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// List the subject hierarchy with maxima and accepted filter tokens
pub fn format_subjects(hierarchy: &SubjectHierarchy) -> String {
    let mut lines: Vec<String> = hierarchy
        .subjects
        .iter()
        .map(|subject| {
            let max = format_score(subject.max_score);
            match subject.kind() {
                SubjectKind::Sectionless => format!("{} (max {})", subject.name, max),
                SubjectKind::CommonElective { common, common_max } => format!(
                    "{} (max {}): {} {} + one of [{}]",
                    subject.name,
                    max,
                    common,
                    format_score(common_max),
                    subject.electives.join(", ")
                ),
                SubjectKind::Grouped { single_max } => format!(
                    "{} (max {}, single {}): [{}]",
                    subject.name,
                    max,
                    format_score(single_max),
                    subject.electives.join(", ")
                ),
            }
        })
        .collect();

    lines.push(format!("Total max: {}", format_score(hierarchy.max_score())));
    lines.push(format!("Filter tokens: {}", hierarchy.filter_tokens().join(", ")));
    lines.join("\n")
}
