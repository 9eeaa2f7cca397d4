use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Answer value recorded when the model gave no answer or gave up.
pub const NO_ANSWER: i64 = -1;

/// Per-token pricing in dollars per 1M tokens.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
pub struct Price {
    pub input: f64,
    pub output: f64,
}

/// Grading of a single exam question.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct QuestionResult {
    #[serde(alias = "questionNumber")]
    pub question_number: u32,
    #[serde(alias = "isCorrect")]
    pub is_correct: bool,
    pub points: f64,
    #[serde(alias = "extractedAnswer", default = "no_answer")]
    pub extracted_answer: i64,
    #[serde(alias = "correctAnswer")]
    pub correct_answer: i64,
}

fn no_answer() -> i64 {
    NO_ANSWER
}

impl QuestionResult {
    /// Whether the model committed to an answer at all
    pub fn answered(&self) -> bool {
        self.extracted_answer != NO_ANSWER
    }
}

/// One model's result on one subject/section sheet.
///
/// Mirrors the exported dataset format. Bookkeeping fields written by the
/// export tooling are optional and unknown fields are ignored.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResultRecord {
    #[serde(alias = "model_name")]
    pub model: String,
    pub subject: String,
    pub section: String,
    pub score: f64,
    #[serde(alias = "totalPoints", default)]
    pub total_points: f64,
    #[serde(default)]
    pub results: Vec<QuestionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
}

impl ResultRecord {
    /// Number of questions graded correct
    pub fn correct_count(&self) -> usize {
        self.results.iter().filter(|q| q.is_correct).count()
    }

    /// Sum of points over correctly answered questions
    pub fn earned_points(&self) -> f64 {
        self.results
            .iter()
            .filter(|q| q.is_correct)
            .map(|q| q.points)
            .sum()
    }

    /// Sum of points over all questions on the sheet
    pub fn question_points(&self) -> f64 {
        self.results.iter().map(|q| q.points).sum()
    }

    /// Fraction of questions answered correctly, 0 for an empty sheet
    pub fn accuracy(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            self.correct_count() as f64 / self.results.len() as f64
        }
    }

    /// Number of questions the model left without an answer
    pub fn unanswered_count(&self) -> usize {
        self.results.iter().filter(|q| !q.answered()).count()
    }

    /// Sheet key in "subject-section" form, or the bare subject for sectionless sheets
    pub fn sheet_key(&self) -> String {
        if self.section.is_empty() || self.section == self.subject {
            self.subject.clone()
        } else {
            format!("{}-{}", self.subject, self.section)
        }
    }
}

/// Token counts recorded for one section key.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
pub struct SectionTokens {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Token usage of one model across the whole exam.
///
/// `sections` keys follow the sheet grammar: "parent-child" or a bare "parent".
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TokenUsage {
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<BTreeMap<String, SectionTokens>>,
}

/// Token usage keyed by model identifier
pub type TokenUsageMap = BTreeMap<String, TokenUsage>;

/// Split a sheet name or filter token into (subject, section).
///
/// "국어-공통" -> ("국어", "공통"), "영어" -> ("영어", "영어")
pub fn split_sheet_name(name: &str) -> (&str, &str) {
    match name.split_once('-') {
        Some((subject, section)) => (subject.trim(), section.trim()),
        None => (name.trim(), name.trim()),
    }
}

/// Model identifiers in first-seen order
pub fn discover_models(records: &[ResultRecord]) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    for record in records {
        if !models.iter().any(|m| m == &record.model) {
            models.push(record.model.clone());
        }
    }
    models
}

/// One model's standing on a sheet, as listed by the `models` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetModel {
    pub model: String,
    pub accuracy: f64,
    pub unanswered: usize,
}

/// Models with a record on one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetModels {
    pub sheet: String,
    pub models: Vec<SheetModel>,
}

/// Group models by sheet key, sheets and models in first-seen order.
///
/// With `sheet`, only that sheet is listed. A duplicate record for the same
/// model and sheet is skipped, matching the first-record-wins rule of scoring.
pub fn models_by_sheet(records: &[ResultRecord], sheet: Option<&str>) -> Vec<SheetModels> {
    let mut groups: Vec<SheetModels> = Vec::new();

    for record in records {
        let key = record.sheet_key();
        if sheet.is_some_and(|s| s != key) {
            continue;
        }

        let index = match groups.iter().position(|g| g.sheet == key) {
            Some(index) => index,
            None => {
                groups.push(SheetModels {
                    sheet: key,
                    models: Vec::new(),
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[index];
        if group.models.iter().any(|m| m.model == record.model) {
            continue;
        }
        group.models.push(SheetModel {
            model: record.model.clone(),
            accuracy: record.accuracy(),
            unanswered: record.unanswered_count(),
        });
    }

    groups
}

/// Records whose sheet key equals `sheet`
pub fn records_on_sheet(records: &[ResultRecord], sheet: &str) -> Vec<ResultRecord> {
    records
        .iter()
        .filter(|r| r.sheet_key() == sheet)
        .cloned()
        .collect()
}
