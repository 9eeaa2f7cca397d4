use serde::{Deserialize, Serialize};

/// Section name used for the always-attempted part of a subject when none is configured.
pub const DEFAULT_COMMON_SECTION: &str = "공통";

/// Subject hierarchy used for scoring.
///
/// Lists every parent subject with its point maximum and, where the exam
/// offers them, its electives. The order of `subjects` is the order used in
/// breakdowns and reports.
///
/// Example YAML:
/// ```yaml
/// subjects:
///   - name: 국어
///     max_score: 100
///     common: 공통
///     common_max: 76
///     electives: [화작, 언매]
///   - name: 영어
///     max_score: 100
///   - name: 탐구
///     max_score: 100
///     grouped: true
///     single_max: 50
///     electives: [물리1, 화학1]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SubjectHierarchy {
    pub subjects: Vec<SubjectConfig>,
}

/// One parent subject.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SubjectConfig {
    pub name: String,

    /// Composite maximum of the whole parent
    pub max_score: f64,

    /// Name of the common section (default: "공통")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<String>,

    /// Maximum of the common section; the electives carry the rest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_max: Option<f64>,

    /// Elective names, empty for sectionless subjects
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub electives: Vec<String>,

    /// Electives are independent sub-exams (no common section)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub grouped: bool,

    /// Maximum when exactly one grouped elective is in scope (default: half of `max_score`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_max: Option<f64>,
}

/// How a parent subject combines its sections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubjectKind<'a> {
    /// A single sheet where section == subject
    Sectionless,
    /// Common section plus one chosen elective
    CommonElective { common: &'a str, common_max: f64 },
    /// Independent sub-exams: raw score for one, doubled average for two or more
    Grouped { single_max: f64 },
}

impl SubjectConfig {
    pub fn sectionless(name: &str, max_score: f64) -> Self {
        Self {
            name: name.to_string(),
            max_score,
            common: None,
            common_max: None,
            electives: vec![],
            grouped: false,
            single_max: None,
        }
    }

    pub fn common_elective(name: &str, max_score: f64, common_max: f64, electives: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            max_score,
            common: Some(DEFAULT_COMMON_SECTION.to_string()),
            common_max: Some(common_max),
            electives: electives.iter().map(|e| e.to_string()).collect(),
            grouped: false,
            single_max: None,
        }
    }

    pub fn grouped(name: &str, max_score: f64, single_max: f64, electives: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            max_score,
            common: None,
            common_max: None,
            electives: electives.iter().map(|e| e.to_string()).collect(),
            grouped: true,
            single_max: Some(single_max),
        }
    }

    pub fn kind(&self) -> SubjectKind<'_> {
        if self.grouped {
            SubjectKind::Grouped {
                single_max: self.single_max.unwrap_or(self.max_score / 2.0),
            }
        } else if self.electives.is_empty() {
            SubjectKind::Sectionless
        } else {
            SubjectKind::CommonElective {
                common: self.common.as_deref().unwrap_or(DEFAULT_COMMON_SECTION),
                common_max: self.common_max.unwrap_or(0.0),
            }
        }
    }

    pub fn has_elective(&self, elective: &str) -> bool {
        self.electives.iter().any(|e| e == elective)
    }
}

impl Default for SubjectHierarchy {
    /// The 2026 CSAT layout
    fn default() -> Self {
        Self {
            subjects: vec![
                SubjectConfig::common_elective("국어", 100.0, 76.0, &["화작", "언매"]),
                SubjectConfig::common_elective("수학", 100.0, 74.0, &["확통", "미적", "기하"]),
                SubjectConfig::sectionless("영어", 100.0),
                SubjectConfig::sectionless("한국사", 50.0),
                SubjectConfig::grouped("탐구", 100.0, 50.0, &["물리1", "화학1", "생명1", "사회문화"]),
            ],
        }
    }
}

impl SubjectHierarchy {
    pub fn get(&self, name: &str) -> Option<&SubjectConfig> {
        self.subjects.iter().find(|s| s.name == name)
    }

    /// Sum of every parent maximum
    pub fn max_score(&self) -> f64 {
        self.subjects.iter().map(|s| s.max_score).sum()
    }

    /// Every token accepted by a subject filter, in hierarchy order
    pub fn filter_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        for subject in &self.subjects {
            tokens.push(subject.name.clone());
            for elective in &subject.electives {
                tokens.push(format!("{}-{}", subject.name, elective));
            }
        }
        tokens
    }
}
