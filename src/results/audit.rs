use std::collections::HashSet;

use super::types::ResultRecord;
use crate::scoring::{SubjectHierarchy, SubjectKind};

const EPSILON: f64 = 1e-9;

/// Check the result dataset for consistency problems.
///
/// Nothing here is fatal for scoring: missing or odd sheets just score 0.
/// The returned issues are meant for a human looking after the dataset.
pub fn audit_records(records: &[ResultRecord], hierarchy: &SubjectHierarchy) -> Vec<String> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for record in records {
        let sheet = record.sheet_key();
        let prefix = format!("[{}] {}", sheet, record.model);

        if !is_known_sheet(record, hierarchy) {
            issues.push(format!("{}: sheet not in subject hierarchy", prefix));
        }

        if !seen.insert((record.model.as_str(), record.subject.as_str(), record.section.as_str())) {
            issues.push(format!("{}: duplicate record (first one is used)", prefix));
        }

        if record.score < 0.0 {
            issues.push(format!("{}: negative score {}", prefix, record.score));
        }

        if record.total_points > 0.0 && record.score > record.total_points + EPSILON {
            issues.push(format!(
                "{}: score {} exceeds total points {}",
                prefix, record.score, record.total_points
            ));
        }

        if record.results.is_empty() {
            continue;
        }

        let earned = record.earned_points();
        if (earned - record.score).abs() > EPSILON {
            issues.push(format!(
                "{}: score mismatch (recorded={}, from questions={})",
                prefix, record.score, earned
            ));
        }

        let possible = record.question_points();
        if record.total_points > 0.0 && (possible - record.total_points).abs() > EPSILON {
            issues.push(format!(
                "{}: total points mismatch (recorded={}, from questions={})",
                prefix, record.total_points, possible
            ));
        }

        if let Some(count) = record.correct_count {
            if count as usize != record.correct_count() {
                issues.push(format!(
                    "{}: correct count mismatch (recorded={}, from questions={})",
                    prefix,
                    count,
                    record.correct_count()
                ));
            }
        }

        if let Some(total) = record.total_questions {
            if total as usize != record.results.len() {
                issues.push(format!(
                    "{}: question count mismatch (recorded={}, found={})",
                    prefix,
                    total,
                    record.results.len()
                ));
            }
        }
    }

    issues
}

fn is_known_sheet(record: &ResultRecord, hierarchy: &SubjectHierarchy) -> bool {
    let section = record.section.as_str();

    if let Some(subject) = hierarchy.get(&record.subject) {
        return match subject.kind() {
            SubjectKind::Sectionless => section.is_empty() || section == subject.name,
            SubjectKind::CommonElective { common, .. } => {
                section == common || subject.has_elective(section)
            }
            SubjectKind::Grouped { .. } => subject.has_elective(section),
        };
    }

    // Grouped electives may be exported as standalone sheets
    record.subject == record.section
        && hierarchy.subjects.iter().any(|s| {
            matches!(s.kind(), SubjectKind::Grouped { .. }) && s.has_elective(&record.subject)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::QuestionResult;

    fn question(number: u32, is_correct: bool, points: f64) -> QuestionResult {
        QuestionResult {
            question_number: number,
            is_correct,
            points,
            extracted_answer: if is_correct { 2 } else { -1 },
            correct_answer: 2,
        }
    }

    fn record(subject: &str, section: &str, score: f64, total_points: f64) -> ResultRecord {
        ResultRecord {
            model: "GPT-5.1".to_string(),
            subject: subject.to_string(),
            section: section.to_string(),
            score,
            total_points,
            results: vec![],
            price: None,
            sheet_name: None,
            correct_count: None,
            total_questions: None,
        }
    }

    #[test]
    fn test_clean_dataset() {
        let mut r = record("국어", "공통", 5.0, 7.0);
        r.results = vec![question(1, true, 2.0), question(2, true, 3.0), question(3, false, 2.0)];
        r.correct_count = Some(2);
        r.total_questions = Some(3);
        let records = vec![
            r,
            record("영어", "영어", 90.0, 100.0),
            record("탐구", "물리1", 40.0, 50.0),
            record("화학1", "화학1", 30.0, 50.0),
        ];
        let issues = audit_records(&records, &SubjectHierarchy::default());
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
    }

    #[test]
    fn test_unknown_sheet() {
        let records = vec![record("국어", "독서", 10.0, 24.0), record("과학", "과학", 10.0, 50.0)];
        let issues = audit_records(&records, &SubjectHierarchy::default());
        assert_eq!(issues.len(), 2);
        assert!(issues[0].starts_with("[국어-독서] GPT-5.1"));
        assert!(issues[1].contains("not in subject hierarchy"));
    }

    #[test]
    fn test_score_mismatch() {
        let mut r = record("수학", "공통", 10.0, 5.0);
        r.results = vec![question(1, true, 2.0), question(2, false, 3.0)];
        let issues = audit_records(&[r], &SubjectHierarchy::default());
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("exceeds total points"));
        assert!(issues[1].contains("score mismatch (recorded=10, from questions=2)"));
    }

    #[test]
    fn test_total_points_mismatch() {
        let mut r = record("수학", "공통", 2.0, 100.0);
        r.results = vec![question(1, true, 2.0), question(2, false, 3.0)];
        let issues = audit_records(&[r], &SubjectHierarchy::default());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("total points mismatch"));
    }

    #[test]
    fn test_count_mismatches() {
        let mut r = record("영어", "영어", 2.0, 2.0);
        r.results = vec![question(1, true, 2.0)];
        r.correct_count = Some(3);
        r.total_questions = Some(45);
        let issues = audit_records(&[r], &SubjectHierarchy::default());
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("correct count mismatch"));
        assert!(issues[1].contains("question count mismatch"));
    }

    #[test]
    fn test_duplicate_and_negative() {
        let records = vec![record("영어", "영어", 90.0, 100.0), record("영어", "영어", -1.0, 100.0)];
        let issues = audit_records(&records, &SubjectHierarchy::default());
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("duplicate record"));
        assert!(issues[1].contains("negative score"));
    }
}
