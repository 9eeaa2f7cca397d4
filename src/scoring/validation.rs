use std::collections::HashSet;

use super::config::{SubjectHierarchy, SubjectKind};

/// Validate the subject hierarchy at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(hierarchy: &SubjectHierarchy) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    if hierarchy.subjects.is_empty() {
        errors.push("scoring.subjects: at least one subject is required".to_string());
    }

    for (i, subject) in hierarchy.subjects.iter().enumerate() {
        let name = subject.name.trim();
        if name.is_empty() {
            errors.push(format!("scoring.subjects[{}].name: must not be empty", i));
        } else if name.contains('-') {
            errors.push(format!(
                "scoring.subjects[{}].name: '{}' must not contain '-'",
                i, subject.name
            ));
        } else if !seen.insert(name) {
            errors.push(format!(
                "scoring.subjects[{}].name: duplicate subject '{}'",
                i, subject.name
            ));
        }

        if subject.max_score <= 0.0 {
            errors.push(format!(
                "scoring.subjects[{}].max_score: must be positive",
                i
            ));
        }

        let mut electives = HashSet::new();
        for (j, elective) in subject.electives.iter().enumerate() {
            if elective.trim().is_empty() || elective.contains('-') {
                errors.push(format!(
                    "scoring.subjects[{}].electives[{}]: invalid name '{}'",
                    i, j, elective
                ));
            } else if !electives.insert(elective.as_str()) {
                errors.push(format!(
                    "scoring.subjects[{}].electives[{}]: duplicate elective '{}'",
                    i, j, elective
                ));
            }
        }

        match subject.kind() {
            SubjectKind::Sectionless => {
                if subject.common_max.is_some() || subject.common.is_some() {
                    errors.push(format!(
                        "scoring.subjects[{}]: common section requires electives",
                        i
                    ));
                }
            }
            SubjectKind::CommonElective { common, .. } => {
                match subject.common_max {
                    None => errors.push(format!(
                        "scoring.subjects[{}].common_max: required when electives are listed",
                        i
                    )),
                    Some(max) if max < 0.0 || max >= subject.max_score => errors.push(format!(
                        "scoring.subjects[{}].common_max: must be in [0, max_score)",
                        i
                    )),
                    Some(_) => {}
                }
                if subject.has_elective(common) {
                    errors.push(format!(
                        "scoring.subjects[{}].common: '{}' is also listed as an elective",
                        i, common
                    ));
                }
            }
            SubjectKind::Grouped { single_max } => {
                if subject.electives.is_empty() {
                    errors.push(format!(
                        "scoring.subjects[{}].electives: grouped subject needs electives",
                        i
                    ));
                }
                if single_max <= 0.0 || single_max > subject.max_score {
                    errors.push(format!(
                        "scoring.subjects[{}].single_max: must be in (0, max_score]",
                        i
                    ));
                }
                if subject.common.is_some() || subject.common_max.is_some() {
                    errors.push(format!(
                        "scoring.subjects[{}]: grouped subject has no common section",
                        i
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
