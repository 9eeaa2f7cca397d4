use serde::Serialize;
use std::collections::HashMap;

use super::config::{SubjectConfig, SubjectHierarchy, SubjectKind};
use super::filter::SubjectFilter;
use crate::results::ResultRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectiveScore {
    pub name: String,
    pub score: f64,
}

/// Score of one parent subject with the parts it was combined from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentScore {
    pub name: String,
    pub common: f64,
    pub electives: Vec<ElectiveScore>,
    pub elective_avg: f64,
    pub total: f64,
}

impl ParentScore {
    pub fn elective(&self, name: &str) -> f64 {
        self.electives
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.score)
            .unwrap_or(0.0)
    }
}

/// Hierarchy-aware composite score of one model.
///
/// `total` is the full-hierarchy sum unless the score came out of
/// [`ScoreAggregator::all_model_scores`] with a filter, in which case it holds
/// the filtered total. `parents` always carries the unfiltered breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeScore {
    pub model: String,
    pub parents: Vec<ParentScore>,
    pub total: f64,
}

impl CompositeScore {
    pub fn parent(&self, name: &str) -> Option<&ParentScore> {
        self.parents.iter().find(|p| p.name == name)
    }

    /// Parent total, 0 when the parent is not part of the breakdown
    pub fn parent_total(&self, name: &str) -> f64 {
        self.parent(name).map(|p| p.total).unwrap_or(0.0)
    }
}

/// Scores keyed by (model, subject, section). The first record for a key wins.
struct ScoreIndex<'a> {
    scores: HashMap<(&'a str, &'a str, &'a str), f64>,
}

impl<'a> ScoreIndex<'a> {
    fn build(records: &'a [ResultRecord]) -> Self {
        let mut scores = HashMap::new();
        for r in records {
            scores
                .entry((r.model.as_str(), r.subject.as_str(), r.section.as_str()))
                .or_insert(r.score);
        }
        Self { scores }
    }

    fn lookup(&self, model: &str, subject: &str, section: &str) -> Option<f64> {
        self.scores.get(&(model, subject, section)).copied()
    }

    fn get(&self, model: &str, subject: &str, section: &str) -> f64 {
        self.lookup(model, subject, section).unwrap_or(0.0)
    }
}

/// Mean over the nonzero values; a zero score counts as "not attempted".
fn nonzero_mean(values: &[f64]) -> f64 {
    let attempted: Vec<f64> = values.iter().copied().filter(|v| *v != 0.0).collect();
    if attempted.is_empty() {
        0.0
    } else {
        attempted.iter().sum::<f64>() / attempted.len() as f64
    }
}

/// Grouped sub-exam rule: raw score for one attempt, doubled average for two or more.
fn grouped_total(values: &[f64]) -> f64 {
    let attempted = values.iter().filter(|v| **v != 0.0).count();
    match attempted {
        0 => 0.0,
        1 => nonzero_mean(values),
        _ => nonzero_mean(values) * 2.0,
    }
}

/// Turns raw per-sheet results into composite scores over a subject hierarchy.
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    hierarchy: SubjectHierarchy,
}

impl ScoreAggregator {
    pub fn new(hierarchy: SubjectHierarchy) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &SubjectHierarchy {
        &self.hierarchy
    }

    /// Full-hierarchy composite score of `model`. Missing sheets count as 0.
    pub fn score_for(&self, model: &str, records: &[ResultRecord]) -> CompositeScore {
        let index = ScoreIndex::build(records);
        self.score_with_index(model, &index)
    }

    fn score_with_index(&self, model: &str, index: &ScoreIndex) -> CompositeScore {
        let parents: Vec<ParentScore> = self
            .hierarchy
            .subjects
            .iter()
            .map(|subject| parent_score(model, subject, index))
            .collect();
        let total = parents.iter().map(|p| p.total).sum();

        CompositeScore {
            model: model.to_string(),
            parents,
            total,
        }
    }

    /// Total of `score` restricted to the subjects in `filter`.
    ///
    /// An empty filter yields the unfiltered total. A single elective of a
    /// common-bearing parent counts as common + that elective's raw score, a
    /// single grouped elective as its raw score.
    pub fn filtered_total(&self, score: &CompositeScore, filter: &SubjectFilter) -> f64 {
        if filter.is_empty() {
            return score.total;
        }

        let normalized = filter.normalize(&self.hierarchy);
        let mut total: f64 = normalized
            .parents
            .iter()
            .map(|name| score.parent_total(name))
            .sum();

        for (parent, elective) in &normalized.electives {
            let (Some(subject), Some(detail)) = (self.hierarchy.get(parent), score.parent(parent))
            else {
                continue;
            };
            total += match subject.kind() {
                SubjectKind::CommonElective { .. } => detail.common + detail.elective(elective),
                SubjectKind::Grouped { .. } => grouped_total(&[detail.elective(elective)]),
                SubjectKind::Sectionless => 0.0,
            };
        }

        total
    }

    /// Maximum achievable total under `filter`, on the same scale as [`Self::filtered_total`].
    pub fn max_score_for(&self, filter: &SubjectFilter) -> f64 {
        if filter.is_empty() {
            return self.hierarchy.max_score();
        }

        let normalized = filter.normalize(&self.hierarchy);
        let parents: f64 = normalized
            .parents
            .iter()
            .filter_map(|name| self.hierarchy.get(name))
            .map(|s| s.max_score)
            .sum();
        let electives: f64 = normalized
            .electives
            .iter()
            .filter_map(|(parent, _)| self.hierarchy.get(parent))
            .map(|s| match s.kind() {
                SubjectKind::Grouped { single_max } => single_max,
                _ => s.max_score,
            })
            .sum();

        parents + electives
    }

    /// Scores for every model in `models`, sorted by total descending.
    ///
    /// With a non-empty filter each `total` is replaced by the filtered total.
    /// Ties keep the order of `models`.
    pub fn all_model_scores(
        &self,
        records: &[ResultRecord],
        models: &[String],
        filter: &SubjectFilter,
    ) -> Vec<CompositeScore> {
        let index = ScoreIndex::build(records);

        let mut scores: Vec<CompositeScore> = models
            .iter()
            .map(|model| {
                let mut score = self.score_with_index(model, &index);
                if !filter.is_empty() {
                    score.total = self.filtered_total(&score, filter);
                }
                score
            })
            .collect();

        // sort_by is stable: equal totals stay in input order
        scores.sort_by(|a, b| {
            b.total
                .partial_cmp(&a.total)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::trace!(models = scores.len(), filter = %filter, "aggregated model scores");
        scores
    }
}

fn parent_score(model: &str, subject: &SubjectConfig, index: &ScoreIndex) -> ParentScore {
    let name = subject.name.as_str();
    match subject.kind() {
        SubjectKind::Sectionless => {
            let score = index
                .lookup(model, name, name)
                .or_else(|| index.lookup(model, name, ""))
                .unwrap_or(0.0);
            ParentScore {
                name: subject.name.clone(),
                common: score,
                electives: vec![],
                elective_avg: 0.0,
                total: score,
            }
        }
        SubjectKind::CommonElective { common, .. } => {
            let common = index.get(model, name, common);
            let electives: Vec<ElectiveScore> = subject
                .electives
                .iter()
                .map(|e| ElectiveScore {
                    name: e.clone(),
                    score: index.get(model, name, e),
                })
                .collect();
            let values: Vec<f64> = electives.iter().map(|e| e.score).collect();
            let elective_avg = nonzero_mean(&values);
            ParentScore {
                name: subject.name.clone(),
                common,
                electives,
                elective_avg,
                total: common + elective_avg,
            }
        }
        SubjectKind::Grouped { .. } => {
            // Exported sheets may store a grouped elective as its own subject
            let electives: Vec<ElectiveScore> = subject
                .electives
                .iter()
                .map(|e| ElectiveScore {
                    name: e.clone(),
                    score: index
                        .lookup(model, name, e)
                        .or_else(|| index.lookup(model, e, e))
                        .unwrap_or(0.0),
                })
                .collect();
            let values: Vec<f64> = electives.iter().map(|e| e.score).collect();
            ParentScore {
                name: subject.name.clone(),
                common: 0.0,
                electives,
                elective_avg: nonzero_mean(&values),
                total: grouped_total(&values),
            }
        }
    }
}
