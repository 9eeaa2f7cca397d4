use serde::Serialize;

use super::config::EfficiencyWeights;
use super::price::PriceTable;
use crate::results::{ResultRecord, TokenUsage, TokenUsageMap};
use crate::scoring::{CompositeScore, ScoreAggregator, SubjectFilter, SubjectHierarchy, SubjectKind};

const TOKENS_PER_PRICE_UNIT: f64 = 1_000_000.0;

/// Cost and efficiency of one model under the active filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostRow {
    pub model: String,
    pub score: f64,
    pub input_price: f64,
    pub output_price: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
    pub efficiency: f64,
    /// False when no positive cost could be derived; such rows have efficiency 0
    pub cost_known: bool,
}

/// Derives test cost and efficiency from token usage, prices and scores.
#[derive(Debug, Clone, Default)]
pub struct CostCalculator {
    weights: EfficiencyWeights,
}

impl CostCalculator {
    pub fn new(weights: EfficiencyWeights) -> Self {
        Self { weights }
    }

    /// One row per entry of `scores`, in the same order.
    ///
    /// Prices come from `records` (first priced record per model) with
    /// `overrides` taking precedence. `scores` are expected to carry totals
    /// for the same `filter`, as produced by [`ScoreAggregator::all_model_scores`].
    pub fn cost_rows_for(
        &self,
        aggregator: &ScoreAggregator,
        records: &[ResultRecord],
        scores: &[CompositeScore],
        usage: &TokenUsageMap,
        overrides: &PriceTable,
        filter: &SubjectFilter,
    ) -> Vec<CostRow> {
        let prices = PriceTable::from_records(records).merged_with(overrides);

        let mut rows: Vec<CostRow> = scores
            .iter()
            .map(|score| {
                let price = prices.get(&score.model).unwrap_or_default();
                let (input_tokens, output_tokens) =
                    token_totals(usage.get(&score.model), filter, aggregator.hierarchy());
                let total_cost = (input_tokens as f64 * price.input / TOKENS_PER_PRICE_UNIT
                    + output_tokens as f64 * price.output / TOKENS_PER_PRICE_UNIT)
                    .max(0.0);

                CostRow {
                    model: score.model.clone(),
                    score: score.total,
                    input_price: price.input,
                    output_price: price.output,
                    input_tokens,
                    output_tokens,
                    total_cost,
                    efficiency: 0.0,
                    cost_known: total_cost > 0.0,
                }
            })
            .collect();

        let max_cost = rows
            .iter()
            .filter(|r| r.cost_known)
            .map(|r| r.total_cost)
            .fold(None, |max: Option<f64>, c| Some(max.map_or(c, |m| m.max(c))))
            .unwrap_or(1.0);
        let max_score = aggregator.max_score_for(filter);

        for row in rows.iter_mut().filter(|r| r.cost_known) {
            let score_norm = if max_score > 0.0 {
                (row.score / max_score).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let cost_norm = (row.total_cost / max_cost).clamp(0.0, 1.0);
            row.efficiency = ((score_norm * self.weights.score_weight
                + (1.0 - cost_norm) * self.weights.cost_weight)
                * 100.0)
                .clamp(0.0, 100.0);
        }

        tracing::trace!(rows = rows.len(), max_cost, max_score, "derived cost rows");
        rows
    }
}

/// Input and output tokens counted for a model under `filter`.
///
/// With a filter, only section entries whose key is a filtered parent or
/// starts with "parent-" count. For a grouped parent, keys naming one of its
/// electives count too, since those electives may be exported as standalone
/// sheets. A model without a section breakdown counts 0.
fn token_totals(
    usage: Option<&TokenUsage>,
    filter: &SubjectFilter,
    hierarchy: &SubjectHierarchy,
) -> (u64, u64) {
    let Some(usage) = usage else {
        return (0, 0);
    };

    if filter.is_empty() {
        return (usage.total_input_tokens, usage.total_output_tokens);
    }

    let Some(sections) = &usage.sections else {
        return (0, 0);
    };

    let parents = filter.parents();
    let grouped_electives: Vec<&str> = parents
        .iter()
        .filter_map(|parent| hierarchy.get(parent))
        .filter(|subject| matches!(subject.kind(), SubjectKind::Grouped { .. }))
        .flat_map(|subject| subject.electives.iter().map(String::as_str))
        .collect();

    sections
        .iter()
        .filter(|(key, _)| {
            grouped_electives.contains(&key.as_str())
                || parents.iter().any(|parent| {
                    key.as_str() == *parent
                        || key
                            .strip_prefix(*parent)
                            .is_some_and(|rest| rest.starts_with('-'))
                })
        })
        .fold((0u64, 0u64), |(input, output), (_, tokens)| {
            (
                input.saturating_add(tokens.input_tokens),
                output.saturating_add(tokens.output_tokens),
            )
        })
}

/// Rows with a known cost by efficiency descending, then rows without a known cost.
/// Ties keep their input order.
pub fn rank_by_efficiency(mut rows: Vec<CostRow>) -> Vec<CostRow> {
    rows.sort_by(|a, b| {
        b.cost_known.cmp(&a.cost_known).then(
            b.efficiency
                .partial_cmp(&a.efficiency)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{Price, SectionTokens};
    use crate::scoring::SubjectHierarchy;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn record(model: &str, subject: &str, section: &str, score: f64, price: Option<Price>) -> ResultRecord {
        ResultRecord {
            model: model.to_string(),
            subject: subject.to_string(),
            section: section.to_string(),
            score,
            total_points: 0.0,
            results: vec![],
            price,
            sheet_name: None,
            correct_count: None,
            total_questions: None,
        }
    }

    fn usage(input: u64, output: u64, sections: Option<Vec<(&str, u64, u64)>>) -> TokenUsage {
        TokenUsage {
            total_input_tokens: input,
            total_output_tokens: output,
            total_tokens: input + output,
            sections: sections.map(|s| {
                s.into_iter()
                    .map(|(key, i, o)| {
                        (
                            key.to_string(),
                            SectionTokens {
                                input_tokens: i,
                                output_tokens: o,
                            },
                        )
                    })
                    .collect()
            }),
        }
    }

    fn rows_for(
        records: &[ResultRecord],
        usage: &TokenUsageMap,
        filter: &SubjectFilter,
    ) -> Vec<CostRow> {
        let aggregator = ScoreAggregator::new(SubjectHierarchy::default());
        let models = crate::results::discover_models(records);
        let scores = aggregator.all_model_scores(records, &models, filter);
        CostCalculator::default().cost_rows_for(
            &aggregator,
            records,
            &scores,
            usage,
            &PriceTable::new(),
            filter,
        )
    }

    #[test]
    fn test_total_cost_formula() {
        let records = vec![record("A", "영어", "영어", 90.0, Some(Price { input: 2.0, output: 10.0 }))];
        let mut usage_map = BTreeMap::new();
        usage_map.insert("A".to_string(), usage(500_000, 100_000, None));

        let rows = rows_for(&records, &usage_map, &SubjectFilter::new());
        assert_eq!(rows.len(), 1);
        // 0.5M * $2 + 0.1M * $10
        assert!((rows[0].total_cost - 2.0).abs() < 1e-9);
        assert!(rows[0].cost_known);
        assert_eq!(rows[0].input_price, 2.0);
        assert_eq!(rows[0].output_tokens, 100_000);
    }

    #[test]
    fn test_efficiency_blend() {
        let price = Some(Price { input: 1.0, output: 1.0 });
        let records = vec![
            record("A", "영어", "영어", 90.0, price),
            record("B", "영어", "영어", 45.0, price),
        ];
        let mut usage_map = BTreeMap::new();
        usage_map.insert("A".to_string(), usage(2_000_000, 0, None));
        usage_map.insert("B".to_string(), usage(1_000_000, 0, None));

        let rows = rows_for(&records, &usage_map, &SubjectFilter::new());
        let a = rows.iter().find(|r| r.model == "A").unwrap();
        let b = rows.iter().find(|r| r.model == "B").unwrap();
        // A: score 90/450, cost at max -> (0.2*0.7 + 0*0.3) * 100
        assert!((a.efficiency - 14.0).abs() < 1e-9);
        // B: score 45/450, half the max cost -> (0.1*0.7 + 0.5*0.3) * 100
        assert!((b.efficiency - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_scenario_d_zero_cost_row() {
        let records = vec![
            record("Paid", "영어", "영어", 80.0, Some(Price { input: 1.0, output: 2.0 })),
            record("Free", "영어", "영어", 100.0, Some(Price { input: 0.0, output: 0.0 })),
        ];
        let mut usage_map = BTreeMap::new();
        usage_map.insert("Paid".to_string(), usage(1_000_000, 500_000, None));
        usage_map.insert("Free".to_string(), usage(3_000_000, 3_000_000, None));

        let rows = rows_for(&records, &usage_map, &SubjectFilter::new());
        assert_eq!(rows.len(), 2);

        let free = rows.iter().find(|r| r.model == "Free").unwrap();
        assert_eq!(free.total_cost, 0.0);
        assert_eq!(free.efficiency, 0.0);
        assert!(!free.cost_known);

        // Paid is the only costed row, so it sets max cost: cost_norm = 1
        let paid = rows.iter().find(|r| r.model == "Paid").unwrap();
        let expected = (80.0 / 450.0) * 0.7 * 100.0;
        assert!((paid.efficiency - expected).abs() < 1e-9);
    }

    #[test]
    fn test_missing_price_and_usage() {
        let records = vec![record("A", "영어", "영어", 90.0, None)];
        let rows = rows_for(&records, &BTreeMap::new(), &SubjectFilter::new());
        assert_eq!(rows[0].input_tokens, 0);
        assert_eq!(rows[0].total_cost, 0.0);
        assert_eq!(rows[0].efficiency, 0.0);
        assert!(!rows[0].cost_known);
    }

    #[test]
    fn test_filtered_tokens_by_parent_prefix() {
        let records = vec![
            record("A", "국어", "공통", 70.0, Some(Price { input: 1.0, output: 1.0 })),
            record("A", "국어", "화작", 20.0, None),
        ];
        let mut usage_map = BTreeMap::new();
        usage_map.insert(
            "A".to_string(),
            usage(
                1_000,
                1_000,
                Some(vec![
                    ("국어-공통", 100, 10),
                    ("국어-화작", 200, 20),
                    ("국어-언매", 400, 40),
                    ("국어사", 9_000, 9_000),
                    ("영어", 300, 30),
                ]),
            ),
        );

        let filter = SubjectFilter::from_tokens(["국어-화작"]);
        let rows = rows_for(&records, &usage_map, &filter);
        assert_eq!(rows[0].input_tokens, 700);
        assert_eq!(rows[0].output_tokens, 70);
        assert_eq!(rows[0].score, 90.0);
    }

    #[test]
    fn test_filtered_tokens_bare_section_key() {
        let records = vec![record("A", "영어", "영어", 90.0, None)];
        let mut usage_map = BTreeMap::new();
        usage_map.insert(
            "A".to_string(),
            usage(1_000, 1_000, Some(vec![("영어", 300, 30), ("한국사", 50, 5)])),
        );

        let rows = rows_for(&records, &usage_map, &SubjectFilter::from_tokens(["영어"]));
        assert_eq!((rows[0].input_tokens, rows[0].output_tokens), (300, 30));
    }

    #[test]
    fn test_filtered_tokens_grouped_elective_sheet() {
        let records = vec![record("A", "물리1", "물리1", 40.0, Some(Price { input: 1.0, output: 1.0 }))];
        let mut usage_map = BTreeMap::new();
        usage_map.insert(
            "A".to_string(),
            usage(
                3_000_000,
                0,
                Some(vec![("물리1", 1_000_000, 0), ("화학1", 500_000, 0), ("영어", 1_500_000, 0)]),
            ),
        );

        let rows = rows_for(&records, &usage_map, &SubjectFilter::from_tokens(["탐구-물리1"]));
        assert_eq!(rows[0].score, 40.0);
        // single-elective filter still counts the whole parent's tokens
        assert_eq!(rows[0].input_tokens, 1_500_000);
        assert!(rows[0].cost_known);

        let rows = rows_for(&records, &usage_map, &SubjectFilter::from_tokens(["탐구"]));
        assert_eq!(rows[0].input_tokens, 1_500_000);

        let rows = rows_for(&records, &usage_map, &SubjectFilter::from_tokens(["영어"]));
        assert_eq!(rows[0].input_tokens, 1_500_000);
        assert_eq!(rows[0].score, 0.0);
    }

    #[test]
    fn test_filtered_tokens_saturate() {
        let records = vec![record("A", "영어", "영어", 90.0, Some(Price { input: 1.0, output: 1.0 }))];
        let mut usage_map = BTreeMap::new();
        usage_map.insert(
            "A".to_string(),
            usage(0, 0, Some(vec![("영어", u64::MAX, 1), ("영어-듣기", 10, u64::MAX)])),
        );

        let rows = rows_for(&records, &usage_map, &SubjectFilter::from_tokens(["영어"]));
        assert_eq!(rows[0].input_tokens, u64::MAX);
        assert_eq!(rows[0].output_tokens, u64::MAX);
        assert!(rows[0].total_cost.is_finite());
    }

    #[test]
    fn test_filter_without_section_breakdown_counts_zero() {
        let records = vec![record("A", "영어", "영어", 90.0, Some(Price { input: 1.0, output: 1.0 }))];
        let mut usage_map = BTreeMap::new();
        usage_map.insert("A".to_string(), usage(1_000_000, 1_000_000, None));

        let rows = rows_for(&records, &usage_map, &SubjectFilter::from_tokens(["영어"]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].input_tokens, 0);
        assert!(!rows[0].cost_known);
    }

    #[test]
    fn test_price_overrides() {
        let aggregator = ScoreAggregator::default();
        let records = vec![record("A", "영어", "영어", 90.0, Some(Price { input: 1.0, output: 1.0 }))];
        let scores = aggregator.all_model_scores(&records, &["A".to_string()], &SubjectFilter::new());
        let mut usage_map = BTreeMap::new();
        usage_map.insert("A".to_string(), usage(1_000_000, 0, None));
        let mut overrides = PriceTable::new();
        overrides.insert("A", Price { input: 3.0, output: 0.0 });

        let rows = CostCalculator::default().cost_rows_for(
            &aggregator,
            &records,
            &scores,
            &usage_map,
            &overrides,
            &SubjectFilter::new(),
        );
        assert!((rows[0].total_cost - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_weights() {
        let aggregator = ScoreAggregator::default();
        let records = vec![record("A", "영어", "영어", 450.0, Some(Price { input: 1.0, output: 0.0 }))];
        let scores = aggregator.all_model_scores(&records, &["A".to_string()], &SubjectFilter::new());
        let mut usage_map = BTreeMap::new();
        usage_map.insert("A".to_string(), usage(1_000_000, 0, None));

        let calculator = CostCalculator::new(EfficiencyWeights {
            score_weight: 1.0,
            cost_weight: 0.0,
        });
        let rows = calculator.cost_rows_for(
            &aggregator,
            &records,
            &scores,
            &usage_map,
            &PriceTable::new(),
            &SubjectFilter::new(),
        );
        // score is clamped to the maximum
        assert!((rows[0].efficiency - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_by_efficiency() {
        let row = |model: &str, efficiency: f64, cost_known: bool| CostRow {
            model: model.to_string(),
            score: 0.0,
            input_price: 0.0,
            output_price: 0.0,
            input_tokens: 0,
            output_tokens: 0,
            total_cost: if cost_known { 1.0 } else { 0.0 },
            efficiency,
            cost_known,
        };
        let ranked = rank_by_efficiency(vec![
            row("free", 0.0, false),
            row("low", 20.0, true),
            row("high", 80.0, true),
            row("tie", 20.0, true),
        ]);
        let order: Vec<&str> = ranked.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(order, vec!["high", "low", "tie", "free"]);
    }

    proptest! {
        #[test]
        fn prop_cost_non_negative_and_efficiency_bounded(
            entries in proptest::collection::vec(
                (0u32..=100, 0.0f64..20.0, 0.0f64..80.0, 0u64..5_000_000, 0u64..5_000_000),
                1..8,
            ),
        ) {
            let mut records = Vec::new();
            let mut usage_map = BTreeMap::new();
            for (i, (score, input_price, output_price, input, output)) in entries.iter().enumerate() {
                let model = format!("m{}", i);
                records.push(record(
                    &model,
                    "영어",
                    "영어",
                    *score as f64,
                    Some(Price { input: *input_price, output: *output_price }),
                ));
                usage_map.insert(model, usage(*input, *output, None));
            }

            let rows = rows_for(&records, &usage_map, &SubjectFilter::new());
            prop_assert_eq!(rows.len(), entries.len());
            for row in &rows {
                prop_assert!(row.total_cost >= 0.0);
                prop_assert!(!row.efficiency.is_nan());
                if row.total_cost > 0.0 {
                    prop_assert!(row.efficiency >= 0.0 && row.efficiency <= 100.0);
                } else {
                    prop_assert_eq!(row.efficiency, 0.0);
                }
            }
        }
    }
}
