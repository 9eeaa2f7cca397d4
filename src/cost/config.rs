use serde::{Deserialize, Serialize};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

fn default_score_weight() -> f64 {
    0.7
}

fn default_cost_weight() -> f64 {
    0.3
}

/// Blend of normalized score and inverse normalized cost used for efficiency.
///
/// Example YAML:
/// ```yaml
/// efficiency:
///   score_weight: 0.7
///   cost_weight: 0.3
/// ```
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EfficiencyWeights {
    #[serde(default = "default_score_weight")]
    pub score_weight: f64,

    #[serde(default = "default_cost_weight")]
    pub cost_weight: f64,
}

impl Default for EfficiencyWeights {
    fn default() -> Self {
        Self {
            score_weight: default_score_weight(),
            cost_weight: default_cost_weight(),
        }
    }
}

/// Weights must be non-negative and sum to 1 so efficiency stays within 0-100.
pub fn validate_efficiency(weights: &EfficiencyWeights) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if weights.score_weight < 0.0 {
        errors.push("efficiency.score_weight: must be non-negative".to_string());
    }
    if weights.cost_weight < 0.0 {
        errors.push("efficiency.cost_weight: must be non-negative".to_string());
    }

    let sum = weights.score_weight + weights.cost_weight;
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        errors.push(format!(
            "efficiency: score_weight + cost_weight must equal 1 (got {})",
            sum
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = EfficiencyWeights::default();
        assert_eq!(weights.score_weight, 0.7);
        assert_eq!(weights.cost_weight, 0.3);
        assert!(validate_efficiency(&weights).is_ok());
    }

    #[test]
    fn test_partial_weights_parse() {
        let weights: EfficiencyWeights = serde_saphyr::from_str("score_weight: 0.5").unwrap();
        assert_eq!(weights.score_weight, 0.5);
        assert_eq!(weights.cost_weight, 0.3);
        assert!(validate_efficiency(&weights).is_err());
    }

    #[test]
    fn test_negative_weight() {
        let errors = validate_efficiency(&EfficiencyWeights {
            score_weight: 1.2,
            cost_weight: -0.2,
        })
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("cost_weight"));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let errors = validate_efficiency(&EfficiencyWeights {
            score_weight: 0.6,
            cost_weight: 0.6,
        })
        .unwrap_err();
        assert!(errors[0].contains("must equal 1"));
    }
}
