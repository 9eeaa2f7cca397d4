use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::cost::{EfficiencyWeights, PriceTable};
use crate::results::Price;
use crate::scoring::{SubjectFilter, SubjectHierarchy};

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Exported result dataset (JSON array of result records)
    #[serde(default)]
    pub results: Option<PathBuf>,

    /// Token usage per model (JSON object)
    #[serde(default)]
    pub token_usage: Option<PathBuf>,

    /// Default subject filter tokens, e.g. ["국어-화작", "수학"]
    #[serde(default)]
    pub filter: Vec<String>,

    /// Rename model identifiers at load time (dataset name -> display name)
    #[serde(default)]
    pub model_aliases: BTreeMap<String, String>,

    /// Prices in $ per 1M tokens, overriding prices found in the dataset
    #[serde(default)]
    pub prices: BTreeMap<String, Price>,

    /// Subject hierarchy (defaults to the CSAT layout)
    #[serde(default)]
    pub scoring: Option<SubjectHierarchy>,

    #[serde(default)]
    pub efficiency: Option<EfficiencyWeights>,
}

impl Config {
    pub fn hierarchy(&self) -> SubjectHierarchy {
        self.scoring.clone().unwrap_or_default()
    }

    pub fn efficiency(&self) -> EfficiencyWeights {
        self.efficiency.unwrap_or_default()
    }

    pub fn price_overrides(&self) -> PriceTable {
        PriceTable::from(self.prices.clone())
    }

    pub fn default_filter(&self) -> SubjectFilter {
        SubjectFilter::from_tokens(&self.filter)
    }
}
