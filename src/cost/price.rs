use std::collections::BTreeMap;

use crate::results::{Price, ResultRecord};

/// Per-model prices in dollars per 1M tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    prices: BTreeMap<String, Price>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prices carried by the result dataset. The first record with a price wins.
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut prices = BTreeMap::new();
        for record in records {
            if let Some(price) = record.price {
                prices.entry(record.model.clone()).or_insert(price);
            }
        }
        Self { prices }
    }

    /// Replace prices with the entries of `other`
    pub fn merged_with(mut self, other: &PriceTable) -> Self {
        for (model, price) in &other.prices {
            self.prices.insert(model.clone(), *price);
        }
        self
    }

    pub fn insert(&mut self, model: impl Into<String>, price: Price) {
        self.prices.insert(model.into(), price);
    }

    pub fn get(&self, model: &str) -> Option<Price> {
        self.prices.get(model).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl From<BTreeMap<String, Price>> for PriceTable {
    fn from(prices: BTreeMap<String, Price>) -> Self {
        Self { prices }
    }
}
