use std::collections::BTreeSet;
use std::fmt;

use super::config::SubjectHierarchy;
use crate::results::split_sheet_name;

/// A single subject-filter token.
///
/// Grammar: a bare parent name ("국어") puts the whole parent in scope,
/// "parent-child" ("국어-화작") puts a single elective in scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterToken {
    Parent(String),
    Elective { parent: String, elective: String },
}

impl FilterToken {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.contains('-') {
            let (parent, elective) = split_sheet_name(s);
            FilterToken::Elective {
                parent: parent.to_string(),
                elective: elective.to_string(),
            }
        } else {
            FilterToken::Parent(s.to_string())
        }
    }

    pub fn parent(&self) -> &str {
        match self {
            FilterToken::Parent(name) => name,
            FilterToken::Elective { parent, .. } => parent,
        }
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterToken::Parent(name) => write!(f, "{}", name),
            FilterToken::Elective { parent, elective } => write!(f, "{}-{}", parent, elective),
        }
    }
}

/// User-selected scope of subjects. Token order is irrelevant and duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectFilter {
    tokens: BTreeSet<FilterToken>,
}

impl SubjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_string())
                .filter(|t| !t.is_empty())
                .map(|t| FilterToken::parse(&t))
                .collect(),
        }
    }

    /// Parse a comma-separated list, e.g. "국어-화작,수학"
    pub fn parse_list(s: &str) -> Self {
        Self::from_tokens(s.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &FilterToken> {
        self.tokens.iter()
    }

    /// Distinct parent names referenced by any token
    pub fn parents(&self) -> BTreeSet<&str> {
        self.tokens.iter().map(|t| t.parent()).collect()
    }

    /// Resolve the filter against the hierarchy.
    ///
    /// A bare parent token dominates its elective tokens, and two or more
    /// elective tokens of one parent collapse into the bare parent. Tokens that
    /// do not name a known parent or elective are dropped.
    pub fn normalize(&self, hierarchy: &SubjectHierarchy) -> NormalizedFilter {
        let mut normalized = NormalizedFilter::default();

        for token in &self.tokens {
            let known = match token {
                FilterToken::Parent(name) => hierarchy.get(name).is_some(),
                FilterToken::Elective { parent, elective } => hierarchy
                    .get(parent)
                    .is_some_and(|s| s.has_elective(elective)),
            };
            if !known {
                tracing::debug!(token = %token, "ignoring unrecognized filter token");
            }
        }

        for subject in &hierarchy.subjects {
            if self
                .tokens
                .contains(&FilterToken::Parent(subject.name.clone()))
            {
                normalized.parents.push(subject.name.clone());
                continue;
            }

            let selected: Vec<&String> = subject
                .electives
                .iter()
                .filter(|e| {
                    self.tokens.contains(&FilterToken::Elective {
                        parent: subject.name.clone(),
                        elective: (*e).clone(),
                    })
                })
                .collect();

            match selected.as_slice() {
                [] => {}
                [single] => normalized
                    .electives
                    .push((subject.name.clone(), (*single).clone())),
                _ => normalized.parents.push(subject.name.clone()),
            }
        }

        normalized
    }
}

impl fmt::Display for SubjectFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self.tokens.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", tokens.join(","))
    }
}

/// A filter resolved against the hierarchy, in hierarchy order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedFilter {
    /// Parents fully in scope
    pub parents: Vec<String>,
    /// (parent, elective) pairs where exactly one elective of the parent is in scope
    pub electives: Vec<(String, String)>,
}

impl NormalizedFilter {
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty() && self.electives.is_empty()
    }
}
