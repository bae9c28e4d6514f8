//! Classifier label vocabulary
//!
//! The entailment classifier ranks a claim against a small, fixed set of
//! candidate labels. The aggregator chooses which subset to offer, which
//! lets it widen the set (adding `not sure`) to change how readily the
//! classifier abstains.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from label parsing and label-set construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("Unknown label: {0}")]
    Unknown(String),

    #[error("Label set needs at least two labels, got {0}")]
    TooFew(usize),

    #[error("Label set must contain \"{0}\"")]
    Missing(Label),

    #[error("Duplicate label: {0}")]
    Duplicate(Label),
}

/// A candidate verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "true")]
    True,
    #[serde(rename = "false")]
    False,
    #[serde(rename = "not sure")]
    NotSure,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::True => "true",
            Label::False => "false",
            Label::NotSure => "not sure",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "true" => Ok(Label::True),
            "false" => Ok(Label::False),
            "not sure" | "uncertain" | "unsure" => Ok(Label::NotSure),
            other => Err(LabelError::Unknown(other.to_string())),
        }
    }
}

/// Ordered, duplicate-free candidate labels offered to the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Label>", into = "Vec<Label>")]
pub struct LabelSet(Vec<Label>);

impl LabelSet {
    /// Validate a label list: at least two labels, `true` and `false`
    /// both present, no repeats.
    pub fn new(labels: Vec<Label>) -> Result<Self, LabelError> {
        if labels.len() < 2 {
            return Err(LabelError::TooFew(labels.len()));
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(LabelError::Duplicate(*label));
            }
        }
        for required in [Label::True, Label::False] {
            if !labels.contains(&required) {
                return Err(LabelError::Missing(required));
            }
        }
        Ok(Self(labels))
    }

    /// `true` / `false` only: the classifier must commit
    pub fn binary() -> Self {
        Self(vec![Label::True, Label::False])
    }

    /// `true` / `false` / `not sure`: the classifier may abstain
    pub fn with_abstain() -> Self {
        Self(vec![Label::True, Label::False, Label::NotSure])
    }

    /// Parse label names, e.g. from a settings file
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, LabelError> {
        let labels = names
            .iter()
            .map(|n| n.as_ref().parse())
            .collect::<Result<Vec<Label>, _>>()?;
        Self::new(labels)
    }

    pub fn labels(&self) -> &[Label] {
        &self.0
    }

    pub fn contains(&self, label: Label) -> bool {
        self.0.contains(&label)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(Label::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::with_abstain()
    }
}

impl TryFrom<Vec<Label>> for LabelSet {
    type Error = LabelError;

    fn try_from(value: Vec<Label>) -> Result<Self, Self::Error> {
        LabelSet::new(value)
    }
}

impl From<LabelSet> for Vec<Label> {
    fn from(set: LabelSet) -> Self {
        set.0
    }
}

/// A label with the classifier's confidence, on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: Label,
    pub confidence: f64,
}

impl LabelScore {
    /// Build a score from a 0-100 confidence, clamped and rounded to two
    /// decimal places. Non-finite input becomes zero.
    pub fn new(label: Label, confidence: f64) -> Self {
        let clamped = if confidence.is_finite() {
            confidence.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            label,
            confidence: (clamped * 100.0).round() / 100.0,
        }
    }

    /// Build a score from a 0-1 probability
    pub fn from_probability(label: Label, probability: f64) -> Self {
        Self::new(label, probability * 100.0)
    }
}

/// Sort scores by descending confidence.
///
/// Ties keep their incoming order, so results are stable for identical
/// classifier output.
pub fn rank_scores(mut scores: Vec<LabelScore>) -> Vec<LabelScore> {
    scores.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    scores
}
