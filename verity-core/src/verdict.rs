//! Verdict precedence policy
//!
//! Resolves one final verdict from evidence that may disagree. Rules are
//! tried in order and the first that applies wins:
//!
//! 1. A published fact-check review: its rating is used verbatim
//! 2. An encyclopedia summary: confirmed if it contains the claim text
//!    (case-insensitive), contradicted otherwise
//! 3. The classifier's top-ranked label
//!
//! Web search results never take part.

use serde::{Deserialize, Serialize};

use crate::{Claim, EncyclopediaSummary, FactCheckEntry, LabelScore, SearchEntry};

/// Verdict text used when no rule could decide
pub const UNKNOWN_VERDICT: &str = "Unknown";

/// Which precedence rule produced the final verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictBasis {
    FactCheck,
    EncyclopediaConfirmed,
    EncyclopediaContradicted,
    Classifier,
    Unresolved,
}

/// The outcome of the precedence chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub text: String,
    pub basis: VerdictBasis,
}

/// Apply the precedence chain to gathered evidence
pub fn resolve_verdict(
    claim: &Claim,
    ai_verdicts: &[LabelScore],
    fact_checks: &[FactCheckEntry],
    encyclopedia: Option<&EncyclopediaSummary>,
) -> Verdict {
    if let Some(review) = fact_checks.iter().find_map(FactCheckEntry::as_review) {
        return Verdict {
            text: review.verdict.clone(),
            basis: VerdictBasis::FactCheck,
        };
    }

    if let Some(summary) = encyclopedia {
        let (text, basis) = if claim.is_contained_in(&summary.summary) {
            ("true", VerdictBasis::EncyclopediaConfirmed)
        } else {
            ("false", VerdictBasis::EncyclopediaContradicted)
        };
        return Verdict {
            text: text.to_string(),
            basis,
        };
    }

    match ai_verdicts.first() {
        Some(top) => Verdict {
            text: top.label.to_string(),
            basis: VerdictBasis::Classifier,
        },
        None => Verdict {
            text: UNKNOWN_VERDICT.to_string(),
            basis: VerdictBasis::Unresolved,
        },
    }
}

/// Everything gathered for one claim, plus the resolved verdict
///
/// Field names on the wire follow the web client's contract
/// (`text`, `best_ai_verdict`, `google_fact_checks`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictBundle {
    #[serde(rename = "text")]
    pub claim: Claim,
    /// Classifier output, highest confidence first; empty if the classifier failed
    pub ai_verdicts: Vec<LabelScore>,
    #[serde(rename = "best_ai_verdict")]
    pub final_verdict: String,
    pub basis: VerdictBasis,
    #[serde(rename = "google_fact_checks")]
    pub fact_checks: Vec<FactCheckEntry>,
    #[serde(rename = "wikipedia_summary")]
    pub encyclopedia: Option<EncyclopediaSummary>,
    #[serde(rename = "google_search_results")]
    pub search_results: Vec<SearchEntry>,
}

impl VerdictBundle {
    /// Resolve the verdict and assemble the bundle
    pub fn assemble(
        claim: Claim,
        ai_verdicts: Vec<LabelScore>,
        fact_checks: Vec<FactCheckEntry>,
        encyclopedia: Option<EncyclopediaSummary>,
        search_results: Vec<SearchEntry>,
    ) -> Self {
        let verdict = resolve_verdict(&claim, &ai_verdicts, &fact_checks, encyclopedia.as_ref());
        Self {
            claim,
            ai_verdicts,
            final_verdict: verdict.text,
            basis: verdict.basis,
            fact_checks,
            encyclopedia,
            search_results,
        }
    }

    pub fn top_ai_verdict(&self) -> Option<&LabelScore> {
        self.ai_verdicts.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Label;

    fn claim(text: &str) -> Claim {
        Claim::new(text).unwrap()
    }

    fn summary(text: &str) -> EncyclopediaSummary {
        EncyclopediaSummary {
            title: "Article".to_string(),
            summary: text.to_string(),
            url: "https://en.wikipedia.org/wiki/Article".to_string(),
        }
    }

    fn ranked_true() -> Vec<LabelScore> {
        vec![
            LabelScore::new(Label::True, 80.0),
            LabelScore::new(Label::False, 20.0),
        ]
    }

    #[test]
    fn test_fact_check_outranks_everything() {
        let fact_checks = vec![FactCheckEntry::review(
            "Vaccines cause autism",
            "False",
            "Health Feedback",
            "https://example.org/review",
        )];
        let wiki = summary("Vaccines cause autism is a claim that...");

        let verdict = resolve_verdict(
            &claim("Vaccines cause autism"),
            &ranked_true(),
            &fact_checks,
            Some(&wiki),
        );

        assert_eq!(verdict.text, "False");
        assert_eq!(verdict.basis, VerdictBasis::FactCheck);
    }

    #[test]
    fn test_fact_check_rating_passes_through_unchanged() {
        let fact_checks = vec![
            FactCheckEntry::review("c", "Mixed", "p", "u"),
            FactCheckEntry::review("c", "True", "p", "u"),
        ];
        let verdict = resolve_verdict(&claim("c"), &[], &fact_checks, None);
        assert_eq!(verdict.text, "Mixed");
    }

    #[test]
    fn test_fact_check_error_is_skipped() {
        let fact_checks = vec![FactCheckEntry::error("fact-check API unavailable")];
        let verdict = resolve_verdict(&claim("The sky is blue"), &ranked_true(), &fact_checks, None);
        assert_eq!(verdict.text, "true");
        assert_eq!(verdict.basis, VerdictBasis::Classifier);
    }

    #[test]
    fn test_encyclopedia_contradicts_when_claim_absent() {
        let wiki = summary("The flat earth is a pseudoscientific belief that Earth's shape is a plane or disk.");
        let verdict = resolve_verdict(&claim("The earth is flat"), &ranked_true(), &[], Some(&wiki));
        assert_eq!(verdict.text, "false");
        assert_eq!(verdict.basis, VerdictBasis::EncyclopediaContradicted);
    }

    #[test]
    fn test_encyclopedia_confirms_when_claim_contained() {
        let wiki = summary("Paris is the capital of France and its largest city.");
        let ai = vec![LabelScore::new(Label::False, 99.0)];
        let verdict = resolve_verdict(&claim("paris is the CAPITAL of france"), &ai, &[], Some(&wiki));
        assert_eq!(verdict.text, "true");
        assert_eq!(verdict.basis, VerdictBasis::EncyclopediaConfirmed);
    }

    #[test]
    fn test_classifier_fallback() {
        let ai = vec![
            LabelScore::new(Label::NotSure, 60.0),
            LabelScore::new(Label::True, 40.0),
        ];
        let verdict = resolve_verdict(&claim("Cats can fly"), &ai, &[], None);
        assert_eq!(verdict.text, "not sure");
        assert_eq!(verdict.basis, VerdictBasis::Classifier);
    }

    #[test]
    fn test_unresolved_without_any_evidence() {
        let verdict = resolve_verdict(&claim("Cats can fly"), &[], &[], None);
        assert_eq!(verdict.text, UNKNOWN_VERDICT);
        assert_eq!(verdict.basis, VerdictBasis::Unresolved);
    }

    #[test]
    fn test_bundle_keeps_all_evidence() {
        let bundle = VerdictBundle::assemble(
            claim("Vaccines cause autism"),
            ranked_true(),
            vec![FactCheckEntry::review("c", "False", "p", "u")],
            Some(summary("unrelated")),
            vec![SearchEntry::result("t", "s", "l")],
        );

        assert_eq!(bundle.final_verdict, "False");
        assert_eq!(bundle.ai_verdicts.len(), 2);
        assert!(bundle.encyclopedia.is_some());
        assert_eq!(bundle.search_results.len(), 1);
        assert_eq!(bundle.top_ai_verdict().map(|s| s.label), Some(Label::True));

        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["text"], "Vaccines cause autism");
        assert_eq!(json["best_ai_verdict"], "False");
        assert_eq!(json["basis"], "fact_check");
        assert_eq!(json["google_fact_checks"][0]["verdict"], "False");
        assert_eq!(json["google_search_results"][0]["link"], "l");
        assert_eq!(json["wikipedia_summary"]["summary"], "unrelated");
        assert!(json.get("claim").is_none());

        let back: VerdictBundle = serde_json::from_value(json).unwrap();
        assert_eq!(back, bundle);
    }
}
