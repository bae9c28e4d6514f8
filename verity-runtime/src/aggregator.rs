//! Verdict Aggregator
//!
//! Evaluates one claim end to end:
//! - Validates the claim before touching any source
//! - Runs the classifier and the three evidence sources as concurrent tasks
//! - Bounds each task with a timeout that degrades to the source's sentinel
//! - Contains a panicking task the same way
//! - Joins all four, then applies the precedence policy
//!
//! The aggregator holds only read-only handles, so one instance serves
//! every in-flight request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use verity_classifier::SharedClassifier;
use verity_core::{
    Claim, ClaimError, FactCheckEntry, LabelSet, SearchEntry, VerdictBundle,
    DEFAULT_SOURCE_TIMEOUT_SECS,
};
use verity_sources::{EncyclopediaSource, FactCheckSource, WebSearchSource};

/// Errors surfaced to the caller of [`VerdictAggregator::evaluate`]
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("{0}")]
    InvalidInput(#[from] ClaimError),

    #[error("Aggregation failed in {stage}: {reason}")]
    Aggregation { stage: &'static str, reason: String },
}

/// Anything that turns claim text into a verdict bundle
#[async_trait]
pub trait ClaimEvaluator: Send + Sync {
    async fn evaluate(&self, text: &str) -> Result<VerdictBundle, AggregateError>;

    /// Classifier identifier, for health output
    fn classifier_name(&self) -> &str;
}

/// Frame the claim so the classifier reads it as a fact-checking question
pub fn build_prompt(claim: &Claim) -> String {
    format!("Fact-check the claim: '{}'. Is this claim true or false?", claim)
}

/// Aggregator dependencies (pre-constructed)
pub struct AggregatorConfig {
    pub classifier: SharedClassifier,
    pub fact_checks: Arc<dyn FactCheckSource>,
    pub encyclopedia: Arc<dyn EncyclopediaSource>,
    pub web_search: Arc<dyn WebSearchSource>,
    /// Candidate labels offered to the classifier
    pub labels: LabelSet,
    /// Upper bound on each source call
    pub source_timeout: Duration,
}

impl AggregatorConfig {
    pub fn new(
        classifier: SharedClassifier,
        fact_checks: Arc<dyn FactCheckSource>,
        encyclopedia: Arc<dyn EncyclopediaSource>,
        web_search: Arc<dyn WebSearchSource>,
    ) -> Self {
        Self {
            classifier,
            fact_checks,
            encyclopedia,
            web_search,
            labels: LabelSet::default(),
            source_timeout: Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
        }
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_timeout(mut self, source_timeout: Duration) -> Self {
        self.source_timeout = source_timeout;
        self
    }
}

/// Reconciles classifier output and external evidence into one verdict
#[derive(Clone)]
pub struct VerdictAggregator {
    classifier: SharedClassifier,
    fact_checks: Arc<dyn FactCheckSource>,
    encyclopedia: Arc<dyn EncyclopediaSource>,
    web_search: Arc<dyn WebSearchSource>,
    labels: LabelSet,
    source_timeout: Duration,
}

impl VerdictAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            classifier: config.classifier,
            fact_checks: config.fact_checks,
            encyclopedia: config.encyclopedia,
            web_search: config.web_search,
            labels: config.labels,
            source_timeout: config.source_timeout,
        }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Evaluate a claim and return the verdict with all gathered evidence
    pub async fn evaluate(&self, text: &str) -> Result<VerdictBundle, AggregateError> {
        let claim = Claim::new(text)?;
        info!("Evaluating claim: {}", claim);

        let limit = self.source_timeout;
        let secs = limit.as_secs_f64();

        let classify = {
            let classifier = self.classifier.clone();
            let labels = self.labels.clone();
            let prompt = build_prompt(&claim);
            tokio::spawn(async move {
                match timeout(limit, classifier.classify(&prompt, &labels)).await {
                    Ok(Ok(scores)) => scores,
                    Ok(Err(e)) => {
                        warn!("Classifier {} failed: {}", classifier.name(), e);
                        Vec::new()
                    }
                    Err(_) => {
                        warn!("Classifier {} timed out after {:.1}s", classifier.name(), secs);
                        Vec::new()
                    }
                }
            })
        };

        let fact_checks = {
            let source = self.fact_checks.clone();
            let query = claim.as_str().to_string();
            tokio::spawn(async move {
                timeout(limit, source.lookup(&query)).await.unwrap_or_else(|_| {
                    warn!("Fact-check lookup timed out after {:.1}s", secs);
                    vec![FactCheckEntry::error(format!(
                        "Fact-check lookup timed out after {:.1}s",
                        secs
                    ))]
                })
            })
        };

        let encyclopedia = {
            let source = self.encyclopedia.clone();
            let query = claim.as_str().to_string();
            tokio::spawn(async move {
                timeout(limit, source.summarize(&query)).await.unwrap_or_else(|_| {
                    debug!("Encyclopedia lookup timed out after {:.1}s", secs);
                    None
                })
            })
        };

        let web_search = {
            let source = self.web_search.clone();
            let query = claim.as_str().to_string();
            tokio::spawn(async move {
                timeout(limit, source.search(&query)).await.unwrap_or_else(|_| {
                    warn!("Web search timed out after {:.1}s", secs);
                    vec![SearchEntry::error(format!("Web search timed out after {:.1}s", secs))]
                })
            })
        };

        let (ai_verdicts, fact_checks, encyclopedia, search_results) =
            tokio::join!(classify, fact_checks, encyclopedia, web_search);

        let bundle = VerdictBundle::assemble(
            claim,
            settle("classifier", ai_verdicts, |_| Vec::new())?,
            settle("fact-check", fact_checks, |message| vec![FactCheckEntry::error(message)])?,
            settle("encyclopedia", encyclopedia, |_| None)?,
            settle("web search", search_results, |message| vec![SearchEntry::error(message)])?,
        );

        info!(
            "Verdict for '{}': {} ({:?})",
            bundle.claim, bundle.final_verdict, bundle.basis
        );
        Ok(bundle)
    }
}

#[async_trait]
impl ClaimEvaluator for VerdictAggregator {
    async fn evaluate(&self, text: &str) -> Result<VerdictBundle, AggregateError> {
        VerdictAggregator::evaluate(self, text).await
    }

    fn classifier_name(&self) -> &str {
        VerdictAggregator::classifier_name(self)
    }
}

/// Resolve a joined task. A panic stays inside its source and becomes that
/// source's failure value; a cancelled task fails the whole evaluation.
fn settle<T>(
    stage: &'static str,
    joined: Result<T, JoinError>,
    degrade: impl FnOnce(String) -> T,
) -> Result<T, AggregateError> {
    match joined {
        Ok(value) => Ok(value),
        Err(e) if e.is_panic() => {
            warn!("{} task panicked: {}", stage, e);
            Ok(degrade(format!("{} lookup failed unexpectedly", stage)))
        }
        Err(e) => Err(AggregateError::Aggregation {
            stage,
            reason: e.to_string(),
        }),
    }
}
