//! Integration tests for the gateway routes

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt; // for oneshot

use verity_classifier::{ClassifierError, EntailmentClassifier};
use verity_core::{
    EncyclopediaSummary, FactCheckEntry, Label, LabelScore, LabelSet, SearchEntry, VerdictBasis,
    VerdictBundle,
};
use verity_gateway::cors_layer;
use verity_gateway::handlers::{create_router, AppState, ErrorResponse, HealthResponse, MessageResponse};
use verity_runtime::{AggregateError, AggregatorConfig, ClaimEvaluator, VerdictAggregator};
use verity_sources::{EncyclopediaSource, FactCheckSource, WebSearchSource, SEARCH_DISABLED};

struct FixedClassifier;

#[async_trait]
impl EntailmentClassifier for FixedClassifier {
    async fn classify(&self, text: &str, _labels: &LabelSet) -> Result<Vec<LabelScore>, ClassifierError> {
        if text.contains("explode") {
            panic!("classifier crashed");
        }
        Ok(vec![
            LabelScore::new(Label::True, 81.5),
            LabelScore::new(Label::False, 12.0),
            LabelScore::new(Label::NotSure, 6.5),
        ])
    }

    fn name(&self) -> &str {
        "fixed-nli"
    }
}

/// Reviews only claims mentioning vaccines
struct VaccineFactChecks {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl FactCheckSource for VaccineFactChecks {
    async fn lookup(&self, query: &str) -> Vec<FactCheckEntry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if query.to_lowercase().contains("vaccines") {
            vec![FactCheckEntry::review(
                "Vaccines cause autism",
                "False",
                "Science Feedback",
                "https://sciencefeedback.co/claim-review",
            )]
        } else {
            Vec::new()
        }
    }
}

/// Knows one article
struct FlatEarthArticle;

#[async_trait]
impl EncyclopediaSource for FlatEarthArticle {
    async fn summarize(&self, query: &str) -> Option<EncyclopediaSummary> {
        query.to_lowercase().contains("earth").then(|| EncyclopediaSummary {
            title: "Flat Earth".to_string(),
            summary: "Flat Earth is an archaic and scientifically disproven conception of Earth's shape."
                .to_string(),
            url: "https://en.wikipedia.org/wiki/Flat_Earth".to_string(),
        })
    }
}

struct DisabledSearch;

#[async_trait]
impl WebSearchSource for DisabledSearch {
    async fn search(&self, _query: &str) -> Vec<SearchEntry> {
        vec![SearchEntry::disabled(SEARCH_DISABLED)]
    }
}

/// Fails every request after validation, as a cancelled join would
struct FailingEvaluator;

#[async_trait]
impl ClaimEvaluator for FailingEvaluator {
    async fn evaluate(&self, _text: &str) -> Result<VerdictBundle, AggregateError> {
        Err(AggregateError::Aggregation {
            stage: "join",
            reason: "task was cancelled".to_string(),
        })
    }

    fn classifier_name(&self) -> &str {
        "failing"
    }
}

const WEB_CLIENT: &str = "http://localhost:3000";

fn router_for(evaluator: Arc<dyn ClaimEvaluator>) -> Router {
    let cors = cors_layer(&[WEB_CLIENT.to_string()]).unwrap();
    create_router(AppState::new(evaluator), cors)
}

fn create_test_app() -> (Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let aggregator = VerdictAggregator::new(AggregatorConfig::new(
        Arc::new(FixedClassifier),
        Arc::new(VaccineFactChecks {
            calls: calls.clone(),
        }),
        Arc::new(FlatEarthArticle),
        Arc::new(DisabledSearch),
    ));
    (router_for(Arc::new(aggregator)), calls)
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/fact-check")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_root_banner() {
    let (app, _) = create_test_app();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let banner: MessageResponse = read_body(response).await;
    assert_eq!(banner.message, "Verity fact-check backend running");
}

#[tokio::test]
async fn test_health_reports_classifier() {
    let (app, _) = create_test_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = read_body(response).await;
    assert_eq!(health.status, "ok");
    assert_eq!(health.classifier, "fixed-nli");
}

#[tokio::test]
async fn test_flat_earth_claim() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(post_json(r#"{"text": "The earth is flat"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bundle: VerdictBundle = read_body(response).await;
    assert_eq!(bundle.claim.as_str(), "The earth is flat");
    assert_eq!(bundle.final_verdict, "false");
    assert_eq!(bundle.basis, VerdictBasis::EncyclopediaContradicted);
    assert_eq!(bundle.ai_verdicts.len(), 3);
    assert!(bundle.fact_checks.is_empty());
    assert_eq!(bundle.search_results, vec![SearchEntry::disabled(SEARCH_DISABLED)]);
}

#[tokio::test]
async fn test_fact_check_overrides_classifier() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(post_json(r#"{"text": "Vaccines cause autism"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bundle: VerdictBundle = read_body(response).await;
    assert_eq!(bundle.top_ai_verdict().unwrap().label, Label::True);
    assert_eq!(bundle.final_verdict, "False");
    assert_eq!(bundle.basis, VerdictBasis::FactCheck);
}

#[tokio::test]
async fn test_wire_format() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(post_json(r#"{"text": "Vaccines cause autism"}"#))
        .await
        .unwrap();

    let json: serde_json::Value = read_body(response).await;
    assert_eq!(json["text"], "Vaccines cause autism");
    assert!(json.get("claim").is_none());
    assert_eq!(json["best_ai_verdict"], "False");
    assert_eq!(json["basis"], "fact_check");
    assert_eq!(json["ai_verdicts"][0]["label"], "true");
    assert_eq!(json["ai_verdicts"][0]["confidence"], 81.5);

    let review = &json["google_fact_checks"][0];
    assert_eq!(review["verdict"], "False");
    assert_eq!(review["source"], "Science Feedback");
    assert_eq!(review["source_url"], "https://sciencefeedback.co/claim-review");
    assert!(review.get("type").is_none());

    assert_eq!(json["google_search_results"][0]["disabled"], SEARCH_DISABLED);
    assert!(json["wikipedia_summary"].is_null());
}

#[tokio::test]
async fn test_preflight_from_web_client() {
    let (app, _) = create_test_app();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/fact-check")
        .header("origin", WEB_CLIENT)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], WEB_CLIENT);
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert!(headers["access-control-allow-methods"]
        .to_str()
        .unwrap()
        .contains("POST"));
    assert!(headers["access-control-allow-headers"]
        .to_str()
        .unwrap()
        .contains("content-type"));
}

#[tokio::test]
async fn test_post_from_web_client_carries_cors_headers() {
    let (app, _) = create_test_app();
    let mut request = post_json(r#"{"text": "The earth is flat"}"#);
    request
        .headers_mut()
        .insert("origin", WEB_CLIENT.parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], WEB_CLIENT);
}

#[tokio::test]
async fn test_unknown_origin_gets_no_cors_grant() {
    let (app, _) = create_test_app();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/fact-check")
        .header("origin", "https://elsewhere.example.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_empty_claim_is_rejected_without_lookups() {
    let (app, calls) = create_test_app();

    let response = app.oneshot(post_json(r#"{"text": "   "}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_body(response).await;
    assert_eq!(error.error, "No text provided");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let (app, calls) = create_test_app();

    let response = app.oneshot(post_json(r#"{"claim": "x"}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_body(response).await;
    assert!(error.error.contains("text"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _) = create_test_app();

    let response = app.oneshot(post_json("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_body(response).await;
    assert!(!error.error.is_empty());
}

#[tokio::test]
async fn test_missing_content_type_is_bad_request() {
    let (app, _) = create_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/fact-check")
        .body(Body::from(r#"{"text": "x"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_panicking_classifier_still_answers() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(post_json(r#"{"text": "Batteries explode in cold weather"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bundle: VerdictBundle = read_body(response).await;
    assert!(bundle.ai_verdicts.is_empty());
    assert_eq!(bundle.final_verdict, "Unknown");
    assert_eq!(bundle.basis, VerdictBasis::Unresolved);
}

#[tokio::test]
async fn test_aggregation_failure_is_server_error() {
    let app = router_for(Arc::new(FailingEvaluator));

    let response = app
        .oneshot(post_json(r#"{"text": "Batteries explode in cold weather"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = read_body(response).await;
    assert!(error.error.starts_with("Error processing request: "));
    assert!(error.error.contains("cancelled"));
}
