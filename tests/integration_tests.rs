//! Integration tests for the serverless adapter.

use bytes::Bytes;
use carinsight_gateway::app::CarInsightApp;
use carinsight_gateway::prelude::*;
use carinsight_gateway::services::{
    AnalysisGateway, ChatMessage, MemoryStore, ServiceError,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records what it was called with and answers with fixed headers.
#[derive(Default)]
struct RecordingApp {
    calls: AtomicUsize,
    last: Mutex<Option<(String, String, String, Option<String>)>>,
}

impl Application for RecordingApp {
    fn call(&self, mut environ: Environ) -> Result<AppResponse, ApplicationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = String::from_utf8(environ.read_body()?).unwrap_or_default();
        *self.last.lock().unwrap() = Some((
            environ.path_info.clone(),
            environ.query_string.clone(),
            body,
            environ.header("Authorization").map(str::to_string),
        ));

        Ok(AppResponse::new(200)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Methods", "GET")
            .header("Access-Control-Allow-Origin", "https://elsewhere.example")
            .body(r#"{"ok":true}"#))
    }
}

fn recording_adapter() -> (Adapter, Arc<RecordingApp>) {
    let app = Arc::new(RecordingApp::default());
    let adapter = Adapter::new(
        GatewayConfig::default(),
        AppCell::ready(app.clone() as Arc<dyn Application>),
    );
    (adapter, app)
}

#[test]
fn test_query_suffix_is_split_from_path() {
    let (adapter, app) = recording_adapter();
    adapter.handle_json(&json!({"method": "GET", "path": "/listings/?make=Honda"}));

    let (path, query, _, _) = app.last.lock().unwrap().clone().unwrap();
    assert_eq!(path, "/listings/");
    assert_eq!(query, "make=Honda");
}

#[test]
fn test_mount_prefix_is_stripped() {
    let (adapter, app) = recording_adapter();

    adapter.handle_json(&json!({"path": "/api/users"}));
    assert_eq!(app.last.lock().unwrap().clone().unwrap().0, "/users");

    adapter.handle_json(&json!({"path": "/api"}));
    assert_eq!(app.last.lock().unwrap().clone().unwrap().0, "/");
}

#[test]
fn test_origin_header_lookup_ignores_case() {
    let (adapter, _) = recording_adapter();
    for key in ["Origin", "ORIGIN", "origin"] {
        let response = adapter.handle_json(&json!({
            "path": "/cars",
            "headers": {key: "https://foo.vercel.app"},
        }));
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some("https://foo.vercel.app")
        );
    }
}

#[test]
fn test_options_never_reaches_application() {
    let (adapter, app) = recording_adapter();
    let response = adapter.handle_json(&json!({
        "method": "OPTIONS",
        "path": "/api/users",
        "headers": {"Origin": "https://foo.vercel.app"},
    }));

    assert_eq!(app.calls.load(Ordering::SeqCst), 0);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "");
    assert_eq!(
        response.header("Access-Control-Allow-Methods"),
        Some("GET, POST, PUT, DELETE, OPTIONS")
    );
    assert_eq!(
        response.header("Access-Control-Allow-Headers"),
        Some("Content-Type, Authorization")
    );
    assert_eq!(response.header("Access-Control-Max-Age"), Some("3600"));
    assert_eq!(
        response.header("Access-Control-Allow-Origin"),
        Some("https://foo.vercel.app")
    );
    assert_eq!(response.header("Access-Control-Allow-Credentials"), Some("true"));
}

#[test]
fn test_platform_origin_is_echoed() {
    let (adapter, _) = recording_adapter();
    let response = adapter.handle_json(&json!({
        "path": "/cars",
        "headers": {"Origin": "https://foo.vercel.app"},
    }));

    assert_eq!(
        response.header("Access-Control-Allow-Origin"),
        Some("https://foo.vercel.app")
    );
    assert_eq!(response.header("Access-Control-Allow-Credentials"), Some("true"));
}

#[test]
fn test_any_origin_is_echoed_with_credentials() {
    let (adapter, _) = recording_adapter();
    let response = adapter.handle_json(&json!({
        "path": "/cars",
        "headers": {"Origin": "https://not-the-platform.example"},
    }));

    assert_eq!(
        response.header("Access-Control-Allow-Origin"),
        Some("https://not-the-platform.example")
    );
    assert_eq!(response.header("Access-Control-Allow-Credentials"), Some("true"));
}

#[test]
fn test_missing_origin_is_wildcard_without_credentials() {
    let (adapter, _) = recording_adapter();
    let response = adapter.handle_json(&json!({"path": "/cars"}));

    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(response.header("Access-Control-Allow-Credentials"), Some("false"));
}

#[test]
fn test_cors_overwrites_application_headers() {
    let (adapter, _) = recording_adapter();
    let response = adapter.handle_json(&json!({"path": "/cars"}));

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, r#"{"ok":true}"#);
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    assert_eq!(
        response.header("Access-Control-Allow-Methods"),
        Some("GET, POST, PUT, DELETE, OPTIONS")
    );
    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(response.header("Access-Control-Expose-Headers"), Some("Authorization"));
}

#[test]
fn test_structured_query_round_trip() {
    let (adapter, app) = recording_adapter();
    adapter.handle_json(&json!({"path": "/listings", "query": {"make": ["Honda", "Toyota"]}}));

    assert_eq!(
        app.last.lock().unwrap().clone().unwrap().1,
        "make=Honda&make=Toyota"
    );
}

#[test]
fn test_property_backed_event() {
    let (adapter, app) = recording_adapter();
    let event = GatewayRequest::new()
        .method("post")
        .url("https://carinsight.vercel.app/api/users/?source=web")
        .header("Authorization", "Bearer t0k3n")
        .header("Content-Type", "application/json")
        .body(Bytes::from_static(br#"{"name":"Ann"}"#));

    let response = adapter.handle(&event);
    assert_eq!(response.status_code, 200);

    let (path, query, body, auth) = app.last.lock().unwrap().clone().unwrap();
    assert_eq!(path, "/users/");
    assert_eq!(query, "source=web");
    assert_eq!(body, r#"{"name":"Ann"}"#);
    assert_eq!(auth.as_deref(), Some("Bearer t0k3n"));
}

/// Fails part way through its body and counts closes.
struct BrokenStreamApp {
    closes: Arc<AtomicUsize>,
}

struct BrokenBody {
    emitted: bool,
    closes: Arc<AtomicUsize>,
}

impl Iterator for BrokenBody {
    type Item = Result<Bytes, ApplicationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted {
            Some(Err(ApplicationError::new("connection to document store lost")))
        } else {
            self.emitted = true;
            Some(Ok(Bytes::from_static(b"{\"partial\":")))
        }
    }
}

impl BodyChunks for BrokenBody {
    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Application for BrokenStreamApp {
    fn call(&self, _environ: Environ) -> Result<AppResponse, ApplicationError> {
        Ok(AppResponse::new(200).chunks(BrokenBody {
            emitted: false,
            closes: self.closes.clone(),
        }))
    }
}

#[test]
fn test_body_iteration_error_closes_once_and_returns_500() {
    let closes = Arc::new(AtomicUsize::new(0));
    let adapter = Adapter::with_app(
        GatewayConfig::default(),
        BrokenStreamApp {
            closes: closes.clone(),
        },
    );

    let response = adapter.handle_json(&json!({
        "path": "/users/1",
        "headers": {"origin": "https://foo.vercel.app"},
    }));

    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(response.status_code, 500);
    assert_eq!(
        response.header("Access-Control-Allow-Origin"),
        Some("https://foo.vercel.app")
    );
    let body: Value = response.json_body().unwrap();
    assert_eq!(body["type"], "ApplicationError");
    assert_eq!(body["error"], "connection to document store lost");
    assert!(body["traceback"].is_string());
}

/// Panics while producing the body.
struct PanickingBody {
    closes: Arc<AtomicUsize>,
}

impl Iterator for PanickingBody {
    type Item = Result<Bytes, ApplicationError>;

    fn next(&mut self) -> Option<Self::Item> {
        panic!("template rendering blew up");
    }
}

impl BodyChunks for PanickingBody {
    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct PanickingApp {
    closes: Arc<AtomicUsize>,
}

impl Application for PanickingApp {
    fn call(&self, _environ: Environ) -> Result<AppResponse, ApplicationError> {
        Ok(AppResponse::new(200).chunks(PanickingBody {
            closes: self.closes.clone(),
        }))
    }
}

#[test]
fn test_panic_during_iteration_is_contained() {
    let closes = Arc::new(AtomicUsize::new(0));
    let adapter = Adapter::with_app(
        GatewayConfig::default(),
        PanickingApp {
            closes: closes.clone(),
        },
    );

    let response = adapter.handle_json(&json!({"path": "/x"}));

    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(response.status_code, 500);
    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    let body: Value = response.json_body().unwrap();
    assert_eq!(body["type"], "ApplicationError");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("template rendering blew up"));
}

struct BinaryApp;

impl Application for BinaryApp {
    fn call(&self, _environ: Environ) -> Result<AppResponse, ApplicationError> {
        Ok(AppResponse::new(200).body(vec![0x25u8, 0x50, 0x44, 0x46, 0xe2, 0xe3]))
    }
}

#[test]
fn test_non_utf8_body_is_returned_raw() {
    let adapter = Adapter::with_app(GatewayConfig::default(), BinaryApp);
    let response = adapter.handle_json(&json!({"path": "/report.pdf"}));

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "b'%PDF\\xe2\\xe3'");
}

#[test]
fn test_gateway_response_shape() {
    let (adapter, _) = recording_adapter();
    let response = adapter.handle_json(&json!({"path": "/cars"}));
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["statusCode"], 200);
    assert!(value["headers"].is_object());
    assert!(value["body"].is_string());
}

#[test]
fn test_shutdown_runs_once() {
    struct Closing(Arc<AtomicUsize>);

    impl Application for Closing {
        fn call(&self, _environ: Environ) -> Result<AppResponse, ApplicationError> {
            Ok(AppResponse::new(204))
        }

        fn shutdown(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let shutdowns = Arc::new(AtomicUsize::new(0));
    let adapter = Adapter::with_app(GatewayConfig::default(), Closing(shutdowns.clone()));
    adapter.shutdown();
    adapter.shutdown();
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
}

// CarInsight API behind the adapter

struct FixedAnalysis;

impl AnalysisGateway for FixedAnalysis {
    fn analyze_vehicle(&self, vehicle: &Value) -> Result<Value, ServiceError> {
        Ok(json!({"rating": 8, "summary": format!("{} looks fine", vehicle["make"].as_str().unwrap_or("?"))}))
    }

    fn build_checklist(&self, _vehicle: &Value) -> Result<Value, ServiceError> {
        Ok(json!(["Check tires", "Inspect brakes"]))
    }

    fn estimate_insurance(&self, _vehicle: &Value) -> Result<Value, ServiceError> {
        Err(ServiceError::Backend("rate service timed out".into()))
    }

    fn chat(&self, _vehicle: &Value, history: &[ChatMessage]) -> Result<ChatMessage, ServiceError> {
        Ok(ChatMessage {
            role: "assistant".into(),
            content: format!("You sent {} messages", history.len()),
        })
    }
}

fn carinsight_adapter(with_analysis: bool) -> Adapter {
    let store = Arc::new(MemoryStore::new());
    let mut app = CarInsightApp::new(store.clone(), store);
    if with_analysis {
        app = app.with_analysis(Arc::new(FixedAnalysis));
    }
    Adapter::with_app(GatewayConfig::default(), app)
}

fn user_payload() -> Value {
    json!({
        "userId": "user-1",
        "name": "John Doe",
        "budgetMin": 10000,
        "budgetMax": 50000,
        "make": "Toyota",
        "model": "Camry",
        "zipCode": "08544",
        "yearMin": 2018,
        "yearMax": 2024,
        "comfortLevel": "sedan"
    })
}

#[test]
fn test_user_crud_through_adapter() {
    let adapter = carinsight_adapter(false);
    let origin = json!({"Origin": "https://carinsight.vercel.app", "Content-Type": "application/json"});

    let created = adapter.handle_json(&json!({
        "method": "POST", "path": "/api/users/", "headers": origin, "body": user_payload(),
    }));
    assert_eq!(created.status_code, 201);
    let body: Value = created.json_body().unwrap();
    assert_eq!(body["user"]["_id"], "user-1");
    assert_eq!(body["user"]["profile"]["make"], "Toyota");

    let fetched = adapter.handle_json(&json!({"path": "/api/users/user-1"}));
    assert_eq!(fetched.status_code, 200);

    let updated = adapter.handle_json(&json!({
        "method": "PUT", "path": "/api/users/user-1", "body": {"make": "Honda"},
    }));
    assert_eq!(updated.status_code, 200);

    let search = adapter.handle_json(&json!({
        "method": "POST", "path": "/api/users/user-1/searches",
        "body": {"filters": {"make": "Honda", "maxPrice": 25000}},
    }));
    assert_eq!(search.status_code, 200);

    let searches = adapter.handle_json(&json!({
        "path": "/api/users/user-1/searches", "query": {"limit": 5},
    }));
    let body: Value = searches.json_body().unwrap();
    assert_eq!(body["searches"][0]["filters"]["make"], "Honda");

    let deleted = adapter.handle_json(&json!({"method": "DELETE", "path": "/api/users/user-1"}));
    assert_eq!(deleted.status_code, 200);
    let missing = adapter.handle_json(&json!({"path": "/api/users/user-1"}));
    assert_eq!(missing.status_code, 404);
    assert_eq!(missing.header("Access-Control-Allow-Origin"), Some("*"));
}

#[test]
fn test_user_creation_reports_missing_fields() {
    let adapter = carinsight_adapter(false);
    let response = adapter.handle_json(&json!({
        "method": "POST", "path": "/api/users/", "body": {"name": "Ann", "make": "Kia"},
    }));

    assert_eq!(response.status_code, 400);
    let body: Value = response.json_body().unwrap();
    assert_eq!(
        body["error"],
        "Missing required fields: budgetMin, budgetMax, zipCode, yearMin, yearMax, comfortLevel"
    );
}

#[test]
fn test_recommendations_through_adapter() {
    let adapter = carinsight_adapter(false);
    let created = adapter.handle_json(&json!({
        "method": "POST",
        "path": "/api/recommendations/",
        "body": {
            "recommendationId": "rec-1",
            "userId": "user-1",
            "recommendations": [{"make": "Toyota", "model": "Camry", "year": 2021, "price": 23999}],
            "searchCriteria": {"budget": 50000, "carType": "sedan"}
        },
    }));
    assert_eq!(created.status_code, 201);

    let invalid = adapter.handle_json(&json!({
        "method": "POST",
        "path": "/api/recommendations/",
        "body": {"userId": "user-1", "recommendations": []},
    }));
    assert_eq!(invalid.status_code, 400);

    let listed = adapter.handle_json(&json!({"path": "/api/recommendations/user/user-1"}));
    let body: Value = listed.json_body().unwrap();
    assert_eq!(body["recommendations"][0]["_id"], "rec-1");

    let one = adapter.handle_json(&json!({"path": "/api/recommendations/rec-1"}));
    assert_eq!(one.status_code, 200);
    let none = adapter.handle_json(&json!({"path": "/api/recommendations/rec-9"}));
    assert_eq!(none.status_code, 404);
}

#[test]
fn test_analysis_routes() {
    let unconfigured = carinsight_adapter(false);
    let response = unconfigured.handle_json(&json!({
        "method": "POST", "path": "/api/ai-analysis/", "body": {"make": "Toyota"},
    }));
    assert_eq!(response.status_code, 503);

    let adapter = carinsight_adapter(true);
    let response = adapter.handle_json(&json!({
        "method": "POST", "path": "/api/ai-analysis/", "body": {"make": "Toyota", "year": 2018},
    }));
    assert_eq!(response.status_code, 200);
    let body: Value = response.json_body().unwrap();
    assert_eq!(body["vehicle"]["make"], "Toyota");
    assert_eq!(body["aiAnalysis"]["summary"], "Toyota looks fine");

    let response = adapter.handle_json(&json!({
        "method": "POST", "path": "/api/ai-analysis/chat",
        "body": {"car": {"make": "Toyota"}, "messages": [{"role": "user", "content": "Is it reliable?"}]},
    }));
    let body: Value = response.json_body().unwrap();
    assert_eq!(body["reply"]["content"], "You sent 1 messages");

    let response = adapter.handle_json(&json!({
        "method": "POST", "path": "/api/ai-analysis/insurance", "body": {"make": "Toyota"},
    }));
    assert_eq!(response.status_code, 500);
    let body: Value = response.json_body().unwrap();
    assert_eq!(body["error"], "Server error: backend error: rate service timed out");
}

#[test]
fn test_unknown_route_and_method() {
    let adapter = carinsight_adapter(false);

    let response = adapter.handle_json(&json!({"path": "/api/garages"}));
    assert_eq!(response.status_code, 404);

    let response = adapter.handle_json(&json!({"method": "PATCH", "path": "/api/users/1"}));
    assert_eq!(response.status_code, 405);
    assert_eq!(
        response.header("Access-Control-Allow-Methods"),
        Some("GET, POST, PUT, DELETE, OPTIONS")
    );
}
