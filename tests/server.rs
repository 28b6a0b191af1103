//! HTTP API tests against an in-process server with stub model clients.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

use rfp_analyzer::config::Config;
use rfp_analyzer::embedding::{DisabledEmbedder, Embedder};
use rfp_analyzer::llm::TextGenerator;
use rfp_analyzer::server::{run_server_with, AppState};

/// Extraction prompts get a record; answer prompts get the question echoed.
struct CannedGenerator;

#[async_trait]
impl TextGenerator for CannedGenerator {
    fn model_name(&self) -> &str {
        "canned"
    }

    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String> {
        if prompt.contains("\"RFP_File\": \"cover-letter.txt\"") {
            return Ok("Thank you for the opportunity.".to_string());
        }
        if prompt.contains("\"RFP_File\": \"offline.txt\"") {
            anyhow::bail!("LLM API error 503: overloaded");
        }
        if let Some(question) = prompt.split("Question:\n").nth(1) {
            let question = question.split("\n\n").next().unwrap_or_default();
            return Ok(format!("Answer to: {}", question));
        }
        Ok(r#"{"Project_Type": "Portal", "Required_Skills": ["React", "Go"], "Tasks_Roles": [{"Role": "QA", "Tasks": []}], "Timeline": {"Phases": [{"Phase": "Build", "Duration_Days": 10}]}}"#.to_string())
    }
}

/// One dimension per keyword: "budget" and "deadline".
struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> &str {
        "keywords"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                vec![
                    lower.matches("budget").count() as f32,
                    lower.matches("deadline").count() as f32,
                ]
            })
            .collect())
    }
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Start a server and return its base URL. The TempDir holds the skills file.
async fn start_server(embedder: Arc<dyn Embedder>) -> (TempDir, String) {
    let tmp = TempDir::new().unwrap();
    let skills_path = tmp.path().join("skills.json");
    std::fs::write(&skills_path, r#"{"Frontend": ["React", "CSS"]}"#).unwrap();

    let port = find_free_port();
    let mut config = Config::minimal();
    config.server.bind = format!("127.0.0.1:{}", port);
    config.skills.path = skills_path;
    config.retrieval.chunk_words = 8;
    config.retrieval.top_k = 1;

    let state = AppState::new(config, Arc::new(CannedGenerator), embedder);
    tokio::spawn(async move {
        run_server_with(state).await.unwrap();
    });
    wait_for_server(port).await;

    (tmp, format!("http://127.0.0.1:{}", port))
}

async fn post(base: &str, path: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}{}", base, path))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

fn record(file: &str, amount: f64, days: u32) -> Value {
    json!({
        "Project_Type": "Portal",
        "Required_Skills": ["React"],
        "Tasks_Roles": [{"Role": "Developer", "Tasks": ["build"]}],
        "Timeline": {
            "Phases": [{"Phase": "Build", "Duration_Days": days, "Estimated_Budget": amount}],
            "Total_Duration_Days": days
        },
        "Cost_Estimate": {"Amount": amount, "Currency": "INR", "Estimated": true},
        "RFP_File": file
    })
}

#[tokio::test]
async fn test_health() {
    let (_tmp, base) = start_server(Arc::new(DisabledEmbedder)).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_analyze() {
    let (_tmp, base) = start_server(Arc::new(DisabledEmbedder)).await;

    let (status, body) = post(
        &base,
        "/tools/analyze",
        json!({"file_name": "portal.txt", "text": "Build a portal."}),
    )
    .await;
    assert_eq!(status, 200);
    let result = &body["result"];
    assert_eq!(result["RFP_File"], "portal.txt");
    // The QA role has no tasks and is dropped.
    assert_eq!(result["Tasks_Roles"], json!([]));
    assert_eq!(result["Cost_Estimate"]["Amount"], 1000000.0);
    assert_eq!(result["Timeline"]["Total_Duration_Days"], 10);
}

#[tokio::test]
async fn test_analyze_unparseable_reply_is_an_error_record() {
    let (_tmp, base) = start_server(Arc::new(DisabledEmbedder)).await;

    let (status, body) = post(
        &base,
        "/tools/analyze",
        json!({"file_name": "cover-letter.txt", "text": "Dear sirs"}),
    )
    .await;
    assert_eq!(status, 200);
    assert!(body["result"]["error"].is_string());
    assert_eq!(body["result"]["raw_output"], "Thank you for the opportunity.");
}

#[tokio::test]
async fn test_analyze_errors() {
    let (_tmp, base) = start_server(Arc::new(DisabledEmbedder)).await;

    let (status, body) = post(
        &base,
        "/tools/analyze",
        json!({"file_name": "offline.txt", "text": "x"}),
    )
    .await;
    assert_eq!(status, 502);
    assert_eq!(body["error"]["code"], "upstream_error");

    let (status, body) = post(&base, "/tools/analyze", json!({"file_name": " ", "text": "x"})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_compare() {
    let (_tmp, base) = start_server(Arc::new(DisabledEmbedder)).await;

    let records = json!([
        record("a.txt", 2_000_000.0, 45),
        record("b.txt", 300_000.0, 12),
        {"RFP_File": "c.txt", "error": "No JSON object found in model output"}
    ]);
    let (status, body) = post(&base, "/tools/compare", json!({"records": records})).await;
    assert_eq!(status, 200);

    let report = &body["result"];
    assert_eq!(report["metrics"]["total_budget"], 2_300_000.0);
    assert_eq!(report["metrics"]["total_roles"], 2);
    assert_eq!(report["alerts"].as_array().unwrap().len(), 1);
    assert_eq!(report["alerts"][0]["rfp_file"], "a.txt");
    assert_eq!(report["skills"][0], json!({"name": "React", "count": 2}));
}

#[tokio::test]
async fn test_compare_edge_cases() {
    let (_tmp, base) = start_server(Arc::new(DisabledEmbedder)).await;

    let (status, body) = post(
        &base,
        "/tools/compare",
        json!({"records": [record("a.txt", 1.0, 1)]}),
    )
    .await;
    assert_eq!(status, 200);
    assert!(body["result"]["message"].is_string());

    let (status, body) = post(
        &base,
        "/tools/compare",
        json!({
            "records": [record("a.txt", 1.0, 1), record("b.txt", 1.0, 1)],
            "select": ["z.txt"]
        }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_skill_gap() {
    let (_tmp, base) = start_server(Arc::new(DisabledEmbedder)).await;

    let (status, body) = post(
        &base,
        "/tools/skill_gap",
        json!({"skills": ["react, Kubernetes", "css"]}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["covered"], json!(["react", "css"]));
    assert_eq!(body["result"]["missing"], json!(["Kubernetes"]));
}

#[tokio::test]
async fn test_skill_gap_missing_file_is_internal_error() {
    let (tmp, base) = start_server(Arc::new(DisabledEmbedder)).await;
    std::fs::remove_file(tmp.path().join("skills.json")).unwrap();

    let (status, body) = post(&base, "/tools/skill_gap", json!({"skills": ["Go"]})).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"]["code"], "internal");
}

#[tokio::test]
async fn test_ask_disabled_embeddings() {
    let (_tmp, base) = start_server(Arc::new(DisabledEmbedder)).await;

    let (status, body) = post(
        &base,
        "/tools/ask",
        json!({
            "question": "What is the budget?",
            "documents": [{"file_name": "a.txt", "text": "The budget is small."}]
        }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "embeddings_disabled");
}

#[tokio::test]
async fn test_ask() {
    let (_tmp, base) = start_server(Arc::new(KeywordEmbedder)).await;

    let (status, body) = post(
        &base,
        "/tools/ask",
        json!({
            "question": "What is the deadline?",
            "documents": [
                {"file_name": "a.txt", "text": "The budget is fifty lakh rupees overall."},
                {"file_name": "b.txt", "text": "The deadline is the end of March."}
            ]
        }),
    )
    .await;
    assert_eq!(status, 200, "body: {}", body);
    assert_eq!(body["result"]["answer"], "Answer to: What is the deadline?");
    let context = body["result"]["context"].as_array().unwrap();
    assert_eq!(context.len(), 1);
    assert!(context[0].as_str().unwrap().contains("deadline"));
}

#[tokio::test]
async fn test_ask_validation() {
    let (_tmp, base) = start_server(Arc::new(KeywordEmbedder)).await;

    let (status, body) = post(
        &base,
        "/tools/ask",
        json!({"question": "  ", "documents": [{"file_name": "a.txt", "text": "x"}]}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = post(
        &base,
        "/tools/ask",
        json!({"question": "Why?", "documents": []}),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_ask_blank_documents_is_bad_request() {
    let (_tmp, base) = start_server(Arc::new(KeywordEmbedder)).await;

    let (status, body) = post(
        &base,
        "/tools/ask",
        json!({
            "question": "What is the budget?",
            "documents": [
                {"file_name": "a.txt", "text": ""},
                {"file_name": "b.txt", "text": "  \n "}
            ]
        }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");
}
