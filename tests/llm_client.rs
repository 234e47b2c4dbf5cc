//! LLM client tests against a local mock chat-completions endpoint.

use echarts_mcp::chart::ChartError;
use echarts_mcp::config::LlmConfig;
use echarts_mcp::llm::LlmClient;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves one request with `status` and `body`, returning the request body it received.
async fn mock_endpoint(status: u16, body: String) -> (String, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(stream);

        let mut content_length = 0;
        let mut authorization = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                match name.to_ascii_lowercase().as_str() {
                    "content-length" => content_length = value.trim().parse().unwrap(),
                    "authorization" => authorization = value.trim().to_string(),
                    _ => {}
                }
            }
        }

        let mut request_body = vec![0; content_length];
        reader.read_exact(&mut request_body).await.unwrap();

        let response = format!(
            "HTTP/1.1 {status} Mock\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        reader.get_mut().write_all(response.as_bytes()).await.unwrap();
        reader.get_mut().shutdown().await.unwrap();

        let mut request: Value = serde_json::from_slice(&request_body).unwrap();
        request["authorization"] = json!(authorization);
        request
    });

    (url, handle)
}

fn client_for(url: String) -> LlmClient {
    let config = LlmConfig {
        api_url: url,
        api_key: Some("sk-test".to_string()),
        model: "mock-model".to_string(),
        timeout_secs: 5,
        ..LlmConfig::default()
    };
    LlmClient::new(&config).unwrap()
}

fn completion(content: &str) -> String {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }).to_string()
}

#[tokio::test]
async fn generates_config_from_fenced_reply() {
    let reply = "```json\n{\"xAxis\": {\"type\": \"category\"}, \"series\": [{\"type\": \"bar\"}]}\n```";
    let (url, server) = mock_endpoint(200, completion(reply)).await;

    let config = client_for(url)
        .generate_chart_config("bar chart of sales", Some(&json!({ "xAxis": ["q1"] })))
        .await
        .unwrap();
    assert_eq!(config["series"][0]["type"], "bar");

    let request = server.await.unwrap();
    assert_eq!(request["model"], "mock-model");
    assert_eq!(request["stream"], false);
    assert_eq!(request["authorization"], "Bearer sk-test");
    assert_eq!(request["messages"][0]["role"], "system");
    let user = request["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("bar chart of sales"));
    assert!(user.contains("q1"));
}

#[tokio::test]
async fn non_success_status_is_upstream_failure() {
    let (url, server) = mock_endpoint(401, json!({ "error": "bad key" }).to_string()).await;

    let err = client_for(url)
        .generate_chart_config("anything", None)
        .await
        .unwrap_err();
    server.await.unwrap();

    let ChartError::UpstreamFailure { message } = err else {
        panic!("expected upstream failure, got {err:?}");
    };
    assert!(message.contains("401"));
    assert!(message.contains("bad key"));
}

#[tokio::test]
async fn prose_reply_is_malformed() {
    let (url, server) = mock_endpoint(200, completion("Sure! Here is a chart.")).await;

    let err = client_for(url)
        .generate_chart_config("anything", None)
        .await
        .unwrap_err();
    server.await.unwrap();
    assert!(matches!(err, ChartError::MalformedResponse { .. }));
}

#[tokio::test]
async fn missing_choices_is_malformed() {
    let (url, server) = mock_endpoint(200, json!({ "choices": [] }).to_string()).await;

    let err = client_for(url)
        .generate_chart_config("anything", None)
        .await
        .unwrap_err();
    server.await.unwrap();
    assert!(matches!(err, ChartError::MalformedResponse { .. }));
}

#[tokio::test]
async fn unreachable_endpoint_is_upstream_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/v1/chat/completions", listener.local_addr().unwrap());
    drop(listener);

    let err = client_for(url)
        .generate_chart_config("anything", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ChartError::UpstreamFailure { .. }));
}
