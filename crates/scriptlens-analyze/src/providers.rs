//! Completion clients.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API with the system prompt lifted out of the message list.
//! Requests are non-streaming; each call returns the full reply text.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error};

use crate::config::{LLMConfig, ResolvedProvider};
use crate::types::{CompletionRequest, LLMProvider};
use scriptlens_core::{Error, Result};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// Something that turns a completion request into reply text.
#[allow(async_fn_in_trait)]
pub trait CompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Completion client for the hosted provider APIs.
pub struct HttpCompletionClient {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: String,
    endpoint: String,
}

impl HttpCompletionClient {
    pub fn new(resolved: ResolvedProvider, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;
        let endpoint = match resolved.provider {
            LLMProvider::OpenAI => OPENAI_URL,
            LLMProvider::Groq => GROQ_URL,
            LLMProvider::Anthropic => ANTHROPIC_URL,
        };
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            provider: resolved.provider,
            model: resolved.model,
            api_key: resolved.api_key,
        })
    }

    /// Build from configuration. Fails if no provider has an API key.
    pub fn from_config(config: &LLMConfig) -> Result<Self> {
        let resolved = config.resolve_provider().ok_or_else(|| {
            Error::Config(
                "no LLM API key configured (set OPENAI_API_KEY, ANTHROPIC_API_KEY or GROQ_API_KEY)"
                    .to_string(),
            )
        })?;
        Self::new(resolved, Duration::from_secs(config.timeout_secs))
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send requests to `url` instead of the provider's public endpoint.
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn complete_openai_compat(&self, request: &CompletionRequest) -> Result<String> {
        let msgs: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();
        let body = json!({
            "model": self.model,
            "messages": msgs,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        debug!(
            "Requesting completion from {} with model {}",
            self.endpoint, self.model
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Completion(format!("Request failed: {}", e)))?;
        let parsed = read_json(response).await?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::Completion("reply has no message content".to_string()))
    }

    async fn complete_anthropic(&self, request: &CompletionRequest) -> Result<String> {
        // Separate system message from conversation
        let system_msg: Option<&str> = request
            .messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str());
        let conv_msgs: Vec<serde_json::Value> = request
            .messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": conv_msgs,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });
        if let Some(sys) = system_msg {
            body["system"] = json!(sys);
        }

        debug!("Requesting completion from Anthropic with model {}", self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Completion(format!("Request failed: {}", e)))?;
        let parsed = read_json(response).await?;

        let text: String = parsed["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "text")
                    .filter_map(|b| b["text"].as_str())
                    .collect()
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Err(Error::Completion("reply has no text content".to_string()));
        }
        Ok(text)
    }
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("Completion API error {}", status);
        return Err(Error::Completion(format!("API error {}: {}", status, body)));
    }
    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| Error::Completion(format!("Malformed reply: {}", e)))
}

impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        match self.provider {
            LLMProvider::OpenAI | LLMProvider::Groq => self.complete_openai_compat(request).await,
            LLMProvider::Anthropic => self.complete_anthropic(request).await,
        }
    }
}

/// Client that replays canned replies in order and records every request.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().push_back(Ok(reply.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .push_back(Err(Error::Completion(message.into())));
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Completion("no scripted reply left".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// What the stub server received, with the request head lowercased.
    struct Received {
        head: String,
        body: serde_json::Value,
    }

    /// Answer exactly one HTTP request with `status` and `reply`.
    async fn serve_once(status: &str, reply: &str) -> (String, JoinHandle<Received>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/v1/complete", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reply.len(),
            reply
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before the request head");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < head_end + content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            let body = serde_json::from_slice(&buf[head_end..]).unwrap_or(serde_json::Value::Null);
            Received { head, body }
        });
        (url, handle)
    }

    fn client_for(provider: LLMProvider, url: &str) -> HttpCompletionClient {
        let resolved = ResolvedProvider {
            provider,
            model: "test-model".into(),
            api_key: "sk-test".into(),
        };
        HttpCompletionClient::new(resolved, Duration::from_secs(5))
            .unwrap()
            .with_endpoint(url)
    }

    #[tokio::test]
    async fn test_chat_completions_reply() {
        for provider in [LLMProvider::OpenAI, LLMProvider::Groq] {
            let (url, server) = serve_once(
                "200 OK",
                r#"{"choices": [{"message": {"role": "assistant", "content": "두 사람이 금고를 턴다."}}]}"#,
            )
            .await;
            let client = client_for(provider, &url);

            let reply = client
                .complete(&CompletionRequest::new("sys", "hello"))
                .await
                .unwrap();
            assert_eq!(reply, "두 사람이 금고를 턴다.");

            let received = server.await.unwrap();
            assert!(received.head.starts_with("post /v1/complete "));
            assert!(received.head.contains("authorization: bearer sk-test"));
            assert_eq!(received.body["model"], "test-model");
            assert_eq!(received.body["messages"].as_array().unwrap().len(), 2);
            assert_eq!(received.body["messages"][0]["role"], "system");
        }
    }

    #[tokio::test]
    async fn test_anthropic_reply() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"content": [{"type": "text", "text": "민수와 "}, {"type": "tool_use", "id": "t1"}, {"type": "text", "text": "지영"}]}"#,
        )
        .await;
        let client = client_for(LLMProvider::Anthropic, &url);

        let reply = client
            .complete(&CompletionRequest::new("sys", "hello"))
            .await
            .unwrap();
        assert_eq!(reply, "민수와 지영");

        let received = server.await.unwrap();
        assert!(received.head.contains("x-api-key: sk-test"));
        assert!(received.head.contains("anthropic-version: 2023-06-01"));
        assert_eq!(received.body["system"], "sys");
        let messages = received.body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "hello");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let (url, server) =
            serve_once("429 Too Many Requests", r#"{"error": "rate limited"}"#).await;
        let client = client_for(LLMProvider::OpenAI, &url);

        let result = client.complete(&CompletionRequest::new("sys", "hello")).await;
        assert!(matches!(
            result,
            Err(Error::Completion(ref m)) if m.contains("429") && m.contains("rate limited")
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_replies() {
        let (url, server) = serve_once("200 OK", "not json").await;
        let client = client_for(LLMProvider::Groq, &url);
        let result = client.complete(&CompletionRequest::new("sys", "hello")).await;
        assert!(matches!(result, Err(Error::Completion(ref m)) if m.starts_with("Malformed reply")));
        server.await.unwrap();

        let (url, server) = serve_once("200 OK", r#"{"choices": []}"#).await;
        let client = client_for(LLMProvider::OpenAI, &url);
        assert!(matches!(
            client.complete(&CompletionRequest::new("sys", "hello")).await,
            Err(Error::Completion(_))
        ));
        server.await.unwrap();

        let (url, server) = serve_once("200 OK", r#"{"content": []}"#).await;
        let client = client_for(LLMProvider::Anthropic, &url);
        assert!(matches!(
            client.complete(&CompletionRequest::new("sys", "hello")).await,
            Err(Error::Completion(ref m)) if m == "reply has no text content"
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_scripted_client_replays_in_order() {
        let client = ScriptedClient::new(["first", "second"]);
        client.push_error("rate limited");

        let req = CompletionRequest::new("sys", "hello");
        assert_eq!(client.complete(&req).await.unwrap(), "first");
        assert_eq!(client.complete(&req).await.unwrap(), "second");
        assert!(matches!(
            client.complete(&req).await,
            Err(Error::Completion(m)) if m == "rate limited"
        ));
        assert!(client.complete(&req).await.is_err());
        assert_eq!(client.requests().len(), 4);
        assert_eq!(client.requests()[0].user_content(), "hello");
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = LLMConfig {
            preferred_provider: "openai".into(),
            ..LLMConfig::default()
        };
        assert!(matches!(
            HttpCompletionClient::from_config(&config),
            Err(Error::Config(_))
        ));

        let config = LLMConfig {
            groq_api_key: Some("gsk".into()),
            ..LLMConfig::default()
        };
        let client = HttpCompletionClient::from_config(&config).unwrap();
        assert_eq!(client.provider(), LLMProvider::Groq);
        assert_eq!(client.model(), crate::config::DEFAULT_GROQ_MODEL);
        assert_eq!(client.endpoint(), GROQ_URL);
    }
}
