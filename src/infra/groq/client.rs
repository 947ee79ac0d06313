use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::infra::groq::models::find_model;
use anyhow::{Context, Result, bail};
use futures::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sse_stream::SseStream;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Reply used when the API answers without any content.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// One `data:` payload of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamDelta {
    Content(String),
    Done,
    /// Keep-alives, role-only deltas and unparseable chunks.
    Skip,
}

/// Interprets a streamed chunk. Accepts the OpenAI delta shape
/// (`choices[0].delta.content`) and a bare `{"content": ...}` object.
pub fn parse_stream_data(data: &str) -> StreamDelta {
    let data = data.trim();
    if data == "[DONE]" {
        return StreamDelta::Done;
    }
    let Ok(value) = serde_json::from_str::<Value>(data) else {
        return StreamDelta::Skip;
    };
    value
        .pointer("/choices/0/delta/content")
        .or_else(|| value.get("content"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| StreamDelta::Content(s.to_string()))
        .unwrap_or(StreamDelta::Skip)
}

pub struct ChatClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
    model: String,
}

impl ChatClient {
    pub fn new(api_key: &str, base_url: &str, model: &str, connect_timeout: Duration) -> Result<Self> {
        let base = BasicClient::with_connect_timeout(connect_timeout)?;
        let http = ApiKey::bearer(base, api_key).context("invalid chat API key")?;
        Ok(Self::with_client(Arc::new(http), base_url, model))
    }

    pub fn with_client(http: Arc<dyn HttpClient>, base_url: &str, model: &str) -> Self {
        let mut client = Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: String::new(),
        };
        client.set_model(model);
        client
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: &str) {
        if find_model(model).is_none() {
            warn!(model, "Model is not in the known model list");
        }
        self.model = model.to_string();
    }

    fn request(&self, messages: &[ChatMessage], stream: bool) -> Result<Request> {
        let url = Url::parse(&format!("{}/chat/completions", self.base_url))
            .with_context(|| format!("invalid chat base URL '{}'", self.base_url))?;

        let body = serde_json::to_vec(&CompletionRequest {
            model: &self.model,
            messages,
            stream,
        })?;

        let mut req = Request::new(Method::POST, url);
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(body.into());
        Ok(req)
    }

    /// Sends `messages` and returns the assistant's reply.
    #[tracing::instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let json = fetch_json(&*self.http, self.request(messages, false)?).await?;

        Ok(json
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }

    /// Streams the reply, handing each text fragment to `on_delta` as it
    /// arrives. Returns the concatenated reply.
    #[tracing::instrument(skip_all, fields(model = %self.model, messages = messages.len()))]
    pub async fn stream<F>(&self, messages: &[ChatMessage], mut on_delta: F) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let resp = self.http.execute(self.request(messages, true)?).await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("chat API returned status {status}: {body}");
        }

        let mut events = std::pin::pin!(SseStream::from_bytes_stream(resp.bytes_stream()));
        let mut reply = String::new();

        while let Some(sse) = events.next().await {
            let Some(data) = sse?.data else {
                continue;
            };
            match parse_stream_data(&data) {
                StreamDelta::Content(text) => {
                    on_delta(&text);
                    reply.push_str(&text);
                }
                StreamDelta::Done => break,
                StreamDelta::Skip => {}
            }
        }

        debug!(chars = reply.len(), "Chat stream finished");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::CannedClient;

    fn client() -> ChatClient {
        ChatClient::with_client(
            Arc::new(BasicClient::new()),
            "https://api.groq.com/openai/v1/",
            "llama-3.3-70b-versatile",
        )
    }

    #[test]
    fn test_request_shape() {
        let c = client();
        let messages = [ChatMessage::system("be brief"), ChatMessage::user("traffic?")];
        let req = c.request(&messages, true).unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(
            req.url().as_str(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        let bytes = req.body().and_then(|b| b.as_bytes()).unwrap();
        let body: Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "traffic?");
    }

    #[test]
    fn test_parse_stream_data() {
        assert_eq!(parse_stream_data("[DONE]"), StreamDelta::Done);
        assert_eq!(
            parse_stream_data(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#),
            StreamDelta::Content("Hi".to_string())
        );
        assert_eq!(
            parse_stream_data(r#"{"content":" there"}"#),
            StreamDelta::Content(" there".to_string())
        );
        assert_eq!(
            parse_stream_data(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#),
            StreamDelta::Skip
        );
        assert_eq!(parse_stream_data("{not json"), StreamDelta::Skip);
    }

    #[test]
    fn test_set_model_accepts_unknown_id() {
        let mut c = client();
        c.set_model("my-finetune");
        assert_eq!(c.model(), "my-finetune");
    }

    fn canned(http: Arc<CannedClient>) -> ChatClient {
        ChatClient::with_client(http, "https://api.groq.com/openai/v1", "llama-3.3-70b-versatile")
    }

    #[tokio::test]
    async fn test_complete_trims_reply() {
        let http = Arc::new(CannedClient::ok(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Traffic is light.\n"}}]}"#,
        ));
        let reply = canned(http.clone()).complete(&[ChatMessage::user("traffic?")]).await.unwrap();

        assert_eq!(reply, "Traffic is light.");
        assert_eq!(http.urls(), vec!["https://api.groq.com/openai/v1/chat/completions"]);
    }

    #[tokio::test]
    async fn test_complete_without_content_uses_fallback() {
        let c = canned(Arc::new(CannedClient::ok(r#"{"choices":[]}"#)));
        assert_eq!(c.complete(&[ChatMessage::user("hi")]).await.unwrap(), FALLBACK_REPLY);

        let c = canned(Arc::new(CannedClient::ok(
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
        )));
        assert_eq!(c.complete(&[ChatMessage::user("hi")]).await.unwrap(), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_complete_error_status() {
        let c = canned(Arc::new(CannedClient::with_status(500, "upstream down")));
        let err = c.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("500"), "{err}");
    }

    #[tokio::test]
    async fn test_stream_stops_at_done() {
        let body = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n\
                    : keep-alive\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n\
                    data: [DONE]\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\" late\"}}]}\n\n";
        let c = canned(Arc::new(CannedClient::ok(body)));

        let mut deltas = Vec::new();
        let reply = c
            .stream(&[ChatMessage::user("hi")], |d| deltas.push(d.to_string()))
            .await
            .unwrap();

        assert_eq!(reply, "Hi there");
        assert_eq!(deltas, vec!["Hi", " there"]);
    }

    #[tokio::test]
    async fn test_stream_error_status() {
        let c = canned(Arc::new(CannedClient::with_status(429, "rate limited")));
        let result = c.stream(&[ChatMessage::user("hi")], |_| {}).await;
        assert!(result.is_err());
    }
}
