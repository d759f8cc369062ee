use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, multipart};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::ports::chat_model::{
    ChatCompletionError, ChatModel, ChatRequest, ChatResponse, FinishReason, GroundingChunk,
    GroundingEvidence, GroundingSupport, ModelRole,
};
use crate::application::ports::remote_store::{
    OperationHandle, OperationStatus, RemoteDocument, RemoteOperationError, RemoteStoreClient,
    RemoteStoreError,
};
use crate::domain::value_objects::TokenUsage;
use crate::infrastructure::config::RemoteStoreConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for the file-search store API and the grounded
/// `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: RemoteStoreConfig,
}

impl GeminiClient {
    pub fn new(config: RemoteStoreConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn upload_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.upload_base.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(API_KEY_HEADER, &self.config.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteStoreError> {
        request.send().await.map_err(|e| RemoteStoreError::Api {
            status: None,
            body: e.without_url().to_string(),
        })
    }

    /// Turns a non-success response into `RemoteStoreError::Api`.
    async fn check(response: Response) -> Result<Response, RemoteStoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteStoreError::Api {
            status: Some(status.as_u16()),
            body: error_message(&body).unwrap_or(body),
        })
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, RemoteStoreError> {
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteStoreError::InvalidResponse(e.without_url().to_string()))
    }

    /// Force-deletes a resource. Missing or already-inaccessible resources
    /// count as deleted.
    async fn force_delete(&self, name: &str) -> Result<(), RemoteStoreError> {
        let response = self
            .send(
                self.request(Method::DELETE, self.api_url(name))
                    .query(&[("force", "true")]),
            )
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                debug!(name, status = response.status().as_u16(), "Remote resource already gone");
                Ok(())
            }
            _ => Self::check(response).await.map(|_| ()),
        }
    }
}

/// `error.message` from a JSON error body, if present.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn parse_size(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[derive(Deserialize)]
struct NamedResource {
    name: Option<String>,
}

#[derive(Deserialize)]
struct OperationBody {
    name: Option<String>,
    #[serde(default)]
    done: bool,
    error: Option<OperationErrorBody>,
    response: Option<Value>,
}

#[derive(Deserialize)]
struct OperationErrorBody {
    code: Option<i32>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentBody {
    name: String,
    display_name: Option<String>,
    mime_type: Option<String>,
    size_bytes: Option<Value>,
    state: Option<String>,
}

#[async_trait]
impl RemoteStoreClient for GeminiClient {
    async fn create_store(&self, display_name: &str) -> Result<String, RemoteStoreError> {
        let response = self
            .send(
                self.request(Method::POST, self.api_url("fileSearchStores"))
                    .json(&json!({ "displayName": display_name })),
            )
            .await?;
        let body: NamedResource = Self::parse(Self::check(response).await?).await?;

        body.name.filter(|n| !n.is_empty()).ok_or_else(|| {
            RemoteStoreError::InvalidResponse("Store response has no name".to_string())
        })
    }

    async fn delete_store(&self, remote_name: &str) -> Result<(), RemoteStoreError> {
        self.force_delete(remote_name).await
    }

    async fn upload_document(
        &self,
        file_path: &Path,
        store_remote_name: &str,
        display_name: &str,
        mime_type: &str,
    ) -> Result<OperationHandle, RemoteStoreError> {
        let bytes = tokio::fs::read(file_path)
            .await
            .map_err(|e| RemoteStoreError::Api {
                status: None,
                body: format!("Cannot read {}: {}", file_path.display(), e),
            })?;

        let metadata = json!({ "displayName": display_name, "mimeType": mime_type });
        let metadata_part = multipart::Part::text(metadata.to_string())
            .mime_str("application/json")
            .map_err(|e| RemoteStoreError::InvalidResponse(e.to_string()))?;
        let file_part = multipart::Part::bytes(bytes)
            .file_name(display_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| RemoteStoreError::InvalidResponse(e.to_string()))?;
        let form = multipart::Form::new()
            .part("metadata", metadata_part)
            .part("file", file_part);

        let url = self.upload_url(&format!("{}:uploadToFileSearchStore", store_remote_name));
        let response = self
            .send(
                self.request(Method::POST, url)
                    .query(&[("uploadType", "multipart")])
                    .multipart(form),
            )
            .await?;
        let body: NamedResource = Self::parse(Self::check(response).await?).await?;

        body.name
            .filter(|n| !n.is_empty())
            .map(OperationHandle)
            .ok_or_else(|| {
                RemoteStoreError::InvalidResponse("Upload response has no operation name".to_string())
            })
    }

    async fn get_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, RemoteStoreError> {
        let response = self
            .send(self.request(Method::GET, self.api_url(handle.as_str())))
            .await?;
        let body: OperationBody = Self::parse(Self::check(response).await?).await?;

        if body.name.as_deref().is_some_and(|n| n != handle.as_str()) {
            warn!(handle = %handle, "Operation response carries a different name");
        }

        Ok(OperationStatus {
            done: body.done,
            error: body.error.map(|e| RemoteOperationError {
                code: e.code,
                message: e.message,
            }),
            result: body.response,
        })
    }

    async fn delete_document(&self, remote_path: &str) -> Result<(), RemoteStoreError> {
        self.force_delete(remote_path).await
    }

    async fn find_document(&self, remote_path: &str) -> Result<RemoteDocument, RemoteStoreError> {
        let response = self
            .send(self.request(Method::GET, self.api_url(remote_path)))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(RemoteStoreError::NotFound(remote_path.to_string()));
        }
        let body: DocumentBody = Self::parse(Self::check(response).await?).await?;

        Ok(RemoteDocument {
            name: body.name,
            display_name: body.display_name,
            mime_type: body.mime_type,
            size_bytes: parse_size(body.size_bytes.as_ref()),
            state: body.state,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    generation_config: Value,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: i32,
    #[serde(default)]
    candidates_token_count: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunkBody>,
    grounding_supports: Option<Vec<GroundingSupportBody>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingChunkBody {
    retrieved_context: Option<RetrievedContext>,
}

#[derive(Deserialize)]
struct RetrievedContext {
    title: Option<String>,
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingSupportBody {
    #[serde(default)]
    grounding_chunk_indices: Vec<usize>,
    #[serde(default)]
    confidence_scores: Vec<f64>,
}

impl GenerateContentReply {
    fn into_response(self) -> ChatResponse {
        let usage = self
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count));

        let Some(candidate) = self.candidates.into_iter().next() else {
            return ChatResponse {
                text: String::new(),
                finish_reason: self
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .map(|r| FinishReason::parse(&r)),
                usage,
                grounding: GroundingEvidence::default(),
            };
        };

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let grounding = candidate
            .grounding_metadata
            .map(|g| GroundingEvidence {
                chunks: g
                    .grounding_chunks
                    .into_iter()
                    .map(|c| {
                        let context = c.retrieved_context;
                        GroundingChunk {
                            title: context.as_ref().and_then(|r| r.title.clone()),
                            text: context.and_then(|r| r.text),
                        }
                    })
                    .collect(),
                supports: g.grounding_supports.map(|supports| {
                    supports
                        .into_iter()
                        .map(|s| GroundingSupport {
                            chunk_indices: s.grounding_chunk_indices,
                            confidence_scores: s.confidence_scores,
                        })
                        .collect()
                }),
            })
            .unwrap_or_default();

        ChatResponse {
            text,
            finish_reason: candidate.finish_reason.map(|r| FinishReason::parse(&r)),
            usage,
            grounding,
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse, ChatCompletionError> {
        let contents = request
            .contents
            .iter()
            .map(|turn| Content {
                role: Some(match turn.role {
                    ModelRole::User => "user",
                    ModelRole::Model => "model",
                }),
                parts: vec![TextPart { text: &turn.text }],
            })
            .collect();

        let tools = if request.store_names.is_empty() {
            Vec::new()
        } else {
            vec![json!({ "fileSearch": { "fileSearchStoreNames": request.store_names } })]
        };

        let body = GenerateContentBody {
            system_instruction: Content {
                role: None,
                parts: vec![TextPart {
                    text: &request.system_instruction,
                }],
            },
            contents,
            tools,
            generation_config: json!({
                "temperature": request.generation.temperature,
                "maxOutputTokens": request.generation.max_output_tokens,
            }),
        };

        let url = self.api_url(&format!("models/{}:generateContent", self.config.chat_model));
        let response = self
            .request(Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatCompletionError::new(None, e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChatCompletionError::new(
                Some(status.as_u16()),
                error_message(&text).unwrap_or(text),
            ));
        }

        let reply: GenerateContentReply = response.json().await.map_err(|e| {
            ChatCompletionError::new(Some(status.as_u16()), format!("Malformed reply: {}", e))
        })?;
        Ok(reply.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::chat_model::{ChatTurn, GenerationConfig};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(RemoteStoreConfig {
            api_base: format!("{}/v1beta", server.uri()),
            upload_base: format!("{}/upload/v1beta", server.uri()),
            api_key: "test-key".to_string(),
            timeout_secs: 5,
            chat_model: "test-model".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_store_returns_remote_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/fileSearchStores"))
            .and(header(API_KEY_HEADER, "test-key"))
            .and(body_partial_json(json!({ "displayName": "Handbook" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "name": "fileSearchStores/hb-1" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let name = client(&server).create_store("Handbook").await.unwrap();
        assert_eq!(name, "fileSearchStores/hb-1");
    }

    #[tokio::test]
    async fn test_delete_treats_missing_as_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1beta/fileSearchStores/gone"))
            .and(query_param("force", "true"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1beta/fileSearchStores/s/documents/locked"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1beta/fileSearchStores/busy"))
            .respond_with(ResponseTemplate::new(503).set_body_json(
                json!({ "error": { "code": 503, "message": "backend unavailable" } }),
            ))
            .mount(&server)
            .await;

        let client = client(&server);
        client.delete_store("fileSearchStores/gone").await.unwrap();
        client
            .delete_document("fileSearchStores/s/documents/locked")
            .await
            .unwrap();

        let err = client.delete_store("fileSearchStores/busy").await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(err.is_retriable());
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[tokio::test]
    async fn test_upload_returns_operation_handle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/v1beta/fileSearchStores/s1:uploadToFileSearchStore"))
            .and(query_param("uploadType", "multipart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({ "name": "fileSearchStores/s1/upload/operations/op-9" }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"quarterly numbers").unwrap();

        let handle = client(&server)
            .upload_document(file.path(), "fileSearchStores/s1", "q3.txt", "text/plain")
            .await
            .unwrap();
        assert_eq!(handle.as_str(), "fileSearchStores/s1/upload/operations/op-9");
    }

    #[tokio::test]
    async fn test_get_operation_states() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/ops/done"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "ops/done",
                "done": true,
                "response": { "documentName": "fileSearchStores/s/documents/d1", "sizeBytes": "42" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/ops/failed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "ops/failed",
                "done": true,
                "error": { "code": 3, "message": "unsupported file" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/ops/running"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "ops/running" })))
            .mount(&server)
            .await;

        let client = client(&server);
        let done = client
            .get_operation(&OperationHandle("ops/done".to_string()))
            .await
            .unwrap();
        assert!(done.done && done.error.is_none());
        assert_eq!(done.result.unwrap()["sizeBytes"], "42");

        let failed = client
            .get_operation(&OperationHandle("ops/failed".to_string()))
            .await
            .unwrap();
        assert_eq!(failed.error.unwrap().message, "unsupported file");

        let running = client
            .get_operation(&OperationHandle("ops/running".to_string()))
            .await
            .unwrap();
        assert!(!running.done);
    }

    #[tokio::test]
    async fn test_find_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1beta/fileSearchStores/s/documents/d1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "fileSearchStores/s/documents/d1",
                "displayName": "q3.txt",
                "sizeBytes": "2048",
                "state": "STATE_ACTIVE"
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let doc = client
            .find_document("fileSearchStores/s/documents/d1")
            .await
            .unwrap();
        assert_eq!(doc.size_bytes, Some(2048));
        assert_eq!(doc.display_name.as_deref(), Some("q3.txt"));

        let missing = client
            .find_document("fileSearchStores/s/documents/nope")
            .await
            .unwrap_err();
        assert!(matches!(missing, RemoteStoreError::NotFound(_)));
    }

    fn chat_request() -> ChatRequest {
        ChatRequest {
            system_instruction: "Answer from the documents.".to_string(),
            contents: vec![ChatTurn {
                role: ModelRole::User,
                text: "What changed in Q3?".to_string(),
            }],
            store_names: vec!["fileSearchStores/s1".to_string()],
            generation: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 256,
            },
        }
    }

    #[tokio::test]
    async fn test_generate_parses_grounding() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .and(body_partial_json(json!({
                "tools": [{ "fileSearch": { "fileSearchStoreNames": ["fileSearchStores/s1"] } }],
                "contents": [{ "role": "user", "parts": [{ "text": "What changed in Q3?" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "Revenue " }, { "text": "grew." }] },
                    "finishReason": "STOP",
                    "groundingMetadata": {
                        "groundingChunks": [
                            { "retrievedContext": { "title": "q3.pdf", "text": "--- PAGE 4 --- revenue grew" } }
                        ],
                        "groundingSupports": [
                            { "groundingChunkIndices": [0], "confidenceScores": [0.91] }
                        ]
                    }
                }],
                "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 3, "totalTokenCount": 15 }
            })))
            .mount(&server)
            .await;

        let response = client(&server).generate(chat_request()).await.unwrap();
        assert_eq!(response.text, "Revenue grew.");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().total_tokens, 15);
        assert_eq!(response.grounding.chunks[0].title.as_deref(), Some("q3.pdf"));
        let supports = response.grounding.supports.unwrap();
        assert_eq!(supports[0].confidence_scores, vec![0.91]);
    }

    #[tokio::test]
    async fn test_generate_blocked_prompt_and_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "code": 429, "message": "Resource has been exhausted" }
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let blocked = client.generate(chat_request()).await.unwrap();
        assert!(blocked.text.is_empty());
        assert_eq!(blocked.finish_reason, Some(FinishReason::Safety));
        assert!(blocked.grounding.supports.is_none());

        let err = client.generate(chat_request()).await.unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(err.message, "Resource has been exhausted");
    }
}
