use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::ports::broadcaster::{ChatUpdate, ChatUpdateKind};
use crate::application::ports::chat_model::{
    ChatCompletionError, ChatRequest, ChatTurn, FinishReason, GenerationConfig, ModelRole,
};
use crate::application::ports::{Broadcaster, ChatModel};
use crate::application::services::CitationExtractor;
use crate::application::workers::WorkerError;
use crate::domain::entities::{Chat, Citation, EvidenceStrength, JobContext, Message};
use crate::domain::repositories::{
    ChatRepository, CitationRepository, DocumentRepository, MessageRepository, StoreRepository,
};
use crate::domain::value_objects::{MessageRole, MessageStatus};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a research assistant. Answer using only \
the documents available through file search. If they do not contain the answer, say so plainly. \
Be concise and quote figures exactly as they appear in the sources.";

pub const RATE_LIMITED_REPLY: &str =
    "The assistant is handling too many requests right now. Please try again in a moment.";
pub const API_ERROR_REPLY: &str =
    "The assistant could not generate an answer because the model service returned an error. Please try again.";
pub const SAFETY_BLOCKED_REPLY: &str =
    "The answer was withheld by the model's safety filters. Try rephrasing your question.";
pub const RECITATION_BLOCKED_REPLY: &str =
    "The answer was withheld because it would have reproduced source material too closely.";
pub const MAX_TOKENS_REPLY: &str =
    "The answer reached its length limit before any text was produced. Try a narrower question.";
pub const NO_INFORMATION_REPLY: &str =
    "I could not find relevant information in the selected documents to answer that.";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    pub history_window: usize,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub system_instruction: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: 20,
            temperature: 0.2,
            max_output_tokens: 2048,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed {
        assistant_message_id: Uuid,
        citations: usize,
    },
    /// The model call failed terminally; a failed assistant reply was stored.
    Failed { assistant_message_id: Uuid },
    /// Nothing to do for this delivery.
    Skipped,
}

/// Reply shown when the model produced no text.
pub fn empty_answer_reply(finish_reason: Option<&FinishReason>) -> &'static str {
    match finish_reason {
        Some(FinishReason::Safety) => SAFETY_BLOCKED_REPLY,
        Some(FinishReason::Recitation) => RECITATION_BLOCKED_REPLY,
        Some(FinishReason::MaxTokens) => MAX_TOKENS_REPLY,
        _ => NO_INFORMATION_REPLY,
    }
}

pub fn api_error_reply(error: &ChatCompletionError) -> &'static str {
    if error.is_rate_limited() {
        RATE_LIMITED_REPLY
    } else {
        API_ERROR_REPLY
    }
}

/// Answers one user message with the chat's bound stores as grounding.
pub struct ChatTurnProcessor {
    chats: Arc<dyn ChatRepository>,
    messages: Arc<dyn MessageRepository>,
    citations: Arc<dyn CitationRepository>,
    stores: Arc<dyn StoreRepository>,
    documents: Arc<dyn DocumentRepository>,
    model: Arc<dyn ChatModel>,
    broadcaster: Arc<dyn Broadcaster>,
    extractor: CitationExtractor,
    config: ChatConfig,
}

impl ChatTurnProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        messages: Arc<dyn MessageRepository>,
        citations: Arc<dyn CitationRepository>,
        stores: Arc<dyn StoreRepository>,
        documents: Arc<dyn DocumentRepository>,
        model: Arc<dyn ChatModel>,
        broadcaster: Arc<dyn Broadcaster>,
        extractor: CitationExtractor,
        config: ChatConfig,
    ) -> Self {
        Self {
            chats,
            messages,
            citations,
            stores,
            documents,
            model,
            broadcaster,
            extractor,
            config,
        }
    }

    pub async fn process_turn(
        &self,
        ctx: JobContext,
        user_message_id: Uuid,
    ) -> Result<TurnOutcome, WorkerError> {
        let Some(mut message) = self.messages.find_by_id(user_message_id).await? else {
            warn!(message_id = %user_message_id, "Message vanished before processing");
            return Ok(TurnOutcome::Skipped);
        };

        if message.role() != MessageRole::User {
            warn!(message_id = %user_message_id, "Refusing to process a non-user message");
            return Ok(TurnOutcome::Skipped);
        }

        // Failed turns are only picked up again by a redelivery of their own job.
        let claimable = match message.status() {
            MessageStatus::Pending => true,
            MessageStatus::Failed => ctx.is_redelivery(),
            MessageStatus::Processing | MessageStatus::Completed => false,
        };
        if !claimable {
            debug!(message_id = %user_message_id, status = %message.status(), "Turn already handled");
            return Ok(TurnOutcome::Skipped);
        }

        message
            .claim(ctx.is_redelivery())
            .map_err(WorkerError::InvalidState)?;
        self.messages.update(&message).await?;
        self.broadcast(&message, ChatUpdateKind::MessageUpdated);

        info!(message_id = %user_message_id, attempt = ctx.attempt, "Processing chat turn");

        match self.answer(&mut message).await {
            Ok(outcome) => Ok(outcome),
            Err(WorkerError::Chat(e)) => self.record_model_failure(&mut message, e).await,
            Err(e) => {
                error!(message_id = %user_message_id, error = %e, "Chat turn failed unexpectedly");
                self.mark_user_failed(&mut message, e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn answer(&self, message: &mut Message) -> Result<TurnOutcome, WorkerError> {
        let chat = self
            .chats
            .find_by_id(message.chat_id())
            .await?
            .ok_or_else(|| WorkerError::NotFound(format!("chat {}", message.chat_id())))?;

        let request = self.build_request(&chat, message).await?;
        let response = self.model.generate(request).await?;

        let extracted = {
            let titles: Vec<String> = self
                .extractor
                .referenced_titles(&response.grounding)
                .into_iter()
                .collect();
            if titles.is_empty() {
                Vec::new()
            } else {
                let catalog = self.document_catalog(&chat, &titles).await?;
                self.extractor.extract(&response.grounding, &catalog)
            }
        };

        let content = if response.text.trim().is_empty() {
            empty_answer_reply(response.finish_reason.as_ref()).to_string()
        } else {
            response.text.clone()
        };

        let assistant = Message::assistant_completed(
            chat.id(),
            content,
            response.usage,
            response.finish_reason.as_ref().map(|r| r.as_str().to_string()),
        );
        self.messages.save(&assistant).await?;

        let high_confidence = self.extractor.config().high_confidence;
        let citations: Vec<Citation> = extracted
            .into_iter()
            .map(|c| {
                Citation::new(
                    assistant.id(),
                    c.document_id,
                    c.pages,
                    c.snippet,
                    c.confidence,
                    EvidenceStrength::classify(c.confidence, high_confidence),
                )
            })
            .collect();
        if !citations.is_empty() {
            self.citations.save_batch(&citations).await?;
        }

        message
            .complete(response.usage)
            .map_err(WorkerError::InvalidState)?;
        self.messages.update(message).await?;

        self.broadcast(&assistant, ChatUpdateKind::MessageCreated);
        self.broadcast(message, ChatUpdateKind::MessageUpdated);

        info!(
            message_id = %message.id(),
            assistant_message_id = %assistant.id(),
            citations = citations.len(),
            "Chat turn completed"
        );
        Ok(TurnOutcome::Completed {
            assistant_message_id: assistant.id(),
            citations: citations.len(),
        })
    }

    async fn build_request(&self, chat: &Chat, message: &Message) -> Result<ChatRequest, WorkerError> {
        let history: Vec<ChatTurn> = self
            .messages
            .list_by_chat(chat.id())
            .await?
            .into_iter()
            .filter(|m| m.id() != message.id())
            .filter(|m| m.status() == MessageStatus::Completed)
            .filter(|m| m.created_at() <= message.created_at())
            .take(self.config.history_window)
            .map(|m| ChatTurn {
                role: match m.role() {
                    MessageRole::User => ModelRole::User,
                    MessageRole::Assistant => ModelRole::Model,
                },
                text: m.content().to_string(),
            })
            .collect();

        let mut contents = history;
        contents.push(ChatTurn {
            role: ModelRole::User,
            text: message.content().to_string(),
        });

        let store_ids = chat.store_ids();
        let stores = self.stores.find_by_ids(&store_ids).await?;
        let store_names: Vec<String> = store_ids
            .iter()
            .filter_map(|id| stores.iter().find(|s| s.id() == *id))
            .filter(|s| s.is_active())
            .filter_map(|s| s.remote_name().map(str::to_string))
            .collect();
        if store_names.is_empty() {
            warn!(chat_id = %chat.id(), "No active stores bound to chat");
        }

        Ok(ChatRequest {
            system_instruction: self.config.system_instruction.clone(),
            contents,
            store_names,
            generation: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        })
    }

    /// Display name to document id across the chat's stores. A name present
    /// in several stores resolves to the earliest bound store.
    async fn document_catalog(
        &self,
        chat: &Chat,
        titles: &[String],
    ) -> Result<HashMap<String, Uuid>, WorkerError> {
        let store_ids = chat.store_ids();
        let mut documents = self
            .documents
            .find_by_display_names(&store_ids, titles)
            .await?;
        documents.sort_by_key(|d| {
            store_ids
                .iter()
                .position(|id| *id == d.store_id())
                .unwrap_or(usize::MAX)
        });

        let mut catalog = HashMap::new();
        for document in documents {
            catalog
                .entry(document.display_name().to_string())
                .or_insert(document.id());
        }
        Ok(catalog)
    }

    async fn record_model_failure(
        &self,
        message: &mut Message,
        error: ChatCompletionError,
    ) -> Result<TurnOutcome, WorkerError> {
        warn!(message_id = %message.id(), status = ?error.status, error = %error, "Model call failed");

        let assistant = Message::assistant_failed(
            message.chat_id(),
            api_error_reply(&error).to_string(),
            error.to_string(),
        );
        if let Err(e) = self.messages.save(&assistant).await {
            error!(message_id = %message.id(), error = %e, "Failed to store failed reply");
        } else {
            self.broadcast(&assistant, ChatUpdateKind::MessageCreated);
        }

        self.mark_user_failed(message, error.message.clone()).await;

        if error.is_retriable() {
            Err(WorkerError::Chat(error))
        } else {
            Ok(TurnOutcome::Failed {
                assistant_message_id: assistant.id(),
            })
        }
    }

    async fn mark_user_failed(&self, message: &mut Message, error_text: String) {
        if let Err(e) = message.fail(error_text) {
            error!(message_id = %message.id(), error = %e, "Could not mark message failed");
            return;
        }
        if let Err(e) = self.messages.update(message).await {
            error!(message_id = %message.id(), error = %e, "Failed to persist failed message");
        }
        self.broadcast(message, ChatUpdateKind::MessageFailed);
    }

    fn broadcast(&self, message: &Message, kind: ChatUpdateKind) {
        self.broadcaster.publish_chat(ChatUpdate {
            chat_id: message.chat_id(),
            message_id: message.id(),
            kind,
            status: message.status(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::chat_model::{
        ChatResponse, GroundingChunk, GroundingEvidence, GroundingSupport,
    };
    use crate::domain::entities::{Document, Store};
    use crate::domain::value_objects::{ContentHash, DocumentMetadata, Owner, TokenUsage};
    use crate::infrastructure::memory::{
        InMemoryChatRepository, InMemoryCitationRepository, InMemoryDocumentRepository,
        InMemoryMessageRepository, InMemoryStoreRepository,
    };
    use crate::test_support::{FakeChatModel, RecordingBroadcaster};

    struct Harness {
        chats: Arc<InMemoryChatRepository>,
        messages: Arc<InMemoryMessageRepository>,
        citations: Arc<InMemoryCitationRepository>,
        stores: Arc<InMemoryStoreRepository>,
        documents: Arc<InMemoryDocumentRepository>,
        model: Arc<FakeChatModel>,
        broadcaster: Arc<RecordingBroadcaster>,
        processor: ChatTurnProcessor,
    }

    fn harness() -> Harness {
        let chats = Arc::new(InMemoryChatRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let citations = Arc::new(InMemoryCitationRepository::new());
        let stores = Arc::new(InMemoryStoreRepository::new());
        let documents = Arc::new(InMemoryDocumentRepository::new());
        let model = Arc::new(FakeChatModel::new());
        let broadcaster = Arc::new(RecordingBroadcaster::new());
        let processor = ChatTurnProcessor::new(
            chats.clone(),
            messages.clone(),
            citations.clone(),
            stores.clone(),
            documents.clone(),
            model.clone(),
            broadcaster.clone(),
            CitationExtractor::default(),
            ChatConfig {
                history_window: 2,
                ..ChatConfig::default()
            },
        );
        Harness {
            chats,
            messages,
            citations,
            stores,
            documents,
            model,
            broadcaster,
            processor,
        }
    }

    fn ctx(attempt: u32) -> JobContext {
        JobContext {
            job_id: Uuid::new_v4(),
            attempt,
            max_attempts: 3,
        }
    }

    /// A chat over one active store, with `guide.pdf` uploaded to it.
    async fn seeded_chat(h: &Harness) -> (Chat, Document) {
        let store = Store::new(Owner::Global, "Guides".to_string());
        h.stores.save(&store).await.unwrap();
        h.stores.activate(store.id(), "fileSearchStores/guides").await.unwrap();

        let document = Document::new(
            store.id(),
            "guide.pdf".to_string(),
            "application/pdf".to_string(),
            10,
            ContentHash::of_bytes(b"guide"),
            DocumentMetadata::new(),
            None,
        );
        h.documents.insert(&document).await.unwrap();

        let chat = Chat::new(Owner::Global, "Questions".to_string(), store.id(), vec![]).unwrap();
        h.chats.save(&chat).await.unwrap();
        (chat, document)
    }

    async fn user_message(h: &Harness, chat: &Chat, text: &str) -> Message {
        let message = Message::user(chat.id(), Uuid::new_v4(), text.to_string());
        h.messages.save(&message).await.unwrap();
        message
    }

    fn grounded_response(text: &str) -> ChatResponse {
        ChatResponse {
            text: text.to_string(),
            finish_reason: Some(FinishReason::Stop),
            usage: Some(TokenUsage::new(120, 30)),
            grounding: GroundingEvidence {
                chunks: vec![
                    GroundingChunk {
                        title: Some("guide.pdf".to_string()),
                        text: Some("---PAGE 4--- Torque the bolts to 40 Nm.".to_string()),
                    },
                    GroundingChunk {
                        title: Some("elsewhere.pdf".to_string()),
                        text: Some("not in the catalog".to_string()),
                    },
                ],
                supports: Some(vec![GroundingSupport {
                    chunk_indices: vec![0, 1],
                    confidence_scores: vec![0.92, 0.88],
                }]),
            },
        }
    }

    async fn replies(h: &Harness, chat: &Chat) -> Vec<Message> {
        h.messages
            .list_by_chat(chat.id())
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.role() == MessageRole::Assistant)
            .collect()
    }

    #[tokio::test]
    async fn test_successful_turn_stores_answer_and_citations() {
        let h = harness();
        let (chat, document) = seeded_chat(&h).await;
        let message = user_message(&h, &chat, "What torque?").await;
        h.model.push(Ok(grounded_response("Use 40 Nm.")));

        let outcome = h.processor.process_turn(ctx(1), message.id()).await.unwrap();

        let TurnOutcome::Completed {
            assistant_message_id,
            citations,
        } = outcome
        else {
            panic!("expected completed turn, got {:?}", outcome);
        };
        assert_eq!(citations, 1);

        let assistant = h.messages.find_by_id(assistant_message_id).await.unwrap().unwrap();
        assert_eq!(assistant.status(), MessageStatus::Completed);
        assert_eq!(assistant.content(), "Use 40 Nm.");
        assert_eq!(assistant.finish_reason(), Some("STOP"));

        let user = h.messages.find_by_id(message.id()).await.unwrap().unwrap();
        assert_eq!(user.status(), MessageStatus::Completed);
        assert_eq!(user.token_usage(), Some(TokenUsage::new(120, 30)));

        let stored = h.citations.find_by_message(assistant_message_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].document_id(), document.id());
        assert_eq!(stored[0].pages(), &[4]);
        assert_eq!(stored[0].confidence(), Some(0.92));
        assert_eq!(stored[0].strength(), EvidenceStrength::Strong);

        let request = &h.model.requests()[0];
        assert_eq!(request.store_names, vec!["fileSearchStores/guides".to_string()]);
        assert_eq!(request.contents.last().map(|t| t.text.as_str()), Some("What torque?"));

        let kinds: Vec<ChatUpdateKind> = h.broadcaster.chat_updates().iter().map(|u| u.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChatUpdateKind::MessageUpdated,
                ChatUpdateKind::MessageCreated,
                ChatUpdateKind::MessageUpdated
            ]
        );
    }

    #[tokio::test]
    async fn test_rate_limited_turn_fails_and_reraises() {
        let h = harness();
        let (chat, _) = seeded_chat(&h).await;
        let message = user_message(&h, &chat, "hello").await;
        h.model
            .push(Err(ChatCompletionError::new(Some(429), "Resource exhausted")));

        let err = h.processor.process_turn(ctx(1), message.id()).await.unwrap_err();

        assert!(matches!(err, WorkerError::Chat(ref e) if e.status == Some(429)));
        let assistant = &replies(&h, &chat).await[0];
        assert_eq!(assistant.status(), MessageStatus::Failed);
        assert_eq!(assistant.content(), RATE_LIMITED_REPLY);
        let user = h.messages.find_by_id(message.id()).await.unwrap().unwrap();
        assert_eq!(user.status(), MessageStatus::Failed);
        assert_eq!(user.error_message(), Some("Resource exhausted"));
        assert!(
            h.broadcaster
                .chat_updates()
                .iter()
                .any(|u| u.kind == ChatUpdateKind::MessageFailed && u.message_id == message.id())
        );
    }

    #[tokio::test]
    async fn test_bad_request_turn_fails_without_reraise() {
        let h = harness();
        let (chat, _) = seeded_chat(&h).await;
        let message = user_message(&h, &chat, "hello").await;
        h.model
            .push(Err(ChatCompletionError::new(Some(400), "Invalid argument")));

        let outcome = h.processor.process_turn(ctx(1), message.id()).await.unwrap();

        assert!(matches!(outcome, TurnOutcome::Failed { .. }));
        let assistant = &replies(&h, &chat).await[0];
        assert_eq!(assistant.content(), API_ERROR_REPLY);
        let user = h.messages.find_by_id(message.id()).await.unwrap().unwrap();
        assert_eq!(user.status(), MessageStatus::Failed);
    }

    #[tokio::test]
    async fn test_terminal_messages_are_not_reprocessed() {
        let h = harness();
        let (chat, _) = seeded_chat(&h).await;
        let message = user_message(&h, &chat, "hello").await;
        h.model.push(Ok(grounded_response("answer")));
        h.processor.process_turn(ctx(1), message.id()).await.unwrap();

        let again = h.processor.process_turn(ctx(1), message.id()).await.unwrap();

        assert_eq!(again, TurnOutcome::Skipped);
        assert_eq!(h.model.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_message_is_retried_only_on_redelivery() {
        let h = harness();
        let (chat, _) = seeded_chat(&h).await;
        let message = user_message(&h, &chat, "hello").await;
        h.model.push(Err(ChatCompletionError::new(Some(503), "unavailable")));
        h.processor.process_turn(ctx(1), message.id()).await.unwrap_err();

        assert_eq!(
            h.processor.process_turn(ctx(1), message.id()).await.unwrap(),
            TurnOutcome::Skipped
        );

        h.model.push(Ok(grounded_response("recovered")));
        let outcome = h.processor.process_turn(ctx(2), message.id()).await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Completed { .. }));
        let user = h.messages.find_by_id(message.id()).await.unwrap().unwrap();
        assert_eq!(user.status(), MessageStatus::Completed);
    }

    #[tokio::test]
    async fn test_empty_answer_uses_finish_reason_copy() {
        let h = harness();
        let (chat, _) = seeded_chat(&h).await;
        let message = user_message(&h, &chat, "hello").await;
        h.model.push(Ok(ChatResponse {
            text: "  ".to_string(),
            finish_reason: Some(FinishReason::Safety),
            usage: None,
            grounding: GroundingEvidence::default(),
        }));

        h.processor.process_turn(ctx(1), message.id()).await.unwrap();

        let assistant = &replies(&h, &chat).await[0];
        assert_eq!(assistant.content(), SAFETY_BLOCKED_REPLY);
        assert_eq!(empty_answer_reply(None), NO_INFORMATION_REPLY);
        assert_eq!(
            empty_answer_reply(Some(&FinishReason::MaxTokens)),
            MAX_TOKENS_REPLY
        );
        assert_eq!(
            empty_answer_reply(Some(&FinishReason::Recitation)),
            RECITATION_BLOCKED_REPLY
        );
    }

    #[tokio::test]
    async fn test_history_window_keeps_oldest_completed_turns() {
        let h = harness();
        let (chat, _) = seeded_chat(&h).await;

        for text in ["first", "second", "third"] {
            let message = user_message(&h, &chat, text).await;
            h.model.push(Ok(grounded_response(&format!("re: {}", text))));
            h.processor.process_turn(ctx(1), message.id()).await.unwrap();
        }

        let last = h.model.requests().pop().unwrap();
        let texts: Vec<&str> = last.contents.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "re: first", "third"]);
        assert_eq!(last.contents[1].role, ModelRole::Model);
    }

    #[tokio::test]
    async fn test_missing_chat_is_unexpected_and_reraised() {
        let h = harness();
        let orphan = Message::user(Uuid::new_v4(), Uuid::new_v4(), "lost".to_string());
        h.messages.save(&orphan).await.unwrap();

        let err = h.processor.process_turn(ctx(1), orphan.id()).await.unwrap_err();

        assert!(matches!(err, WorkerError::NotFound(_)));
        let user = h.messages.find_by_id(orphan.id()).await.unwrap().unwrap();
        assert_eq!(user.status(), MessageStatus::Failed);
        assert!(
            h.broadcaster
                .chat_updates()
                .iter()
                .any(|u| u.kind == ChatUpdateKind::MessageFailed)
        );
    }
}
