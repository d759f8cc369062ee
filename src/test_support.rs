//! Scripted fakes for the outbound ports, shared by unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use crate::application::ports::broadcaster::{ChatUpdate, UserNotification};
use crate::application::ports::chat_model::{ChatCompletionError, ChatRequest, ChatResponse};
use crate::application::ports::event_bus::EventBusError;
use crate::application::ports::remote_store::{
    OperationHandle, OperationStatus, RemoteDocument, RemoteStoreError,
};
use crate::application::ports::{Broadcaster, ChatModel, EventBus, RemoteStoreClient};
use crate::domain::DomainEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    CreateStore(String),
    DeleteStore(String),
    Upload {
        store: String,
        display_name: String,
        mime_type: String,
        contents: Vec<u8>,
    },
    GetOperation(String),
    DeleteDocument(String),
    FindDocument(String),
}

#[derive(Default)]
pub struct FakeRemoteStore {
    pub create_results: Mutex<VecDeque<Result<String, RemoteStoreError>>>,
    pub delete_store_results: Mutex<VecDeque<Result<(), RemoteStoreError>>>,
    pub upload_results: Mutex<VecDeque<Result<OperationHandle, RemoteStoreError>>>,
    pub operation_results: Mutex<VecDeque<Result<OperationStatus, RemoteStoreError>>>,
    pub delete_document_results: Mutex<VecDeque<Result<(), RemoteStoreError>>>,
    pub calls: Mutex<Vec<RemoteCall>>,
}

impl FakeRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_create(&self, result: Result<String, RemoteStoreError>) {
        self.create_results.lock().unwrap().push_back(result);
    }

    pub fn push_delete_store(&self, result: Result<(), RemoteStoreError>) {
        self.delete_store_results.lock().unwrap().push_back(result);
    }

    pub fn push_upload(&self, result: Result<OperationHandle, RemoteStoreError>) {
        self.upload_results.lock().unwrap().push_back(result);
    }

    pub fn push_operation(&self, result: Result<OperationStatus, RemoteStoreError>) {
        self.operation_results.lock().unwrap().push_back(result);
    }

    pub fn push_delete_document(&self, result: Result<(), RemoteStoreError>) {
        self.delete_document_results.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matcher: impl Fn(&RemoteCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matcher(c)).count()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn pending_operation() -> OperationStatus {
    OperationStatus {
        done: false,
        error: None,
        result: None,
    }
}

pub fn finished_operation(document_name: &str, size_bytes: i64) -> OperationStatus {
    OperationStatus {
        done: true,
        error: None,
        result: Some(serde_json::json!({
            "documentName": document_name,
            "sizeBytes": size_bytes.to_string(),
        })),
    }
}

pub fn api_error(status: u16) -> RemoteStoreError {
    RemoteStoreError::Api {
        status: Some(status),
        body: format!("status {}", status),
    }
}

#[async_trait]
impl RemoteStoreClient for FakeRemoteStore {
    async fn create_store(&self, display_name: &str) -> Result<String, RemoteStoreError> {
        self.record(RemoteCall::CreateStore(display_name.to_string()));
        self.create_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("fileSearchStores/{}", display_name.to_lowercase())))
    }

    async fn delete_store(&self, remote_name: &str) -> Result<(), RemoteStoreError> {
        self.record(RemoteCall::DeleteStore(remote_name.to_string()));
        self.delete_store_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn upload_document(
        &self,
        file_path: &Path,
        store_remote_name: &str,
        display_name: &str,
        mime_type: &str,
    ) -> Result<OperationHandle, RemoteStoreError> {
        let contents = std::fs::read(file_path).unwrap_or_default();
        self.record(RemoteCall::Upload {
            store: store_remote_name.to_string(),
            display_name: display_name.to_string(),
            mime_type: mime_type.to_string(),
            contents,
        });
        self.upload_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(OperationHandle(format!(
                    "{}/upload/operations/op-1",
                    store_remote_name
                )))
            })
    }

    async fn get_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, RemoteStoreError> {
        self.record(RemoteCall::GetOperation(handle.0.clone()));
        self.operation_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(pending_operation()))
    }

    async fn delete_document(&self, remote_path: &str) -> Result<(), RemoteStoreError> {
        self.record(RemoteCall::DeleteDocument(remote_path.to_string()));
        self.delete_document_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn find_document(&self, remote_path: &str) -> Result<RemoteDocument, RemoteStoreError> {
        self.record(RemoteCall::FindDocument(remote_path.to_string()));
        Err(RemoteStoreError::NotFound(remote_path.to_string()))
    }
}

#[derive(Default)]
pub struct FakeChatModel {
    pub responses: Mutex<VecDeque<Result<ChatResponse, ChatCompletionError>>>,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl FakeChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<ChatResponse, ChatCompletionError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse, ChatCompletionError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatCompletionError::new(Some(500), "no scripted response")))
    }
}

#[derive(Default)]
pub struct RecordingEventBus {
    pub events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingBroadcaster {
    pub chat_updates: Mutex<Vec<ChatUpdate>>,
    pub notifications: Mutex<Vec<UserNotification>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat_updates(&self) -> Vec<ChatUpdate> {
        self.chat_updates.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<UserNotification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn publish_chat(&self, update: ChatUpdate) {
        self.chat_updates.lock().unwrap().push(update);
    }

    fn notify_user(&self, notification: UserNotification) {
        self.notifications.lock().unwrap().push(notification);
    }
}
