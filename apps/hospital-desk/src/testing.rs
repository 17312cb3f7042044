//! Backend roteirizado para testes de intercalação
//!
//! Cada chamada de listagem pode ser segurada até o teste liberar a
//! resposta, e as ações passam por um semáforo controlado pelo teste.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use emergency_core::{
    fixtures, DecodedBatch, HospitalProfile, ProfileUpdate, RequestId, RequestRecord, RequestStatus,
};
use serde_json::Value;
use tokio::sync::{oneshot, Semaphore};

use crate::api::EmergencyApi;
use crate::error::ApiError;

type Reply = Result<DecodedBatch, ApiError>;

pub fn batch(records: Vec<RequestRecord>) -> DecodedBatch {
    DecodedBatch {
        records,
        rejected: Vec::new(),
    }
}

pub fn pending(id: &str) -> RequestRecord {
    fixtures::record(id, RequestStatus::Pending)
}

pub fn transport_error() -> ApiError {
    ApiError::Connection("conexão recusada".to_string())
}

pub struct ScriptedApi {
    /// Respostas seguradas, consumidas na ordem das chamadas
    held_replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    /// Resposta imediata quando não há resposta segurada
    default_records: Mutex<Vec<RequestRecord>>,
    fail_fetches: AtomicBool,
    gate_actions: AtomicBool,
    action_gate: Semaphore,
    pub fetch_calls: AtomicUsize,
    pub action_calls: AtomicUsize,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            held_replies: Mutex::new(VecDeque::new()),
            default_records: Mutex::new(Vec::new()),
            fail_fetches: AtomicBool::new(false),
            gate_actions: AtomicBool::new(false),
            action_gate: Semaphore::new(0),
            fetch_calls: AtomicUsize::new(0),
            action_calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedApi {
    pub fn with_records(records: Vec<RequestRecord>) -> Self {
        let api = Self::default();
        api.set_records(records);
        api
    }

    pub fn set_records(&self, records: Vec<RequestRecord>) {
        *self.default_records.lock().unwrap() = records;
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_fetches.store(failing, Ordering::SeqCst);
    }

    /// A próxima listagem fica pendente até o teste enviar a resposta
    pub fn hold_next_fetch(&self) -> oneshot::Sender<Reply> {
        let (sender, receiver) = oneshot::channel();
        self.held_replies.lock().unwrap().push_back(receiver);
        sender
    }

    /// Ações ficam bloqueadas até `release_actions`
    pub fn gate_actions(&self) {
        self.gate_actions.store(true, Ordering::SeqCst);
    }

    pub fn release_actions(&self, permits: usize) {
        self.action_gate.add_permits(permits);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn actions(&self) -> usize {
        self.action_calls.load(Ordering::SeqCst)
    }

    async fn next_batch(&self) -> Reply {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let held = self.held_replies.lock().unwrap().pop_front();
        if let Some(receiver) = held {
            return receiver.await.unwrap_or_else(|_| Err(transport_error()));
        }
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(transport_error());
        }
        Ok(batch(self.default_records.lock().unwrap().clone()))
    }

    async fn run_action(&self) -> Result<Option<String>, ApiError> {
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        if self.gate_actions.load(Ordering::SeqCst) {
            self.action_gate.acquire().await.unwrap().forget();
        }
        Ok(None)
    }
}

#[async_trait]
impl EmergencyApi for ScriptedApi {
    async fn fetch_live(&self) -> Result<DecodedBatch, ApiError> {
        self.next_batch().await
    }

    async fn fetch_by_status(&self, _status: RequestStatus) -> Result<DecodedBatch, ApiError> {
        self.next_batch().await
    }

    async fn accept_request(&self, _id: &RequestId) -> Result<Option<String>, ApiError> {
        self.run_action().await
    }

    async fn mark_resolved(&self, _id: &RequestId) -> Result<Option<String>, ApiError> {
        self.run_action().await
    }

    async fn hospital_profile(&self) -> Result<HospitalProfile, ApiError> {
        serde_json::from_value(fixtures::hospital_profile())
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn update_profile(&self, _update: &ProfileUpdate) -> Result<Option<String>, ApiError> {
        Ok(None)
    }

    async fn dashboard(&self) -> Result<Value, ApiError> {
        Ok(Value::Null)
    }
}
