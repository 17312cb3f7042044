//! Filtros de listagem e a coleção de solicitações exibida por uma tela

use chrono::{DateTime, Utc};

use crate::models::{RequestId, RequestRecord, RequestStatus};

/// Origem de uma listagem de solicitações
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestFeed {
    /// Solicitações pendentes próximas ao hospital (atualizadas periodicamente)
    Live,
    /// Solicitações deste hospital em um status específico
    Status(RequestStatus),
}

impl RequestFeed {
    /// Tela correspondente a um status; `pending` é sempre a listagem ao vivo
    pub fn for_status(status: RequestStatus) -> Self {
        match status {
            RequestStatus::Pending => RequestFeed::Live,
            other => RequestFeed::Status(other),
        }
    }

    pub fn status(&self) -> RequestStatus {
        match self {
            RequestFeed::Live => RequestStatus::Pending,
            RequestFeed::Status(status) => *status,
        }
    }

    /// Apenas a listagem ao vivo é atualizada por temporizador
    pub fn is_polled(&self) -> bool {
        matches!(self, RequestFeed::Live)
    }

    pub fn title(&self) -> &'static str {
        match self.status() {
            RequestStatus::Pending => "Solicitações ao vivo",
            RequestStatus::Accepted => "Solicitações aceitas",
            RequestStatus::Finalized => "Solicitações finalizadas",
            RequestStatus::Resolved => "Solicitações resolvidas",
            RequestStatus::Cancelled => "Solicitações canceladas",
        }
    }
}

/// Sequência ordenada de registros de uma mesma listagem.
///
/// Substituída por inteiro a cada atualização; nunca é editada no lugar.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestCollection {
    feed: RequestFeed,
    records: Vec<RequestRecord>,
    fetched_at: Option<DateTime<Utc>>,
}

impl RequestCollection {
    pub fn new(feed: RequestFeed, records: Vec<RequestRecord>) -> Self {
        Self {
            feed,
            records,
            fetched_at: Some(Utc::now()),
        }
    }

    /// Coleção ainda não carregada
    pub fn empty(feed: RequestFeed) -> Self {
        Self {
            feed,
            records: Vec::new(),
            fetched_at: None,
        }
    }

    pub fn feed(&self) -> RequestFeed {
        self.feed
    }

    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn is_loaded(&self) -> bool {
        self.fetched_at.is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &RequestId) -> Option<&RequestRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.get(id).is_some()
    }

    pub fn count_label(&self) -> String {
        match self.len() {
            1 => "1 solicitação encontrada".to_string(),
            n => format!("{} solicitações encontradas", n),
        }
    }

    pub fn empty_message(&self) -> String {
        format!(
            "Não há solicitações com status '{}' no momento.",
            self.feed.status()
        )
    }
}
