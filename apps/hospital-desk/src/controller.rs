//! Controlador de uma listagem de solicitações
//!
//! Dono exclusivo da coleção exibida por uma tela. Carrega a coleção do
//! backend, substitui-a por inteiro a cada atualização, executa aceitar e
//! resolver e publica instantâneos `{ dados, erro }` para a interface.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use emergency_core::{
    policy, DecodedBatch, RequestAction, RequestCard, RequestCollection, RequestFeed, RequestId,
    RequestRecord, RequestStatus,
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::api::EmergencyApi;
use crate::error::{ActionError, ApiError, FetchError};
use crate::notify::{Notification, Notifier};

/// O que a interface observa de uma listagem
#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub collection: Arc<RequestCollection>,
    pub cards: Vec<RequestCard>,
    pub loading: bool,
    /// Última falha de carregamento; a coleção anterior continua exibida
    pub error: Option<String>,
}

/// Resultado de uma ação bem-sucedida
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Mutação aceita pelo backend; a listagem já foi recarregada
    Completed {
        next_status: RequestStatus,
        message: Option<String>,
    },
    /// Rota até o paciente, sem mudança de status
    Navigation { url: String },
}

struct ListState {
    collection: Arc<RequestCollection>,
    cards: Vec<RequestCard>,
    in_flight: HashSet<RequestId>,
    /// Ticket da resposta atualmente exibida
    applied_ticket: u64,
    loads_in_progress: usize,
    error: Option<String>,
    closed: bool,
}

impl ListState {
    fn replace_collection(&mut self, collection: Arc<RequestCollection>) {
        let mut previous: HashMap<RequestId, RequestCard> = self
            .cards
            .drain(..)
            .map(|card| (card.id().clone(), card))
            .collect();

        self.cards = collection
            .records()
            .iter()
            .map(|record| {
                let mut card = match previous.remove(&record.id) {
                    Some(mut card) => {
                        card.refresh(record.clone());
                        card
                    }
                    None => RequestCard::new(record.clone()),
                };
                card.action_in_flight = self.in_flight.contains(&record.id);
                card
            })
            .collect();
        self.collection = collection;
    }

    fn card_mut(&mut self, id: &RequestId) -> Option<&mut RequestCard> {
        self.cards.iter_mut().find(|card| card.id() == id)
    }

    fn snapshot(&self) -> ListSnapshot {
        ListSnapshot {
            collection: Arc::clone(&self.collection),
            cards: self.cards.clone(),
            loading: self.loads_in_progress > 0,
            error: self.error.clone(),
        }
    }
}

pub struct RequestListController {
    view_id: Uuid,
    feed: RequestFeed,
    api: Arc<dyn EmergencyApi>,
    notifier: Arc<dyn Notifier>,
    next_ticket: AtomicU64,
    state: Mutex<ListState>,
    updates: watch::Sender<ListSnapshot>,
}

impl RequestListController {
    pub fn new(
        feed: RequestFeed,
        api: Arc<dyn EmergencyApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let state = ListState {
            collection: Arc::new(RequestCollection::empty(feed)),
            cards: Vec::new(),
            in_flight: HashSet::new(),
            applied_ticket: 0,
            loads_in_progress: 0,
            error: None,
            closed: false,
        };
        let (updates, _) = watch::channel(state.snapshot());

        Self {
            view_id: Uuid::new_v4(),
            feed,
            api,
            notifier,
            next_ticket: AtomicU64::new(0),
            state: Mutex::new(state),
            updates,
        }
    }

    pub fn feed(&self) -> RequestFeed {
        self.feed
    }

    pub fn view_id(&self) -> Uuid {
        self.view_id
    }

    /// Recebe um instantâneo novo a cada mudança de estado
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.updates.borrow().clone()
    }

    pub fn collection(&self) -> Arc<RequestCollection> {
        Arc::clone(&self.lock().collection)
    }

    pub fn record(&self, id: &RequestId) -> Option<RequestRecord> {
        self.lock().collection.get(id).cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Carrega a listagem e substitui a coleção; falhas geram notificação
    pub async fn load(&self) -> Result<Arc<RequestCollection>, FetchError> {
        self.fetch(true).await
    }

    /// Igual a [`load`](Self::load), mas falhas ficam apenas no log
    pub async fn refresh_silently(&self) -> Result<Arc<RequestCollection>, FetchError> {
        self.fetch(false).await
    }

    async fn fetch(&self, notify_on_error: bool) -> Result<Arc<RequestCollection>, FetchError> {
        let ticket = {
            let mut state = self.lock();
            if state.closed {
                return Err(FetchError::ViewClosed);
            }
            state.loads_in_progress += 1;
            self.publish(&state);
            self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
        };
        let _loading = LoadingGuard { controller: self };

        let result = fetch_feed(self.api.as_ref(), self.feed).await;

        let mut state = self.lock();
        if state.closed {
            debug!(view = %self.view_id, "Tela encerrada; resposta de listagem descartada");
            return Err(FetchError::ViewClosed);
        }

        match result {
            Ok(batch) => {
                if ticket < state.applied_ticket {
                    debug!(
                        view = %self.view_id,
                        "Resposta obsoleta descartada (ticket {} < {})",
                        ticket,
                        state.applied_ticket
                    );
                    return Ok(Arc::clone(&state.collection));
                }

                let collection = Arc::new(RequestCollection::new(self.feed, batch.records));
                state.applied_ticket = ticket;
                state.error = None;
                state.replace_collection(Arc::clone(&collection));
                self.publish(&state);

                debug!(
                    view = %self.view_id,
                    "{}: {} registro(s) carregado(s)", self.feed.title(), collection.len()
                );
                Ok(collection)
            }
            Err(e) => {
                if ticket > state.applied_ticket {
                    state.error = Some(e.to_string());
                    self.publish(&state);
                }
                drop(state);

                if notify_on_error {
                    warn!(view = %self.view_id, "Falha ao carregar {}: {}", self.feed.title(), e);
                    self.notifier.notify(Notification::error(
                        format!("Falha ao carregar {}", self.feed.title().to_lowercase()),
                        Some(e.to_string()),
                    ));
                } else {
                    debug!(view = %self.view_id, "Atualização silenciosa falhou: {}", e);
                }
                Err(FetchError::Api(e))
            }
        }
    }

    /// Executa uma ação sobre um registro exibido.
    ///
    /// A ação é validada localmente antes de qualquer chamada; mutações
    /// bem-sucedidas recarregam a listagem em vez de alterar o status local.
    pub async fn perform_action(
        &self,
        record: &RequestRecord,
        action: RequestAction,
    ) -> Result<ActionOutcome, ActionError> {
        if self.is_closed() {
            return Err(ActionError::ViewClosed);
        }

        let next_status = match policy::apply_transition(record.status, action) {
            Ok(next) => next,
            Err(e) => {
                error!(view = %self.view_id, request = %record.id, "Defeito de interface: {}", e);
                self.notifier.notify(Notification::error(
                    "Ação não permitida",
                    Some(e.to_string()),
                ));
                return Err(e.into());
            }
        };

        if !action.is_mutation() {
            return self.navigate(record);
        }

        if !self.acquire_action_lock(&record.id) {
            debug!(view = %self.view_id, request = %record.id, "Ação ignorada: já em andamento");
            return Err(ActionError::InFlight(record.id.clone()));
        }
        let _lock = ActionLock {
            controller: self,
            id: record.id.clone(),
        };

        let result = match action {
            RequestAction::Accept => self.api.accept_request(&record.id).await,
            _ => self.api.mark_resolved(&record.id).await,
        };

        if self.is_closed() {
            debug!(
                view = %self.view_id,
                request = %record.id,
                "Tela encerrada; resultado da ação descartado"
            );
            return Err(ActionError::ViewClosed);
        }

        match result {
            Ok(message) => {
                info!(view = %self.view_id, request = %record.id, "Ação '{}' concluída", action);
                self.notifier.notify(success_notification(record, action, message.clone()));

                // Falhas desta recarga já são notificadas por `load`
                let _ = self.load().await;
                Ok(ActionOutcome::Completed {
                    next_status,
                    message,
                })
            }
            Err(e) => {
                warn!(
                    view = %self.view_id,
                    request = %record.id,
                    "Ação '{}' falhou: {}",
                    action,
                    e
                );
                self.notifier.notify(failure_notification(action, &e));
                Err(ActionError::Remote(e))
            }
        }
    }

    /// Executa a ação sobre o registro com este id na coleção atual
    pub async fn perform_action_on(
        &self,
        id: &RequestId,
        action: RequestAction,
    ) -> Result<ActionOutcome, ActionError> {
        let record = self
            .record(id)
            .ok_or_else(|| ActionError::NotFound(id.clone()))?;
        self.perform_action(&record, action).await
    }

    fn navigate(&self, record: &RequestRecord) -> Result<ActionOutcome, ActionError> {
        match RequestCard::new(record.clone()).navigation_url() {
            Some(url) => Ok(ActionOutcome::Navigation { url }),
            None => {
                self.notifier.notify(Notification::error(
                    "Localização indisponível",
                    Some(format!(
                        "A solicitação de {} não informou coordenadas",
                        record.patient_name
                    )),
                ));
                Err(ActionError::LocationUnavailable(record.id.clone()))
            }
        }
    }

    pub fn toggle_expanded(&self, id: &RequestId) -> Option<bool> {
        self.with_card(id, RequestCard::toggle_expanded)
    }

    pub fn open_photo(&self, id: &RequestId) -> Option<bool> {
        self.with_card(id, RequestCard::open_photo_modal)
    }

    pub fn close_photo(&self, id: &RequestId) {
        self.with_card(id, RequestCard::close_photo_modal);
    }

    pub fn open_patient_details(&self, id: &RequestId) -> Option<bool> {
        self.with_card(id, RequestCard::open_patient_details)
    }

    pub fn close_patient_details(&self, id: &RequestId) {
        self.with_card(id, RequestCard::close_patient_details);
    }

    /// Encerra a tela: resultados que chegarem depois são descartados
    pub fn teardown(&self) {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            debug!(view = %self.view_id, "Listagem encerrada");
        }
    }

    fn with_card<T>(&self, id: &RequestId, f: impl FnOnce(&mut RequestCard) -> T) -> Option<T> {
        let mut state = self.lock();
        let result = state.card_mut(id).map(f);
        if result.is_some() {
            self.publish(&state);
        }
        result
    }

    fn acquire_action_lock(&self, id: &RequestId) -> bool {
        let mut state = self.lock();
        if !state.in_flight.insert(id.clone()) {
            return false;
        }
        if let Some(card) = state.card_mut(id) {
            card.action_in_flight = true;
        }
        self.publish(&state);
        true
    }

    fn release_action_lock(&self, id: &RequestId) {
        let mut state = self.lock();
        state.in_flight.remove(id);
        if let Some(card) = state.card_mut(id) {
            card.action_in_flight = false;
        }
        self.publish(&state);
    }

    fn finish_loading(&self) {
        let mut state = self.lock();
        state.loads_in_progress = state.loads_in_progress.saturating_sub(1);
        self.publish(&state);
    }

    fn publish(&self, state: &ListState) {
        self.updates.send_replace(state.snapshot());
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Libera o indicador de carregamento mesmo se a futura for abandonada
struct LoadingGuard<'a> {
    controller: &'a RequestListController,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.controller.finish_loading();
    }
}

/// Trava por registro contra envios duplicados
struct ActionLock<'a> {
    controller: &'a RequestListController,
    id: RequestId,
}

impl Drop for ActionLock<'_> {
    fn drop(&mut self) {
        self.controller.release_action_lock(&self.id);
    }
}

/// Busca a listagem correspondente ao filtro
pub async fn fetch_feed(
    api: &dyn EmergencyApi,
    feed: RequestFeed,
) -> Result<DecodedBatch, ApiError> {
    match feed {
        RequestFeed::Live => api.fetch_live().await,
        RequestFeed::Status(status) => api.fetch_by_status(status).await,
    }
}

fn success_notification(
    record: &RequestRecord,
    action: RequestAction,
    message: Option<String>,
) -> Notification {
    let (title, fallback) = match action {
        RequestAction::Accept => (
            "Solicitação aceita",
            format!("Você aceitou a solicitação de emergência de {}.", record.patient_name),
        ),
        _ => (
            "Solicitação resolvida",
            format!("A solicitação de {} foi marcada como resolvida.", record.patient_name),
        ),
    };
    Notification::success(title, Some(message.unwrap_or(fallback)))
}

fn failure_notification(action: RequestAction, error: &ApiError) -> Notification {
    let title = match action {
        RequestAction::Accept => "Falha ao aceitar a solicitação",
        _ => "Falha ao resolver a solicitação",
    };
    let description = error
        .server_message()
        .map(str::to_string)
        .unwrap_or_else(|| "Tente novamente.".to_string());
    Notification::error(title, Some(description))
}
