//! Estado de interface de um cartão de solicitação
//!
//! Cada cartão guarda apenas estado efêmero de exibição (expandido, modais
//! abertos, ação em andamento); tudo o que é derivado vem do registro.

use crate::models::{RequestId, RequestRecord, RequestStatus};
use crate::policy::{self, RequestAction};

/// Endereço base para rotas no Google Maps
const MAPS_DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/?api=1&destination=";

#[derive(Debug, Clone, PartialEq)]
pub struct RequestCard {
    record: RequestRecord,
    pub expanded: bool,
    pub photo_modal_open: bool,
    pub patient_details_modal_open: bool,
    /// Bloqueia novos envios enquanto aceitar/resolver está pendente
    pub action_in_flight: bool,
}

impl RequestCard {
    pub fn new(record: RequestRecord) -> Self {
        Self {
            record,
            expanded: false,
            photo_modal_open: false,
            patient_details_modal_open: false,
            action_in_flight: false,
        }
    }

    pub fn record(&self) -> &RequestRecord {
        &self.record
    }

    pub fn id(&self) -> &RequestId {
        &self.record.id
    }

    pub fn status(&self) -> RequestStatus {
        self.record.status
    }

    pub fn has_photo(&self) -> bool {
        self.record.has_photo()
    }

    pub fn has_patient_profile(&self) -> bool {
        self.record.has_patient_profile()
    }

    pub fn can_show_patient_details(&self) -> bool {
        self.has_patient_profile() && self.record.status.allows_patient_details()
    }

    pub fn allowed_actions(&self) -> &'static [RequestAction] {
        policy::allowed_actions(self.record.status)
    }

    /// Controle visível e clicável neste momento
    pub fn is_action_enabled(&self, action: RequestAction) -> bool {
        policy::is_allowed(self.record.status, action)
            && !(action.is_mutation() && self.action_in_flight)
    }

    pub fn toggle_expanded(&mut self) -> bool {
        self.expanded = !self.expanded;
        self.expanded
    }

    /// Abre a foto; sem foto o modal permanece fechado
    pub fn open_photo_modal(&mut self) -> bool {
        self.photo_modal_open = self.has_photo();
        self.photo_modal_open
    }

    pub fn close_photo_modal(&mut self) {
        self.photo_modal_open = false;
    }

    /// Abre a ficha do paciente apenas para solicitações finalizadas ou resolvidas
    pub fn open_patient_details(&mut self) -> bool {
        self.patient_details_modal_open = self.can_show_patient_details();
        self.patient_details_modal_open
    }

    pub fn close_patient_details(&mut self) {
        self.patient_details_modal_open = false;
    }

    /// Rota até o paciente; `None` quando o registro não tem localização
    pub fn navigation_url(&self) -> Option<String> {
        self.record.location.map(|location| {
            format!(
                "{}{},{}",
                MAPS_DIRECTIONS_URL,
                location.latitude(),
                location.longitude()
            )
        })
    }

    pub fn status_hint(&self) -> Option<&'static str> {
        match self.record.status {
            RequestStatus::Accepted => Some("Aguardando finalização do paciente"),
            _ => None,
        }
    }

    /// Troca o registro por uma versão mais nova, mantendo o estado de
    /// interface que ainda faz sentido para ela.
    pub fn refresh(&mut self, record: RequestRecord) {
        debug_assert_eq!(record.id, self.record.id);
        self.record = record;
        if !self.has_photo() {
            self.photo_modal_open = false;
        }
        if !self.can_show_patient_details() {
            self.patient_details_modal_open = false;
        }
    }
}
