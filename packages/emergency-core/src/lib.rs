//! Emergency Core - Biblioteca compartilhada do painel hospitalar de emergências
//!
//! Esta biblioteca fornece:
//! - Modelo das solicitações de emergência e decodificação tolerante
//! - Tabela de ações permitidas por status
//! - Estado de interface dos cartões de solicitação
//! - Perfil do hospital (leitos, banco de sangue, contatos)

pub mod card;
pub mod error;
pub mod feed;
pub mod models;
pub mod policy;
pub mod profile;
mod wire;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use card::RequestCard;
pub use error::{InvalidTransitionError, MalformedRecordError, UnknownStatusError};
pub use feed::{RequestCollection, RequestFeed};
pub use models::{
    decode_records, DecodedBatch, Location, PatientProfile, RequestId, RequestRecord, RequestStatus,
};
pub use policy::{allowed_actions, apply_transition, RequestAction};
pub use profile::{HospitalProfile, ProfileUpdate};
