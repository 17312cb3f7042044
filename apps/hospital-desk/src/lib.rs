//! Hospital Desk - Painel de emergências do hospital
//!
//! Este crate fornece:
//! - Cliente da API REST de emergências
//! - Controlador das listagens por status, com aceite e resolução
//! - Atualização periódica da listagem ao vivo
//! - Renderização em texto para o terminal

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod notify;
pub mod polling;
pub mod render;
pub mod session;

#[cfg(test)]
mod testing;

/// Informações geradas em tempo de build (nome e versão do pacote)
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use api::{EmergencyApi, RestClient};
pub use config::DeskConfig;
pub use controller::{ActionOutcome, ListSnapshot, RequestListController};
pub use error::{ActionError, ApiError, FetchError};
pub use notify::{ChannelNotifier, LogNotifier, Notification, Notifier};
pub use polling::{LivePollingController, PollState};
pub use session::SessionContext;
