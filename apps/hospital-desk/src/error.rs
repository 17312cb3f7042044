//! Definições de erro do painel
//!
//! Erros de transporte (`ApiError`) e os erros expostos na fronteira dos
//! controladores (`FetchError`, `ActionError`).

use emergency_core::{InvalidTransitionError, RequestId};
use thiserror::Error;

/// Falhas ao conversar com o backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Erro de conexão com o backend: {0}")]
    Connection(String),

    #[error("Tempo limite excedido: {0}")]
    Timeout(String),

    #[error(
        "Backend respondeu com status {status}: {}",
        .message.as_deref().unwrap_or("sem detalhes")
    )]
    Http { status: u16, message: Option<String> },

    #[error("Resposta inválida do backend: {0}")]
    InvalidResponse(String),

    #[error("Erro interno do cliente: {0}")]
    Internal(String),
}

impl ApiError {
    /// Mensagem amigável enviada pelo backend, quando houver
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Conversão dos erros do reqwest para nossos tipos de erro
impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Timeout(error.to_string())
        } else if error.is_connect() {
            ApiError::Connection(error.to_string())
        } else if error.is_decode() {
            ApiError::InvalidResponse(error.to_string())
        } else if let Some(status) = error.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: None,
            }
        } else if error.is_builder() || error.is_request() {
            ApiError::Internal(error.to_string())
        } else {
            ApiError::Connection(error.to_string())
        }
    }
}

/// Falha ao carregar uma listagem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Falha ao buscar solicitações: {0}")]
    Api(#[from] ApiError),

    #[error("Tela encerrada; resultado descartado")]
    ViewClosed,
}

/// Falha ao executar uma ação sobre uma solicitação
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),

    #[error("Já existe uma ação em andamento para a solicitação {0}")]
    InFlight(RequestId),

    #[error("Solicitação {0} não está na listagem atual")]
    NotFound(RequestId),

    #[error("Solicitação {0} não possui localização")]
    LocationUnavailable(RequestId),

    #[error("Falha ao executar a ação: {0}")]
    Remote(#[source] ApiError),

    #[error("Tela encerrada; resultado descartado")]
    ViewClosed,
}
