//! Definições de erro do domínio de solicitações de emergência
//!
//! Este módulo define os erros que não dependem de transporte: falhas de
//! decodificação de registros e violações da tabela de transições.

use thiserror::Error;

use crate::models::RequestStatus;
use crate::policy::RequestAction;

/// Registro recebido do backend sem os campos obrigatórios
/// (`_id`, `status`, `patientName`) ou com tipos incompatíveis.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Registro malformado ({}): {reason}", .id.as_deref().unwrap_or("sem id"))]
pub struct MalformedRecordError {
    /// Identificador do registro, quando foi possível lê-lo
    pub id: Option<String>,
    /// Descrição da falha de decodificação
    pub reason: String,
}

impl MalformedRecordError {
    pub fn new(id: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }
}

/// Ação não permitida para o status atual do registro.
///
/// Indica um defeito na interface: um controle foi exibido para uma ação
/// que a tabela de transições não oferece.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Transição inválida: ação '{action}' não é permitida no status '{status}'")]
pub struct InvalidTransitionError {
    pub status: RequestStatus,
    pub action: RequestAction,
}

/// Texto que não corresponde a nenhum status conhecido
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Status desconhecido: {0}")]
pub struct UnknownStatusError(pub String);
