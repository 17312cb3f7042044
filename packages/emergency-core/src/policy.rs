//! Regras de ações permitidas por status
//!
//! Tabela fechada que decide quais controles um cartão de solicitação pode
//! oferecer e para qual status cada ação leva.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidTransitionError;
use crate::models::RequestStatus;

/// Ações que o hospital pode executar sobre uma solicitação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestAction {
    /// Aceitar uma solicitação pendente
    Accept,
    /// Abrir rota até o paciente (sem mudança de status)
    Navigate,
    /// Marcar uma solicitação finalizada como resolvida
    Resolve,
}

impl RequestAction {
    /// Ações que alteram o estado no backend
    pub fn is_mutation(&self) -> bool {
        !matches!(self, RequestAction::Navigate)
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestAction::Accept => write!(f, "accept"),
            RequestAction::Navigate => write!(f, "navigate"),
            RequestAction::Resolve => write!(f, "resolve"),
        }
    }
}

/// Ações oferecidas para cada status.
///
/// `accepted -> finalized` não aparece aqui: a finalização é feita pelo
/// paciente e só é observada na próxima atualização.
pub fn allowed_actions(status: RequestStatus) -> &'static [RequestAction] {
    match status {
        RequestStatus::Pending => &[RequestAction::Accept],
        RequestStatus::Accepted => &[RequestAction::Navigate],
        RequestStatus::Finalized => &[RequestAction::Navigate, RequestAction::Resolve],
        RequestStatus::Resolved | RequestStatus::Cancelled => &[],
    }
}

pub fn is_allowed(status: RequestStatus, action: RequestAction) -> bool {
    allowed_actions(status).contains(&action)
}

/// Status resultante de aplicar `action` sobre `status`.
pub fn apply_transition(
    status: RequestStatus,
    action: RequestAction,
) -> Result<RequestStatus, InvalidTransitionError> {
    match (status, action) {
        (RequestStatus::Pending, RequestAction::Accept) => Ok(RequestStatus::Accepted),
        (RequestStatus::Accepted, RequestAction::Navigate)
        | (RequestStatus::Finalized, RequestAction::Navigate) => Ok(status),
        (RequestStatus::Finalized, RequestAction::Resolve) => Ok(RequestStatus::Resolved),
        _ => Err(InvalidTransitionError { status, action }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIONS: [RequestAction; 3] = [
        RequestAction::Accept,
        RequestAction::Navigate,
        RequestAction::Resolve,
    ];

    #[test]
    fn test_terminal_states_have_no_actions() {
        for status in [RequestStatus::Resolved, RequestStatus::Cancelled] {
            assert!(status.is_terminal());
            assert!(allowed_actions(status).is_empty());
        }
    }

    #[test]
    fn test_transition_table() {
        let expected = [
            (RequestStatus::Pending, RequestAction::Accept, RequestStatus::Accepted),
            (RequestStatus::Accepted, RequestAction::Navigate, RequestStatus::Accepted),
            (RequestStatus::Finalized, RequestAction::Navigate, RequestStatus::Finalized),
            (RequestStatus::Finalized, RequestAction::Resolve, RequestStatus::Resolved),
        ];

        for status in RequestStatus::ALL {
            for action in ACTIONS {
                let result = apply_transition(status, action);
                match expected.iter().find(|(s, a, _)| *s == status && *a == action) {
                    Some((_, _, next)) => assert_eq!(result, Ok(*next)),
                    None => assert_eq!(result, Err(InvalidTransitionError { status, action })),
                }
            }
        }
    }

    #[test]
    fn test_allowed_actions_agree_with_transitions() {
        for status in RequestStatus::ALL {
            for action in ACTIONS {
                assert_eq!(
                    is_allowed(status, action),
                    apply_transition(status, action).is_ok(),
                    "{status}/{action}"
                );
            }
        }
    }

    #[test]
    fn test_accepted_never_finalizes_locally() {
        for action in ACTIONS {
            assert_ne!(
                apply_transition(RequestStatus::Accepted, action),
                Ok(RequestStatus::Finalized)
            );
        }
    }
}
