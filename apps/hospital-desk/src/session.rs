//! Contexto de sessão injetado nos controladores
//!
//! A autenticação em si acontece fora deste painel; aqui guardamos apenas o
//! token recebido e a identificação do hospital obtida do perfil.

use std::sync::RwLock;

use emergency_core::HospitalProfile;
use tracing::debug;

/// Identificação do hospital logado
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HospitalIdentity {
    pub name: String,
    pub profile_id: String,
}

#[derive(Debug, Default)]
pub struct SessionContext {
    token: Option<String>,
    identity: RwLock<Option<HospitalIdentity>>,
}

impl SessionContext {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            identity: RwLock::new(None),
        }
    }

    /// Sessão sem credenciais, usada em testes e ambientes locais
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn identity(&self) -> Option<HospitalIdentity> {
        match self.identity.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Guarda nome e id do hospital após buscar o perfil
    pub fn remember_profile(&self, profile: &HospitalProfile) {
        let identity = HospitalIdentity {
            name: profile.name.clone(),
            profile_id: profile.id.clone(),
        };
        debug!("Sessão associada ao hospital {}", identity.profile_id);

        match self.identity.write() {
            Ok(mut guard) => *guard = Some(identity),
            Err(poisoned) => *poisoned.into_inner() = Some(identity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emergency_core::fixtures;

    #[test]
    fn test_remember_profile() {
        let session = SessionContext::new(Some("token".to_string()));
        assert_eq!(session.identity(), None);

        let profile: HospitalProfile =
            serde_json::from_value(fixtures::hospital_profile()).unwrap();
        session.remember_profile(&profile);

        let identity = session.identity().unwrap();
        assert_eq!(identity.name, "Sunrise Medical Center");
        assert_eq!(identity.profile_id, "680fcc0cad15e2b2bbc00999");
        assert_eq!(session.token(), Some("token"));
    }
}
