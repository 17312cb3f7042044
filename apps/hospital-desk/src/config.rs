//! Configuração do painel
//!
//! Valores padrão, leitura de variáveis de ambiente e validação.

use std::time::Duration;

use anyhow::{Context, Result};
use validator::Validate;

/// Intervalo padrão de atualização da listagem ao vivo
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

pub const ENV_API_URL: &str = "HOSPITAL_DESK_API_URL";
pub const ENV_TOKEN: &str = "HOSPITAL_DESK_TOKEN";
pub const ENV_POLL_SECS: &str = "HOSPITAL_DESK_POLL_SECS";
pub const ENV_TIMEOUT_SECS: &str = "HOSPITAL_DESK_TIMEOUT_SECS";

/// Configuração de acesso ao backend
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct DeskConfig {
    /// URL base da API (sem barra final)
    #[validate(url)]
    pub api_base_url: String,
    /// Token de sessão enviado como `Bearer`
    pub token: Option<String>,
    /// Intervalo entre atualizações da listagem ao vivo
    #[validate(range(min = 1, max = 3600))]
    pub poll_interval_secs: u64,
    /// Tempo limite de cada chamada HTTP
    #[validate(range(min = 1, max = 120))]
    pub request_timeout_secs: u64,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            token: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: 10,
        }
    }
}

impl DeskConfig {
    /// Lê a configuração das variáveis de ambiente, com os padrões acima
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config.api_base_url = url;
        }
        config.token = lookup(ENV_TOKEN).filter(|token| !token.trim().is_empty());
        if let Some(secs) = lookup(ENV_POLL_SECS) {
            config.poll_interval_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{} deve ser um número de segundos", ENV_POLL_SECS))?;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            config.request_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("{} deve ser um número de segundos", ENV_TIMEOUT_SECS))?;
        }

        Ok(config)
    }

    /// Valida e normaliza a configuração
    pub fn validated(mut self) -> Result<Self> {
        self.validate().context("Configuração inválida")?;
        while self.api_base_url.ends_with('/') {
            self.api_base_url.pop();
        }
        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
