//! Cliente da API REST do backend de emergências
//!
//! Os endpoints são fornecidos por um backend externo; este módulo apenas
//! monta as chamadas, interpreta o envelope `{ data, message }` e converte
//! falhas em [`ApiError`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use emergency_core::{
    decode_records, DecodedBatch, HospitalProfile, ProfileUpdate, RequestId, RequestStatus,
};
use reqwest::{IntoUrl, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::built_info;
use crate::config::DeskConfig;
use crate::error::ApiError;
use crate::session::SessionContext;

pub const LIVE_REQUESTS_PATH: &str = "/emergency/hospital/get_nearby_emergency_requests";
pub const REQUESTS_BY_STATUS_PATH: &str = "/emergency/hospital/get_emergency_requests_by_status";
pub const ACCEPT_REQUEST_PATH: &str = "/emergency/hospital/accept_emergency_request";
pub const MARK_RESOLVED_PATH: &str = "/emergency/hospital/mark_resolved";
pub const PROFILE_PATH: &str = "/users/hospital/profile";
pub const UPDATE_PROFILE_PATH: &str = "/users/hospital/update-profile";
pub const DASHBOARD_PATH: &str = "/users/hospital/dashboard";

/// Operações do backend usadas pelo painel
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmergencyApi: Send + Sync {
    /// Solicitações pendentes próximas ao hospital
    async fn fetch_live(&self) -> Result<DecodedBatch, ApiError>;

    /// Solicitações deste hospital em um status
    async fn fetch_by_status(&self, status: RequestStatus) -> Result<DecodedBatch, ApiError>;

    /// `pending -> accepted`; devolve a mensagem do backend, se houver
    async fn accept_request(&self, id: &RequestId) -> Result<Option<String>, ApiError>;

    /// `finalized -> resolved`; leitos e estoque de sangue são ajustados no backend
    async fn mark_resolved(&self, id: &RequestId) -> Result<Option<String>, ApiError>;

    async fn hospital_profile(&self) -> Result<HospitalProfile, ApiError>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Option<String>, ApiError>;

    /// Painel resumido, tratado como JSON opaco
    async fn dashboard(&self) -> Result<Value, ApiError>;
}

/// Envelope de sucesso comum a todos os endpoints
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    message: Option<String>,
}

/// Corpo de erro (respostas não-2xx)
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusFilter<'a> {
    status: &'a str,
}

/// Implementação HTTP de [`EmergencyApi`]
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl RestClient {
    pub fn new(config: &DeskConfig, session: Arc<SessionContext>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(user_agent())
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.request_url(method, url)
    }

    /// Endpoint de ação com o id como último segmento do caminho,
    /// percentual-codificado (`/`, `?` e `#` não mudam o destino)
    fn action_request(&self, path: &str, id: &RequestId) -> Result<RequestBuilder, ApiError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::Internal(format!("URL inválida: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Internal(format!("URL sem caminho: {}", self.base_url)))?
            .push(id.as_str());

        Ok(self.request_url(Method::POST, url))
    }

    fn request_url(&self, method: Method, url: impl IntoUrl + fmt::Display) -> RequestBuilder {
        debug!("{} {}", method, url);

        let builder = self.http.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message);
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        // Alguns endpoints de ação respondem 2xx sem corpo
        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Envelope {
                data: None,
                message: None,
            });
        }

        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn fetch_list(&self, builder: RequestBuilder) -> Result<DecodedBatch, ApiError> {
        let envelope = self.send::<Vec<Value>>(builder).await?;
        let values = envelope
            .data
            .ok_or_else(|| ApiError::InvalidResponse("resposta sem o campo 'data'".to_string()))?;

        let batch = decode_records(values);
        if !batch.rejected.is_empty() {
            warn!(
                "{} registro(s) malformado(s) descartado(s) da listagem",
                batch.rejected.len()
            );
        }
        Ok(batch)
    }
}

#[async_trait]
impl EmergencyApi for RestClient {
    async fn fetch_live(&self) -> Result<DecodedBatch, ApiError> {
        self.fetch_list(self.request(Method::GET, LIVE_REQUESTS_PATH)).await
    }

    async fn fetch_by_status(&self, status: RequestStatus) -> Result<DecodedBatch, ApiError> {
        let builder = self
            .request(Method::POST, REQUESTS_BY_STATUS_PATH)
            .json(&StatusFilter {
                status: status.as_str(),
            });
        self.fetch_list(builder).await
    }

    async fn accept_request(&self, id: &RequestId) -> Result<Option<String>, ApiError> {
        let builder = self.action_request(ACCEPT_REQUEST_PATH, id)?;
        let envelope = self.send::<Value>(builder).await?;
        Ok(envelope.message)
    }

    async fn mark_resolved(&self, id: &RequestId) -> Result<Option<String>, ApiError> {
        let builder = self.action_request(MARK_RESOLVED_PATH, id)?;
        let envelope = self.send::<Value>(builder).await?;
        Ok(envelope.message)
    }

    async fn hospital_profile(&self) -> Result<HospitalProfile, ApiError> {
        let envelope = self
            .send::<HospitalProfile>(self.request(Method::GET, PROFILE_PATH))
            .await?;
        let profile = envelope
            .data
            .ok_or_else(|| ApiError::InvalidResponse("perfil ausente na resposta".to_string()))?;

        self.session.remember_profile(&profile);
        Ok(profile)
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Option<String>, ApiError> {
        let builder = self.request(Method::PUT, UPDATE_PROFILE_PATH).json(update);
        let envelope = self.send::<Value>(builder).await?;
        Ok(envelope.message)
    }

    async fn dashboard(&self) -> Result<Value, ApiError> {
        let envelope = self
            .send::<Value>(self.request(Method::GET, DASHBOARD_PATH))
            .await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }
}

pub fn user_agent() -> String {
    format!("{}/{}", built_info::PKG_NAME, built_info::PKG_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use emergency_core::fixtures;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, token: Option<&str>) -> RestClient {
        let config = DeskConfig {
            api_base_url: server.uri(),
            request_timeout_secs: 1,
            ..Default::default()
        };
        let session = Arc::new(SessionContext::new(token.map(str::to_string)));
        RestClient::new(&config, session).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_live_drops_malformed_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LIVE_REQUESTS_PATH))
            .and(header("authorization", "Bearer segredo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    fixtures::pending_with_location(),
                    { "_id": "quebrado", "status": "pending" },
                    fixtures::pending_without_location()
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let batch = client_for(&server, Some("segredo")).fetch_live().await.unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        assert!(batch.records[1].location.is_none());
    }

    #[tokio::test]
    async fn test_fetch_by_status_posts_filter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REQUESTS_BY_STATUS_PATH))
            .and(body_json(json!({ "status": "accepted" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [fixtures::record_json("a1", RequestStatus::Accepted)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let batch = client_for(&server, None)
            .fetch_by_status(RequestStatus::Accepted)
            .await
            .unwrap();

        assert_eq!(batch.records[0].id.as_str(), "a1");
    }

    #[tokio::test]
    async fn test_accept_and_resolve_paths() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/r1", ACCEPT_REQUEST_PATH)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "message": "Solicitação aceita" })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/r2", MARK_RESOLVED_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let accepted = client.accept_request(&RequestId::from("r1")).await.unwrap();
        let resolved = client.mark_resolved(&RequestId::from("r2")).await.unwrap();

        assert_eq!(accepted.as_deref(), Some("Solicitação aceita"));
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn test_action_ids_are_escaped_in_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/a%2Fb%3Fc%23d", ACCEPT_REQUEST_PATH)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{}/a/b", ACCEPT_REQUEST_PATH)))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let message = client_for(&server, None)
            .accept_request(&RequestId::from("a/b?c#d"))
            .await
            .unwrap();
        assert_eq!(message.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_empty_success_body_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/r3", MARK_RESOLVED_PATH)))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let message = client_for(&server, None)
            .mark_resolved(&RequestId::from("r3"))
            .await
            .unwrap();
        assert_eq!(message, None);
    }

    #[tokio::test]
    async fn test_error_responses_carry_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/r1", ACCEPT_REQUEST_PATH)))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({ "message": "Já aceita por outro hospital" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(LIVE_REQUESTS_PATH))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);

        let err = client.accept_request(&RequestId::from("r1")).await.unwrap_err();
        assert_eq!(err.server_message(), Some("Já aceita por outro hospital"));
        assert!(matches!(err, ApiError::Http { status: 409, .. }));

        let err = client.fetch_live().await.unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: 502,
                message: None
            }
        );
    }

    #[tokio::test]
    async fn test_list_without_data_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LIVE_REQUESTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
            .mount(&server)
            .await;

        let err = client_for(&server, None).fetch_live().await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LIVE_REQUESTS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": [] }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, None).fetch_live().await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_connection_error() {
        // Porta liberada logo após o bind: ninguém escuta nela
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let config = DeskConfig {
            api_base_url: format!("http://127.0.0.1:{}", port),
            ..Default::default()
        };
        let client = RestClient::new(&config, Arc::new(SessionContext::anonymous())).unwrap();

        let err = client.fetch_live().await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(_)));
    }

    #[tokio::test]
    async fn test_profile_updates_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": fixtures::hospital_profile() })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Some("t"));
        let profile = client.hospital_profile().await.unwrap();

        assert_eq!(profile.total_beds(), 60);
        assert_eq!(
            client.session().identity().map(|i| i.name),
            Some("Sunrise Medical Center".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_profile_sends_payload() {
        let server = MockServer::start().await;
        let profile: HospitalProfile =
            serde_json::from_value(fixtures::hospital_profile()).unwrap();
        let update = profile.to_update();

        Mock::given(method("PUT"))
            .and(path(UPDATE_PROFILE_PATH))
            .and(body_json(serde_json::to_value(&update).unwrap()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "message": "Perfil atualizado" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let message = client_for(&server, None).update_profile(&update).await.unwrap();
        assert_eq!(message.as_deref(), Some("Perfil atualizado"));
    }
}
