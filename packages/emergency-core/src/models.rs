//! Modelos de dados das solicitações de emergência
//!
//! Este módulo define o registro de uma solicitação como entregue pelo
//! backend e a decodificação tolerante do formato de transmissão.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{MalformedRecordError, UnknownStatusError};
use crate::wire::{decode_lenient, lenient, lenient_or_default, string_or_number};

/// Status possíveis de uma solicitação de emergência
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Aberta, aguardando um hospital aceitar
    Pending,
    /// Aceita por este hospital, aguardando finalização do paciente
    Accepted,
    /// Confirmada pelo paciente
    Finalized,
    /// Atendimento concluído
    Resolved,
    /// Cancelada
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Pending,
        RequestStatus::Accepted,
        RequestStatus::Finalized,
        RequestStatus::Resolved,
        RequestStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Finalized => "finalized",
            RequestStatus::Resolved => "resolved",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Nenhuma ação local é possível a partir deste status
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Resolved | RequestStatus::Cancelled)
    }

    /// Dados do paciente só podem ser exibidos após a finalização
    pub fn allows_patient_details(&self) -> bool {
        matches!(self, RequestStatus::Finalized | RequestStatus::Resolved)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatusError(s.to_string()))
    }
}

/// Identificador opaco atribuído pelo backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Ponto GeoJSON: `coordinates` é `[longitude, latitude]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<GeoKind>,
    pub coordinates: [f64; 2],
}

/// Único tipo de geometria usado pelo backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoKind {
    Point,
}

impl Location {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: Some(GeoKind::Point),
            coordinates: [longitude, latitude],
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

/// Endereço postal (paciente ou hospital)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub state: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub pincode: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        [&self.locality, &self.city, &self.state, &self.pincode]
            .iter()
            .all(|part| part.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

/// Contato de emergência do paciente
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(
        rename = "phoneNumber",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub relation: Option<String>,
}

/// Ficha do paciente anexada após a finalização
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(
        rename = "medicalHistory",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub medical_history: Option<Vec<String>>,
    #[serde(
        rename = "emergencyContacts",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub emergency_contacts: Option<Vec<EmergencyContact>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub address: Option<Address>,
    /// Campos não modelados, preservados como vieram
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PatientProfile {
    /// Verdadeiro se ao menos um campo traz informação
    pub fn is_populated(&self) -> bool {
        let history = self
            .medical_history
            .as_ref()
            .is_some_and(|items| items.iter().any(|item| !item.trim().is_empty()));
        let contacts = self
            .emergency_contacts
            .as_ref()
            .is_some_and(|contacts| !contacts.is_empty());
        let address = self.address.as_ref().is_some_and(|a| !a.is_empty());
        let extra = self.extra.values().any(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(fields) => !fields.is_empty(),
            _ => true,
        });

        history || contacts || address || extra
    }
}

/// Uma solicitação de emergência
///
/// Registros decodificados guardam o documento de origem: ao codificar de
/// volta, campos que não mudaram saem exatamente como vieram (`null`
/// explícito, data com `.000`, coordenadas inteiras, tipo inesperado).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    /// Identificador único, imutável
    pub id: RequestId,
    pub patient_name: String,
    pub patient_phone_number: String,
    /// Status atual segundo o backend
    pub status: RequestStatus,
    /// O próprio paciente abriu a solicitação
    pub for_self: bool,
    pub is_ambulance_required: bool,
    /// Descrição livre da emergência
    pub description: Option<String>,
    /// Ausente em registros antigos
    pub location: Option<Location>,
    /// URL da foto enviada pelo solicitante
    pub photo_url: Option<String>,
    pub patient_profile: Option<PatientProfile>,
    pub created_at: Option<DateTime<Utc>>,
    /// Campos que este cliente não interpreta (`createdBy`, `acceptedBy`, `__v`...)
    pub extra: Map<String, Value>,
    pub(crate) source: Option<Arc<Map<String, Value>>>,
}

/// Formato de transmissão de [`RequestRecord`]
#[derive(Serialize, Deserialize)]
struct WireRecord {
    #[serde(rename = "_id")]
    id: RequestId,
    #[serde(rename = "patientName")]
    patient_name: String,
    #[serde(
        rename = "patientPhoneNumber",
        default,
        deserialize_with = "lenient_or_default"
    )]
    patient_phone_number: String,
    status: RequestStatus,
    #[serde(rename = "forSelf", default, deserialize_with = "lenient_or_default")]
    for_self: bool,
    #[serde(default, deserialize_with = "lenient_or_default")]
    is_ambulance_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    location: Option<Location>,
    #[serde(
        rename = "photo",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    photo_url: Option<String>,
    #[serde(
        rename = "patientProfile",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    patient_profile: Option<PatientProfile>,
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RequestRecord> for WireRecord {
    fn from(record: RequestRecord) -> Self {
        Self {
            id: record.id,
            patient_name: record.patient_name,
            patient_phone_number: record.patient_phone_number,
            status: record.status,
            for_self: record.for_self,
            is_ambulance_required: record.is_ambulance_required,
            description: record.description,
            location: record.location,
            photo_url: record.photo_url,
            patient_profile: record.patient_profile,
            created_at: record.created_at,
            extra: record.extra,
        }
    }
}

impl RequestRecord {
    /// Decodifica um documento do backend.
    ///
    /// Falha apenas quando `_id`, `status` ou `patientName` faltam ou têm o
    /// tipo errado; campos opcionais problemáticos viram ausentes.
    pub fn from_value(value: Value) -> Result<Self, MalformedRecordError> {
        let id = value
            .get("_id")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let Value::Object(document) = value else {
            return Err(MalformedRecordError::new(id, "documento não é um objeto JSON"));
        };

        Self::from_document(document).map_err(|e| MalformedRecordError::new(id, e.to_string()))
    }

    fn from_document(document: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let wire: WireRecord = serde_json::from_value(Value::Object(document.clone()))?;

        Ok(Self {
            id: wire.id,
            patient_name: wire.patient_name,
            patient_phone_number: wire.patient_phone_number,
            status: wire.status,
            for_self: wire.for_self,
            is_ambulance_required: wire.is_ambulance_required,
            description: wire.description,
            location: wire.location,
            photo_url: wire.photo_url,
            patient_profile: wire.patient_profile,
            created_at: wire.created_at,
            extra: wire.extra,
            source: Some(Arc::new(document)),
        })
    }

    pub fn has_photo(&self) -> bool {
        self.photo_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    pub fn has_patient_profile(&self) -> bool {
        self.patient_profile
            .as_ref()
            .is_some_and(PatientProfile::is_populated)
    }

    /// Troca pela forma original os campos cujo valor ainda é o que a
    /// decodificação produziu a partir dela.
    fn restore_wire_form(&self, source: &Map<String, Value>, document: &mut Map<String, Value>) {
        let field = |key: &str| source.get(key);
        let unchanged = [
            (
                "patientPhoneNumber",
                decode_lenient::<String>(field("patientPhoneNumber")).unwrap_or_default()
                    == self.patient_phone_number,
            ),
            (
                "forSelf",
                decode_lenient::<bool>(field("forSelf")).unwrap_or_default() == self.for_self,
            ),
            (
                "is_ambulance_required",
                decode_lenient::<bool>(field("is_ambulance_required")).unwrap_or_default()
                    == self.is_ambulance_required,
            ),
            (
                "description",
                decode_lenient::<String>(field("description")) == self.description,
            ),
            (
                "location",
                decode_lenient::<Location>(field("location")) == self.location,
            ),
            ("photo", decode_lenient::<String>(field("photo")) == self.photo_url),
            (
                "patientProfile",
                decode_lenient::<PatientProfile>(field("patientProfile")) == self.patient_profile,
            ),
            (
                "createdAt",
                decode_lenient::<DateTime<Utc>>(field("createdAt")) == self.created_at,
            ),
        ];

        for (key, unchanged) in unchanged {
            if !unchanged {
                continue;
            }
            match source.get(key) {
                Some(original) => {
                    document.insert(key.to_string(), original.clone());
                }
                None => {
                    document.remove(key);
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for RequestRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let document = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_document(document).map_err(de::Error::custom)
    }
}

impl Serialize for RequestRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = WireRecord::from(self.clone());
        let encoded = serde_json::to_value(wire).map_err(<S::Error as ser::Error>::custom)?;
        let mut document = match encoded {
            Value::Object(document) => document,
            _ => return Err(ser::Error::custom("registro não codificou como objeto")),
        };

        if let Some(source) = &self.source {
            self.restore_wire_form(source, &mut document);
        }
        document.serialize(serializer)
    }
}

/// Resultado da decodificação de uma lista de registros
#[derive(Debug, Default)]
pub struct DecodedBatch {
    pub records: Vec<RequestRecord>,
    pub rejected: Vec<MalformedRecordError>,
}

/// Decodifica uma lista descartando (e registrando em log) os registros
/// malformados, sem invalidar os demais.
pub fn decode_records(values: Vec<Value>) -> DecodedBatch {
    let mut batch = DecodedBatch::default();

    for value in values {
        match RequestRecord::from_value(value) {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                warn!("Registro descartado: {}", e);
                batch.rejected.push(e);
            }
        }
    }

    batch
}
