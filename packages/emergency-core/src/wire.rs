//! Auxiliares de (de)serialização para o formato JSON do backend
//!
//! O backend entrega documentos irregulares: campos opcionais podem faltar,
//! vir como `null` ou com o tipo errado em registros antigos. Estes
//! auxiliares absorvem essas diferenças sem derrubar a decodificação do
//! registro inteiro.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Decodifica um campo opcional; `null` ou tipo incompatível viram `None`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_lenient(value))
}

/// Mesma regra de [`lenient`], aplicada a um valor já extraído do documento.
/// Campo ausente equivale a `null`.
pub(crate) fn decode_lenient<T>(value: Option<&Value>) -> Option<T>
where
    T: DeserializeOwned,
{
    value.cloned().and_then(parse_lenient)
}

fn parse_lenient<T: DeserializeOwned>(value: Value) -> Option<T> {
    if value.is_null() {
        return None;
    }

    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Campo opcional ignorado por tipo incompatível: {}", e);
            None
        }
    }
}

/// Igual a [`lenient`], mas cai no valor padrão do tipo.
pub(crate) fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Aceita texto ou número (ex.: CEP/pincode gravado como inteiro).
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
