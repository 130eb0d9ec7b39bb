//! Keyset pagination cursor (spec §4.5, "Keyset pagination"; spec §6,
//! "Cursor format").
//!
//! `base64url(JSON({"id":"<uuid>","v":"<sort-value>"}))`; a plain UUID is
//! also accepted for id-only pagination (spec §8, "Boundary behaviors").

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hrql_ast::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CursorPayload {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    v: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub id: String,
    pub order_value: Option<String>,
}

impl Cursor {
    pub fn new(id: impl Into<String>, order_value: Option<String>) -> Self {
        Cursor {
            id: id.into(),
            order_value,
        }
    }

    pub fn encode(&self) -> String {
        if self.order_value.is_none() {
            return self.id.clone();
        }
        let payload = CursorPayload {
            id: self.id.clone(),
            v: self.order_value.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("cursor payload is always serializable");
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(raw: &str) -> Result<Cursor, Error> {
        if uuid::Uuid::parse_str(raw).is_ok() {
            return Ok(Cursor::new(raw, None));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|_| Error::translation("cursor is neither a UUID nor valid base64url"))?;
        let payload: CursorPayload = serde_json::from_slice(&bytes)
            .map_err(|_| Error::translation("cursor payload is not valid JSON"))?;
        Ok(Cursor::new(payload.id, payload.v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_order_value() {
        let cursor = Cursor::new("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa", Some("2024-01-01".to_string()));
        let encoded = cursor.encode();
        let decoded = Cursor::decode(&encoded).unwrap();
        assert_eq!(cursor, decoded);
    }

    #[test]
    fn accepts_plain_uuid() {
        let decoded = Cursor::decode("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa").unwrap();
        assert_eq!(decoded.order_value, None);
    }
}
