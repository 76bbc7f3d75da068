use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// User details read out of an access token payload **without** checking its
/// signature or expiry.
///
/// Only fit for display (greeting, avatar initials, highlighting own rows).
/// The server decides what a token is allowed to do; nothing here is proof of
/// who the caller is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnverifiedIdentity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
struct Payload {
    user_id: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

/// Derives an [`UnverifiedIdentity`] from a bearer token.
///
/// Returns `None` for anything that is not three dot-separated segments with a
/// base64 JSON object in the middle carrying `user_id` and `email`.
pub fn decode_identity(token: &str) -> Option<UnverifiedIdentity> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let bytes = STANDARD_LENIENT
        .decode(payload)
        .or_else(|_| URL_SAFE_LENIENT.decode(payload))
        .ok()?;
    let record: Map<String, Value> = serde_json::from_slice(&bytes).ok()?;
    let payload: Payload = serde_json::from_value(Value::Object(record)).ok()?;

    let name = match payload.name {
        Some(name) if !name.is_empty() => name,
        _ => email_local_part(&payload.email).to_string(),
    };

    Some(UnverifiedIdentity {
        id: payload.user_id,
        email: payload.email,
        name,
        role: payload.role.unwrap_or_default(),
    })
}

fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn token_with(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn test_decodes_all_fields() {
        let token = token_with(json!({
            "user_id": "0b6f1f8e-1111-4c1a-9a39-1d7a2f0c8e01",
            "email": "hana@example.com",
            "name": "Hana",
            "role": "admin",
            "tenant_id": "t-1",
            "permissions": {"todos": ["read", "write"]},
        }));

        let identity = decode_identity(&token).unwrap();
        assert_eq!(identity.id, "0b6f1f8e-1111-4c1a-9a39-1d7a2f0c8e01");
        assert_eq!(identity.email, "hana@example.com");
        assert_eq!(identity.name, "Hana");
        assert_eq!(identity.role, "admin");
    }

    #[test]
    fn test_name_falls_back_to_email_local_part() {
        let token = token_with(json!({"user_id": "u1", "email": "kenji@example.com", "role": "member"}));
        assert_eq!(decode_identity(&token).unwrap().name, "kenji");

        let token = token_with(json!({"user_id": "u1", "email": "a@b@example.com", "name": ""}));
        assert_eq!(decode_identity(&token).unwrap().name, "a");
    }

    #[test]
    fn test_wrong_segment_count() {
        let payload = URL_SAFE_NO_PAD.encode(json!({"user_id": "u1", "email": "x@y.z"}).to_string());
        assert_eq!(decode_identity(""), None);
        assert_eq!(decode_identity("validtoken"), None);
        assert_eq!(decode_identity(&format!("header.{}", payload)), None);
        assert_eq!(decode_identity(&format!("a.{}.c.d", payload)), None);
    }

    #[test]
    fn test_bad_payloads() {
        assert_eq!(decode_identity("a.%%%.c"), None);

        let not_json = URL_SAFE_NO_PAD.encode("hello");
        assert_eq!(decode_identity(&format!("a.{}.c", not_json)), None);

        let array = URL_SAFE_NO_PAD.encode("[1,2,3]");
        assert_eq!(decode_identity(&format!("a.{}.c", array)), None);

        let missing_email = token_with(json!({"user_id": "u1"}));
        assert_eq!(decode_identity(&missing_email), None);

        let wrong_type = token_with(json!({"user_id": 7, "email": "x@y.z"}));
        assert_eq!(decode_identity(&wrong_type), None);
    }

    #[test]
    fn test_accepts_padded_standard_alphabet() {
        let body = base64::engine::general_purpose::STANDARD
            .encode(json!({"user_id": "u1", "email": "pad@example.com"}).to_string());
        let identity = decode_identity(&format!("h.{}.s", body)).unwrap();
        assert_eq!(identity.name, "pad");
        assert_eq!(identity.role, "");
    }

    #[test]
    fn test_ignores_signature_and_expiry() {
        let claims = json!({
            "user_id": "u1",
            "email": "old@example.com",
            "role": "member",
            "exp": 1,
        });
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"someone-elses-secret"),
        )
        .unwrap();

        let identity = decode_identity(&token).unwrap();
        assert_eq!(identity.email, "old@example.com");
    }
}
