#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use good_todo_client::{ApiClient, AuthSession, Navigator, Settings, TokenStore};
use serde::Serialize;

pub const TEST_SECRET: &[u8] = b"test_secret";

#[derive(Debug, Serialize)]
struct Claims<'a> {
    user_id: &'a str,
    tenant_id: &'a str,
    email: &'a str,
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    token_type: &'a str,
    exp: i64,
    iat: i64,
}

/// A signed access token shaped like the ones the backend issues.
pub fn access_token(user_id: &str, email: &str, name: Option<&str>) -> String {
    let now = Utc::now();
    let claims = Claims {
        user_id,
        tenant_id: "tenant-1",
        email,
        role: "member",
        name,
        token_type: "access",
        exp: (now + Duration::minutes(15)).timestamp(),
        iat: now.timestamp(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("Failed to sign test token")
}

/// Records every redirect instead of navigating.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, location: &str) {
        self.redirects.lock().unwrap().push(location.to_string());
    }
}

pub struct Harness {
    pub tokens: TokenStore,
    pub navigator: Arc<RecordingNavigator>,
    pub client: ApiClient,
    pub session: AuthSession,
}

pub fn harness(base_url: &str) -> Harness {
    let settings = Settings::for_base_url(base_url).expect("Failed to load test config");
    let tokens = TokenStore::in_memory();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = ApiClient::new(&settings.api, tokens.clone(), navigator.clone())
        .expect("Failed to build client");
    let session =
        AuthSession::restore(tokens.clone(), navigator.clone()).expect("Failed to restore session");

    Harness {
        tokens,
        navigator,
        client,
        session,
    }
}
