//! One-time notices carried across a redirect in a signed cookie.
//!
//! Cookie format: `base64url(json array of messages) "." hex(hmac_sha256)`.
//! The signature covers the base64 payload. A cookie whose signature does
//! not verify is treated as empty.

use axum::http::{header, HeaderMap, HeaderValue};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Name of the cookie that carries pending notices.
pub const FLASH_COOKIE: &str = "catalog_flash";

const COOKIE_ATTRIBUTES: &str = "Path=/; HttpOnly; SameSite=Lax";

/// Signs and verifies flash cookies with the configured session secret.
#[derive(Clone)]
pub struct FlashSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for FlashSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlashSigner").finish_non_exhaustive()
    }
}

impl FlashSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, payload: &str) -> Hmac<Sha256> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(payload.as_bytes());
        mac
    }

    /// Encodes `messages` into a signed cookie value.
    pub fn encode(&self, messages: &[String]) -> String {
        let json = serde_json::to_vec(messages).unwrap_or_else(|_| b"[]".to_vec());
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json);
        let signature = self.mac(&payload).finalize().into_bytes();
        format!("{}.{}", payload, hex::encode(signature))
    }

    /// Decodes a cookie value, returning `None` if it is malformed or the
    /// signature does not match.
    pub fn decode(&self, value: &str) -> Option<Vec<String>> {
        let (payload, sig_hex) = value.rsplit_once('.')?;
        let signature = hex::decode(sig_hex).ok()?;
        self.mac(payload).verify_slice(&signature).ok()?;

        let json = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload.as_bytes())
            .ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// Takes the pending notices out of the request's cookies.
    pub fn take(&self, headers: &HeaderMap) -> Notices {
        let Some(raw) = find_cookie(headers, FLASH_COOKIE) else {
            return Notices::default();
        };

        let messages = self.decode(raw).unwrap_or_else(|| {
            tracing::debug!("ignoring flash cookie with invalid signature");
            Vec::new()
        });

        Notices {
            messages,
            had_cookie: true,
        }
    }

    /// Builds the `Set-Cookie` value that queues `messages` for the next page.
    pub fn set_cookie(&self, messages: &[String]) -> HeaderValue {
        let cookie = format!(
            "{}={}; {}",
            FLASH_COOKIE,
            self.encode(messages),
            COOKIE_ATTRIBUTES
        );
        // base64url, hex and the fixed attributes are all visible ASCII.
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| clear_cookie())
    }
}

/// Builds the `Set-Cookie` value that removes the flash cookie.
pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("catalog_flash=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Notices to show on the page being rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notices {
    messages: Vec<String>,
    had_cookie: bool,
}

impl Notices {
    /// Adds a notice raised while handling the current request.
    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Converts the notices into the list to carry over a redirect.
    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }

    /// Whether the request carried a flash cookie that must now be cleared.
    pub fn had_cookie(&self) -> bool {
        self.had_cookie
    }
}
