use chrono::{DateTime, Utc};
use parking_lot::Mutex;

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Single cached credential shared across requests.
///
/// A read returns the token only while `now < expires_at`; an expired
/// token is cleared by the read that discovers it.
#[derive(Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: impl Into<String>, expires_at: DateTime<Utc>) {
        *self.slot.lock() = Some(CachedToken {
            value: token.into(),
            expires_at,
        });
    }

    pub fn get_valid_token(&self) -> Option<String> {
        self.get_valid_token_at(Utc::now())
    }

    pub fn get_valid_token_at(&self, now: DateTime<Utc>) -> Option<String> {
        let mut slot = self.slot.lock();
        match slot.as_ref() {
            Some(token) if now < token.expires_at => Some(token.value.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let expires_at = self.slot.lock().as_ref().map(|t| t.expires_at);
        f.debug_struct("TokenCache")
            .field("token", &expires_at.map(|_| "<redacted>"))
            .field("expires_at", &expires_at)
            .finish()
    }
}
