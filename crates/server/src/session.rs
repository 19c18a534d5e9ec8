use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use domain::UserId;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "revise_session";

/// Signs and checks the account session cookie set by the hosting site.
/// Format: `<user_id>.<base64url(hmac(user_id))>`.
#[derive(Clone)]
pub struct SessionKeys {
    secret: Arc<Vec<u8>>,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: Arc::new(secret.as_bytes().to_vec()),
        }
    }

    pub fn sign(&self, user: UserId) -> String {
        let sig = self
            .mac(user)
            .map(|m| URL_SAFE_NO_PAD.encode(m.finalize().into_bytes()))
            .unwrap_or_default();
        format!("{}.{}", user, sig)
    }

    /// Signed-in user, or `None` for anything malformed, unsigned or user 0.
    pub fn verify(&self, cookie: &str) -> Option<UserId> {
        let (id, sig) = cookie.split_once('.')?;
        let user = UserId(id.parse().ok()?);
        if user.is_anonymous() {
            return None;
        }
        let sig = URL_SAFE_NO_PAD.decode(sig).ok()?;
        self.mac(user)?.verify_slice(&sig).ok()?;
        Some(user)
    }

    fn mac(&self, user: UserId) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(user.to_string().as_bytes());
        Some(mac)
    }
}
