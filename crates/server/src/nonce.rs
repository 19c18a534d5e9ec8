use domain::{CommentId, UserId};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 20;
pub const GENERAL_ACTION: &str = "general";

pub fn edit_action(comment_id: CommentId) -> String {
    format!("edit-comment{}", comment_id)
}

/// Stateless anti-forgery nonces. A nonce is an HMAC over the action, the
/// visitor's user id and a time tick of half the lifetime; it verifies during
/// the current and the previous tick.
#[derive(Clone)]
pub struct NonceGuard {
    secret: Arc<Vec<u8>>,
    lifetime_secs: i64,
}

impl NonceGuard {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            secret: Arc::new(secret.as_bytes().to_vec()),
            lifetime_secs: lifetime_secs.max(2),
        }
    }

    pub fn create(&self, action: &str, user: UserId, now_ts: i64) -> String {
        self.compute(self.tick(now_ts), action, user)
    }

    pub fn verify(&self, nonce: &str, action: &str, user: UserId, now_ts: i64) -> bool {
        if nonce.len() != NONCE_LEN {
            return false;
        }
        let tick = self.tick(now_ts);
        [tick, tick - 1]
            .iter()
            .any(|t| constant_time_eq(&self.compute(*t, action, user), nonce))
    }

    fn tick(&self, now_ts: i64) -> i64 {
        now_ts.div_euclid(self.lifetime_secs / 2)
    }

    fn compute(&self, tick: i64, action: &str, user: UserId) -> String {
        // new_from_slice 对任意长度的 key 都成功
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(m) => m,
            Err(_) => return String::new(),
        };
        mac.update(format!("{}|{}|{}", tick, action, user).as_bytes());
        let mut hex = hex::encode(mac.finalize().into_bytes());
        hex.truncate(NONCE_LEN);
        hex
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
