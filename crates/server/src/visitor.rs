use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use domain::{truncate_user_agent, UserId};
use std::{convert::Infallible, net::SocketAddr};

use crate::cookies::CookieJar;
use crate::session::SESSION_COOKIE;
use crate::state::AppState;

/// Who is asking: network identity, account (0 when anonymous) and cookies.
#[derive(Debug, Clone)]
pub struct Visitor {
    pub ip: String,
    pub user_agent: String,
    pub user: UserId,
    pub cookies: CookieJar,
}

impl Visitor {
    pub fn is_signed_in(&self) -> bool {
        !self.user.is_anonymous()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Visitor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = CookieJar::from_headers(&parts.headers);
        let user = cookies
            .get(SESSION_COOKIE)
            .and_then(|c| state.sessions.verify(c.value()))
            .unwrap_or(UserId::ANONYMOUS);

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        let ip = client_ip(&parts.headers, peer, state.policy.trust_proxy);

        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(truncate_user_agent)
            .unwrap_or_default();

        Ok(Visitor {
            ip,
            user_agent,
            user,
            cookies,
        })
    }
}

fn client_ip(headers: &HeaderMap, peer: Option<String>, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(ip) = forwarded {
            return ip;
        }
    }
    peer.unwrap_or_default()
}
