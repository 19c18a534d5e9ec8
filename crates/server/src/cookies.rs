use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use time::OffsetDateTime;

pub use axum_extra::extract::cookie::CookieJar;

/// Edit cookie living until `expires`.
pub fn edit_cookie(
    name: String,
    value: String,
    path: &str,
    expires: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value))
        .path(path.to_string())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds((expires - now).num_seconds().max(0)));
    if let Ok(at) = OffsetDateTime::from_unix_timestamp(expires.timestamp()) {
        builder = builder.expires(at);
    }
    builder.build()
}

/// Already-expired cookie so the browser drops `name`.
pub fn removal_cookie(name: String, path: &str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, ""))
        .path(path.to_string())
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();
    cookie
}
