use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use domain::{protocol::EditResponse, render::escape_html, EditError};

/// Everything a handler can fail with. Edit failures are part of the normal
/// protocol and go out as 200 with the error payload.
#[derive(Debug)]
pub enum ApiError {
    Edit(EditError),
    /// Edit failure that also expires the edit cookie.
    EditRevoked(EditError, Cookie<'static>),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl From<EditError> for ApiError {
    fn from(err: EditError) -> Self {
        ApiError::Edit(err)
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::BadRequest(escape_html(&rejection.body_text()))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Edit(err) => Json(EditResponse::from(&err)).into_response(),
            ApiError::EditRevoked(err, cookie) => {
                (CookieJar::new().add(cookie), Json(EditResponse::from(&err))).into_response()
            }
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(EditResponse {
                    errors: true,
                    error: msg,
                    ..EditResponse::default()
                }),
            )
                .into_response(),
            ApiError::Internal(e) => {
                tracing::error!("Request failed: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(EditResponse {
                        errors: true,
                        error: "Internal error".into(),
                        ..EditResponse::default()
                    }),
                )
                    .into_response()
            }
        }
    }
}
