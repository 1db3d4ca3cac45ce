use crate::core::error::{AuthError, ReservationError};
use crate::core::traits::TokenService;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json, Router};
use di::{Ref, ServiceProvider};
use di_axum::RouterServiceProviderExtensions;
use log::debug;
use serde::Serialize;
use uuid::Uuid;

pub mod reservations;
pub mod users;

const BEARER: &str = "Bearer ";

/// All versioned routes, to be nested under `/api/v1`.
pub fn router() -> Router {
    Router::new()
        .merge(users::router())
        .merge(reservations::router())
}

/// Versioned routes under `/api/v1`, served by the given provider.
///
/// The [`TokenService`] is resolved once and placed in request extensions for
/// [`ExtractUser`].
pub fn app(provider: ServiceProvider) -> Router {
    let tokens = provider.get_required::<dyn TokenService>();

    Router::new()
        .nest("/api/v1", router())
        .layer(Extension(tokens))
        .with_provider(provider)
}

/// Id of the user a valid bearer token was issued for.
///
/// Expects the [`TokenService`] in the request extensions.
#[derive(Debug)]
pub struct ExtractUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, (StatusCode, &'static str)> {
        let tokens = parts
            .extensions
            .get::<Ref<dyn TokenService>>()
            .cloned()
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "token service is not configured",
            ))?;

        if let Some(header) = parts.headers.get(AUTHORIZATION) {
            let header = header
                .to_str()
                .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid authorization header"))?;
            let token = header
                .strip_prefix(BEARER)
                .ok_or((StatusCode::UNAUTHORIZED, "invalid authorization scheme"))?;
            let user_id = tokens.validate_token(token).map_err(|e| {
                debug!("bearer token rejected: {e}");
                (StatusCode::UNAUTHORIZED, "invalid or expired token")
            })?;
            Ok(ExtractUser(user_id))
        } else {
            Err((StatusCode::UNAUTHORIZED, "`Authorization` header is missing"))
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// Error response with a JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error".to_owned(),
        }
    }
}

impl From<ReservationError> for ApiError {
    fn from(error: ReservationError) -> Self {
        let status = match &error {
            ReservationError::Validation(_) => StatusCode::BAD_REQUEST,
            ReservationError::NotFound(_) => StatusCode::NOT_FOUND,
            ReservationError::CapacityExceeded { .. } => StatusCode::CONFLICT,
            ReservationError::TableUnavailable(_) => StatusCode::CONFLICT,
            ReservationError::Forbidden => StatusCode::FORBIDDEN,
            ReservationError::Store(_) => return ApiError::internal(),
        };
        ApiError {
            status,
            message: error.to_string(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        let status = match &error {
            AuthError::MissingField(_) | AuthError::InvalidField(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidAuthDate(_) => StatusCode::BAD_REQUEST,
            AuthError::Stale | AuthError::InvalidSignature | AuthError::Token(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Store(_) => return ApiError::internal(),
        };
        ApiError {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
