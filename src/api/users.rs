//! Login and profile endpoints

use crate::api::users::schemas::{LoginResponse, UpdateUser};
use crate::api::{ApiError, ExtractUser};
use crate::core::traits::UserService;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;
use std::collections::HashMap;

pub fn router() -> Router {
    Router::new()
        .route("/auth/telegram", get(telegram_login))
        .route("/me", get(current_user).patch(update_current_user))
}

/// Signed login widget callback; every query parameter takes part in the signature.
async fn telegram_login(
    Inject(user_service): Inject<dyn UserService>,
    Query(fields): Query<HashMap<String, String>>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let (user, token) = user_service.authenticate(fields).await?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            user: user.into(),
            token,
        }),
    ))
}

async fn current_user(
    Inject(user_service): Inject<dyn UserService>,
    ExtractUser(current_user): ExtractUser,
) -> Result<(StatusCode, Json<schemas::User>), ApiError> {
    let user = user_service.get_user(current_user).await?;
    Ok((StatusCode::OK, Json(user.into())))
}

async fn update_current_user(
    Inject(user_service): Inject<dyn UserService>,
    ExtractUser(current_user): ExtractUser,
    Json(update): Json<UpdateUser>,
) -> Result<(StatusCode, Json<schemas::User>), ApiError> {
    let name = update.name.trim().to_owned();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    let phone = update.phone.filter(|phone| !phone.trim().is_empty());

    let user = user_service
        .update_user(current_user, name, phone)
        .await?;
    Ok((StatusCode::OK, Json(user.into())))
}

pub mod schemas {
    use crate::core::domain;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Serialize, Debug)]
    pub struct User {
        pub id: Uuid,
        pub name: String,
        pub telegram_id: i64,
        pub phone: Option<String>,
    }

    impl From<domain::User> for User {
        fn from(user: domain::User) -> Self {
            User {
                id: user.id,
                name: user.name,
                telegram_id: user.telegram_id,
                phone: user.phone,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct LoginResponse {
        pub user: User,
        pub token: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct UpdateUser {
        pub name: String,
        #[serde(default)]
        pub phone: Option<String>,
    }
}
