use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::user_service::UserService;
use crate::domain::user::{Identity, NewUser, Role, User};
use crate::errors::AppError;
use crate::infrastructure::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    /// Defaults to buyer
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// POST /users
///
/// Registration needs no identity headers.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Invalid email"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "users"
)]
pub async fn register(
    service: web::Data<UserService<Store>>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let new_user = NewUser {
        email: body.email,
        role: body.role.unwrap_or_default(),
    };

    let user = web::block(move || service.register(new_user))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// GET /users/{id}
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User UUID"),
        ("X-User-Id" = Uuid, Header, description = "Caller's user id"),
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn get_user(
    service: web::Data<UserService<Store>>,
    _identity: Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();

    let user = web::block(move || service.get(user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// DELETE /users/{id}
///
/// Removes the account with its cart and orders. Self or admin only.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User UUID"),
        ("X-User-Id" = Uuid, Header, description = "Caller's user id"),
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Not allowed to delete this user"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still sells products"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    service: web::Data<UserService<Store>>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();

    web::block(move || service.delete(&identity, user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
