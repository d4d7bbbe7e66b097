use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::domain::user::{Identity, Role};
use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Identity is asserted by an upstream gateway through request headers.
/// A missing role header means `buyer`.
impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_from(req))
    }
}

fn identity_from(req: &HttpRequest) -> Result<Identity, AppError> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or_else(|| {
            log::warn!("rejected request to {}: missing or invalid {USER_ID_HEADER}", req.path());
            AppError::Unauthorized(format!("missing or invalid {USER_ID_HEADER} header"))
        })?;

    let role = match req.headers().get(USER_ROLE_HEADER) {
        None => Role::default(),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<Role>().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(format!("invalid {USER_ROLE_HEADER} header"))
            })?,
    };

    Ok(Identity::new(user_id, role))
}
