use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        let message = e.to_string();
        match e {
            DomainError::EmptyCart
            | DomainError::ProductUnavailable { .. }
            | DomainError::InsufficientStock { .. }
            | DomainError::InvalidInput(_) => AppError::BadRequest(message),
            DomainError::OrderNotFound(_)
            | DomainError::ProductNotFound(_)
            | DomainError::CartItemNotFound(_)
            | DomainError::UserNotFound(_) => AppError::NotFound(message),
            DomainError::Forbidden(_) => AppError::Forbidden(message),
            DomainError::Conflict(_) | DomainError::TransactionConflict => {
                AppError::Conflict(message)
            }
            DomainError::Internal(detail) => AppError::Internal(detail),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(detail) => {
                log::error!("request failed: {detail}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;
    use uuid::Uuid;

    fn status_of(err: DomainError) -> StatusCode {
        AppError::from(err).error_response().status()
    }

    #[test]
    fn checkout_failures_are_bad_requests() {
        assert_eq!(status_of(DomainError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(DomainError::ProductUnavailable {
                product_id: Uuid::new_v4()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::InsufficientStock {
                product_id: Uuid::new_v4(),
                available: 1,
                requested: 2
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::InvalidInput("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn missing_resources_are_not_found() {
        for err in [
            DomainError::OrderNotFound(Uuid::new_v4()),
            DomainError::ProductNotFound(Uuid::new_v4()),
            DomainError::CartItemNotFound(Uuid::new_v4()),
            DomainError::UserNotFound(Uuid::new_v4()),
        ] {
            assert_eq!(status_of(err), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn access_and_conflicts() {
        assert_eq!(
            status_of(DomainError::Forbidden("no".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(DomainError::Conflict("taken".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(DomainError::TransactionConflict), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Unauthorized("who?".to_string())
                .error_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn insufficient_stock_body_names_the_product() {
        let product_id = Uuid::new_v4();
        let resp = AppError::from(DomainError::InsufficientStock {
            product_id,
            available: 0,
            requested: 3,
        })
        .error_response();

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let message = json["error"].as_str().unwrap();
        assert!(message.contains(&product_id.to_string()));
        assert!(message.contains("available 0"));
    }

    #[actix_web::test]
    async fn internal_error_hides_details() {
        let resp = AppError::from(DomainError::Internal("connection refused".to_string()))
            .error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[test]
    fn internal_error_display() {
        assert_eq!(
            AppError::Internal("msg".to_string()).to_string(),
            "Internal error: msg"
        );
    }
}
