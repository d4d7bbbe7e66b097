use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::cart_service::CartService;
use crate::domain::cart::{CartItemView, CartLine, CartView};
use crate::domain::money::{format_money, line_total};
use crate::domain::user::Identity;
use crate::errors::AppError;
use crate::infrastructure::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
            created_at: line.created_at.to_rfc3339(),
            updated_at: line.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    /// Current product price, not a snapshot
    pub unit_price: String,
    pub line_total: String,
    pub stock: i32,
    pub is_active: bool,
}

impl From<CartItemView> for CartItemResponse {
    fn from(item: CartItemView) -> Self {
        Self {
            product_id: item.product.id,
            line_total: format_money(&line_total(&item.product.price, item.line.quantity)),
            unit_price: format_money(&item.product.price),
            name: item.product.name,
            quantity: item.line.quantity,
            stock: item.product.stock,
            is_active: item.product.is_active,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub user_id: Uuid,
    pub items: Vec<CartItemResponse>,
    pub total_quantity: i64,
    pub total_price: String,
}

impl From<CartView> for CartResponse {
    fn from(cart: CartView) -> Self {
        Self {
            user_id: cart.user_id,
            total_quantity: cart.total_quantity,
            total_price: format_money(&cart.total_price),
            items: cart.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// GET /cart
#[utoipa::path(
    get,
    path = "/cart",
    params(("X-User-Id" = Uuid, Header, description = "Caller's user id")),
    responses(
        (status = 200, description = "The caller's cart", body = CartResponse),
        (status = 401, description = "Missing identity"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    service: web::Data<CartService<Store>>,
    identity: Identity,
) -> Result<HttpResponse, AppError> {
    let cart = web::block(move || service.get_cart(identity.user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// POST /cart
///
/// Adds units of a product, merging with an existing line.
#[utoipa::path(
    post,
    path = "/cart",
    params(("X-User-Id" = Uuid, Header, description = "Caller's user id")),
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Line added or merged", body = CartLineResponse),
        (status = 400, description = "Invalid quantity or not enough stock"),
        (status = 404, description = "Product not found"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    service: web::Data<CartService<Store>>,
    identity: Identity,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let line = web::block(move || service.add_item(identity.user_id, body.product_id, body.quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CartLineResponse::from(line)))
}

/// PATCH /cart/{product_id}
#[utoipa::path(
    patch,
    path = "/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product UUID"),
        ("X-User-Id" = Uuid, Header, description = "Caller's user id"),
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity replaced", body = CartLineResponse),
        (status = 400, description = "Invalid quantity or not enough stock"),
        (status = 404, description = "Product not in the cart"),
    ),
    tag = "cart"
)]
pub async fn update_item(
    service: web::Data<CartService<Store>>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let quantity = body.into_inner().quantity;

    let line = web::block(move || service.update_quantity(identity.user_id, product_id, quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartLineResponse::from(line)))
}

/// DELETE /cart/{product_id}
#[utoipa::path(
    delete,
    path = "/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product UUID"),
        ("X-User-Id" = Uuid, Header, description = "Caller's user id"),
    ),
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "Product not in the cart"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    service: web::Data<CartService<Store>>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();

    web::block(move || service.remove_item(identity.user_id, product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /cart
#[utoipa::path(
    delete,
    path = "/cart",
    params(("X-User-Id" = Uuid, Header, description = "Caller's user id")),
    responses((status = 204, description = "Cart emptied")),
    tag = "cart"
)]
pub async fn clear_cart(
    service: web::Data<CartService<Store>>,
    identity: Identity,
) -> Result<HttpResponse, AppError> {
    web::block(move || service.clear_cart(identity.user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
