use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::page_bounds;
use crate::application::product_service::ProductService;
use crate::domain::money::format_money;
use crate::domain::product::{NewProduct, Product, ProductChanges};
use crate::domain::user::Identity;
use crate::errors::AppError;
use crate::handlers::Pagination;
use crate::infrastructure::Store;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub stock: i32,
    /// Defaults to true
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            seller_id: product.seller_id,
            price: format_money(&product.price),
            name: product.name,
            description: product.description,
            stock: product.stock,
            is_active: product.is_active,
            created_at: product.created_at.to_rfc3339(),
            updated_at: product.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListProductsResponse {
    pub items: Vec<ProductResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

fn parse_price(raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid price '{}': {}", raw, e)))
}

/// POST /products
#[utoipa::path(
    post,
    path = "/products",
    params(
        ("X-User-Id" = Uuid, Header, description = "Caller's user id"),
        ("X-User-Role" = String, Header, description = "seller or admin"),
    ),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product listed", body = ProductResponse),
        (status = 400, description = "Invalid product fields"),
        (status = 403, description = "Caller cannot sell"),
    ),
    tag = "products"
)]
pub async fn create_product(
    service: web::Data<ProductService<Store>>,
    identity: Identity,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let product = NewProduct {
        seller_id: identity.user_id,
        price: parse_price(&body.price)?,
        name: body.name,
        description: body.description,
        stock: body.stock,
        is_active: body.is_active.unwrap_or(true),
    };

    let created = web::block(move || service.create(&identity, product))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ProductResponse::from(created)))
}

/// GET /products
///
/// Active products, newest first.
#[utoipa::path(
    get,
    path = "/products",
    params(
        Pagination,
    ),
    responses(
        (status = 200, description = "Paginated list of products", body = ListProductsResponse),
    ),
    tag = "products"
)]
pub async fn list_products(
    service: web::Data<ProductService<Store>>,
    query: web::Query<Pagination>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let (page, limit) = page_bounds(params.page, params.limit);

    let (items, total) = web::block(move || service.list(page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListProductsResponse {
        items: items.into_iter().map(Into::into).collect(),
        total,
        page,
        limit,
    }))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    service: web::Data<ProductService<Store>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();

    let product = web::block(move || service.get(product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// PATCH /products/{id}
///
/// Partial update by the seller or an admin.
#[utoipa::path(
    patch,
    path = "/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
        ("X-User-Id" = Uuid, Header, description = "Caller's user id"),
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid product fields"),
        (status = 403, description = "Caller does not own the product"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn update_product(
    service: web::Data<ProductService<Store>>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let body = body.into_inner();
    let changes = ProductChanges {
        price: body.price.as_deref().map(parse_price).transpose()?,
        name: body.name,
        description: body.description,
        stock: body.stock,
        is_active: body.is_active,
    };

    let product = web::block(move || service.update(&identity, product_id, changes))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
