pub mod cart;
pub mod identity;
pub mod orders;
pub mod products;
pub mod users;

use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};

use crate::domain::order::OrderStatus;
use crate::domain::user::Role;

/// `?page=&limit=`; both optional, clamped by the services.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Page number (1-based, default 1)
    pub page: Option<i64>,
    /// Items per page (default 20, max 100)
    pub limit: Option<i64>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        orders::update_status,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        products::create_product,
        products::list_products,
        products::get_product,
        products::update_product,
        users::register,
        users::get_user,
        users::delete_user,
    ),
    components(schemas(
        OrderStatus,
        Role,
        orders::OrderResponse,
        orders::OrderLineResponse,
        orders::ListOrdersResponse,
        orders::UpdateStatusRequest,
        cart::AddToCartRequest,
        cart::UpdateCartItemRequest,
        cart::CartLineResponse,
        cart::CartItemResponse,
        cart::CartResponse,
        products::CreateProductRequest,
        products::UpdateProductRequest,
        products::ProductResponse,
        products::ListProductsResponse,
        users::CreateUserRequest,
        users::UserResponse,
    )),
    tags(
        (name = "orders", description = "Checkout and order history"),
        (name = "cart", description = "The caller's shopping cart"),
        (name = "products", description = "Catalog"),
        (name = "users", description = "Accounts"),
    )
)]
pub struct ApiDoc;
