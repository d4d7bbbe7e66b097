use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::money::line_total;
use super::product::Product;

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CartItemView {
    pub line: CartLine,
    pub product: Product,
}

/// A user's cart priced at the products' current prices.
#[derive(Debug, Clone)]
pub struct CartView {
    pub user_id: Uuid,
    pub items: Vec<CartItemView>,
    pub total_quantity: i64,
    pub total_price: BigDecimal,
}

impl CartView {
    pub fn new(user_id: Uuid, items: Vec<CartItemView>) -> Self {
        let total_quantity = items.iter().map(|i| i64::from(i.line.quantity)).sum();
        let total_price = items.iter().fold(BigDecimal::zero(), |acc, i| {
            acc + line_total(&i.product.price, i.line.quantity)
        });
        Self {
            user_id,
            items,
            total_quantity,
            total_price,
        }
    }
}
