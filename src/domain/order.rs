use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;
use super::money::{exceeds_max, format_money, line_total, max_amount, to_cents};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidInput(format!("unknown order status '{s}'")))
    }
}

#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct DraftLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
}

/// An order priced and ready to persist.
///
/// Construction is the only place totals are computed; the persisted order
/// copies them verbatim, so `total_amount` always equals the sum of the
/// line totals.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    user_id: Uuid,
    lines: Vec<DraftLine>,
    total_amount: BigDecimal,
}

impl OrderDraft {
    pub fn new(user_id: Uuid, lines: Vec<OrderLineInput>) -> Result<Self, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::InvalidInput(
                "an order needs at least one line".to_string(),
            ));
        }

        let mut total_amount = BigDecimal::zero();
        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity < 1 {
                return Err(DomainError::InvalidInput(format!(
                    "quantity for product {} must be at least 1",
                    line.product_id
                )));
            }
            let unit_price = to_cents(&line.unit_price);
            let total_price = line_total(&unit_price, line.quantity);
            total_amount += &total_price;
            if exceeds_max(&total_amount) {
                return Err(DomainError::InvalidInput(format!(
                    "order total must not exceed {}",
                    format_money(&max_amount())
                )));
            }
            priced.push(DraftLine {
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price,
                total_price,
            });
        }

        Ok(Self {
            user_id,
            lines: priced,
            total_amount,
        })
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    pub fn total_amount(&self) -> &BigDecimal {
        &self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        OrderStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}
