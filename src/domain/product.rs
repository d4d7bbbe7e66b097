use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::{exceeds_max, format_money, is_positive, max_amount, to_cents};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub stock: i32,
    pub is_active: bool,
}

impl NewProduct {
    /// Checks field constraints and normalizes the price to cents.
    pub fn validated(mut self) -> Result<Self, DomainError> {
        validate_name(&self.name)?;
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        self.price = validate_price(&self.price)?;
        validate_stock(self.stock)?;
        Ok(self)
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

impl ProductChanges {
    pub fn validated(mut self) -> Result<Self, DomainError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        self.price = self.price.as_ref().map(validate_price).transpose()?;
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.is_active.is_none()
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::InvalidInput(format!(
            "product name must be 1 to {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), DomainError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DomainError::InvalidInput(format!(
            "product description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

/// Returns the price rounded to cents; the rounded value is what gets checked.
fn validate_price(price: &BigDecimal) -> Result<BigDecimal, DomainError> {
    let cents = to_cents(price);
    if !is_positive(&cents) {
        return Err(DomainError::InvalidInput(
            "price must be at least 0.01".to_string(),
        ));
    }
    if exceeds_max(&cents) {
        return Err(DomainError::InvalidInput(format!(
            "price must be at most {}",
            format_money(&max_amount())
        )));
    }
    Ok(cents)
}

fn validate_stock(stock: i32) -> Result<(), DomainError> {
    if stock < 0 {
        return Err(DomainError::InvalidInput(
            "stock must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn new_product(price: &str, stock: i32) -> NewProduct {
        NewProduct {
            seller_id: Uuid::new_v4(),
            name: "Kettle".to_string(),
            description: None,
            price: BigDecimal::from_str(price).expect("valid decimal"),
            stock,
            is_active: true,
        }
    }

    #[test]
    fn accepts_valid_product_and_normalizes_price() {
        let product = new_product("9.9", 3).validated().expect("valid");
        assert_eq!(product.price.to_string(), "9.90");
    }

    #[test]
    fn rejects_zero_price() {
        assert!(matches!(
            new_product("0", 3).validated(),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_price_that_rounds_to_zero() {
        assert!(matches!(
            new_product("0.004", 5).validated(),
            Err(DomainError::InvalidInput(_))
        ));
        let product = new_product("0.005", 5).validated().expect("rounds up to a cent");
        assert_eq!(product.price.to_string(), "0.01");
    }

    #[test]
    fn rejects_price_above_column_limit() {
        let product = new_product("99999999.99", 1).validated().expect("at the limit");
        assert_eq!(product.price.to_string(), "99999999.99");
        assert!(new_product("1000000000", 1).validated().is_err());
        // 99999999.995 rounds up past the limit
        assert!(new_product("99999999.995", 1).validated().is_err());

        let changes = ProductChanges {
            price: Some(BigDecimal::from_str("0.001").expect("valid decimal")),
            ..Default::default()
        };
        assert!(changes.validated().is_err());
    }

    #[test]
    fn rejects_negative_stock() {
        assert!(new_product("1.00", -1).validated().is_err());
    }

    #[test]
    fn rejects_blank_name() {
        let mut product = new_product("1.00", 1);
        product.name = "   ".to_string();
        assert!(product.validated().is_err());
    }

    #[test]
    fn changes_validate_only_present_fields() {
        let changes = ProductChanges {
            stock: Some(0),
            ..Default::default()
        };
        assert!(changes.validated().is_ok());

        let changes = ProductChanges {
            price: Some(BigDecimal::from(-5)),
            ..Default::default()
        };
        assert!(changes.validated().is_err());
        assert!(ProductChanges::default().is_empty());
    }
}
