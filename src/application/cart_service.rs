use uuid::Uuid;

use crate::domain::cart::{CartItemView, CartLine, CartView};
use crate::domain::errors::DomainError;
use crate::domain::ports::UnitOfWork;
use crate::domain::product::Product;

pub struct CartService<S> {
    store: S,
}

impl<S: UnitOfWork> CartService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The cart priced at current product prices.
    pub fn get_cart(&self, user_id: Uuid) -> Result<CartView, DomainError> {
        self.store.transaction(|repos| {
            let lines = repos.get_lines(user_id)?;
            let mut items = Vec::with_capacity(lines.len());
            for line in lines {
                if let Some(product) = repos.get(line.product_id)? {
                    items.push(CartItemView { line, product });
                }
            }
            Ok(CartView::new(user_id, items))
        })
    }

    /// Adds `quantity` units, merging with an existing line for the product.
    ///
    /// Stock is checked against the merged quantity but not reserved.
    pub fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        ensure_positive(quantity)?;
        self.store.transaction(|repos| {
            let product = active_product(repos.get(product_id)?, product_id)?;
            let existing = repos
                .find_line(user_id, product_id)?
                .map_or(0, |line| line.quantity);
            let wanted = existing.checked_add(quantity).ok_or_else(|| {
                DomainError::InvalidInput("quantity is too large".to_string())
            })?;
            ensure_in_stock(&product, wanted)?;
            repos.add_quantity(user_id, product_id, quantity)
        })
    }

    pub fn update_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        ensure_positive(quantity)?;
        self.store.transaction(|repos| {
            if repos.find_line(user_id, product_id)?.is_none() {
                return Err(DomainError::CartItemNotFound(product_id));
            }
            let product = active_product(repos.get(product_id)?, product_id)?;
            ensure_in_stock(&product, quantity)?;
            repos
                .set_quantity(user_id, product_id, quantity)?
                .ok_or(DomainError::CartItemNotFound(product_id))
        })
    }

    pub fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<(), DomainError> {
        let removed = self
            .store
            .transaction(|repos| repos.remove_line(user_id, product_id))?;
        if !removed {
            return Err(DomainError::CartItemNotFound(product_id));
        }
        Ok(())
    }

    /// Empties the cart. Clearing an empty cart succeeds.
    pub fn clear_cart(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let removed = self.store.transaction(|repos| repos.clear(user_id))?;
        log::debug!("cleared {removed} cart lines for {user_id}");
        Ok(removed)
    }
}

fn ensure_positive(quantity: i32) -> Result<(), DomainError> {
    if quantity < 1 {
        return Err(DomainError::InvalidInput(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn active_product(product: Option<Product>, product_id: Uuid) -> Result<Product, DomainError> {
    product
        .filter(|p| p.is_active)
        .ok_or(DomainError::ProductNotFound(product_id))
}

fn ensure_in_stock(product: &Product, wanted: i32) -> Result<(), DomainError> {
    if wanted > product.stock {
        return Err(DomainError::InsufficientStock {
            product_id: product.id,
            available: product.stock,
            requested: wanted,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::{dec, Fixture};
    use crate::infrastructure::memory::InMemoryStore;

    fn service(fx: &Fixture) -> CartService<InMemoryStore> {
        CartService::new(fx.store.clone())
    }

    #[test]
    fn add_merges_existing_line() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let product = fx.product("3.00", 10);
        let svc = service(&fx);

        svc.add_item(buyer, product, 2).unwrap();
        let line = svc.add_item(buyer, product, 3).unwrap();

        assert_eq!(line.quantity, 5);
        assert_eq!(fx.store.snapshot().cart_len(buyer), 1);
    }

    #[test]
    fn add_checks_merged_quantity_against_stock() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let product = fx.product("3.00", 4);
        let svc = service(&fx);
        svc.add_item(buyer, product, 3).unwrap();

        let err = svc.add_item(buyer, product, 2).unwrap_err();

        assert!(matches!(
            err,
            DomainError::InsufficientStock { available: 4, requested: 5, .. }
        ));
    }

    #[test]
    fn add_rejects_bad_quantity_and_unknown_product() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let svc = service(&fx);
        let product = fx.product("3.00", 4);

        assert!(matches!(
            svc.add_item(buyer, product, 0),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.add_item(buyer, Uuid::new_v4(), 1),
            Err(DomainError::ProductNotFound(_))
        ));

        fx.deactivate(product);
        assert!(matches!(
            svc.add_item(buyer, product, 1),
            Err(DomainError::ProductNotFound(_))
        ));
    }

    #[test]
    fn update_replaces_quantity() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let product = fx.product("3.00", 10);
        let svc = service(&fx);
        svc.add_item(buyer, product, 2).unwrap();

        let line = svc.update_quantity(buyer, product, 7).unwrap();
        assert_eq!(line.quantity, 7);

        assert!(matches!(
            svc.update_quantity(buyer, product, 11),
            Err(DomainError::InsufficientStock { .. })
        ));
        assert!(matches!(
            svc.update_quantity(buyer, fx.product("1.00", 1), 1),
            Err(DomainError::CartItemNotFound(_))
        ));
    }

    #[test]
    fn remove_and_clear() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let a = fx.product("3.00", 10);
        let b = fx.product("4.00", 10);
        let svc = service(&fx);
        svc.add_item(buyer, a, 1).unwrap();
        svc.add_item(buyer, b, 1).unwrap();

        svc.remove_item(buyer, a).unwrap();
        assert!(matches!(
            svc.remove_item(buyer, a),
            Err(DomainError::CartItemNotFound(_))
        ));

        assert_eq!(svc.clear_cart(buyer).unwrap(), 1);
        assert_eq!(svc.clear_cart(buyer).unwrap(), 0);
    }

    #[test]
    fn cart_view_uses_current_prices() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let a = fx.product("3.00", 10);
        let b = fx.product("0.50", 10);
        let svc = service(&fx);
        svc.add_item(buyer, a, 2).unwrap();
        svc.add_item(buyer, b, 3).unwrap();
        fx.set_price(a, "4.00");

        let cart = svc.get_cart(buyer).unwrap();

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.total_quantity, 5);
        assert_eq!(cart.total_price, dec("9.50"));
    }
}
