use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderDraft, OrderLineInput, OrderView};
use crate::domain::ports::Repositories;

/// Turns the user's cart into a pending order.
///
/// Must run inside a single transaction: every step below either commits
/// together with the others or not at all. Product rows are locked in
/// ascending id order so overlapping checkouts always acquire them in the
/// same sequence.
pub fn place_order(repos: &mut dyn Repositories, user_id: Uuid) -> Result<OrderView, DomainError> {
    // 1. Snapshot the cart; its rows stay locked until commit.
    let mut lines = repos.lock_lines(user_id)?;
    if lines.is_empty() {
        return Err(DomainError::EmptyCart);
    }
    lines.sort_by_key(|line| line.product_id);

    // 2. Validate every line before touching anything.
    let mut priced = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = repos
            .lock(line.product_id)?
            .filter(|product| product.is_active)
            .ok_or(DomainError::ProductUnavailable {
                product_id: line.product_id,
            })?;

        if product.stock < line.quantity {
            return Err(DomainError::InsufficientStock {
                product_id: product.id,
                available: product.stock,
                requested: line.quantity,
            });
        }

        priced.push(OrderLineInput {
            product_id: product.id,
            quantity: line.quantity,
            unit_price: product.price,
        });
    }

    // 3. Price the order.
    let draft = OrderDraft::new(user_id, priced)?;

    // 4. Debit stock.
    for line in draft.lines() {
        repos.debit_stock(line.product_id, line.quantity)?;
    }

    // 5. Persist header and lines.
    let order = repos.insert_order(&draft)?;

    // 6. Drop exactly the lines that were ordered.
    let ordered: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
    repos.remove_lines(user_id, &ordered)?;

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::{dec, Fixture};
    use crate::domain::ports::UnitOfWork;

    #[test]
    fn scenario_two_products_totals_and_debits() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let a = fx.product("10.00", 5);
        let b = fx.product("5.00", 5);
        fx.add_to_cart(buyer, a, 2);
        fx.add_to_cart(buyer, b, 1);

        let order = fx
            .store
            .transaction(|repos| place_order(repos, buyer))
            .expect("checkout succeeds");

        assert_eq!(order.total_amount, dec("25.00"));
        assert_eq!(order.lines.len(), 2);
        let state = fx.store.snapshot();
        assert_eq!(state.product(a).unwrap().stock, 3);
        assert_eq!(state.product(b).unwrap().stock, 4);
        assert_eq!(state.cart_len(buyer), 0);
    }

    #[test]
    fn lines_are_sorted_by_product_id() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let mut products: Vec<Uuid> = (0..4).map(|_| fx.product("1.00", 10)).collect();
        for p in products.iter().rev() {
            fx.add_to_cart(buyer, *p, 1);
        }

        let order = fx
            .store
            .transaction(|repos| place_order(repos, buyer))
            .expect("checkout succeeds");

        products.sort();
        let ordered: Vec<Uuid> = order.lines.iter().map(|l| l.product_id).collect();
        assert_eq!(ordered, products);
    }

    #[test]
    fn empty_cart_is_rejected() {
        let fx = Fixture::new();
        let buyer = fx.buyer();

        let err = fx
            .store
            .transaction(|repos| place_order(repos, buyer))
            .unwrap_err();

        assert!(matches!(err, DomainError::EmptyCart));
        assert_eq!(fx.store.snapshot().order_count(), 0);
    }

    #[test]
    fn one_short_line_fails_the_whole_checkout() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let plenty = fx.product("2.00", 50);
        let scarce = fx.product("3.00", 3);
        fx.add_to_cart(buyer, plenty, 5);
        fx.add_to_cart(buyer, scarce, 2);
        fx.set_stock(scarce, 1);

        let err = fx
            .store
            .transaction(|repos| place_order(repos, buyer))
            .unwrap_err();

        match err {
            DomainError::InsufficientStock {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, scarce);
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let state = fx.store.snapshot();
        assert_eq!(state.product(plenty).unwrap().stock, 50);
        assert_eq!(state.product(scarce).unwrap().stock, 1);
        assert_eq!(state.cart_len(buyer), 2);
        assert_eq!(state.order_count(), 0);
    }

    #[test]
    fn inactive_product_is_unavailable() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let product = fx.product("2.00", 5);
        fx.add_to_cart(buyer, product, 1);
        fx.deactivate(product);

        let err = fx
            .store
            .transaction(|repos| place_order(repos, buyer))
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::ProductUnavailable { product_id } if product_id == product
        ));
        assert_eq!(fx.store.snapshot().product(product).unwrap().stock, 5);
    }

    #[test]
    fn oversized_total_is_rejected_before_debiting() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let product = fx.product("60000000.00", 5);
        fx.add_to_cart(buyer, product, 2);

        let err = fx
            .store
            .transaction(|repos| place_order(repos, buyer))
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidInput(_)));
        let state = fx.store.snapshot();
        assert_eq!(state.product(product).unwrap().stock, 5);
        assert_eq!(state.cart_len(buyer), 1);
        assert_eq!(state.order_count(), 0);
    }

    #[test]
    fn failed_commit_leaves_no_trace() {
        let fx = Fixture::new();
        let buyer = fx.buyer();
        let product = fx.product("4.00", 5);
        fx.add_to_cart(buyer, product, 2);

        fx.store.fail_next_commit();
        let err = fx
            .store
            .transaction(|repos| place_order(repos, buyer))
            .unwrap_err();

        assert!(matches!(err, DomainError::TransactionConflict));
        let state = fx.store.snapshot();
        assert_eq!(state.product(product).unwrap().stock, 5);
        assert_eq!(state.cart_len(buyer), 1);
        assert_eq!(state.order_count(), 0);
    }
}
