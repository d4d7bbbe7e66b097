//! In-memory unit of work for tests and local experiments.
//!
//! Transactions are serialized by a mutex and run against a copy of the
//! state; the copy replaces the shared state only when the work succeeds.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::cart::CartLine;
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, OrderDraft, OrderLineView, OrderStatus, OrderView};
use crate::domain::ports::{
    CartStore, OrderStore, ProductInventory, Repositories, UnitOfWork, UserStore,
};
use crate::domain::product::{NewProduct, Product, ProductChanges};
use crate::domain::user::{NewUser, User};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    users: BTreeMap<Uuid, User>,
    products: BTreeMap<Uuid, Product>,
    cart_lines: BTreeMap<Uuid, CartLine>,
    orders: BTreeMap<Uuid, OrderView>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next transaction fail at commit time after its work succeeded.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Read-only view of the committed state.
    pub fn snapshot(&self) -> MemoryState {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

impl MemoryState {
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn product(&self, id: Uuid) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn cart_len(&self, user_id: Uuid) -> usize {
        self.cart_lines
            .values()
            .filter(|l| l.user_id == user_id)
            .count()
    }

    fn sorted_lines(&self, user_id: Uuid) -> Vec<CartLine> {
        let mut lines: Vec<CartLine> = self
            .cart_lines
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        lines.sort_by_key(|l| l.product_id);
        lines
    }

    fn line_id(&self, user_id: Uuid, product_id: Uuid) -> Option<Uuid> {
        self.cart_lines
            .values()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
            .map(|l| l.id)
    }
}

impl UnitOfWork for InMemoryStore {
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, DomainError>,
    {
        let mut committed = self
            .state
            .lock()
            .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))?;
        let mut working = committed.clone();

        let result = work(&mut working)?;

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(DomainError::TransactionConflict);
        }
        *committed = working;
        Ok(result)
    }
}

impl CartStore for MemoryState {
    fn get_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        Ok(self.sorted_lines(user_id))
    }

    fn lock_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        Ok(self.sorted_lines(user_id))
    }

    fn find_line(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartLine>, DomainError> {
        Ok(self
            .line_id(user_id, product_id)
            .and_then(|id| self.cart_lines.get(&id).cloned()))
    }

    fn add_quantity(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        if !self.users.contains_key(&user_id) || !self.products.contains_key(&product_id) {
            return Err(DomainError::InvalidInput(
                "referenced user or product does not exist".to_string(),
            ));
        }
        let now = Utc::now();
        if let Some(id) = self.line_id(user_id, product_id) {
            if let Some(line) = self.cart_lines.get_mut(&id) {
                line.quantity += quantity;
                line.updated_at = now;
                return Ok(line.clone());
            }
        }
        let line = CartLine {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        self.cart_lines.insert(line.id, line.clone());
        Ok(line)
    }

    fn set_quantity(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartLine>, DomainError> {
        let Some(id) = self.line_id(user_id, product_id) else {
            return Ok(None);
        };
        Ok(self.cart_lines.get_mut(&id).map(|line| {
            line.quantity = quantity;
            line.updated_at = Utc::now();
            line.clone()
        }))
    }

    fn remove_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<bool, DomainError> {
        Ok(self
            .line_id(user_id, product_id)
            .and_then(|id| self.cart_lines.remove(&id))
            .is_some())
    }

    fn remove_lines(&mut self, user_id: Uuid, line_ids: &[Uuid]) -> Result<usize, DomainError> {
        let before = self.cart_lines.len();
        self.cart_lines
            .retain(|id, line| !(line.user_id == user_id && line_ids.contains(id)));
        Ok(before - self.cart_lines.len())
    }

    fn clear(&mut self, user_id: Uuid) -> Result<usize, DomainError> {
        let before = self.cart_lines.len();
        self.cart_lines.retain(|_, line| line.user_id != user_id);
        Ok(before - self.cart_lines.len())
    }
}

impl ProductInventory for MemoryState {
    fn get(&mut self, product_id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.products.get(&product_id).cloned())
    }

    fn lock(&mut self, product_id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.products.get(&product_id).cloned())
    }

    fn debit_stock(&mut self, product_id: Uuid, amount: i32) -> Result<Product, DomainError> {
        if amount < 1 {
            return Err(DomainError::InvalidInput(format!(
                "debit amount must be at least 1, got {amount}"
            )));
        }
        let product = self
            .products
            .get_mut(&product_id)
            .filter(|p| p.is_active)
            .ok_or(DomainError::ProductUnavailable { product_id })?;
        if product.stock < amount {
            return Err(DomainError::InsufficientStock {
                product_id,
                available: product.stock,
                requested: amount,
            });
        }
        product.stock -= amount;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    fn insert(&mut self, product: NewProduct) -> Result<Product, DomainError> {
        if !self.users.contains_key(&product.seller_id) {
            return Err(DomainError::InvalidInput(
                "referenced user or product does not exist".to_string(),
            ));
        }
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            seller_id: product.seller_id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            is_active: product.is_active,
            created_at: now,
            updated_at: now,
        };
        self.products.insert(product.id, product.clone());
        Ok(product)
    }

    fn update(
        &mut self,
        product_id: Uuid,
        changes: ProductChanges,
    ) -> Result<Option<Product>, DomainError> {
        let Some(product) = self.products.get_mut(&product_id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(description) = changes.description {
            product.description = Some(description);
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }
        if let Some(is_active) = changes.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    fn list_active(&mut self, page: i64, limit: i64) -> Result<(Vec<Product>, i64), DomainError> {
        let mut active: Vec<Product> = self
            .products
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let total = active.len() as i64;
        let items = active
            .into_iter()
            .skip((page - 1).saturating_mul(limit) as usize)
            .take(limit as usize)
            .collect();
        Ok((items, total))
    }
}

impl OrderStore for MemoryState {
    fn insert_order(&mut self, draft: &OrderDraft) -> Result<OrderView, DomainError> {
        if !self.users.contains_key(&draft.user_id()) {
            return Err(DomainError::InvalidInput(
                "referenced user or product does not exist".to_string(),
            ));
        }
        let now = Utc::now();
        let order = OrderView {
            id: Uuid::new_v4(),
            user_id: draft.user_id(),
            status: draft.status(),
            total_amount: draft.total_amount().clone(),
            created_at: now,
            updated_at: now,
            lines: draft
                .lines()
                .iter()
                .map(|l| OrderLineView {
                    id: Uuid::new_v4(),
                    product_id: l.product_id,
                    quantity: l.quantity,
                    unit_price: l.unit_price.clone(),
                    total_price: l.total_price.clone(),
                })
                .collect(),
        };
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    fn find_by_id(&mut self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        Ok(self.orders.get(&id).cloned())
    }

    fn list_by_user(
        &mut self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let mut mine: Vec<OrderView> = self
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let total = mine.len() as i64;
        let items = mine
            .into_iter()
            .skip((page - 1).saturating_mul(limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ListResult { items, total })
    }

    fn update_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderView>, DomainError> {
        Ok(self.orders.get_mut(&id).map(|order| {
            order.status = status;
            order.updated_at = Utc::now();
            order.clone()
        }))
    }
}

impl UserStore for MemoryState {
    fn insert_user(&mut self, user: NewUser) -> Result<User, DomainError> {
        if self.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::Conflict(format!(
                "email '{}' is already registered",
                user.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            role: user.role,
            is_active: true,
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn find_user(&mut self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.users.get(&id).cloned())
    }

    fn delete_user(&mut self, id: Uuid) -> Result<bool, DomainError> {
        if !self.users.contains_key(&id) {
            return Ok(false);
        }
        if self.products.values().any(|p| p.seller_id == id) {
            return Err(DomainError::Conflict(format!(
                "user {id} still sells products"
            )));
        }
        // Dependents first: cart lines, then orders (which own their lines).
        self.cart_lines.retain(|_, line| line.user_id != id);
        self.orders.retain(|_, order| order.user_id != id);
        self.users.remove(&id);
        Ok(true)
    }
}
