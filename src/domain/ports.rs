use uuid::Uuid;

use super::cart::CartLine;
use super::errors::DomainError;
use super::order::{ListResult, OrderDraft, OrderStatus, OrderView};
use super::product::{NewProduct, Product, ProductChanges};
use super::user::{NewUser, User};

/// Cart lines keyed by user. Lines come back ordered by product id.
pub trait CartStore {
    fn get_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError>;
    /// Like `get_lines`, but the rows stay locked until the transaction ends.
    fn lock_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError>;
    fn find_line(&mut self, user_id: Uuid, product_id: Uuid)
        -> Result<Option<CartLine>, DomainError>;
    /// Inserts the line or adds `quantity` to the existing one.
    fn add_quantity(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError>;
    fn set_quantity(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartLine>, DomainError>;
    fn remove_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<bool, DomainError>;
    fn remove_lines(&mut self, user_id: Uuid, line_ids: &[Uuid]) -> Result<usize, DomainError>;
    /// Removes every line of the user; an empty cart is not an error.
    fn clear(&mut self, user_id: Uuid) -> Result<usize, DomainError>;
}

pub trait ProductInventory {
    fn get(&mut self, product_id: Uuid) -> Result<Option<Product>, DomainError>;
    /// Reads the product and holds its row lock until the transaction ends.
    fn lock(&mut self, product_id: Uuid) -> Result<Option<Product>, DomainError>;
    /// Decrements stock by `amount`.
    ///
    /// Fails with `ProductUnavailable` when the product is missing or inactive
    /// and with `InsufficientStock` when `amount` exceeds the stock.
    fn debit_stock(&mut self, product_id: Uuid, amount: i32) -> Result<Product, DomainError>;
    fn insert(&mut self, product: NewProduct) -> Result<Product, DomainError>;
    fn update(
        &mut self,
        product_id: Uuid,
        changes: ProductChanges,
    ) -> Result<Option<Product>, DomainError>;
    fn list_active(&mut self, page: i64, limit: i64) -> Result<(Vec<Product>, i64), DomainError>;
}

pub trait OrderStore {
    /// Persists the header and every line of `draft` on the current transaction.
    fn insert_order(&mut self, draft: &OrderDraft) -> Result<OrderView, DomainError>;
    fn find_by_id(&mut self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list_by_user(&mut self, user_id: Uuid, page: i64, limit: i64)
        -> Result<ListResult, DomainError>;
    fn update_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderView>, DomainError>;
}

pub trait UserStore {
    fn insert_user(&mut self, user: NewUser) -> Result<User, DomainError>;
    fn find_user(&mut self, id: Uuid) -> Result<Option<User>, DomainError>;
    /// Deletes the user; orders, order lines and cart lines go with it.
    fn delete_user(&mut self, id: Uuid) -> Result<bool, DomainError>;
}

/// Every store, bound to one open transaction.
pub trait Repositories: CartStore + ProductInventory + OrderStore + UserStore {}

impl<T: CartStore + ProductInventory + OrderStore + UserStore> Repositories for T {}

pub trait UnitOfWork: Clone + Send + Sync + 'static {
    /// Runs `work` inside one transaction.
    ///
    /// Commits when `work` returns `Ok`; any `Err`, including a failed commit,
    /// leaves no trace in the store.
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, DomainError>;
}
