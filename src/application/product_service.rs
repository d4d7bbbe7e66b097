use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::UnitOfWork;
use crate::domain::product::{NewProduct, Product, ProductChanges};
use crate::domain::user::{Identity, Role};

pub struct ProductService<S> {
    store: S,
}

impl<S: UnitOfWork> ProductService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists a product under the caller; buyers cannot sell.
    pub fn create(&self, identity: &Identity, product: NewProduct) -> Result<Product, DomainError> {
        if identity.role == Role::Buyer {
            return Err(DomainError::Forbidden(
                "only sellers and admins can list products".to_string(),
            ));
        }
        let product = NewProduct {
            seller_id: identity.user_id,
            ..product
        }
        .validated()?;
        let seller_id = identity.user_id;
        let created = self.store.transaction(|repos| {
            repos
                .find_user(seller_id)?
                .ok_or(DomainError::UserNotFound(seller_id))?;
            repos.insert(product)
        })?;
        log::info!("product {} listed by {}", created.id, seller_id);
        Ok(created)
    }

    pub fn get(&self, id: Uuid) -> Result<Product, DomainError> {
        self.store
            .transaction(|repos| repos.get(id))?
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Active products, newest first.
    pub fn list(&self, page: i64, limit: i64) -> Result<(Vec<Product>, i64), DomainError> {
        let (page, limit) = super::page_bounds(Some(page), Some(limit));
        self.store.transaction(|repos| repos.list_active(page, limit))
    }

    /// Partial update by the product's seller or an admin.
    pub fn update(
        &self,
        identity: &Identity,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Product, DomainError> {
        let changes = changes.validated()?;
        self.store.transaction(|repos| {
            let product = repos.lock(id)?.ok_or(DomainError::ProductNotFound(id))?;
            if !identity.can_manage(product.seller_id) {
                return Err(DomainError::Forbidden(format!(
                    "product {id} belongs to another seller"
                )));
            }
            if changes.is_empty() {
                return Ok(product);
            }
            repos
                .update(id, changes)?
                .ok_or(DomainError::ProductNotFound(id))
        })
    }
}
