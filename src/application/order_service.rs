use uuid::Uuid;

use crate::application::checkout;
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, OrderStatus, OrderView};
use crate::domain::ports::UnitOfWork;
use crate::domain::user::Identity;

pub struct OrderService<S> {
    store: S,
}

impl<S: UnitOfWork> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Checks out the caller's cart in one transaction.
    pub fn place_order(&self, identity: &Identity) -> Result<OrderView, DomainError> {
        let user_id = identity.user_id;
        match self
            .store
            .transaction(|repos| checkout::place_order(repos, user_id))
        {
            Ok(order) => {
                log::info!(
                    "order {} placed by {} ({} lines, total {})",
                    order.id,
                    user_id,
                    order.lines.len(),
                    order.total_amount
                );
                Ok(order)
            }
            Err(err) => {
                match &err {
                    DomainError::Internal(detail) => {
                        log::error!("checkout for {user_id} failed: {detail}")
                    }
                    other => log::warn!("checkout for {user_id} rejected: {other}"),
                }
                Err(err)
            }
        }
    }

    /// Only the owner may read an order.
    pub fn get_order(&self, identity: &Identity, id: Uuid) -> Result<OrderView, DomainError> {
        let order = self
            .store
            .transaction(|repos| repos.find_by_id(id))?
            .ok_or(DomainError::OrderNotFound(id))?;
        if order.user_id != identity.user_id {
            return Err(DomainError::Forbidden(format!(
                "order {id} belongs to another user"
            )));
        }
        Ok(order)
    }

    pub fn list_orders(
        &self,
        identity: &Identity,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let user_id = identity.user_id;
        let (page, limit) = super::page_bounds(Some(page), Some(limit));
        self.store
            .transaction(|repos| repos.list_by_user(user_id, page, limit))
    }

    /// Admin-only; any status in the fixed set may follow any other.
    pub fn update_status(
        &self,
        identity: &Identity,
        id: Uuid,
        status: &str,
    ) -> Result<OrderView, DomainError> {
        if !identity.is_admin() {
            return Err(DomainError::Forbidden(
                "only admins can change order status".to_string(),
            ));
        }
        let status: OrderStatus = status.parse()?;
        let order = self
            .store
            .transaction(|repos| repos.update_status(id, status))?
            .ok_or(DomainError::OrderNotFound(id))?;
        log::info!("order {id} moved to {status} by {}", identity.user_id);
        Ok(order)
    }
}
