use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::UnitOfWork;
use crate::domain::user::{Identity, NewUser, User};

pub struct UserService<S> {
    store: S,
}

impl<S: UnitOfWork> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn register(&self, user: NewUser) -> Result<User, DomainError> {
        let user = user.validated()?;
        let created = self.store.transaction(|repos| repos.insert_user(user))?;
        log::info!("registered user {} as {}", created.id, created.role);
        Ok(created)
    }

    pub fn get(&self, id: Uuid) -> Result<User, DomainError> {
        self.store
            .transaction(|repos| repos.find_user(id))?
            .ok_or(DomainError::UserNotFound(id))
    }

    /// Removes the account together with its cart and orders.
    pub fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), DomainError> {
        if !identity.can_manage(id) {
            return Err(DomainError::Forbidden(
                "cannot delete another user's account".to_string(),
            ));
        }
        if !self.store.transaction(|repos| repos.delete_user(id))? {
            return Err(DomainError::UserNotFound(id));
        }
        log::info!("user {id} deleted by {}", identity.user_id);
        Ok(())
    }
}
