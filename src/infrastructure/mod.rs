pub mod memory;
pub mod models;
pub mod pg_store;

use crate::domain::errors::DomainError;
use crate::domain::ports::{Repositories, UnitOfWork};

use self::memory::InMemoryStore;
use self::pg_store::DieselStore;

/// The backend the HTTP layer runs against.
#[derive(Clone)]
pub enum Store {
    Postgres(DieselStore),
    Memory(InMemoryStore),
}

impl UnitOfWork for Store {
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, DomainError>,
    {
        match self {
            Store::Postgres(store) => store.transaction(work),
            Store::Memory(store) => store.transaction(work),
        }
    }
}

impl From<DieselStore> for Store {
    fn from(store: DieselStore) -> Self {
        Store::Postgres(store)
    }
}

impl From<InMemoryStore> for Store {
    fn from(store: InMemoryStore) -> Self {
        Store::Memory(store)
    }
}
