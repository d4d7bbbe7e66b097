use std::str::FromStr;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::ports::UnitOfWork;
use crate::domain::product::{NewProduct, ProductChanges};
use crate::domain::user::{Identity, NewUser, Role};
use crate::infrastructure::memory::InMemoryStore;

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("valid decimal")
}

/// Seeds an in-memory store directly through the ports.
pub struct Fixture {
    pub store: InMemoryStore,
    seller: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let seller = seed_user(&store, Role::Seller);
        Self { store, seller }
    }

    pub fn seller(&self) -> Identity {
        Identity::new(self.seller, Role::Seller)
    }

    pub fn buyer(&self) -> Uuid {
        seed_user(&self.store, Role::Buyer)
    }

    pub fn admin(&self) -> Identity {
        Identity::new(seed_user(&self.store, Role::Admin), Role::Admin)
    }

    pub fn product(&self, price: &str, stock: i32) -> Uuid {
        let seller_id = self.seller;
        let price = dec(price);
        self.store
            .transaction(|repos| {
                repos.insert(NewProduct {
                    seller_id,
                    name: "Widget".to_string(),
                    description: None,
                    price,
                    stock,
                    is_active: true,
                })
            })
            .expect("seed product")
            .id
    }

    pub fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) {
        self.store
            .transaction(|repos| repos.add_quantity(user_id, product_id, quantity))
            .expect("seed cart line");
    }

    pub fn set_stock(&self, product_id: Uuid, stock: i32) {
        self.change(
            product_id,
            ProductChanges {
                stock: Some(stock),
                ..Default::default()
            },
        );
    }

    pub fn set_price(&self, product_id: Uuid, price: &str) {
        self.change(
            product_id,
            ProductChanges {
                price: Some(dec(price)),
                ..Default::default()
            },
        );
    }

    pub fn deactivate(&self, product_id: Uuid) {
        self.change(
            product_id,
            ProductChanges {
                is_active: Some(false),
                ..Default::default()
            },
        );
    }

    fn change(&self, product_id: Uuid, changes: ProductChanges) {
        self.store
            .transaction(|repos| repos.update(product_id, changes))
            .expect("seed product change")
            .expect("product exists");
    }
}

fn seed_user(store: &InMemoryStore, role: Role) -> Uuid {
    let email = format!("{}@example.com", Uuid::new_v4());
    store
        .transaction(|repos| repos.insert_user(NewUser { email, role }))
        .expect("seed user")
        .id
}
