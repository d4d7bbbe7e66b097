use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::CartLine;
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, OrderDraft, OrderStatus, OrderView};
use crate::domain::ports::{
    CartStore, OrderStore, ProductInventory, Repositories, UnitOfWork, UserStore,
};
use crate::domain::product::{NewProduct, Product, ProductChanges};
use crate::domain::user::{NewUser, User};
use crate::schema::{cart_lines, order_lines, orders, products, users};

use super::models::{
    CartLineRow, NewCartLineRow, NewOrderLineRow, NewOrderRow, NewProductRow, NewUserRow,
    OrderLineRow, OrderRow, ProductChangeset, ProductRow, UserRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                DomainError::TransactionConflict
            }
            DieselError::DatabaseError(DatabaseErrorKind::Unknown, ref info)
                if info.message().contains("deadlock detected") =>
            {
                DomainError::TransactionConflict
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                DomainError::InvalidInput("referenced user or product does not exist".to_string())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Unit of work ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DieselStore {
    pool: DbPool,
}

impl DieselStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl UnitOfWork for DieselStore {
    fn transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn Repositories) -> Result<T, DomainError>,
    {
        let mut conn = self.pool.get()?;

        conn.build_transaction().read_committed().run(|conn| {
            let mut repos = PgRepositories { conn };
            work(&mut repos)
        })
    }
}

/// The stores, borrowing the connection of one open transaction.
pub struct PgRepositories<'c> {
    conn: &'c mut PgConnection,
}

impl CartStore for PgRepositories<'_> {
    fn get_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        let rows = cart_lines::table
            .filter(cart_lines::user_id.eq(user_id))
            .order(cart_lines::product_id.asc())
            .select(CartLineRow::as_select())
            .load(self.conn)?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    fn lock_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        let rows = cart_lines::table
            .filter(cart_lines::user_id.eq(user_id))
            .order(cart_lines::product_id.asc())
            .select(CartLineRow::as_select())
            .for_update()
            .load(self.conn)?;
        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    fn find_line(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<CartLine>, DomainError> {
        let row = cart_lines::table
            .filter(cart_lines::user_id.eq(user_id))
            .filter(cart_lines::product_id.eq(product_id))
            .select(CartLineRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(CartLine::from))
    }

    fn add_quantity(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        let row = diesel::insert_into(cart_lines::table)
            .values(&NewCartLineRow {
                id: Uuid::new_v4(),
                user_id,
                product_id,
                quantity,
            })
            .on_conflict((cart_lines::user_id, cart_lines::product_id))
            .do_update()
            .set((
                cart_lines::quantity.eq(cart_lines::quantity + excluded(cart_lines::quantity)),
                cart_lines::updated_at.eq(Utc::now()),
            ))
            .returning(CartLineRow::as_returning())
            .get_result(self.conn)?;
        Ok(row.into())
    }

    fn set_quantity(
        &mut self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartLine>, DomainError> {
        let row = diesel::update(
            cart_lines::table
                .filter(cart_lines::user_id.eq(user_id))
                .filter(cart_lines::product_id.eq(product_id)),
        )
        .set((
            cart_lines::quantity.eq(quantity),
            cart_lines::updated_at.eq(Utc::now()),
        ))
        .returning(CartLineRow::as_returning())
        .get_result(self.conn)
        .optional()?;
        Ok(row.map(CartLine::from))
    }

    fn remove_line(&mut self, user_id: Uuid, product_id: Uuid) -> Result<bool, DomainError> {
        let deleted = diesel::delete(
            cart_lines::table
                .filter(cart_lines::user_id.eq(user_id))
                .filter(cart_lines::product_id.eq(product_id)),
        )
        .execute(self.conn)?;
        Ok(deleted > 0)
    }

    fn remove_lines(&mut self, user_id: Uuid, line_ids: &[Uuid]) -> Result<usize, DomainError> {
        let deleted = diesel::delete(
            cart_lines::table
                .filter(cart_lines::user_id.eq(user_id))
                .filter(cart_lines::id.eq_any(line_ids.to_vec())),
        )
        .execute(self.conn)?;
        Ok(deleted)
    }

    fn clear(&mut self, user_id: Uuid) -> Result<usize, DomainError> {
        let deleted = diesel::delete(cart_lines::table.filter(cart_lines::user_id.eq(user_id)))
            .execute(self.conn)?;
        Ok(deleted)
    }
}

impl ProductInventory for PgRepositories<'_> {
    fn get(&mut self, product_id: Uuid) -> Result<Option<Product>, DomainError> {
        let row = products::table
            .find(product_id)
            .select(ProductRow::as_select())
            .first(self.conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn lock(&mut self, product_id: Uuid) -> Result<Option<Product>, DomainError> {
        let row = products::table
            .find(product_id)
            .select(ProductRow::as_select())
            .for_update()
            .first(self.conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn debit_stock(&mut self, product_id: Uuid, amount: i32) -> Result<Product, DomainError> {
        if amount < 1 {
            return Err(DomainError::InvalidInput(format!(
                "debit amount must be at least 1, got {amount}"
            )));
        }

        // The guard in the WHERE clause keeps stock non-negative even if a
        // caller skipped the row lock.
        let updated = diesel::update(
            products::table
                .find(product_id)
                .filter(products::is_active.eq(true))
                .filter(products::stock.ge(amount)),
        )
        .set((
            products::stock.eq(products::stock - amount),
            products::updated_at.eq(Utc::now()),
        ))
        .returning(ProductRow::as_returning())
        .get_result(self.conn)
        .optional()?;

        if let Some(row) = updated {
            return Ok(row.into());
        }
        match self.get(product_id)? {
            Some(product) if product.is_active => Err(DomainError::InsufficientStock {
                product_id,
                available: product.stock,
                requested: amount,
            }),
            _ => Err(DomainError::ProductUnavailable { product_id }),
        }
    }

    fn insert(&mut self, product: NewProduct) -> Result<Product, DomainError> {
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow {
                id: Uuid::new_v4(),
                seller_id: product.seller_id,
                name: product.name,
                description: product.description,
                price: product.price,
                stock: product.stock,
                is_active: product.is_active,
            })
            .returning(ProductRow::as_returning())
            .get_result(self.conn)?;
        Ok(row.into())
    }

    fn update(
        &mut self,
        product_id: Uuid,
        changes: ProductChanges,
    ) -> Result<Option<Product>, DomainError> {
        let row = diesel::update(products::table.find(product_id))
            .set(&ProductChangeset {
                name: changes.name,
                description: changes.description,
                price: changes.price,
                stock: changes.stock,
                is_active: changes.is_active,
                updated_at: Utc::now(),
            })
            .returning(ProductRow::as_returning())
            .get_result(self.conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn list_active(&mut self, page: i64, limit: i64) -> Result<(Vec<Product>, i64), DomainError> {
        let offset = (page - 1).saturating_mul(limit);

        let total: i64 = products::table
            .filter(products::is_active.eq(true))
            .count()
            .get_result(self.conn)?;

        let rows = products::table
            .filter(products::is_active.eq(true))
            .select(ProductRow::as_select())
            .order((products::created_at.desc(), products::id.asc()))
            .limit(limit)
            .offset(offset)
            .load(self.conn)?;

        Ok((rows.into_iter().map(Product::from).collect(), total))
    }
}

impl OrderStore for PgRepositories<'_> {
    fn insert_order(&mut self, draft: &OrderDraft) -> Result<OrderView, DomainError> {
        // 1. Insert the order header
        let order_id = Uuid::new_v4();
        let order = diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                id: order_id,
                user_id: draft.user_id(),
                status: draft.status().as_str(),
                total_amount: draft.total_amount().clone(),
            })
            .returning(OrderRow::as_returning())
            .get_result(self.conn)?;

        // 2. Insert order lines
        let new_lines: Vec<NewOrderLineRow> = draft
            .lines()
            .iter()
            .map(|l| NewOrderLineRow {
                id: Uuid::new_v4(),
                order_id,
                product_id: l.product_id,
                quantity: l.quantity,
                unit_price: l.unit_price.clone(),
                total_price: l.total_price.clone(),
            })
            .collect();
        let lines = diesel::insert_into(order_lines::table)
            .values(&new_lines)
            .returning(OrderLineRow::as_returning())
            .get_results(self.conn)?;

        order.into_view(lines)
    }

    fn find_by_id(&mut self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(self.conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = self.load_lines(order.id)?;
        order.into_view(lines).map(Some)
    }

    fn list_by_user(
        &mut self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let offset = (page - 1).saturating_mul(limit);

        let total: i64 = orders::table
            .filter(orders::user_id.eq(user_id))
            .count()
            .get_result(self.conn)?;

        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .order((orders::created_at.desc(), orders::id.asc()))
            .limit(limit)
            .offset(offset)
            .load(self.conn)?;

        let lines = OrderLineRow::belonging_to(&rows)
            .select(OrderLineRow::as_select())
            .order(order_lines::product_id.asc())
            .load(self.conn)?;

        let items = lines
            .grouped_by(&rows)
            .into_iter()
            .zip(rows)
            .map(|(lines, order)| order.into_view(lines))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResult { items, total })
    }

    fn update_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<OrderView>, DomainError> {
        let order = diesel::update(orders::table.find(id))
            .set((
                orders::status.eq(status.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(OrderRow::as_returning())
            .get_result(self.conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = self.load_lines(order.id)?;
        order.into_view(lines).map(Some)
    }
}

impl PgRepositories<'_> {
    fn load_lines(&mut self, order_id: Uuid) -> Result<Vec<OrderLineRow>, DomainError> {
        let lines = order_lines::table
            .filter(order_lines::order_id.eq(order_id))
            .select(OrderLineRow::as_select())
            .order(order_lines::product_id.asc())
            .load(self.conn)?;
        Ok(lines)
    }
}

impl UserStore for PgRepositories<'_> {
    fn insert_user(&mut self, user: NewUser) -> Result<User, DomainError> {
        let result = diesel::insert_into(users::table)
            .values(&NewUserRow {
                id: Uuid::new_v4(),
                email: &user.email,
                role: user.role.as_str(),
            })
            .returning(UserRow::as_returning())
            .get_result(self.conn);

        match result {
            Ok(row) => row.try_into(),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(
                DomainError::Conflict(format!("email '{}' is already registered", user.email)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    fn find_user(&mut self, id: Uuid) -> Result<Option<User>, DomainError> {
        let row = users::table
            .find(id)
            .select(UserRow::as_select())
            .first(self.conn)
            .optional()?;
        row.map(User::try_from).transpose()
    }

    fn delete_user(&mut self, id: Uuid) -> Result<bool, DomainError> {
        match diesel::delete(users::table.find(id)).execute(self.conn) {
            Ok(deleted) => Ok(deleted > 0),
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => Err(
                DomainError::Conflict(format!("user {id} still sells products")),
            ),
            Err(e) => Err(e.into()),
        }
    }
}
