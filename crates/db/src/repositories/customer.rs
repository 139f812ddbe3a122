use sqlx::Row;
use tracing::debug;

use lunchly_core::domain::customer::{BestCustomer, Customer, CustomerId, NewCustomer};

use super::{contains_pattern, CustomerRepository, RepositoryError, BEST_CUSTOMER_LIMIT};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let first_name: String =
        row.try_get("first_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let last_name: String =
        row.try_get("last_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let phone: Option<String> =
        row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Customer::new(CustomerId(id), first_name, last_name, phone, notes))
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        debug!(event_name = "db.customer.list_all", "listing customers");
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, first_name, last_name, phone, notes
             FROM customers
             ORDER BY last_name, first_name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_customer).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        debug!(event_name = "db.customer.find_by_id", customer_id = id.0, "loading customer");
        let row = sqlx::query(
            "SELECT id, first_name, last_name, phone, notes
             FROM customers WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_customer(r)?)),
            None => Ok(None),
        }
    }

    async fn search(&self, name_part: &str) -> Result<Vec<Customer>, RepositoryError> {
        debug!(event_name = "db.customer.search", query = %name_part, "searching customers");
        let pattern = contains_pattern(name_part);
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, first_name, last_name, phone, notes
             FROM customers
             WHERE first_name LIKE ? ESCAPE '\\'
                OR last_name LIKE ? ESCAPE '\\'
             ORDER BY id",
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_customer).collect::<Result<Vec<_>, _>>()
    }

    async fn best_customers(&self) -> Result<Vec<BestCustomer>, RepositoryError> {
        debug!(event_name = "db.customer.best", "ranking customers by reservations");
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT c.id, c.first_name, c.last_name, c.phone, c.notes,
                    COUNT(r.id) AS reservation_count
             FROM customers AS c
             JOIN reservations AS r ON r.customer_id = c.id
             GROUP BY c.id
             ORDER BY reservation_count DESC, c.id ASC
             LIMIT ?",
        )
        .bind(BEST_CUSTOMER_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<BestCustomer, RepositoryError> {
                let reservation_count: i64 = row
                    .try_get("reservation_count")
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(BestCustomer { customer: row_to_customer(row)?, reservation_count })
            })
            .collect::<Result<Vec<_>, _>>()
    }

    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO customers (first_name, last_name, phone, notes)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone)
        .bind(customer.notes())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        debug!(event_name = "db.customer.create", customer_id = id, "customer inserted");

        Ok(customer.into_customer(CustomerId(id)))
    }

    async fn update(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE customers SET first_name = ?, last_name = ?, phone = ?, notes = ?
             WHERE id = ?",
        )
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone)
        .bind(customer.notes())
        .bind(customer.id.0)
        .execute(&self.pool)
        .await?;

        debug!(
            event_name = "db.customer.update",
            customer_id = customer.id.0,
            rows_affected = result.rows_affected(),
            "customer updated"
        );

        if result.rows_affected() == 0 {
            return Err(RepositoryError::customer_not_found(customer.id));
        }
        Ok(())
    }
}
