use chrono::NaiveDateTime;
use sqlx::Row;
use tracing::debug;

use lunchly_core::domain::customer::CustomerId;
use lunchly_core::domain::reservation::{Reservation, ReservationDraft, ReservationId};
use lunchly_core::errors::DomainError;

use super::{RepositoryError, ReservationRepository};
use crate::DbPool;

pub struct SqlReservationRepository {
    pool: DbPool,
}

impl SqlReservationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_reservation(row: &sqlx::sqlite::SqliteRow) -> Result<Reservation, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_id: i64 =
        row.try_get("customer_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let num_guests: i64 =
        row.try_get("num_guests").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let start_at: NaiveDateTime =
        row.try_get("start_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let notes: Option<String> =
        row.try_get("notes").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Reservation::new(ReservationId(id), CustomerId(customer_id), num_guests, start_at, notes)
        .map_err(|e| RepositoryError::Decode(format!("reservation {id}: {e}")))
}

#[async_trait::async_trait]
impl ReservationRepository for SqlReservationRepository {
    async fn find_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        debug!(
            event_name = "db.reservation.find_by_id",
            reservation_id = id.0,
            "loading reservation"
        );
        let row = sqlx::query(
            "SELECT id, customer_id, num_guests, start_at, notes
             FROM reservations WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_reservation(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        debug!(
            event_name = "db.reservation.list_for_customer",
            customer_id = customer_id.0,
            "listing reservations for customer"
        );
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, customer_id, num_guests, start_at, notes
             FROM reservations
             WHERE customer_id = ?
             ORDER BY start_at, id",
        )
        .bind(customer_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reservation).collect::<Result<Vec<_>, _>>()
    }

    async fn create(&self, draft: ReservationDraft) -> Result<Reservation, RepositoryError> {
        let customer_id = draft.customer().customer_id().ok_or_else(|| {
            DomainError::InvalidState("reservation has no customer assigned".to_string())
        })?;

        let row = sqlx::query(
            "INSERT INTO reservations (customer_id, num_guests, start_at, notes)
             VALUES (?, ?, ?, ?)
             RETURNING id",
        )
        .bind(customer_id.0)
        .bind(draft.num_guests().get())
        .bind(draft.start_at())
        .bind(draft.notes())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        debug!(
            event_name = "db.reservation.create",
            reservation_id = id,
            customer_id = customer_id.0,
            "reservation inserted"
        );

        Ok(draft.into_reservation(ReservationId(id))?)
    }

    async fn update(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE reservations SET customer_id = ?, num_guests = ?, start_at = ?, notes = ?
             WHERE id = ?",
        )
        .bind(reservation.customer_id().0)
        .bind(reservation.num_guests().get())
        .bind(reservation.start_at())
        .bind(reservation.notes())
        .bind(reservation.id().0)
        .execute(&self.pool)
        .await?;

        debug!(
            event_name = "db.reservation.update",
            reservation_id = reservation.id().0,
            rows_affected = result.rows_affected(),
            "reservation updated"
        );

        if result.rows_affected() == 0 {
            return Err(RepositoryError::reservation_not_found(reservation.id()));
        }
        Ok(())
    }
}
