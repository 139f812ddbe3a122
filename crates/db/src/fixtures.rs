use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::info;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const DEMO_CUSTOMER_IDS: &[i64] = &[1, 2, 3, 4, 5, 6];
const DEMO_RESERVATION_IDS: &[i64] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

/// Demo customers and reservations for local development and smoke runs.
pub struct DemoDataset;

/// Rows the seed script actually inserted. Zero on a re-run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub customers_added: i64,
    pub reservations_added: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

impl DemoDataset {
    pub const SQL: &'static str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Load the demo dataset. Rows that already exist are left untouched.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        let (customers_before, reservations_before) = table_counts(&mut *tx).await?;
        sqlx::raw_sql(Self::SQL).execute(&mut *tx).await?;
        let (customers_after, reservations_after) = table_counts(&mut *tx).await?;
        tx.commit().await?;

        let seeded = SeedResult {
            customers_added: customers_after - customers_before,
            reservations_added: reservations_after - reservations_before,
        };
        info!(
            event_name = "db.fixtures.loaded",
            customers_added = seeded.customers_added,
            reservations_added = seeded.reservations_added,
            "demo dataset loaded"
        );

        Ok(seeded)
    }

    /// Check that every demo row is present.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let customers = count_present(pool, "customers", DEMO_CUSTOMER_IDS).await?;
        let reservations = count_present(pool, "reservations", DEMO_RESERVATION_IDS).await?;

        let checks = vec![
            ("demo-customers", customers == DEMO_CUSTOMER_IDS.len() as i64),
            ("demo-reservations", reservations == DEMO_RESERVATION_IDS.len() as i64),
        ];
        let all_present = checks.iter().all(|(_, passed)| *passed);

        Ok(VerificationResult { all_present, checks })
    }
}

async fn table_counts(conn: &mut SqliteConnection) -> Result<(i64, i64), RepositoryError> {
    let (customers,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM customers").fetch_one(&mut *conn).await?;
    let (reservations,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM reservations").fetch_one(&mut *conn).await?;
    Ok((customers, reservations))
}

async fn count_present(
    pool: &DbPool,
    table: &'static str,
    ids: &[i64],
) -> Result<i64, RepositoryError> {
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id IN ({placeholders})");

    let mut query = sqlx::query_as::<_, (i64,)>(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let (count,) = query.fetch_one(pool).await?;
    Ok(count)
}
