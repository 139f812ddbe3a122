use async_trait::async_trait;
use thiserror::Error;

use lunchly_core::domain::customer::{BestCustomer, Customer, CustomerId, NewCustomer};
use lunchly_core::domain::reservation::{Reservation, ReservationDraft, ReservationId};
use lunchly_core::errors::{ApplicationError, DomainError};

pub mod customer;
pub mod memory;
pub mod reservation;

pub use customer::SqlCustomerRepository;
pub use memory::InMemoryStore;
pub use reservation::SqlReservationRepository;

/// Number of entries returned by [`CustomerRepository::best_customers`].
pub const BEST_CUSTOMER_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("No such {entity}: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl RepositoryError {
    pub fn customer_not_found(id: CustomerId) -> Self {
        Self::NotFound { entity: "customer", id: id.0 }
    }

    pub fn reservation_not_found(id: ReservationId) -> Self {
        Self::NotFound { entity: "reservation", id: id.0 }
    }

    /// HTTP-style status hint for the calling layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Domain(error) => error.status_code(),
            Self::Database(_) | Self::Decode(_) => 500,
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound { .. } => Self::NotFound(value.to_string()),
            RepositoryError::Domain(error) => Self::Domain(error),
            RepositoryError::Database(error) => Self::Persistence(error.to_string()),
            RepositoryError::Decode(message) => Self::Persistence(message),
        }
    }
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// All customers ordered by last name, then first name.
    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError>;

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Like [`find_by_id`](Self::find_by_id) but a missing row is an error.
    async fn get(&self, id: CustomerId) -> Result<Customer, RepositoryError> {
        self.find_by_id(id).await?.ok_or_else(|| RepositoryError::customer_not_found(id))
    }

    /// Case-insensitive substring match on first or last name.
    async fn search(&self, name_part: &str) -> Result<Vec<Customer>, RepositoryError>;

    async fn best_customers(&self) -> Result<Vec<BestCustomer>, RepositoryError>;

    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError>;

    async fn update(&self, customer: &Customer) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn find_by_id(&self, id: ReservationId)
        -> Result<Option<Reservation>, RepositoryError>;

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, RepositoryError>;

    async fn create(&self, draft: ReservationDraft) -> Result<Reservation, RepositoryError>;

    async fn update(&self, reservation: &Reservation) -> Result<(), RepositoryError>;
}

/// Reservations held by `customer`.
pub async fn reservations_for_customer<R>(
    customer: &Customer,
    reservations: &R,
) -> Result<Vec<Reservation>, RepositoryError>
where
    R: ReservationRepository + ?Sized,
{
    reservations.list_for_customer(customer.id).await
}

/// Escapes LIKE wildcards so `name_part` matches literally, then wraps it in `%`.
pub(crate) fn contains_pattern(name_part: &str) -> String {
    let mut pattern = String::with_capacity(name_part.len() + 2);
    pattern.push('%');
    for ch in name_part.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
