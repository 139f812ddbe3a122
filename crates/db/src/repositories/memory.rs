use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use lunchly_core::domain::customer::{BestCustomer, Customer, CustomerId, NewCustomer};
use lunchly_core::domain::reservation::{Reservation, ReservationDraft, ReservationId};
use lunchly_core::errors::DomainError;

use super::{CustomerRepository, RepositoryError, ReservationRepository, BEST_CUSTOMER_LIMIT};

#[derive(Default)]
struct MemoryState {
    customers: BTreeMap<i64, Customer>,
    reservations: BTreeMap<i64, Reservation>,
    last_customer_id: i64,
    last_reservation_id: i64,
}

/// Both repositories over one in-process map. Ids are assigned sequentially
/// from 1, like the SQL tables.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

fn sort_by_name(customers: &mut [Customer]) {
    customers.sort_by(|a, b| {
        (a.last_name.as_str(), a.first_name.as_str())
            .cmp(&(b.last_name.as_str(), b.first_name.as_str()))
    });
}

/// Case-insensitive for ASCII letters only, matching SQLite `LIKE`.
fn ascii_contains(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(lowered_needle)
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let state = self.state.read().await;
        let mut customers: Vec<Customer> = state.customers.values().cloned().collect();
        sort_by_name(&mut customers);
        Ok(customers)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.customers.get(&id.0).cloned())
    }

    async fn search(&self, name_part: &str) -> Result<Vec<Customer>, RepositoryError> {
        let needle = name_part.to_ascii_lowercase();
        let state = self.state.read().await;
        Ok(state
            .customers
            .values()
            .filter(|customer| {
                ascii_contains(&customer.first_name, &needle)
                    || ascii_contains(&customer.last_name, &needle)
            })
            .cloned()
            .collect())
    }

    async fn best_customers(&self) -> Result<Vec<BestCustomer>, RepositoryError> {
        let state = self.state.read().await;
        let mut counts: HashMap<i64, i64> = HashMap::new();
        for reservation in state.reservations.values() {
            *counts.entry(reservation.customer_id().0).or_default() += 1;
        }

        let mut ranked: Vec<BestCustomer> = counts
            .into_iter()
            .filter_map(|(id, reservation_count)| {
                state
                    .customers
                    .get(&id)
                    .map(|customer| BestCustomer { customer: customer.clone(), reservation_count })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.reservation_count.cmp(&a.reservation_count).then(a.customer.id.cmp(&b.customer.id))
        });
        ranked.truncate(BEST_CUSTOMER_LIMIT);
        Ok(ranked)
    }

    async fn create(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let mut state = self.state.write().await;
        state.last_customer_id += 1;
        let customer = customer.into_customer(CustomerId(state.last_customer_id));
        state.customers.insert(customer.id.0, customer.clone());
        Ok(customer)
    }

    async fn update(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        match state.customers.get_mut(&customer.id.0) {
            Some(stored) => {
                *stored = customer.clone();
                Ok(())
            }
            None => Err(RepositoryError::customer_not_found(customer.id)),
        }
    }
}

#[async_trait::async_trait]
impl ReservationRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<Reservation>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.reservations.get(&id.0).cloned())
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let state = self.state.read().await;
        let mut reservations: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|reservation| reservation.customer_id() == customer_id)
            .cloned()
            .collect();
        reservations.sort_by_key(|reservation| (reservation.start_at(), reservation.id()));
        Ok(reservations)
    }

    async fn create(&self, draft: ReservationDraft) -> Result<Reservation, RepositoryError> {
        let customer_id = draft.customer().customer_id().ok_or_else(|| {
            DomainError::InvalidState("reservation has no customer assigned".to_string())
        })?;

        let mut state = self.state.write().await;
        if !state.customers.contains_key(&customer_id.0) {
            return Err(RepositoryError::customer_not_found(customer_id));
        }
        state.last_reservation_id += 1;
        let reservation = draft.into_reservation(ReservationId(state.last_reservation_id))?;
        state.reservations.insert(reservation.id().0, reservation.clone());
        Ok(reservation)
    }

    async fn update(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if !state.customers.contains_key(&reservation.customer_id().0) {
            return Err(RepositoryError::customer_not_found(reservation.customer_id()));
        }
        match state.reservations.get_mut(&reservation.id().0) {
            Some(stored) => {
                *stored = reservation.clone();
                Ok(())
            }
            None => Err(RepositoryError::reservation_not_found(reservation.id())),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use lunchly_core::domain::customer::{CustomerId, NewCustomer};
    use lunchly_core::domain::reservation::ReservationDraft;

    use crate::repositories::{
        reservations_for_customer, CustomerRepository, InMemoryStore, RepositoryError,
        ReservationRepository,
    };

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, day)
            .and_then(|date| date.and_hms_opt(18, 0, 0))
            .expect("valid timestamp")
    }

    #[tokio::test]
    async fn in_memory_customer_round_trip() {
        let store = InMemoryStore::default();
        let customer = CustomerRepository::create(
            &store,
            NewCustomer::new("Ada", "Lovelace", Some("555".to_string()), None),
        )
        .await
        .expect("create");

        let found = store.get(customer.id).await.expect("get");

        assert_eq!(found, customer);
        assert_eq!(found.full_name(), "Ada Lovelace");
    }

    #[tokio::test]
    async fn in_memory_get_missing_is_not_found() {
        let store = InMemoryStore::default();
        let error = store.get(CustomerId(3)).await.expect_err("missing");
        assert!(matches!(error, RepositoryError::NotFound { entity: "customer", id: 3 }));
    }

    #[tokio::test]
    async fn in_memory_search_and_ordering_match_sql_semantics() {
        let store = InMemoryStore::default();
        for (first, last) in [("Grace", "Hopper"), ("Ada", "Lovelace"), ("Adam", "Hopper")] {
            CustomerRepository::create(&store, NewCustomer::new(first, last, None, None))
                .await
                .expect("create");
        }

        let names: Vec<String> =
            store.list_all().await.expect("list").iter().map(|c| c.full_name()).collect();
        assert_eq!(names, vec!["Adam Hopper", "Grace Hopper", "Ada Lovelace"]);

        assert_eq!(store.search("ADA").await.expect("search").len(), 2);
        assert_eq!(store.search("").await.expect("search").len(), 3);
        assert!(store.search("zzθ-no-match").await.expect("search").is_empty());
    }

    #[tokio::test]
    async fn in_memory_best_customers_and_reservations() {
        let store = InMemoryStore::default();
        let ada = CustomerRepository::create(&store, NewCustomer::new("Ada", "L", None, None))
            .await
            .expect("create");
        let grace = CustomerRepository::create(&store, NewCustomer::new("Grace", "H", None, None))
            .await
            .expect("create");

        for day in 1..=3 {
            let draft = ReservationDraft::for_customer(grace.id, 2, at(day), None).expect("draft");
            ReservationRepository::create(&store, draft).await.expect("create");
        }
        let draft = ReservationDraft::for_customer(ada.id, 2, at(4), None).expect("draft");
        ReservationRepository::create(&store, draft).await.expect("create");

        let best = store.best_customers().await.expect("best");
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].customer.id, grace.id);
        assert_eq!(best[0].reservation_count, 3);

        let held = reservations_for_customer(&grace, &store).await.expect("reservations");
        assert_eq!(held.len(), 3);
    }

    #[tokio::test]
    async fn in_memory_reservation_requires_existing_customer() {
        let store = InMemoryStore::default();
        let draft = ReservationDraft::for_customer(CustomerId(9), 2, at(1), None).expect("draft");

        let error = ReservationRepository::create(&store, draft).await.expect_err("unknown");

        assert!(matches!(error, RepositoryError::NotFound { entity: "customer", id: 9 }));
    }
}
