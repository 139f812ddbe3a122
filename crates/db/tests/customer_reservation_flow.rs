use chrono::{NaiveDate, NaiveDateTime};

use lunchly_core::domain::customer::NewCustomer;
use lunchly_core::domain::reservation::ReservationDraft;
use lunchly_db::{
    connect_with_settings, migrations, reservations_for_customer, CustomerRepository,
    InMemoryStore, ReservationRepository, SqlCustomerRepository, SqlReservationRepository,
};

fn dinner_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 3, 3)
        .and_then(|date| date.and_hms_opt(17, 30, 0))
        .expect("valid timestamp")
}

#[tokio::test]
async fn customer_and_reservation_end_to_end() {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");

    let customers = SqlCustomerRepository::new(pool.clone());
    let reservations = SqlReservationRepository::new(pool.clone());

    let ada = customers
        .create(NewCustomer::new(
            "Ada",
            "Lovelace",
            Some("555".to_string()),
            Some(String::new()),
        ))
        .await
        .expect("create customer");

    let fetched = customers.get(ada.id).await.expect("get customer");
    assert_eq!(fetched.full_name(), "Ada Lovelace");
    assert_eq!(fetched.phone.as_deref(), Some("555"));
    assert_eq!(fetched.notes(), "");

    let draft = ReservationDraft::for_customer(ada.id, 2, dinner_time(), Some(String::new()))
        .expect("valid draft");
    let saved = reservations.create(draft).await.expect("create reservation");

    let held = reservations.list_for_customer(ada.id).await.expect("list reservations");
    assert_eq!(held, vec![saved.clone()]);
    assert_eq!(held[0].num_guests().get(), 2);
    assert_eq!(held[0].start_at(), dinner_time());
    assert_eq!(held[0].notes(), "");
    assert_eq!(held[0].formatted_start_at(), "March 3rd 2021, 5:30 pm");

    let via_customer =
        reservations_for_customer(&fetched, &reservations).await.expect("delegated query");
    assert_eq!(via_customer, held);

    let best = customers.best_customers().await.expect("best customers");
    assert_eq!(best.len(), 1);
    assert_eq!(best[0].customer, fetched);
    assert_eq!(best[0].reservation_count, 1);

    pool.close().await;
}

#[tokio::test]
async fn reads_always_reflect_latest_write() {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    let customers = SqlCustomerRepository::new(pool.clone());

    let created = customers
        .create(NewCustomer::new("Grace", "Hopper", None, None))
        .await
        .expect("create customer");

    let mut first_copy = customers.get(created.id).await.expect("get");
    let mut second_copy = customers.get(created.id).await.expect("get");

    first_copy.set_notes(Some("first writer".to_string()));
    second_copy.set_notes(Some("second writer".to_string()));
    customers.update(&first_copy).await.expect("first update");
    customers.update(&second_copy).await.expect("second update");

    let stored = customers.get(created.id).await.expect("get");
    assert_eq!(stored.notes(), "second writer");

    pool.close().await;
}

#[tokio::test]
async fn search_folds_ascii_case_only_on_every_backend() {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    let sql = SqlCustomerRepository::new(pool.clone());
    let memory = InMemoryStore::default();

    let backends: [(&str, &dyn CustomerRepository); 2] = [("sql", &sql), ("memory", &memory)];
    for (name, repo) in backends {
        repo.create(NewCustomer::new("Émile", "Zola", None, None)).await.expect("create");

        let by_last_name = repo.search("zola").await.expect("search");
        let exact_accent = repo.search("É").await.expect("search");
        let folded_accent = repo.search("émile").await.expect("search");

        assert_eq!(by_last_name.len(), 1, "{name}: ascii letters fold");
        assert_eq!(exact_accent.len(), 1, "{name}: accented letter matches itself");
        assert!(folded_accent.is_empty(), "{name}: non-ascii letters do not fold");
    }

    pool.close().await;
}
