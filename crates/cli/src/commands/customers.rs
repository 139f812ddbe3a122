use serde::Serialize;

use lunchly_core::config::LoadOptions;
use lunchly_core::domain::customer::{BestCustomer, Customer, CustomerId, NewCustomer};
use lunchly_core::domain::reservation::Reservation;
use lunchly_db::{
    reservations_for_customer, CustomerRepository, SqlCustomerRepository,
    SqlReservationRepository,
};

use crate::commands::{repository_failure, run_with_database, to_data, CommandResult, Failure};

#[derive(Debug, Serialize)]
pub(crate) struct CustomerView {
    id: i64,
    full_name: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    notes: String,
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.0,
            full_name: customer.full_name(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            phone: customer.phone.clone(),
            notes: customer.notes().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RankedCustomerView {
    #[serde(flatten)]
    customer: CustomerView,
    reservation_count: i64,
}

impl From<&BestCustomer> for RankedCustomerView {
    fn from(entry: &BestCustomer) -> Self {
        Self {
            customer: CustomerView::from(&entry.customer),
            reservation_count: entry.reservation_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReservationView {
    id: i64,
    customer_id: i64,
    num_guests: i64,
    start_at: String,
    formatted_start_at: String,
    notes: String,
}

impl From<&Reservation> for ReservationView {
    fn from(reservation: &Reservation) -> Self {
        Self {
            id: reservation.id().0,
            customer_id: reservation.customer_id().0,
            num_guests: reservation.num_guests().get(),
            start_at: reservation.start_at().format("%Y-%m-%dT%H:%M:%S").to_string(),
            formatted_start_at: reservation.formatted_start_at(),
            notes: reservation.notes().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CustomerDetailView {
    customer: CustomerView,
    reservations: Vec<ReservationView>,
}

fn finish(
    command: &str,
    result: Result<(String, serde_json::Value), CommandResult>,
) -> CommandResult {
    match result {
        Ok((message, data)) => CommandResult::success_with_data(command, message, data),
        Err(failure) => failure,
    }
}

pub fn list(options: &LoadOptions) -> CommandResult {
    let result = run_with_database("customers", options, |pool| async move {
        let customers =
            SqlCustomerRepository::new(pool).list_all().await.map_err(repository_failure)?;
        let views: Vec<CustomerView> = customers.iter().map(CustomerView::from).collect();
        Ok::<_, Failure>((format!("listed {} customers", views.len()), to_data(&views)?))
    });
    finish("customers", result)
}

pub fn search(options: &LoadOptions, text: &str) -> CommandResult {
    let result = run_with_database("search", options, |pool| async move {
        let customers =
            SqlCustomerRepository::new(pool).search(text).await.map_err(repository_failure)?;
        let views: Vec<CustomerView> = customers.iter().map(CustomerView::from).collect();
        Ok::<_, Failure>((
            format!("found {} customers matching `{text}`", views.len()),
            to_data(&views)?,
        ))
    });
    finish("search", result)
}

pub fn best(options: &LoadOptions) -> CommandResult {
    let result = run_with_database("best", options, |pool| async move {
        let ranked =
            SqlCustomerRepository::new(pool).best_customers().await.map_err(repository_failure)?;
        let views: Vec<RankedCustomerView> =
            ranked.iter().map(RankedCustomerView::from).collect();
        Ok::<_, Failure>((format!("ranked {} customers", views.len()), to_data(&views)?))
    });
    finish("best", result)
}

pub fn show(options: &LoadOptions, id: i64) -> CommandResult {
    let result = run_with_database("show", options, |pool| async move {
        let customers = SqlCustomerRepository::new(pool.clone());
        let reservations = SqlReservationRepository::new(pool);

        let customer = customers.get(CustomerId(id)).await.map_err(repository_failure)?;
        let held = reservations_for_customer(&customer, &reservations)
            .await
            .map_err(repository_failure)?;

        let detail = CustomerDetailView {
            customer: CustomerView::from(&customer),
            reservations: held.iter().map(ReservationView::from).collect(),
        };
        Ok::<_, Failure>((
            format!("{} holds {} reservations", customer.full_name(), held.len()),
            to_data(&detail)?,
        ))
    });
    finish("show", result)
}

pub fn add(
    options: &LoadOptions,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    notes: Option<String>,
) -> CommandResult {
    let draft = NewCustomer::new(first_name, last_name, phone, notes);
    let result = run_with_database("add-customer", options, |pool| async move {
        let customer =
            SqlCustomerRepository::new(pool).create(draft).await.map_err(repository_failure)?;
        Ok::<_, Failure>((
            format!("created customer {} ({})", customer.id, customer.full_name()),
            to_data(&CustomerView::from(&customer))?,
        ))
    });
    finish("add-customer", result)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use lunchly_core::domain::customer::{BestCustomer, Customer, CustomerId};
    use lunchly_core::domain::reservation::{Reservation, ReservationId};

    use super::{CustomerView, RankedCustomerView, ReservationView};

    #[test]
    fn ranked_view_flattens_customer_fields() {
        let entry = BestCustomer {
            customer: Customer::new(CustomerId(4), "Katherine", "Johnson", None, None),
            reservation_count: 4,
        };

        let value = serde_json::to_value(RankedCustomerView::from(&entry)).expect("json");

        assert_eq!(value["id"], 4);
        assert_eq!(value["full_name"], "Katherine Johnson");
        assert_eq!(value["reservation_count"], 4);
        assert_eq!(value["notes"], "");
    }

    #[test]
    fn reservation_view_includes_formatted_start() {
        let start_at = NaiveDate::from_ymd_opt(2021, 3, 3)
            .and_then(|date| date.and_hms_opt(17, 30, 0))
            .expect("valid timestamp");
        let reservation =
            Reservation::new(ReservationId(1), CustomerId(1), 2, start_at, None).expect("valid");

        let value = serde_json::to_value(ReservationView::from(&reservation)).expect("json");

        assert_eq!(value["start_at"], "2021-03-03T17:30:00");
        assert_eq!(value["formatted_start_at"], "March 3rd 2021, 5:30 pm");
    }

    #[test]
    fn customer_view_carries_phone() {
        let customer =
            Customer::new(CustomerId(1), "Ada", "Lovelace", Some("555".to_string()), None);
        let value = serde_json::to_value(CustomerView::from(&customer)).expect("json");
        assert_eq!(value["phone"], "555");
    }
}
