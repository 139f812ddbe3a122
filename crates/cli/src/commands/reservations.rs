use chrono::NaiveDateTime;

use lunchly_core::config::LoadOptions;
use lunchly_core::domain::customer::CustomerId;
use lunchly_core::domain::reservation::ReservationDraft;
use lunchly_db::{
    CustomerRepository, ReservationRepository, SqlCustomerRepository, SqlReservationRepository,
};

use crate::commands::customers::ReservationView;
use crate::commands::{repository_failure, run_with_database, to_data, CommandResult, Failure};

const START_AT_FORMATS: [&str; 4] =
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses the `--start-at` argument into a local date-time.
pub fn parse_start_at(value: &str) -> Result<NaiveDateTime, String> {
    let trimmed = value.trim();
    START_AT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| {
            format!("start_at must be a date and time like 2021-03-03T17:30, got `{value}`")
        })
}

pub fn add(
    options: &LoadOptions,
    customer_id: i64,
    guests: i64,
    start_at: &str,
    notes: Option<String>,
) -> CommandResult {
    let draft = parse_start_at(start_at).and_then(|start_at| {
        ReservationDraft::for_customer(CustomerId(customer_id), guests, start_at, notes)
            .map_err(|error| error.to_string())
    });
    let draft = match draft {
        Ok(draft) => draft,
        Err(message) => {
            return CommandResult::failure("add-reservation", "invalid_input", message, 8);
        }
    };

    let result = run_with_database("add-reservation", options, |pool| async move {
        let customer = SqlCustomerRepository::new(pool.clone())
            .get(CustomerId(customer_id))
            .await
            .map_err(repository_failure)?;
        let reservation = SqlReservationRepository::new(pool)
            .create(draft)
            .await
            .map_err(repository_failure)?;

        Ok::<_, Failure>((
            format!(
                "reserved a table for {} on {}",
                customer.full_name(),
                reservation.formatted_start_at()
            ),
            to_data(&ReservationView::from(&reservation))?,
        ))
    });

    match result {
        Ok((message, data)) => CommandResult::success_with_data("add-reservation", message, data),
        Err(failure) => failure,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::parse_start_at;

    #[test]
    fn parses_supported_start_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 3)
            .and_then(|date| date.and_hms_opt(17, 30, 0))
            .expect("valid timestamp");

        let inputs =
            ["2021-03-03T17:30:00", "2021-03-03T17:30", "2021-03-03 17:30", " 2021-03-03 17:30:00 "];
        for input in inputs {
            assert_eq!(parse_start_at(input), Ok(expected), "input `{input}`");
        }
    }

    #[test]
    fn rejects_non_datetime_input() {
        for input in ["tomorrow", "1614792600", "2021-03-03", ""] {
            assert!(parse_start_at(input).is_err(), "input `{input}` should be rejected");
        }
    }
}
