use lunchly_core::config::LoadOptions;
use lunchly_db::{DemoDataset, SeedResult};

use crate::commands::{repository_failure, run_with_database, to_data, CommandResult, Failure};

pub fn run(options: &LoadOptions) -> CommandResult {
    let result = run_with_database("seed", options, |pool| async move {
        let seeded = DemoDataset::load(&pool).await.map_err(repository_failure)?;

        let verification = DemoDataset::verify(&pool).await.map_err(repository_failure)?;
        if !verification.all_present {
            let failed_checks = verification
                .checks
                .iter()
                .filter_map(|(check, passed)| (!passed).then_some(*check))
                .collect::<Vec<_>>();
            return Err(("seed_verification", verification_message(&failed_checks), 6u8));
        }

        let data = to_data(&seeded)?;
        Ok::<(SeedResult, _), Failure>((seeded, data))
    });

    match result {
        Ok((seeded, data)) => CommandResult::success_with_data(
            "seed",
            format!(
                "demo dataset loaded: {} customers and {} reservations added",
                seeded.customers_added, seeded.reservations_added
            ),
            data,
        ),
        Err(failure) => failure,
    }
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        assert_eq!(
            verification_message(&["demo-customers", "demo-reservations"]),
            "Seed verification failed for checks: demo-customers, demo-reservations"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_message(&[]), "Some seed data failed to load");
    }
}
