use lunchly_core::config::LoadOptions;

use crate::commands::{run_with_database, CommandResult};

pub fn run(options: &LoadOptions) -> CommandResult {
    // Pending migrations are applied while the database is opened.
    match run_with_database("migrate", options, |_pool| async { Ok(()) }) {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => failure,
    }
}
