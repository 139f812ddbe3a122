pub mod config;
pub mod customers;
pub mod migrate;
pub mod reservations;
pub mod seed;

use std::future::Future;

use lunchly_core::config::{AppConfig, ConfigError, LoadOptions};
use lunchly_db::{connect_with_settings, migrations, DbPool, RepositoryError};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Error class, message and exit code of a failed command.
pub(crate) type Failure = (&'static str, String, u8);

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::with_outcome(command, "ok", None, message.into(), None, 0)
    }

    pub fn success_with_data(command: &str, message: impl Into<String>, data: Value) -> Self {
        Self::with_outcome(command, "ok", None, message.into(), Some(data), 0)
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::with_outcome(
            command,
            "error",
            Some(error_class.to_string()),
            message.into(),
            None,
            exit_code,
        )
    }

    fn with_outcome(
        command: &str,
        status: &str,
        error_class: Option<String>,
        message: String,
        data: Option<Value>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: status.to_string(),
            error_class,
            message,
            data,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads config, opens the pool, applies migrations and runs `action` on a
/// current-thread runtime. The pool is closed before returning.
pub(crate) fn run_with_database<T, F, Fut>(
    command: &str,
    options: &LoadOptions,
    action: F,
) -> Result<T, CommandResult>
where
    F: FnOnce(DbPool) -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
{
    let config = AppConfig::load(options.clone())
        .map_err(|error| config_failure(command, &error))?;

    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        })?;

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let outcome = action(pool.clone()).await;
        pool.close().await;
        outcome
    });

    result.map_err(|(error_class, message, exit_code)| {
        CommandResult::failure(command, error_class, message, exit_code)
    })
}

pub(crate) fn config_failure(command: &str, error: &ConfigError) -> CommandResult {
    CommandResult::failure(
        command,
        "config_validation",
        format!("configuration issue: {error}"),
        2,
    )
}

pub(crate) fn repository_failure(error: RepositoryError) -> Failure {
    match error {
        RepositoryError::NotFound { .. } => ("not_found", error.to_string(), 7),
        RepositoryError::Domain(_) => ("invalid_input", error.to_string(), 8),
        RepositoryError::Database(_) | RepositoryError::Decode(_) => {
            ("storage", error.to_string(), 6)
        }
    }
}

pub(crate) fn to_data<T: Serialize>(value: &T) -> Result<Value, Failure> {
    serde_json::to_value(value).map_err(|error| ("serialization", error.to_string(), 6))
}
