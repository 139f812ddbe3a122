use lunchly_core::config::{AppConfig, LoadOptions, ResolvedConfig, DATABASE_URL};
use serde::Serialize;

use crate::commands::{config_failure, to_data, CommandResult};

#[derive(Debug, Serialize)]
struct SettingView {
    key: &'static str,
    value: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct ConfigView {
    file: Option<String>,
    settings: Vec<SettingView>,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let resolved = match AppConfig::resolve(options.clone()) {
        Ok(resolved) => resolved,
        Err(error) => return config_failure("config", &error),
    };

    match to_data(&config_view(&resolved)) {
        Ok(data) => CommandResult::success_with_data(
            "config",
            "effective configuration (precedence: flag > env > file > default)",
            data,
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("config", error_class, message, exit_code)
        }
    }
}

fn config_view(resolved: &ResolvedConfig) -> ConfigView {
    let settings = resolved
        .entries()
        .into_iter()
        .map(|(key, value, source)| SettingView {
            key,
            value: if key == DATABASE_URL { redact_url(&value) } else { value },
            source: source.to_string(),
        })
        .collect();

    ConfigView { file: resolved.file.as_ref().map(|path| path.display().to_string()), settings }
}

/// Drops the query string from the displayed URL.
fn redact_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{base}?<redacted>"),
        None => url.to_string(),
    }
}
