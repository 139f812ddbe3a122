pub mod commands;

use clap::{Parser, Subcommand};
use lunchly_core::config::{ConfigOverrides, LoadOptions, LogFormat};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "lunchly",
    about = "Lunchly customer and reservation CLI",
    long_about = "Apply migrations, load demo data, and query or record customers and reservations.",
    after_help = "Examples:\n  lunchly migrate\n  lunchly search ada\n  lunchly best\n  lunchly add-reservation --customer-id 1 --guests 2 --start-at 2021-03-03T17:30"
)]
pub struct Cli {
    #[arg(
        long = "config",
        global = true,
        value_name = "PATH",
        help = "Config file to load; must exist"
    )]
    config_file: Option<PathBuf>,
    #[arg(long, global = true, value_name = "URL", help = "Override database.url")]
    database_url: Option<String>,
    #[arg(long, global = true, value_name = "LEVEL", help = "Override logging.level")]
    log_level: Option<String>,
    #[arg(long, global = true, value_name = "FORMAT", help = "Override logging.format")]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    /// Config loading options taken from the global flags.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config_file.clone(),
            overrides: ConfigOverrides {
                database_url: self.database_url.clone(),
                log_level: self.log_level.clone(),
                log_format: self.log_format,
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo customers and reservations")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "List every customer ordered by last name, then first name")]
    Customers,
    #[command(about = "Find customers whose first or last name contains the given text")]
    Search {
        #[arg(help = "Case-insensitive name fragment")]
        text: String,
    },
    #[command(about = "Show the ten customers holding the most reservations")]
    Best,
    #[command(about = "Show one customer together with their reservations")]
    Show {
        #[arg(help = "Customer id")]
        id: i64,
    },
    #[command(about = "Record a new customer")]
    AddCustomer {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    #[command(about = "Record a new reservation for an existing customer")]
    AddReservation {
        #[arg(long)]
        customer_id: i64,
        #[arg(long, allow_negative_numbers = true)]
        guests: i64,
        #[arg(long, help = "Local start time, e.g. 2021-03-03T17:30")]
        start_at: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = execute(cli);
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Runs the parsed command and returns its JSON outcome.
pub fn execute(cli: Cli) -> commands::CommandResult {
    let options = cli.load_options();

    match cli.command {
        Command::Migrate => commands::migrate::run(&options),
        Command::Seed => commands::seed::run(&options),
        Command::Config => commands::config::run(&options),
        Command::Customers => commands::customers::list(&options),
        Command::Search { text } => commands::customers::search(&options, &text),
        Command::Best => commands::customers::best(&options),
        Command::Show { id } => commands::customers::show(&options, id),
        Command::AddCustomer { first_name, last_name, phone, notes } => {
            commands::customers::add(&options, first_name, last_name, phone, notes)
        }
        Command::AddReservation { customer_id, guests, start_at, notes } => {
            commands::reservations::add(&options, customer_id, guests, &start_at, notes)
        }
    }
}
