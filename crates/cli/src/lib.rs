pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "folio",
    about = "Folio operator CLI",
    long_about = "Operate folio: apply migrations, inspect configuration, check readiness and provision logins.",
    after_help = "Examples:\n  folio doctor --json\n  folio config\n  folio user add --email ada@example.com --name Ada --password '...'"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, generation credential, and database readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "Manage login accounts")]
    User(UserCommand),
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    #[command(about = "Create a login that can sign in to the web app")]
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::User(UserCommand::Add { email, name, password }) => {
            commands::user::add(&email, &name, &password)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
