//! `AutoElite` CLI - Database migrations and seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! ae-cli migrate
//!
//! # Create the demo customer (alice / password123)
//! ae-cli seed user
//!
//! # Create a specific customer
//! ae-cli seed user -u bob -n "Bob Tan" -e bob@example.com -p hunter22
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed user` - Create a customer account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ae-cli")]
#[command(author, version, about = "AutoElite CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create a customer account
    User {
        /// Login name (at most 10 characters)
        #[arg(short, long, default_value = "alice")]
        username: String,

        /// Display name
        #[arg(short = 'n', long, default_value = "Alice Lim")]
        fullname: String,

        /// Email address
        #[arg(short, long, default_value = "alice@example.com")]
        email: String,

        /// Plain-text password, hashed before storage
        #[arg(short, long, default_value = "password123")]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::User {
                username,
                fullname,
                email,
                password,
            } => {
                commands::seed::user(&username, &fullname, &email, &password).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_seed_user_defaults() {
        let cli = Cli::try_parse_from(["ae-cli", "seed", "user"]);
        let Ok(Cli {
            command: Commands::Seed {
                target: SeedTarget::User { username, password, .. },
            },
        }) = cli
        else {
            panic!("expected seed user command");
        };
        assert_eq!(username, "alice");
        assert_eq!(password, "password123");
    }
}
