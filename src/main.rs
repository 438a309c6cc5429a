//! `location-client` command line.
//!
//! Thin shell over `LocationClient`: every subcommand maps onto one library
//! operation and prints its result as pretty JSON. The session token is kept
//! in the file token store between invocations.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use location_client::config::{load_or_default, validation::validate_config, ConfigError};
use location_client::observability::logging;
use location_client::LocationClient;

#[derive(Parser)]
#[command(name = "location-client")]
#[command(about = "Client for the location rating API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(short, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login { username: String, password: String },
    /// Create an account
    Register {
        username: String,
        email: String,
        password: String,
        password_confirmation: String,
    },
    /// End the session
    Logout,
    /// Show the user for the stored token
    Whoami,
    /// List all locations
    Locations {
        /// Compute average ratings for each location
        #[arg(long)]
        with_ratings: bool,
    },
    /// Show one location
    Location { id: i64 },
    /// Show the best-rated location
    Best,
    /// List ratings for a location
    Ratings { location_id: i64 },
    /// Rate a location (1-5 stars)
    Rate {
        location_id: i64,
        stars: i32,
        #[arg(default_value = "")]
        comment: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.api.base_url = url;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_logging(&config.observability.log_level);
    tracing::debug!(base_url = %config.api.base_url, "Configuration loaded");

    let client = LocationClient::from_config(&config)?;
    let session = client.session();
    let resources = client.resources();

    match cli.command {
        Commands::Login { username, password } => {
            let session = session.login(&username, &password).await?;
            print_json(&session.user)?;
        }
        Commands::Register {
            username,
            email,
            password,
            password_confirmation,
        } => {
            if !session
                .register(&username, &email, &password, &password_confirmation)
                .await
            {
                return Err("registration failed".into());
            }
            println!("Registered {}", username);
        }
        Commands::Logout => {
            session.logout().await;
            println!("Logged out");
        }
        Commands::Whoami => match session.refresh_current_user().await {
            Some(user) => print_json(&user)?,
            None => return Err("not logged in".into()),
        },
        Commands::Locations { with_ratings } => {
            let locations = if with_ratings {
                client.aggregation().aggregate().await?
            } else {
                resources.list_locations().await?
            };
            print_json(&locations)?;
        }
        Commands::Location { id } => match resources.get_location(id).await? {
            Some(location) => print_json(&location)?,
            None => return Err(format!("location {} not found", id).into()),
        },
        Commands::Best => match resources.get_best_rated_location().await? {
            Some(location) => print_json(&location)?,
            None => return Err("no rated locations".into()),
        },
        Commands::Ratings { location_id } => {
            print_json(&resources.list_ratings_for_location(location_id).await?)?;
        }
        Commands::Rate {
            location_id,
            stars,
            comment,
        } => match resources.submit_rating(location_id, stars, &comment).await? {
            Some(rating) => print_json(&rating)?,
            None => println!("Rating submitted"),
        },
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_keeps_confirmation_separate() {
        let cli = Cli::try_parse_from(["location-client", "register", "ana", "ana@example.com", "pw1", "pw2"])
            .unwrap();
        match cli.command {
            Commands::Register {
                password,
                password_confirmation,
                ..
            } => {
                assert_eq!(password, "pw1");
                assert_eq!(password_confirmation, "pw2");
            }
            _ => panic!("expected register"),
        }
    }

    #[test]
    fn test_register_requires_confirmation() {
        assert!(Cli::try_parse_from(["location-client", "register", "ana", "ana@example.com", "pw1"]).is_err());
    }

    #[test]
    fn test_global_flags_and_rate_comment_default() {
        let cli = Cli::try_parse_from(["location-client", "--url", "http://api.test/", "rate", "3", "5"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://api.test/"));
        assert!(matches!(
            cli.command,
            Commands::Rate { location_id: 3, stars: 5, ref comment } if comment.is_empty()
        ));
    }
}
