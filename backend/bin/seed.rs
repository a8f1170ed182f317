use anyhow::Result;
use campusnet::db::{DatabaseConfig, get_db_pool, profiles};
use campusnet::utils::init_logging;
use clap::{Arg, Command};
use tracing::{info, warn};

/// Seeds demo profiles for local development.
#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let matches = Command::new("seed")
        .about("Insert demo user profiles for local development")
        .arg(
            Arg::new("university")
                .long("university")
                .help("University assigned to the demo profiles")
                .default_value("Demo University"),
        )
        .get_matches();

    let university = matches
        .get_one::<String>("university")
        .map(String::as_str)
        .unwrap_or("Demo University");

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    let demo = [
        ("alice", "Alice Ahmed"),
        ("bob", "Bob Berg"),
        ("carol", "Carol Costa"),
        ("dan", "Dan Dorn"),
        ("eve", "Eve Eriksen"),
    ];

    for (username, full_name) in demo {
        match profiles::create_profile(&pool, username, full_name, Some(university)).await {
            Ok(profile) => info!(id = profile.id, username, "created demo profile"),
            Err(err) => warn!(username, error = %err, "skipping demo profile"),
        }
    }

    Ok(())
}
