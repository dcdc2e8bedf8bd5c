use clap::Parser;
use log::*;
use service::{config::Config, logging::Logger};

/// Creates a weather station user in the configured database.
#[derive(Debug, Parser)]
#[command(name = "create_user")]
struct CreateUserArgs {
    /// Login name of the new user
    #[arg(long)]
    username: String,

    /// Plain text password; only its hash is stored
    #[arg(long)]
    password: String,

    /// Grant read and write access to every sensor
    #[arg(long, default_value_t = false)]
    superuser: bool,

    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = CreateUserArgs::parse();
    if let Err(e) = Logger::init_logger(&args.config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    let db = match service::init_database(&args.config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    match domain::user::find_by_username(&db, &args.username).await {
        Ok(Some(_)) => {
            error!("User {} already exists", args.username);
            std::process::exit(1);
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to look up user {}: {e}", args.username);
            std::process::exit(1);
        }
    }

    match domain::user::create(&db, &args.username, &args.password, args.superuser).await {
        Ok(user) => info!(
            "Created user {} with id {} (superuser: {})",
            user.username, user.id, user.superuser
        ),
        Err(e) => {
            error!("Failed to create user {}: {e}", args.username);
            std::process::exit(1);
        }
    }
}
