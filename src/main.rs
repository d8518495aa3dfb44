use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use photofolio::{
    AppState, Config,
    admin::{AdminStore, MIN_PASSWORD_LENGTH, hash_password},
    create_app, database, startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server (default if no command specified)
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long)]
        host: Option<String>,

        /// Automatically quit after specified number of seconds (useful for testing)
        #[arg(long)]
        quit_after: Option<u64>,
    },

    /// Manage admin accounts
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand, Debug)]
enum AdminCommands {
    /// Create an admin, or reset the password of an existing one
    Create {
        username: String,
        /// Read from stdin when omitted
        password: Option<String>,
    },
    /// List admin accounts
    List,
    /// Remove an admin account
    Remove { username: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli.config)?;

    match cli.command {
        Some(Commands::Admin(admin_cmd)) => handle_admin_command(config, admin_cmd).await,
        Some(Commands::Serve {
            port,
            host,
            quit_after,
        }) => run_server(config, port, host, quit_after).await,
        None => run_server(config, None, None, None).await,
    }
}

fn load_config(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        let config_content = std::fs::read_to_string(config_path)?;
        info!("Configuration loaded from: {:?}", config_path);
        toml_edit::de::from_str::<Config>(&config_content)?
    } else {
        info!("Config file not found at {:?}, using defaults", config_path);
        Config::default()
    };

    config.apply_env_overrides();
    Ok(config)
}

async fn handle_admin_command(
    config: Config,
    cmd: AdminCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let pool = database::connect(&config.database).await?;
    let admins = AdminStore::new(pool);

    match cmd {
        AdminCommands::Create { username, password } => {
            let username = username.trim().to_string();
            if username.is_empty() {
                eprintln!("Error: Username cannot be empty");
                std::process::exit(1);
            }

            let password = match password {
                Some(password) => password,
                None => read_password_from_stdin()?,
            };
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                eprintln!(
                    "Error: Password must be at least {} characters",
                    MIN_PASSWORD_LENGTH
                );
                std::process::exit(1);
            }

            let password_hash = hash_password(&password)?;
            let user = admins.upsert(&username, &password_hash).await?;
            println!("Saved admin '{}' (id {})", user.username, user.id);
        }
        AdminCommands::List => {
            let users = admins.list().await?;
            if users.is_empty() {
                println!("No admin accounts");
            } else {
                println!("Admin accounts:");
                for user in users {
                    println!("  {} (created {})", user.username, user.created_at.to_rfc3339());
                }
            }
        }
        AdminCommands::Remove { username } => {
            let username = username.trim();
            if admins.remove(username).await? {
                println!("Removed admin '{}'", username);
            } else {
                eprintln!("Error: Admin '{}' not found", username);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn read_password_from_stdin() -> Result<String, Box<dyn std::error::Error>> {
    eprintln!("Password:");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn run_server(
    config: Config,
    port: Option<u16>,
    host: Option<String>,
    quit_after: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = host.unwrap_or(config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info!("Starting {} server", config.app.name);
    info!("Template directory: {:?}", config.templates.directory);
    info!("Database: {}", config.database.url);

    if let Err(errors) = startup_checks::perform_startup_checks(&config).await {
        for error in &errors {
            tracing::error!("Startup check failed: {}", error);
        }
        return Err("Critical startup check failed".into());
    }

    let pool = database::connect(&config.database).await?;
    let app_state = AppState::new(config, pool.clone())?;
    let app = create_app(app_state);

    let addr = SocketAddr::from((host.parse::<std::net::IpAddr>()?, port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, app);
    let graceful = server.with_graceful_shutdown(shutdown_signal(quit_after));

    if let Err(e) = graceful.await {
        tracing::error!("Server error: {}", e);
    }

    info!("Shutting down - closing database pool...");
    pool.close().await;

    Ok(())
}

async fn shutdown_signal(quit_after: Option<u64>) {
    use tokio::signal;
    use tokio::time::{Duration, sleep};

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_timer = async {
        if let Some(seconds) = quit_after {
            info!(
                "Server will automatically shut down after {} seconds",
                seconds
            );
            sleep(Duration::from_secs(seconds)).await;
            info!("Quit timer expired, shutting down");
        } else {
            std::future::pending::<()>().await
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        },
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        },
        _ = quit_timer => {},
    }
}
