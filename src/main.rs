//! Salon relay entry point.

use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use salon_relay::api::{cors_layer, create_router, AppState};
use salon_relay::config::Config;
use salon_relay::metrics;
use salon_relay::relay::{TelegramNotifier, YclientsCatalog};
use salon_relay::utils::{mask_secret, shutdown_signal};

/// Relay that hides Telegram and YCLIENTS credentials from the browser.
#[derive(Parser, Debug)]
#[command(name = "salon-relay")]
#[command(about = "Relays review notifications to Telegram and the service list from YCLIENTS")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP relay (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Send one review message through Telegram.
    SendReview {
        /// Message text.
        message: String,
    },

    /// Fetch the branch service list once and print it.
    FetchServices,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so LOG_JSON and RUST_LOG can live there
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();
    init_logging(args.verbose, args.log_json);

    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::SendReview { message }) => cmd_send_review(&message).await,
        Some(Command::FetchServices) => cmd_fetch_services().await,
        None => cmd_serve(args.port).await,
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("salon_relay=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Load and validate configuration, logging failures.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SALON RELAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Telegram API: {}", config.telegram_api_url);
    println!(
        "  Telegram Bot Token: {}",
        mask_secret(config.telegram_bot_token.expose_secret())
    );
    println!("  Telegram Chat ID: {}", config.telegram_chat_id);
    println!("  YCLIENTS API: {}", config.yclients_api_url);
    println!(
        "  YCLIENTS Partner Token: {}",
        mask_secret(config.yclients_partner_token.expose_secret())
    );
    println!("  YCLIENTS Branch ID: {}", config.yclients_branch_id);
    println!("  Upstream Timeout: {}ms", config.upstream_timeout_ms);
    println!("  Connect Timeout: {}ms", config.connect_timeout_ms);
    println!("  Listen: {}{}", config.bind_addr(), config.relay_path);
    println!("  CORS Origin: {}", config.cors_allow_origin);
    if config.cors_allow_origin == "*" {
        println!("  WARNING: any website can call this relay from a browser");
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Send one message through the notifier.
async fn cmd_send_review(message: &str) -> anyhow::Result<()> {
    let config = load_config()?;
    let notifier = TelegramNotifier::new(&config)?;

    println!("Sending review to chat {}...", notifier.chat_id());
    match notifier.send_message(message).await {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

/// Run the catalog relay once.
async fn cmd_fetch_services() -> anyhow::Result<()> {
    let config = load_config()?;
    let catalog = YclientsCatalog::new(&config)?;

    info!("Fetching services for branch {}", catalog.branch_id());
    let response = catalog.fetch_services().await?;

    if !response.status.is_success() {
        warn!("YCLIENTS answered {}", response.status);
    }
    println!("{}", String::from_utf8_lossy(&response.body));

    Ok(())
}

/// Run the HTTP relay until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;

    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }

    info!("Configuration loaded successfully");
    info!("Telegram chat: {}", config.telegram_chat_id);
    info!("YCLIENTS branch: {}", config.yclients_branch_id);
    info!("Upstream timeout: {}ms", config.upstream_timeout_ms);
    if config.cors_allow_origin == "*" {
        warn!("CORS allows any origin");
    }

    let mut app_state = AppState::new(
        TelegramNotifier::new(&config)?,
        YclientsCatalog::new(&config)?,
    );

    match metrics::init_metrics() {
        Ok(handle) => app_state = app_state.with_metrics(handle),
        Err(e) => warn!("Metrics disabled: {}", e),
    }

    let router = create_router(
        app_state,
        &config.relay_path,
        cors_layer(&config.cors_allow_origin)?,
    );

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}{}", addr, config.relay_path);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relay stopped");
    Ok(())
}
