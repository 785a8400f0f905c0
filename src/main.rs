use colored::Colorize;
use procom::{AppResult, cli::Cli, config::Config, init_logging, relay::SessionManager};

#[tokio::main]
async fn main() {
    match run().await {
        // Exit without draining the runtime's blocking pool; a terminal
        // read may still be in flight after an interrupt.
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{} {}", "procom:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(&cli.effective_log_level())?;

    tracing::info!("Procom relay starting...");
    tracing::debug!("CLI arguments: {:?}", cli);

    // Load configuration
    let config = Config::load_or_default(&cli.config_file);

    if cli.is_dry_run_mode() {
        return run_dry_run(&cli, &config);
    }

    // Create session manager
    let mut session_manager = SessionManager::new(&cli, &config);

    // Open the configured endpoints
    session_manager.initialize().await?;

    // Run both pumps until the session winds down
    let report = session_manager.run().await?;

    tracing::info!("Session finished: {:?}", report.status);

    Ok(())
}

/// Dry-run mode: resolve and print the route plan without opening anything
fn run_dry_run(cli: &Cli, config: &Config) -> AppResult<()> {
    use procom::relay::{RoutePlan, SessionConfig};

    let session_config = SessionConfig::from_sources(cli, config);
    let plan = RoutePlan::resolve(session_config.topology());

    println!("Dry-run mode configuration:");
    println!("Config file: {}", cli.config_file);
    println!("Log level: {}", cli.effective_log_level());
    println!("Route plan:");
    println!("  inbound:  {} -> {}", plan.inbound.source, plan.inbound.sink);
    match plan.outbound {
        Some(route) => println!("  outbound: {} -> {}", route.source, route.sink),
        None => println!("  outbound: (none)"),
    }

    Ok(())
}
