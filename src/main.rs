use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use visrec::{
    ErrorExt, EventBusError, EventFilter, MonotonicClock, TracingInjector,
    UnavailableCaptureProvider, VisrecApp, VisrecConfig,
};

#[derive(Parser, Debug)]
#[command(name = "visrec")]
#[command(about = "Visual recognition and pointer macro engine")]
#[command(version)]
#[command(long_about = "Learns labelled screen regions and classifies new captures by nearest \
neighbour, and records pointer macros for timed replay. The host process restores saved \
state on start and writes it back on exit.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "visrec.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - build the controller and restore state, then exit
    #[arg(long, help = "Perform dry run - restore saved state but don't wait for input")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args);

    info!("Starting visrec v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match VisrecConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let app = VisrecApp::builder(config)
        .with_capture_provider(Arc::new(UnavailableCaptureProvider))
        .with_input_injector(Arc::new(TracingInjector))
        .with_clock(Arc::new(MonotonicClock::new()))
        .with_debug_events(args.debug)
        .build()
        .map_err(|e| {
            error!("Failed to build controller: {}", e);
            e
        })?;

    // Headless stand-in for the status line: every event goes to the log
    let mut status = app.subscribe_filtered(EventFilter::All, "status");
    tokio::spawn(async move {
        loop {
            match status.recv().await {
                Ok(event) => info!("{}", event.description()),
                Err(EventBusError::ChannelClosed) => break,
                Err(e) => warn!("Status log skipped events: {}", e),
            }
        }
    });

    // A bad snapshot is not fatal: the engines keep their empty state
    if let Err(e) = app.load_snapshot().await {
        warn!("{}, continuing without it ({})", e.user_message(), e);
    }

    if args.dry_run {
        info!("Dry run mode - state restored, not waiting for input");
        println!("✓ Dry run completed successfully");
        return Ok(());
    }

    let exit_code = app.run().await.map_err(|e| {
        error!("System error during execution: {}", e);
        e
    })?;

    info!("Visrec exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("visrec={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Visrec Configuration File");
    println!("# This is the default configuration with all available options");
    println!();
    println!("{}", toml::to_string_pretty(&VisrecConfig::default())?);
    Ok(())
}
