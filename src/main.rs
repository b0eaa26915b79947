//! Main entry point for the fan daemon

use anyhow::Context;
use clap::Parser;
use ecfand::{
    args::Args,
    config::PollingConfig,
    daemon::{detach, FanDaemon},
    logging,
    port::DevPort,
    shutdown::{install_signal_handlers, ShutdownSignal},
    status_log::StatusLog,
};
use log::{error, info};

/// Exit status for failures before the control loop starts
const STARTUP_FAILURE_EXIT_CODE: i32 = -1;

fn main() {
    // Unknown options make clap print usage and exit non-zero
    let args = Args::parse();

    if let Err(e) = logging::setup(args.verbose, !args.daemonize) {
        eprintln!("Failed to set up logging: {}", e);
        std::process::exit(STARTUP_FAILURE_EXIT_CODE);
    }

    info!(
        "ecfand v{} (git {}) built {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("unknown"),
        option_env!("BUILD_TIME").unwrap_or("unknown")
    );

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("ecfand: {:#}", e);
            std::process::exit(STARTUP_FAILURE_EXIT_CODE);
        }
    }
}

fn run(args: Args) -> anyhow::Result<i32> {
    let config = PollingConfig::from_args(&args)?;

    let port = DevPort::open(&config.port_path).context("Cannot access hardware port")?;
    let status = if config.logging {
        StatusLog::open(&config.log_path, config.console())?
    } else {
        StatusLog::disabled()
    };

    // Fork before the runtime exists; the child keeps both handles
    if config.daemonize {
        detach::detach()?;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(async move {
        let shutdown = ShutdownSignal::new();
        install_signal_handlers(shutdown.clone()).context("Failed to install signal handlers")?;

        let mut daemon = FanDaemon::new(config, port, status, shutdown).await;
        let reason = daemon.run().await;
        Ok::<i32, anyhow::Error>(daemon.shut_down(reason))
    })
}
