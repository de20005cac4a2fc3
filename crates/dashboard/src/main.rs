use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfwatch_client::api::{DashboardApi, UploadFile};
use shelfwatch_client::bridge::LiveUpdateBridge;
use shelfwatch_client::dashboard::{Dashboard, DashboardOptions};
use shelfwatch_client::push::PushClient;
use shelfwatch_core::gate::Decision;
use shelfwatch_dashboard::config::DashboardConfig;
use shelfwatch_dashboard::console::{
    Command, CommandError, ConsoleInput, ConsolePresenter, StdinPrompt, HELP,
};

/// How long background tasks get to wind down after cancellation.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfwatch_dashboard=info,shelfwatch_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = DashboardConfig::from_env().context("Invalid dashboard configuration")?;
    tracing::info!(
        api_url = %config.api_url,
        push_url = %config.push_url,
        page_size = config.page_size,
        poll_interval_secs = config.poll_interval.as_secs(),
        "Loaded dashboard configuration",
    );

    // --- Controller ---
    let api = DashboardApi::new(config.api_url.clone(), config.request_timeout)
        .context("Failed to build HTTP client")?;
    let input = ConsoleInput::stdin();
    let dashboard = Dashboard::new(
        Arc::new(api),
        Arc::new(ConsolePresenter),
        Arc::new(StdinPrompt::new(input.clone())),
        DashboardOptions {
            page_size: config.page_size,
            poll_interval: config.poll_interval,
            new_event_window: config.new_event_window(),
        },
    )?;

    if let Err(e) = dashboard.initialize().await {
        tracing::error!(error = %e, "Initial load failed, will retry on next poll");
    }

    // --- Background tasks ---
    let cancel = CancellationToken::new();

    let poller_handle = {
        let dashboard = Arc::clone(&dashboard);
        let cancel = cancel.clone();
        tokio::spawn(async move { dashboard.run_poller(cancel).await })
    };

    let bridge_handle = {
        let bridge = LiveUpdateBridge::new(PushClient::new(config.push_url.clone()), Arc::clone(&dashboard));
        let cancel = cancel.clone();
        tokio::spawn(async move { bridge.run(cancel).await })
    };

    tracing::info!("Dashboard started (poller, live updates)");
    println!("{HELP}");

    tokio::select! {
        () = command_loop(&dashboard, &input) => {
            tracing::info!("Leaving dashboard");
        }
        () = shutdown_signal() => {}
    }

    // --- Shutdown ---
    cancel.cancel();
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, poller_handle).await;
    let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, bridge_handle).await;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Read and run commands until `quit` is confirmed or stdin closes.
async fn command_loop(dashboard: &Dashboard, input: &ConsoleInput) {
    while let Some(line) = input.next_line().await {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        if command == Command::Quit {
            if dashboard.navigate_away().await == Decision::Proceed {
                return;
            }
            continue;
        }

        if let Err(e) = run_command(dashboard, command).await {
            tracing::warn!(error = %e, "Command failed");
        }
    }
    tracing::info!("Input closed");
}

async fn run_command(dashboard: &Dashboard, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Next => {
            if !dashboard.next_page().await? {
                println!("Already on the last page");
            }
        }
        Command::Prev => {
            if !dashboard.prev_page().await? {
                println!("Already on the first page");
            }
        }
        Command::Refresh => {
            if let Err(e) = dashboard.refresh_summary().await {
                tracing::debug!(error = %e, "Summary refresh failed");
            }
            dashboard.refresh_events().await?;
        }
        Command::Upload(path) => {
            // An unreadable file still goes through the gate, then fails
            // as a missing image.
            let mut pending = match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let file_name = Path::new(&path)
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.clone());
                    Some(UploadFile::new(file_name, bytes))
                }
                Err(e) => {
                    tracing::error!(%path, error = %e, "Failed to read image file");
                    None
                }
            };
            dashboard.upload(&mut pending).await?;
        }
        Command::Feedback(feedback) => {
            dashboard.submit_feedback(feedback).await?;
        }
        Command::View(id) => {
            dashboard.view_event_details(id).await?;
        }
        Command::Products => {
            dashboard.all_products().await?;
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
