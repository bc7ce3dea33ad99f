use anyhow::Result;
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
};
use rigpoller::*;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Logs go to the configured file, else stderr. Stderr defaults to warnings only so the
/// console view isn't overwritten.
fn init_logging(logging: &config::LoggingConfig) -> Result<()> {
    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::fmt()
                .with_timer(LocalTimer)
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            tracing_subscriber::fmt()
                .with_timer(LocalTimer)
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Raw mode + alternate screen for the lifetime of the process; restored on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        execute!(
            std::io::stdout(),
            EnterAlternateScreen,
            Hide,
            SetTitle(version::window_title())
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(std::io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = config::AppConfig::load()?;
    init_logging(&app_config.logging)?;

    let ctx = Arc::new(context::MonitorContext::from_config(&app_config));
    tracing::info!(
        rigs = ctx.rigs.len(),
        timeout_ms = app_config.polling.timeout_ms,
        tick_interval_ms = app_config.polling.tick_interval_ms,
        read_mode = ?app_config.polling.read_mode,
        "starting {} v{}",
        version::NAME,
        version::VERSION
    );

    let terminal = TerminalGuard::enter()?;

    let (quit_tx, mut quit_rx) = mpsc::channel::<()>(1);
    let input_handle = input::spawn_listener(ctx.view.clone(), quit_tx);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let controller_handle = controller::spawn(
        controller::ViewController::new(ctx.clone()),
        render::TerminalRenderer::new(
            std::io::stdout(),
            app_config.display.low_hashrate_threshold_percent,
        ),
        app_config.polling.tick_interval(),
        shutdown_rx,
    );

    tokio::select! {
        _ = quit_rx.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }

    // Quit does not wait for an in-flight sweep.
    tracing::info!("Exiting...");
    let _ = shutdown_tx.send(());
    controller_handle.abort();
    input_handle.abort();
    drop(terminal);

    Ok(())
}
