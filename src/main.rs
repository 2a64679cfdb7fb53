//! Reading Coach - a reading-practice aid driven by speech recognition.
//!
//! Loads a passage, consumes recognizer and synthesizer events from a host
//! event script, tracks which words have been read with fuzzy matching, and
//! prints what the page should show after every event.

mod config;
mod error;
mod host;
mod matching;
mod session;
mod stt;
mod tts;

use anyhow::Result;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use config::AppConfig;
use host::{Printer, RestartTimer, describe, spawn_script_reader};
use session::{Effect, HostEvent, Session};

/// Capacity of the host event channel.
const EVENT_CHANNEL_SIZE: usize = 32;

/// Carry out the effects the session asked for.
///
/// The recognizer and synthesizer live in the host, so apart from the
/// restart timer these are reported rather than performed.
fn apply_effects(effects: &[Effect], timer: &mut RestartTimer) {
    for effect in effects {
        match effect {
            Effect::ScheduleRestart { delay_ms } => timer.schedule(std::time::Duration::from_millis(*delay_ms)),
            Effect::CancelRestart | Effect::StopRecognizer => {
                timer.cancel();
                debug!("Host: {}", describe(effect));
            }
            Effect::Notify { message, recoverable } => {
                if *recoverable {
                    warn!("⚠️  {}", message);
                } else {
                    error!("❌ {}", message);
                }
            }
            Effect::Progress { .. } => debug!("Progress: {}", describe(effect)),
            _ => info!("Host: {}", describe(effect)),
        }
    }
}

/// Handle one event, apply its effects and print the snapshot.
fn step(session: &mut Session, event: HostEvent, timer: &mut RestartTimer, printer: &Printer) -> Result<()> {
    let effects = session.handle(event);
    apply_effects(&effects, timer);
    printer.print(&session.view(), &effects)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn wait_for_shutdown(shutdown: CancellationToken) {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("🛑 Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("🛑 Received SIGTERM, shutting down...");
        }
    }

    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info.
    // Logs go to stderr; stdout carries the snapshots.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| if config.verbose { EnvFilter::try_new("debug") } else { EnvFilter::try_new("info") })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("📖 Reading Coach v{}", env!("CARGO_PKG_VERSION"));

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("❌ Configuration error: {}", e);
        std::process::exit(1);
    }
    config.log_config();

    let printer = Printer::new(config.output);
    let mut session = Session::new(config.session_settings());

    let (event_tx, mut event_rx) = mpsc::channel::<HostEvent>(EVENT_CHANNEL_SIZE);
    let mut timer = RestartTimer::new(event_tx.downgrade());
    let shutdown = CancellationToken::new();

    let startup = session.startup();
    apply_effects(&startup, &mut timer);
    printer.print(&session.view(), &startup)?;

    if let Some(text) = config.initial_text()? {
        step(&mut session, HostEvent::LoadText { text }, &mut timer, &printer)?;
        if config.auto_start {
            step(&mut session, HostEvent::StartListening, &mut timer, &printer)?;
        }
    }

    // The reader owns the only strong sender besides armed timers, so the
    // channel closes once the script ends and no restart is pending.
    let reader_handle = spawn_script_reader(config.script.clone(), event_tx, shutdown.clone());
    let signal_handle = tokio::spawn(wait_for_shutdown(shutdown.clone()));

    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = event_rx.recv() => event,
        };

        match event {
            Some(event) => step(&mut session, event, &mut timer, &printer)?,
            None => {
                debug!("Event channel closed");
                break;
            }
        }
    }

    timer.cancel();
    shutdown.cancel();
    signal_handle.abort();
    if let Err(e) = reader_handle.await {
        debug!("Script reader ended abnormally: {}", e);
    }

    let view = session.view();
    info!("✅ Reading coach stopped at {}/{} words ({}%)", view.cursor, view.total, view.progress);
    Ok(())
}
