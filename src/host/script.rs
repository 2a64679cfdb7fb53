//! Host event script reader.
//!
//! Replays host events from a JSON-lines file (or stdin) into the session
//! channel. Blank lines and `#` comments are skipped; malformed lines are
//! logged and skipped.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::session::HostEvent;

/// Parse one script line.
///
/// # Returns
/// `None` for blank and comment lines, otherwise the parse result.
pub fn parse_line(line: &str) -> Option<serde_json::Result<HostEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(serde_json::from_str(line))
}

/// Lines buffered between the stdin thread and the reader task.
const STDIN_BUFFER: usize = 16;

/// Where script lines come from.
enum ScriptLines {
    File(Lines<BufReader<File>>),
    Stdin(mpsc::Receiver<io::Result<String>>),
}

impl ScriptLines {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        match self {
            ScriptLines::File(lines) => lines.next_line().await,
            ScriptLines::Stdin(rx) => rx.recv().await.transpose(),
        }
    }
}

/// Read stdin lines on a detached thread that runtime shutdown never waits
/// for. The thread exits once stdin ends or the receiver is gone.
fn spawn_stdin_lines() -> mpsc::Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel(STDIN_BUFFER);
    let spawned = thread::Builder::new().name("stdin-reader".to_string()).spawn(move || {
        for line in io::stdin().lock().lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    if let Err(e) = spawned {
        error!("❌ Failed to spawn stdin reader: {}", e);
    }
    rx
}

/// Spawn the task that feeds script events into the session channel.
///
/// # Arguments
/// * `script` - Script path, or `None` for stdin
/// * `event_tx` - Channel to the session task
/// * `shutdown` - Cancelled on Ctrl+C / SIGTERM
///
/// # Returns
/// Join handle for the spawned task
pub fn spawn_script_reader(script: Option<PathBuf>, event_tx: mpsc::Sender<HostEvent>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let lines = match script {
            Some(ref path) => match File::open(path).await {
                Ok(file) => ScriptLines::File(BufReader::new(file).lines()),
                Err(e) => {
                    error!("❌ Failed to open script {}: {}", path.display(), e);
                    return;
                }
            },
            None => ScriptLines::Stdin(spawn_stdin_lines()),
        };

        feed_events(lines, event_tx, shutdown).await;
    })
}

/// Forward parsed events until the lines run out, the session goes away or
/// shutdown is requested.
async fn feed_events(mut lines: ScriptLines, event_tx: mpsc::Sender<HostEvent>, shutdown: CancellationToken) {
    let mut line_no = 0usize;

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Script finished after {} lines", line_no);
                break;
            }
            Err(e) => {
                error!("❌ Failed to read script: {}", e);
                break;
            }
        };
        line_no += 1;

        match parse_line(&line) {
            None => continue,
            Some(Ok(event)) => {
                if event_tx.send(event).await.is_err() {
                    debug!("Session channel closed");
                    break;
                }
            }
            Some(Err(e)) => warn!("Skipping line {}: {}", line_no, e),
        }
    }
}
