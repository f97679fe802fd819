//! Spinner shown on stderr while requests are in flight

use is_terminal::IsTerminal;
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::watch;

const SPINNER_CHARS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const SPINNER_INTERVAL: Duration = Duration::from_millis(80);

/// Animated progress line; stops and clears itself when dropped.
/// Does nothing when stderr is not a terminal.
pub struct Spinner {
    message_tx: Option<watch::Sender<String>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    pub fn start(message: impl Into<String>) -> Self {
        if !io::stderr().is_terminal() {
            return Self {
                message_tx: None,
                handle: None,
            };
        }

        let (message_tx, message_rx) = watch::channel(message.into());
        let handle = tokio::spawn(Self::run_spinner(message_rx));

        Self {
            message_tx: Some(message_tx),
            handle: Some(handle),
        }
    }

    /// Replace the text next to the spinner
    pub fn set_message(&self, message: impl Into<String>) {
        if let Some(tx) = &self.message_tx {
            let _ = tx.send(message.into());
        }
    }

    pub fn stop(mut self) {
        self.stop_internal();
    }

    fn stop_internal(&mut self) {
        // Dropping the sender ends the loop on its next tick
        let running = self.message_tx.take().is_some();

        if let Some(handle) = self.handle.take() {
            handle.abort();
        }

        if running {
            Self::clear_line();
        }
    }

    async fn run_spinner(mut message_rx: watch::Receiver<String>) {
        let mut frame = 0;
        let mut stderr = io::stderr();

        loop {
            let spinner_char = SPINNER_CHARS[frame % SPINNER_CHARS.len()];
            let message = message_rx.borrow().clone();
            let _ = write!(stderr, "\r\x1b[K{} {}", spinner_char, message);
            let _ = stderr.flush();

            frame += 1;

            tokio::select! {
                _ = tokio::time::sleep(SPINNER_INTERVAL) => {},
                changed = message_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        Self::clear_line();
    }

    fn clear_line() {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "\r\x1b[K");
        let _ = stderr.flush();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop_internal();
    }
}

/// Run a future with a spinner
pub async fn with_spinner<F, T>(message: impl Into<String>, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let _spinner = Spinner::start(message);
    future.await
}
