// src/keyboard/mod.rs

//! Interactive key commands while dev mode runs.

pub mod terminal;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::types::KeyCommand;

pub use terminal::{CrosstermTerminal, RawModeGuard, RawTerminal};

/// Help shown in the status banner.
pub const KEYBOARD_HELP: &str = " [Ctrl+c] - Exit and delete resources from the cluster\n [p]      - Manually sync / push files to the cluster";

/// Map a key press to a command.
///
/// Raw mode stops the terminal from turning Ctrl+C into SIGINT, so Ctrl+C is
/// read as a key and mapped to [`KeyCommand::Exit`] like `q`.
pub fn command_for_key(key: &KeyEvent) -> Option<KeyCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyCommand::Exit)
        }
        KeyCode::Char('p') if key.modifiers.difference(KeyModifiers::SHIFT).is_empty() => {
            Some(KeyCommand::Sync)
        }
        KeyCode::Char('q') if key.modifiers.is_empty() => Some(KeyCommand::Exit),
        _ => None,
    }
}

/// Read keys from the controlling terminal in a background task.
///
/// The terminal is held in raw mode for the lifetime of the task and
/// restored when it ends, is cancelled or is aborted. Without a usable
/// terminal the task ends right away and the channel closes.
pub fn spawn_key_watcher(
    terminal: Box<dyn RawTerminal>,
    cancel: CancellationToken,
) -> (mpsc::Receiver<KeyCommand>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<KeyCommand>(8);

    let handle = tokio::spawn(async move {
        let _guard = match RawModeGuard::enable(terminal) {
            Ok(guard) => guard,
            Err(err) => {
                debug!(error = %err, "no terminal for keyboard commands");
                return;
            }
        };

        let mut reader = EventStream::new();
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => break,
                next = reader.next() => next,
            };

            let key = match next {
                Some(Ok(Event::Key(key))) => key,
                Some(Ok(other)) => {
                    trace!(event = ?other, "ignoring terminal event");
                    continue;
                }
                Some(Err(err)) => {
                    warn!(error = %err, "error reading terminal event");
                    break;
                }
                None => break,
            };

            if let Some(command) = command_for_key(&key) {
                debug!(?command, "keyboard command");
                if tx.send(command).await.is_err() {
                    break;
                }
            }
        }
        debug!("keyboard watcher stopped");
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn maps_sync_and_exit_keys() {
        assert_eq!(
            command_for_key(&press(KeyCode::Char('p'), KeyModifiers::NONE)),
            Some(KeyCommand::Sync)
        );
        assert_eq!(
            command_for_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyCommand::Exit)
        );
        assert_eq!(
            command_for_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(KeyCommand::Exit)
        );
        assert_eq!(command_for_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(command_for_key(&press(KeyCode::Enter, KeyModifiers::NONE)), None);
    }

    #[test]
    fn releases_are_ignored() {
        let mut key = press(KeyCode::Char('p'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(command_for_key(&key), None);
    }
}
