// Keyboard input: map keys to view switches / quit, and the listener task that applies them.

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::context::ViewHandle;
use crate::models::ViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Show(ViewState),
    Quit,
}

/// `1` summary, `2` detail, `m` menu, `q` / Esc / Ctrl-C quit. Anything else is ignored.
pub fn map_key(key: &KeyEvent) -> Option<InputEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Quit)
        }
        KeyCode::Char('1') => Some(InputEvent::Show(ViewState::Summary)),
        KeyCode::Char('2') => Some(InputEvent::Show(ViewState::Detail)),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(InputEvent::Show(ViewState::Menu)),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(InputEvent::Quit),
        _ => None,
    }
}

/// Apply an event to the shared view. Returns true when the process should quit.
pub fn apply(event: InputEvent, view: &ViewHandle) -> bool {
    match event {
        InputEvent::Show(state) => {
            debug!(view = state.label(), "view switched");
            view.set(state);
            false
        }
        InputEvent::Quit => true,
    }
}

/// Spawns the key listener. View switches are applied directly; a quit key sends on `quit_tx`.
pub fn spawn_listener(view: ViewHandle, quit_tx: mpsc::Sender<()>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = EventStream::new();
        while let Some(event) = events.next().await {
            let key = match event {
                Ok(Event::Key(key)) => key,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, operation = "read_key", "terminal input failed");
                    break;
                }
            };
            if let Some(input) = map_key(&key)
                && apply(input, &view)
            {
                let _ = quit_tx.send(()).await;
                break;
            }
        }
        debug!("Input listener shutting down");
    })
}
