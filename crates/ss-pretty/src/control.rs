use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use std::io::{self, IsTerminal};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

pub const CONTROL_QUEUE_CAPACITY: usize = 16;

/// Operator commands delivered to the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    RepeatHeader,
    ToggleVerbose,
    Quit,
    /// Interrupt signal from outside the keyboard listener.
    Interrupt,
}

pub fn control_for_key(key: KeyEvent) -> Option<ControlEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ControlEvent::Quit)
        }
        KeyCode::Char('h') => Some(ControlEvent::RepeatHeader),
        KeyCode::Char('v') => Some(ControlEvent::ToggleVerbose),
        KeyCode::Char('q') => Some(ControlEvent::Quit),
        _ => None,
    }
}

pub fn spawn_key_listener(tx: mpsc::Sender<ControlEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = EventStream::new();
        while let Some(event) = events.next().await {
            let key = match event {
                Ok(Event::Key(key)) => key,
                Ok(_) => continue,
                Err(err) => {
                    warn!(event = "key_read_failed", error = %err);
                    break;
                }
            };
            if let Some(control) = control_for_key(key) {
                debug!(event = "control", control = ?control);
                if tx.send(control).await.is_err() {
                    break;
                }
            }
        }
    })
}

pub fn spawn_interrupt_listener(tx: mpsc::Sender<ControlEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(ControlEvent::Interrupt).await.is_err() {
                break;
            }
        }
    })
}

/// Raw mode for single-keystroke input without echo; restored on drop.
pub struct RawModeGuard {
    enabled: bool,
}

impl RawModeGuard {
    pub fn enable_if_terminal() -> io::Result<Self> {
        if !io::stdin().is_terminal() {
            return Ok(Self { enabled: false });
        }
        enable_raw_mode()?;
        Ok(Self { enabled: true })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.enabled {
            let _ = disable_raw_mode();
        }
    }
}
