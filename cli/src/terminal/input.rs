use std::thread;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tracing::debug;

/// What the operator asked for from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Stop,
}

/// Listens for control keys on a background thread.
///
/// The terminal stays in line mode so log output keeps its layout; keys
/// arrive once the operator hits Enter.
pub struct InputHandle {
    rx: mpsc::UnboundedReceiver<Command>,
}

impl InputHandle {
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        thread::spawn(move || {
            loop {
                match event::read() {
                    Ok(Event::Key(key)) => {
                        if let Some(command) = command_for(&key) {
                            if tx.send(command).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("keyboard input unavailable: {e}");
                        break;
                    }
                }
            }
        });

        Self { rx }
    }

    /// Next command, `None` once input is gone for good.
    pub async fn recv(&mut self) -> Option<Command> {
        self.rx.recv().await
    }
}

pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Stop),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => Some(Command::TogglePause),
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Stop),
        _ => None,
    }
}
