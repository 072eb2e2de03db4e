use crossterm::event::KeyEvent;
use siot_core::GameInfo;
use siot_core::notifier::NotifyOutcome;

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    ClockTick,
}

#[derive(Debug, Clone)]
pub enum SocketCommand {
    Send(String),
}

#[derive(Debug)]
pub enum NotifierResponse {
    Outcome { game: GameInfo, outcome: NotifyOutcome },
    Error { message: String },
}
