//! Key handling for the burst screen

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::msg::Msg;
use crate::burst::BurstPhase;

/// Map a key press to a message. Keys that do nothing in the current phase
/// map to `None`.
pub fn key_to_msg(key: KeyEvent, phase: BurstPhase) -> Option<Msg> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Msg::Close);
    }

    match key.code {
        KeyCode::Char(' ') | KeyCode::Char('s') if phase == BurstPhase::Idle => Some(Msg::Start),
        KeyCode::Char('x') if phase == BurstPhase::Running => Some(Msg::Stop),
        KeyCode::Enter | KeyCode::Char('d') => Some(Msg::Done),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Msg::BpmUp),
        KeyCode::Char('-') => Some(Msg::BpmDown),
        KeyCode::Char('q') | KeyCode::Esc => Some(Msg::Close),
        _ => None,
    }
}

/// Key hints for the footer
pub fn hints(phase: BurstPhase) -> &'static str {
    match phase {
        BurstPhase::Idle => "space start · enter done · +/- bpm · q close",
        BurstPhase::Running => "x stop · enter done · +/- bpm · q close",
        BurstPhase::Finished => "enter done · q close",
    }
}
