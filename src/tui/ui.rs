//! UI rendering for the burst screen

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::events::hints;
use crate::burst::{Burst, BurstPhase};
use chrono::{DateTime, Utc};

fn phase_style(phase: BurstPhase) -> Style {
    match phase {
        BurstPhase::Idle => Style::default().fg(Color::White),
        BurstPhase::Running => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        BurstPhase::Finished => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    }
}

fn phase_label(phase: BurstPhase) -> &'static str {
    match phase {
        BurstPhase::Idle => "ready",
        BurstPhase::Running => "playing",
        BurstPhase::Finished => "time's up",
    }
}

/// Draw the burst screen
pub fn draw(frame: &mut Frame, burst: &Burst, now: DateTime<Utc>, status: Option<&str>) {
    let area = frame.area();
    let item = burst.item();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Burst · {} ", item.title))
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = Layout::vertical([
        Constraint::Length(1), // Kind
        Constraint::Min(1),    // Spacer
        Constraint::Length(1), // Countdown
        Constraint::Length(1), // Phase
        Constraint::Length(1), // BPM
        Constraint::Min(1),    // Spacer
        Constraint::Length(1), // Status
        Constraint::Length(1), // Key hints
    ])
    .split(inner);

    frame.render_widget(
        Paragraph::new(item.kind_label()).alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray)),
        layout[0],
    );

    let phase = burst.phase();
    frame.render_widget(
        Paragraph::new(burst.display(now)).alignment(Alignment::Center).style(phase_style(phase)),
        layout[2],
    );
    frame.render_widget(
        Paragraph::new(phase_label(phase)).alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray)),
        layout[3],
    );

    if let Some(bpm) = burst.runtime_bpm() {
        frame.render_widget(
            Paragraph::new(format!("{} BPM", bpm)).alignment(Alignment::Center),
            layout[4],
        );
    }

    if let Some(status) = status {
        frame.render_widget(
            Paragraph::new(status).alignment(Alignment::Center).style(Style::default().fg(Color::Yellow)),
            layout[6],
        );
    }

    frame.render_widget(
        Paragraph::new(hints(phase)).alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray)),
        layout[7],
    );
}
