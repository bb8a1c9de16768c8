pub mod app;
pub mod components;

use crate::ui::app::{App, AppState};
use crate::ui::components::{
    render_footer, render_header, render_options, render_popup, render_progress,
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::*;
use std::time::Duration;

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_options(f, app, main_chunks[0]);
    render_progress(f, app, main_chunks[1]);

    render_footer(f, app, chunks[2]);
    render_popup(f, app);
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stderr>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        app.check_estimate();

        // Check for worker events
        if let AppState::Running = app.state {
            app.check_run_status();
        }

        // Event polling with timeout to allow UI updates during Running
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match app.state {
                AppState::Idle => match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('b') => app.toggle_browsers(),
                    KeyCode::Char('d') => app.toggle_dry_run(),
                    KeyCode::Char('s') => app.schedule_weekly(),
                    KeyCode::Enter => app.state = AppState::Confirming,
                    _ => {}
                },
                AppState::Confirming => match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => app.start_clean(),
                    KeyCode::Char('n' | 'q') | KeyCode::Esc => {
                        app.state = AppState::Idle;
                    }
                    _ => {}
                },
                AppState::Running => {
                    if let KeyCode::Char('c') | KeyCode::Esc = key.code {
                        app.cancel_clean();
                    }
                }
                AppState::Done(_) | AppState::Error(_) => match key.code {
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ' | 'q') => {
                        app.state = AppState::Idle;
                    }
                    _ => {}
                },
            }
        }
    }
}
