use crate::ui::app::{App, AppState};
use humansize::{BINARY, format_size};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
};

pub fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let disk_info = app
        .disks
        .list()
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new("/"))
        .or_else(|| app.disks.list().first());

    let header_text = if let Some(disk) = disk_info {
        let total = disk.total_space();
        let available = disk.available_space();
        format!(
            "TuxyClean v{} | Disk: {} total, {} free",
            env!("CARGO_PKG_VERSION"),
            format_size(total, BINARY),
            format_size(available, BINARY)
        )
    } else {
        format!("TuxyClean v{} | Disk: N/A", env!("CARGO_PKG_VERSION"))
    };

    let title = Paragraph::new(header_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

fn checkbox(label: &str, key: char, checked: bool) -> Line<'static> {
    let mark = if checked { "[x]" } else { "[ ]" };
    Line::from(format!("{mark} {label} ({key})"))
}

pub fn render_options(f: &mut Frame, app: &App, area: Rect) {
    let temp_dir = app.engine.catalog().temp_dir().display().to_string();
    let estimate = app
        .estimate
        .map_or_else(|| "measuring...".to_string(), |bytes| format_size(bytes, BINARY));
    let lines = vec![
        Line::from(vec![
            Span::raw("Temporary files detected (possible): "),
            Span::styled(
                estimate,
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(format!("Temp directory: {temp_dir}")),
        Line::from(format!(
            "Size limit: {} | Exclusions: {}",
            format_size(app.settings.max_size_bytes(), BINARY),
            app.settings.excludes.len()
        )),
        Line::from(""),
        checkbox("Include browser caches", 'b', app.include_browsers),
        checkbox("Dry run (delete nothing)", 'd', app.dry_run),
    ];

    let options = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Cleanup"))
        .wrap(Wrap { trim: false });
    f.render_widget(options, area);
}

pub fn render_progress(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Progress ({})", app.phase.label())),
        )
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(u16::from(app.progress.min(100)));
    f.render_widget(gauge, chunks[0]);

    let status = Paragraph::new(app.status.as_str())
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(status, chunks[1]);
}

pub fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let footer_text = match app.state {
        AppState::Idle => {
            "[b] Browsers [d] Dry run [Enter] Clean now [s] Schedule weekly [q] Quit".to_string()
        }
        AppState::Confirming => format!("{} | [y/Enter] Confirm [n/Esc] Cancel", app.confirm_message()),
        AppState::Running => "Cleaning... [c/Esc] Cancel".to_string(),
        AppState::Done(_) | AppState::Error(_) => "[Press key to continue]".to_string(),
    };

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

pub fn render_popup(f: &mut Frame, app: &App) {
    let (title, msg, color) = match &app.state {
        AppState::Confirming => ("Confirm", app.confirm_message(), Color::Yellow),
        AppState::Done(msg) => ("TuxyClean", msg.clone(), Color::Green),
        AppState::Error(msg) => ("Error", msg.clone(), Color::Red),
        AppState::Idle | AppState::Running => return,
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(msg).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
