use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem, SportRow};
use crate::state::app_state::{FeedKind, describe_game};
use crate::ui::layout::LayoutAreas;
use siot_core::ConnectionState;

static TABS: &[&str; 2] = &["Dashboard", "Feed"];

const HELP_TEXT: &str = "q=quit  1=Dashboard  2=Feed  j/k=move or scroll  f=full screen  \"=logs  Esc=back";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Dashboard => draw_dashboard(f, layout.main, app),
            MenuItem::Feed => draw_feed(f, layout.main, app),
            MenuItem::Help => draw_placeholder(f, layout.main, HELP_TEXT),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }
    });
    if let Err(e) = result {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Dashboard | MenuItem::Help => 0,
        MenuItem::Feed => 1,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let title = format!(" {} ", app.client.school());
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [status, legend, content] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1), Constraint::Fill(1)]).areas(inner);

    f.render_widget(Paragraph::new(status_line(app)), status);
    f.render_widget(
        Paragraph::new("Keys: j/k=move  2=feed  ?=help  q=quit").style(Style::default().fg(Color::DarkGray)),
        legend,
    );

    let rows = app.sport_rows();
    if rows.is_empty() {
        f.render_widget(
            Paragraph::new("No sports watched. Set SIOT_SPORTS.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            content,
        );
        return;
    }

    let school = app.client.school();
    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let selected = idx == app.state.selected_sport;
            sport_line(row, school, selected)
        })
        .collect();
    f.render_widget(Paragraph::new(lines), content);
}

fn status_line(app: &App) -> Line<'static> {
    let (label, color) = match app.connection_state() {
        ConnectionState::Connected => ("CONNECTED", Color::Green),
        ConnectionState::Disconnected => ("OFFLINE", Color::Red),
    };
    let mut spans = vec![
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {}  uid {}", app.client.endpoint(), app.client.uid())),
    ];
    if let Some(count) = app.state.last_init_count {
        spans.push(Span::styled(
            format!("  snapshot: {count}"),
            Style::default().fg(Color::Gray),
        ));
    }
    if let Some(err) = app.state.last_error.as_deref() {
        spans.push(Span::styled(format!("  {err}"), Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}

fn sport_line(row: &SportRow<'_>, school: &str, selected: bool) -> Line<'static> {
    let marker = if selected { ">" } else { " " };
    let latest = row
        .latest
        .map(describe_game)
        .unwrap_or_else(|| "no games yet".to_string());
    let since_win = match row.hours_since_win {
        Some(h) => format!("{h}h since win"),
        None => "--".to_string(),
    };

    let won = row.latest.is_some_and(|g| g.won_by(school));
    let style = if won {
        Style::default().fg(Color::Yellow)
    } else if selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::styled(format!("{marker} {:<16}", row.sport), style),
        Span::styled(format!("{since_win:>16}  "), Style::default().fg(Color::Gray)),
        Span::styled(latest, style),
    ])
}

fn draw_feed(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Feed ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if app.state.feed.entries.is_empty() {
        f.render_widget(
            Paragraph::new("Waiting for updates...")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let visible = inner.height as usize;
    let skip = app.state.feed.scroll_offset as usize;
    let lines: Vec<Line> = app
        .state
        .feed
        .entries
        .iter()
        .rev()
        .skip(skip)
        .take(visible)
        .map(|entry| {
            let color = match entry.kind {
                FeedKind::Init => Color::Cyan,
                FeedKind::Update => Color::White,
                FeedKind::Win => Color::Yellow,
                FeedKind::System => Color::DarkGray,
            };
            let text: String = entry.text.chars().take(inner.width.saturating_sub(7) as usize).collect();
            Line::from(vec![
                Span::styled(format!("{} ", entry.timestamp), Style::default().fg(Color::Gray)),
                Span::styled(text, Style::default().fg(color)),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::Gray))
        .block(default_border(Color::DarkGray).title(" Logs "));
    f.render_widget(logs, area);
}
