use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::state::app_state::MatchSelection;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::prompt::Prompt;
use crate::ui::layout::LayoutAreas;
use groupstage_core::{Access, Band, DisplayRow, Group, MatchRecord, TeamId};

static TABS: &[&str; 3] = &["Standings", "Fixtures", "Admin"];

static HELP: &[(&str, &str)] = &[
    ("1 2 3", "Standings, Fixtures, Admin"),
    ("g / G", "next / previous group"),
    ("J / K", "move through fixtures"),
    ("j / k", "move through teams (Admin)"),
    ("a e x", "add, rename, remove team (Admin)"),
    ("w d l", "add a win, draw, loss (Admin, manual mode)"),
    ("+ / -", "goal for, goal against (Admin, manual mode)"),
    ("r", "record a result between two teams (Admin, manual mode)"),
    ("m s D", "add fixture, enter score, delete fixture (Admin)"),
    ("u", "undo the last roster change (Admin)"),
    ("R", "reset the tournament (Admin)"),
    ("i / o", "sign in / sign out"),
    ("f", "toggle full screen"),
    ("\"", "toggle log pane"),
    ("q", "quit"),
];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let _ = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Standings => draw_standings(f, layout.main, app),
            MenuItem::Fixtures => draw_fixtures(f, layout.main, app),
            MenuItem::Admin => draw_admin(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(area) = layout.logs {
            draw_logs(f, area);
        }
        draw_status(f, layout.status, app);

        if let Some(prompt) = &app.state.prompt {
            draw_prompt(f, layout.main, prompt);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
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
        MenuItem::Standings => 0,
        MenuItem::Fixtures => 1,
        MenuItem::Admin => 2,
        MenuItem::Help => 0,
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

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

fn draw_standings(f: &mut Frame, area: Rect, app: &App) {
    let panes = LayoutAreas::group_grid(area);
    for (group, pane) in Group::ALL.into_iter().zip(panes) {
        let rows = app.board.display_rows(group);
        draw_group_table(f, pane, group, &rows, group == app.state.group, None);
    }
}

fn draw_group_table(
    f: &mut Frame,
    area: Rect,
    group: Group,
    rows: &[DisplayRow],
    active: bool,
    selected: Option<&TeamId>,
) {
    let color = if active { Color::White } else { Color::DarkGray };
    let block = default_border(color).title(format!(" {} ", group.label()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }
    if rows.is_empty() {
        f.render_widget(
            Paragraph::new("No teams")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let name_width = (inner.width as usize).saturating_sub(24).clamp(4, 24);
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(Line::from(Span::styled(
        format!("  {:<name_width$} {:>2} {:>2} {:>2} {:>2} {:>4} {:>3}", "Team", "P", "W", "D", "L", "GD", "Pts"),
        Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
    )));

    for row in rows {
        let marker = if selected == Some(&row.id) { '>' } else { ' ' };
        let style = match row.band {
            Band::Top => Style::default().fg(Color::Green),
            Band::Bottom => Style::default().fg(Color::Red),
            Band::Middle => Style::default().fg(Color::White),
        };
        let name = truncate_name(&row.name, name_width);
        lines.push(Line::from(Span::styled(
            format!(
                "{marker} {name:<name_width$} {:>2} {:>2} {:>2} {:>2} {:>+4} {:>3}",
                row.p, row.w, row.d, row.l, row.gd, row.points
            ),
            style,
        )));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn draw_fixtures(f: &mut Frame, area: Rect, app: &App) {
    let group = app.state.group;
    let block = default_border(Color::White).title(format!(" {} fixtures ", group.label()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if !app.board.mode().uses_fixtures() {
        draw_placeholder(f, inner, "Fixtures are disabled in manual mode.");
        return;
    }

    let [upcoming_area, results_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(inner);

    let selected = app.state.fixture.id.as_deref();
    draw_match_list(f, upcoming_area, " Upcoming ", &app.board.upcoming(group), selected);
    draw_match_list(f, results_area, " Results ", &app.board.results(group), selected);
}

fn draw_match_list(f: &mut Frame, area: Rect, title: &str, matches: &[&MatchRecord], selected: Option<&str>) {
    let block = default_border(Color::DarkGray).title(title.to_string());
    let inner = block.inner(area);
    f.render_widget(block, area);

    if matches.is_empty() {
        f.render_widget(
            Paragraph::new("Nothing here yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let lines: Vec<Line> = matches
        .iter()
        .map(|m| {
            let is_selected = selected == Some(m.id.as_str());
            let style = if is_selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if is_selected { '>' } else { ' ' };
            Line::from(Span::styled(format!("{marker} {}", match_line(m)), style))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn match_line(m: &MatchRecord) -> String {
    match m.score() {
        Some((a, b)) => format!("{} {a}-{b} {}", m.team_a, m.team_b),
        None => {
            let when = m
                .kickoff()
                .map(|t| t.format("%a %d %b %H:%M").to_string())
                .unwrap_or_else(|| "TBD".to_string());
            let pitch = if m.pitch.is_empty() {
                String::new()
            } else {
                format!("  @ {}", m.pitch)
            };
            format!("{when}  {} v {}{pitch}", m.team_a, m.team_b)
        }
    }
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

fn draw_admin(f: &mut Frame, area: Rect, app: &App) {
    let group = app.state.group;
    let block = default_border(Color::White).title(format!(" Admin | {} ", group.label()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.height < 4 {
        return;
    }

    let [header, body, legend] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

    f.render_widget(
        Paragraph::new(format!(
            "{} | {} mode | undo: {}",
            app.board.auth_status(),
            app.board.mode().label(),
            app.board.undo_depth()
        ))
        .style(Style::default().fg(Color::Gray)),
        header,
    );

    let [roster_area, fixtures_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body);

    draw_roster(f, roster_area, app);

    if app.board.mode().uses_fixtures() {
        let listed = MatchSelection::listed(app.board.ledger(), group);
        draw_match_list(f, fixtures_area, " Fixtures ", &listed, app.state.fixture.id.as_deref());
    } else {
        let rows = app.board.display_rows(group);
        draw_group_table(f, fixtures_area, group, &rows, true, app.state.team.id.as_ref());
    }

    let keys = if app.board.mode().uses_fixtures() {
        "a add  e rename  x remove  m fixture  s score  D delete  u undo  R reset  i/o sign in/out"
    } else {
        "a add  e rename  x remove  w/d/l result  +/- goals  r match  u undo  R reset  i/o sign in/out"
    };
    f.render_widget(Paragraph::new(keys).style(Style::default().fg(Color::DarkGray)), legend);
}

/// Teams in roster order, which is what the admin keys address.
fn draw_roster(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::DarkGray).title(" Teams ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let teams = app.board.table().teams(app.state.group);
    if teams.is_empty() {
        draw_placeholder(f, inner, "No teams. Press a to add one.");
        return;
    }

    let selected = app.selected_team_index();
    let lines: Vec<Line> = teams
        .iter()
        .enumerate()
        .map(|(i, team)| {
            let is_selected = selected == Some(i);
            let style = if is_selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if is_selected { '>' } else { ' ' };
            Line::from(Span::styled(
                format!(
                    "{marker} {}  {}W {}D {}L  {} pts  GD {:+}",
                    team.name, team.w, team.d, team.l, team.points, team.gd
                ),
                style,
            ))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Overlays and chrome
// ---------------------------------------------------------------------------

fn draw_prompt(f: &mut Frame, area: Rect, prompt: &Prompt) {
    let height = if prompt.is_confirm() { 5 } else { prompt.fields.len() as u16 + 4 };
    let popup = LayoutAreas::centered(area, 60, height);
    f.render_widget(Clear, popup);

    let block = default_border(Color::Yellow).title(format!(" {} ", prompt.title));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = Vec::new();
    if prompt.is_confirm() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "y = yes   n / Esc = cancel",
            Style::default().fg(Color::Gray),
        )));
    } else {
        for (i, field) in prompt.fields.iter().enumerate() {
            let focused = i == prompt.focus;
            let style = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            let cursor = if focused { "_" } else { "" };
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", field.label), Style::default().fg(Color::Gray)),
                Span::styled(format!("{}{cursor}", field.display_value()), style),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter next/submit  Tab switch  Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines: Vec<Line> = HELP
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(format!("{keys:>8}  "), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let [message_area, info_area] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(48)]).areas(area);

    if let Some(status) = &app.state.status {
        let style = if status.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        f.render_widget(Paragraph::new(format!(" {}", status.message)).style(style), message_area);
    }

    let (link, link_color) = match app.board.access() {
        Access::LocalOnly => ("local", Color::DarkGray),
        Access::Remote { .. } if app.state.connection.is_live() => ("live", Color::Green),
        Access::Remote { .. } => ("offline", Color::Red),
    };
    let info = Line::from(vec![
        Span::styled(app.board.auth_status(), Style::default().fg(Color::Gray)),
        Span::raw(" | "),
        Span::styled(app.board.mode().label(), Style::default().fg(Color::Gray)),
        Span::raw(" | "),
        Span::styled(link, Style::default().fg(link_color)),
        Span::raw(" "),
    ]);
    f.render_widget(Paragraph::new(info).alignment(Alignment::Right), info_area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::Gray));
    f.render_widget(logs, area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}

fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let mut clipped: String = name.chars().take(max.saturating_sub(1)).collect();
    clipped.push('~');
    clipped
}
