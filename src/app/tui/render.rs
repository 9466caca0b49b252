use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Gauge, Padding, Paragraph, Row, Table, TableState,
    Wrap,
};

use super::super::catalog::{
    CATALOG, build_progress_gauge, format_clock, playback_percent, truncate,
};
use super::super::controller::{Controller, GridItem, NoticeKind, View};
use super::super::player::MediaPlayer;
use super::actions::{Selection, selection_at};
use super::{LoginField, UiState};

const ACCENT: Color = Color::Rgb(110, 170, 255);
const MUTED: Color = Color::Rgb(185, 195, 210);
const TEXT: Color = Color::Rgb(230, 235, 242);

pub(super) fn draw_tui<P: MediaPlayer>(frame: &mut Frame, controller: &Controller<P>, ui: &UiState) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, controller, chunks[0]);
    match controller.view() {
        View::Login => draw_login(frame, controller, ui, chunks[1]),
        View::Catalog => draw_catalog(frame, controller, ui, chunks[1]),
        View::Player => draw_player(frame, controller, ui, chunks[1]),
    }

    let command_bar = Paragraph::new(controls_line(controller.view()))
        .alignment(Alignment::Center)
        .block(panel_block("Controls"));
    frame.render_widget(command_bar, chunks[2]);

    let status_widget = Paragraph::new(ui.status.clone())
        .style(status_style(&ui.status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);

    if let Some(notice) = ui.pending_notice.as_ref() {
        let text = format!("{}\n\nPress any key to continue.", notice.message);
        let title = match notice.kind {
            NoticeKind::Info => "Notice",
            NoticeKind::Error => "Error",
        };
        render_popup(frame, title, &text);
    } else if let Some(input) = ui.upload_prompt.as_ref() {
        let text = format!("File to upload:\n\n{input}_\n\n[Enter] Upload   [Esc] Cancel");
        render_popup(frame, "Upload Video", &text);
    }
}

fn draw_header<P: MediaPlayer>(frame: &mut Frame, controller: &Controller<P>, area: Rect) {
    let session = controller.session();
    let user_text = if session.is_authenticated() {
        format!("signed in as {}", session.display_name())
    } else {
        "signed out".to_string()
    };
    let view_text = match controller.view() {
        View::Login => "LOGIN",
        View::Catalog => "MOVIES",
        View::Player => "PLAYER",
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "VIDSTREAM",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(user_text, Style::default().fg(MUTED)),
        Span::styled("   ", Style::default()),
        Span::styled(view_text, Style::default().fg(Color::Yellow)),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Dashboard"));
    frame.render_widget(header, area);
}

fn draw_login<P: MediaPlayer>(
    frame: &mut Frame,
    controller: &Controller<P>,
    ui: &UiState,
    area: Rect,
) {
    let form_area = centered_fixed_rect(56, 11, area);
    let field_style = |field: LoginField| {
        if ui.focus == field {
            Style::default().fg(Color::Black).bg(ACCENT)
        } else {
            Style::default().fg(TEXT).bg(Color::Rgb(40, 46, 56))
        }
    };
    let masked = "•".repeat(ui.access_key.chars().count());
    let submit = if controller.login_enabled() {
        Span::styled(" [Enter] Sign in ", pill_active())
    } else {
        Span::styled(" Signing in... ", pill_inactive())
    };

    let lines = vec![
        Line::from(Span::styled("Username", Style::default().fg(MUTED))),
        Line::from(Span::styled(
            format!(" {:<40}", truncate(&ui.username, 40)),
            field_style(LoginField::Username),
        )),
        Line::from(""),
        Line::from(Span::styled("Access key", Style::default().fg(MUTED))),
        Line::from(Span::styled(
            format!(" {:<40}", truncate(&masked, 40)),
            field_style(LoginField::AccessKey),
        )),
        Line::from(""),
        Line::from(submit),
    ];
    let form = Paragraph::new(lines)
        .alignment(Alignment::Left)
        .block(modal_block("Sign In"));
    frame.render_widget(Clear, form_area);
    frame.render_widget(form, form_area);
}

fn draw_catalog<P: MediaPlayer>(
    frame: &mut Frame,
    controller: &Controller<P>,
    ui: &UiState,
    area: Rect,
) {
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    let list_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(4)])
        .split(body_chunks[0]);
    let details_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(body_chunks[1]);

    let highlight = Style::default()
        .bg(ACCENT)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD);

    let movie_rows: Vec<Row> = CATALOG
        .iter()
        .map(|entry| {
            let (_, label) = build_progress_gauge(controller.progress_for(entry.movie_id));
            Row::new(vec![
                Cell::from(truncate(entry.title, 34)),
                Cell::from(entry.movie_id),
                Cell::from(label),
            ])
        })
        .collect();
    let mut movie_state = TableState::default();
    movie_state.select((ui.selected < CATALOG.len()).then_some(ui.selected));
    let movies = Table::new(
        movie_rows,
        [
            Constraint::Percentage(60),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(vec!["Title", "Id", "Watched"]).style(header_style()))
    .block(panel_block("Movies"))
    .row_highlight_style(highlight)
    .highlight_symbol("▸ ");
    frame.render_stateful_widget(movies, list_chunks[0], &mut movie_state);

    let grid = controller.upload_grid();
    let placeholder = grid.iter().find_map(|item| match item {
        GridItem::Placeholder(message) => Some(*message),
        GridItem::Card(_) => None,
    });
    if let Some(message) = placeholder {
        let empty = Paragraph::new(message)
            .style(Style::default().fg(MUTED))
            .alignment(Alignment::Center)
            .block(panel_block("Your Uploads"));
        frame.render_widget(empty, list_chunks[1]);
    } else {
        let upload_rows: Vec<Row> = grid
            .iter()
            .filter_map(|item| match item {
                GridItem::Card(movie) => Some(Row::new(vec![
                    Cell::from(truncate(&movie.movie_id, 24)),
                    Cell::from(truncate(&movie.video_url, 48)),
                ])),
                GridItem::Placeholder(_) => None,
            })
            .collect();
        let mut upload_state = TableState::default();
        upload_state.select(ui.selected.checked_sub(CATALOG.len()));
        let uploads = Table::new(
            upload_rows,
            [Constraint::Length(26), Constraint::Min(10)],
        )
        .header(Row::new(vec!["Upload", "Video URL"]).style(header_style()))
        .block(panel_block("Your Uploads"))
        .row_highlight_style(highlight)
        .highlight_symbol("▸ ");
        frame.render_stateful_widget(uploads, list_chunks[1], &mut upload_state);
    }

    let (details, percent) = match selection_at(controller, ui.selected) {
        Some(Selection::Catalog(entry)) => (
            format!(
                "Title\n{}\n\nAbout\n{}",
                entry.title, entry.description
            ),
            Some(controller.progress_for(entry.movie_id)),
        ),
        Some(Selection::Upload(movie)) => (
            format!("Upload\n{}\n\nSource\n{}", movie.movie_id, movie.video_url),
            None,
        ),
        None => ("Nothing selected.".to_string(), None),
    };
    let selection = Paragraph::new(details)
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: true })
        .block(panel_block("Selected"));
    frame.render_widget(selection, details_chunks[0]);
    if let Some(percent) = percent {
        let (ratio, label) = build_progress_gauge(percent);
        frame.render_widget(progress_gauge(ratio, label), details_chunks[1]);
    }
}

fn draw_player<P: MediaPlayer>(
    frame: &mut Frame,
    controller: &Controller<P>,
    ui: &UiState,
    area: Rect,
) {
    let Some(now_playing) = controller.now_playing() else {
        frame.render_widget(
            Paragraph::new("Nothing is playing.").block(panel_block("Player")),
            area,
        );
        return;
    };

    let description_height = if now_playing.description.is_some() { 6 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(description_height),
            Constraint::Length(3),
        ])
        .split(area);

    let position = ui.position;
    let info = format!(
        "{}\n\nMovie id   {}\nPosition   {} / {}",
        now_playing.label,
        now_playing.movie_id,
        format_clock(position.current_time),
        format_clock(position.duration),
    );
    frame.render_widget(
        Paragraph::new(info)
            .style(Style::default().fg(TEXT))
            .block(panel_block("Player")),
        chunks[0],
    );

    if let Some(description) = now_playing.description {
        frame.render_widget(
            Paragraph::new(description)
                .style(Style::default().fg(TEXT))
                .wrap(Wrap { trim: true })
                .block(panel_block("Description")),
            chunks[1],
        );
    }

    let (ratio, label) = match playback_percent(position.current_time, position.duration) {
        Some(percent) => build_progress_gauge(percent),
        None => (0.0, "waiting for player".to_string()),
    };
    frame.render_widget(progress_gauge(ratio, label), chunks[2]);
}

fn progress_gauge(ratio: f64, label: String) -> Gauge<'static> {
    Gauge::default()
        .block(panel_block("Progress"))
        .gauge_style(
            Style::default()
                .fg(Color::Rgb(130, 190, 255))
                .bg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .label(label)
        .ratio(ratio)
}

fn header_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn modal_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(
            Style::default()
                .fg(Color::Rgb(160, 190, 235))
                .add_modifier(Modifier::BOLD),
        )
        .title(title)
        .padding(Padding::new(2, 2, 1, 1))
}

fn pill_active() -> Style {
    Style::default()
        .bg(ACCENT)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn pill_inactive() -> Style {
    Style::default().bg(Color::Rgb(72, 82, 96)).fg(TEXT)
}

fn controls_line(view: View) -> Line<'static> {
    let hints = match view {
        View::Login => "Tab switch field  Enter sign in  Esc quit",
        View::Catalog => "↑/↓ move  Enter play  u upload  r refresh  l logout  q quit",
        View::Player => "p save progress  b/Esc back to movies  q quit",
    };
    Line::from(Span::styled(hints, Style::default().fg(MUTED)))
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(TEXT)
    }
}

fn render_popup(frame: &mut Frame, title: &'static str, text: &str) {
    let popup_area = popup_rect_for_text(frame.area(), text);
    render_popup_shadow(frame, popup_area);
    frame.render_widget(Clear, popup_area);
    let popup = Paragraph::new(text.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(modal_block(title));
    frame.render_widget(popup, popup_area);
}

fn centered_fixed_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width.max(1));
    let clamped_height = height.min(area.height.max(1));
    let x = area.x + area.width.saturating_sub(clamped_width) / 2;
    let y = area.y + area.height.saturating_sub(clamped_height) / 2;
    Rect::new(x, y, clamped_width, clamped_height)
}

fn render_popup_shadow(frame: &mut Frame, popup_area: Rect) {
    let area = frame.area();
    let shadow = Rect::new(
        (popup_area.x + 1).min(area.x + area.width.saturating_sub(1)),
        (popup_area.y + 1).min(area.y + area.height.saturating_sub(1)),
        popup_area.width.saturating_sub(1),
        popup_area.height.saturating_sub(1),
    );
    if shadow.width == 0 || shadow.height == 0 {
        return;
    }
    let shadow_block = Block::default().style(Style::default().bg(Color::Rgb(14, 16, 24)));
    frame.render_widget(shadow_block, shadow);
}

fn popup_rect_for_text(area: Rect, text: &str) -> Rect {
    let max_line_width = text
        .lines()
        .map(|line| line.chars().count() as u16)
        .max()
        .unwrap_or(0);
    let line_count = text.lines().count() as u16;

    let available_width = area.width.saturating_sub(2).max(1);
    let min_width = 48.min(available_width);
    let max_width = 72.min(available_width);
    let width = max_line_width.saturating_add(12).clamp(min_width, max_width);

    let available_height = area.height.saturating_sub(2).max(1);
    let min_height = 8.min(available_height);
    let max_height = 18.min(available_height);
    let height = line_count.saturating_add(6).clamp(min_height, max_height);

    centered_fixed_rect(width, height, area)
}
