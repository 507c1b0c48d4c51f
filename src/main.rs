//! Jarvis - Actor-based terminal API client
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Host Layer (Tokio) - persistence and async HTTP execution

use std::io;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use jarvis::app::state::{auth_fields, SaveField, SidebarItem};
use jarvis::app::AppActor;
use jarvis::config::Config;
use jarvis::constants::{APP_NAME, APP_VERSION};
use jarvis::host::HostActor;
use jarvis::messages::ui_events::{
    key_to_ui_event, paste_to_ui_event, AuthField, InputMode, Panel, Popup, RequestTab, RowField,
};
use jarvis::messages::{HostCommand, HostEvent, NotificationLevel, RenderState, UiEvent};
use jarvis::models::{ApiKeyLocation, AuthKind, KeyValue};
use jarvis::storage::Storage;
use jarvis::ui::{
    border_style, centered_rect, cursor_line_col, format_size, highlight_json, method_color,
    render_key_value_list, render_tabs, status_color,
};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory `{}`",
            config.data_dir.display()
        )
    })?;

    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(&config.data_dir, &config.log_file);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!(
        version = APP_VERSION,
        data_dir = %config.data_dir.display(),
        "Starting {}",
        APP_NAME
    );

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (host_cmd_tx, host_cmd_rx) = mpsc::unbounded_channel::<HostCommand>();
    let (host_event_tx, host_event_rx) = mpsc::unbounded_channel::<HostEvent>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn host actor
    let host_actor = HostActor::new(&config, Storage::open(&config.data_dir), host_event_tx);
    let host = tokio::spawn(host_actor.run(host_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(host_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, host_event_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    // Let the host drain its queue before the runtime shuts down
    let _ = tokio::time::timeout(Duration::from_secs(1), host).await;
    tracing::info!("Exiting");

    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            let ui_event = match event::read()? {
                Event::Key(key) => key_to_ui_event(key, current_state.key_context()),
                Event::Paste(text) => paste_to_ui_event(text, current_state.key_context()),
                _ => None,
            };
            if let Some(event) = ui_event {
                let quit = matches!(event, UiEvent::Quit);
                let _ = ui_tx.send(event);
                if quit {
                    break;
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(0)])
        .split(rows[0]);

    draw_sidebar(f, state, columns[0]);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Method + URL
            Constraint::Percentage(45), // Request editor
            Constraint::Min(5),         // Response
        ])
        .split(columns[1]);

    draw_url_bar(f, state, main[0]);
    draw_editor(f, state, main[1]);
    draw_response(f, state, main[2]);
    draw_status_bar(f, state, rows[1]);

    match state.popup {
        Some(Popup::Help) => draw_help_popup(f, area),
        Some(Popup::SaveRequest) => draw_save_popup(f, state, area),
        Some(Popup::NewCollection) => draw_new_collection_popup(f, state, area),
        Some(Popup::CurlImport) => draw_curl_import_popup(f, state, area),
        None => {}
    }
}

fn is_editing(state: &RenderState, panel: Panel) -> bool {
    state.active_panel == panel && state.input_mode == InputMode::Editing
}

/// Display width of the text before a byte cursor
fn chars_before(text: &str, cursor: usize) -> u16 {
    text.get(..cursor.min(text.len()))
        .map(|s| s.chars().count())
        .unwrap_or(0) as u16
}

fn set_cursor(f: &mut Frame, area: Rect, x: u16, y: u16) {
    let max_x = area.x + area.width.saturating_sub(2);
    let max_y = area.y + area.height.saturating_sub(2);
    f.set_cursor_position(Position::new((area.x + 1 + x).min(max_x), (area.y + 1 + y).min(max_y)));
}

fn draw_sidebar(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Sidebar;

    let items: Vec<ListItem> = state
        .sidebar
        .iter()
        .map(|item| match item {
            SidebarItem::Collection { name, count, .. } => ListItem::new(Line::from(vec![
                Span::styled(format!("▸ {}", name), Style::default().bold()),
                Span::styled(format!(" ({})", count), Style::default().fg(Color::DarkGray)),
            ])),
            SidebarItem::Folder { name, depth } => ListItem::new(Span::styled(
                format!("{}/ {}", "  ".repeat(*depth), name),
                Style::default().fg(Color::Blue),
            )),
            SidebarItem::Request {
                name,
                method,
                depth,
                ..
            } => ListItem::new(Line::from(vec![
                Span::raw("  ".repeat(*depth)),
                Span::styled(
                    format!("{:7}", method.as_str()),
                    Style::default().fg(method_color(method.as_str())),
                ),
                Span::raw(name.clone()),
            ])),
            SidebarItem::HistoryHeader { count } => ListItem::new(Span::styled(
                format!("History ({})", count),
                Style::default().fg(Color::Magenta).bold(),
            )),
            SidebarItem::History {
                method,
                url,
                timestamp,
                ..
            } => ListItem::new(Line::from(vec![
                Span::styled(
                    timestamp.with_timezone(&chrono::Local).format("%H:%M ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:7}", method.as_str()),
                    Style::default().fg(method_color(method.as_str())),
                ),
                Span::raw(url.clone()),
            ])),
        })
        .collect();

    let environment = state.environment.as_deref().unwrap_or("No environment");
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(is_focused, false))
                .title(" Collections ")
                .title_bottom(Line::from(format!(" env: {} (E) ", environment)).right_aligned()),
        )
        .highlight_style(if is_focused {
            Style::default().bg(Color::DarkGray).bold()
        } else {
            Style::default()
        });

    let mut list_state = ListState::default();
    list_state.select(Some(state.sidebar_selected));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_url_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Url;
    let method = state.request.method.as_str();

    let loading = if state.is_loading { " [...]" } else { "" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, is_editing(state, Panel::Url)))
        .title(format!(" {}{} ", method, loading))
        .title_style(Style::default().fg(method_color(method)).bold())
        .title_bottom(Line::from(format!(" {} ", state.request.name)).right_aligned());

    let input = Paragraph::new(state.request.url.as_str()).block(block);
    f.render_widget(input, area);

    if is_editing(state, Panel::Url) {
        let x = chars_before(&state.request.url, state.cursor_position);
        set_cursor(f, area, x, 0);
    }
}

fn draw_editor(f: &mut Frame, state: &RenderState, area: Rect) {
    let tabs_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let titles: Vec<&str> = RequestTab::ALL.iter().map(|t| t.title()).collect();
    f.render_widget(render_tabs(&titles, state.active_tab.index()), tabs_area[0]);

    let content = tabs_area[1];
    match state.active_tab {
        RequestTab::Params => draw_rows(f, state, &state.request.params, " Query Params ", content),
        RequestTab::Headers => draw_rows(f, state, &state.request.headers, " Headers ", content),
        RequestTab::Body => draw_body(f, state, content),
        RequestTab::Auth => draw_auth(f, state, content),
        RequestTab::Code => draw_code(f, state, content),
    }
}

fn draw_rows(
    f: &mut Frame,
    state: &RenderState,
    rows: &[KeyValue],
    title: &str,
    area: Rect,
) {
    let is_focused = state.active_panel == Panel::Editor;
    let selected = is_focused.then_some((state.selected_row, state.row_field));
    let title = format!("{}(Space:toggle d:del ←/→:key/value) ", title);
    let list = render_key_value_list(rows, title, selected, is_focused);
    f.render_widget(list, area);

    if is_editing(state, Panel::Editor) {
        if let Some(row) = rows.get(state.selected_row) {
            // "[x] " prefix, then key, ": ", value
            let key_width = if row.key.is_empty() { 3 } else { row.key.chars().count() as u16 };
            let x = match state.row_field {
                RowField::Key => 4 + chars_before(&row.key, state.cursor_position),
                RowField::Value => 4 + key_width + 2 + chars_before(&row.value, state.cursor_position),
            };
            set_cursor(f, area, x, state.selected_row as u16);
        }
    }
}

fn draw_body(f: &mut Frame, state: &RenderState, area: Rect) {
    let body = &state.request.body;
    if body.kind.uses_form_rows() {
        let rows = body.form_data.as_deref().unwrap_or(&[]);
        let title = format!(" Body: {} (b:type) ", body.kind.as_str());
        draw_rows(f, state, rows, &title, area);
        return;
    }

    let is_focused = state.active_panel == Panel::Editor;
    let editing = is_editing(state, Panel::Editor);
    let title = if state.request.method.has_body() {
        format!(" Body: {} (b:type) ", body.kind.as_str())
    } else {
        format!(" Body: {} (not sent with GET) ", body.kind.as_str())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, editing))
        .title(title);

    let content = if editing {
        Paragraph::new(body.content.as_str())
    } else {
        Paragraph::new(highlight_json(&body.content))
    };
    f.render_widget(content.block(block), area);

    if editing {
        let (x, y) = cursor_line_col(&body.content, state.cursor_position);
        set_cursor(f, area, x, y);
    }
}

fn draw_auth(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Editor;
    let editing = is_editing(state, Panel::Editor);
    let auth = &state.request.auth;
    let fields = auth_fields(auth.kind);

    let mut lines = vec![Line::from(vec![
        Span::raw("Type: "),
        Span::styled(auth.kind.label(), Style::default().fg(Color::Cyan).bold()),
        Span::styled("  (t:cycle)", Style::default().fg(Color::DarkGray)),
    ])];

    if fields.is_empty() {
        lines.push(Line::from(Span::styled(
            "This request does not use any authorization.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for field in fields {
        let value = match field {
            AuthField::Username => auth.username.clone(),
            AuthField::Password if editing && state.auth_field == AuthField::Password => {
                auth.password.clone()
            }
            AuthField::Password => "*".repeat(auth.password.chars().count()),
            AuthField::Token => auth.token.clone(),
            AuthField::Key => auth.key.clone(),
            AuthField::Value => auth.value.clone(),
        };
        let style = if is_focused && *field == state.auth_field {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", field.label()), style),
            Span::raw(value),
        ]));
    }

    if auth.kind == AuthKind::ApiKey {
        let location = match auth.add_to {
            ApiKeyLocation::Header => "Header",
            ApiKeyLocation::Query => "Query Params",
        };
        lines.push(Line::from(vec![
            Span::raw("Add to: "),
            Span::styled(location, Style::default().fg(Color::Cyan)),
            Span::styled("  (l:toggle)", Style::default().fg(Color::DarkGray)),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, editing))
        .title(" Authorization ");
    f.render_widget(Paragraph::new(lines).block(block), area);

    if editing {
        if let Some(index) = fields.iter().position(|field| *field == state.auth_field) {
            let text = match state.auth_field {
                AuthField::Username => &auth.username,
                AuthField::Password => &auth.password,
                AuthField::Token => &auth.token,
                AuthField::Key => &auth.key,
                AuthField::Value => &auth.value,
            };
            let label = state.auth_field.label().len() as u16 + 2;
            let x = label + chars_before(text, state.cursor_position);
            set_cursor(f, area, x, 1 + index as u16);
        }
    }
}

fn draw_code(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Editor;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, false))
        .title(format!(" Code: {} (f:format) ", state.code_format.label()));

    let code = Paragraph::new(state.code.as_str())
        .block(block)
        .scroll((state.code_scroll, 0));
    f.render_widget(code, area);
}

fn draw_response(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Response;

    let Some(response) = &state.response else {
        let hint = if state.is_loading {
            "Sending request..."
        } else {
            "Enter a URL and press 's' to send."
        };
        let empty = Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(is_focused, false))
                .title(" Response "),
        );
        f.render_widget(empty, area);
        return;
    };

    let status_text = if response.status == 0 {
        Span::styled(" Error ", Style::default().fg(Color::Red).bold())
    } else {
        Span::styled(
            format!(" {} {} ", response.status, response.status_text),
            Style::default().fg(status_color(response.status)).bold(),
        )
    };

    let meta = format!(
        " {}ms | {} | {} headers ",
        response.time,
        format_size(response.size),
        response.headers.len()
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, false))
        .title(status_text)
        .title_bottom(Line::from(meta).right_aligned());

    // Use syntax highlighting for JSON
    let lines = highlight_json(&response.body_text());
    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.response_scroll, 0));
    f.render_widget(body, area);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    if let Some(toast) = &state.toast {
        let color = match toast.level {
            NotificationLevel::Info => Color::Green,
            NotificationLevel::Error => Color::Red,
        };
        let bar = Paragraph::new(format!(" {} ", toast.message))
            .style(Style::default().fg(color).bold());
        f.render_widget(bar, area);
        return;
    }

    let status = if state.is_loading {
        " Loading... "
    } else if state.input_mode == InputMode::Editing {
        " ESC:stop editing | arrows:move | Tab:next field "
    } else {
        " Tab:panel | 1-5:tab | e:edit | m:method | s:send | S:save | ?:help | q:quit "
    };

    let bar = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    f.render_widget(bar, area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 80, area);

    let help_text = r#"
 NAVIGATION
   Tab / Shift+Tab    Switch panels
   1-5                Params / Headers / Body / Auth / Code
   ↑ / ↓              Move in lists, scroll response

 REQUEST
   m                  Cycle HTTP method
   s                  Send request (Enter while editing URL)
   e / Enter          Edit focused field
   N                  New request
   i                  Import cURL
   E                  Cycle environment

 EDITOR
   Space / d          Toggle / delete row
   ← / →              Switch key and value
   b / t / l / f      Body type / auth type / key location / code format

 COLLECTIONS & HISTORY
   S / Ctrl+S         Save request / quick save
   n                  New collection
   Enter / d          Open / delete sidebar item
   X                  Clear history

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} v{} ", APP_NAME, APP_VERSION))
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn draw_save_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(60, 50, area);
    let form = &state.save_form;
    let active = Style::default().fg(Color::Yellow).bold();

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                "Name: ",
                if form.field == SaveField::Name { active } else { Style::default() },
            ),
            Span::raw(form.name.clone()),
        ]),
        Line::from(""),
        Line::from(Span::styled("Collection (↑/↓):", Style::default().fg(Color::DarkGray))),
    ];

    for (i, name) in state.collection_names.iter().enumerate() {
        let marker = if i == form.target { "(•) " } else { "( ) " };
        lines.push(Line::from(format!("  {}{}", marker, name)));
    }
    let new_selected = form.target >= state.collection_names.len();
    lines.push(Line::from(format!(
        "  {}+ New collection",
        if new_selected { "(•) " } else { "( ) " }
    )));
    if new_selected {
        lines.push(Line::from(vec![
            Span::styled(
                "  New collection name: ",
                if form.field == SaveField::NewCollectionName { active } else { Style::default() },
            ),
            Span::raw(form.new_collection_name.clone()),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Save Request (Tab:field Enter:save Esc:cancel) ")
        .style(Style::default().bg(Color::Black));

    f.render_widget(Clear, popup_area);
    f.render_widget(Paragraph::new(lines).block(block), popup_area);
}

fn draw_new_collection_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(50, 20, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" New Collection (Enter to create, Esc to cancel) ")
        .style(Style::default().bg(Color::Black));

    let content = if state.new_collection_name.is_empty() {
        "Collection name..."
    } else {
        state.new_collection_name.as_str()
    };

    f.render_widget(Clear, popup_area);
    f.render_widget(Paragraph::new(content).block(block), popup_area);
}

fn draw_curl_import_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(80, 30, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Import cURL (Enter to import, Esc to cancel) ")
        .style(Style::default().bg(Color::Black));

    let content = if state.curl_buffer.is_empty() {
        "Paste cURL command here..."
    } else {
        state.curl_buffer.as_str()
    };

    let input = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}
