//! Widget helpers shared by the draw functions

use ratatui::{prelude::*, widgets::*};

use crate::messages::ui_events::RowField;
use crate::models::KeyValue;

/// Border style for a panel: yellow while editing, cyan when focused
pub fn border_style(focused: bool, editing: bool) -> Style {
    if focused && editing {
        Style::default().fg(Color::Yellow)
    } else if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Renders a key-value row list (params, headers, form fields)
pub fn render_key_value_list<'a>(
    rows: &'a [KeyValue],
    title: String,
    selected: Option<(usize, RowField)>,
    is_focused: bool,
) -> List<'a> {
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let base = if !row.enabled {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            let field_style = |field: RowField| match selected {
                Some((index, active)) if index == i && active == field => {
                    base.fg(Color::Yellow).bold()
                }
                Some((index, _)) if index == i => base.bold(),
                _ => base,
            };

            let prefix = if row.enabled { "[x] " } else { "[ ] " };
            let key = if row.key.is_empty() { "key" } else { row.key.as_str() };
            let value = if row.value.is_empty() { "value" } else { row.value.as_str() };
            let placeholder = Style::default().fg(Color::DarkGray);

            ListItem::new(Line::from(vec![
                Span::styled(prefix, base),
                Span::styled(
                    key,
                    if row.key.is_empty() { placeholder } else { field_style(RowField::Key) },
                ),
                Span::styled(": ", base),
                Span::styled(
                    value,
                    if row.value.is_empty() { placeholder } else { field_style(RowField::Value) },
                ),
            ]))
        })
        .collect();

    List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(is_focused, false))
            .title(title),
    )
}

/// Renders tabs
pub fn render_tabs<'a>(titles: &[&'a str], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// Simple JSON syntax highlighting
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for line in text.lines() {
        let mut spans = Vec::new();
        let mut current = String::new();
        let mut in_string = false;
        let mut is_key = false;

        for (offset, c) in line.char_indices() {
            match c {
                '"' => {
                    if in_string && current.ends_with('\\') {
                        current.push(c);
                        continue;
                    }
                    if in_string {
                        current.push(c);
                        let color = if is_key { Color::Cyan } else { Color::Green };
                        spans.push(Span::styled(
                            std::mem::take(&mut current),
                            Style::default().fg(color),
                        ));
                        in_string = false;
                        is_key = false;
                    } else {
                        if !current.is_empty() {
                            spans.push(Span::raw(std::mem::take(&mut current)));
                        }
                        in_string = true;
                        current.push(c);
                        // A key is a string followed by a colon
                        is_key = closing_quote(line, offset)
                            .map(|end| line[end + 1..].trim_start().starts_with(':'))
                            .unwrap_or(false);
                    }
                }
                _ if in_string => current.push(c),
                ':' | ',' => {
                    if !current.is_empty() {
                        spans.push(literal_span(std::mem::take(&mut current)));
                    }
                    spans.push(Span::styled(c.to_string(), Style::default().fg(Color::White)));
                }
                '{' | '}' | '[' | ']' => {
                    if !current.is_empty() {
                        spans.push(literal_span(std::mem::take(&mut current)));
                    }
                    spans.push(Span::styled(
                        c.to_string(),
                        Style::default().fg(Color::Yellow),
                    ));
                }
                _ => current.push(c),
            }
        }

        if !current.is_empty() {
            spans.push(literal_span(current));
        }

        lines.push(Line::from(spans));
    }

    lines
}

/// Byte offset of the quote closing the string opened at `start`
fn closing_quote(line: &str, start: usize) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in line[start + 1..].char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(start + 1 + i),
            _ => escaped = false,
        }
    }
    None
}

/// Numbers yellow, true/false/null magenta, anything else plain
fn literal_span(text: String) -> Span<'static> {
    let trimmed = text.trim();
    if matches!(trimmed, "true" | "false" | "null") {
        Span::styled(text, Style::default().fg(Color::Magenta))
    } else if !trimmed.is_empty() && trimmed.parse::<f64>().is_ok() {
        Span::styled(text, Style::default().fg(Color::Yellow))
    } else {
        Span::raw(text)
    }
}

/// Status code color
pub fn status_color(code: u16) -> Color {
    match code {
        200..=299 => Color::Green,
        300..=399 => Color::Cyan,
        400..=499 => Color::Red,
        500..=599 => Color::Magenta,
        _ => Color::Yellow,
    }
}

/// Method color
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Yellow,
        "PUT" => Color::Blue,
        "PATCH" => Color::Cyan,
        "DELETE" => Color::Red,
        _ => Color::White,
    }
}

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

/// Column and line of a byte cursor inside multi-line text
pub fn cursor_line_col(text: &str, cursor: usize) -> (u16, u16) {
    let before = &text[..cursor.min(text.len())];
    let line = before.matches('\n').count();
    let col = before
        .rsplit('\n')
        .next()
        .map(|s| s.chars().count())
        .unwrap_or(0);
    (col as u16, line as u16)
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_keys_and_values_get_distinct_colors() {
        let lines = highlight_json(r#"  "name": "jo", "n": 3"#);
        let spans = &lines[0].spans;
        let key = spans.iter().find(|s| s.content == "\"name\"").unwrap();
        let value = spans.iter().find(|s| s.content == "\"jo\"").unwrap();
        assert_eq!(key.style.fg, Some(Color::Cyan));
        assert_eq!(value.style.fg, Some(Color::Green));
        let number = spans.iter().find(|s| s.content.trim() == "3").unwrap();
        assert_eq!(number.style.fg, Some(Color::Yellow));
    }

    #[test]
    fn cursor_position_in_multiline_text() {
        assert_eq!(cursor_line_col("{\n  \"a\"", 7), (5, 1));
        assert_eq!(cursor_line_col("abc", 2), (2, 0));
        assert_eq!(cursor_line_col("", 10), (0, 0));
    }

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
