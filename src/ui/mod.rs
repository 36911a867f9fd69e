use crate::app::{AppModel, SessionPhase};
use ratatui::prelude::*;
use ratatui::widgets::*;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn render(frame: &mut Frame, model: &AppModel) {
    let area = frame.area();
    if area.width == 0 || area.height == 0 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_search(frame, chunks[0], model);
    render_dataset_list(frame, chunks[1], model);
    render_footer(frame, chunks[2], model);
}

fn render_search(frame: &mut Frame, area: Rect, model: &AppModel) {
    let search_text = if model.view.query.is_empty() {
        Text::from(Line::from(Span::styled(
            "Type to filter datasets…",
            Style::default().fg(Color::DarkGray),
        )))
    } else {
        Text::from(model.view.query.as_str())
    };
    let search = Paragraph::new(search_text).block(
        Block::default()
            .borders(Borders::ALL)
            .padding(Padding::horizontal(1))
            .title("Search"),
    );
    frame.render_widget(search, area);
}

fn render_dataset_list(frame: &mut Frame, area: Rect, model: &AppModel) {
    let title = format!("Datasets ({} loaded)", model.catalog.len());

    if model.view.filtered_indices.is_empty() {
        let message = if model.catalog.is_empty() {
            "No datasets loaded. Press Ctrl+R to refresh."
        } else {
            "No matching datasets. Press Esc to clear the filter."
        };
        let empty = Paragraph::new(message).block(
            Block::default()
                .borders(Borders::ALL)
                .padding(Padding::horizontal(1))
                .title(title),
        );
        frame.render_widget(empty, area);
        return;
    }

    let max_width = (area.width as usize).saturating_sub(10);
    let items: Vec<ListItem> = model
        .view
        .filtered_indices
        .iter()
        .enumerate()
        .filter_map(|(position, index)| {
            model.catalog.get(*index).map(|record| {
                let marker = if model.view.checked.contains(&position) {
                    "[x] "
                } else {
                    "[ ] "
                };
                let name = truncate_to_width(&record.name, max_width);
                let style = if model.view.checked.contains(&position) {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::raw(marker),
                    Span::styled(name, style),
                ]))
            })
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .padding(Padding::horizontal(1))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut state = ListState::default();
    state.select(Some(
        model
            .view
            .cursor
            .min(model.view.filtered_indices.len().saturating_sub(1)),
    ));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_footer(frame: &mut Frame, area: Rect, model: &AppModel) {
    let keys =
        "Keys: arrows=move  Space=select  Enter=open  Esc=clear  Ctrl+R=refresh  Ctrl+Q/Ctrl+C=quit";
    let mut text = format!("{keys}  ·  {}", model.status);
    if let Some(notice) = &model.notice {
        if !notice.trim().is_empty() {
            text.push_str("  ·  ");
            text.push_str(notice);
        }
    }

    let style = match model.phase {
        SessionPhase::AuthenticationFailed | SessionPhase::FetchFailed => {
            Style::default().fg(Color::Red)
        }
        SessionPhase::Authenticating | SessionPhase::Fetching => {
            Style::default().fg(Color::Yellow)
        }
        _ => Style::default().fg(Color::DarkGray),
    };
    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > max_width.saturating_sub(1) {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('…');
    out
}
