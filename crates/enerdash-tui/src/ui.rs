//! Rendering for the dashboard.
//!
//! Strictly a consumer of panel snapshots: each frame reads every store
//! once and draws the schema-driven field tables. No synchronization
//! logic lives here.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use enerdash_core::{DeviceStore, FieldKind, FieldSpec};
use enerdash_types::DeviceState;

use crate::app::{App, Mode};

/// Draw the whole dashboard.
pub fn draw(frame: &mut Frame, app: &App) {
    let panel_specs: Vec<Vec<&'static FieldSpec>> = (0..app.panels().len())
        .map(|i| app.visible_specs(i))
        .collect();

    let mut constraints = vec![Constraint::Length(1)];
    for specs in &panel_specs {
        constraints.push(Constraint::Length(specs.len() as u16 + 2));
    }
    constraints.push(Constraint::Length(2));
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    frame.render_widget(header(app), chunks[0]);
    for (i, specs) in panel_specs.iter().enumerate() {
        render_panel(frame, app, i, specs, chunks[i + 1]);
    }
    frame.render_widget(footer(app), chunks[panel_specs.len() + 1]);
}

fn header(app: &App) -> Paragraph<'_> {
    let version = app
        .api_version
        .as_deref()
        .map(|v| format!("API {v}"))
        .unwrap_or_else(|| "API …".to_string());
    Paragraph::new(Line::from(vec![
        Span::styled(
            " enerdash ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("Energy Simulator Dashboard — "),
        Span::styled(version, Style::default().fg(Color::DarkGray)),
    ]))
}

fn render_panel(frame: &mut Frame, app: &App, idx: usize, specs: &[&'static FieldSpec], area: Rect) {
    let panel = &app.panels()[idx];
    let snapshot = panel.snapshot();
    let focused = app.focus_panel == idx;
    let selected = app.focus_field.min(specs.len().saturating_sub(1));

    let rows = specs.iter().enumerate().map(|(i, spec)| {
        let (marker, marker_style) = sync_marker(panel.store(), spec);
        let row = Row::new(vec![
            Cell::from(field_title(spec.path)),
            Cell::from(value_text(app, focused && i == selected, spec, &snapshot)),
            Cell::from(Span::styled(marker, marker_style)),
        ]);
        if focused && i == selected {
            row.style(Style::default().add_modifier(Modifier::REVERSED))
        } else {
            row
        }
    });

    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .title(format!(" {} ", panel.kind()))
        .borders(Borders::ALL)
        .border_style(border_style);
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(45),
            Constraint::Percentage(40),
            Constraint::Percentage(15),
        ],
    )
    .block(block);

    frame.render_widget(table, area);
}

fn footer(app: &App) -> Paragraph<'_> {
    let first = if let Mode::Editing { field, buffer } = &app.mode {
        Line::from(vec![
            Span::raw(format!("Enter new value for {field}: ")),
            Span::styled(
                format!("{buffer}▏"),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ])
    } else if let Some(msg) = app.status.last() {
        let style = if msg.error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };
        Line::from(Span::styled(msg.text.clone(), style))
    } else {
        Line::raw("")
    };

    let help = Line::from(Span::styled(
        " q quit · tab panel · ↑/↓ field · enter edit/toggle · h/l min · H/L max",
        Style::default().fg(Color::DarkGray),
    ));

    Paragraph::new(vec![first, help])
}

/// Value column text for one field row.
fn value_text(
    app: &App,
    is_selected: bool,
    spec: &FieldSpec,
    snapshot: &DeviceState,
) -> String {
    if is_selected
        && let Mode::Editing { field, buffer } = &app.mode
        && field == spec.path
    {
        return format!("{buffer}▏");
    }

    match spec.kind {
        FieldKind::Range { min, max } => {
            let lo = snapshot
                .number(min)
                .map(|n| n.to_string())
                .unwrap_or_else(|| "—".to_string());
            let hi = snapshot
                .number(max)
                .map(|n| n.to_string())
                .unwrap_or_else(|| "—".to_string());
            format!("{lo} – {hi} {}", spec.unit).trim_end().to_string()
        }
        _ => match snapshot.get(spec.path) {
            Some(value) if spec.unit.is_empty() => value.to_string(),
            Some(value) => format!("{value} {}", spec.unit),
            None => "—".to_string(),
        },
    }
}

/// Sync column marker: an in-flight edit shows as pending, a failed one
/// as unsynced until the next refresh.
fn sync_marker(store: &DeviceStore, spec: &FieldSpec) -> (&'static str, Style) {
    let (pending, unsynced) = match spec.kind {
        FieldKind::Range { min, max } => (
            store.is_pending(min) || store.is_pending(max),
            store.is_unsynced(min) || store.is_unsynced(max),
        ),
        _ => (store.is_pending(spec.path), store.is_unsynced(spec.path)),
    };
    if pending {
        ("sync…", Style::default().fg(Color::Yellow))
    } else if unsynced {
        ("unsynced", Style::default().fg(Color::Red))
    } else {
        ("", Style::default())
    }
}

/// Human label for a field path ("phase1.load_limit" -> "Phase1 Load Limit").
fn field_title(path: &str) -> String {
    path.split(['.', '_'])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
