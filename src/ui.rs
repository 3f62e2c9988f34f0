use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::{App, Focus};
use crate::dispatch::Dispatcher;
use crate::form::FormField;
use crate::task::StatusFilter;
use crate::task_manager::ApiEvent;

const TICK: Duration = Duration::from_millis(100);

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    dispatcher: &Dispatcher,
    events: &mut UnboundedReceiver<ApiEvent>,
) -> io::Result<()> {
    dispatcher.dispatch(app.manager.load_all());

    while !app.should_quit {
        while let Ok(event) = events.try_recv() {
            app.apply(event);
        }

        terminal.draw(|f| draw(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(command) = app.handle_key(key) {
                dispatcher.dispatch(command);
            }
        }
    }
    Ok(())
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_filter(f, app, chunks[0]);
    draw_form(f, app, chunks[1]);
    draw_table(f, app, chunks[2]);
    draw_status_line(f, app, chunks[3]);
}

fn draw_filter(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw("Filter by status: ")];
    for option in StatusFilter::OPTIONS {
        let style = if option == app.manager.filter() {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("[{}] ", option.label()), style));
    }

    let filter = Paragraph::new(Line::from(spans))
        .block(Block::default().title("Task Management").borders(Borders::ALL));
    f.render_widget(filter, area);
}

fn draw_form(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.manager.editing() {
        Some(task) => format!("Edit Task #{}", task.id),
        None => "Add New Task".to_string(),
    };
    let form = app.manager.form();

    let lines: Vec<Line> = FormField::ORDER
        .iter()
        .map(|&field| {
            let focused = app.focus == Focus::Form(field);
            let label_style = if focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let value = match field {
                FormField::DueDate if form.due_date.is_empty() && !focused => {
                    Span::styled("YYYY-MM-DD", Style::default().fg(Color::DarkGray))
                }
                FormField::Status => Span::raw(format!("< {} >", form.status)),
                _ => Span::raw(form.value(field).to_string()),
            };
            let cursor = if focused && field != FormField::Status {
                "_"
            } else {
                ""
            };
            Line::from(vec![
                Span::styled(format!("{:<12}", field.label()), label_style),
                value,
                Span::raw(cursor),
            ])
        })
        .collect();

    let border_style = if matches!(app.focus, Focus::Form(_)) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    f.render_widget(paragraph, area);
}

fn draw_table(f: &mut Frame, app: &App, area: Rect) {
    let visible = app.manager.visible_tasks();
    let title = format!("Task List ({} of {})", visible.len(), app.manager.tasks().len());
    let rows: Vec<Row> = visible
        .into_iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(t.title.clone()),
                Cell::from(t.description.clone()),
                Cell::from(t.status.as_str()),
                Cell::from(t.due_date.to_string()),
            ])
        })
        .collect();

    let header = Row::new(vec!["Title", "Description", "Status", "Due Date"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let border_style = if app.focus == Focus::Table {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(25),
            Constraint::Percentage(45),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style),
    )
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = TableState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_status_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(err) = &app.form_error {
        Line::styled(err.to_string(), Style::default().fg(Color::Yellow))
    } else if let Some(err) = app.manager.last_error() {
        Line::styled(err.to_string(), Style::default().fg(Color::Red))
    } else {
        let help = match app.focus {
            Focus::Table => "q quit | a add | e edit | d delete | s status | f filter",
            Focus::Form(_) => "Tab next field | Enter save | Esc table | Ctrl-X cancel edit",
        };
        Line::styled(help, Style::default().fg(Color::DarkGray))
    };
    f.render_widget(Paragraph::new(line), area);
}
