use crate::application::{App, Notice, Severity};
use crate::domain::{StepContract, WizardState};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const FIELD_PREFIX: &str = "  > ";

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_progress(f, app, chunks[1]);
    match app.controller.state() {
        WizardState::Step(index) => {
            if let Some(contract) = app.controller.steps().get(index) {
                render_step_form(f, app, contract, chunks[2]);
            }
        }
        WizardState::Review => render_review(f, app, chunks[2]),
        WizardState::Submitted => render_submitted(f, app, chunks[2]),
    }
    render_status_bar(f, app, chunks[3]);

    if let Some(notice) = app.notices.current() {
        render_notice(f, notice, chunks[2]);
    }
    if app.show_help {
        render_help_popup(f);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let record = app
        .controller
        .session()
        .record_id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "not created yet".to_string());
    let header = Paragraph::new(format!("loan-wizard - Loan Application | Record: {}", record))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_progress(f: &mut Frame, app: &App, area: Rect) {
    let active = app.controller.session().active_step();
    let mut spans = Vec::new();
    let titles = app
        .controller
        .steps()
        .iter()
        .map(|contract| contract.title)
        .chain(std::iter::once("Review"));

    for (index, title) in titles.enumerate() {
        if index > 0 {
            spans.push(Span::raw("  >  "));
        }
        let style = if index == active {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else if index < active {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{}. {}", index + 1, title), style));
    }

    let progress = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title("Steps"));
    f.render_widget(progress, area);
}

fn render_step_form(f: &mut Frame, app: &App, contract: &StepContract, area: Rect) {
    let mut lines = Vec::new();
    let mut cursor_line = None;

    for (index, rule) in contract.fields.iter().enumerate() {
        let focused = index == app.focused_field;
        let marker = if rule.required { " *" } else { " (optional)" };
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        lines.push(Line::from(Span::styled(format!("{}{}", rule.label, marker), label_style)));

        if focused {
            cursor_line = Some(lines.len());
        }
        let value = app.inputs.get(index).map(String::as_str).unwrap_or("");
        let value_style = if focused {
            Style::default().fg(Color::White).bg(Color::Blue)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![Span::raw(FIELD_PREFIX), Span::styled(value.to_string(), value_style)]));

        for message in app.field_errors.get(rule.name) {
            lines.push(Line::from(Span::styled(format!("    {}", message), Style::default().fg(Color::Red))));
        }
        lines.push(Line::from(""));
    }

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Step {}: {}", contract.index + 1, contract.title)),
    );
    f.render_widget(form, area);

    if let Some(line) = cursor_line {
        let x = area.x + 1 + FIELD_PREFIX.len() as u16 + app.cursor_position as u16;
        let y = area.y + 1 + line as u16;
        if y < area.y + area.height.saturating_sub(1) {
            f.set_cursor_position((x, y));
        }
    }
}

fn render_review(f: &mut Frame, app: &App, area: Rect) {
    let session = app.controller.session();
    let json = serde_json::to_string_pretty(session.data()).unwrap_or_default();

    let mut lines: Vec<Line> = json.lines().map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::from(""));
    let checkbox = if session.confirmed() { "[x]" } else { "[ ]" };
    lines.push(Line::from(Span::styled(
        format!("{} I confirm all data is correct", checkbox),
        Style::default().fg(Color::Yellow),
    )));

    let review = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Review Information"))
        .wrap(Wrap { trim: false });
    f.render_widget(review, area);
}

fn render_submitted(f: &mut Frame, app: &App, area: Rect) {
    let record = app
        .controller
        .session()
        .record_id()
        .map(|id| format!("Application record: {}", id))
        .unwrap_or_default();
    let text = vec![
        Line::from(Span::styled("Form submitted successfully!", Style::default().fg(Color::Green))),
        Line::from(record),
        Line::from(""),
        Line::from("Press Enter to start a new application."),
    ];
    let done = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Submitted"));
    f.render_widget(done, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.is_syncing() {
        ("Saving step...".to_string(), Style::default().fg(Color::Magenta))
    } else {
        match app.controller.state() {
            WizardState::Step(0) => (
                "Tab/↑↓: field | Enter: next | Ctrl+R: restart | F1: help | Esc: quit".to_string(),
                Style::default(),
            ),
            WizardState::Step(_) => (
                "Tab/↑↓: field | Enter: next | Ctrl+B: back | Ctrl+R: restart | F1: help | Esc: quit".to_string(),
                Style::default(),
            ),
            WizardState::Review => (
                "Space: toggle confirmation | Enter: submit | Ctrl+B: back | Ctrl+R: restart | Esc: quit".to_string(),
                Style::default().fg(Color::Yellow),
            ),
            WizardState::Submitted => (
                "Enter/Ctrl+R: restart form | Esc: quit".to_string(),
                Style::default().fg(Color::Green),
            ),
        }
    };

    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(style);
    f.render_widget(status, area);
}

fn render_notice(f: &mut Frame, notice: &Notice, area: Rect) {
    let height = 3.min(area.height);
    let popup_area = Rect {
        x: area.x + area.width / 10,
        y: area.y + area.height.saturating_sub(height),
        width: area.width * 4 / 5,
        height,
    };
    let (title, color) = match notice.severity {
        Severity::Success => ("Success", Color::Green),
        Severity::Error => ("Error", Color::Red),
    };

    f.render_widget(Clear, popup_area);
    let widget = Paragraph::new(notice.message.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} (Ctrl+D to dismiss)", title))
                .style(Style::default().fg(color)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(widget, popup_area);
}

fn render_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);
    let help_widget = Paragraph::new(get_help_text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("loan-wizard Help")
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false });
    f.render_widget(help_widget, popup_area);
}

fn get_help_text() -> &'static str {
    r#"LOAN APPLICATION WIZARD

=== STEPS ===
1. Personal info     first name, last name, date of birth (YYYY-MM-DD)
2. Contact details   email, phone number in E.164 format (+491701234567)
3. Loan request      loan amount (10,000 - 70,000), upfront payment, terms (10 - 30 months)
4. Financial info    monthly salary, optional additional income, mortgage, other credits
5. Review            check the data, confirm and submit

Each step is saved to the record store when you press Enter.
Progress is kept on disk, so you can quit and continue later.
The loan must be covered by half of the disposable income over the term.

=== EDITING ===
Tab / ↓         Next field
Shift+Tab / ↑   Previous field
← → Home End    Move cursor
Backspace/Del   Delete characters
Enter           Validate and save the step

=== NAVIGATION ===
Ctrl+B          Previous step
Space           Toggle confirmation (review)
Ctrl+R          Start over (clears saved progress)
Ctrl+D          Dismiss the current message
F1              Show this help
Esc / Ctrl+C    Quit (close help first)"#
}
