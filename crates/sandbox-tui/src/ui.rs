use ratatui::{
    layout::{Constraint, Direction, Flex, Layout, Rect},
    prelude::*,
    widgets::*,
    Frame,
};
use sandbox_core::{AuditReport, Finding, MiningStatus};

use crate::app::{App, Tab, SPINNER};

pub fn ui(f: &mut Frame, app: &mut App) {
    let size = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(size);

    let titles = Tab::TITLES
        .iter()
        .map(|t| Line::from(*t))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(titles)
        .select(app.tab as usize)
        .block(Block::default().borders(Borders::ALL).title("sandbox-tui"))
        .style(Style::default().fg(Color::Green))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match app.tab {
        Tab::Chain => render_chain(f, chunks[1], app),
        Tab::Mine => render_mine(f, chunks[1], app),
        Tab::Links => render_links(f, chunks[1], app),
        Tab::Tamper => render_tamper(f, chunks[1], app),
        Tab::HashDemo => render_hashdemo(f, chunks[1], app),
    }

    let help = Paragraph::new(
        "ESC quit • TAB prev/next tab • Ctrl-R reset chain • Chain: ↑/↓ select, p details • Mine: ←/→ difficulty, Enter mine, x cancel • Tamper: ↑/↓ block, Enter forge",
    )
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default().borders(Borders::ALL).title("help"));
    f.render_widget(help, chunks[2]);
}

fn render_chain(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.rows.iter().map(|b| {
        Row::new(vec![
            Cell::from(b.index.to_string()),
            Cell::from(b.time.clone()),
            Cell::from(b.nonce.to_string()),
            Cell::from(b.hash.clone()),
            Cell::from(b.previous_hash.clone()),
            Cell::from(b.data.clone()),
        ])
    });
    let table = Table::new(
        rows,
        vec![
            Constraint::Length(5),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(66),
            Constraint::Length(66),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["idx", "time", "nonce", "hash", "prev", "data"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .block(Block::default().borders(Borders::ALL).title("Chain blocks"));
    f.render_stateful_widget(table, area, &mut app.chain_state);

    if app.chain_popup {
        let popup = Block::bordered()
            .style(Style::default().bg(Color::Black).fg(Color::Yellow))
            .title("Block details")
            .title_style(Style::new().yellow().bold())
            .border_style(Style::new().red().bold());
        let items = match app.chain_state.selected().and_then(|i| app.rows.get(i)) {
            None => vec!["No block selected".to_string()],
            Some(b) => vec![
                format!(" Index     : {}", b.index),
                format!(" Timestamp : {} ({} UTC)", b.timestamp, b.time),
                format!(" Nonce     : {}", b.nonce),
                format!(" Hash      : {}", b.hash),
                format!(" Prev hash : {}", b.previous_hash),
                format!(" Data      : {}", b.data),
            ],
        };
        let list = List::new(items).block(popup);
        let popup_area = centered_area(area, 60, 25);
        f.render_widget(Clear, popup_area);
        f.render_widget(list, popup_area);
    }
}

fn render_mine(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let top = Paragraph::new(format!(
        "Difficulty: {}  target prefix {:?}   (←/→ to adjust)",
        app.difficulty,
        app.difficulty.target_prefix()
    ))
    .block(Block::default().borders(Borders::ALL).title("Difficulty"));
    f.render_widget(top, chunks[0]);

    let data = Paragraph::new(app.mine_data.clone()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Block data (type, Backspace, Enter to mine)"),
    );
    f.render_widget(data, chunks[1]);

    let progress = match &app.mine_status {
        MiningStatus::InProgress {
            job,
            data,
            difficulty,
        } => format!(
            "{} job {job}: mining {data:?} at difficulty {difficulty}  (x to cancel)",
            SPINNER[app.spinner]
        ),
        _ => "idle".to_string(),
    };
    let progress = Paragraph::new(progress)
        .block(Block::default().borders(Borders::ALL).title("Miner"));
    f.render_widget(progress, chunks[2]);

    let status = Paragraph::new(app.message.clone().unwrap_or_default())
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[3]);
}

fn render_links(f: &mut Frame, area: Rect, app: &App) {
    let links = Paragraph::new(app.links.clone())
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Hash links"));
    f.render_widget(links, area);
}

fn render_tamper(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let target = app
        .rows
        .get(app.tamper_cursor)
        .map(|b| format!("Block #{}: {:?}\nhash {}", b.index, b.data, b.hash))
        .unwrap_or_else(|| "No block".to_string());
    let target = Paragraph::new(target)
        .block(Block::default().borders(Borders::ALL).title("Target (↑/↓)"));
    f.render_widget(target, chunks[0]);

    let data = Paragraph::new(app.tamper_data.clone()).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Forged data (Enter to rewrite a copy)"),
    );
    f.render_widget(data, chunks[1]);

    let lines = match &app.tamper_result {
        None => vec![Line::from("The live chain is never modified here.")],
        Some(result) => {
            let mut lines = vec![
                Line::from(format!(
                    "Block #{} {:?} -> {:?}",
                    result.outcome.index, result.outcome.original_data, app.tamper_data
                )),
                Line::from(format!("old hash {}", result.outcome.original_hash)),
                Line::from(format!("new hash {}", result.outcome.new_hash)),
            ];
            lines.extend(audit_lines(&result.report));
            lines
        }
    };
    let result = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Audit of the copy"));
    f.render_widget(result, chunks[2]);
}

fn audit_lines(report: &AuditReport) -> Vec<Line<'static>> {
    if report.is_valid() {
        return vec![Line::from("chain valid").style(Style::default().fg(Color::Green))];
    }
    report
        .findings
        .iter()
        .map(|finding| {
            let text = match finding {
                Finding::GenesisMalformed { index, .. } => format!("#{index}: malformed genesis"),
                Finding::IndexGap { index, expected } => {
                    format!("#{index}: expected index {expected}")
                }
                Finding::HashMismatch { index, .. } => format!("#{index}: stored hash is stale"),
                Finding::BrokenLink { index, .. } => {
                    format!("#{index}: link to predecessor broken")
                }
            };
            Line::from(text).style(Style::default().fg(Color::Red))
        })
        .collect()
}

fn render_hashdemo(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .split(area);

    let input = Paragraph::new(app.hash_input.clone())
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Input"));
    f.render_widget(input, chunks[0]);

    let out = Paragraph::new(format!(
        "sha256: {}\nleading zero hex chars: {}",
        app.hash_output, app.hash_leading_zeros
    ))
    .block(Block::default().borders(Borders::ALL).title("Output"));
    f.render_widget(out, chunks[1]);

    let help = Paragraph::new(
        "Type to update the hash. Each extra leading zero makes a block about 16x harder to mine.",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, chunks[2]);
}

/// Create a centered rect using the given percentage of the available rect
fn centered_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let [area] = vertical.areas(area);

    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = horizontal.areas(area);

    area
}
