use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::TableState;
use sandbox_core::{
    audit, pow::leading_zero_chars, tamper, view, AuditReport, BlockRow, Difficulty, JobId,
    MiningStatus, Session, TamperOutcome,
};
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tracing::{debug, info};

pub const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Chain,
    Mine,
    Links,
    Tamper,
    HashDemo,
}

impl Tab {
    pub const TITLES: [&'static str; 5] = ["Chain", "Mine", "Links", "Tamper", "HashDemo"];

    fn next(self) -> Self {
        match self {
            Tab::Chain => Tab::Mine,
            Tab::Mine => Tab::Links,
            Tab::Links => Tab::Tamper,
            Tab::Tamper => Tab::HashDemo,
            Tab::HashDemo => Tab::Chain,
        }
    }

    fn previous(self) -> Self {
        match self {
            Tab::Chain => Tab::HashDemo,
            Tab::Mine => Tab::Chain,
            Tab::Links => Tab::Mine,
            Tab::Tamper => Tab::Links,
            Tab::HashDemo => Tab::Tamper,
        }
    }
}

pub struct TamperResult {
    pub outcome: TamperOutcome,
    pub report: AuditReport,
}

pub struct App {
    pub session: Session,
    status_rx: watch::Receiver<MiningStatus>,
    pub tab: Tab,
    // chain
    pub rows: Vec<BlockRow>,
    pub chain_state: TableState,
    pub chain_popup: bool,
    pub links: String,
    // mining
    pub difficulty: Difficulty,
    pub mine_data: String,
    pub mine_status: MiningStatus,
    pub last_job: Option<JobId>,
    pub message: Option<String>,
    pub spinner: usize,
    // tamper lab
    pub tamper_cursor: usize,
    pub tamper_data: String,
    pub tamper_result: Option<TamperResult>,
    // hash demo
    pub hash_input: String,
    pub hash_output: String,
    pub hash_leading_zeros: usize,
}

impl App {
    pub fn new(session: Session) -> Self {
        let status_rx = session.subscribe();
        let mut app = Self {
            session,
            status_rx,
            tab: Tab::default(),
            rows: Vec::new(),
            chain_state: TableState::default(),
            chain_popup: false,
            links: String::new(),
            difficulty: Difficulty::default(),
            mine_data: String::new(),
            mine_status: MiningStatus::Idle,
            last_job: None,
            message: None,
            spinner: 0,
            tamper_cursor: 0,
            tamper_data: String::new(),
            tamper_result: None,
            hash_input: String::new(),
            hash_output: String::new(),
            hash_leading_zeros: 0,
        };
        app.refresh();
        app.update_hash_demo();
        app
    }

    /// Reloads the table and link graph from the session.
    pub fn refresh(&mut self) {
        let blocks = self.session.snapshot();
        self.rows = view::rows(&blocks);
        self.links = self.session.graph().to_text();

        let last = self.rows.len().saturating_sub(1);
        let selected = self.chain_state.selected().map(|i| i.min(last));
        self.chain_state.select(selected);
        self.tamper_cursor = self.tamper_cursor.min(last);
    }

    pub fn is_mining(&self) -> bool {
        self.mine_status.is_in_progress()
    }

    /// Picks up status changes published by the background miner.
    pub fn poll_mining(&mut self) {
        if !self.status_rx.has_changed().unwrap_or(false) {
            return;
        }
        let status = self.status_rx.borrow_and_update().clone();
        self.message = match &status {
            MiningStatus::Idle | MiningStatus::InProgress { .. } => None,
            MiningStatus::Finished {
                block,
                attempts,
                elapsed_ms,
                ..
            } => Some(format!(
                "Mined block #{} nonce={} hash={} ({attempts} attempts, {elapsed_ms} ms)",
                block.index, block.nonce, block.hash
            )),
            MiningStatus::Cancelled { job } => Some(format!("Job {job} cancelled")),
            MiningStatus::Discarded { job } => {
                Some(format!("Job {job} discarded: chain changed while mining"))
            }
        };
        self.mine_status = status;
        self.refresh();
    }

    pub fn tick(&mut self) {
        self.spinner = (self.spinner + 1) % SPINNER.len();
        self.poll_mining();
    }

    pub fn start_mining(&mut self) {
        let data = std::mem::take(&mut self.mine_data);
        let job = self.session.start_mining(data, self.difficulty);
        info!(job, difficulty = %self.difficulty, "mining started from tui");
        self.last_job = Some(job);
        self.poll_mining();
    }

    pub fn cancel_mining(&mut self) {
        if self.session.cancel_mining().is_none() {
            self.message = Some("Nothing to cancel".into());
        }
        self.poll_mining();
    }

    /// A running search targets the old difficulty, so a change abandons it.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        if difficulty == self.difficulty {
            return;
        }
        self.difficulty = difficulty;
        if self.is_mining() {
            self.cancel_mining();
        }
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.tamper_result = None;
        self.chain_state.select(None);
        self.tamper_cursor = 0;
        self.poll_mining();
        self.refresh();
        self.message = Some("Chain reset to genesis".into());
    }

    /// Edits a copy of the chain and audits it; the session's chain is untouched.
    pub fn run_tamper(&mut self) {
        let mode = self.session.config().timestamp_mode;
        let mut copy = self.session.snapshot();
        match tamper(&mut copy, self.tamper_cursor as u64, self.tamper_data.clone(), mode) {
            Ok(outcome) => {
                let report = audit(&copy, mode);
                debug!(index = outcome.index, findings = report.findings.len(), "tamper audited");
                self.tamper_result = Some(TamperResult { outcome, report });
            }
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    pub fn update_hash_demo(&mut self) {
        let digest = Sha256::digest(self.hash_input.as_bytes());
        self.hash_output = hex::encode(digest);
        self.hash_leading_zeros = leading_zero_chars(&self.hash_output);
    }

    fn next_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.chain_state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.chain_state.select(Some(i));
    }

    fn previous_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.chain_state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.chain_state.select(Some(i));
    }
}

/// Applies one key press. Returns `true` when the app should quit.
pub fn handle_key(app: &mut App, key: KeyEvent) -> Result<bool> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => return Ok(true),
        KeyCode::Esc => return Ok(true),
        KeyCode::Char('r') if ctrl => app.reset(),
        KeyCode::Tab => app.tab = app.tab.next(),
        KeyCode::BackTab => app.tab = app.tab.previous(),
        _ => match app.tab {
            Tab::Chain => match key.code {
                KeyCode::Down => app.next_row(),
                KeyCode::Up => app.previous_row(),
                KeyCode::Char('p') => app.chain_popup = !app.chain_popup,
                _ => {}
            },
            Tab::Mine => match key.code {
                KeyCode::Left => app.set_difficulty(app.difficulty.easier()),
                KeyCode::Right => app.set_difficulty(app.difficulty.harder()),
                // payload editing is paused while a job runs
                KeyCode::Char('x') if app.is_mining() => app.cancel_mining(),
                KeyCode::Char(c) if !c.is_control() => app.mine_data.push(c),
                KeyCode::Backspace => {
                    app.mine_data.pop();
                }
                KeyCode::Enter => app.start_mining(),
                _ => {}
            },
            Tab::Links => {}
            Tab::Tamper => match key.code {
                KeyCode::Up => app.tamper_cursor = app.tamper_cursor.saturating_sub(1),
                KeyCode::Down => {
                    if app.tamper_cursor + 1 < app.rows.len() {
                        app.tamper_cursor += 1;
                    }
                }
                KeyCode::Char(c) if !c.is_control() => app.tamper_data.push(c),
                KeyCode::Backspace => {
                    app.tamper_data.pop();
                }
                KeyCode::Enter => app.run_tamper(),
                _ => {}
            },
            Tab::HashDemo => match key.code {
                KeyCode::Char(c) if !c.is_control() => {
                    app.hash_input.push(c);
                    app.update_hash_demo();
                }
                KeyCode::Backspace => {
                    app.hash_input.pop();
                    app.update_hash_demo();
                }
                _ => {}
            },
        },
    }
    Ok(false)
}
