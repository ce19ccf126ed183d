use std::fmt;

use chrono::{Local, NaiveDate};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::{SessionConfig, sanitize_probability},
    core::{
        extract::SheetRow,
        ledger::WinnerLedger,
        roster::NameRoster,
    },
    import::{Export, ImportError, SpreadsheetAdapter, export_file_name, validate_upload},
    types::{AwardTier, DrawMode, Phase, WinnerId},
    winner::Winner,
};

/// Errors from configuring the special override.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverrideError {
    /// The override name was blank.
    #[error("override name is empty")]
    Empty,
    /// The override was already confirmed once.
    #[error("override already set to {0}")]
    Locked(String),
}

/// Name shown by one spin tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTick {
    /// Name to render.
    pub name: String,
    /// True when the tick showed the special override instead of a roster pick.
    pub from_override: bool,
}

/// Persistent one-line status for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    /// No roster loaded.
    AwaitingImport,
    /// Tiered mode with names loaded but no award picked.
    AwaitingAward {
        /// Roster size.
        remaining: usize,
    },
    /// Ready to start.
    Ready {
        /// Roster size.
        remaining: usize,
    },
    /// Timer running.
    Spinning,
    /// Every name has been drawn.
    Exhausted,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingImport => f.write_str("等待导入名单"),
            Self::AwaitingAward { remaining } => write!(f, "请选择奖项，共 {remaining} 人"),
            Self::Ready { remaining } => write!(f, "就绪，共 {remaining} 人"),
            Self::Spinning => f.write_str("抽奖中..."),
            Self::Exhausted => f.write_str("名单已抽完"),
        }
    }
}

/// One operator's draw state: roster, winner history and the spin cycle.
pub struct DrawSession {
    roster: NameRoster,
    ledger: WinnerLedger,
    mode: DrawMode,
    override_probability: f64,
    running: bool,
    current_index: usize,
    selected_award: Option<AwardTier>,
    special_override: Option<String>,
    exhausted: bool,
    export_label: String,
    rng: StdRng,
}

impl DrawSession {
    /// Creates a session over an already-loaded ledger.
    pub fn new(ledger: WinnerLedger, config: &SessionConfig) -> Self {
        Self::with_rng(ledger, config, StdRng::from_entropy())
    }

    /// Creates a session with a caller-supplied random source.
    pub fn with_rng(ledger: WinnerLedger, config: &SessionConfig, rng: StdRng) -> Self {
        Self {
            roster: NameRoster::new(),
            ledger,
            mode: config.mode,
            override_probability: sanitize_probability(config.override_probability),
            running: false,
            current_index: 0,
            selected_award: None,
            special_override: None,
            exhausted: false,
            export_label: config.export_label.clone(),
            rng,
        }
    }

    /// Replaces the roster with names extracted from `rows`.
    ///
    /// A failed import leaves the roster empty.
    pub fn import_rows(&mut self, rows: &[SheetRow]) -> Result<usize, ImportError> {
        if self.running {
            return Err(ImportError::DrawInProgress);
        }
        self.exhausted = false;
        match self.roster.load_rows(rows) {
            Ok(count) => {
                tracing::info!(count, "imported roster");
                Ok(count)
            }
            Err(err) => {
                tracing::warn!(rows = rows.len(), "import produced no names");
                Err(err.into())
            }
        }
    }

    /// Validates, parses and imports an uploaded workbook.
    pub fn import_file(
        &mut self,
        adapter: &dyn SpreadsheetAdapter,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<usize, ImportError> {
        if self.running {
            return Err(ImportError::DrawInProgress);
        }
        let file_name = validate_upload(file_name)?;
        let rows = match adapter.parse_rows(bytes) {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(file_name, error = %err, "workbook parse failed");
                self.roster.clear();
                self.exhausted = false;
                return Err(err);
            }
        };
        self.import_rows(&rows)
    }

    /// Picks the award for upcoming draws. Ignored while spinning.
    pub fn select_award(&mut self, tier: AwardTier) {
        if self.running {
            return;
        }
        self.selected_award = Some(tier);
    }

    /// Sets the guaranteed special-tier winner. Can only be set once.
    pub fn set_special_override(&mut self, name: &str) -> Result<(), OverrideError> {
        if let Some(existing) = &self.special_override {
            return Err(OverrideError::Locked(existing.clone()));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(OverrideError::Empty);
        }
        tracing::info!("special override configured");
        self.special_override = Some(name.to_string());
        Ok(())
    }

    /// Whether [`Self::start`] would succeed.
    pub fn can_start(&self) -> bool {
        !self.running
            && !self.roster.is_empty()
            && (self.mode == DrawMode::Plain || self.selected_award.is_some())
    }

    /// Enters the spinning phase. Returns false, changing nothing, when the
    /// session cannot start.
    pub fn start(&mut self) -> bool {
        if !self.can_start() {
            return false;
        }
        self.running = true;
        self.current_index = self.roster.pick_random_index(&mut self.rng);
        tracing::debug!(roster = self.roster.len(), award = ?self.active_award(), "draw started");
        true
    }

    /// Advances the spin animation by one step.
    pub fn tick(&mut self) -> Option<DisplayTick> {
        if !self.running {
            return None;
        }
        let override_name = self.override_in_play().map(str::to_string);
        if let Some(name) = override_name {
            if self.rng.gen_bool(self.override_probability) {
                return Some(DisplayTick {
                    name,
                    from_override: true,
                });
            }
        }
        self.current_index = self.roster.pick_random_index(&mut self.rng);
        self.roster.get(self.current_index).map(|name| DisplayTick {
            name: name.to_string(),
            from_override: false,
        })
    }

    /// Ends the spin and records the winner. `None` when not spinning.
    pub fn stop(&mut self) -> Option<Winner> {
        if !self.running {
            return None;
        }
        self.running = false;

        let (name, from_override) = match self.override_in_play() {
            Some(name) => (name.to_string(), true),
            None => (self.roster.get(self.current_index)?.to_string(), false),
        };

        let award = self.active_award();
        let (winner, saved) = self.ledger.record(name, award, Local::now());
        if let Err(err) = saved {
            tracing::error!(id = winner.id, error = %err, "failed to persist winner ledger");
        }

        if !from_override {
            self.roster.remove_at(self.current_index);
            self.current_index = 0;
            if self.roster.is_empty() {
                self.exhausted = true;
                tracing::info!("roster exhausted");
            }
        }
        tracing::info!(id = winner.id, award = ?winner.award, from_override, "winner recorded");
        Some(winner)
    }

    /// Removes a winner from the history. Returns whether it existed.
    pub fn delete_winner(&mut self, id: WinnerId) -> bool {
        let (removed, saved) = self.ledger.delete_by_id(id);
        if let Err(err) = saved {
            tracing::error!(id, error = %err, "failed to persist winner ledger");
        }
        tracing::info!(id, removed, "winner deleted");
        removed
    }

    /// Flushes the ledger's backing store, logging any failure.
    pub fn flush_ledger(&mut self) -> bool {
        match self.ledger.flush() {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "failed to flush winner ledger");
                false
            }
        }
    }

    /// Builds the winner-history workbook for `today`.
    pub fn export(
        &self,
        adapter: &dyn SpreadsheetAdapter,
        today: NaiveDate,
    ) -> Result<Export, ImportError> {
        let bytes = adapter.write_workbook(&self.ledger.export_rows())?;
        Ok(Export {
            file_name: export_file_name(&self.export_label, today),
            bytes,
        })
    }

    /// Current observable phase.
    pub fn phase(&self) -> Phase {
        if self.running {
            Phase::Spinning
        } else if self.mode == DrawMode::Tiered && self.selected_award.is_some() {
            Phase::AwardSelected
        } else {
            Phase::Idle
        }
    }

    /// Persistent status line for the operator.
    pub fn status_line(&self) -> StatusLine {
        if self.running {
            StatusLine::Spinning
        } else if self.roster.is_empty() {
            if self.exhausted {
                StatusLine::Exhausted
            } else {
                StatusLine::AwaitingImport
            }
        } else if self.mode == DrawMode::Tiered && self.selected_award.is_none() {
            StatusLine::AwaitingAward {
                remaining: self.roster.len(),
            }
        } else {
            StatusLine::Ready {
                remaining: self.roster.len(),
            }
        }
    }

    /// Returns true while spinning.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Names still eligible to be drawn.
    pub fn roster(&self) -> &NameRoster {
        &self.roster
    }

    /// Winner history.
    pub fn ledger(&self) -> &WinnerLedger {
        &self.ledger
    }

    /// Plain or tiered.
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// Award chosen for upcoming draws.
    pub fn selected_award(&self) -> Option<AwardTier> {
        self.selected_award
    }

    /// Configured guaranteed special-tier winner.
    pub fn special_override(&self) -> Option<&str> {
        self.special_override.as_deref()
    }

    /// Roster index the current spin has landed on.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    fn active_award(&self) -> Option<AwardTier> {
        match self.mode {
            DrawMode::Plain => None,
            DrawMode::Tiered => self.selected_award,
        }
    }

    fn override_in_play(&self) -> Option<&str> {
        match self.active_award() {
            Some(AwardTier::Special) => self.special_override.as_deref(),
            _ => None,
        }
    }
}
