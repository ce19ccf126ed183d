use chrono::NaiveDate;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{Duration, Instant, Interval, MissedTickBehavior},
};

use crate::{
    config::SessionConfig,
    import::{Export, ImportError, SheetRow, SpreadsheetAdapter},
    session::machine::{DrawSession, OverrideError, StatusLine},
    types::{AwardTier, Phase, WinnerId},
    winner::Winner,
};

use super::events::{DrawEvent, NoticeLevel};

/// Errors returned through a [`DrawHandle`].
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Import was rejected.
    #[error(transparent)]
    Import(#[from] ImportError),
    /// Override could not be set.
    #[error(transparent)]
    Override(#[from] OverrideError),
    /// The writer task has exited.
    #[error("draw runtime stopped")]
    ChannelClosed,
}

/// Point-in-time view of the session for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Observable phase.
    pub phase: Phase,
    /// Operator-facing status text.
    pub line: StatusLine,
    /// Names left to draw.
    pub roster_len: usize,
    /// Winners in the ledger.
    pub winner_count: usize,
    /// Award selected for the next draw.
    pub selected_award: Option<AwardTier>,
    /// Whether a start would be accepted.
    pub can_start: bool,
}

impl SessionStatus {
    fn of(session: &DrawSession) -> Self {
        Self {
            phase: session.phase(),
            line: session.status_line(),
            roster_len: session.roster().len(),
            winner_count: session.ledger().len(),
            selected_award: session.selected_award(),
            can_start: session.can_start(),
        }
    }
}

/// Cloneable handle to a draw session running on its own task.
pub struct DrawHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<DrawEvent>,
}

impl Clone for DrawHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    ImportFile {
        file_name: Option<String>,
        bytes: Vec<u8>,
        resp: oneshot::Sender<Result<usize, RuntimeError>>,
    },
    ImportRows {
        rows: Vec<SheetRow>,
        resp: oneshot::Sender<Result<usize, RuntimeError>>,
    },
    SelectAward {
        tier: AwardTier,
        resp: oneshot::Sender<SessionStatus>,
    },
    SetOverride {
        name: String,
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
    Start {
        resp: oneshot::Sender<bool>,
    },
    Stop {
        resp: oneshot::Sender<Option<Winner>>,
    },
    DeleteWinner {
        id: WinnerId,
        resp: oneshot::Sender<bool>,
    },
    Winners {
        resp: oneshot::Sender<Vec<Winner>>,
    },
    Status {
        resp: oneshot::Sender<SessionStatus>,
    },
    Export {
        today: NaiveDate,
        resp: oneshot::Sender<Result<Export, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Timers owned by the writer loop. At most one spin ticker exists.
struct Timers {
    ticker: Option<Interval>,
    notice_deadline: Option<Instant>,
    tick_every: Duration,
    notice_for: Duration,
}

/// Moves `session` onto a tokio task and returns a handle to drive it.
///
/// Must be called from within a tokio runtime.
pub fn spawn_draw_session(
    session: DrawSession,
    adapter: Box<dyn SpreadsheetAdapter>,
    config: &SessionConfig,
) -> DrawHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(64);
    let (events_tx, _) = broadcast::channel::<DrawEvent>(1024);
    let events_tx_loop = events_tx.clone();

    let mut timers = Timers {
        ticker: None,
        notice_deadline: None,
        tick_every: Duration::from_millis(config.tick_interval_ms.max(1)),
        notice_for: Duration::from_millis(config.notice_clear_ms),
    };

    tokio::spawn(async move {
        let mut session = session;

        loop {
            let notice_at = timers.notice_deadline.unwrap_or_else(Instant::now);
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    let done = handle_command(
                        cmd,
                        &mut session,
                        adapter.as_ref(),
                        &events_tx_loop,
                        &mut timers,
                    );
                    if done {
                        break;
                    }
                }
                _ = next_tick(&mut timers.ticker) => {
                    if let Some(tick) = session.tick() {
                        let _ = events_tx_loop.send(DrawEvent::Display { name: tick.name });
                    }
                }
                _ = tokio::time::sleep_until(notice_at), if timers.notice_deadline.is_some() => {
                    timers.notice_deadline = None;
                    let _ = events_tx_loop.send(DrawEvent::NoticeCleared);
                }
            }
        }
        tracing::debug!("draw runtime exited");
    });

    DrawHandle { cmd_tx, events_tx }
}

impl DrawHandle {
    /// New receiver for session events.
    pub fn subscribe(&self) -> broadcast::Receiver<DrawEvent> {
        self.events_tx.subscribe()
    }

    /// Imports an uploaded workbook; `file_name` is `None` when nothing was picked.
    pub async fn import_file(
        &self,
        file_name: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::ImportFile {
            file_name,
            bytes,
            resp: tx,
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Imports already-parsed rows, replacing the roster.
    pub async fn import_rows(&self, rows: Vec<SheetRow>) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::ImportRows { rows, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Selects the award for upcoming draws.
    pub async fn select_award(&self, tier: AwardTier) -> Result<SessionStatus, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::SelectAward { tier, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Sets the one-time special-tier winner.
    pub async fn set_special_override(&self, name: impl Into<String>) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::SetOverride {
            name: name.into(),
            resp: tx,
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Starts spinning. `Ok(false)` when the session was not ready.
    pub async fn start(&self) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Start { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Stops spinning and returns the recorded winner, if a draw was running.
    pub async fn stop(&self) -> Result<Option<Winner>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stop { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Deletes a winner by id; `Ok(false)` when no such id exists.
    pub async fn delete_winner(&self, id: WinnerId) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::DeleteWinner { id, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Snapshot of winners, newest first.
    pub async fn winners(&self) -> Result<Vec<Winner>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Winners { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Current session status.
    pub async fn status(&self) -> Result<SessionStatus, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Status { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Builds the winner-history workbook dated `today`.
    pub async fn export(&self, today: NaiveDate) -> Result<Export, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Export { today, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Stops any running spin without recording, flushes the ledger store and
    /// ends the writer task.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    async fn send(&self, cmd: Command) -> Result<(), RuntimeError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| RuntimeError::ChannelClosed)
    }
}

fn handle_command(
    cmd: Command,
    session: &mut DrawSession,
    adapter: &dyn SpreadsheetAdapter,
    events_tx: &broadcast::Sender<DrawEvent>,
    timers: &mut Timers,
) -> bool {
    match cmd {
        Command::ImportFile {
            file_name,
            bytes,
            resp,
        } => {
            notice(events_tx, timers, NoticeLevel::Info, "正在导入...".to_string());
            let res = session.import_file(adapter, file_name.as_deref(), &bytes);
            let _ = resp.send(report_import(session, events_tx, timers, res));
        }
        Command::ImportRows { rows, resp } => {
            let res = session.import_rows(&rows);
            let _ = resp.send(report_import(session, events_tx, timers, res));
        }
        Command::SelectAward { tier, resp } => {
            session.select_award(tier);
            let _ = events_tx.send(DrawEvent::Status(session.status_line()));
            let _ = resp.send(SessionStatus::of(session));
        }
        Command::SetOverride { name, resp } => {
            let res = session.set_special_override(&name).map_err(RuntimeError::from);
            let _ = resp.send(res);
        }
        Command::Start { resp } => {
            let started = timers.ticker.is_none() && session.start();
            if started {
                let mut ticker = tokio::time::interval(timers.tick_every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                timers.ticker = Some(ticker);
                let _ = events_tx.send(DrawEvent::Started);
                let _ = events_tx.send(DrawEvent::Status(session.status_line()));
            }
            let _ = resp.send(started);
        }
        Command::Stop { resp } => {
            timers.ticker = None;
            let winner = session.stop();
            if let Some(winner) = &winner {
                let _ = events_tx.send(DrawEvent::WinnerRecorded {
                    winner: winner.clone(),
                });
                if session.roster().is_empty() {
                    let _ = events_tx.send(DrawEvent::RosterExhausted);
                }
                let _ = events_tx.send(DrawEvent::Status(session.status_line()));
            }
            let _ = resp.send(winner);
        }
        Command::DeleteWinner { id, resp } => {
            let removed = session.delete_winner(id);
            if removed {
                let _ = events_tx.send(DrawEvent::WinnerDeleted { id });
            }
            let _ = resp.send(removed);
        }
        Command::Winners { resp } => {
            let _ = resp.send(session.ledger().all().to_vec());
        }
        Command::Status { resp } => {
            let _ = resp.send(SessionStatus::of(session));
        }
        Command::Export { today, resp } => {
            let res = session.export(adapter, today).map_err(RuntimeError::from);
            if let Err(err) = &res {
                tracing::warn!(error = %err, "export failed");
            }
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => {
            timers.ticker = None;
            session.flush_ledger();
            let _ = resp.send(());
            return true;
        }
    }

    false
}

fn report_import(
    session: &DrawSession,
    events_tx: &broadcast::Sender<DrawEvent>,
    timers: &mut Timers,
    res: Result<usize, ImportError>,
) -> Result<usize, RuntimeError> {
    match &res {
        Ok(count) => {
            notice(events_tx, timers, NoticeLevel::Success, format!("导入成功，共 {count} 人"));
            let _ = events_tx.send(DrawEvent::Imported { count: *count });
        }
        Err(err) => notice(events_tx, timers, NoticeLevel::Error, err.to_string()),
    }
    let _ = events_tx.send(DrawEvent::Status(session.status_line()));
    res.map_err(RuntimeError::from)
}

fn notice(
    events_tx: &broadcast::Sender<DrawEvent>,
    timers: &mut Timers,
    level: NoticeLevel,
    message: String,
) {
    timers.notice_deadline = Some(Instant::now() + timers.notice_for);
    let _ = events_tx.send(DrawEvent::Notice { level, message });
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}
