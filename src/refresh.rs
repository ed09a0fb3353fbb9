//! Live refresh loop for the watched run.
//!
//! The engine owns the per-run state (last published hierarchy, log cache) and is
//! driven by [`EngineCommand`]s on an mpsc channel. Each tick waits out the current
//! delay, fetches the timeline, rebuilds the [`OrderedRecordView`], refreshes the
//! selected record's log through the [`LogCache`], fetches the run status and emits
//! one [`AppEvent::Refresh`]. Every wait and fetch races the [`CancellationToken`];
//! a cancelled tick emits nothing.
//!
//! Switching runs bumps the session id. Every event carries the session it was
//! produced under so the consumer can drop anything from an older session.
//!
//! Transient failures back off exponentially (`interval × 2^failures`, capped at
//! [`MAX_BACKOFF`]) and reset on the next successful tick. A permanent failure stops
//! the watch and returns the engine to `Idle`.

use crate::app::{RunSummary, LOG_MAX_LINES};
use crate::error::FetchError;
use crate::events::AppEvent;
use crate::log_cache::{LogCache, LogSnapshot};
use crate::order::OrderedRecordView;
use crate::status::SymbolTable;
use crate::traits::PipelineBackend;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// 5 minutes: past this the stalled indicator has been visible long enough.
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Compute backoff delay: `min(base * 2^failures, MAX_BACKOFF)`, never below 1s.
pub fn backoff_delay(base: Duration, failures: u32) -> Duration {
    let multiplier = 1u32.checked_shl(failures).unwrap_or(u32::MAX);
    base.saturating_mul(multiplier)
        .clamp(Duration::from_secs(1), MAX_BACKOFF)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Watch(u64),
    SelectRecord(Option<String>),
    RefreshNow,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Watching(u64),
    Cancelled,
}

/// One combined refresh result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshUpdate {
    pub session: u64,
    pub run_id: u64,
    pub view: OrderedRecordView,
    pub run: RunSummary,
    /// `None` when no record with a log is selected or its log could not be refreshed.
    pub log: Option<LogSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Updated,
    /// The timeline came back empty; the previous view stays.
    NoChange,
    /// Transient or malformed response; retried after backoff.
    Failed,
    /// Permanent failure; the watch stopped.
    Stopped,
    Cancelled,
    /// Nothing is being watched.
    Idle,
}

/// Runs `fut` unless `token` fires first.
async fn guarded<T, F>(token: &CancellationToken, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(FetchError::Cancelled),
        out = fut => out,
    }
}

enum Step {
    Done,
    Interrupted,
    Closed,
}

pub struct RefreshEngine {
    backend: Arc<dyn PipelineBackend>,
    symbols: SymbolTable,
    interval: Duration,
    tx: mpsc::UnboundedSender<AppEvent>,
    cancel: CancellationToken,

    state: EngineState,
    session: u64,
    next_delay: Duration,
    failures: u32,

    // Per-run state, dropped on every run switch.
    view: OrderedRecordView,
    log_cache: LogCache,
    selected: Option<String>,
}

impl RefreshEngine {
    pub fn new(
        backend: Arc<dyn PipelineBackend>,
        symbols: SymbolTable,
        interval: Duration,
        tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            backend,
            symbols,
            interval,
            tx,
            cancel: CancellationToken::new(),
            state: EngineState::Idle,
            session: 0,
            next_delay: Duration::ZERO,
            failures: 0,
            view: OrderedRecordView::default(),
            log_cache: LogCache::new(LOG_MAX_LINES),
            selected: None,
        }
    }

    pub fn with_log_lines(mut self, max_lines: usize) -> Self {
        self.log_cache = LogCache::new(max_lines);
        self
    }

    /// Cancelling this token stops the engine at its next suspension point.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn view(&self) -> &OrderedRecordView {
        &self.view
    }

    pub fn log_cache(&self) -> &LogCache {
        &self.log_cache
    }

    pub fn next_delay(&self) -> Duration {
        self.next_delay
    }

    pub fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Watch(run_id) => self.watch(run_id),
            EngineCommand::SelectRecord(id) => {
                if id != self.selected {
                    self.selected = id;
                    self.next_delay = Duration::ZERO;
                }
            }
            EngineCommand::RefreshNow => self.next_delay = Duration::ZERO,
            EngineCommand::Cancel => {
                self.cancel.cancel();
                self.state = EngineState::Cancelled;
            }
        }
    }

    fn watch(&mut self, run_id: u64) {
        match self.state {
            EngineState::Watching(current) if current == run_id => return,
            EngineState::Cancelled => return,
            EngineState::Idle | EngineState::Watching(_) => {}
        }
        self.session += 1;
        self.state = EngineState::Watching(run_id);
        self.next_delay = Duration::ZERO;
        self.failures = 0;
        self.view = OrderedRecordView::default();
        self.log_cache.reset();
        self.selected = None;
        tracing::info!(run_id, session = self.session, "watching run");
        self.emit(AppEvent::WatchStarted {
            session: self.session,
            run_id,
        });
    }

    fn emit(&mut self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("refresh: channel closed");
            self.state = EngineState::Cancelled;
        }
    }

    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<EngineCommand>) {
        loop {
            match self.state {
                EngineState::Cancelled => return,
                EngineState::Idle => {
                    let token = self.cancel.clone();
                    tokio::select! {
                        () = token.cancelled() => self.state = EngineState::Cancelled,
                        cmd = commands.recv() => match cmd {
                            Some(cmd) => self.handle_command(cmd),
                            None => return,
                        },
                    }
                }
                EngineState::Watching(_) => match self.wait(&mut commands).await {
                    Step::Done => {
                        if let Step::Closed = self.fetch(&mut commands).await {
                            return;
                        }
                    }
                    Step::Interrupted => {}
                    Step::Closed => return,
                },
            }
        }
    }

    /// Waits out `next_delay`. A command that changes what the next fetch should
    /// do ends the wait early; anything else is applied and the wait goes on.
    async fn wait(&mut self, commands: &mut mpsc::UnboundedReceiver<EngineCommand>) -> Step {
        let token = self.cancel.clone();
        let deadline = time::Instant::now() + self.next_delay;
        let snapshot = (self.state, self.selected.clone());
        loop {
            tokio::select! {
                () = token.cancelled() => {
                    self.state = EngineState::Cancelled;
                    return Step::Interrupted;
                }
                () = time::sleep_until(deadline) => {
                    self.next_delay = Duration::ZERO;
                    return Step::Done;
                }
                cmd = commands.recv() => match cmd {
                    Some(cmd) => {
                        let interrupts = interrupts_wait(&snapshot, &cmd);
                        self.handle_command(cmd);
                        if interrupts {
                            return Step::Interrupted;
                        }
                    }
                    None => return Step::Closed,
                },
            }
        }
    }

    /// Runs one fetch with no wait. Selection changes and refresh requests that
    /// arrive meanwhile are applied after the tick, so a busy cursor cannot starve
    /// the view; only `Cancel` or a different run abort it.
    async fn fetch(&mut self, commands: &mut mpsc::UnboundedReceiver<EngineCommand>) -> Step {
        let mut deferred = Vec::new();
        let outcome = {
            let state = self.state;
            let tick = self.tick();
            tokio::pin!(tick);
            loop {
                tokio::select! {
                    _ = &mut tick => break Step::Done,
                    cmd = commands.recv() => match cmd {
                        Some(cmd) if interrupts_fetch(state, &cmd) => {
                            deferred.push(cmd);
                            break Step::Interrupted;
                        }
                        Some(cmd) => deferred.push(cmd),
                        None => break Step::Closed,
                    },
                }
            }
        };
        for cmd in deferred {
            self.handle_command(cmd);
        }
        outcome
    }

    /// One wait + fetch step. Public so callers (and tests) can drive the engine
    /// without the command loop.
    pub async fn tick(&mut self) -> TickOutcome {
        let EngineState::Watching(run_id) = self.state else {
            return if self.state == EngineState::Cancelled {
                TickOutcome::Cancelled
            } else {
                TickOutcome::Idle
            };
        };
        let session = self.session;
        let delay = std::mem::replace(&mut self.next_delay, self.interval);

        match self.step(run_id, delay).await {
            Ok(Some(update)) => {
                self.failures = 0;
                tracing::debug!(run_id, records = update.view.len(), "refresh applied");
                self.emit(AppEvent::Refresh(Box::new(update)));
                TickOutcome::Updated
            }
            Ok(None) => {
                self.failures = 0;
                tracing::debug!(run_id, "empty timeline, keeping previous view");
                TickOutcome::NoChange
            }
            Err(e) if e.is_cancelled() => {
                if !self.cancel.is_cancelled() {
                    return TickOutcome::NoChange;
                }
                self.state = EngineState::Cancelled;
                TickOutcome::Cancelled
            }
            Err(FetchError::Permanent(message)) => {
                tracing::warn!(run_id, %message, "watch stopped");
                self.state = EngineState::Idle;
                self.emit(AppEvent::WatchFailed {
                    session,
                    run_id,
                    message,
                });
                TickOutcome::Stopped
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                self.next_delay = backoff_delay(self.interval, self.failures);
                tracing::warn!(run_id, error = %e, failures = self.failures, "refresh failed");
                self.emit(AppEvent::Stalled {
                    session,
                    message: format!(
                        "Refresh failed, retrying in {}s",
                        self.next_delay.as_secs()
                    ),
                });
                TickOutcome::Failed
            }
        }
    }

    async fn step(
        &mut self,
        run_id: u64,
        delay: Duration,
    ) -> Result<Option<RefreshUpdate>, FetchError> {
        let token = self.cancel.clone();
        let backend = Arc::clone(&self.backend);

        if !delay.is_zero() {
            guarded(&token, async {
                time::sleep(delay).await;
                Ok::<(), FetchError>(())
            })
            .await?;
        }

        let records = guarded(&token, backend.fetch_timeline(run_id)).await?;
        if records.is_empty() {
            return Ok(None);
        }
        let view = OrderedRecordView::build(records, &self.symbols);

        let log = self.refresh_selected_log(run_id, &view, &token).await?;
        let run = guarded(&token, backend.fetch_run_status(run_id)).await?;

        self.view = view.clone();
        Ok(Some(RefreshUpdate {
            session: self.session,
            run_id,
            view,
            run,
            log,
        }))
    }

    /// Log failures never fail the tick: a missing log is reported in place of the
    /// content, anything transient keeps whatever the pane already shows.
    async fn refresh_selected_log(
        &mut self,
        run_id: u64,
        view: &OrderedRecordView,
        token: &CancellationToken,
    ) -> Result<Option<LogSnapshot>, FetchError> {
        let Some(entry) = self.selected.as_deref().and_then(|id| view.find(id)) else {
            return Ok(None);
        };
        let Some(log_id) = entry.record.log_id else {
            return Ok(None);
        };
        let record_id = entry.record.id.clone();
        let state = entry.record.state;
        let backend = Arc::clone(&self.backend);

        let fetched = self
            .log_cache
            .get_log(&record_id, log_id, state, || {
                guarded(token, backend.fetch_log(run_id, log_id))
            })
            .await;

        match fetched {
            Ok(content) => Ok(Some(LogSnapshot { record_id, content })),
            Err(e) if e.is_cancelled() => Err(e),
            Err(FetchError::Permanent(message)) => Ok(Some(LogSnapshot {
                record_id,
                content: format!("could not load log: {message}"),
            })),
            Err(e) => {
                tracing::warn!(run_id, log_id, error = %e, "log refresh failed");
                Ok(None)
            }
        }
    }
}

fn interrupts_wait(
    (state, selected): &(EngineState, Option<String>),
    cmd: &EngineCommand,
) -> bool {
    match cmd {
        EngineCommand::SelectRecord(id) => id != selected,
        EngineCommand::RefreshNow => true,
        EngineCommand::Watch(_) | EngineCommand::Cancel => interrupts_fetch(*state, cmd),
    }
}

fn interrupts_fetch(state: EngineState, cmd: &EngineCommand) -> bool {
    match cmd {
        EngineCommand::Watch(run_id) => state != EngineState::Watching(*run_id),
        EngineCommand::Cancel => true,
        EngineCommand::SelectRecord(_) | EngineCommand::RefreshNow => false,
    }
}
