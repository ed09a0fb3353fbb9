use azw::app;
use azw::az;
use azw::cli;
use azw::events;
use azw::input;
use azw::notify;
use azw::refresh;
use azw::status;
use azw::traits;
use azw::tui;

use app::{AppConfig, AppState, UpdateOutcome};
use az::executor::{self, AzExecutor};
use clap::Parser;
use cli::Cli;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use events::{AppEvent, EventHandler};
use input::InputContext;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use refresh::{EngineCommand, RefreshEngine};
use status::SymbolTable;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use traits::PipelineBackend;

fn setup_verbose_logging() -> Result<()> {
    let state_dir = dirs_next_or_fallback();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!(
        "azw v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn dirs_next_or_fallback() -> std::path::PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        std::path::PathBuf::from(state).join("azw")
    } else if let Some(home) = std::env::var_os("HOME") {
        std::path::PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("azw")
    } else {
        std::path::PathBuf::from("/tmp/azw")
    }
}

fn spawn_monitored(
    tx: mpsc::UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                match join_err.into_panic().downcast::<String>() {
                    Ok(s) => *s,
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(s) => s.to_string(),
                        Err(_) => "unknown panic".to_string(),
                    },
                }
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            if tx
                .send(AppEvent::Error(format!("{label} crashed: {msg}")))
                .is_err()
            {
                tracing::warn!("{label}: channel closed while reporting panic");
            }
        }
    });
}

/// Resolves project and run before the terminal is taken over, so failures print plainly.
async fn resolve_target(args: &Cli) -> Result<(AzExecutor, u64)> {
    executor::check_az_available().await?;

    let project = match &args.project {
        Some(p) => p.clone(),
        None => executor::detect_project().await?,
    };
    let exec = AzExecutor::new(args.org.clone(), project);

    let run_id = match args.run_id {
        Some(id) => id,
        None => exec
            .latest_run_id(args.pipeline)
            .await?
            .ok_or_else(|| eyre!("No runs found in project {}", exec.project()))?,
    };
    Ok((exec, run_id))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    // Setup verbose logging
    if args.verbose {
        setup_verbose_logging()?;
    }

    let (exec, run_id) = match resolve_target(&args).await {
        Ok(target) => target,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let config = AppConfig {
        org: args.org.clone(),
        project: Some(exec.project().to_string()),
        interval: Duration::from_secs(args.interval),
        log_lines: args.log_lines,
        version_string: format!(
            "azw v{}+{}",
            env!("CARGO_PKG_VERSION"),
            env!("BUILD_NUMBER")
        ),
    };
    let mut state = AppState::new(config);
    state.desktop_notify = !args.no_notify;

    // Setup terminal with panic hook
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, SetTitle("")) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle(format!("watching run {run_id}")))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Event handler
    let events = EventHandler::new(Duration::from_millis(100));
    let tx = events.sender();

    // Refresh engine
    let pipeline: Arc<dyn PipelineBackend> = Arc::new(exec);
    let engine = RefreshEngine::new(
        pipeline,
        SymbolTable::default(),
        state.config.interval,
        tx.clone(),
    )
    .with_log_lines(state.config.log_lines);
    let cancel = engine.cancellation_token();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    spawn_monitored(tx.clone(), "refresh engine", engine.run(cmd_rx));
    if cmd_tx.send(EngineCommand::Watch(run_id)).is_err() {
        tracing::warn!("refresh engine stopped before the watch started");
    }

    let result = run_app(&mut terminal, &mut state, events, &cmd_tx).await;

    // Stop the engine at its next suspension point
    send_command(&cmd_tx, EngineCommand::Cancel);
    cancel.cancel();

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    result
}

fn send_command(commands: &mpsc::UnboundedSender<EngineCommand>, cmd: EngineCommand) {
    if commands.send(cmd).is_err() {
        tracing::warn!("refresh engine channel closed");
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut events: EventHandler,
    commands: &mpsc::UnboundedSender<EngineCommand>,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let size = terminal.size()?;
        state
            .log
            .set_visible_height(tui::render::log_visible_height(Rect::new(
                0,
                0,
                size.width,
                size.height,
            )));

        // Render
        terminal.draw(|f| tui::render::render(f, state))?;

        state.prune_error();

        // Process events
        let Some(event) = events.next().await else {
            return Ok(());
        };
        match event {
            AppEvent::Key(key) => {
                let ctx = InputContext {
                    has_error: state.error.is_some(),
                    focus: state.focus,
                    search_mode: state.log.mode(),
                };
                if let Some(cmd) = state.apply_action(input::map_key(key, &ctx)) {
                    send_command(commands, cmd);
                }
            }
            AppEvent::Resize => {}
            AppEvent::Tick => {
                if last_tick.elapsed() >= Duration::from_millis(100) {
                    state.advance_spinner();
                    last_tick = Instant::now();
                }
            }
            AppEvent::WatchStarted { session, run_id } => state.begin_watch(session, run_id),
            AppEvent::Refresh(update) => {
                let selected_before = state.selected_id.clone();
                if let UpdateOutcome::Applied { run_completed } = state.apply_update(*update) {
                    if run_completed && state.desktop_notify {
                        if let Some(run) = &state.run {
                            notify::send_desktop(run);
                        }
                    }
                    // The view may have picked (or dropped) the selection on its own
                    if state.selected_id != selected_before {
                        send_command(
                            commands,
                            EngineCommand::SelectRecord(state.selected_id.clone()),
                        );
                    }
                }
            }
            AppEvent::Stalled { session, message } => state.mark_stalled(session, message),
            AppEvent::WatchFailed {
                session,
                run_id,
                message,
            } => {
                tracing::warn!(run_id, %message, "watch stopped");
                state.mark_failed(session, message);
            }
            AppEvent::Error(e) => state.set_error(e),
        }

        if state.should_quit {
            return Ok(());
        }
    }
}
