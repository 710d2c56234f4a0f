mod app;
mod buffer;
mod cli;
mod completion;
mod config;
mod exec;
mod input;
mod model;
mod span;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppCommand};
use clap::Parser;
use cli::CliArgs;
use config::ShellConfig;
use crossterm::event::{Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use exec::Invocation;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::File;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let config = ShellConfig::load(&args)?;
    match &config.source {
        Some(source) => info!("loaded config from {source}"),
        None => debug!("no config file found, using defaults"),
    }

    let mut app = App::new(config.tools.clone(), config.namespace.clone());
    run(&mut app, config.capture_timeout).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact();

    // The terminal belongs to the UI; without a log file tracing output is dropped.
    let _ = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(io::sink).try_init(),
    };

    Ok(())
}

async fn run(app: &mut App, capture_timeout: Option<Duration>) -> Result<()> {
    let mut terminal = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, capture_timeout).await;
    let restore_result = restore_terminal(&mut terminal);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<TuiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    capture_timeout: Option<Duration>,
) -> Result<()> {
    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        match next_terminal_event().await? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if let Some(action) = input::map_key(key) {
                    debug!("action={action:?}");
                    let command = app.apply_action(action);
                    if command != AppCommand::None {
                        terminal
                            .draw(|frame| ui::render(frame, app))
                            .context("failed to render terminal frame")?;
                    }
                    execute_app_command(terminal, app, command, capture_timeout).await;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Blocks until the terminal produces one event. The read happens on a
/// blocking thread and nothing reads the terminal between calls, so a child
/// that owns the terminal sees every keystroke.
async fn next_terminal_event() -> Result<Event> {
    tokio::task::spawn_blocking(crossterm::event::read)
        .await
        .context("terminal reader task failed")?
        .context("failed to read terminal event")
}

async fn execute_app_command(
    terminal: &mut TuiTerminal,
    app: &mut App,
    command: AppCommand,
    capture_timeout: Option<Duration>,
) {
    match command {
        AppCommand::None => {}
        AppCommand::ListWorkloads {
            namespace,
            invocation,
        } => {
            info!(namespace = %namespace, "listing workloads: {invocation}");
            let result = exec::capture_output(&invocation, capture_timeout).await;
            match &result {
                Ok(report) if !report.exit.success() => {
                    warn!("{}", report.exit.describe(&invocation.program));
                }
                Ok(_) => {}
                Err(error) => warn!("{error}"),
            }
            app.apply_listing(result);
            debug!(
                candidates = app.completions().len(),
                generation = app.completions().generation(),
                "completion index updated"
            );
        }
        AppCommand::ShowLogs {
            namespace,
            unit,
            query,
            pager,
        } => {
            info!(namespace = %namespace, unit = %unit, "showing logs: {query} | {pager}");
            let result = run_logs_in_pager(terminal, &query, &pager).await;
            if let Err(error) = &result {
                warn!("logs for {unit} failed: {error:#}");
            }
            app.apply_handoff(&unit, result);
        }
    }
}

async fn run_logs_in_pager(
    terminal: &mut TuiTerminal,
    query: &Invocation,
    pager: &Invocation,
) -> Result<exec::HandoffReport> {
    let run_result = match suspend_terminal_for_subprocess(terminal) {
        Ok(()) => exec::run_with_pager(query, pager)
            .await
            .map_err(anyhow::Error::from),
        Err(error) => Err(error),
    };
    let restore_result = resume_terminal_after_subprocess(terminal);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal resume error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(report), Ok(())) => Ok(report),
    }
}

fn suspend_terminal_for_subprocess(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode for subprocess")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen for subprocess")?;
    terminal
        .show_cursor()
        .context("failed to show cursor for subprocess")?;
    Ok(())
}

fn resume_terminal_after_subprocess(terminal: &mut TuiTerminal) -> Result<()> {
    enable_raw_mode().context("failed to re-enable raw mode after subprocess")?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)
        .context("failed to re-enter alternate screen after subprocess")?;
    terminal
        .clear()
        .context("failed to clear terminal after subprocess")?;
    Ok(())
}
