//! tailview entrypoint: CLI parsing, startup (logging + panic hook +
//! terminal acquisition), and the event loop wiring a `Source` through the
//! state machine, pipeline, ring, and viewport.
//!
//! `AppStartup` follows the teacher's own `ox-bin::main`: a struct that
//! owns the terminal backend and the tracing `WorkerGuard`, with
//! `configure_logging`/`install_panic_hook` run before the terminal is
//! entered. The CLI surface (`--config`, `--light`/`--dark`, a subcommand
//! selecting the log source) and key bindings are grounded on
//! `examples/original_source/cmd/logviewer/main.go` and
//! `internal/logs/keys.go`.

mod source;

use std::path::PathBuf;
use std::sync::Once;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{Event, EventStream, KeyCode, KeyModifiers};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use core_entry::{LogEntry, PipelineConfig, Theme, View};
use core_pipeline::Pipeline;
use core_ring::Ring;
use core_source::Source;
use core_state::{AppState, StateMachine, state_channel};
use core_terminal::{CrosstermBackend, TerminalBackend, TerminalGuard};
use core_viewport::{ScrollController, render};

use source::{DemoSource, StdinSource};

/// Bounded ring capacity (spec.md §4.2's default 20,000-entry window).
const RING_CAPACITY: usize = 20_000;
/// Bounded log-line channel between a `Source` and the event loop.
const LOG_CHANNEL_CAPACITY: usize = 256;

#[derive(Parser, Debug)]
#[command(name = "tailview", version, about = "Scroll and filter a live log stream in the terminal")]
struct Args {
    /// Override config file discovery ($TAILVIEW_CONFIG, ./tailview.toml, then the platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Force the light theme, overriding the config file.
    #[arg(long, conflicts_with = "dark")]
    light: bool,

    /// Force the dark theme, overriding the config file.
    #[arg(long, conflicts_with = "light")]
    dark: bool,

    #[command(subcommand)]
    source: SourceArg,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum SourceArg {
    /// Stream log lines from standard input.
    Stdin,
    /// Stream a synthetic mix of JSON and plain-text lines, for smoke-testing.
    Demo,
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn run(&mut self) -> Result<TerminalGuard<'_>> {
        self.configure_logging()?;
        Self::install_panic_hook();

        info!(target: "runtime", "startup");
        self.backend.set_title("tailview")?;
        let guard = self.backend.enter_guard()?;
        Ok(guard)
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = std::path::Path::new(".");
        let log_path = log_dir.join("tailview.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "tailview.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => self.log_guard = Some(guard),
            Err(_err) => {
                // Global subscriber already installed (e.g. under a test harness).
            }
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = core_config::load_from(args.config.clone()).context("failed to load config")?;
    let theme = if args.light {
        Theme::Light
    } else if args.dark {
        Theme::Dark
    } else {
        config.theme
    };
    let views = if config.views.is_empty() {
        vec![View::default()]
    } else {
        config.views
    };

    let mut startup = AppStartup::new();
    let terminal_guard = startup.run()?;

    let result = run_app(args.source, views, theme).await;
    drop(terminal_guard);

    if let Err(e) = &result {
        tracing::error!(target: "runtime", error = %e, "fatal error");
    }
    result
}

/// Drives the log stream from `state_channel()`/`Source::init` through to a
/// rendered, scrollable viewport until the user quits or the source ends.
async fn run_app(source_arg: SourceArg, views: Vec<View>, theme: Theme) -> Result<()> {
    let source: Box<dyn Source> = match source_arg {
        SourceArg::Stdin => Box::new(StdinSource::new()),
        SourceArg::Demo => Box::new(DemoSource::new()),
    };

    let (state_tx, mut state_rx) = state_channel();
    let mut sm = StateMachine::new();

    source.init(state_tx.clone()).await?;

    // Drain whatever Loading/Browse transitions init() published.
    while sm.current() != AppState::Browse {
        let Some(next) = state_rx.recv().await else {
            anyhow::bail!("source closed the state channel during init");
        };
        sm.transition(next);
    }

    // No resource-browsing UI ships with this engine (out of scope, spec.md
    // §1); with exactly one selectable stream the engine requests it
    // immediately instead of waiting on a selection the user can't make.
    sm.transition(AppState::LogsLoading);
    let cancel = sm
        .stream_token()
        .expect("LogsLoading always mints a cancellation token");

    let (log_tx, mut log_rx) = mpsc::channel::<String>(LOG_CHANNEL_CAPACITY);
    let stream_state_tx = state_tx.clone();
    let stream_cancel = cancel.clone();
    let stream_task = tokio::spawn(async move {
        if let Err(e) = source.logs(stream_cancel, stream_state_tx, log_tx).await {
            warn!(target: "source", error = %e, "log stream ended with an error");
        }
    });

    let (width, height) = crossterm::terminal::size().unwrap_or((80, 24));
    let mut view_index = 0usize;
    let cfg = PipelineConfig {
        view: views[view_index].clone(),
        width,
        highlight: true,
        theme,
    };
    let mut pipeline = Pipeline::new(cfg)?;
    let mut ring = Ring::new(RING_CAPACITY);
    let mut scroll = ScrollController::new();
    let mut viewport_height = height as usize;

    let mut events = EventStream::new();

    loop {
        draw(&ring, &scroll, viewport_height)?;

        tokio::select! {
            line = log_rx.recv() => {
                let Some(line) = line else {
                    // Source finished (EOF); keep the last frame on screen
                    // until the user quits rather than tearing down early.
                    tokio::select! {
                        Some(next) = state_rx.recv() => { sm.transition(next); }
                        Some(Ok(event)) = events.next() => {
                            if !handle_event(event, &mut pipeline, &mut ring, &mut scroll, &mut sm, &views, &mut view_index, &mut viewport_height) {
                                break;
                            }
                        }
                    }
                    continue;
                };
                if sm.current() != AppState::Logs {
                    sm.transition(AppState::Logs);
                }
                let mut entry = LogEntry::new(line);
                pipeline.run(&mut entry);
                match ring.append(entry) {
                    Some(evicted) => scroll.note_eviction(evicted.height, &ring, viewport_height),
                    None => scroll.note_append(&ring, viewport_height),
                }
            }
            Some(next) = state_rx.recv() => {
                sm.transition(next);
            }
            Some(Ok(event)) = events.next() => {
                if !handle_event(event, &mut pipeline, &mut ring, &mut scroll, &mut sm, &views, &mut view_index, &mut viewport_height) {
                    break;
                }
            }
        }
    }

    cancel.cancel();
    let _ = stream_task.await;
    Ok(())
}

/// Handle one terminal event. Returns `false` when the application should
/// quit. Key bindings follow `examples/original_source/internal/logs/keys.go`:
/// `q`/ctrl-c to quit, up/down (and vim's `k`/`j`) to scroll a line at a
/// time, home/end (and page up/down) for a full page, and `v` to cycle
/// through configured views, exercising the `Logs → LoadView → Logs` round
/// trip.
fn handle_event(
    event: Event,
    pipeline: &mut Pipeline,
    ring: &mut Ring,
    scroll: &mut ScrollController,
    sm: &mut StateMachine,
    views: &[View],
    view_index: &mut usize,
    viewport_height: &mut usize,
) -> bool {
    match event {
        Event::Resize(width, height) => {
            *viewport_height = height as usize;
            pipeline.set_width(width);
            ring.iter_mut(|e| pipeline.run_width_changed(e));
            true
        }
        Event::Key(key) => match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => false,
            (KeyCode::Esc, _) => false,
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => {
                scroll.scroll_up(1, ring);
                true
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => {
                scroll.scroll_down(1, ring, *viewport_height);
                true
            }
            (KeyCode::PageUp, _) | (KeyCode::Home, _) => {
                scroll.scroll_up(*viewport_height as i64, ring);
                true
            }
            (KeyCode::PageDown, _) | (KeyCode::End, _) => {
                scroll.scroll_down(*viewport_height as i64, ring, *viewport_height);
                true
            }
            (KeyCode::Char('v'), _) if views.len() > 1 => {
                if sm.transition(AppState::LoadView) {
                    *view_index = (*view_index + 1) % views.len();
                    match pipeline.set_view(views[*view_index].clone()) {
                        Ok(()) => ring.iter_mut(|e| pipeline.run_view_changed(e)),
                        Err(e) => warn!(target: "pipeline", error = %e, "failed to switch view"),
                    }
                    sm.transition(AppState::Logs);
                }
                true
            }
            _ => true,
        },
        _ => true,
    }
}

fn draw(ring: &Ring, scroll: &ScrollController, height: usize) -> Result<()> {
    use crossterm::{
        cursor::MoveTo,
        queue,
        terminal::{Clear, ClearType},
    };
    use std::io::{Write, stdout};

    let mut out = stdout();
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    let offset = scroll.visible_offset(ring, height);
    let text = render(ring, offset, height);
    queue!(out, crossterm::style::Print(text))?;
    out.flush()?;
    Ok(())
}
