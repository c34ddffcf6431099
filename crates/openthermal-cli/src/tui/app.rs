//! TUI application state and event loop.
//!
//! Design: the stream pipeline runs on a background thread with its own
//! tokio runtime, feeding the shared presentation store. The UI thread
//! never blocks on the network; it redraws whenever a change notification
//! has bumped the repaint generation, plus on a slow idle cadence for the
//! clock and status line.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio_util::sync::CancellationToken;

use openthermal_client::HttpStreamStore;
use openthermal_core::{
    PresentationState, PresentationStore, StreamConfig, StreamError, WatchSnapshot, WatchStats,
    run_watch,
};

// ---------------------------------------------------------------------------
// LinkStatus
// ---------------------------------------------------------------------------

/// Where the stream link currently stands, for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// Pipeline started, nothing delivered yet.
    Connecting,
    /// Subscription is delivering events (frames or keepalives).
    Live,
    /// Subscription ended cleanly; the last frame stays on screen.
    Ended,
    /// Pipeline died with an error; the last frame stays on screen.
    Failed(String),
}

impl LinkStatus {
    pub fn from_parts(
        outcome: Option<&Result<(), StreamError>>,
        snapshot: &WatchSnapshot,
    ) -> Self {
        match outcome {
            Some(Err(err)) => Self::Failed(err.to_string()),
            Some(Ok(())) => Self::Ended,
            None if snapshot.frames > 0 || snapshot.empty_batches > 0 => Self::Live,
            None => Self::Connecting,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "CONNECTING",
            Self::Live => "LIVE",
            Self::Ended => "ENDED",
            Self::Failed(_) => "FAILED",
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    /// Taken by the pipeline thread on start.
    store: Option<HttpStreamStore>,
    config: StreamConfig,
    refresh: Duration,
    running: bool,
    presentation: Arc<PresentationStore>,
    stats: Arc<WatchStats>,
    /// Bumped by the change observer; the UI redraws when it moves.
    generation: Arc<AtomicU64>,
    cancel: CancellationToken,
    /// Set exactly once, when the pipeline thread finishes.
    outcome: Arc<Mutex<Option<Result<(), StreamError>>>>,
    worker: Option<thread::JoinHandle<()>>,
    started: Instant,
}

impl App {
    pub fn new(store: HttpStreamStore, refresh_secs: f64) -> Self {
        let config = store.config().clone();
        let presentation = Arc::new(PresentationStore::new());
        let generation = Arc::new(AtomicU64::new(0));
        {
            let generation = Arc::clone(&generation);
            presentation.on_change(move |_| {
                generation.fetch_add(1, Ordering::Relaxed);
            });
        }

        Self {
            store: Some(store),
            config,
            refresh: Duration::from_secs_f64(refresh_secs.max(0.1)),
            running: true,
            presentation,
            stats: Arc::new(WatchStats::new()),
            generation,
            cancel: CancellationToken::new(),
            outcome: Arc::new(Mutex::new(None)),
            worker: None,
            started: Instant::now(),
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        self.spawn_pipeline();

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook that restores terminal before printing the panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error.
        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        self.cancel.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }

        result
    }

    fn spawn_pipeline(&mut self) {
        let Some(store) = self.store.take() else {
            return;
        };
        let stream = self.config.stream.clone();
        let presentation = Arc::clone(&self.presentation);
        let stats = Arc::clone(&self.stats);
        let cancel = self.cancel.clone();
        let outcome = Arc::clone(&self.outcome);

        self.worker = Some(thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(async {
                // The outer select also interrupts the connect phase, which
                // the pipeline itself cannot.
                tokio::select! {
                    result = run_watch(&store, &stream, &presentation, &stats, cancel.clone()) => result,
                    _ = cancel.cancelled() => Ok(()),
                }
            });
            *outcome.lock().unwrap() = Some(result);
        }));
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        let mut drawn: Option<u64> = None;
        let mut last_draw = Instant::now();

        while self.running {
            let generation = self.generation.load(Ordering::Relaxed);
            if drawn != Some(generation) || last_draw.elapsed() >= self.refresh {
                terminal.draw(|f| super::ui::draw(f, self))?;
                drawn = Some(generation);
                last_draw = Instant::now();
            }

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Resize(_, _) => drawn = None,
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            _ => {}
        }
    }

    // --- Accessors for rendering ---

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn presentation(&self) -> PresentationState {
        self.presentation.current()
    }

    pub fn stats(&self) -> WatchSnapshot {
        self.stats.snapshot()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn status(&self) -> LinkStatus {
        let outcome = self.outcome.lock().unwrap();
        LinkStatus::from_parts(outcome.as_ref(), &self.stats.snapshot())
    }

    /// The pipeline's error message, if it failed.
    pub fn failure(&self) -> Option<String> {
        match &*self.outcome.lock().unwrap() {
            Some(Err(err)) => Some(err.to_string()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
