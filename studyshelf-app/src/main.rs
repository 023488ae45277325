mod app;
mod app_dir;
mod app_state;
mod commands;
mod input;
mod io_worker;
mod listing;
mod navigation;
mod preferences;
mod viewer;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info, warn};

use studyshelf_core::Subject;

use app::StudyShelfApp;
use commands::Command;
use preferences::AppPreferences;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// How often the main loop polls workers and debouncers while waiting for input.
const TICK: Duration = Duration::from_millis(50);
/// Upper bound on waiting for outstanding work after stdin closes.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "studyshelf")]
#[command(author, version, about = "Browse study roadmaps, books and videos, and read books page by page")]
struct Cli {
    /// Directory book paths and the catalog data directory are resolved against
    #[arg(short = 'r', long)]
    content_root: Option<PathBuf>,

    /// Subject loaded at start-up (math, physics or cs)
    #[arg(short, long)]
    subject: Option<Subject>,

    /// Preferences file to use instead of the one next to the executable
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn preferences(&self) -> AppPreferences {
        let mut prefs = match &self.config {
            Some(path) => AppPreferences::load_from(path),
            None => {
                AppPreferences::write_default_if_missing();
                AppPreferences::load()
            }
        };
        if let Some(root) = &self.content_root {
            prefs.content_root = root.to_string_lossy().into_owned();
        }
        if let Some(subject) = self.subject {
            prefs.default_subject = subject;
        }
        prefs
    }
}

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

/// Read stdin on its own thread so the main loop keeps ticking between lines.
fn spawn_stdin_reader() -> std::io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read input: {e}");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

fn flush(app: &mut StudyShelfApp) {
    let mut stdout = std::io::stdout().lock();
    for line in app.take_output() {
        let _ = writeln!(stdout, "{line}");
    }
    let _ = stdout.flush();
}

/// Tick until pending catalog and book loads have answered, so piped
/// commands such as `open 1` then `next` apply in order.
fn wait_for_io(app: &mut StudyShelfApp) {
    let deadline = Instant::now() + DRAIN_TIMEOUT;
    while app.io_in_flight > 0 && Instant::now() < deadline {
        std::thread::sleep(TICK);
        app.tick(Instant::now());
        flush(app);
    }
}

fn run(app: &mut StudyShelfApp, lines: mpsc::Receiver<String>) {
    loop {
        match lines.recv_timeout(TICK) {
            Ok(line) => match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    wait_for_io(app);
                    app.execute(command, Instant::now());
                }
                Err(e) => app.say(format!("! {e}")),
            },
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // Piped input: let loads, renders and searches finish first.
                let deadline = Instant::now() + DRAIN_TIMEOUT;
                while !app.is_idle() && Instant::now() < deadline {
                    std::thread::sleep(TICK);
                    app.tick(Instant::now());
                    flush(app);
                }
                if !app.is_idle() {
                    warn!("Exiting with work still outstanding");
                }
                break;
            }
        }
        app.tick(Instant::now());
        flush(app);
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting StudyShelf");

    let prefs = cli.preferences();
    let mut app = match StudyShelfApp::new(prefs) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start: {e}");
            return ExitCode::FAILURE;
        }
    };
    let lines = match spawn_stdin_reader() {
        Ok(rx) => rx,
        Err(e) => {
            error!("Failed to start input reader: {e}");
            return ExitCode::FAILURE;
        }
    };

    run(&mut app, lines);
    flush(&mut app);
    app.shutdown();
    ExitCode::SUCCESS
}
