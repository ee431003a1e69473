use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use geoscape::app::App;
use geoscape::config::{Options, DEFAULT_CONFIG_PATH};
use geoscape::{data, ui};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_PATH: &str = "geoscape.log";

/// The terminal is ours, so logs go to a file. `GEOSCAPE_LOG` takes an
/// env-filter directive and defaults to `info`.
fn init_logging() -> Result<()> {
    let file = File::create(LOG_PATH).with_context(|| format!("creating {LOG_PATH}"))?;
    let filter = EnvFilter::try_from_env("GEOSCAPE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let options = Options::load(&config_path)?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, options);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn run(terminal: &mut DefaultTerminal, options: Options) -> Result<()> {
    let size = terminal.size()?;
    let ruleset = data::sample_ruleset(&options);
    let world = data::sample_world();
    let mut app = App::new(size.width as usize, size.height as usize, options, ruleset, world);

    let mut last = Instant::now();
    loop {
        app.draw();
        terminal.draw(|frame| ui::render(frame, &app))?;

        // The rotation timer runs at 10ms
        if event::poll(Duration::from_millis(10))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        app.handle_key(key);
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last).as_millis() as u64;
        if elapsed > 0 {
            app.tick(elapsed);
            last = now;
        }

        if app.should_quit {
            break;
        }
    }

    info!(time = %app.time_label(), "quitting");
    Ok(())
}
