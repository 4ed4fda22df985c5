use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use docchat::event_source::KeyboardEventSource;
use docchat::panic_handler::initialize_panic_handler;
use docchat::theme::{ThemeId, set_theme};
use docchat::{App, run_app_with_event_source};

#[derive(Parser, Debug)]
#[command(name = "docchat", about = "A terminal chat-with-your-documents UI shell", version)]
struct Cli {
    /// Directory scanned for .pdf documents
    #[arg(default_value = ".")]
    docs_dir: PathBuf,

    /// Log file path (the alternate screen owns stdout)
    #[arg(long, default_value = "docchat.log")]
    log_file: PathBuf,

    /// Log verbosity: off, error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Start with the Catppuccin Mocha palette instead of Oceanic Next
    #[arg(long)]
    mocha: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(
        cli.log_level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("creating log file {}", cli.log_file.display()))?,
    )?;

    info!("Starting docchat in {}", cli.docs_dir.display());

    if cli.mocha {
        set_theme(ThemeId::CatppuccinMocha);
    }

    initialize_panic_handler();

    let mut app = App::new(&cli.docs_dir)?;

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut event_source = KeyboardEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!("Application error: {err:?}");
        eprintln!("{err:?}");
    }

    info!("Shutting down docchat");
    res
}
