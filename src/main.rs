// renderlens: terminal inspector for HTML/CSS rendering pipelines

use std::fs::File;
use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use renderlens::engine::process::EngineProcess;
use renderlens::engine::{PipelineInvoker, RenderEngine};
use renderlens::oracle::{OracleView, SandboxProcess};
use renderlens::store::SessionStore;
use renderlens::ui::app::{App, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};

struct Config {
    engine: String,
    oracle: Option<String>,
    state: String,
    log: String,
}

fn usage(program: &str) {
    eprintln!("Usage: {} --engine <command> [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --engine <command>   renderer engine to inspect (required)");
    eprintln!("  --oracle <command>   sandbox renderer for the Oracle view");
    eprintln!("                       (defaults to the engine command)");
    eprintln!("  --no-oracle          disable the sandboxed Oracle view");
    eprintln!("  --state <file>       session state file (default .renderlens.json)");
    eprintln!("  --log <file>         log file (default .renderlens.log)");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  {} --engine ./toy-engine", program);
}

fn parse_args(args: &[String]) -> Option<Config> {
    let mut engine = None;
    let mut oracle = None;
    let mut no_oracle = false;
    let mut state = String::from(".renderlens.json");
    let mut log = String::from(".renderlens.log");

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--engine" => engine = Some(iter.next()?.clone()),
            "--oracle" => oracle = Some(iter.next()?.clone()),
            "--no-oracle" => no_oracle = true,
            "--state" => state = iter.next()?.clone(),
            "--log" => log = iter.next()?.clone(),
            _ => return None,
        }
    }

    let engine = engine?;
    let oracle = if no_oracle {
        None
    } else {
        Some(oracle.unwrap_or_else(|| engine.clone()))
    };
    Some(Config {
        engine,
        oracle,
        state,
        log,
    })
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(|s| s.as_str()).unwrap_or("renderlens");

    let config = match parse_args(&args[1..]) {
        Some(config) => config,
        None => {
            usage(program);
            std::process::exit(1);
        }
    };

    // The TUI owns the terminal, so diagnostics go to a file
    let log_file =
        File::create(&config.log).with_context(|| format!("creating log file {}", config.log))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();

    let store = SessionStore::new(&config.state);
    let source = store.load();

    let oracle = config.oracle.as_ref().map(|command| {
        OracleView::new(
            Box::new(SandboxProcess::new(command.clone())),
            VIEWPORT_WIDTH,
            VIEWPORT_HEIGHT,
        )
    });

    let mut app = App::new(PipelineInvoker::new(), oracle, store, source);

    // Load the engine off-thread so the UI comes up immediately; the app
    // buffers the first render until the handshake completes.
    let (tx, rx) = mpsc::channel();
    let engine_command = config.engine.clone();
    thread::spawn(move || {
        let loaded = EngineProcess::spawn(&engine_command)
            .map(|engine| Box::new(engine) as Box<dyn RenderEngine + Send>);
        let _ = tx.send(loaded);
    });
    app.set_engine_loader(rx);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
