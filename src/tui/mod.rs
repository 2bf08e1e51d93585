// File: ./src/tui/mod.rs
// Entry point and main loop for the TUI application.
pub mod action;
pub mod handlers;
pub mod network;
pub mod state;
pub mod view;

use crate::config::{self, Config};
use crate::context::AppContext;
use crate::controller::LabController;
use crate::logging;
use crate::tui::state::AppState;
use crate::tui::view::draw;

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};
use tokio::sync::mpsc;

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// First run: ask for the spreadsheet and the camera folder, then save.
fn onboard(ctx: &dyn AppContext) -> Result<Config> {
    println!("Welcome to labstock. No configuration file found.");
    println!("Let's connect the scanner to your inventory spreadsheet.\n");

    let mut new_config = Config::default();
    loop {
        let sheet = prompt("Spreadsheet URL or exact title: ")?;
        if !sheet.is_empty() {
            new_config.spreadsheet = sheet;
            break;
        }
        eprintln!("A spreadsheet is required.");
    }

    let dir = prompt("Folder your camera saves photos to (optional): ")?;
    if !dir.is_empty() {
        new_config.capture_dir = Some(PathBuf::from(dir));
    }

    if let Err(e) = new_config.save(ctx) {
        eprintln!("Warning: Could not save config file: {}", e);
    } else if let Ok(path) = Config::get_path_string(ctx) {
        println!("Configuration saved to: {}", path);
    }

    if let Ok(secrets) = ctx.get_secrets_file_path()
        && !secrets.exists()
    {
        println!(
            "\nPut GEMINI_API_KEY and a [gcp_service_account] table in {}",
            secrets.display()
        );
    }

    println!("Starting TUI...");
    std::thread::sleep(Duration::from_secs(1));
    Ok(new_config)
}

pub async fn run(ctx: Arc<dyn AppContext>) -> Result<()> {
    // --- 1. PREAMBLE & CONFIG ---
    let cfg = match Config::load(ctx.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            // A broken file is reported; only a missing one triggers onboarding.
            if !config::Config::is_missing_config_error(&e) {
                eprintln!("Error loading configuration:\n{}", e);
                std::process::exit(1);
            }
            onboard(ctx.as_ref())?
        }
    };

    if let Err(e) = logging::init(ctx.as_ref(), &cfg.log_level) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    // Panic Hook
    let panic_log = ctx.get_data_dir().ok().map(|d| d.join("labstock_panic.log"));
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(path) = &panic_log
            && let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
        {
            let _ = writeln!(file, "PANIC: {:?}", info);
        }
        default_hook(info);
    }));

    let controller = Arc::new(LabController::from_context(&cfg, ctx.as_ref()));

    // --- 2. TERMINAL SETUP ---
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // --- 3. STATE INIT ---
    let mut app_state = AppState::new();
    app_state.capture_dir = cfg.capture_dir.clone();
    app_state.worksheet = cfg.worksheet.clone();

    let (action_tx, action_rx) = mpsc::channel(10);
    let (event_tx, mut event_rx) = mpsc::channel(64);

    // --- 4. NETWORK TASK ---
    tokio::spawn(network::run_network_actor(
        controller.clone(),
        action_rx,
        event_tx,
    ));

    // --- 5. UI LOOP ---
    loop {
        terminal.draw(|f| draw(f, &mut app_state))?;

        // A. Network Events
        while let Ok(event) = event_rx.try_recv() {
            handlers::handle_app_event(&mut app_state, event);
        }

        // B. Input Events
        if crossterm::event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
        {
            // Filter out KeyRelease events to prevent double input on Windows
            if key.kind == event::KeyEventKind::Release {
                continue;
            }

            if let Some(action) = handlers::handle_key_event(key, &mut app_state) {
                if matches!(action, action::Action::Quit) {
                    let _ = action_tx.try_send(action::Action::Quit);
                    break;
                }
                let _ = action_tx.send(action).await;
            }
        }
    }

    // --- 6. CLEANUP ---
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    log::info!("labstock exiting");
    Ok(())
}
