use anyhow::Result;
use labstock::context::{AppContext, StandardContext};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    // Handle help flag
    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h" || args[1] == "help") {
        print_help();
        return Ok(());
    }

    let root = match args.iter().position(|a| a == "--root") {
        Some(i) => match args.get(i + 1) {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                eprintln!("--root needs a directory");
                std::process::exit(2);
            }
        },
        None => None,
    };

    let ctx: Arc<dyn AppContext> = Arc::new(StandardContext::new(root));
    labstock::tui::run(ctx).await
}

fn print_help() {
    println!(
        "labstock v{} - Lab inventory label scanner (TUI)",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    labstock                  Start interactive TUI");
    println!("    labstock --root <dir>     Keep config, secrets and logs under <dir>");
    println!("    labstock --help           Show this help message");
    println!();
    println!("FILES:");
    println!("    config.toml               spreadsheet, worksheet, model, capture_dir, ...");
    println!("    secrets.toml              GEMINI_API_KEY and [gcp_service_account]");
    println!("    labstock.log              Log file in the data directory");
    println!();
    println!("ENVIRONMENT:");
    println!("    GEMINI_API_KEY            Overrides the key in secrets.toml");
    println!();
    println!("KEYBINDINGS:");
    println!("    Press '?' inside the app for full interactive help");
}
