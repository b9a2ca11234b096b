//! Command-line interface for the profiling service.

pub mod commands;
pub mod context;
pub mod output;
pub mod types;

pub use context::AppContext;
pub use types::{Cli, Commands};

/// Print an error in the selected output mode and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let payload = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
