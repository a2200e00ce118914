mod core;
#[cfg(test)]
mod test_support;
mod tui;

use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;

use crate::core::config::{self, CliOverrides};

#[derive(Parser)]
#[command(name = "charsheet", about = "Terminal D&D character sheets")]
struct Args {
    /// Character data file (JSON snapshot)
    #[arg(short, long)]
    data_file: Option<std::path::PathBuf>,

    /// Public key to log in with silently
    #[arg(short, long)]
    identity_key: Option<String>,

    /// error, warn, info, debug or trace
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("charsheet: {e}, using defaults");
            config::SheetConfig::default()
        }
    };
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            data_file: args.data_file,
            identity_key: args.identity_key,
            log_level: args.log_level,
        },
    );

    // Never log to the terminal: the UI owns it
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Some(parent) = resolved.log_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    log::info!(
        "charsheet starting up (data file {}, identity key {})",
        resolved.data_file.display(),
        if resolved.identity_key.is_some() { "present" } else { "absent" }
    );

    tui::run(resolved)
}
