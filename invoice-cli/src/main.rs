mod commands;
mod config;
mod opts;

use anyhow::{Context, Result};
use clap::Parser;
use invoice_core::{DirStore, InvoiceArchive};
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;
use crate::opts::{Command, Opts, SettingsAction};

/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let mut config = CliConfig::load(opts.config.as_deref())?;
    if let Some(dir) = opts.data_dir {
        config.data_dir = dir;
    }
    init_tracing(&config.log_level);

    let store = DirStore::open(&config.data_dir)
        .with_context(|| format!("opening archive at {}", config.data_dir.display()))?;
    let mut archive = InvoiceArchive::new(store);
    tracing::debug!(data_dir = %config.data_dir.display(), "archive opened");

    match opts.command {
        Command::Create { draft, out } => {
            let composer = config.composer()?;
            let today = chrono::Local::now().date_naive();
            let line = commands::create(&mut archive, &composer, &draft, out.as_deref(), today)?;
            println!("{}", line);
        }
        Command::List { search } => {
            let currency = config.currency();
            for line in commands::list(&archive, search.as_deref(), &currency)? {
                println!("{}", line);
            }
        }
        Command::Show { id } => println!("{}", commands::show(&archive, &id)?),
        Command::Export { id, out } => commands::export(&archive, &id, &out)?,
        Command::Delete { id } => commands::delete(&mut archive, &id)?,
        Command::Settings(SettingsAction::Show) => println!("{}", commands::settings_show(&archive)?),
        Command::Settings(SettingsAction::Import { file }) => {
            commands::settings_import(&mut archive, &file)?
        }
    }
    Ok(())
}
