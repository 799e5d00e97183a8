use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "invoice", version, about = "Issue and archive PDF invoices")]
pub struct Opts {
    /// Configuration file; defaults to `invoice.toml` in the working directory if present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Archive directory, overriding the configured one.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Issue an invoice from a JSON draft
    Create {
        draft: PathBuf,
        /// Also write the PDF here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List archived invoices, newest first
    List {
        /// Only entries whose id, client or date contains this
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Print a stored invoice with its recomputed totals
    Show { id: String },
    /// Write the stored PDF of an invoice
    Export {
        id: String,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Remove an invoice and its PDF
    Delete { id: String },
    /// Business profile and display settings
    #[command(subcommand)]
    Settings(SettingsAction),
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print the saved profile and settings as JSON
    Show,
    /// Replace them from a JSON file
    Import { file: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_settings_command() {
        let opts = Opts::try_parse_from(["invoice", "settings", "import", "profile.json"]).unwrap();
        assert!(matches!(
            opts.command,
            Command::Settings(SettingsAction::Import { ref file }) if file == &PathBuf::from("profile.json")
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let opts = Opts::try_parse_from(["invoice", "list", "--search", "acme", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(opts.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(opts.command, Command::List { search: Some(ref s) } if s == "acme"));
    }

    #[test]
    fn export_requires_out() {
        assert!(Opts::try_parse_from(["invoice", "export", "INV-1"]).is_err());
    }
}
