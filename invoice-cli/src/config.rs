use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use invoice_core::{Composer, RenderOptions};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

/// Settings read from `invoice.toml` and `INVOICE__*` variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    /// TrueType font for body text; required for Arabic output.
    pub font_path: Option<PathBuf>,
    pub bold_font_path: Option<PathBuf>,
    pub locale: Locale,
    /// Overrides the locale's currency label.
    pub currency: Option<String>,
    pub compress: bool,
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            data_dir: PathBuf::from("invoice-data"),
            font_path: None,
            bold_font_path: None,
            locale: Locale::En,
            currency: None,
            compress: true,
            log_level: "info".into(),
        }
    }
}

impl CliConfig {
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name("invoice").required(false),
        };
        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("INVOICE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("reading configuration")?;
        config
            .try_deserialize()
            .context("invalid configuration")
    }

    fn base_options(&self) -> RenderOptions {
        match self.locale {
            Locale::En => RenderOptions::default(),
            Locale::Ar => RenderOptions::arabic(),
        }
    }

    pub fn currency(&self) -> String {
        match &self.currency {
            Some(currency) => currency.clone(),
            None => self.base_options().currency,
        }
    }

    /// Reads the configured font files.
    pub fn render_options(&self) -> Result<RenderOptions> {
        let mut options = self.base_options();
        options.currency = self.currency();
        options.compress = self.compress;

        if let Some(path) = &self.font_path {
            let regular = read_font(path)?;
            let bold = self.bold_font_path.as_deref().map(read_font).transpose()?;
            options = options.with_fonts(regular, bold);
        } else if self.locale == Locale::Ar {
            tracing::warn!("arabic locale without font_path; text will not display correctly");
        }
        Ok(options)
    }

    pub fn composer(&self) -> Result<Composer> {
        Ok(Composer::new(self.render_options()?))
    }
}

fn read_font(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading font {}", path.display()))
}
