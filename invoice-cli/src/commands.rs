use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use invoice_core::format;
use invoice_core::{
    issue, validate, AppSettings, BusinessProfile, ClientDetails, Composer, Counter, DirStore,
    InvoiceArchive, InvoiceDraft, InvoiceIdGenerator, InvoiceMeta, LineItem,
};
use serde::{Deserialize, Serialize};

pub type Archive = InvoiceArchive<DirStore>;

/// Draft as written by hand: percentages may be left out and then take
/// the saved defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFile {
    pub client: ClientDetails,
    #[serde(default)]
    pub items: Vec<DraftItem>,
    #[serde(default)]
    pub notes: String,
    pub issue_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftItem {
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub discount_percentage: Option<f64>,
    pub tax_percentage: Option<f64>,
}

impl DraftFile {
    pub fn into_draft(self, settings: &AppSettings) -> InvoiceDraft {
        let items = self
            .items
            .into_iter()
            .map(|item| {
                LineItem::new(item.product_name, item.quantity, item.unit_price)
                    .with_discount(item.discount_percentage.unwrap_or(settings.default_discount_percent))
                    .with_tax(item.tax_percentage.unwrap_or(settings.default_tax_percent))
            })
            .collect();
        InvoiceDraft {
            client: self.client,
            items,
            notes: self.notes,
            issue_date: self.issue_date,
        }
    }
}

/// `settings show` output and `settings import` input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<AppSettings>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))
}

pub fn create(
    archive: &mut Archive,
    composer: &Composer,
    draft_path: &Path,
    out: Option<&Path>,
    today: NaiveDate,
) -> Result<String> {
    let settings = archive.settings()?;
    let business = archive.business()?;
    let draft = read_json::<DraftFile>(draft_path)?.into_draft(&settings);

    validate(&draft)?;
    // The number is taken before rendering; a failed save leaves a gap.
    let reserved = archive.next_sequence()?;
    let mut counter = Counter::starting_after(reserved - 1);
    let issued = {
        let mut ids = InvoiceIdGenerator::new(&mut counter);
        issue(archive, &mut ids, draft, &business, &settings, composer, today)?
    };

    if issued.logo_dropped {
        eprintln!("warning: the business logo could not be used and was left out");
    }
    if let Some(out) = out {
        fs::write(out, issued.document.as_bytes())
            .with_context(|| format!("writing {}", out.display()))?;
    }
    Ok(format!(
        "{}  {}  {}",
        issued.invoice.id(),
        issued.invoice.client().name,
        format::money(issued.summary.grand_total, &composer.options().currency)
    ))
}

fn meta_line(meta: &InvoiceMeta, currency: &str) -> String {
    format!(
        "{}  {}  {:<24}  {:>14}",
        meta.id,
        meta.issue_date,
        meta.client_name,
        format::money(meta.grand_total, currency)
    )
}

pub fn list(archive: &Archive, search: Option<&str>, currency: &str) -> Result<Vec<String>> {
    let metas = match search {
        Some(term) => archive.search(term)?,
        None => archive.list()?,
    };
    Ok(metas.iter().map(|m| meta_line(m, currency)).collect())
}

pub fn show(archive: &Archive, id: &str) -> Result<String> {
    let invoice = archive.load_invoice(id)?;
    let (items, summary) = invoice.compute();
    let value = serde_json::json!({
        "invoice": invoice,
        "items": items,
        "summary": summary,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn export(archive: &Archive, id: &str, out: &Path) -> Result<()> {
    let document = archive.load_document(id)?;
    fs::write(out, document.as_bytes()).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(id, path = %out.display(), bytes = document.len(), "exported");
    Ok(())
}

pub fn delete(archive: &mut Archive, id: &str) -> Result<()> {
    archive
        .delete(id)
        .with_context(|| format!("deleting invoice {}", id))
}

pub fn settings_show(archive: &Archive) -> Result<String> {
    let file = SettingsFile {
        business: Some(archive.business()?),
        settings: Some(archive.settings()?),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Sections missing from the file are left as they are.
pub fn settings_import(archive: &mut Archive, path: &Path) -> Result<()> {
    let file: SettingsFile = read_json(path)?;
    if let Some(business) = &file.business {
        archive.save_business(business)?;
    }
    if let Some(settings) = &file.settings {
        archive.save_settings(settings)?;
    }
    Ok(())
}
