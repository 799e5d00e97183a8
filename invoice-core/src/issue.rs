use chrono::NaiveDate;

use crate::calc::{ComputedLineItem, InvoiceSummary};
use crate::compose::{Composer, Document};
use crate::error::{IssueError, RenderError};
use crate::ids::{InvoiceIdGenerator, SequenceGenerator};
use crate::model::{AppSettings, BusinessProfile, Invoice, InvoiceDraft, InvoiceHeader};
use crate::store::{InvoiceArchive, KeyValueStore};
use crate::validate::validate;

/// Everything produced by issuing one invoice.
#[derive(Debug, Clone)]
pub struct Issued {
    pub invoice: Invoice,
    pub items: Vec<ComputedLineItem>,
    pub summary: InvoiceSummary,
    pub document: Document,
    /// The business logo could not be embedded and was left out.
    pub logo_dropped: bool,
}

/// Render `invoice`; if its logo is unusable, log it and render again
/// without the logo. The flag reports whether that happened.
pub fn render_with_fallback(
    composer: &Composer,
    invoice: &Invoice,
    items: &[ComputedLineItem],
    summary: &InvoiceSummary,
) -> Result<(Document, bool), RenderError> {
    let header = invoice.header();
    let first = composer.compose(
        &header,
        invoice.client(),
        items,
        summary,
        invoice.notes(),
        invoice.flags(),
    );
    match first {
        Err(RenderError::Logo(cause)) => {
            tracing::warn!(id = invoice.id(), error = %cause, "logo rejected, rendering without it");
            let business = BusinessProfile {
                logo: None,
                ..invoice.business().clone()
            };
            let header = InvoiceHeader {
                business: &business,
                ..header
            };
            let document = composer.compose(
                &header,
                invoice.client(),
                items,
                summary,
                invoice.notes(),
                invoice.flags(),
            )?;
            Ok((document, true))
        }
        other => other.map(|document| (document, false)),
    }
}

/// Validate a draft, snapshot it into an invoice, render it and save
/// all of its records. The issue date defaults to `today`.
pub fn issue<S, G>(
    archive: &mut InvoiceArchive<S>,
    ids: &mut InvoiceIdGenerator<G>,
    draft: InvoiceDraft,
    business: &BusinessProfile,
    settings: &AppSettings,
    composer: &Composer,
    today: NaiveDate,
) -> Result<Issued, IssueError>
where
    S: KeyValueStore,
    G: SequenceGenerator,
{
    validate(&draft)?;

    let issue_date = draft.issue_date.unwrap_or(today);
    let id = ids.next_id(issue_date);
    let invoice = Invoice::new(id, issue_date, draft, business, settings);
    let (items, summary) = invoice.compute();
    let (document, logo_dropped) = render_with_fallback(composer, &invoice, &items, &summary)?;
    archive.save(&invoice, &summary, &document)?;

    tracing::info!(
        id = invoice.id(),
        items = items.len(),
        grand_total = summary.grand_total,
        "invoice issued"
    );
    Ok(Issued {
        invoice,
        items,
        summary,
        document,
        logo_dropped,
    })
}
