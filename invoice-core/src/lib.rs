//! Invoice calculation, PDF composition and local record keeping.
//!
//! A draft is validated, frozen into an [`Invoice`] together with the
//! business profile and display settings in force at issue time,
//! computed into per-line amounts and totals, and rendered by the
//! [`Composer`] into an A4 [`Document`].

pub mod calc;
pub mod compose;
pub mod error;
pub mod format;
pub mod ids;
pub mod issue;
pub mod model;
pub mod store;
pub mod validate;

pub use calc::{compute, ComputedLineItem, InvoiceSummary};
pub use compose::{render, Composer, Document, Labels, RenderOptions};
pub use error::{IssueError, LogoError, RenderError, StoreError, ValidationError};
pub use ids::{Counter, InvoiceIdGenerator, SequenceGenerator};
pub use issue::{issue, render_with_fallback, Issued};
pub use model::{
    AppSettings, BusinessProfile, ClientDetails, DisplayFlags, Invoice, InvoiceDraft,
    InvoiceHeader, InvoiceMeta, LineItem,
};
pub use store::{DirStore, InvoiceArchive, KeyValueStore, MemoryStore};
pub use validate::validate;

pub use invoice_pdf::TextDirection;
