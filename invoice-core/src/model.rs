use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::calc::{self, ComputedLineItem, InvoiceSummary};
use crate::validate::finite;

/// One product or service row as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(rename = "productName")]
    #[validate(length(min = 1, message = "product name is required"))]
    pub name: String,
    #[validate(
        custom(function = "finite"),
        range(exclusive_min = 0.0, message = "quantity must be greater than zero")
    )]
    pub quantity: f64,
    #[validate(
        custom(function = "finite"),
        range(min = 0.0, message = "unit price must not be negative")
    )]
    pub unit_price: f64,
    #[serde(rename = "discountPercentage")]
    #[validate(
        custom(function = "finite"),
        range(min = 0.0, max = 100.0, message = "discount must be between 0 and 100")
    )]
    pub discount_percent: f64,
    #[serde(rename = "taxPercentage")]
    #[validate(
        custom(function = "finite"),
        range(min = 0.0, max = 100.0, message = "tax must be between 0 and 100")
    )]
    pub tax_percent: f64,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        LineItem {
            name: name.into(),
            quantity,
            unit_price,
            discount_percent: 0.0,
            tax_percent: 0.0,
        }
    }

    pub fn with_discount(mut self, percent: f64) -> Self {
        self.discount_percent = percent;
        self
    }

    pub fn with_tax(mut self, percent: f64) -> Self {
        self.tax_percent = percent;
        self
    }
}

/// The issuing business, as configured in settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessProfile {
    pub name: String,
    pub tax_number: String,
    pub commercial_register: String,
    pub phone: String,
    pub website: String,
    /// PNG or JPEG, either a `data:` URI or bare base64.
    pub logo: Option<String>,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ClientDetails {
    #[validate(length(min = 1, message = "client name is required"))]
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// Switches for optional fields. A switched-off amount is computed as
/// zero, not just hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayFlags {
    #[serde(rename = "showTaxField")]
    pub show_tax: bool,
    #[serde(rename = "showDiscountField")]
    pub show_discount: bool,
    #[serde(rename = "showCommercialRegisterField")]
    pub show_commercial_register: bool,
    #[serde(rename = "showWebsiteField")]
    pub show_website: bool,
    #[serde(rename = "showBusinessAddressField")]
    pub show_business_address: bool,
    #[serde(rename = "showClientAddressField")]
    pub show_client_address: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        DisplayFlags {
            show_tax: true,
            show_discount: true,
            show_commercial_register: true,
            show_website: true,
            show_business_address: true,
            show_client_address: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    #[serde(flatten)]
    pub flags: DisplayFlags,
    #[serde(rename = "defaultTaxPercentage")]
    pub default_tax_percent: f64,
    #[serde(rename = "defaultDiscountPercentage")]
    pub default_discount_percent: f64,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            flags: DisplayFlags::default(),
            default_tax_percent: 15.0,
            default_discount_percent: 0.0,
        }
    }
}

/// Unvalidated input for a new invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceDraft {
    #[validate(nested)]
    pub client: ClientDetails,
    #[validate(nested)]
    pub items: Vec<LineItem>,
    pub notes: String,
    /// Today when absent.
    pub issue_date: Option<NaiveDate>,
}

/// An issued invoice.
///
/// Business details and settings are copies taken when the invoice was
/// created, so later settings changes never alter it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    id: String,
    issue_date: NaiveDate,
    client: ClientDetails,
    items: Vec<LineItem>,
    notes: String,
    business_details: BusinessProfile,
    settings_snapshot: AppSettings,
}

impl Invoice {
    pub fn new(
        id: impl Into<String>,
        issue_date: NaiveDate,
        draft: InvoiceDraft,
        business: &BusinessProfile,
        settings: &AppSettings,
    ) -> Self {
        Invoice {
            id: id.into(),
            issue_date,
            client: draft.client,
            items: draft.items,
            notes: draft.notes,
            business_details: business.clone(),
            settings_snapshot: *settings,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn client(&self) -> &ClientDetails {
        &self.client
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn business(&self) -> &BusinessProfile {
        &self.business_details
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings_snapshot
    }

    pub fn flags(&self) -> &DisplayFlags {
        &self.settings_snapshot.flags
    }

    /// Totals under the flags captured at creation.
    pub fn compute(&self) -> (Vec<ComputedLineItem>, InvoiceSummary) {
        calc::compute(&self.items, self.flags())
    }

    pub fn header(&self) -> InvoiceHeader<'_> {
        InvoiceHeader {
            id: &self.id,
            issue_date: self.issue_date,
            business: &self.business_details,
        }
    }

    pub fn meta(&self, summary: &InvoiceSummary) -> InvoiceMeta {
        InvoiceMeta {
            id: self.id.clone(),
            client_name: self.client.name.clone(),
            issue_date: self.issue_date,
            grand_total: summary.grand_total,
        }
    }
}

/// What the document heading shows: who issued which invoice, when.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceHeader<'a> {
    pub id: &'a str,
    pub issue_date: NaiveDate,
    pub business: &'a BusinessProfile,
}

/// Archive listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceMeta {
    pub id: String,
    pub client_name: String,
    pub issue_date: NaiveDate,
    pub grand_total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_use_original_field_names() {
        let json = serde_json::to_value(AppSettings::default()).unwrap();
        assert_eq!(json["showTaxField"], true);
        assert_eq!(json["showClientAddressField"], true);
        assert_eq!(json["defaultTaxPercentage"], 15.0);
        assert_eq!(json["defaultDiscountPercentage"], 0.0);
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: AppSettings = serde_json::from_str(r#"{"showTaxField":false}"#).unwrap();
        assert!(!settings.flags.show_tax);
        assert!(settings.flags.show_discount);
        assert_eq!(settings.default_tax_percent, 15.0);
    }

    #[test]
    fn line_item_field_names() {
        let item: LineItem = serde_json::from_str(
            r#"{"productName":"Desk","quantity":1,"unitPrice":250.5,"discountPercentage":5,"taxPercentage":15}"#,
        )
        .unwrap();
        assert_eq!(item, LineItem::new("Desk", 1.0, 250.5).with_discount(5.0).with_tax(15.0));
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut business = BusinessProfile {
            name: "Acme".into(),
            ..BusinessProfile::default()
        };
        let mut settings = AppSettings::default();
        let invoice = Invoice::new(
            "INV-20240305-0001",
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            InvoiceDraft::default(),
            &business,
            &settings,
        );
        business.name = "Renamed".into();
        settings.flags.show_tax = false;
        assert_eq!(invoice.business().name, "Acme");
        assert!(invoice.flags().show_tax);
    }
}
