//! Input checks that run before any totals are computed.
//!
//! The rules live on the model types as `validator` attributes. This
//! module turns the resulting error map into a single
//! [`ValidationError`], chosen in a fixed order: the client first, then
//! items by index, then fields in declaration order.

use std::borrow::Cow;

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::ValidationError;
use crate::model::InvoiceDraft;

/// Rust field name and the name used in reported paths.
const ITEM_FIELDS: [(&str, &str); 5] = [
    ("name", "productName"),
    ("quantity", "quantity"),
    ("unit_price", "unitPrice"),
    ("discount_percent", "discountPercentage"),
    ("tax_percent", "taxPercentage"),
];

/// Rejects NaN and infinities, which range checks let through.
pub(crate) fn finite(value: f64) -> Result<(), validator::ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("finite");
        err.message = Some(Cow::Borrowed("must be a finite number"));
        Err(err)
    }
}

pub fn validate(draft: &InvoiceDraft) -> Result<(), ValidationError> {
    match draft.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let err = first_error(&errors)
                .unwrap_or_else(|| ValidationError::new("invoice", "invalid input"));
            tracing::debug!(field = %err.field, message = %err.message, "draft rejected");
            Err(err)
        }
    }
}

fn first_error(errors: &ValidationErrors) -> Option<ValidationError> {
    let map = errors.errors();

    if let Some(ValidationErrorsKind::Struct(client)) = map.get("client") {
        if let Some(err) = field_error(client, "name", "client.name") {
            return Some(err);
        }
    }

    if let Some(ValidationErrorsKind::List(items)) = map.get("items") {
        for (index, item) in items {
            for (field, shown) in ITEM_FIELDS {
                let path = format!("items[{}].{}", index, shown);
                if let Some(err) = field_error(item, field, &path)
                    .or_else(|| field_error(item, shown, &path))
                {
                    return Some(err);
                }
            }
        }
    }
    None
}

fn field_error(errors: &ValidationErrors, field: &str, path: &str) -> Option<ValidationError> {
    match errors.errors().get(field) {
        Some(ValidationErrorsKind::Field(list)) => list.first().map(|e| {
            let message = e
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string());
            ValidationError::new(path, message)
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClientDetails, LineItem};

    fn draft(items: Vec<LineItem>) -> InvoiceDraft {
        InvoiceDraft {
            client: ClientDetails {
                name: "Nora".into(),
                ..ClientDetails::default()
            },
            items,
            ..InvoiceDraft::default()
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(validate(&draft(vec![LineItem::new("Desk", 1.0, 0.0)])).is_ok());
        assert!(validate(&draft(vec![])).is_ok());
    }

    #[test]
    fn missing_client_name() {
        let mut d = draft(vec![LineItem::new("", 0.0, -1.0)]);
        d.client.name.clear();
        let err = validate(&d).unwrap_err();
        assert_eq!(err.field, "client.name");
    }

    #[test]
    fn reports_first_bad_item() {
        let d = draft(vec![
            LineItem::new("ok", 1.0, 1.0),
            LineItem::new("ok", 1.0, 1.0),
            LineItem::new("bad", 0.0, 1.0),
            LineItem::new("", 1.0, -5.0),
        ]);
        let err = validate(&d).unwrap_err();
        assert_eq!(err.field, "items[2].quantity");
        assert_eq!(err.message, "quantity must be greater than zero");
    }

    #[test]
    fn negative_price() {
        let err = validate(&draft(vec![LineItem::new("x", 1.0, -0.01)])).unwrap_err();
        assert_eq!(err.field, "items[0].unitPrice");
    }

    #[test]
    fn percent_bounds() {
        let err = validate(&draft(vec![LineItem::new("x", 1.0, 1.0).with_tax(100.5)])).unwrap_err();
        assert_eq!(err.field, "items[0].taxPercentage");
        let err = validate(&draft(vec![LineItem::new("x", 1.0, 1.0).with_discount(-1.0)])).unwrap_err();
        assert_eq!(err.field, "items[0].discountPercentage");
    }

    #[test]
    fn nan_quantity_is_rejected() {
        let err = validate(&draft(vec![LineItem::new("x", f64::NAN, 1.0)])).unwrap_err();
        assert_eq!(err.field, "items[0].quantity");
    }

    #[test]
    fn infinite_price_is_rejected() {
        assert!(finite(12.5).is_ok());
        assert!(finite(f64::NEG_INFINITY).is_err());
        let err = validate(&draft(vec![LineItem::new("x", 1.0, f64::INFINITY)])).unwrap_err();
        assert_eq!(err.field, "items[0].unitPrice");
        assert_eq!(err.message, "must be a finite number");
    }
}
