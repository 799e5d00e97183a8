use chrono::NaiveDate;
use invoice_core::store::{COUNTER_KEY, DATA_PREFIX, METAS_KEY, PDF_PREFIX};
use invoice_core::{
    issue, AppSettings, BusinessProfile, ClientDetails, Composer, Counter, DirStore, DisplayFlags,
    Invoice, InvoiceArchive, InvoiceDraft, InvoiceIdGenerator, IssueError, KeyValueStore,
    LineItem, MemoryStore, StoreError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn business() -> BusinessProfile {
    BusinessProfile {
        name: "Northwind Trading".into(),
        tax_number: "300123456700003".into(),
        ..BusinessProfile::default()
    }
}

fn draft(client: &str, items: Vec<LineItem>) -> InvoiceDraft {
    InvoiceDraft {
        client: ClientDetails {
            name: client.into(),
            ..ClientDetails::default()
        },
        items,
        notes: String::new(),
        issue_date: None,
    }
}

/// Awkward binary fractions, to catch precision loss.
fn precise_items() -> Vec<LineItem> {
    vec![
        LineItem::new("First", 0.1, 0.7).with_discount(33.333333333333336).with_tax(15.0),
        LineItem::new("Second", 3.0, 19.99).with_tax(5.5),
        LineItem::new("Third", 1.0 / 3.0, 1e-7),
    ]
}

fn issue_one<S: KeyValueStore>(
    archive: &mut InvoiceArchive<S>,
    counter: &mut Counter,
    client: &str,
    on: NaiveDate,
) -> invoice_core::Issued {
    let mut ids = InvoiceIdGenerator::new(counter);
    let mut d = draft(client, vec![LineItem::new("Item", 1.0, 100.0).with_tax(15.0)]);
    d.issue_date = Some(on);
    issue(
        archive,
        &mut ids,
        d,
        &business(),
        &AppSettings::default(),
        &Composer::default(),
        date(2024, 1, 1),
    )
    .unwrap()
}

// -------------------------------------------------------
// Round trip
// -------------------------------------------------------

fn assert_round_trip<S: KeyValueStore>(store: S) {
    let mut archive = InvoiceArchive::new(store);
    let settings = AppSettings {
        flags: DisplayFlags {
            show_website: false,
            ..DisplayFlags::default()
        },
        default_tax_percent: 5.5,
        default_discount_percent: 2.5,
    };
    let invoice = Invoice::new(
        "INV-20240305-0001",
        date(2024, 3, 5),
        draft("Acme", precise_items()),
        &business(),
        &settings,
    );
    let (_, summary) = invoice.compute();
    let document = Composer::default().compose_invoice(&invoice).unwrap();

    archive.save(&invoice, &summary, &document).unwrap();

    let loaded = archive.load_invoice(invoice.id()).unwrap();
    assert_eq!(loaded, invoice);
    let names: Vec<&str> = loaded.items().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["First", "Second", "Third"]);
    assert_eq!(loaded.items()[0].discount_percent, 33.333333333333336);
    assert_eq!(loaded.compute().1, summary);
    assert_eq!(archive.load_document(invoice.id()).unwrap(), document);

    let metas = archive.list().unwrap();
    assert_eq!(metas.len(), 1);
    assert_eq!(metas[0].grand_total, summary.grand_total);
}

#[test]
fn memory_store_round_trip() {
    assert_round_trip(MemoryStore::new());
}

#[test]
fn dir_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    assert_round_trip(DirStore::open(dir.path()).unwrap());
    assert!(dir.path().join(METAS_KEY).exists());
    assert!(dir.path().join(format!("{}INV-20240305-0001", PDF_PREFIX)).exists());
    assert!(dir.path().join(format!("{}INV-20240305-0001", DATA_PREFIX)).exists());
}

#[test]
fn saving_a_listed_id_is_refused() {
    let mut archive = InvoiceArchive::new(MemoryStore::new());
    let first = Invoice::new(
        "INV-1",
        date(2024, 3, 5),
        draft("Acme", precise_items()),
        &business(),
        &AppSettings::default(),
    );
    let (_, summary) = first.compute();
    let document = Composer::default().compose_invoice(&first).unwrap();
    archive.save(&first, &summary, &document).unwrap();

    let reused = Invoice::new(
        "INV-1",
        date(2024, 3, 6),
        draft("Globex", vec![LineItem::new("Other", 1.0, 1.0)]),
        &business(),
        &AppSettings::default(),
    );
    let (_, reused_summary) = reused.compute();
    let reused_document = Composer::default().compose_invoice(&reused).unwrap();
    let err = archive.save(&reused, &reused_summary, &reused_document).unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(ref id) if id == "INV-1"));

    assert_eq!(archive.load_invoice("INV-1").unwrap(), first);
    assert_eq!(archive.load_document("INV-1").unwrap(), document);
    assert_eq!(archive.list().unwrap().len(), 1);
}

#[test]
fn stored_invoice_uses_browser_field_names() {
    let mut archive = InvoiceArchive::new(MemoryStore::new());
    let invoice = Invoice::new(
        "INV-1",
        date(2024, 3, 5),
        draft("Acme", precise_items()),
        &business(),
        &AppSettings::default(),
    );
    let (_, summary) = invoice.compute();
    let document = Composer::default().compose_invoice(&invoice).unwrap();
    archive.save(&invoice, &summary, &document).unwrap();

    let raw = archive.store().get(&format!("{}INV-1", DATA_PREFIX)).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(value["issueDate"], "2024-03-05");
    assert_eq!(value["items"][0]["productName"], "First");
    assert_eq!(value["items"][1]["taxPercentage"], 5.5);
    assert_eq!(value["businessDetails"]["name"], "Northwind Trading");
    assert_eq!(value["settingsSnapshot"]["showTaxField"], true);
    assert_eq!(value["settingsSnapshot"]["defaultTaxPercentage"], 15.0);
}

#[test]
fn settings_and_business_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut archive = InvoiceArchive::new(DirStore::open(dir.path()).unwrap());
    let settings = AppSettings {
        default_tax_percent: 0.0,
        ..AppSettings::default()
    };
    archive.save_settings(&settings).unwrap();
    archive.save_business(&business()).unwrap();

    let reopened = InvoiceArchive::new(DirStore::open(dir.path()).unwrap());
    assert_eq!(reopened.settings().unwrap(), settings);
    assert_eq!(reopened.business().unwrap(), business());
}

// -------------------------------------------------------
// Issuing
// -------------------------------------------------------

#[test]
fn issue_assigns_sequential_ids_and_saves() {
    let mut archive = InvoiceArchive::new(MemoryStore::new());
    let mut counter = Counter::default();

    let first = issue_one(&mut archive, &mut counter, "Acme", date(2024, 3, 5));
    let second = issue_one(&mut archive, &mut counter, "Globex", date(2024, 3, 6));

    assert_eq!(first.invoice.id(), "INV-20240305-0001");
    assert_eq!(second.invoice.id(), "INV-20240306-0002");
    assert!((first.summary.grand_total - 115.0).abs() < 1e-9);
    assert!(!first.logo_dropped);
    assert_eq!(first.document.page_count(), 1);
    assert_eq!(archive.list().unwrap().len(), 2);
    assert_eq!(archive.load_document("INV-20240306-0002").unwrap(), second.document);
    assert_eq!(counter.last(), 2);
}

#[test]
fn issue_defaults_date_to_today() {
    let mut archive = InvoiceArchive::new(MemoryStore::new());
    let mut ids = InvoiceIdGenerator::new(Counter::starting_after(41));
    let issued = issue(
        &mut archive,
        &mut ids,
        draft("Acme", vec![LineItem::new("Item", 2.0, 10.0)]),
        &business(),
        &AppSettings::default(),
        &Composer::default(),
        date(2024, 12, 31),
    )
    .unwrap();
    assert_eq!(issued.invoice.issue_date(), date(2024, 12, 31));
    assert_eq!(issued.invoice.id(), "INV-20241231-0042");
}

#[test]
fn invalid_draft_is_rejected_before_anything_is_stored() {
    let mut archive = InvoiceArchive::new(MemoryStore::new());
    let mut counter = Counter::default();
    let mut ids = InvoiceIdGenerator::new(&mut counter);
    let err = issue(
        &mut archive,
        &mut ids,
        draft("", vec![LineItem::new("Item", 1.0, 1.0)]),
        &business(),
        &AppSettings::default(),
        &Composer::default(),
        date(2024, 1, 1),
    )
    .unwrap_err();

    match err {
        IssueError::Validation(e) => assert_eq!(e.field, "client.name"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(counter.last(), 0);
    assert!(archive.into_inner().is_empty());
}

#[test]
fn bad_logo_falls_back_and_keeps_snapshot() {
    let mut archive = InvoiceArchive::new(MemoryStore::new());
    let mut ids = InvoiceIdGenerator::new(Counter::default());
    let profile = BusinessProfile {
        logo: Some("data:image/png;base64,%%%".into()),
        ..business()
    };
    let issued = issue(
        &mut archive,
        &mut ids,
        draft("Acme", vec![LineItem::new("Item", 1.0, 1.0)]),
        &profile,
        &AppSettings::default(),
        &Composer::default(),
        date(2024, 1, 1),
    )
    .unwrap();

    assert!(issued.logo_dropped);
    let stored = archive.load_invoice(issued.invoice.id()).unwrap();
    assert_eq!(stored.business(), &profile);
}

#[test]
fn snapshot_ignores_later_settings_changes() {
    let mut archive = InvoiceArchive::new(MemoryStore::new());
    let mut counter = Counter::default();
    let issued = issue_one(&mut archive, &mut counter, "Acme", date(2024, 3, 5));

    let no_tax = AppSettings {
        flags: DisplayFlags {
            show_tax: false,
            ..DisplayFlags::default()
        },
        ..AppSettings::default()
    };
    archive.save_settings(&no_tax).unwrap();

    let stored = archive.load_invoice(issued.invoice.id()).unwrap();
    assert!(stored.flags().show_tax);
    assert_eq!(stored.compute().1, issued.summary);
}

// -------------------------------------------------------
// Listing, search and delete
// -------------------------------------------------------

#[test]
fn list_is_newest_first_and_search_matches_fields() {
    let mut archive = InvoiceArchive::new(MemoryStore::new());
    let mut counter = Counter::default();
    issue_one(&mut archive, &mut counter, "Acme Corp", date(2024, 1, 10));
    issue_one(&mut archive, &mut counter, "Globex", date(2024, 3, 2));
    issue_one(&mut archive, &mut counter, "Initech", date(2024, 2, 20));

    let ids: Vec<String> = archive.list().unwrap().into_iter().map(|m| m.id).collect();
    assert_eq!(
        ids,
        ["INV-20240302-0002", "INV-20240220-0003", "INV-20240110-0001"]
    );

    let by_client = archive.search("acme").unwrap();
    assert_eq!(by_client.len(), 1);
    assert_eq!(by_client[0].client_name, "Acme Corp");

    assert_eq!(archive.search("inv-20240220").unwrap().len(), 1);
    assert_eq!(archive.search("2024-02").unwrap()[0].client_name, "Initech");
    assert_eq!(archive.search("  ").unwrap().len(), 3);
    assert!(archive.search("nobody").unwrap().is_empty());
}

#[test]
fn delete_removes_every_record() {
    let mut archive = InvoiceArchive::new(MemoryStore::new());
    let mut counter = Counter::default();
    let kept = issue_one(&mut archive, &mut counter, "Acme", date(2024, 1, 10));
    let gone = issue_one(&mut archive, &mut counter, "Globex", date(2024, 1, 11));

    archive.delete(gone.invoice.id()).unwrap();

    assert!(matches!(archive.load_invoice(gone.invoice.id()), Err(StoreError::NotFound(_))));
    assert!(matches!(archive.load_document(gone.invoice.id()), Err(StoreError::NotFound(_))));
    let remaining = archive.list().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.invoice.id());

    assert!(matches!(archive.delete(gone.invoice.id()), Err(StoreError::NotFound(_))));
}

#[test]
fn counter_is_stored_as_plain_number() {
    let mut archive = InvoiceArchive::new(MemoryStore::new());
    archive.set_sequence(17).unwrap();
    assert_eq!(archive.store().get(COUNTER_KEY).unwrap(), Some(b"17".to_vec()));
    assert_eq!(archive.next_sequence().unwrap(), 18);
    assert_eq!(archive.last_sequence().unwrap(), 18);
}
