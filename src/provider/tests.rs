//! End-to-end tests for the export providers

use super::*;
use crate::context::{Abort, AbortHandle, ProviderState};
use crate::error::{ExportError, RecordError};
use crate::record::{PropertyBag, Record, RecordRef, Value};
use crate::segment::{JsonLinesSegmenter, VecSegmenter};
use crate::services::{ExportServices, InMemoryCatalog, InMemoryLocalization, InMemoryStoreMappings, Language};
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::Level;

// ===== Helpers =====

/// Record whose given field fails to load
struct FailingField {
    inner: PropertyBag,
    field: &'static str,
}

impl Record for FailingField {
    fn id(&self) -> i64 {
        self.inner.id()
    }

    fn get(&self, name: &str) -> std::result::Result<Value, RecordError> {
        if name == self.field {
            return Err(RecordError::field_access(name, "lazy load failed"));
        }
        self.inner.get(name)
    }
}

/// Record requesting a user abort as soon as it is read
struct AbortingRecord {
    inner: PropertyBag,
    handle: AbortHandle,
}

impl Record for AbortingRecord {
    fn id(&self) -> i64 {
        self.inner.id()
    }

    fn get(&self, name: &str) -> std::result::Result<Value, RecordError> {
        self.handle.abort_user();
        self.inner.get(name)
    }
}

fn product(id: i64) -> PropertyBag {
    PropertyBag::new(id)
        .with("Name", format!("Product {}", id))
        .with("Price", Decimal::from_str("19.90").unwrap())
        .with("Published", true)
}

fn shared(records: Vec<PropertyBag>) -> Vec<RecordRef> {
    records
        .into_iter()
        .map(|r| Arc::new(r) as RecordRef)
        .collect()
}

fn context(path: &Path, records: Vec<RecordRef>, page_size: usize) -> ExecutionContext {
    let segmenter = VecSegmenter::new(records, page_size).unwrap();
    ExecutionContext::new(path, Box::new(segmenter)).with_app_version("5.0.0")
}

async fn run(provider: &dyn ExportProvider, ctx: &mut ExecutionContext) -> Result<()> {
    provider.execute(ctx).await?;
    provider.execute_ended(ctx).await
}

fn product_xml() -> XmlExportProvider {
    XmlExportProvider::new(ExportEntityType::Product)
}

// ===== XML =====

#[tokio::test]
async fn test_xml_writes_all_records_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xml");
    let mut ctx = context(&path, shared((1..=5).map(product).collect()), 2);

    run(&product_xml(), &mut ctx).await.unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Products Version=\"5.0.0\">\n\t<Product>\n\t\t<Id>1</Id>"));
    assert!(xml.ends_with("\t</Product>\n</Products>"));
    assert_eq!(xml.matches("<Product>").count(), 5);

    let positions: Vec<_> = (1..=5)
        .map(|id| xml.find(&format!("<Name>Product {}</Name>", id)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    assert_eq!(ctx.records_succeeded(), 5);
    assert_eq!(ctx.records_failed(), 0);
    assert_eq!(ctx.state(), ProviderState::Ended);
}

#[tokio::test]
async fn test_xml_failing_record_is_skipped_and_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xml");
    let records: Vec<RecordRef> = vec![
        Arc::new(product(1)),
        Arc::new(FailingField {
            inner: product(2),
            field: "Price",
        }),
        Arc::new(product(3)),
    ];
    let mut ctx = context(&path, records, 2);

    run(&product_xml(), &mut ctx).await.unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    assert_eq!(xml.matches("<Product>").count(), 2);
    assert!(xml.contains("<Id>1</Id>"));
    assert!(!xml.contains("<Id>2</Id>"));
    assert!(xml.contains("<Id>3</Id>"));
    assert!(xml.ends_with("</Products>"));

    assert_eq!(ctx.records_succeeded(), 2);
    assert_eq!(ctx.records_failed(), 1);

    let errors: Vec<_> = ctx.log().entries_at(Level::ERROR).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].record_id, Some(2));
    assert!(errors[0].message.contains("Price"));
}

#[tokio::test]
async fn test_xml_empty_dataset_writes_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xml");
    let mut ctx = context(&path, Vec::new(), 10);

    run(&product_xml(), &mut ctx).await.unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        xml,
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Products Version=\"5.0.0\"></Products>"
    );
    assert_eq!(ctx.records_succeeded(), 0);
    assert_eq!(ctx.records_failed(), 0);
}

#[tokio::test]
async fn test_xml_abort_mid_segment_finalizes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xml");
    let handle = AbortHandle::new();
    let records: Vec<RecordRef> = vec![
        Arc::new(product(1)),
        Arc::new(AbortingRecord {
            inner: product(2),
            handle: handle.clone(),
        }),
        Arc::new(product(3)),
        Arc::new(product(4)),
    ];
    let mut ctx = context(&path, records, 4).with_abort_handle(handle);

    run(&product_xml(), &mut ctx).await.unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    assert_eq!(xml.matches("<Product>").count(), 2);
    assert!(!xml.contains("<Id>3</Id>"));
    assert!(xml.ends_with("</Products>"));
    assert_eq!(ctx.abort(), Abort::User);
    assert_eq!(ctx.records_succeeded(), 2);
    assert_eq!(ctx.records_failed(), 0);
}

#[tokio::test]
async fn test_xml_output_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.xml");
    let second = dir.path().join("second.xml");

    for path in [&first, &second] {
        let mut ctx = context(path, shared((1..=3).map(product).collect()), 2);
        run(&product_xml(), &mut ctx).await.unwrap();
    }

    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[tokio::test]
async fn test_xml_scalar_values_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xml");
    let created = Utc.with_ymd_and_hms(2024, 5, 17, 9, 45, 12).unwrap();
    let record = PropertyBag::new(7)
        .with("Name", "Desk & Chair <Set>")
        .with("Sku", "")
        .with("Price", Decimal::from_str("1299.50").unwrap())
        .with("Weight", 12.5)
        .with("StockQuantity", 40)
        .with("Deleted", false)
        .with("CreatedOnUtc", created);
    let mut ctx = context(&path, shared(vec![record]), 1);

    run(&product_xml(), &mut ctx).await.unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    let read = |name: &str| -> Option<String> {
        let open = format!("<{}>", name);
        let close = format!("</{}>", name);
        let start = xml.find(&open)? + open.len();
        let end = start + xml[start..].find(&close)?;
        Some(
            xml[start..end]
                .replace("&lt;", "<")
                .replace("&gt;", ">")
                .replace("&amp;", "&"),
        )
    };

    assert_eq!(read("Name").as_deref(), Some("Desk & Chair <Set>"));
    assert_eq!(read("Price").as_deref(), Some("1299.50"));
    assert_eq!(read("Weight").unwrap().parse::<f64>().unwrap(), 12.5);
    assert_eq!(read("StockQuantity").as_deref(), Some("40"));
    assert_eq!(read("Deleted").as_deref(), Some("False"));
    assert_eq!(read("CreatedOnUtc").as_deref(), Some("2024-05-17T09:45:12Z"));
    assert!(xml.contains("\t\t<Sku />\n"));
    assert!(xml.contains("\t\t<Gtin />\n"));
}

#[tokio::test]
async fn test_xml_localized_values_and_store_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xml");
    let services = ExportServices::default()
        .with_localization(
            InMemoryLocalization::new(vec![Language::new(1, "en-US"), Language::new(2, "de-DE")])
                .with_value("Product", 1, "Name", 2, "Schreibtisch")
                .with_value("Product", 1, "ShortDescription", 2, ""),
        )
        .with_store_mappings(InMemoryStoreMappings::new().with_mapping("Product", 1, &[3, 1]));
    let mut ctx = context(&path, shared(vec![product(1)]), 1).with_services(services);

    run(&product_xml(), &mut ctx).await.unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    assert!(xml.contains(
        "\t\t<Localized>\n\t\t\t<Name Culture=\"de-DE\">Schreibtisch</Name>\n\t\t</Localized>\n"
    ));
    assert!(xml.contains(
        "\t\t<StoreIds>\n\t\t\t<StoreId>1</StoreId>\n\t\t\t<StoreId>3</StoreId>\n\t\t</StoreIds>\n"
    ));
}

#[tokio::test]
async fn test_xml_settings_disable_extras() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("categories.xml");
    let mut ctx = context(&path, shared(vec![PropertyBag::new(4).with("Name", "Desks")]), 1)
        .with_configuration(json!({ "include_localized": false, "include_store_mappings": false }));

    run(&XmlExportProvider::new(ExportEntityType::Category), &mut ctx)
        .await
        .unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    assert!(xml.contains("<Categories Version=\"5.0.0\">\n\t<Category>\n"));
    assert!(!xml.contains("Localized"));
    assert!(!xml.contains("StoreIds"));
}

#[tokio::test]
async fn test_xml_invalid_settings_fail_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xml");
    let mut ctx = context(&path, shared(vec![product(1)]), 1)
        .with_configuration(json!({ "include_localized": "sometimes" }));

    let err = product_xml().execute(&mut ctx).await.unwrap_err();

    assert!(matches!(err, ExportError::Provider(_)));
    assert!(!path.exists());
    assert_eq!(ctx.state(), ProviderState::Idle);
}

#[tokio::test]
async fn test_xml_order_nesting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.xml");
    let order = PropertyBag::new(100)
        .with("OrderTotal", Decimal::from_str("42.00").unwrap())
        .with_record(
            "Customer",
            PropertyBag::new(5).with("Email", "ada@example.com"),
        )
        .with_record(
            "BillingAddress",
            PropertyBag::new(7).with("FirstName", "Ada"),
        )
        .with_list(
            "OrderItems",
            vec![PropertyBag::new(11)
                .with("Quantity", 2)
                .with_record("Product", product(1))],
        );
    let mut ctx = context(&path, shared(vec![order]), 1);

    run(&XmlExportProvider::new(ExportEntityType::Order), &mut ctx)
        .await
        .unwrap();

    let xml = std::fs::read_to_string(&path).unwrap();
    assert!(xml.contains("<Orders Version=\"5.0.0\">\n\t<Order>\n\t\t<Id>100</Id>\n"));
    assert!(xml.contains("\t\t<OrderTotal>42.00</OrderTotal>\n"));
    assert!(xml.contains("\t\t<Customer>\n\t\t\t<Id>5</Id>\n"));
    assert!(xml.contains("\t\t\t<Email>ada@example.com</Email>\n"));
    assert!(xml.contains("\t\t<BillingAddress>\n\t\t\t<Id>7</Id>\n\t\t\t<FirstName>Ada</FirstName>\n"));
    assert!(xml.contains("\t\t<ShippingAddress />\n"));
    assert!(xml.contains("\t\t<OrderItems>\n\t\t\t<OrderItem>\n\t\t\t\t<Id>11</Id>\n"));
    assert!(xml.contains("\t\t\t\t<Product>\n\t\t\t\t\t<Id>1</Id>\n\t\t\t\t\t<Name>Product 1</Name>\n"));
    assert!(xml.ends_with("\t\t</OrderItems>\n\t</Order>\n</Orders>"));
}

#[tokio::test]
async fn test_xml_execute_ended_logs_file_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subscribers.xml");
    let mut ctx = context(&path, shared(vec![PropertyBag::new(1)]), 1);

    run(&XmlExportProvider::new(ExportEntityType::NewsletterSubscription), &mut ctx)
        .await
        .unwrap();

    let size = std::fs::metadata(&path).unwrap().len();
    let info: Vec<_> = ctx.log().entries_at(Level::INFO).collect();
    assert_eq!(info.len(), 1);
    assert!(info[0].message.starts_with(&format!("Wrote {} bytes", size)));
}

#[tokio::test]
async fn test_xml_from_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("customers.jsonl");
    let output = dir.path().join("customers.xml");
    std::fs::write(
        &input,
        concat!(
            r#"{"Id": 1, "Email": "a@example.com", "Active": true}"#,
            "\n\n",
            r#"{"Id": 2, "Email": "b@example.com", "CreatedOnUtc": {"$date": "2023-01-02T03:04:05Z"}}"#,
            "\n",
        ),
    )
    .unwrap();

    let segmenter = JsonLinesSegmenter::open(&input, 1).await.unwrap();
    let mut ctx = ExecutionContext::new(&output, Box::new(segmenter));

    run(&XmlExportProvider::new(ExportEntityType::Customer), &mut ctx)
        .await
        .unwrap();

    let xml = std::fs::read_to_string(&output).unwrap();
    assert_eq!(xml.matches("<Customer>").count(), 2);
    assert!(xml.contains("<Active>True</Active>"));
    assert!(xml.contains("<CreatedOnUtc>2023-01-02T03:04:05Z</CreatedOnUtc>"));
    assert_eq!(ctx.records_succeeded(), 2);
}

#[tokio::test]
async fn test_segmenter_failure_leaves_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.jsonl");
    let output = dir.path().join("customers.xml");
    std::fs::write(&input, "{\"Id\": 1}\nnot json\n").unwrap();

    let segmenter = JsonLinesSegmenter::open(&input, 1).await.unwrap();
    let mut ctx = ExecutionContext::new(&output, Box::new(segmenter));

    let err = XmlExportProvider::new(ExportEntityType::Customer)
        .execute(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Segment(_)));
    let xml = std::fs::read_to_string(&output).unwrap();
    assert!(xml.contains("<Id>1</Id>"));
    assert!(!xml.contains("</Customers>"));
    assert_eq!(ctx.records_succeeded(), 1);
}

// ===== CSV =====

#[tokio::test]
async fn test_subscriber_csv_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subscribers.csv");
    let records = vec![
        PropertyBag::new(1)
            .with("Email", "a@example.com")
            .with("Active", true)
            .with("StoreId", 1),
        PropertyBag::new(2)
            .with("Email", "\"quoted\",name@example.com")
            .with("Active", false)
            .with("StoreId", 2),
        PropertyBag::new(3).with("Email", "c@example.com"),
    ];
    let mut ctx = context(&path, shared(records), 2);

    run(&SubscriberCsvExportProvider::new(), &mut ctx).await.unwrap();

    let csv = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        csv,
        "a@example.com,True,1\r\n\"\"\"quoted\"\",name@example.com\",False,2\r\nc@example.com,,\r\n"
    );
    assert_eq!(ctx.records_succeeded(), 3);
}

#[tokio::test]
async fn test_subscriber_csv_empty_dataset_writes_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("subscribers.csv");
    let mut ctx = context(&path, Vec::new(), 5);

    run(&SubscriberCsvExportProvider::new(), &mut ctx).await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap().len(), 0);
}

// ===== XLSX =====

fn read_sheet(path: &Path, name: &str) -> Range<Data> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.worksheet_range(name).unwrap()
}

fn text(value: &str) -> Data {
    Data::String(value.to_string())
}

#[tokio::test]
async fn test_product_xlsx_writes_typed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xlsx");
    let record = product(1)
        .with("CreatedOnUtc", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        .with_list(
            "ProductCategories",
            vec![
                PropertyBag::new(1).with("CategoryId", 2),
                PropertyBag::new(2).with("CategoryId", 1),
            ],
        );
    let services = ExportServices::default()
        .with_catalog(
            InMemoryCatalog::new()
                .with_category(1, "Furniture", None)
                .with_category(2, "Desks", Some(1)),
        )
        .with_localization(
            InMemoryLocalization::new(vec![Language::new(2, "de-DE")])
                .with_value("Product", 1, "Name", 2, "Schreibtisch"),
        )
        .with_store_mappings(InMemoryStoreMappings::new().with_mapping("Product", 1, &[3, 1]));
    let records = shared(vec![record, product(2), product(1 << 60)]);
    let mut ctx = context(&path, records, 1).with_services(services);

    run(&ProductXlsxExportProvider::new(), &mut ctx).await.unwrap();
    assert_eq!(ctx.records_succeeded(), 3);
    assert_eq!(ctx.records_failed(), 0);

    let range = read_sheet(&path, "Products");
    assert_eq!(range.height(), 4);

    // Header row
    assert_eq!(range.get_value((0, 0)), Some(&text("Id")));
    assert_eq!(range.get_value((0, 7)), Some(&text("Price")));
    assert_eq!(range.get_value((0, 23)), Some(&text("CategoryIds")));
    assert_eq!(range.get_value((0, 25)), Some(&text("CategoryPaths")));
    assert_eq!(range.get_value((0, 27)), Some(&text("Name[de-DE]")));

    // Data starts at row 2 with typed cells
    assert_eq!(range.get_value((1, 0)), Some(&Data::Float(1.0)));
    assert_eq!(range.get_value((1, 1)), Some(&text("Product 1")));
    assert!(matches!(range.get_value((1, 4)), None | Some(Data::Empty)));
    assert_eq!(range.get_value((1, 7)), Some(&Data::Float(19.9)));
    assert_eq!(range.get_value((1, 18)), Some(&Data::Bool(true)));
    assert!(matches!(range.get_value((1, 21)), Some(Data::DateTime(_))));

    // Relation summaries and localized columns
    assert_eq!(range.get_value((1, 23)), Some(&text("2;1")));
    assert_eq!(range.get_value((1, 25)), Some(&text("Furniture >> Desks;Furniture")));
    assert_eq!(range.get_value((1, 26)), Some(&text("1;3")));
    assert_eq!(range.get_value((1, 27)), Some(&text("Schreibtisch")));

    assert_eq!(range.get_value((2, 0)), Some(&Data::Float(2.0)));
    assert!(matches!(range.get_value((2, 27)), None | Some(Data::Empty)));
    assert_eq!(range.get_value((3, 0)), Some(&text("1152921504606846976")));
}

#[tokio::test]
async fn test_product_xlsx_segmenter_failure_keeps_written_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.jsonl");
    let output = dir.path().join("products.xlsx");
    std::fs::write(
        &input,
        "{\"Id\": 1, \"Name\": \"Desk\"}\n{\"Id\": 2, \"Name\": \"Chair\"}\nnot json\n",
    )
    .unwrap();

    let segmenter = JsonLinesSegmenter::open(&input, 1).await.unwrap();
    let mut ctx = ExecutionContext::new(&output, Box::new(segmenter));

    let err = ProductXlsxExportProvider::new()
        .execute(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Segment(_)));
    assert_eq!(ctx.records_succeeded(), 2);

    let range = read_sheet(&output, "Products");
    assert_eq!(range.height(), 3);
    assert_eq!(range.get_value((1, 1)), Some(&text("Desk")));
    assert_eq!(range.get_value((2, 1)), Some(&text("Chair")));
}

#[tokio::test]
async fn test_product_xlsx_oversized_text_is_record_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xlsx");
    let oversized = product(2).with("FullDescription", "x".repeat(40_000));
    let mut ctx = context(&path, shared(vec![product(1), oversized]), 5);

    run(&ProductXlsxExportProvider::new(), &mut ctx).await.unwrap();

    assert_eq!(ctx.records_succeeded(), 1);
    assert_eq!(ctx.records_failed(), 1);
    assert_eq!(ctx.log().entries()[0].record_id, Some(2));
    assert_eq!(read_sheet(&path, "Products").height(), 2);
}

#[tokio::test]
async fn test_product_xlsx_rejects_bad_worksheet_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.xlsx");
    let mut ctx = context(&path, shared(vec![product(1)]), 5)
        .with_configuration(json!({ "worksheet_name": "a/b" }));

    let err = ProductXlsxExportProvider::new()
        .execute(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::Provider(_)));
}
