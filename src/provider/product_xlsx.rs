//! Product spreadsheet export
//!
//! Writes one worksheet with a bold header row and one row per product. Cells
//! are typed: numbers, booleans and dates stay numbers, booleans and dates in
//! the spreadsheet. Relations are summarized as `;`-joined lists.
//!
//! Rows are streamed through a constant-memory worksheet, so memory stays
//! bounded by one segment. A run that fails still saves the rows written so
//! far. When the sheet runs out of rows the run stops with `Abort::Error`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, ExcelDateTime, Format, Workbook, XlsxError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::{ExportError, ProviderError, RecordError, Result};
use crate::record::{EntityKind, ExportEntityType, Record, Scalar};
use crate::services::{ExportServices, Language};
use crate::writer::{Node, SerializerRegistry, join_group_field, layouts};

use super::pipeline::{RecordSink, create_output, write_segments};
use super::{ConfigurationInfo, ExportProvider, ProviderDescriptor};

/// Longest text a spreadsheet cell accepts
const MAX_CELL_CHARS: usize = 32_767;

/// Last worksheet row index
const MAX_ROW: u32 = 1_048_575;

/// Largest integer a spreadsheet number holds exactly
const MAX_EXACT_INT: u64 = 1 << 53;

/// Separator of joined relation lists
const LIST_SEPARATOR: &str = ";";

const SYSTEM_NAME: &str = "Exports.ProductXlsx";

/// Settings of the product spreadsheet export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductXlsxSettings {
    /// Add `Name[<culture>]` style columns per configured language
    #[serde(default = "default_include_localized")]
    pub include_localized: bool,

    #[serde(default = "default_worksheet_name")]
    pub worksheet_name: String,
}

fn default_include_localized() -> bool {
    true
}

fn default_worksheet_name() -> String {
    "Products".to_string()
}

impl Default for ProductXlsxSettings {
    fn default() -> Self {
        Self {
            include_localized: default_include_localized(),
            worksheet_name: default_worksheet_name(),
        }
    }
}

impl ProductXlsxSettings {
    /// Check the worksheet name against spreadsheet rules
    fn validate(&self) -> Result<()> {
        let name = &self.worksheet_name;
        let invalid = name.is_empty()
            || name.chars().count() > 31
            || name.contains(['[', ']', ':', '*', '?', '/', '\\'])
            || name.starts_with('\'')
            || name.ends_with('\'');

        if invalid {
            return Err(ProviderError::InvalidConfiguration {
                provider: SYSTEM_NAME.to_string(),
                message: format!("invalid worksheet name '{}'", name),
            }
            .into());
        }
        Ok(())
    }
}

/// Spreadsheet export of products
pub struct ProductXlsxExportProvider {
    descriptor: ProviderDescriptor,
    registry: Arc<SerializerRegistry>,
}

impl ProductXlsxExportProvider {
    pub fn new() -> Self {
        let descriptor = ProviderDescriptor::new(
            SYSTEM_NAME,
            "Product Excel export",
            ExportEntityType::Product,
            "XLSX",
        )
        .with_configuration(ConfigurationInfo::for_settings::<ProductXlsxSettings>(
            "Worksheet name and localized columns",
        ));

        Self {
            descriptor,
            registry: Arc::new(SerializerRegistry::default()),
        }
    }
}

impl Default for ProductXlsxExportProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExportProvider for ProductXlsxExportProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &mut ExecutionContext) -> Result<()> {
        let settings: ProductXlsxSettings = ctx.settings(SYSTEM_NAME)?;
        settings.validate()?;

        let mut sink = XlsxSink::new(
            ctx.file_path().to_path_buf(),
            settings,
            Arc::clone(&self.registry),
            ctx.services().clone(),
        );
        write_segments(&mut sink, ctx).await
    }
}

/// Column titles, matching the cell order of rendered rows
fn headers(languages: &[Language]) -> Vec<String> {
    let mut headers: Vec<String> = layouts::scalar_fields(EntityKind::Product)
        .map(str::to_string)
        .collect();
    headers.extend(
        ["CategoryIds", "ManufacturerIds", "CategoryPaths", "StoreIds"]
            .iter()
            .map(|h| h.to_string()),
    );
    for language in languages {
        for key in ExportEntityType::Product.localized_keys() {
            headers.push(format!("{}[{}]", key, language.culture));
        }
    }
    headers
}

/// One typed spreadsheet cell
pub(crate) enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(ExcelDateTime),
}

impl Cell {
    fn text(field: &str, text: String) -> std::result::Result<Self, RecordError> {
        if text.chars().count() > MAX_CELL_CHARS {
            return Err(RecordError::Serialization(format!(
                "field '{}' exceeds {} characters",
                field, MAX_CELL_CHARS
            )));
        }
        if text.is_empty() {
            return Ok(Cell::Empty);
        }
        Ok(Cell::Text(text))
    }

    fn from_scalar(field: &str, value: &Scalar) -> std::result::Result<Self, RecordError> {
        let cell = match value {
            Scalar::Null => Cell::Empty,
            Scalar::Text(s) => return Cell::text(field, s.clone()),
            // Spreadsheet numbers are doubles; larger integers keep their digits as text
            Scalar::Int(n) if n.unsigned_abs() > MAX_EXACT_INT => {
                return Cell::text(field, n.to_string());
            }
            Scalar::Int(n) => Cell::Number(*n as f64),
            Scalar::Float(x) => Cell::Number(*x),
            Scalar::Decimal(d) => Cell::Number(d.to_f64().unwrap_or_default()),
            Scalar::Bool(b) => Cell::Bool(*b),
            Scalar::DateTime(dt) => {
                let date = ExcelDateTime::from_timestamp(dt.timestamp()).map_err(|e| {
                    RecordError::Serialization(format!("field '{}': {}", field, e))
                })?;
                Cell::DateTime(date)
            }
        };
        Ok(cell)
    }
}

/// Streams rows into a constant-memory worksheet
struct XlsxSink {
    path: PathBuf,
    workbook: Option<Workbook>,
    worksheet_name: String,
    headers: Vec<String>,
    date_format: Format,
    /// Row index of the next data row
    next_row: u32,
    max_row: u32,
    registry: Arc<SerializerRegistry>,
    services: ExportServices,
    languages: Vec<Language>,
}

impl XlsxSink {
    fn new(
        path: PathBuf,
        settings: ProductXlsxSettings,
        registry: Arc<SerializerRegistry>,
        services: ExportServices,
    ) -> Self {
        let languages = if settings.include_localized {
            services.localization.languages()
        } else {
            Vec::new()
        };

        Self {
            path,
            workbook: None,
            worksheet_name: settings.worksheet_name,
            headers: headers(&languages),
            date_format: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
            next_row: 1,
            max_row: MAX_ROW,
            registry,
            services,
            languages,
        }
    }

    fn category_paths(&self, node: &Node) -> String {
        let Some(group) = node.child("ProductCategories") else {
            return String::new();
        };

        group
            .children()
            .iter()
            .filter_map(|entry| entry.child("CategoryId").and_then(Node::value))
            .filter_map(|id| match id {
                Scalar::Int(id) => self.services.catalog.category_path(*id),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR)
    }

    fn start_workbook(&self) -> std::result::Result<Workbook, XlsxError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(0xD9E1F2));

        let sheet = workbook.add_worksheet_with_constant_memory();
        sheet.set_name(&self.worksheet_name)?;
        for (col, header) in self.headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, header, &header_format)?;
        }
        sheet.set_freeze_panes(1, 0)?;

        Ok(workbook)
    }

    fn write_row(&mut self, row: &[Cell]) -> std::result::Result<(), XlsxError> {
        let Some(workbook) = self.workbook.as_mut() else {
            return Ok(());
        };
        let sheet = workbook.worksheet_from_index(0)?;
        let row_num = self.next_row;

        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(row_num, col, s)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(row_num, col, *n)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(row_num, col, *b)?;
                }
                Cell::DateTime(dt) => {
                    sheet.write_datetime_with_format(row_num, col, dt, &self.date_format)?;
                }
            }
        }

        self.next_row += 1;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for XlsxSink {
    type Item = Vec<Cell>;

    async fn open(&mut self) -> Result<()> {
        // Unwritable destinations fail here, before any record is read
        create_output(&self.path).await?;
        self.workbook = Some(self.start_workbook()?);
        debug!("Spreadsheet columns: {}", self.headers.len());
        Ok(())
    }

    fn render(&self, record: &dyn Record) -> std::result::Result<Vec<Cell>, RecordError> {
        let node = self.registry.serialize(EntityKind::Product, record)?;
        let mut cells = Vec::with_capacity(self.headers.len());

        for field in layouts::scalar_fields(EntityKind::Product) {
            let cell = match node.child(field).and_then(Node::value) {
                Some(value) => Cell::from_scalar(field, value)?,
                None => Cell::Empty,
            };
            cells.push(cell);
        }

        let store_ids = self
            .services
            .store_mappings
            .store_ids(ExportEntityType::Product.entity_name(), record.id())
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR);

        cells.push(Cell::text(
            "CategoryIds",
            join_group_field(&node, "ProductCategories", "CategoryId", LIST_SEPARATOR),
        )?);
        cells.push(Cell::text(
            "ManufacturerIds",
            join_group_field(&node, "ProductManufacturers", "ManufacturerId", LIST_SEPARATOR),
        )?);
        cells.push(Cell::text("CategoryPaths", self.category_paths(&node))?);
        cells.push(Cell::text("StoreIds", store_ids)?);

        let localization = &self.services.localization;
        for language in &self.languages {
            for key in ExportEntityType::Product.localized_keys() {
                let value = localization
                    .localized_value(
                        ExportEntityType::Product.entity_name(),
                        record.id(),
                        key,
                        language.id,
                    )
                    .unwrap_or_default();
                cells.push(Cell::text(key, value)?);
            }
        }

        Ok(cells)
    }

    async fn emit(&mut self, item: Vec<Cell>) -> Result<()> {
        self.write_row(&item)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let rows = self.next_row - 1;
        self.release().await?;
        debug!("Wrote workbook with {} rows", rows);
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        let Some(mut workbook) = self.workbook.take() else {
            return Ok(());
        };
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || workbook.save(&path))
            .await
            .map_err(|e| ExportError::Generic(format!("Workbook save task failed: {}", e)))??;
        Ok(())
    }

    fn is_full(&self) -> bool {
        self.next_row > self.max_row
    }
}
