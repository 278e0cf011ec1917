//! Read-only record model consumed by the export pipeline
//!
//! Exportable domain objects (products, orders, customers, ...) reach the
//! exporter as [`Record`] trait objects. A record exposes a numeric identity
//! and a typed field accessor returning a [`Value`]; the exporter never
//! mutates a record.
//!
//! # Design
//!
//! Field access goes through one method, `get(name)`, returning a tagged
//! union. Serializers stay generic over heterogeneous entity shapes while
//! every access is still checked at compile time.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::RecordError;

mod property_bag;

pub use property_bag::PropertyBag;

/// Shared handle to a record
pub type RecordRef = Arc<dyn Record>;

/// Read-only view over one exportable entity instance
pub trait Record: Send + Sync {
    /// Numeric identity of the record
    fn id(&self) -> i64;

    /// Read a field by name
    ///
    /// Fields the record does not carry read as [`Value::Null`]. An error
    /// means the field exists but could not be produced (e.g. a lazily
    /// loaded relation failed).
    fn get(&self, name: &str) -> Result<Value, RecordError>;
}

/// A field value read from a record
#[derive(Clone)]
pub enum Value {
    /// Absent or null value
    Null,
    /// Free text
    Text(String),
    /// Integral number
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Exact decimal (prices, rates)
    Decimal(Decimal),
    /// Boolean flag
    Bool(bool),
    /// Point in time, always UTC
    DateTime(DateTime<Utc>),
    /// Nested related record
    Record(RecordRef),
    /// Nested related record collection
    List(Vec<RecordRef>),
}

/// Scalar subset of [`Value`], used as leaf content by format writers
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Bool(bool),
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Short name of the value's shape, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Text(_) => "text",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Bool(_) => "boolean",
            Value::DateTime(_) => "datetime",
            Value::Record(_) => "record",
            Value::List(_) => "record list",
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert into a scalar, handing nested values back unchanged
    pub fn into_scalar(self) -> Result<Scalar, Value> {
        match self {
            Value::Null => Ok(Scalar::Null),
            Value::Text(s) => Ok(Scalar::Text(s)),
            Value::Int(n) => Ok(Scalar::Int(n)),
            Value::Float(f) => Ok(Scalar::Float(f)),
            Value::Decimal(d) => Ok(Scalar::Decimal(d)),
            Value::Bool(b) => Ok(Scalar::Bool(b)),
            Value::DateTime(dt) => Ok(Scalar::DateTime(dt)),
            nested => Err(nested),
        }
    }

    /// Read the value as an integer, accepting integral text and decimals
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Text(s) => write!(f, "Text({s:?})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Decimal(d) => write!(f, "Decimal({d})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::DateTime(dt) => write!(f, "DateTime({})", dt.to_rfc3339()),
            Value::Record(r) => write!(f, "Record(#{})", r.id()),
            Value::List(items) => {
                let ids: Vec<i64> = items.iter().map(|r| r.id()).collect();
                write!(f, "List({ids:?})")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Entity types a provider can declare as its export subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportEntityType {
    Category,
    Customer,
    Manufacturer,
    NewsletterSubscription,
    Order,
    Product,
}

/// Serializer registry tag
///
/// Superset of [`ExportEntityType`]: it also names the related entities that
/// only ever appear nested inside another record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Address,
    Category,
    Customer,
    Manufacturer,
    NewsletterSubscription,
    Order,
    OrderItem,
    Product,
    ProductCategory,
    ProductManufacturer,
}

impl EntityKind {
    /// Element name for a single record of this kind
    pub fn element_name(&self) -> &'static str {
        match self {
            EntityKind::Address => "Address",
            EntityKind::Category => "Category",
            EntityKind::Customer => "Customer",
            EntityKind::Manufacturer => "Manufacturer",
            EntityKind::NewsletterSubscription => "NewsletterSubscription",
            EntityKind::Order => "Order",
            EntityKind::OrderItem => "OrderItem",
            EntityKind::Product => "Product",
            EntityKind::ProductCategory => "ProductCategory",
            EntityKind::ProductManufacturer => "ProductManufacturer",
        }
    }

    /// Element name for a collection of records of this kind
    pub fn plural_name(&self) -> &'static str {
        match self {
            EntityKind::Address => "Addresses",
            EntityKind::Category => "Categories",
            EntityKind::Customer => "Customers",
            EntityKind::Manufacturer => "Manufacturers",
            EntityKind::NewsletterSubscription => "NewsletterSubscriptions",
            EntityKind::Order => "Orders",
            EntityKind::OrderItem => "OrderItems",
            EntityKind::Product => "Products",
            EntityKind::ProductCategory => "ProductCategories",
            EntityKind::ProductManufacturer => "ProductManufacturers",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

impl ExportEntityType {
    /// All export entity types
    pub const ALL: [ExportEntityType; 6] = [
        ExportEntityType::Category,
        ExportEntityType::Customer,
        ExportEntityType::Manufacturer,
        ExportEntityType::NewsletterSubscription,
        ExportEntityType::Order,
        ExportEntityType::Product,
    ];

    /// Serializer kind of the top-level records
    pub fn kind(&self) -> EntityKind {
        match self {
            ExportEntityType::Category => EntityKind::Category,
            ExportEntityType::Customer => EntityKind::Customer,
            ExportEntityType::Manufacturer => EntityKind::Manufacturer,
            ExportEntityType::NewsletterSubscription => EntityKind::NewsletterSubscription,
            ExportEntityType::Order => EntityKind::Order,
            ExportEntityType::Product => EntityKind::Product,
        }
    }

    /// Entity name used by the localization and store mapping lookups
    pub fn entity_name(&self) -> &'static str {
        self.kind().element_name()
    }

    /// Localizable property keys, empty for entities without translations
    pub fn localized_keys(&self) -> &'static [&'static str] {
        match self {
            ExportEntityType::Product => &["Name", "ShortDescription", "FullDescription"],
            ExportEntityType::Category | ExportEntityType::Manufacturer => {
                &["Name", "Description"]
            }
            _ => &[],
        }
    }

    /// Whether the entity can be limited to a subset of stores
    pub fn is_store_mappable(&self) -> bool {
        matches!(
            self,
            ExportEntityType::Product | ExportEntityType::Category | ExportEntityType::Manufacturer
        )
    }
}

impl fmt::Display for ExportEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity_name())
    }
}
