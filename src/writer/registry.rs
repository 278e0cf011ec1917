//! Serializer strategies keyed by entity kind
//!
//! A strategy turns one record into a [`Node`] named after the record's kind.
//! Strategies for related kinds are looked up through the registry passed to
//! them, so replacing the `Address` strategy changes every address nested in
//! customers and orders as well.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::RecordError;
use crate::record::{EntityKind, Record, Value};

use super::layouts::{self, FieldSpec};
use super::node::Node;

/// Serialization strategy for one entity kind
pub type Strategy =
    Arc<dyn Fn(&SerializerRegistry, &dyn Record) -> Result<Node, RecordError> + Send + Sync>;

/// Registry of serializer strategies
#[derive(Clone)]
pub struct SerializerRegistry {
    strategies: HashMap<EntityKind, Strategy>,
}

impl SerializerRegistry {
    /// Create a registry without any strategy
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Register or replace the strategy of a kind
    pub fn register<F>(&mut self, kind: EntityKind, strategy: F)
    where
        F: Fn(&SerializerRegistry, &dyn Record) -> Result<Node, RecordError> + Send + Sync + 'static,
    {
        if self.strategies.insert(kind, Arc::new(strategy)).is_some() {
            debug!("Replaced serializer for {}", kind);
        }
    }

    /// Register the built-in layout strategy of a kind
    pub fn register_layout(&mut self, kind: EntityKind) {
        self.register(kind, move |registry, record| {
            registry.serialize_fields(kind, layouts::layout(kind), record)
        });
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.strategies.contains_key(&kind)
    }

    /// Serialize one record
    ///
    /// # Arguments
    /// * `kind` - Kind of the record
    /// * `record` - Record to serialize
    ///
    /// # Returns
    /// * `Result<Node, RecordError>` - Node named after the kind
    pub fn serialize(&self, kind: EntityKind, record: &dyn Record) -> Result<Node, RecordError> {
        let strategy = self
            .strategies
            .get(&kind)
            .ok_or_else(|| RecordError::UnknownEntityKind(kind.to_string()))?;
        strategy(self, record)
    }

    /// Serialize a record field by field
    ///
    /// Nested and list fields recurse into the strategies of their kinds.
    pub fn serialize_fields(
        &self,
        kind: EntityKind,
        fields: &[FieldSpec],
        record: &dyn Record,
    ) -> Result<Node, RecordError> {
        let mut children = Vec::with_capacity(fields.len());

        for spec in fields {
            let name = spec.name();
            let value = record.get(name)?;

            let child = match (spec, value) {
                (_, Value::Null) => Node::empty(name),
                (FieldSpec::Scalar(_), value) => {
                    let scalar = value.into_scalar().map_err(|nested| mismatch(name, "scalar", &nested))?;
                    Node::scalar(name, scalar)
                }
                (FieldSpec::Nested(_, related), Value::Record(nested)) => {
                    self.serialize(*related, nested.as_ref())?.renamed(name)
                }
                (FieldSpec::List(_, related), Value::List(items)) => {
                    let mut group = Vec::with_capacity(items.len());
                    for item in &items {
                        group.push(self.serialize(*related, item.as_ref())?);
                    }
                    Node::group(name, group)
                }
                (FieldSpec::Nested(..), other) => return Err(mismatch(name, "record", &other)),
                (FieldSpec::List(..), other) => {
                    return Err(mismatch(name, "record list", &other));
                }
            };
            children.push(child);
        }

        Ok(Node::group(kind.element_name(), children))
    }
}

fn mismatch(field: &str, expected: &'static str, found: &Value) -> RecordError {
    RecordError::TypeMismatch {
        field: field.to_string(),
        expected,
        found: found.type_name(),
    }
}

impl Default for SerializerRegistry {
    /// Registry holding the built-in layout of every entity kind
    fn default() -> Self {
        let mut registry = Self::empty();
        for kind in [
            EntityKind::Address,
            EntityKind::Category,
            EntityKind::Customer,
            EntityKind::Manufacturer,
            EntityKind::NewsletterSubscription,
            EntityKind::Order,
            EntityKind::OrderItem,
            EntityKind::Product,
            EntityKind::ProductCategory,
            EntityKind::ProductManufacturer,
        ] {
            registry.register_layout(kind);
        }
        registry
    }
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.strategies.keys().collect();
        kinds.sort();
        f.debug_struct("SerializerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PropertyBag, Scalar};
    use std::sync::Arc;

    struct Broken;

    impl Record for Broken {
        fn id(&self) -> i64 {
            9
        }

        fn get(&self, name: &str) -> Result<Value, RecordError> {
            Err(RecordError::field_access(name, "not loaded"))
        }
    }

    #[test]
    fn test_layout_order_and_nulls() {
        let registry = SerializerRegistry::default();
        let sub = PropertyBag::new(4).with("Email", "a@b.c").with("Active", true);

        let node = registry
            .serialize(EntityKind::NewsletterSubscription, &sub)
            .unwrap();

        let names: Vec<_> = node.children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["Id", "NewsLetterSubscriptionGuid", "Email", "Active", "StoreId", "CreatedOnUtc"]
        );
        assert_eq!(node.name, "NewsletterSubscription");
        assert!(node.child("StoreId").unwrap().is_empty());
        assert_eq!(node.child("Active").unwrap().value(), Some(&Scalar::Bool(true)));
    }

    #[test]
    fn test_nested_records() {
        let registry = SerializerRegistry::default();
        let address = PropertyBag::new(7).with("City", "Berlin");
        let item = PropertyBag::new(11).with("Quantity", 2);
        let order = PropertyBag::new(1)
            .with_record("BillingAddress", address)
            .with_list("OrderItems", vec![item]);

        let node = registry.serialize(EntityKind::Order, &order).unwrap();

        let billing = node.child("BillingAddress").unwrap();
        assert_eq!(billing.child("City").unwrap().value(), Some(&Scalar::Text("Berlin".into())));

        let items = node.child("OrderItems").unwrap();
        assert_eq!(items.children().len(), 1);
        assert_eq!(items.children()[0].name, "OrderItem");
        assert!(node.child("ShippingAddress").unwrap().is_empty());
    }

    #[test]
    fn test_type_mismatch() {
        let registry = SerializerRegistry::default();
        let order = PropertyBag::new(1).with("BillingAddress", "Main St");

        let err = registry.serialize(EntityKind::Order, &order).unwrap_err();
        assert_eq!(
            err,
            RecordError::TypeMismatch {
                field: "BillingAddress".into(),
                expected: "record",
                found: "text",
            }
        );
    }

    #[test]
    fn test_field_access_error_propagates() {
        let registry = SerializerRegistry::default();
        let err = registry.serialize(EntityKind::Product, &Broken).unwrap_err();
        assert!(matches!(err, RecordError::FieldAccess { ref field, .. } if field == "Id"));
    }

    #[test]
    fn test_replace_strategy_applies_to_nested_records() {
        let mut registry = SerializerRegistry::default();
        registry.register(EntityKind::Address, |_, record| {
            Ok(Node::scalar("Address", Scalar::Int(record.id())))
        });

        let customer = PropertyBag::new(1).with_record("BillingAddress", PropertyBag::new(5));
        let node = registry.serialize(EntityKind::Customer, &customer).unwrap();

        assert_eq!(node.child("BillingAddress").unwrap().value(), Some(&Scalar::Int(5)));
    }

    #[test]
    fn test_unknown_kind() {
        let registry = SerializerRegistry::empty();
        let record: Arc<dyn Record> = Arc::new(PropertyBag::new(1));
        assert!(matches!(
            registry.serialize(EntityKind::Product, record.as_ref()),
            Err(RecordError::UnknownEntityKind(_))
        ));
        assert!(!registry.contains(EntityKind::Product));
    }
}
