//! Format writer helper
//!
//! Records are serialized once into a format-neutral [`Node`] tree by the
//! strategy registered for their [`EntityKind`](crate::record::EntityKind).
//! Format renderers then consume the tree:
//!
//! - XML: [`xml::render_node`] turns it into indented markup
//! - Spreadsheet: scalar children become typed cells
//! - CSV: selected scalar children become fields
//!
//! All text output goes through [`invariant::format_scalar`], so numbers,
//! decimals, dates and booleans read the same on every host.

pub mod invariant;
pub mod layouts;
mod node;
mod registry;
pub mod xml;

pub use layouts::FieldSpec;
pub use node::{Node, NodeContent};
pub use registry::{SerializerRegistry, Strategy};

use invariant::format_scalar;

/// Join one field of every child in a group, skipping empty values
///
/// Flat formats use this to summarize one-to-many relations, e.g. the
/// `CategoryId` of every `ProductCategories` entry.
///
/// # Arguments
/// * `node` - Serialized parent record
/// * `group` - Name of the list field
/// * `field` - Name of the field to collect from each entry
/// * `separator` - Text placed between values
pub fn join_group_field(node: &Node, group: &str, field: &str, separator: &str) -> String {
    let Some(group) = node.child(group) else {
        return String::new();
    };

    group
        .children()
        .iter()
        .filter_map(|entry| entry.child(field).and_then(Node::value))
        .map(format_scalar)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
