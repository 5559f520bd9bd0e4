//! Per-resource configuration for the generic table screen.
//!
//! The donor, event and item screens are the same component instantiated
//! with different `Resource` configurations: endpoint path, invalidation
//! tag, column set and form fields. Adding a screen means adding a static
//! here and a command in `commands.rs`, not copying a view.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::types::{DonationEvent, Donor, InventoryItem};
use crate::query::Tag;

/// How a column's raw value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
  Text,
  Number,
  Date,
}

/// One table column, addressed by the record's serialized field name.
///
/// `field` doubles as the server-side sort key, so it must match the wire
/// name (`eventName`, not `name`).
#[derive(Debug, Clone, Copy)]
pub struct Column {
  pub title: &'static str,
  pub field: &'static str,
  /// Relative width weight, like a flex factor
  pub width: u16,
  pub kind: ColumnKind,
  pub sortable: bool,
}

/// How form input for a field is captured and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  Text,
  /// Parsed to a number in the payload
  Number,
  /// Masked in the form, never pre-populated on update
  Secret,
}

/// One input field of the create/update panel.
#[derive(Debug, Clone, Copy)]
pub struct Field {
  pub key: &'static str,
  pub label: &'static str,
  pub kind: FieldKind,
}

/// Static configuration of one backend resource.
pub struct Resource {
  /// Singular display name; matches the server's conflict messages
  /// ("Donor ID already exists")
  pub name: &'static str,
  /// Plural title for the table header
  pub title: &'static str,
  /// Path segment in the REST contract
  pub path: &'static str,
  pub tag: Tag,
  /// Operation names for cache keys
  pub list_op: &'static str,
  pub get_op: &'static str,
  pub columns: &'static [Column],
  pub fields: &'static [Field],
}

/// A record type served by one of the configured resources.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// Stable server-assigned identifier; row identity for selection and
  /// CRUD targeting.
  fn id(&self) -> &str;

  fn resource() -> &'static Resource;
}

pub static DONORS: Resource = Resource {
  name: "Donor",
  title: "Donors",
  path: "donors",
  tag: Tag("donors"),
  list_op: "donors.list",
  get_op: "donors.get",
  columns: &[
    Column { title: "Name", field: "name", width: 3, kind: ColumnKind::Text, sortable: true },
    Column { title: "Email", field: "email", width: 4, kind: ColumnKind::Text, sortable: true },
    Column { title: "Phone", field: "phone", width: 3, kind: ColumnKind::Text, sortable: false },
    Column { title: "Score", field: "score", width: 1, kind: ColumnKind::Number, sortable: true },
  ],
  fields: &[
    Field { key: "name", label: "Name", kind: FieldKind::Text },
    Field { key: "email", label: "Email", kind: FieldKind::Text },
    Field { key: "phone", label: "Phone", kind: FieldKind::Text },
    Field { key: "password", label: "Password", kind: FieldKind::Secret },
  ],
};

pub static EVENTS: Resource = Resource {
  name: "Event",
  title: "Donation Events",
  path: "events",
  tag: Tag("events"),
  list_op: "events.list",
  get_op: "events.get",
  columns: &[
    Column { title: "Event ID", field: "eventID", width: 2, kind: ColumnKind::Text, sortable: true },
    Column { title: "Name", field: "eventName", width: 3, kind: ColumnKind::Text, sortable: true },
    Column { title: "Date", field: "eventDate", width: 2, kind: ColumnKind::Date, sortable: true },
    Column { title: "Province", field: "province", width: 2, kind: ColumnKind::Text, sortable: false },
    Column { title: "District", field: "district", width: 2, kind: ColumnKind::Text, sortable: false },
    Column { title: "City", field: "city", width: 2, kind: ColumnKind::Text, sortable: false },
    Column { title: "Comments", field: "comments", width: 3, kind: ColumnKind::Text, sortable: false },
  ],
  fields: &[
    Field { key: "eventID", label: "Event ID", kind: FieldKind::Text },
    Field { key: "eventName", label: "Event Name", kind: FieldKind::Text },
    Field { key: "eventDate", label: "Event Date", kind: FieldKind::Text },
    Field { key: "province", label: "Province", kind: FieldKind::Text },
    Field { key: "district", label: "District", kind: FieldKind::Text },
    Field { key: "city", label: "City", kind: FieldKind::Text },
    Field { key: "comments", label: "Comments", kind: FieldKind::Text },
  ],
};

pub static ITEMS: Resource = Resource {
  name: "Item",
  title: "Inventory Items",
  path: "items",
  tag: Tag("items"),
  list_op: "items.list",
  get_op: "items.get",
  columns: &[
    Column { title: "Item ID", field: "itemID", width: 2, kind: ColumnKind::Text, sortable: true },
    Column { title: "Item Name", field: "itemName", width: 3, kind: ColumnKind::Text, sortable: true },
    Column { title: "Quantity", field: "quantity", width: 1, kind: ColumnKind::Number, sortable: false },
    Column { title: "Donor", field: "donorId", width: 2, kind: ColumnKind::Text, sortable: false },
    Column { title: "Date", field: "date", width: 2, kind: ColumnKind::Date, sortable: true },
  ],
  fields: &[
    Field { key: "itemID", label: "Item ID", kind: FieldKind::Text },
    Field { key: "itemName", label: "Item Name", kind: FieldKind::Text },
    Field { key: "quantity", label: "Quantity", kind: FieldKind::Number },
    Field { key: "donorId", label: "Donor ID", kind: FieldKind::Text },
    Field { key: "date", label: "Date", kind: FieldKind::Text },
  ],
};

impl Record for Donor {
  fn id(&self) -> &str {
    &self.id
  }

  fn resource() -> &'static Resource {
    &DONORS
  }
}

impl Record for DonationEvent {
  fn id(&self) -> &str {
    &self.id
  }

  fn resource() -> &'static Resource {
    &EVENTS
  }
}

impl Record for InventoryItem {
  fn id(&self) -> &str {
    &self.id
  }

  fn resource() -> &'static Resource {
    &ITEMS
  }
}

/// Extract a field from a serialized record as display text.
pub fn field_text(record: &serde_json::Value, field: &str) -> String {
  match record.get(field) {
    None | Some(serde_json::Value::Null) => String::new(),
    Some(serde_json::Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
  }
}

/// Build the write payload from submitted form values, in field order.
pub fn build_payload(fields: &[Field], values: &[String]) -> serde_json::Value {
  let mut map = serde_json::Map::new();
  for (field, value) in fields.iter().zip(values) {
    let value = value.trim();
    let json = match field.kind {
      FieldKind::Number => value
        .parse::<i64>()
        .map(serde_json::Value::from)
        .unwrap_or_else(|_| serde_json::Value::from(value)),
      FieldKind::Text | FieldKind::Secret => serde_json::Value::from(value),
    };
    map.insert(field.key.to_string(), json);
  }
  serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_field_text_handles_value_kinds() {
    let record = json!({"name": "Amal", "quantity": 40, "comments": null});
    assert_eq!(field_text(&record, "name"), "Amal");
    assert_eq!(field_text(&record, "quantity"), "40");
    assert_eq!(field_text(&record, "comments"), "");
    assert_eq!(field_text(&record, "missing"), "");
  }

  #[test]
  fn test_build_payload_parses_numbers() {
    let payload = build_payload(
      ITEMS.fields,
      &[
        "IT-1".to_string(),
        "Saplings".to_string(),
        "40".to_string(),
        "65a1".to_string(),
        "2024-01-10".to_string(),
      ],
    );
    assert_eq!(payload["itemID"], json!("IT-1"));
    assert_eq!(payload["quantity"], json!(40));
  }

  #[test]
  fn test_build_payload_keeps_phone_as_text() {
    let payload = build_payload(
      DONORS.fields,
      &[
        "Amal".to_string(),
        "amal@example.com".to_string(),
        "0771234567".to_string(),
        "hunter22".to_string(),
      ],
    );
    // Phone numbers look numeric but are text fields
    assert_eq!(payload["phone"], json!("0771234567"));
  }

  #[test]
  fn test_column_fields_match_wire_names() {
    // Sort keys are sent to the server verbatim, so every column field must
    // round-trip through the record's serialized form
    let donor: crate::api::types::Donor = serde_json::from_str(
      r#"{"_id":"1","name":"A","email":"a@b.c","phone":"077"}"#,
    )
    .expect("donor parses");
    let value = serde_json::to_value(&donor).expect("donor serializes");
    for column in DONORS.columns {
      assert!(
        value.get(column.field).is_some(),
        "column '{}' missing from serialized donor",
        column.field
      );
    }
  }
}
