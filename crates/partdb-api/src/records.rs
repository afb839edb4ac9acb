//! PartDB records and their JSON parsers.
//!
//! Each record type parses itself field by field through [`ApiRecord::parse`].
//! Nested records may arrive either embedded or as JSON-LD IRIs
//! (`"/api/categories/3"`); an IRI carries no data and parses as absent.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("{record}: expected a JSON object")]
    NotAnObject { record: &'static str },

    #[error("{record}: missing required field '{field}'")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("{record}: field '{field}' has an unexpected type")]
    WrongType {
        record: &'static str,
        field: &'static str,
    },
}

/// A record that can be built from a raw JSON value.
pub trait ApiRecord: Sized {
    fn parse(raw: &Value) -> Result<Self, RecordError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Storage {
    pub id: Option<i64>,
    pub name: String,
    pub full_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartLot {
    pub storage_location: Option<Storage>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub full_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryPart {
    pub id: i64,
    pub name: String,
    pub manufacturer_product_number: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub lots: Vec<PartLot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

impl InventoryPart {
    /// Distinct storage names of the part's lots, in lot order.
    pub fn storage_location_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for lot in &self.lots {
            let Some(storage) = &lot.storage_location else {
                continue;
            };
            if !storage.name.is_empty() && !names.contains(&storage.name.as_str()) {
                names.push(&storage.name);
            }
        }
        names
    }

    /// Sum of all lot amounts; `None` when the part has no lots.
    pub fn total_amount(&self) -> Option<f64> {
        if self.lots.is_empty() {
            return None;
        }
        Some(self.lots.iter().map(|lot| lot.amount).sum())
    }
}

impl ApiRecord for Storage {
    fn parse(raw: &Value) -> Result<Self, RecordError> {
        const RECORD: &str = "Storage";
        let obj = object(raw, RECORD)?;
        Ok(Self {
            id: optional_id(obj),
            name: string(obj, RECORD, "name")?.unwrap_or_default(),
            full_path: string(obj, RECORD, "full_path")?,
        })
    }
}

impl ApiRecord for PartLot {
    fn parse(raw: &Value) -> Result<Self, RecordError> {
        const RECORD: &str = "PartLot";
        let obj = object(raw, RECORD)?;
        Ok(Self {
            storage_location: nested(obj, RECORD, "storage_location")?,
            amount: number(obj, RECORD, "amount")?.unwrap_or(0.0),
        })
    }
}

impl ApiRecord for Category {
    fn parse(raw: &Value) -> Result<Self, RecordError> {
        const RECORD: &str = "Category";
        let obj = object(raw, RECORD)?;
        Ok(Self {
            id: optional_id(obj),
            name: string(obj, RECORD, "name")?.unwrap_or_default(),
            full_path: string(obj, RECORD, "full_path")?,
        })
    }
}

impl ApiRecord for InventoryPart {
    fn parse(raw: &Value) -> Result<Self, RecordError> {
        const RECORD: &str = "Part";
        let obj = object(raw, RECORD)?;
        Ok(Self {
            id: required_id(obj, RECORD)?,
            name: string(obj, RECORD, "name")?.unwrap_or_default(),
            manufacturer_product_number: string(obj, RECORD, "manufacturer_product_number")?,
            category: nested(obj, RECORD, "category")?,
            description: string(obj, RECORD, "description")?,
            lots: list(obj, RECORD, "partLots")?,
        })
    }
}

impl ApiRecord for Project {
    fn parse(raw: &Value) -> Result<Self, RecordError> {
        const RECORD: &str = "Project";
        let obj = object(raw, RECORD)?;
        Ok(Self {
            id: required_id(obj, RECORD)?,
            name: string(obj, RECORD, "name")?.unwrap_or_default(),
        })
    }
}

fn object<'a>(raw: &'a Value, record: &'static str) -> Result<&'a Map<String, Value>, RecordError> {
    raw.as_object().ok_or(RecordError::NotAnObject { record })
}

/// `id` as an integer or numeric string, falling back to the trailing
/// segment of the JSON-LD `@id` IRI.
fn optional_id(obj: &Map<String, Value>) -> Option<i64> {
    match obj.get("id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => obj
            .get("@id")
            .and_then(Value::as_str)
            .and_then(|iri| iri.rsplit('/').next())
            .and_then(|tail| tail.parse().ok()),
    }
}

fn required_id(obj: &Map<String, Value>, record: &'static str) -> Result<i64, RecordError> {
    optional_id(obj).ok_or(RecordError::MissingField { record, field: "id" })
}

fn string(
    obj: &Map<String, Value>,
    record: &'static str,
    field: &'static str,
) -> Result<Option<String>, RecordError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RecordError::WrongType { record, field }),
    }
}

fn number(
    obj: &Map<String, Value>,
    record: &'static str,
    field: &'static str,
) -> Result<Option<f64>, RecordError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(RecordError::WrongType { record, field }),
    }
}

fn nested<T: ApiRecord>(
    obj: &Map<String, Value>,
    record: &'static str,
    field: &'static str,
) -> Result<Option<T>, RecordError> {
    match obj.get(field) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(None),
        Some(value @ Value::Object(_)) => T::parse(value).map(Some),
        Some(_) => Err(RecordError::WrongType { record, field }),
    }
}

fn list<T: ApiRecord>(
    obj: &Map<String, Value>,
    record: &'static str,
    field: &'static str,
) -> Result<Vec<T>, RecordError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(T::parse).collect(),
        Some(_) => Err(RecordError::WrongType { record, field }),
    }
}
