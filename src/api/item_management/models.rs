use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ItemError;
use crate::schema::items;

pub(crate) const NAME_MAX_CHARS: usize = 120;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Timestamps are left to the column defaults.
#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = items)]
pub(crate) struct NewItem {
    pub name: String,
    pub description: Option<String>,
}

/// `None` leaves a column untouched, `Some(None)` clears `description`.
#[derive(AsChangeset, Debug, Default, PartialEq)]
#[diesel(table_name = items)]
pub(crate) struct ItemChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

/// A JSON field that may be missing, explicitly `null`, or set.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

/// Request body shared by create and update. Values stay untyped so a wrong
/// JSON type is reported as a validation error rather than a parse failure.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ItemPayload {
    #[serde(default)]
    pub name: Patch<Value>,
    #[serde(default)]
    pub description: Patch<Value>,
}

impl ItemPayload {
    /// Anything but a JSON object reads as `{}`.
    pub(crate) fn from_json(body: Value) -> Self {
        match body {
            Value::Object(fields) => {
                serde_json::from_value(Value::Object(fields)).unwrap_or_default()
            }
            _ => ItemPayload::default(),
        }
    }
}

impl TryFrom<ItemPayload> for NewItem {
    type Error = ItemError;

    fn try_from(payload: ItemPayload) -> Result<Self, Self::Error> {
        let name = match payload.name {
            Patch::Value(Value::String(name)) => name,
            Patch::Absent | Patch::Null | Patch::Value(_) => {
                return Err(ItemError::Validation(
                    "Field 'name' is required and must be a string.".to_string(),
                ))
            }
        };

        Ok(NewItem {
            name: normalize_name(&name)?,
            description: match payload.description {
                Patch::Absent | Patch::Null => None,
                Patch::Value(value) => normalize_description(value)?,
            },
        })
    }
}

impl TryFrom<ItemPayload> for ItemChanges {
    type Error = ItemError;

    fn try_from(payload: ItemPayload) -> Result<Self, Self::Error> {
        let name = match payload.name {
            Patch::Absent | Patch::Null => None,
            Patch::Value(Value::String(name)) => Some(normalize_name(&name)?),
            Patch::Value(_) => {
                return Err(ItemError::Validation(
                    "Field 'name' must be a non-empty string.".to_string(),
                ))
            }
        };

        let description = match payload.description {
            Patch::Absent => None,
            Patch::Null => Some(None),
            Patch::Value(value) => Some(normalize_description(value)?),
        };

        Ok(ItemChanges { name, description })
    }
}

fn normalize_name(name: &str) -> Result<String, ItemError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ItemError::Validation(
            "Field 'name' must be a non-empty string.".to_string(),
        ));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(ItemError::Validation(format!(
            "Field 'name' must be at most {} characters.",
            NAME_MAX_CHARS
        )));
    }
    Ok(name.to_string())
}

// Blank descriptions are stored as NULL. `null` never gets here, it is `Patch::Null`.
fn normalize_description(value: Value) -> Result<Option<String>, ItemError> {
    match value {
        Value::String(description) => {
            let description = description.trim();
            Ok((!description.is_empty()).then(|| description.to_string()))
        }
        _ => Err(ItemError::Validation(
            "Field 'description' must be a string or null.".to_string(),
        )),
    }
}

/// Path ids that aren't a valid `i32` can't name a stored item.
pub(crate) fn parse_item_id(raw: &str) -> Result<i32, ItemError> {
    raw.parse().map_err(|_| ItemError::NotFound)
}

/// ILIKE pattern matching `term` literally anywhere in the column.
pub(crate) fn search_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
