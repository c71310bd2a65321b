//! Resource envelope adapter
//!
//! The manifest service wraps every answer in a collection document:
//! `{"collection": {"items": [{"data": [{"name": .., "value": ..}]}]}}`.
//! The payload of interest is always the first value of the first item.
//! Nothing outside this module knows about that layout.

use loader_core::{LoaderError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(alias = "Collection")]
    collection: Collection,
}

#[derive(Debug, Deserialize)]
struct Collection {
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    error: Option<CollectionError>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    data: Vec<Datum>,
}

#[derive(Debug, Deserialize)]
struct Datum {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct CollectionError {
    #[serde(default)]
    title: String,
    #[serde(default)]
    message: String,
}

/// Extract the first named value of the first item.
pub fn first_value(body: &[u8]) -> Result<Value> {
    let resource: Resource = serde_json::from_slice(body).map_err(|e| LoaderError::Envelope {
        reason: e.to_string(),
    })?;
    let collection = resource.collection;

    let no_items = || match &collection.error {
        Some(err) => format!("no items, service reported: {} {}", err.title, err.message),
        None => "no items".to_string(),
    };
    let item = collection.items.first().ok_or_else(|| LoaderError::Envelope {
        reason: no_items(),
    })?;
    let datum = item.data.first().ok_or_else(|| LoaderError::Envelope {
        reason: "first item carries no data".to_string(),
    })?;
    Ok(datum.value.clone())
}

/// Extract the first value and decode it as `T`.
pub fn decode_first<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let value = first_value(body)?;
    serde_json::from_value(value).map_err(|e| LoaderError::Decode {
        reason: e.to_string(),
    })
}
