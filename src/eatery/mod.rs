pub mod hours;

use std::{collections::BTreeMap, fs, io::BufReader, path::Path};
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::collections::FxIndexMap;
use crate::errors::{GraphError, SnapshotError};
use crate::graph::NodeId;

pub use hours::Hours;


/// Highest rating an eatery can carry
pub const MAX_RATING: f64 = 5.0;


/// Typed eatery record attached to a graph node
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EateryAttributes {
    #[serde(default)]
    pub name: String,
    /// 0.0 - 5.0
    #[serde(default)]
    pub rating: f64,
    /// Ordinal price level, lower is cheaper
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub hours: Hours,
    #[serde(default, deserialize_with = "flag")]
    pub power_outlet: bool,
    #[serde(default, deserialize_with = "flag")]
    pub halal_certified: bool,
    #[serde(default, deserialize_with = "flag")]
    pub wifi: bool,
    #[serde(default, deserialize_with = "flag")]
    pub aircon: bool,
    #[serde(default)]
    pub address: String,
    /// Display-only fields not used in scoring
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl EateryAttributes {

    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Self::default() }
    }

    pub fn is_open(&self, at: NaiveTime) -> bool {
        self.hours.is_open(at)
    }

    fn validate(&self, id: &str) -> Result<(), GraphError> {
        if !(self.rating.is_finite() && (0.0..=MAX_RATING).contains(&self.rating)) {
            return Err(GraphError::InvalidRating { id: id.to_string(), rating: self.rating });
        }
        Ok(())
    }
}


/// Partial update of an eatery record, `None` leaves a field unchanged
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct EateryPatch {
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub price: Option<u32>,
    pub hours: Option<Hours>,
    #[serde(default, deserialize_with = "optional_flag")]
    pub power_outlet: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    pub halal_certified: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    pub wifi: Option<bool>,
    #[serde(default, deserialize_with = "optional_flag")]
    pub aircon: Option<bool>,
    pub address: Option<String>,
}

impl EateryPatch {

    fn apply(self, target: &mut EateryAttributes) {
        if let Some(name) = self.name { target.name = name; }
        if let Some(rating) = self.rating { target.rating = rating; }
        if let Some(price) = self.price { target.price = price; }
        if let Some(hours) = self.hours { target.hours = hours; }
        if let Some(v) = self.power_outlet { target.power_outlet = v; }
        if let Some(v) = self.halal_certified { target.halal_certified = v; }
        if let Some(v) = self.wifi { target.wifi = v; }
        if let Some(v) = self.aircon { target.aircon = v; }
        if let Some(address) = self.address { target.address = address; }
    }
}


/// Amenity flags show up as booleans, 0/1 or yes/no strings in data files
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<FlagRepr> for bool {
    fn from(repr: FlagRepr) -> Self {
        match repr {
            FlagRepr::Bool(b) => b,
            FlagRepr::Int(i) => i != 0,
            FlagRepr::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1" | "y" | "t"),
        }
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    FlagRepr::deserialize(deserializer).map(bool::from)
}

fn optional_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Option::<FlagRepr>::deserialize(deserializer).map(|r| r.map(bool::from))
}


/// Eatery records keyed by graph node id
/// Serialized as the `{id: {name, rating, ...}}` eatery document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EateryCatalog {
    eateries: FxIndexMap<NodeId, EateryAttributes>,
}

impl EateryCatalog {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.eateries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eateries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&EateryAttributes> {
        self.eateries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.eateries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EateryAttributes)> {
        self.eateries.iter().map(|(id, attrs)| (id.as_str(), attrs))
    }

    /// Insert or replace a whole record
    pub fn insert(&mut self, id: &str, attributes: EateryAttributes) -> Result<(), GraphError> {
        if id.trim().is_empty() {
            return Err(GraphError::EmptyId);
        }
        attributes.validate(id)?;
        self.eateries.insert(id.to_string(), attributes);
        Ok(())
    }

    /// Patch a record, creating it (named after its id) when absent
    /// The record is left untouched when the patched result is invalid
    pub fn update(&mut self, id: &str, patch: EateryPatch) -> Result<&EateryAttributes, GraphError> {
        if id.trim().is_empty() {
            return Err(GraphError::EmptyId);
        }

        let mut updated = self.eateries.get(id).cloned().unwrap_or_else(|| EateryAttributes::new(id));
        patch.apply(&mut updated);
        updated.validate(id)?;

        let (index, _) = self.eateries.insert_full(id.to_string(), updated);
        Ok(&self.eateries[index])
    }

    pub fn remove(&mut self, id: &str) -> Result<EateryAttributes, GraphError> {
        self.eateries.shift_remove(id).ok_or_else(|| GraphError::UnknownEatery(id.to_string()))
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        self.eateries.iter().try_for_each(|(id, attrs)| attrs.validate(id))
    }

    /// Load and validate an eatery document
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let file = fs::File::open(path)
            .map_err(|source| SnapshotError::Io { path: path.to_path_buf(), source })?;
        let catalog: EateryCatalog = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| SnapshotError::Json { path: path.to_path_buf(), source })?;
        catalog.validate()?;

        debug!(eateries = catalog.len(), "loaded eateries from {}", path.display());
        Ok(catalog)
    }
}
