//! # Knowledge-base data model
//!
//! The entity documents the batch engine edits in memory: items and
//! properties, their fingerprints (labels, descriptions, aliases), site
//! links, and statements built from snaks.
//!
//! Entity variants form a closed set. Call sites never inspect the variant
//! directly; they ask for a capability handle (`fingerprint_mut`,
//! `site_links_mut`, `statements_mut`) and treat `None` as "this entity
//! cannot carry that kind of edit".

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BatchError;

/// Numeric id of an item, `Q<n>` in canonical text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

/// Numeric id of a property, `P<n>` in canonical text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub u64);

/// Identifier of an item or property in the target knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    Item(ItemId),
    Property(PropertyId),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Item(id) => id.fmt(f),
            EntityId::Property(id) => id.fmt(f),
        }
    }
}

/// Parses the digits of a canonical id: non-empty, ASCII digits only,
/// no leading zeros.
fn parse_id_number(digits: &str, full: &str) -> Result<u64, BatchError> {
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BatchError::syntax(format!("{full} is not a valid entity id")));
    }
    digits
        .parse()
        .map_err(|_| BatchError::syntax(format!("{full} is not a valid entity id")))
}

impl FromStr for ItemId {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('Q') {
            Some(digits) => Ok(ItemId(parse_id_number(digits, s)?)),
            None => Err(BatchError::syntax(format!("{s} is not a valid item id"))),
        }
    }
}

impl FromStr for PropertyId {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('P') {
            Some(digits) => Ok(PropertyId(parse_id_number(digits, s)?)),
            None => Err(BatchError::syntax(format!("{s} is not a valid property id"))),
        }
    }
}

impl FromStr for EntityId {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('Q') {
            Ok(EntityId::Item(s.parse()?))
        } else if s.starts_with('P') {
            Ok(EntityId::Property(s.parse()?))
        } else {
            Err(BatchError::syntax(format!("{s} is not a valid entity id")))
        }
    }
}

macro_rules! id_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

id_serde!(ItemId);
id_serde!(PropertyId);
id_serde!(EntityId);

/// The calendar model of a time value. The batch grammar only produces
/// Gregorian timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Calendar {
    Gregorian,
}

/// A typed value as produced by the value grammar.
///
/// The serialized type tags follow the original wire format of the system
/// this model interoperates with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DataValue {
    String(String),
    MonolingualText {
        text: String,
        language: String,
    },
    Time {
        /// Literal timestamp text, e.g. `+2021-01-01T00:00:00Z`.
        timestamp: String,
        precision: u8,
        calendar: Calendar,
    },
    GlobeCoordinate {
        latitude: f64,
        longitude: f64,
    },
    Quantity {
        /// Canonical decimal text: explicit sign, no redundant leading zeros.
        amount: String,
        unit: String,
        lower_bound: String,
        upper_bound: String,
    },
    #[serde(rename = "wikibase-entityid")]
    EntityId(EntityId),
}

impl DataValue {
    /// A quantity with no uncertainty range: both bounds equal the amount,
    /// unit fixed to `"1"`.
    pub fn exact_quantity(amount: String) -> Self {
        DataValue::Quantity {
            unit: "1".to_string(),
            lower_bound: amount.clone(),
            upper_bound: amount.clone(),
            amount,
        }
    }
}

/// A (property, value) assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snak {
    pub property: PropertyId,
    pub value: DataValue,
}

/// A provenance bundle of snaks attached to a statement. Its identity is
/// its full snak list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub snaks: Vec<Snak>,
}

/// A main snak plus its qualifiers and references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub main_snak: Snak,
    /// Qualifier snaks in the order they were attached. Duplicates allowed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Snak>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,
}

impl Statement {
    pub fn new(main_snak: Snak) -> Self {
        Statement {
            main_snak,
            qualifiers: Vec::new(),
            references: Vec::new(),
        }
    }
}

/// The labels/descriptions/aliases bundle of an entity. At most one label
/// and one description per language; alias texts are distinct per language
/// and keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub descriptions: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl Fingerprint {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.descriptions.is_empty() && self.aliases.is_empty()
    }
}

/// Site id to page title. At most one link per site, items only.
pub type SiteLinks = BTreeMap<String, String>;

/// An item document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// `None` until the item is persisted for the first time (CREATE).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Fingerprint::is_empty")]
    pub fingerprint: Fingerprint,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub site_links: SiteLinks,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<Statement>,
}

impl Item {
    pub fn with_id(id: ItemId) -> Self {
        Item {
            id: Some(id),
            ..Item::default()
        }
    }
}

/// A property document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    #[serde(default, skip_serializing_if = "Fingerprint::is_empty")]
    pub fingerprint: Fingerprint,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<Statement>,
}

impl Property {
    pub fn with_id(id: PropertyId) -> Self {
        Property {
            id,
            fingerprint: Fingerprint::default(),
            statements: Vec::new(),
        }
    }
}

/// The closed set of entity variants the engine can edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum EntityDocument {
    Item(Item),
    Property(Property),
}

impl EntityDocument {
    /// A fresh, unpersisted item as produced by a `CREATE` line.
    pub fn new_item() -> Self {
        EntityDocument::Item(Item::default())
    }

    /// The persisted id, if any. Fresh items have none.
    pub fn id(&self) -> Option<EntityId> {
        match self {
            EntityDocument::Item(item) => item.id.map(EntityId::Item),
            EntityDocument::Property(property) => Some(EntityId::Property(property.id)),
        }
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            EntityDocument::Item(item) => Some(&item.fingerprint),
            EntityDocument::Property(property) => Some(&property.fingerprint),
        }
    }

    pub fn fingerprint_mut(&mut self) -> Option<&mut Fingerprint> {
        match self {
            EntityDocument::Item(item) => Some(&mut item.fingerprint),
            EntityDocument::Property(property) => Some(&mut property.fingerprint),
        }
    }

    pub fn site_links(&self) -> Option<&SiteLinks> {
        match self {
            EntityDocument::Item(item) => Some(&item.site_links),
            EntityDocument::Property(_) => None,
        }
    }

    pub fn site_links_mut(&mut self) -> Option<&mut SiteLinks> {
        match self {
            EntityDocument::Item(item) => Some(&mut item.site_links),
            EntityDocument::Property(_) => None,
        }
    }

    pub fn statements(&self) -> Option<&[Statement]> {
        match self {
            EntityDocument::Item(item) => Some(&item.statements),
            EntityDocument::Property(property) => Some(&property.statements),
        }
    }

    pub fn statements_mut(&mut self) -> Option<&mut Vec<Statement>> {
        match self {
            EntityDocument::Item(item) => Some(&mut item.statements),
            EntityDocument::Property(property) => Some(&mut property.statements),
        }
    }
}
