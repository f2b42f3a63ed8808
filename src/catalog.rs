//! Order catalog: the menu of collectible items and canned orders
//!
//! Pure data. Template 0 is always the tutorial order.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest and longest allowed order template
pub const MIN_ORDER_LEN: usize = 2;
pub const MAX_ORDER_LEN: usize = 4;

/// Short item code ("B", "F", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCode(pub String);

impl ItemCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// A collectible item definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub code: ItemCode,
    pub display_name: String,
    /// Model/texture reference handed to the host when spawning
    pub visual_ref: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate item code {0}")]
    DuplicateCode(ItemCode),
    #[error("order template {index} references unknown item {code}")]
    UnknownCode { index: usize, code: ItemCode },
    #[error("order template {index} has {len} items (expected {MIN_ORDER_LEN}-{MAX_ORDER_LEN})")]
    BadTemplateLength { index: usize, len: usize },
    #[error("catalog needs a tutorial template and at least one regular template")]
    TooFewTemplates,
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Immutable item + order template catalog. Deserializing runs the same
/// validation as [`OrderCatalog::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawCatalog")]
pub struct OrderCatalog {
    items: Vec<ItemDef>,
    templates: Vec<Vec<ItemCode>>,
}

/// Unchecked wire shape of a catalog
#[derive(Debug, Deserialize)]
struct RawCatalog {
    items: Vec<ItemDef>,
    templates: Vec<Vec<ItemCode>>,
}

impl TryFrom<RawCatalog> for OrderCatalog {
    type Error = CatalogError;

    fn try_from(raw: RawCatalog) -> Result<Self, Self::Error> {
        Self::new(raw.items, raw.templates)
    }
}

impl OrderCatalog {
    /// Build and validate a catalog
    pub fn new(items: Vec<ItemDef>, templates: Vec<Vec<ItemCode>>) -> Result<Self, CatalogError> {
        let catalog = Self { items, templates };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse a catalog from JSON (same shape as `Serialize` output)
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(&item.code) {
                return Err(CatalogError::DuplicateCode(item.code.clone()));
            }
        }

        if self.templates.len() < 2 {
            return Err(CatalogError::TooFewTemplates);
        }

        for (index, template) in self.templates.iter().enumerate() {
            if !(MIN_ORDER_LEN..=MAX_ORDER_LEN).contains(&template.len()) {
                return Err(CatalogError::BadTemplateLength {
                    index,
                    len: template.len(),
                });
            }
            if let Some(code) = template.iter().find(|c| !seen.contains(c)) {
                return Err(CatalogError::UnknownCode {
                    index,
                    code: code.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn items(&self) -> &[ItemDef] {
        &self.items
    }

    pub fn item(&self, code: &ItemCode) -> Option<&ItemDef> {
        self.items.iter().find(|i| &i.code == code)
    }

    pub fn contains(&self, code: &ItemCode) -> bool {
        self.item(code).is_some()
    }

    /// Human name for a code, falling back to the code itself
    pub fn display_name<'a>(&'a self, code: &'a ItemCode) -> &'a str {
        self.item(code)
            .map(|i| i.display_name.as_str())
            .unwrap_or(code.as_str())
    }

    pub fn templates(&self) -> &[Vec<ItemCode>] {
        &self.templates
    }

    /// The first order every player gets
    pub fn tutorial(&self) -> &[ItemCode] {
        &self.templates[0]
    }

    /// Templates eligible after the tutorial
    pub fn regular_templates(&self) -> &[Vec<ItemCode>] {
        &self.templates[1..]
    }

    /// "Burger, then Fries, then Soda"
    pub fn describe_order(&self, order: &[ItemCode]) -> String {
        order
            .iter()
            .map(|c| self.display_name(c))
            .collect::<Vec<_>>()
            .join(", then ")
    }
}

impl Default for OrderCatalog {
    fn default() -> Self {
        let item = |code: &str, name: &str, model: &str| ItemDef {
            code: ItemCode::from(code),
            display_name: name.to_string(),
            visual_ref: format!("models/items/{model}.gltf"),
        };
        let order = |codes: &[&str]| codes.iter().map(|c| ItemCode::from(*c)).collect::<Vec<_>>();

        Self {
            items: vec![
                item("B", "Burger", "burger"),
                item("F", "Fries", "fries"),
                item("N", "Nuggets", "nuggets"),
                item("S", "Soda", "soda"),
                item("M", "Milkshake", "milkshake"),
                item("A", "Apple Pie", "apple-pie"),
            ],
            templates: vec![
                order(&["B", "F"]), // tutorial
                order(&["B", "F", "S"]),
                order(&["N", "S"]),
                order(&["B", "N", "F", "S"]),
                order(&["M", "A"]),
                order(&["F", "N", "M"]),
                order(&["S", "B", "A", "F"]),
            ],
        }
    }
}
