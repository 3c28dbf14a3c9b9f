//! Attribute identity and attribute types.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Boolean tokens accepted as `true` for binary attributes.
const BOOLEAN_POSITIVES: [&str; 4] = ["1", "true", "t", "yes"];

/// Boolean tokens accepted as `false` for binary attributes.
const BOOLEAN_NEGATIVES: [&str; 4] = ["0", "false", "f", "no"];

/// The kind of values a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Unordered categorical values
    #[default]
    Nominal,
    /// Real-valued measurements
    Numeric,
    /// Ordered values, stored and compared as numbers
    Ordinal,
    /// Two-valued attributes
    Binary,
}

impl AttributeType {
    /// All attribute types, in declaration order.
    pub const ALL: [AttributeType; 4] = [
        AttributeType::Nominal,
        AttributeType::Numeric,
        AttributeType::Ordinal,
        AttributeType::Binary,
    ];

    /// Lowercase name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nominal => "nominal",
            Self::Numeric => "numeric",
            Self::Ordinal => "ordinal",
            Self::Binary => "binary",
        }
    }

    /// The token that replaces a missing value of this type.
    pub fn default_missing_value(&self) -> &'static str {
        match self {
            Self::Nominal => "?",
            Self::Numeric | Self::Ordinal => "0.0",
            Self::Binary => "0",
        }
    }

    /// Numeric and ordinal attributes are refined with `<=`/`>=` thresholds.
    pub fn is_numeric_like(&self) -> bool {
        matches!(self, Self::Numeric | Self::Ordinal)
    }

    /// Resolve a type name, case-insensitively.
    ///
    /// Unknown names resolve to [`AttributeType::Nominal`] and log a warning,
    /// so a typo in a column description never aborts a run.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_else(|| {
                warn!("'{}' is not a valid attribute type, using nominal", name);
                Self::Nominal
            })
    }

    /// Parse a boolean token (`1/true/t/yes`, `0/false/f/no`).
    pub fn parse_binary(value: &str) -> Option<bool> {
        let lowered = value.trim().to_ascii_lowercase();
        if BOOLEAN_POSITIVES.contains(&lowered.as_str()) {
            Some(true)
        } else if BOOLEAN_NEGATIVES.contains(&lowered.as_str()) {
            Some(false)
        } else {
            None
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a column: name, optional short name, type and position.
///
/// The index is the stable identity of the attribute within its table.
/// The type can only be changed through [`Column::set_type`](super::Column::set_type),
/// which checks that the column's values can be represented in the new type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    short_name: Option<String>,
    attribute_type: AttributeType,
    index: usize,
}

impl Attribute {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType, index: usize) -> Self {
        Self {
            name: name.into(),
            short_name: None,
            attribute_type,
            index,
        }
    }

    /// Attach an abbreviated display name.
    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        let short_name = short_name.into();
        self.short_name = (!short_name.is_empty()).then_some(short_name);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    /// The short name when present, otherwise the full name.
    pub fn name_or_short(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_type(&mut self, attribute_type: AttributeType) {
        self.attribute_type = attribute_type;
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.short_name {
            Some(short) => write!(f, "{} ({})", self.name, short),
            None => f.write_str(&self.name),
        }
    }
}
