//! Unit of measure model.

use serde::{Deserialize, Serialize};

use rust_decimal::Decimal;
use tech_store_core::UomName;

/// Physical dimension a unit measures.
///
/// Conversions are only defined between units of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UomType {
    #[default]
    Quantity,
    Weight,
    Volume,
    Length,
    Area,
    Time,
    Other,
}

impl UomType {
    /// Stored name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quantity => "Quantity",
            Self::Weight => "Weight",
            Self::Volume => "Volume",
            Self::Length => "Length",
            Self::Area => "Area",
            Self::Time => "Time",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for UomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of measure.
///
/// A unit either stands alone or is defined relative to a base unit:
/// `1 self = conversion_factor × base`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Uom {
    pub name: UomName,
    pub symbol: String,
    pub uom_type: UomType,
    /// Quantities in this unit must be integral.
    pub must_be_whole_number: bool,
    pub enabled: bool,
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_uom: Option<UomName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Uom {
    /// How many base units one of this unit is worth.
    ///
    /// Units without a base are their own base (factor one).
    #[must_use]
    pub fn factor_to_base(&self) -> Decimal {
        match (&self.base_uom, self.conversion_factor) {
            (Some(_), Some(factor)) => factor,
            _ => Decimal::ONE,
        }
    }

    /// The base this unit converts through: its base unit, or itself.
    #[must_use]
    pub fn base_name(&self) -> &UomName {
        self.base_uom.as_ref().unwrap_or(&self.name)
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Input for creating a unit of measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct NewUom {
    pub name: UomName,
    pub symbol: String,
    #[serde(default)]
    pub uom_type: UomType,
    #[serde(default)]
    pub must_be_whole_number: bool,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub base_uom: Option<UomName>,
    #[serde(default)]
    pub conversion_factor: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewUom {
    /// A standalone enabled unit.
    #[must_use]
    pub fn new(name: UomName, symbol: impl Into<String>, uom_type: UomType) -> Self {
        Self {
            name,
            symbol: symbol.into(),
            uom_type,
            must_be_whole_number: false,
            enabled: true,
            is_default: false,
            base_uom: None,
            conversion_factor: None,
            description: None,
        }
    }

    /// Define the unit as `factor` × `base`.
    #[must_use]
    pub fn based_on(mut self, base: UomName, factor: Decimal) -> Self {
        self.base_uom = Some(base);
        self.conversion_factor = Some(factor);
        self
    }

    /// Require whole-number quantities.
    #[must_use]
    pub const fn whole(mut self) -> Self {
        self.must_be_whole_number = true;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_defaults_to_one() {
        let uom = Uom {
            name: UomName::parse("Kilogram").unwrap(),
            symbol: "Kg".to_owned(),
            uom_type: UomType::Weight,
            must_be_whole_number: false,
            enabled: true,
            is_default: false,
            base_uom: None,
            conversion_factor: Some(Decimal::new(5, 0)),
            description: None,
        };
        assert_eq!(uom.factor_to_base(), Decimal::ONE);
        assert_eq!(uom.base_name().as_str(), "Kilogram");
    }

    #[test]
    fn test_new_uom_defaults_from_yaml() {
        let uom: NewUom = serde_yaml::from_str("name: Gram\nsymbol: g\nuom_type: Weight\n").unwrap();
        assert!(uom.enabled);
        assert!(!uom.must_be_whole_number);
        assert_eq!(uom.uom_type, UomType::Weight);
    }
}
