//! Semantic column types and the per-column exclusion ratchet

use serde::{Deserialize, Serialize};

/// Business meaning of a column, independent of its storage type
///
/// Variants are declared in resolution precedence order: a column that can
/// still be a date is a date, otherwise a fact, otherwise an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SemanticType {
    /// Calendar date
    Date,
    /// Numeric measure
    Fact,
    /// Categorical or free text value
    Attribute,
}

impl SemanticType {
    /// All types, highest precedence first
    pub const PRECEDENCE: [SemanticType; 3] =
        [SemanticType::Date, SemanticType::Fact, SemanticType::Attribute];

    /// Label used in schema config files
    pub fn label(&self) -> &'static str {
        match self {
            SemanticType::Date => "DATE",
            SemanticType::Fact => "FACT",
            SemanticType::Attribute => "ATTRIBUTE",
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DATE" => Ok(SemanticType::Date),
            "FACT" => Ok(SemanticType::Fact),
            "ATTRIBUTE" => Ok(SemanticType::Attribute),
            _ => Err(format!(
                "Invalid semantic type: {}. Expected: DATE, FACT, ATTRIBUTE",
                s
            )),
        }
    }
}

const DATE_EXCLUDED: u8 = 0b001;
const FACT_EXCLUDED: u8 = 0b010;
const OBSERVED: u8 = 0b100;

/// Types ruled out for one column so far
///
/// Bits only ever get set, so a type excluded by one counter-example stays
/// excluded for the rest of the pass. `Attribute` has no bit: it is the
/// fallback and cannot be excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ColumnExclusions(u8);

impl ColumnExclusions {
    /// Empty set, nothing observed yet
    pub const fn new() -> Self {
        Self(0)
    }

    /// Exclude a type for this column
    ///
    /// Excluding `Attribute` is a no-op.
    pub fn exclude(&mut self, ty: SemanticType) {
        self.0 |= match ty {
            SemanticType::Date => DATE_EXCLUDED,
            SemanticType::Fact => FACT_EXCLUDED,
            SemanticType::Attribute => 0,
        };
    }

    /// Record that a cell was seen for this column
    pub fn mark_observed(&mut self) {
        self.0 |= OBSERVED;
    }

    /// Whether a type has been ruled out
    pub fn is_excluded(&self, ty: SemanticType) -> bool {
        match ty {
            SemanticType::Date => self.0 & DATE_EXCLUDED != 0,
            SemanticType::Fact => self.0 & FACT_EXCLUDED != 0,
            SemanticType::Attribute => false,
        }
    }

    /// Whether at least one cell was seen
    pub fn is_observed(&self) -> bool {
        self.0 & OBSERVED != 0
    }

    /// Excluded types, highest precedence first
    pub fn excluded(&self) -> Vec<SemanticType> {
        SemanticType::PRECEDENCE
            .into_iter()
            .filter(|ty| self.is_excluded(*ty))
            .collect()
    }

    /// True when every type excluded here is also excluded in `other`
    pub fn is_subset_of(&self, other: &ColumnExclusions) -> bool {
        let mask = DATE_EXCLUDED | FACT_EXCLUDED;
        (self.0 & mask) & !(other.0 & mask) == 0
    }

    /// Resolve the final type by precedence
    ///
    /// A column with no observed cells resolves to `Attribute`.
    pub fn resolve(&self) -> SemanticType {
        if !self.is_observed() {
            return SemanticType::Attribute;
        }
        SemanticType::PRECEDENCE
            .into_iter()
            .find(|ty| !self.is_excluded(*ty))
            .unwrap_or(SemanticType::Attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        assert!(SemanticType::Date < SemanticType::Fact);
        assert!(SemanticType::Fact < SemanticType::Attribute);
    }

    #[test]
    fn test_label_round_trip() {
        for ty in SemanticType::PRECEDENCE {
            assert_eq!(ty.label().parse::<SemanticType>().unwrap(), ty);
        }
        assert_eq!("fact".parse::<SemanticType>().unwrap(), SemanticType::Fact);
        assert!("measure".parse::<SemanticType>().is_err());
    }

    #[test]
    fn test_serde_labels() {
        let json = serde_json::to_string(&SemanticType::Attribute).unwrap();
        assert_eq!(json, "\"ATTRIBUTE\"");
        let ty: SemanticType = serde_json::from_str("\"DATE\"").unwrap();
        assert_eq!(ty, SemanticType::Date);
    }

    #[test]
    fn test_unobserved_resolves_to_attribute() {
        assert_eq!(ColumnExclusions::new().resolve(), SemanticType::Attribute);
    }

    #[test]
    fn test_resolution() {
        let mut ex = ColumnExclusions::new();
        ex.mark_observed();
        assert_eq!(ex.resolve(), SemanticType::Date);

        ex.exclude(SemanticType::Date);
        assert_eq!(ex.resolve(), SemanticType::Fact);

        ex.exclude(SemanticType::Fact);
        assert_eq!(ex.resolve(), SemanticType::Attribute);
    }

    #[test]
    fn test_attribute_cannot_be_excluded() {
        let mut ex = ColumnExclusions::new();
        ex.mark_observed();
        ex.exclude(SemanticType::Attribute);
        assert!(!ex.is_excluded(SemanticType::Attribute));
        assert!(ex.excluded().is_empty());
    }

    #[test]
    fn test_subset() {
        let mut a = ColumnExclusions::new();
        let mut b = ColumnExclusions::new();
        a.exclude(SemanticType::Fact);
        assert!(!a.is_subset_of(&b));
        b.exclude(SemanticType::Fact);
        b.exclude(SemanticType::Date);
        assert!(a.is_subset_of(&b));
        assert!(!b.is_subset_of(&a));
    }
}
