use std::fmt;

use crate::error::SegmentError;

/// A (region, soil type) pair identifying one segment of the dataset.
///
/// Components are compared exactly and case-sensitively. They are stored as
/// given; only blank components are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentKey {
    region: String,
    soil: String,
}

impl SegmentKey {
    /// # Errors
    ///
    /// [`SegmentError::InvalidKey`] if either component is empty or whitespace.
    pub fn new(region: impl Into<String>, soil: impl Into<String>) -> Result<Self, SegmentError> {
        let (region, soil) = (region.into(), soil.into());
        if region.trim().is_empty() {
            return Err(SegmentError::InvalidKey("region must not be empty".into()));
        }
        if soil.trim().is_empty() {
            return Err(SegmentError::InvalidKey("soil type must not be empty".into()));
        }
        Ok(Self { region, soil })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn soil(&self) -> &str {
        &self.soil
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.soil)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "Loam")]
    #[case("Punjab", "")]
    #[case("   ", "Loam")]
    #[case("Punjab", "\t")]
    fn blank_components_are_rejected(#[case] region: &str, #[case] soil: &str) {
        assert!(matches!(
            SegmentKey::new(region, soil),
            Err(SegmentError::InvalidKey(_))
        ));
    }

    #[test]
    fn stores_components_verbatim() {
        let key = SegmentKey::new(" Punjab", "Loam ").unwrap();
        assert_eq!(key.region(), " Punjab");
        assert_eq!(key.soil(), "Loam ");
        assert_ne!(key, SegmentKey::new("Punjab", "Loam").unwrap());
    }

    #[test]
    fn equality_is_case_sensitive() {
        let a = SegmentKey::new("Punjab", "Loam").unwrap();
        let b = SegmentKey::new("punjab", "Loam").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "Punjab/Loam");
    }
}
