//! Tri-state booleans that distinguish "no" from "unknown".
//!
//! Serialized as JSON `true | false | null` so external collaborators (the
//! HTTP surface, fixture adapters) see a plain nullable boolean on the
//! wire while pipeline code gets an exhaustive three-way match.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A boolean that can also be `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tri {
    Yes,
    No,
    Unknown,
}

impl Tri {
    pub fn from_bool(b: bool) -> Self {
        if b {
            Tri::Yes
        } else {
            Tri::No
        }
    }

    pub fn is_yes(self) -> bool {
        matches!(self, Tri::Yes)
    }

    pub fn is_no(self) -> bool {
        matches!(self, Tri::No)
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Tri::Unknown)
    }

    /// Maps to `{true -> 1.0, false -> -1.0, unknown -> 0.0}`, used by the
    /// selector's `indoor_pref` aggregate.
    pub fn as_signed_unit(self) -> f64 {
        match self {
            Tri::Yes => 1.0,
            Tri::No => -1.0,
            Tri::Unknown => 0.0,
        }
    }
}

impl Serialize for Tri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tri::Yes => serializer.serialize_bool(true),
            Tri::No => serializer.serialize_bool(false),
            Tri::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Tri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let opt = Option::<bool>::deserialize(deserializer)?;
        Ok(match opt {
            Some(true) => Tri::Yes,
            Some(false) => Tri::No,
            None => Tri::Unknown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json_as_nullable_bool() {
        assert_eq!(serde_json::to_string(&Tri::Yes).unwrap(), "true");
        assert_eq!(serde_json::to_string(&Tri::No).unwrap(), "false");
        assert_eq!(serde_json::to_string(&Tri::Unknown).unwrap(), "null");

        assert_eq!(
            serde_json::from_str::<Tri>("true").unwrap().is_yes(),
            true
        );
        assert!(serde_json::from_str::<Tri>("null").unwrap().is_unknown());
    }

    #[test]
    fn signed_unit_matches_selector_mapping() {
        assert_eq!(Tri::Yes.as_signed_unit(), 1.0);
        assert_eq!(Tri::No.as_signed_unit(), -1.0);
        assert_eq!(Tri::Unknown.as_signed_unit(), 0.0);
    }
}
