//! Variation mappings: directed, typed relations between two object ids.

use serde::{Deserialize, Serialize};

/// A directed mapping `source -> dest` of the given type (spec.md §3).
///
/// `mapping_type` is left a free-form string rather than a closed enum:
/// spec.md itself only names two examples (`liftover`, `transcription`)
/// followed by an ellipsis, so a fixed enum would need a schema change
/// for every new mapping kind a deployment wants to record.
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationMapping {
    pub source_id: String,
    pub dest_id: String,
    pub mapping_type: String,
}

impl VariationMapping {
    pub fn new(
        source_id: impl Into<String>,
        dest_id: impl Into<String>,
        mapping_type: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            dest_id: dest_id.into(),
            mapping_type: mapping_type.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mapping_direction_is_preserved() {
        let m = VariationMapping::new("A", "B", "transcription");
        assert_eq!(m.source_id, "A");
        assert_eq!(m.dest_id, "B");
    }
}
