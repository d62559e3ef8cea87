//! Opaque key/value annotations attached to any object id.

use serde::{Deserialize, Serialize};

/// A single `(object_id, annotation_type, annotation_value)` tuple
/// (spec.md §3). An object may carry multiple annotations, and the same
/// `(object_id, annotation_type)` may repeat with different values — no
/// uniqueness is implied or enforced.
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub object_id: String,
    pub annotation_type: String,
    pub annotation_value: serde_json::Value,
}

impl Annotation {
    pub fn new(
        object_id: impl Into<String>,
        annotation_type: impl Into<String>,
        annotation_value: serde_json::Value,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            annotation_type: annotation_type.into(),
            annotation_value,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn annotation_carries_opaque_json() {
        let ann = Annotation::new("ga4gh:VA.x", "clinical_significance", serde_json::json!("P"));
        assert_eq!(ann.annotation_value, serde_json::json!("P"));
    }
}
