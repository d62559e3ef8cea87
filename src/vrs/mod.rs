//! VRS data model: content-addressed, tagged-union representation of
//! GA4GH Variation Representation Specification objects.
//!
//! The source system represents the object graph as nested structures
//! (an `Allele` embeds its `SequenceLocation`, which embeds its
//! `SequenceReference`). We re-architect this as a sum type stored by id
//! (spec.md §9 design note): `VrsObject` is one of a closed set of
//! variants, each digestible on its own, and cross-references between
//! variants are plain id strings resolved against `Storage` on read.

pub mod annotation;
pub mod mapping;

use serde::{Deserialize, Serialize};

use crate::common::digest;
use crate::error::{Error, Result};

/// A reference to a specific sequence identified by its refget accession.
///
/// Identity is the accession alone (spec.md §3): two `SequenceReference`s
/// with the same accession are the same object, immutable once created.
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceReference {
    /// GA4GH refget accession, e.g. `"SQ.F-LrLnMKIjgbR1HECnsl_VGjXfs3QHDE"`.
    pub refget_accession: String,
}

impl SequenceReference {
    /// The full VRS identifier, `ga4gh:<refget_accession>`.
    pub fn id(&self) -> String {
        format!("ga4gh:{}", self.refget_accession)
    }

    fn canonical_json(&self) -> serde_json::Value {
        serde_json::json!({
            "refgetAccession": self.refget_accession,
            "type": "SequenceReference",
        })
    }

    /// The GA4GH VRS 2.x wire representation.
    pub fn to_vrs_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "SequenceReference",
            "refgetAccession": self.refget_accession,
        })
    }
}

/// A location on a sequence, interbase (half-open, zero-based) coordinates.
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceLocation {
    pub sequence_reference: SequenceReference,
    /// Inclusive start, zero-based.
    pub start: u64,
    /// Exclusive end; invariant `end >= start` (spec.md §3).
    pub end: u64,
}

impl SequenceLocation {
    /// Deterministic content digest, `ga4gh:SL.<digest>`.
    pub fn id(&self) -> String {
        format!("ga4gh:SL.{}", self.digest())
    }

    /// The bare base64url digest (without the `ga4gh:SL.` prefix).
    pub fn digest(&self) -> String {
        digest::digest_of(&self.canonical_json())
    }

    fn canonical_json(&self) -> serde_json::Value {
        serde_json::json!({
            "end": self.end,
            "sequenceReference": self.sequence_reference.canonical_json(),
            "start": self.start,
            "type": "SequenceLocation",
        })
    }

    /// Whether this location's interval `[start, end)` overlaps `[start, end)`.
    ///
    /// Overlap inclusion invariant from spec.md §8: for allele at `[a, b)`,
    /// `search(X, s, e)` contains it iff `s < b && e > a`.
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        start < self.end && end > self.start
    }

    /// The GA4GH VRS 2.x wire representation, with its own `id` and a
    /// fully nested `sequenceReference` rather than a digest reference.
    pub fn to_vrs_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id(),
            "type": "SequenceLocation",
            "sequenceReference": self.sequence_reference.to_vrs_json(),
            "start": self.start,
            "end": self.end,
        })
    }
}

/// The state (substituted sequence) of an `Allele`.
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AlleleState {
    /// A literal sequence expression: the allele's sequence spelled out.
    LiteralSequenceExpression { sequence: String },
}

impl AlleleState {
    fn canonical_json(&self) -> serde_json::Value {
        match self {
            AlleleState::LiteralSequenceExpression { sequence } => serde_json::json!({
                "sequence": sequence,
                "type": "LiteralSequenceExpression",
            }),
        }
    }

    pub fn to_vrs_json(&self) -> serde_json::Value {
        match self {
            AlleleState::LiteralSequenceExpression { sequence } => serde_json::json!({
                "type": "LiteralSequenceExpression",
                "sequence": sequence,
            }),
        }
    }
}

/// A specific sequence state at a specific genomic location.
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allele {
    pub location: SequenceLocation,
    pub state: AlleleState,
}

impl Allele {
    /// Deterministic content digest, `ga4gh:VA.<digest>`.
    pub fn id(&self) -> String {
        format!("ga4gh:VA.{}", self.digest())
    }

    /// The bare base64url digest (without the `ga4gh:VA.` prefix).
    pub fn digest(&self) -> String {
        digest::digest_of(&self.canonical_json())
    }

    /// Canonical encoding references the location by its *digest id*, not
    /// its full nested structure (spec.md §9: "cross-references are stored
    /// as id strings and resolved on read").
    fn canonical_json(&self) -> serde_json::Value {
        serde_json::json!({
            "location": self.location.digest(),
            "state": self.state.canonical_json(),
            "type": "Allele",
        })
    }

    /// The GA4GH VRS 2.x wire representation: `id`, `type`, and a fully
    /// nested `location`/`state`, rather than the internal digest-keyed
    /// cross-reference `canonical_json` hashes over.
    pub fn to_vrs_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id(),
            "type": "Allele",
            "location": self.location.to_vrs_json(),
            "state": self.state.to_vrs_json(),
        })
    }
}

/// A VRS copy-number-change object.
///
/// Out-of-scope design note (spec.md §9, Open Question a): this core
/// covers Alleles for overlap search. CopyNumberChange/CopyNumberCount are
/// modeled as storable/retrievable objects but do not participate in
/// `search_variations`, matching the source's Allele-only derived
/// `locations` table.
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyNumberChange {
    pub location: SequenceLocation,
    pub copy_change: String,
}

impl CopyNumberChange {
    pub fn id(&self) -> String {
        format!("ga4gh:CX.{}", self.digest())
    }

    pub fn digest(&self) -> String {
        digest::digest_of(&serde_json::json!({
            "location": self.location.digest(),
            "copyChange": self.copy_change,
            "type": "CopyNumberChange",
        }))
    }

    pub fn to_vrs_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id(),
            "type": "CopyNumberChange",
            "location": self.location.to_vrs_json(),
            "copyChange": self.copy_change,
        })
    }
}

/// A VRS copy-number-count object.
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyNumberCount {
    pub location: SequenceLocation,
    pub copies: u32,
}

impl CopyNumberCount {
    pub fn id(&self) -> String {
        format!("ga4gh:CN.{}", self.digest())
    }

    pub fn digest(&self) -> String {
        digest::digest_of(&serde_json::json!({
            "location": self.location.digest(),
            "copies": self.copies,
            "type": "CopyNumberCount",
        }))
    }

    pub fn to_vrs_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id(),
            "type": "CopyNumberCount",
            "location": self.location.to_vrs_json(),
            "copies": self.copies,
        })
    }
}

/// Any storable VRS object.
///
/// Tagged by `kind` internally (the storage representation); `to_vrs_json`
/// renders the externally-facing GA4GH VRS 2.x JSON shape instead, which
/// uses `type` rather than `kind` and nests sub-objects in full rather
/// than by digest reference.
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum VrsObject {
    SequenceReference(SequenceReference),
    SequenceLocation(SequenceLocation),
    Allele(Allele),
    CopyNumberChange(CopyNumberChange),
    CopyNumberCount(CopyNumberCount),
}

impl VrsObject {
    /// The object's deterministic VRS identifier.
    pub fn id(&self) -> String {
        match self {
            VrsObject::SequenceReference(o) => o.id(),
            VrsObject::SequenceLocation(o) => o.id(),
            VrsObject::Allele(o) => o.id(),
            VrsObject::CopyNumberChange(o) => o.id(),
            VrsObject::CopyNumberCount(o) => o.id(),
        }
    }

    /// The GA4GH VRS 2.x wire representation of this object.
    pub fn to_vrs_json(&self) -> serde_json::Value {
        match self {
            VrsObject::SequenceReference(o) => o.to_vrs_json(),
            VrsObject::SequenceLocation(o) => o.to_vrs_json(),
            VrsObject::Allele(o) => o.to_vrs_json(),
            VrsObject::CopyNumberChange(o) => o.to_vrs_json(),
            VrsObject::CopyNumberCount(o) => o.to_vrs_json(),
        }
    }

    /// Decompose this object into itself plus every sub-object it embeds,
    /// in dependency order (leaves first) so that storing them in order
    /// satisfies the referential-closure invariant (spec.md §3 invariant
    /// 2) even for a backend without foreign-key enforcement.
    pub fn decompose(&self) -> Vec<VrsObject> {
        match self {
            VrsObject::Allele(allele) => {
                let mut parts = decompose_location(&allele.location);
                parts.push(VrsObject::Allele(allele.clone()));
                parts
            }
            VrsObject::SequenceLocation(loc) => decompose_location(loc),
            VrsObject::CopyNumberChange(cnc) => {
                let mut parts = decompose_location(&cnc.location);
                parts.push(VrsObject::CopyNumberChange(cnc.clone()));
                parts
            }
            VrsObject::CopyNumberCount(cnco) => {
                let mut parts = decompose_location(&cnco.location);
                parts.push(VrsObject::CopyNumberCount(cnco.clone()));
                parts
            }
            VrsObject::SequenceReference(sr) => vec![VrsObject::SequenceReference(sr.clone())],
        }
    }
}

fn decompose_location(loc: &SequenceLocation) -> Vec<VrsObject> {
    vec![
        VrsObject::SequenceReference(loc.sequence_reference.clone()),
        VrsObject::SequenceLocation(loc.clone()),
    ]
}

impl TryFrom<VrsObject> for Allele {
    type Error = Error;

    fn try_from(value: VrsObject) -> Result<Self> {
        match value {
            VrsObject::Allele(a) => Ok(a),
            other => Err(Error::Translation(format!(
                "expected Allele, found {}",
                other.id()
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_allele() -> Allele {
        Allele {
            location: SequenceLocation {
                sequence_reference: SequenceReference {
                    refget_accession: "SQ.F-LrLnMKIjgbR1HECnsl_VGjXfs3QHDE".to_string(),
                },
                start: 87894076,
                end: 87894077,
            },
            state: AlleleState::LiteralSequenceExpression {
                sequence: "T".to_string(),
            },
        }
    }

    #[test]
    fn allele_id_is_deterministic() {
        let a = sample_allele();
        let b = sample_allele();
        assert_eq!(a.id(), b.id());
        assert!(a.id().starts_with("ga4gh:VA."));
    }

    #[test]
    fn equal_attributes_share_digest() {
        let loc_a = SequenceLocation {
            sequence_reference: SequenceReference {
                refget_accession: "SQ.abc".to_string(),
            },
            start: 1,
            end: 2,
        };
        let loc_b = loc_a.clone();
        assert_eq!(loc_a.id(), loc_b.id());
    }

    #[test]
    fn decompose_allele_is_leaves_first() {
        let allele = sample_allele();
        let parts = VrsObject::Allele(allele.clone()).decompose();
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[0], VrsObject::SequenceReference(_)));
        assert!(matches!(parts[1], VrsObject::SequenceLocation(_)));
        assert!(matches!(parts[2], VrsObject::Allele(_)));
        assert_eq!(parts[2].id(), allele.id());
    }

    #[test]
    fn to_vrs_json_uses_type_tags_and_nests_the_location_in_full() {
        let allele = sample_allele();
        let json = VrsObject::Allele(allele.clone()).to_vrs_json();
        assert_eq!(json["type"], "Allele");
        assert_eq!(json["id"], allele.id());
        assert_eq!(json["location"]["type"], "SequenceLocation");
        assert_eq!(json["location"]["sequenceReference"]["type"], "SequenceReference");
        assert_eq!(
            json["location"]["sequenceReference"]["refgetAccession"],
            "SQ.F-LrLnMKIjgbR1HECnsl_VGjXfs3QHDE"
        );
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn overlap_inclusion_matches_half_open_semantics() {
        let loc = SequenceLocation {
            sequence_reference: SequenceReference {
                refget_accession: "SQ.abc".to_string(),
            },
            start: 100,
            end: 200,
        };
        assert!(loc.overlaps(150, 250));
        assert!(loc.overlaps(0, 101));
        assert!(!loc.overlaps(200, 300));
        assert!(!loc.overlaps(0, 100));
    }
}
