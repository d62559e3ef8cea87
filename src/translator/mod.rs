//! Translation: turning an opaque variant definition string in one of
//! several supported nomenclatures into a normalized VRS `Allele`
//! (spec.md §4.2).
//!
//! A full translation library (HGVS including protein/RNA/intronic
//! coordinates, VCF multi-allelic splitting, complex rearrangements) is an
//! out-of-scope external collaborator per spec.md §1; `CompositeTranslator`
//! covers the genomic SNV/MNV/indel slice spec.md's worked examples
//! exercise, built from three small sub-parsers and one shared
//! normalization routine.

pub mod gnomad_vcf;
pub mod hgvs;
pub mod spdi;

use std::str::FromStr;

use crate::dataproxy::DataProxy;
use crate::error::{Error, Result};
use crate::vrs::{Allele, AlleleState, SequenceLocation, SequenceReference};

/// Translate an external variant definition string into a VRS `Allele`.
pub trait Translator: Send + Sync {
    fn translate(&self, definition: &str) -> Result<Allele>;
}

/// Un-normalized variant primitives common to all three source
/// nomenclatures, prior to accession resolution and indel justification.
struct RawVariant {
    accession_or_alias: String,
    /// 0-based position of the first affected reference base.
    start: u64,
    reference: String,
    alternative: String,
}

/// Detects nomenclature by shape and dispatches to the matching
/// sub-parser, resolves the sequence alias via `DataProxy`, and
/// normalizes the resulting interval by trimming any shared prefix/suffix
/// and left-shifting through repeated reference context (spec.md §4.2).
pub struct CompositeTranslator<D: DataProxy> {
    data_proxy: D,
}

impl<D: DataProxy> CompositeTranslator<D> {
    pub fn new(data_proxy: D) -> Self {
        Self { data_proxy }
    }

    fn parse_raw(&self, definition: &str) -> Result<RawVariant> {
        if spdi::looks_like_spdi(definition) {
            let var = spdi::Var::from_str(definition)?;
            return Ok(RawVariant {
                accession_or_alias: var.sequence,
                start: var.position,
                reference: var.deletion,
                alternative: var.insertion,
            });
        }
        if gnomad_vcf::looks_like_gnomad_vcf(definition) {
            let var = gnomad_vcf::parse(definition)?;
            // VCF/gnomAD positions are 1-based; VRS interbase coordinates
            // are 0-based, so the interbase start is one less.
            return Ok(RawVariant {
                accession_or_alias: var.chrom,
                start: var.pos - 1,
                reference: var.reference,
                alternative: var.alternative,
            });
        }
        if hgvs::looks_like_hgvs(definition) {
            let var = hgvs::parse(definition)?;
            return Ok(RawVariant {
                accession_or_alias: var.accession,
                start: var.pos - 1,
                reference: var.reference,
                alternative: var.alternative,
            });
        }
        Err(Error::UnknownNomenclature(definition.to_string()))
    }

    /// Trim any shared prefix/suffix between `reference` and `alternative`,
    /// then, for indels, left-shift the remaining interval through
    /// identical reference repeats so that two differently-anchored
    /// descriptions of the same biological event normalize to one
    /// `Allele` (spec.md §4.2, "fully-justified" normalization).
    fn normalize(
        &self,
        accession: &str,
        start: u64,
        reference: &str,
        alternative: &str,
    ) -> Result<(u64, u64, String)> {
        let ref_bytes = reference.as_bytes();
        let alt_bytes = alternative.as_bytes();

        let mut prefix = 0usize;
        while prefix < ref_bytes.len()
            && prefix < alt_bytes.len()
            && ref_bytes[prefix] == alt_bytes[prefix]
        {
            prefix += 1;
        }
        let mut suffix = 0usize;
        while suffix < ref_bytes.len() - prefix
            && suffix < alt_bytes.len() - prefix
            && ref_bytes[ref_bytes.len() - 1 - suffix] == alt_bytes[alt_bytes.len() - 1 - suffix]
        {
            suffix += 1;
        }

        let trimmed_ref_len = ref_bytes.len() - prefix - suffix;
        let trimmed_alt = &alternative[prefix..alternative.len() - suffix];

        let mut new_start = start + prefix as u64;
        let mut new_end = new_start + trimmed_ref_len as u64;
        let mut new_alt = trimmed_alt.to_string();

        // Pure insertions/deletions can be shifted left through identical
        // reference repeats; substitutions and delins with both sides
        // non-empty are already maximally trimmed above.
        if trimmed_ref_len == 0 && !new_alt.is_empty() {
            self.left_shift_insertion(accession, &mut new_start, &mut new_end, &mut new_alt)?;
        } else if trimmed_ref_len != 0 && new_alt.is_empty() {
            self.left_shift_deletion(accession, &mut new_start, &mut new_end)?;
        }

        Ok((new_start, new_end, new_alt))
    }

    fn left_shift_insertion(
        &self,
        accession: &str,
        start: &mut u64,
        end: &mut u64,
        alt: &mut String,
    ) -> Result<()> {
        loop {
            if *start == 0 {
                break;
            }
            let preceding = self.data_proxy.get_sequence(accession, *start - 1, *start)?;
            if preceding != alt[alt.len() - 1..] {
                break;
            }
            let shifted = format!("{preceding}{}", &alt[..alt.len() - 1]);
            *start -= 1;
            *end -= 1;
            *alt = shifted;
        }
        Ok(())
    }

    fn left_shift_deletion(&self, accession: &str, start: &mut u64, end: &mut u64) -> Result<()> {
        loop {
            if *start == 0 {
                break;
            }
            let deleted_last = self.data_proxy.get_sequence(accession, *end - 1, *end)?;
            let preceding = self.data_proxy.get_sequence(accession, *start - 1, *start)?;
            if preceding != deleted_last {
                break;
            }
            *start -= 1;
            *end -= 1;
        }
        Ok(())
    }
}

impl<D: DataProxy> Translator for CompositeTranslator<D> {
    fn translate(&self, definition: &str) -> Result<Allele> {
        let raw = self.parse_raw(definition)?;
        let accession = self
            .data_proxy
            .translate_sequence_identifier(&raw.accession_or_alias)?;
        let (start, end, alt) =
            self.normalize(&accession, raw.start, &raw.reference, &raw.alternative)?;
        Ok(Allele {
            location: SequenceLocation {
                sequence_reference: SequenceReference {
                    refget_accession: accession,
                },
                start,
                end,
            },
            state: AlleleState::LiteralSequenceExpression { sequence: alt },
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dataproxy::LocalDataProxy;
    use pretty_assertions::assert_eq;

    fn translator() -> CompositeTranslator<LocalDataProxy> {
        CompositeTranslator::new(
            LocalDataProxy::new()
                .with_alias("NC_000007.14", "SQ.chr7")
                .with_alias("7", "SQ.chr7")
                .with_alias("NC_000010.11", "SQ.chr10")
                .with_alias("SQ.chr7", "SQ.chr7")
                .with_sequence("SQ.chr7", "ACGTACGTAAGGTT")
                .with_sequence("SQ.chr10", "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAACT"),
        )
    }

    #[test]
    fn translates_spdi_substitution() {
        let allele = translator().translate("NC_000007.14:1:A:T").unwrap();
        assert_eq!(allele.location.start, 1);
        assert_eq!(allele.location.end, 2);
        assert_eq!(
            allele.state,
            AlleleState::LiteralSequenceExpression {
                sequence: "T".to_string()
            }
        );
    }

    #[test]
    fn translates_gnomad_vcf_equivalent_to_spdi() {
        // gnomAD/VCF pos=2 (1-based) is the same reference base as SPDI
        // interbase position 1.
        let from_vcf = translator().translate("7-2-A-T").unwrap();
        let from_spdi = translator().translate("SQ.chr7:1:A:T").unwrap();
        assert_eq!(from_vcf.id(), from_spdi.id());
    }

    #[test]
    fn trims_shared_prefix_and_suffix() {
        // ref="ACG", alt="ATG" -> shared prefix "A", shared suffix "G",
        // leaving a single-base substitution C>T at the middle position.
        let proxy = LocalDataProxy::new()
            .with_alias("chr1", "SQ.x")
            .with_sequence("SQ.x", "AAAAAAAAAA");
        let t = CompositeTranslator::new(proxy);
        let (start, end, alt) = t.normalize("SQ.x", 10, "ACG", "ATG").unwrap();
        assert_eq!(start, 11);
        assert_eq!(end, 12);
        assert_eq!(alt, "T");
    }

    #[test]
    fn unknown_nomenclature_errors() {
        let err = translator().translate("not a variant string").unwrap_err();
        assert!(matches!(err, Error::UnknownNomenclature(_)));
    }

    #[test]
    fn unresolvable_alias_propagates_error() {
        let err = translator().translate("chrZZZ:1:A:T").unwrap_err();
        assert!(matches!(err, Error::UnresolvedAlias(_)));
    }
}
