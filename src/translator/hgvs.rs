//! A reduced HGVS genomic (`g.`) parser.
//!
//! Full HGVS normalization — transcript-relative coordinates, liftover,
//! intronic offsets, the complete variant grammar — is the external
//! translation library spec.md §1 places out of scope. This module covers
//! the genomic substitution/deletion/insertion/delins grammar needed to
//! reproduce spec.md's worked example (`NC_000010.11:g.87894077C>T`) and
//! returns `TranslationError` for anything wider (duplications, repeats,
//! uncertain positions, intronic/protein/RNA coordinates) rather than
//! silently mis-translating them.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::Error;

/// A parsed genomic HGVS variant, already in the un-normalized primitives
/// a SPDI/gnomAD-VCF parse would also produce: accession, 1-based
/// position of the first affected reference base, reference bases
/// removed, bases inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub accession: String,
    pub pos: u64,
    pub reference: String,
    pub alternative: String,
}

fn substitution_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<acc>[^:]+):g\.(?P<pos>\d+)(?P<ref>[ACGTNacgtn]+)>(?P<alt>[ACGTNacgtn]+)$")
            .unwrap()
    })
}

fn deletion_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<acc>[^:]+):g\.(?P<start>\d+)(_(?P<end>\d+))?del(?P<seq>[ACGTNacgtn]*)$")
            .unwrap()
    })
}

fn insertion_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<acc>[^:]+):g\.(?P<start>\d+)_(?P<end>\d+)ins(?P<seq>[ACGTNacgtn]+)$")
            .unwrap()
    })
}

fn delins_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<acc>[^:]+):g\.(?P<start>\d+)(_(?P<end>\d+))?delins(?P<seq>[ACGTNacgtn]+)$",
        )
        .unwrap()
    })
}

/// Detect whether `definition` looks like genomic HGVS (`acc:g....`).
pub fn looks_like_hgvs(definition: &str) -> bool {
    definition.contains(":g.")
}

/// Parse a reduced-grammar genomic HGVS definition. The caller still needs
/// the reference sequence (via `DataProxy`) to fill in `reference` for
/// `ins`/pure insertions, since HGVS does not spell it out.
pub fn parse(definition: &str) -> Result<Var, Error> {
    if let Some(caps) = substitution_re().captures(definition) {
        let pos: u64 = caps["pos"].parse().unwrap();
        return Ok(Var {
            accession: caps["acc"].to_string(),
            pos,
            reference: caps["ref"].to_uppercase(),
            alternative: caps["alt"].to_uppercase(),
        });
    }
    if let Some(caps) = delins_re().captures(definition) {
        let start: u64 = caps["start"].parse().unwrap();
        let end: u64 = caps
            .name("end")
            .map(|m| m.as_str().parse().unwrap())
            .unwrap_or(start);
        if end < start {
            return Err(Error::Translation(format!(
                "HGVS delins range end before start: {definition}"
            )));
        }
        return Ok(Var {
            accession: caps["acc"].to_string(),
            pos: start,
            // `reference` is filled in by the caller from the accession's
            // sequence at [start-1, end); we only know its length here.
            reference: "N".repeat((end - start + 1) as usize),
            alternative: caps["seq"].to_uppercase(),
        });
    }
    if let Some(caps) = deletion_re().captures(definition) {
        let start: u64 = caps["start"].parse().unwrap();
        let end: u64 = caps
            .name("end")
            .map(|m| m.as_str().parse().unwrap())
            .unwrap_or(start);
        if end < start {
            return Err(Error::Translation(format!(
                "HGVS deletion range end before start: {definition}"
            )));
        }
        return Ok(Var {
            accession: caps["acc"].to_string(),
            pos: start,
            reference: "N".repeat((end - start + 1) as usize),
            alternative: String::new(),
        });
    }
    if let Some(caps) = insertion_re().captures(definition) {
        let start: u64 = caps["start"].parse().unwrap();
        let end: u64 = caps["end"].parse().unwrap();
        if end != start + 1 {
            return Err(Error::Translation(format!(
                "HGVS insertion anchors must be adjacent: {definition}"
            )));
        }
        return Ok(Var {
            accession: caps["acc"].to_string(),
            // Insertion between start and end; anchor the un-normalized
            // interval at the base immediately after `start`.
            pos: end,
            reference: String::new(),
            alternative: caps["seq"].to_uppercase(),
        });
    }
    Err(Error::Translation(format!(
        "unsupported HGVS grammar (dup/repeat/uncertain/non-genomic not implemented): {definition}"
    )))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_substitution() {
        let var = parse("NC_000010.11:g.87894077C>T").unwrap();
        assert_eq!(var.accession, "NC_000010.11");
        assert_eq!(var.pos, 87894077);
        assert_eq!(var.reference, "C");
        assert_eq!(var.alternative, "T");
    }

    #[test]
    fn parses_deletion_with_range() {
        let var = parse("NC_000001.11:g.100_102del").unwrap();
        assert_eq!(var.pos, 100);
        assert_eq!(var.reference.len(), 3);
        assert_eq!(var.alternative, "");
    }

    #[test]
    fn detects_shape() {
        assert!(looks_like_hgvs("NC_000010.11:g.87894077C>T"));
        assert!(!looks_like_hgvs("7-140753335-A-T"));
    }

    #[test]
    fn rejects_unsupported_grammar() {
        assert!(parse("NC_000001.11:g.100dup").is_err());
        assert!(parse("NM_000000.1:c.100A>T").is_err());
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(parse("NC_000001.11:g.102_100del").is_err());
    }
}
