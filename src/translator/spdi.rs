//! SPDI-format variant strings.
//!
//! Also see:
//!
//! - Holmes JB, Moyer E, Phan L, Maglott D, Kattman B. [SPDI: data model for
//!   variants and applications at NCBI](https://www.ncbi.nlm.nih.gov/pmc/articles/PMC7523648/).
//!   Bioinformatics. 2020 Mar 1;36(6):1902-1907.
//!
//! SPDI position is zero-based interbase, matching VRS's own coordinate
//! convention directly (unlike HGVS and gnomAD-VCF, which are 1-based and
//! require conversion).

use std::{fmt::Display, str::FromStr};

use crate::error::Error;

/// A variant in SPDI format: `<sequence>:<position>:<deletion>:<insertion>`.
///
/// # Example
///
/// ```
/// use std::str::FromStr;
/// use anyvar::translator::spdi::Var;
///
/// let var = Var::from_str("NC_000007.14:140753335:A:T").unwrap();
/// assert_eq!(format!("{}", &var), "NC_000007.14:140753335:A:T");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    /// Sequence accession or alias.
    pub sequence: String,
    /// Zero-based interbase position of the deletion's start.
    pub position: u64,
    /// Deleted reference base string (may be empty for pure insertions).
    pub deletion: String,
    /// Inserted base string (may be empty for pure deletions).
    pub insertion: String,
}

impl FromStr for Var {
    type Err = Error;

    fn from_str(spdi: &str) -> Result<Self, Self::Err> {
        let mut parts = spdi.splitn(4, ':');
        let sequence = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Translation(format!("missing sequence in SPDI: {spdi}")))?
            .to_string();
        let position = parts
            .next()
            .ok_or_else(|| Error::Translation(format!("missing position in SPDI: {spdi}")))?
            .parse::<u64>()
            .map_err(|e| Error::Translation(format!("bad SPDI position: {e}")))?;
        let deletion = parts
            .next()
            .ok_or_else(|| Error::Translation(format!("missing deletion in SPDI: {spdi}")))?
            .to_string();
        let insertion = parts
            .next()
            .ok_or_else(|| Error::Translation(format!("missing insertion in SPDI: {spdi}")))?
            .to_string();
        if parts.next().is_some() {
            return Err(Error::Translation(format!("too many fields in SPDI: {spdi}")));
        }
        Ok(Self {
            sequence,
            position,
            deletion,
            insertion,
        })
    }
}

impl Display for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.sequence, self.position, self.deletion, self.insertion
        )
    }
}

/// Detect whether `definition` looks like an SPDI string: four
/// colon-separated fields with a purely numeric second field.
pub fn looks_like_spdi(definition: &str) -> bool {
    let parts: Vec<&str> = definition.split(':').collect();
    parts.len() == 4 && parts[1].chars().all(|c| c.is_ascii_digit()) && !parts[1].is_empty()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_snv() {
        let var = Var::from_str("NC_000007.14:140753335:A:T").unwrap();
        assert_eq!(var.sequence, "NC_000007.14");
        assert_eq!(var.position, 140753335);
        assert_eq!(var.deletion, "A");
        assert_eq!(var.insertion, "T");
    }

    #[test]
    fn roundtrips_through_display() {
        let s = "NC_000007.14:140753335:A:T";
        assert_eq!(Var::from_str(s).unwrap().to_string(), s);
    }

    #[test]
    fn detects_spdi_shape() {
        assert!(looks_like_spdi("NC_000007.14:140753335:A:T"));
        assert!(!looks_like_spdi("7-140753335-A-T"));
        assert!(!looks_like_spdi("NC_000010.11:g.87894077C>T"));
    }

    #[test]
    fn rejects_malformed_spdi() {
        assert!(Var::from_str("NC_000007.14:not-a-number:A:T").is_err());
        assert!(Var::from_str("NC_000007.14:1:A").is_err());
    }
}
