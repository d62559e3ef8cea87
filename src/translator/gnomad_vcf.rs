//! gnomAD/VCF-style variant strings: `<chrom>-<pos>-<ref>-<alt>`, with
//! 1-based `pos` as in VCF itself.

use crate::error::Error;

/// A parsed gnomAD/VCF-style variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub chrom: String,
    /// 1-based position of the first reference base.
    pub pos: u64,
    pub reference: String,
    pub alternative: String,
}

/// Detect whether `definition` looks like a gnomAD/VCF string: exactly
/// four hyphen-separated fields with a purely numeric second field.
///
/// Chromosome names themselves never contain hyphens in this nomenclature
/// (`1`..`22`, `X`, `Y`, `M`/`MT`), so a naive split is unambiguous.
pub fn looks_like_gnomad_vcf(definition: &str) -> bool {
    let parts: Vec<&str> = definition.split('-').collect();
    parts.len() == 4 && !parts[1].is_empty() && parts[1].chars().all(|c| c.is_ascii_digit())
}

/// Parse a gnomAD/VCF-style definition string.
pub fn parse(definition: &str) -> Result<Var, Error> {
    let parts: Vec<&str> = definition.split('-').collect();
    if parts.len() != 4 {
        return Err(Error::Translation(format!(
            "expected 4 hyphen-separated fields in gnomAD/VCF variant: {definition}"
        )));
    }
    let pos = parts[1]
        .parse::<u64>()
        .map_err(|e| Error::Translation(format!("bad gnomAD/VCF position: {e}")))?;
    Ok(Var {
        chrom: parts[0].to_string(),
        pos,
        reference: parts[2].to_string(),
        alternative: parts[3].to_string(),
    })
}
