use core::fmt;
use serde_derive::Serialize;
use std::{collections::BTreeSet, str::FromStr};

/// Structural variant classes, in the order they are declared in the VCF header
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize)]
pub enum SvType {
    #[serde(rename = "INS")]
    Ins,
    #[serde(rename = "DEL")]
    Del,
    #[serde(rename = "DUP")]
    Dup,
    #[serde(rename = "INV")]
    Inv,
    #[serde(rename = "TRA")]
    Tra,
}

impl SvType {
    pub const ALL: [SvType; 5] = [SvType::Ins, SvType::Del, SvType::Dup, SvType::Inv, SvType::Tra];

    pub fn as_str(&self) -> &'static str {
        match self {
            SvType::Ins => "INS",
            SvType::Del => "DEL",
            SvType::Dup => "DUP",
            SvType::Inv => "INV",
            SvType::Tra => "TRA",
        }
    }
}

impl fmt::Display for SvType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseSvTypeError(pub String);

impl FromStr for SvType {
    type Err = ParseSvTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INS" => Ok(SvType::Ins),
            "DEL" => Ok(SvType::Del),
            "DUP" => Ok(SvType::Dup),
            "INV" => Ok(SvType::Inv),
            "TRA" => Ok(SvType::Tra),
            _ => Err(ParseSvTypeError(s.to_string())),
        }
    }
}

/// Second breakend of a translocation
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct Mate {
    pub chrom: String,
    pub pos: i64,
}

/// One read's local evidence for a structural variant, as delivered by signature extraction.
///
/// `end` and `length` are both filled in at construction so downstream stages never need to
/// branch on how the extraction stage described the event.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Signature {
    pub chrom: String,
    /// 1-based position of the first breakend
    pub pos: i64,
    pub end: i64,
    pub length: i64,
    pub sv_type: SvType,
    pub readname: String,
    pub mapq: u8,
    pub mate: Option<Mate>,
}

impl Signature {
    /// Insertion or deletion signature described by its length
    pub fn new_indel(
        sv_type: SvType,
        chrom: String,
        pos: i64,
        length: i64,
        readname: String,
        mapq: u8,
    ) -> Self {
        let end = match sv_type {
            SvType::Del => pos + length,
            _ => pos,
        };
        Signature {
            chrom,
            pos,
            end,
            length,
            sv_type,
            readname,
            mapq,
            mate: None,
        }
    }

    /// Duplication or inversion signature described by its span
    pub fn new_span(
        sv_type: SvType,
        chrom: String,
        pos: i64,
        end: i64,
        readname: String,
        mapq: u8,
    ) -> Self {
        Signature {
            chrom,
            pos,
            end,
            length: end - pos,
            sv_type,
            readname,
            mapq,
            mate: None,
        }
    }

    pub fn new_translocation(
        chrom: String,
        pos: i64,
        mate: Mate,
        readname: String,
        mapq: u8,
    ) -> Self {
        Signature {
            chrom,
            pos,
            end: mate.pos,
            length: 0,
            sv_type: SvType::Tra,
            readname,
            mapq,
            mate: Some(mate),
        }
    }

    /// Size compared between signatures when deciding whether they describe the same event:
    /// the length for INS/DEL and the span for DUP/INV. Translocations have no size, their
    /// agreement is measured on the mate breakend instead.
    pub fn identity_value(&self) -> i64 {
        self.length
    }

    pub fn mate_chrom(&self) -> Option<&str> {
        self.mate.as_ref().map(|m| m.chrom.as_str())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mate {
            Some(mate) => write!(
                formatter,
                "{} {}:{}-{}:{} {}",
                self.sv_type, self.chrom, self.pos, mate.chrom, mate.pos, self.readname
            ),
            None => write!(
                formatter,
                "{} {}:{}-{} len={} {}",
                self.sv_type, self.chrom, self.pos, self.end, self.length, self.readname
            ),
        }
    }
}

/// Normalised similarity of two non-negative size values, 1 when both are zero
pub fn size_identity(a: f64, b: f64) -> f64 {
    let longest = a.max(b);
    if longest <= 0.0 {
        return 1.0;
    }
    1.0 - (a - b).abs() / longest
}

/// Spatially coherent group of same-type signatures at one locus
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Cluster {
    pub chrom: String,
    pub sv_type: SvType,
    pub mate_chrom: Option<String>,
    pub signatures: Vec<Signature>,
    pub start: i64,
    pub end: i64,
}

impl Cluster {
    /// Open a new cluster seeded with a single signature
    pub fn new(seed: Signature) -> Self {
        Cluster {
            chrom: seed.chrom.clone(),
            sv_type: seed.sv_type,
            mate_chrom: seed.mate_chrom().map(String::from),
            start: seed.pos,
            end: seed.pos,
            signatures: vec![seed],
        }
    }

    pub fn last_signature(&self) -> &Signature {
        // a cluster is never created empty
        &self.signatures[self.signatures.len() - 1]
    }

    /// Check whether a signature chains onto the last member within `max_bias`.
    /// Translocations must also chain on the mate breakend.
    pub fn accepts(&self, signature: &Signature, max_bias: i64) -> bool {
        let last = self.last_signature();
        if signature.pos - last.pos > max_bias {
            return false;
        }
        match (&last.mate, &signature.mate) {
            (Some(last_mate), Some(mate)) => {
                last_mate.chrom == mate.chrom && (mate.pos - last_mate.pos).abs() <= max_bias
            }
            (None, None) => true,
            _ => false,
        }
    }

    pub fn push(&mut self, signature: Signature) {
        self.start = self.start.min(signature.pos);
        self.end = self.end.max(signature.pos);
        self.signatures.push(signature);
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {}:{}-{} (signatures={})",
            self.sv_type,
            self.chrom,
            self.start,
            self.end,
            self.signatures.len()
        )
    }
}

/// Consensus of one sub-group of a cluster, representing a single putative allele
#[derive(Debug, PartialEq, Clone)]
pub struct BreakpointCandidate {
    pub chrom: String,
    pub sv_type: SvType,
    pub pos: i64,
    pub end: i64,
    /// unsigned size of the event, 0 for translocations
    pub length: i64,
    pub mate: Option<Mate>,
    /// minimum pairwise size identity among the members, mate breakend agreement for TRA
    pub identity: f64,
    /// largest distance of a member position from `pos`
    pub pos_spread: i64,
    /// largest distance of a member end (mate position for TRA) from `end`
    pub end_spread: i64,
    pub signatures: Vec<Signature>,
}

impl BreakpointCandidate {
    /// Number of distinct reads supporting the candidate
    pub fn support(&self) -> usize {
        self.supporting_reads().len()
    }

    pub fn supporting_reads(&self) -> BTreeSet<&str> {
        self.signatures
            .iter()
            .map(|s| s.readname.as_str())
            .collect()
    }
}

impl fmt::Display for BreakpointCandidate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {}:{}-{} len={} identity={:.3} (support={})",
            self.sv_type,
            self.chrom,
            self.pos,
            self.end,
            self.length,
            self.identity,
            self.support()
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Genotype {
    Unknown,
    HomRef,
    Het,
    HomAlt,
}

impl fmt::Display for Genotype {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Genotype::Unknown => "./.",
            Genotype::HomRef => "0/0",
            Genotype::Het => "0/1",
            Genotype::HomAlt => "1/1",
        };
        write!(formatter, "{s}")
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct GenotypeCall {
    pub genotype: Genotype,
    /// reference-supporting reads
    pub dr: u32,
    /// variant-supporting reads
    pub dv: u32,
}

/// Final structural variant record, ready for serialization
#[derive(Debug, PartialEq, Clone)]
pub struct ResolvedCall {
    pub chrom: String,
    pub pos: i64,
    pub sv_type: SvType,
    /// signed length, negative for deletions and absent for translocations
    pub svlen: Option<i64>,
    pub end: i64,
    pub mate: Option<Mate>,
    pub precise: bool,
    /// symmetric half-widths of CIPOS and CIEND, only set on imprecise calls
    pub confidence_interval: Option<(i64, i64)>,
    /// RE, the number of distinct supporting reads
    pub support: usize,
    pub genotype: Option<GenotypeCall>,
    pub supporting_reads: Vec<String>,
}

impl fmt::Display for ResolvedCall {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mate {
            Some(mate) => write!(
                formatter,
                "{} {}:{}-{}:{} (RE={})",
                self.sv_type, self.chrom, self.pos, mate.chrom, mate.pos, self.support
            ),
            None => write!(
                formatter,
                "{} {}:{}-{} (RE={})",
                self.sv_type, self.chrom, self.pos, self.end, self.support
            ),
        }
    }
}

/// Reference sequence name and length, in alignment-file header order
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct ContigInfo {
    pub name: String,
    pub length: u64,
}

impl ContigInfo {
    pub fn new(name: &str, length: u64) -> Self {
        ContigInfo {
            name: name.to_string(),
            length,
        }
    }
}
