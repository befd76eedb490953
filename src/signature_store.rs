use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::containers::{ContigInfo, Signature, SvType};
use crate::errors::CallerError;

/// Position-sorted signatures of one SV type on one chromosome
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SignaturePartition {
    /// index of the chromosome in the contig list, used for output ordering
    pub chrom_index: usize,
    pub chrom: String,
    pub sv_type: SvType,
    pub signatures: Vec<Signature>,
}

impl SignaturePartition {
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Collects the incoming signature stream of the current chromosome, keyed by SV type,
/// and hands the partitions over once the stream moves on to the next chromosome.
pub struct SignatureStore {
    contig_index: HashMap<String, usize>,
    min_mapq: u8,
    current_chrom: Option<String>,
    finished_chroms: HashSet<String>,
    partitions: BTreeMap<SvType, Vec<Signature>>,
    pub low_mapq_count: usize,
    pub signature_count: usize,
}

impl SignatureStore {
    pub fn new(contigs: &[ContigInfo], min_mapq: u8) -> Self {
        let contig_index = contigs
            .iter()
            .enumerate()
            .map(|(i, contig)| (contig.name.clone(), i))
            .collect();
        SignatureStore {
            contig_index,
            min_mapq,
            current_chrom: None,
            finished_chroms: HashSet::new(),
            partitions: BTreeMap::new(),
            low_mapq_count: 0,
            signature_count: 0,
        }
    }

    /// Add the next signature of the stream. Returns the completed partitions of the
    /// previous chromosome when this signature starts a new one.
    pub fn push(&mut self, signature: Signature) -> Result<Vec<SignaturePartition>, CallerError> {
        if !self.contig_index.contains_key(&signature.chrom) {
            return Err(CallerError::MalformedInput(format!(
                "signature on contig {} which is absent from the alignment header ({})",
                signature.chrom, signature
            )));
        }
        let mut completed = Vec::new();
        if self.current_chrom.as_deref() != Some(signature.chrom.as_str()) {
            if self.finished_chroms.contains(&signature.chrom) {
                return Err(CallerError::InputOrdering(format!(
                    "chromosome {} reappears after other chromosomes ({})",
                    signature.chrom, signature
                )));
            }
            completed = self.finish_chromosome();
            self.current_chrom = Some(signature.chrom.clone());
        }
        self.signature_count += 1;
        if signature.mapq < self.min_mapq {
            self.low_mapq_count += 1;
            return Ok(completed);
        }
        let partition = self.partitions.entry(signature.sv_type).or_default();
        if let Some(prev) = partition.last() {
            if signature.pos < prev.pos {
                return Err(CallerError::InputOrdering(format!(
                    "{} {} position {} follows position {}",
                    signature.chrom, signature.sv_type, signature.pos, prev.pos
                )));
            }
        }
        partition.push(signature);
        Ok(completed)
    }

    /// Flush the partitions of the chromosome currently being collected
    pub fn finish_chromosome(&mut self) -> Vec<SignaturePartition> {
        let Some(chrom) = self.current_chrom.take() else {
            return Vec::new();
        };
        let chrom_index = self.contig_index.get(&chrom).copied().unwrap_or(usize::MAX);
        let partitions: Vec<SignaturePartition> = std::mem::take(&mut self.partitions)
            .into_iter()
            .filter(|(_, signatures)| !signatures.is_empty())
            .map(|(sv_type, signatures)| SignaturePartition {
                chrom_index,
                chrom: chrom.clone(),
                sv_type,
                signatures,
            })
            .collect();
        debug!(
            "{}: {} partitions with {} signatures collected",
            chrom,
            partitions.len(),
            partitions.iter().map(|p| p.len()).sum::<usize>()
        );
        self.finished_chroms.insert(chrom);
        partitions
    }
}
