use log::debug;

use crate::containers::{BreakpointCandidate, Genotype, GenotypeCall, ResolvedCall, SvType};
use crate::coverage::DepthCounter;
use crate::errors::CallerError;
use crate::settings::CallerSettings;
use crate::utils;

/// Classify a genotype from variant and reference read counts by allele fraction
pub fn call_genotype(dv: u32, dr: u32) -> Genotype {
    let total = dv + dr;
    if total == 0 {
        return Genotype::Unknown;
    }
    let allele_fraction = dv as f64 / total as f64;
    if allele_fraction >= utils::HOM_ALT_ALLELE_FRACTION_MIN {
        Genotype::HomAlt
    } else if allele_fraction >= utils::HET_ALLELE_FRACTION_MIN {
        Genotype::Het
    } else {
        Genotype::HomRef
    }
}

/// Genotype fields for a candidate given the total read depth at its locus
pub fn genotype_from_depth(support: usize, local_depth: u32) -> GenotypeCall {
    let dv = support as u32;
    let dr = local_depth.saturating_sub(dv);
    GenotypeCall {
        genotype: call_genotype(dv, dr),
        dr,
        dv,
    }
}

/// Turn an accepted candidate into a resolved call.
///
/// With genotyping enabled the local depth is read from `depth_counter`, and calls genotyped
/// 0/0 are suppressed (None). Without it the genotype is left empty and only RE is reported.
pub fn resolve_candidate(
    candidate: BreakpointCandidate,
    settings: &CallerSettings,
    depth_counter: Option<&mut (dyn DepthCounter + '_)>,
) -> Result<Option<ResolvedCall>, CallerError> {
    let support = candidate.support();
    let genotype = match depth_counter {
        Some(counter) if settings.genotype => {
            let local_depth = counter.local_depth(&candidate.chrom, candidate.pos)?;
            let genotype_call = genotype_from_depth(support, local_depth);
            if genotype_call.genotype == Genotype::HomRef {
                debug!(
                    "{} skipped: genotyped {} (DV={}, DR={})",
                    candidate, genotype_call.genotype, genotype_call.dv, genotype_call.dr
                );
                return Ok(None);
            }
            Some(genotype_call)
        }
        _ => None,
    };

    let precise = candidate.identity >= settings.precise_identity(candidate.sv_type);
    let confidence_interval = match precise {
        true => None,
        false => Some((candidate.pos_spread, candidate.end_spread)),
    };
    let svlen = match candidate.sv_type {
        SvType::Del => Some(-candidate.length),
        SvType::Tra => None,
        _ => Some(candidate.length),
    };
    let supporting_reads: Vec<String> = candidate
        .supporting_reads()
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Some(ResolvedCall {
        chrom: candidate.chrom,
        pos: candidate.pos,
        sv_type: candidate.sv_type,
        svlen,
        end: candidate.end,
        mate: candidate.mate,
        precise,
        confidence_interval,
        support,
        genotype,
        supporting_reads,
    }))
}
