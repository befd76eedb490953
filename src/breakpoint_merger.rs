use log::debug;

use crate::containers::{size_identity, BreakpointCandidate, Cluster, Mate, Signature, SvType};
use crate::settings::TypeSettings;
use crate::utils::get_median;

/// Signatures attached to one putative allele while a cluster is being split
struct SubGroup {
    signatures: Vec<Signature>,
    mean_size: f64,
}

impl SubGroup {
    fn new(signature: Signature) -> Self {
        SubGroup {
            mean_size: signature.identity_value() as f64,
            signatures: vec![signature],
        }
    }

    fn push(&mut self, signature: Signature) {
        let count = self.signatures.len() as f64;
        self.mean_size =
            (self.mean_size * count + signature.identity_value() as f64) / (count + 1.0);
        self.signatures.push(signature);
    }
}

/// Split a cluster into breakpoint candidates, one per distinct allele.
///
/// Signatures are visited in arrival order and attached to the first sub-group whose running
/// mean size has an identity of at least `diff_ratio_merging` with the signature, otherwise
/// they start a new sub-group. Without a merging ratio the whole cluster forms one candidate.
pub fn merge_breakpoints(cluster: Cluster, type_settings: &TypeSettings) -> Vec<BreakpointCandidate> {
    let Cluster {
        chrom,
        sv_type,
        mate_chrom,
        signatures,
        ..
    } = cluster;

    let mut sub_groups: Vec<SubGroup> = Vec::new();
    for signature in signatures {
        let group_idx_opt = match type_settings.diff_ratio_merging {
            None => (!sub_groups.is_empty()).then_some(0),
            Some(ratio) => sub_groups.iter().position(|group| {
                size_identity(group.mean_size, signature.identity_value() as f64) >= ratio
            }),
        };
        match group_idx_opt {
            Some(group_idx) => sub_groups[group_idx].push(signature),
            None => sub_groups.push(SubGroup::new(signature)),
        }
    }

    let candidates: Vec<BreakpointCandidate> = sub_groups
        .into_iter()
        .filter_map(|group| {
            build_candidate(
                &chrom,
                sv_type,
                mate_chrom.as_deref(),
                group.signatures,
                type_settings.max_cluster_bias,
            )
        })
        .collect();
    if candidates.len() > 1 {
        debug!(
            "{} {}: cluster split into {} candidates",
            sv_type,
            chrom,
            candidates.len()
        );
    }
    candidates
}

/// Consensus of a sub-group: median position, size and end of its members
fn build_candidate(
    chrom: &str,
    sv_type: SvType,
    mate_chrom: Option<&str>,
    signatures: Vec<Signature>,
    max_cluster_bias: i64,
) -> Option<BreakpointCandidate> {
    let member_positions: Vec<i64> = signatures.iter().map(|s| s.pos).collect();
    let member_sizes: Vec<i64> = signatures.iter().map(|s| s.identity_value()).collect();
    let member_ends: Vec<i64> = signatures.iter().map(|s| s.end).collect();

    let pos = get_median(&member_positions)?;
    let (end, length, mate) = match sv_type {
        SvType::Ins => (pos, get_median(&member_sizes)?, None),
        SvType::Del => {
            let length = get_median(&member_sizes)?;
            (pos.saturating_add(length), length, None)
        }
        SvType::Dup | SvType::Inv => {
            let end = get_median(&member_ends)?;
            (end, end - pos, None)
        }
        SvType::Tra => {
            let mate_pos = get_median(&member_ends)?;
            let mate = Mate {
                chrom: mate_chrom?.to_string(),
                pos: mate_pos,
            };
            (mate_pos, 0, Some(mate))
        }
    };

    let pos_spread = member_positions
        .iter()
        .map(|p| (p - pos).abs())
        .max()
        .unwrap_or(0);
    let end_spread = member_ends
        .iter()
        .map(|e| (e - end).abs())
        .max()
        .unwrap_or(0);

    let identity = match sv_type {
        SvType::Tra => breakend_agreement(end_spread, max_cluster_bias),
        // identity is min(a, b) / max(a, b) for non-negative sizes, so the smallest pairwise
        // identity is the one between the smallest and the largest member
        _ => match (member_sizes.iter().min(), member_sizes.iter().max()) {
            (Some(smallest), Some(largest)) => size_identity(*smallest as f64, *largest as f64),
            _ => 1.0,
        },
    };

    Some(BreakpointCandidate {
        chrom: chrom.to_string(),
        sv_type,
        pos,
        end,
        length,
        mate,
        identity,
        pos_spread,
        end_spread,
        signatures,
    })
}

/// Agreement of translocation mate breakends: 1 when every mate position equals the
/// consensus, falling linearly to 0 at a spread of `max_cluster_bias`
fn breakend_agreement(mate_spread: i64, max_cluster_bias: i64) -> f64 {
    if mate_spread == 0 {
        return 1.0;
    }
    if max_cluster_bias <= 0 {
        return 0.0;
    }
    (1.0 - mate_spread as f64 / max_cluster_bias as f64).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::CallerSettings;
    use crate::utils::{create_test_signature, create_test_translocation};

    fn default_type_settings(sv_type: SvType) -> TypeSettings {
        CallerSettings::default().type_settings(sv_type).clone()
    }

    fn cluster_from(signatures: Vec<Signature>) -> Cluster {
        let mut iter = signatures.into_iter();
        let mut cluster = Cluster::new(iter.next().unwrap());
        for signature in iter {
            cluster.push(signature);
        }
        cluster
    }

    #[test]
    fn test_similar_insertions_merge() {
        let cluster = cluster_from(vec![
            create_test_signature(SvType::Ins, "chr1", 2000, 1000, "read1"),
            create_test_signature(SvType::Ins, "chr1", 2010, 1005, "read2"),
        ]);
        let candidates = merge_breakpoints(cluster, &default_type_settings(SvType::Ins));
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.length, 1002);
        assert_eq!(candidate.pos, 2005);
        assert_eq!(candidate.end, 2005);
        assert!((candidate.identity - (1.0 - 5.0 / 1005.0)).abs() < 1e-9);
        assert_eq!(candidate.support(), 2);
    }

    #[test]
    fn test_distinct_alleles_split() {
        let cluster = cluster_from(vec![
            create_test_signature(SvType::Ins, "chr1", 2000, 100, "read1"),
            create_test_signature(SvType::Ins, "chr1", 2001, 1000, "read2"),
            create_test_signature(SvType::Ins, "chr1", 2002, 110, "read3"),
            create_test_signature(SvType::Ins, "chr1", 2003, 990, "read4"),
        ]);
        let candidates = merge_breakpoints(cluster, &default_type_settings(SvType::Ins));
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].length, 105);
        assert_eq!(candidates[0].signatures.len(), 2);
        assert_eq!(candidates[1].length, 995);
        assert_eq!(candidates[1].signatures.len(), 2);
    }

    #[test]
    fn test_deletion_consensus_end() {
        let cluster = cluster_from(vec![
            create_test_signature(SvType::Del, "chr1", 1000, 500, "read1"),
            create_test_signature(SvType::Del, "chr1", 1005, 510, "read2"),
            create_test_signature(SvType::Del, "chr1", 1010, 490, "read3"),
        ]);
        let candidates = merge_breakpoints(cluster, &default_type_settings(SvType::Del));
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!((candidate.pos, candidate.length, candidate.end), (1005, 500, 1505));
        assert_eq!(candidate.pos_spread, 5);
        // member ends 1500, 1515, 1500
        assert_eq!(candidate.end_spread, 10);
        assert!((candidate.identity - 490.0 / 510.0).abs() < 1e-9);
    }

    #[test]
    fn test_unmerged_types_form_single_candidate() {
        let cluster = cluster_from(vec![
            create_test_signature(SvType::Dup, "chr1", 1000, 100, "read1"),
            create_test_signature(SvType::Dup, "chr1", 1100, 5000, "read2"),
            create_test_signature(SvType::Dup, "chr1", 1200, 200, "read3"),
        ]);
        let candidates = merge_breakpoints(cluster, &default_type_settings(SvType::Dup));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].pos, 1100);
        assert_eq!(candidates[0].end, 1400);
        assert_eq!(candidates[0].length, 300);
        assert!((candidates[0].identity - 100.0 / 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_translocation_candidate_carries_mate() {
        let cluster = cluster_from(vec![
            create_test_translocation("chr1", 5000, "chr2", 9000, "read1"),
            create_test_translocation("chr1", 5010, "chr2", 9040, "read2"),
            create_test_translocation("chr1", 5020, "chr2", 9010, "read3"),
        ]);
        let candidates = merge_breakpoints(cluster, &default_type_settings(SvType::Tra));
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(
            candidate.mate,
            Some(Mate {
                chrom: "chr2".to_string(),
                pos: 9010
            })
        );
        assert_eq!(candidate.end, 9010);
        assert_eq!(candidate.length, 0);
        assert_eq!(candidate.end_spread, 30);
        // 30 bp mate spread against the 50 bp translocation bias
        assert!((candidate.identity - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_translocation_identity_independent_of_coordinates() {
        let mate_offsets = [10, 30, 50];
        let mut identities = Vec::new();
        for shift in [0, 1_000_000, 150_000_000] {
            let cluster = cluster_from(
                mate_offsets
                    .iter()
                    .enumerate()
                    .map(|(i, offset)| {
                        create_test_translocation(
                            "chr1",
                            5000 + shift + i as i64,
                            "chr2",
                            offset + shift,
                            &format!("read{i}"),
                        )
                    })
                    .collect(),
            );
            let candidates = merge_breakpoints(cluster, &default_type_settings(SvType::Tra));
            assert_eq!(candidates.len(), 1);
            identities.push(candidates[0].identity);
        }
        assert!((identities[0] - 0.6).abs() < 1e-9);
        assert!(identities.iter().all(|identity| *identity == identities[0]));
    }

    #[test]
    fn test_breakend_agreement_bounds() {
        assert_eq!(breakend_agreement(0, 50), 1.0);
        assert_eq!(breakend_agreement(0, 0), 1.0);
        assert_eq!(breakend_agreement(5, 0), 0.0);
        assert_eq!(breakend_agreement(50, 50), 0.0);
        assert_eq!(breakend_agreement(80, 50), 0.0);
        assert!((breakend_agreement(10, 50) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_identical_sizes_have_full_identity() {
        let cluster = cluster_from(vec![
            create_test_signature(SvType::Inv, "chr1", 1000, 300, "read1"),
            create_test_signature(SvType::Inv, "chr1", 1000, 300, "read2"),
        ]);
        let candidates = merge_breakpoints(cluster, &default_type_settings(SvType::Inv));
        assert_eq!(candidates[0].identity, 1.0);
        assert_eq!(candidates[0].pos_spread, 0);
    }
}
