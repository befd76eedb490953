use log::debug;
use std::collections::BTreeMap;

use crate::containers::{Cluster, Signature, SvType};
use crate::errors::CallerError;

/// Group the position-sorted signatures of one (chromosome, SV type) partition into clusters.
///
/// Walks the signatures once, holding at most one open cluster per mate chromosome (a single
/// open cluster for every type but TRA). A signature joins the open cluster when it lies within
/// `max_cluster_bias` of the cluster's last member, otherwise the open cluster is closed and a
/// new one is seeded. Open clusters that fall more than `max_cluster_bias` behind the current
/// position are closed as the walk advances, so memory stays bounded by the number of mate
/// chromosomes.
pub fn find_clusters(
    chrom: &str,
    sv_type: SvType,
    signatures: Vec<Signature>,
    max_cluster_bias: i64,
) -> Result<Vec<Cluster>, CallerError> {
    let mut open_clusters: BTreeMap<Option<String>, Cluster> = BTreeMap::new();
    let mut clusters = Vec::new();
    let mut prev_pos: Option<i64> = None;

    for signature in signatures {
        if signature.chrom != chrom || signature.sv_type != sv_type {
            return Err(CallerError::MalformedInput(format!(
                "signature {} does not belong to partition {} {}",
                signature, chrom, sv_type
            )));
        }
        if let Some(prev) = prev_pos {
            if signature.pos < prev {
                return Err(CallerError::InputOrdering(format!(
                    "{} {} position {} follows position {}",
                    chrom, sv_type, signature.pos, prev
                )));
            }
        }
        prev_pos = Some(signature.pos);

        close_stale_clusters(
            &mut open_clusters,
            &mut clusters,
            signature.pos,
            max_cluster_bias,
        );

        let key = signature.mate_chrom().map(String::from);
        match open_clusters.get_mut(&key) {
            Some(cluster) if cluster.accepts(&signature, max_cluster_bias) => {
                cluster.push(signature);
            }
            _ => {
                if let Some(closed) = open_clusters.insert(key, Cluster::new(signature)) {
                    clusters.push(closed);
                }
            }
        }
    }
    clusters.extend(open_clusters.into_values());
    clusters.sort_by(|a, b| {
        (a.start, &a.mate_chrom, a.end).cmp(&(b.start, &b.mate_chrom, b.end))
    });

    for cluster in clusters.iter() {
        debug!("{}", cluster);
    }
    Ok(clusters)
}

/// Close every open cluster whose last member is too far behind `pos` to accept anything else
fn close_stale_clusters(
    open_clusters: &mut BTreeMap<Option<String>, Cluster>,
    clusters: &mut Vec<Cluster>,
    pos: i64,
    max_cluster_bias: i64,
) {
    let stale_keys: Vec<Option<String>> = open_clusters
        .iter()
        .filter(|(_, cluster)| pos - cluster.last_signature().pos > max_cluster_bias)
        .map(|(key, _)| key.clone())
        .collect();
    for key in stale_keys {
        if let Some(cluster) = open_clusters.remove(&key) {
            clusters.push(cluster);
        }
    }
}
