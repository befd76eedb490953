use log::{debug, error, info};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::time::SystemTime;

use crate::breakpoint_merger::merge_breakpoints;
use crate::cluster_filter::{filter_candidate, DropReason};
use crate::cluster_finder::find_clusters;
use crate::containers::{ContigInfo, ResolvedCall, Signature};
use crate::coverage::DepthSource;
use crate::errors::CallerError;
use crate::genotyper::resolve_candidate;
use crate::settings::CallerSettings;
use crate::signature_store::{SignaturePartition, SignatureStore};

/// Counts gathered over a run, summed across partitions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub signatures: usize,
    pub low_mapq_signatures: usize,
    pub partitions: usize,
    pub clusters: usize,
    pub candidates: usize,
    pub insufficient_support: usize,
    pub low_identity: usize,
    pub too_short: usize,
    pub genotype_suppressed: usize,
    pub calls: usize,
}

impl RunStats {
    fn add(&mut self, other: &RunStats) {
        self.signatures += other.signatures;
        self.low_mapq_signatures += other.low_mapq_signatures;
        self.partitions += other.partitions;
        self.clusters += other.clusters;
        self.candidates += other.candidates;
        self.insufficient_support += other.insufficient_support;
        self.low_identity += other.low_identity;
        self.too_short += other.too_short;
        self.genotype_suppressed += other.genotype_suppressed;
        self.calls += other.calls;
    }

    fn count_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::InsufficientSupport => self.insufficient_support += 1,
            DropReason::LowIdentity => self.low_identity += 1,
            DropReason::TooShort => self.too_short += 1,
        }
    }

    pub fn log_summary(&self) {
        info!(
            "Signatures read: {} ({} discarded for low MAPQ)",
            self.signatures, self.low_mapq_signatures
        );
        info!(
            "Partitions: {}, clusters: {}, breakpoint candidates: {}",
            self.partitions, self.clusters, self.candidates
        );
        info!(
            "Candidates filtered: {} insufficient support, {} low identity, {} too short, {} genotyped 0/0",
            self.insufficient_support, self.low_identity, self.too_short, self.genotype_suppressed
        );
        info!("Structural variant calls: {}", self.calls);
    }
}

/// Calls of one partition, in ascending position order
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionResult {
    pub chrom_index: usize,
    pub calls: Vec<ResolvedCall>,
    pub stats: RunStats,
}

/// All calls of a run in output order
#[derive(Debug, Clone, PartialEq)]
pub struct CallSet {
    pub calls: Vec<ResolvedCall>,
    pub stats: RunStats,
}

/// Run one (chromosome, SV type) partition through clustering, merging, filtering
/// and genotyping.
pub fn process_partition(
    partition: SignaturePartition,
    settings: &CallerSettings,
    depth_source: Option<&dyn DepthSource>,
) -> Result<PartitionResult, CallerError> {
    let SignaturePartition {
        chrom_index,
        chrom,
        sv_type,
        signatures,
    } = partition;
    let type_settings = settings.type_settings(sv_type);
    let mut stats = RunStats {
        partitions: 1,
        ..RunStats::default()
    };

    let mut depth_counter = match (settings.genotype, depth_source) {
        (true, Some(source)) => Some(source.depth_counter()?),
        (true, None) => {
            return Err(CallerError::Configuration(
                "genotyping is enabled but no read depth source is available".to_string(),
            ))
        }
        (false, _) => None,
    };

    let clusters = find_clusters(&chrom, sv_type, signatures, type_settings.max_cluster_bias)?;
    stats.clusters = clusters.len();

    let mut calls = Vec::new();
    for cluster in clusters {
        for candidate in merge_breakpoints(cluster, type_settings) {
            stats.candidates += 1;
            if let Err(reason) = filter_candidate(&candidate, settings) {
                stats.count_drop(reason);
                continue;
            }
            match resolve_candidate(candidate, settings, depth_counter.as_deref_mut())? {
                Some(call) => calls.push(call),
                None => stats.genotype_suppressed += 1,
            }
        }
    }
    calls.sort_by(|a, b| (a.pos, a.end, a.svlen).cmp(&(b.pos, b.end, b.svlen)));
    stats.calls = calls.len();
    debug!(
        "{} {}: {} clusters, {} calls",
        chrom, sv_type, stats.clusters, stats.calls
    );

    Ok(PartitionResult {
        chrom_index,
        calls,
        stats,
    })
}

/// Process a batch of partitions on the worker pool.
///
/// Every partition runs to completion before failures are inspected; any failure is logged
/// with its partition identity and the first one is returned.
pub fn call_partitions(
    worker_pool: &rayon::ThreadPool,
    partitions: Vec<SignaturePartition>,
    settings: &CallerSettings,
    depth_source: Option<&dyn DepthSource>,
) -> Result<Vec<PartitionResult>, CallerError> {
    let results: Vec<Result<PartitionResult, CallerError>> = worker_pool.install(|| {
        partitions
            .into_par_iter()
            .map(|partition| {
                let chrom = partition.chrom.clone();
                let sv_type = partition.sv_type;
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    process_partition(partition, settings, depth_source)
                }));
                match outcome {
                    Ok(Ok(result)) => Ok(result),
                    Ok(Err(err @ CallerError::InputOrdering(_))) => Err(err),
                    Ok(Err(err @ CallerError::Configuration(_))) => Err(err),
                    Ok(Err(err)) => Err(CallerError::PartitionFailure {
                        chrom,
                        sv_type,
                        reason: err.to_string(),
                    }),
                    Err(panic_payload) => Err(CallerError::PartitionFailure {
                        chrom,
                        sv_type,
                        reason: panic_message(panic_payload.as_ref()),
                    }),
                }
            })
            .collect()
    });

    let mut partition_results = Vec::with_capacity(results.len());
    let mut first_error = None;
    for result in results {
        match result {
            Ok(partition_result) => partition_results.push(partition_result),
            Err(err) => {
                error!("{}", err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(partition_results),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Merge per-partition results into one list ordered by contig, then position. Ties are
/// broken by SV type and end so the order does not depend on worker scheduling.
pub fn merge_partition_results(results: Vec<PartitionResult>) -> CallSet {
    let mut stats = RunStats::default();
    let mut indexed_calls = Vec::new();
    for result in results {
        stats.add(&result.stats);
        indexed_calls.extend(result.calls.into_iter().map(|call| (result.chrom_index, call)));
    }
    indexed_calls.sort_by(|(a_idx, a), (b_idx, b)| {
        (a_idx, a.pos, a.sv_type, a.end, a.svlen, &a.mate)
            .cmp(&(b_idx, b.pos, b.sv_type, b.end, b.svlen, &b.mate))
    });
    CallSet {
        calls: indexed_calls.into_iter().map(|(_, call)| call).collect(),
        stats,
    }
}

/// Call structural variants from a chromosome-grouped, position-sorted signature stream.
///
/// Completed chromosomes are buffered until at least `settings.batches` signatures are
/// pending, then processed together on a pool of `settings.threads` workers. Nothing is
/// returned unless every partition succeeds.
pub fn call_structural_variants<I>(
    signatures: I,
    contigs: &[ContigInfo],
    settings: &CallerSettings,
    depth_source: Option<&dyn DepthSource>,
) -> Result<CallSet, CallerError>
where
    I: IntoIterator<Item = Result<Signature, CallerError>>,
{
    settings.validate()?;
    if settings.genotype && depth_source.is_none() {
        return Err(CallerError::Configuration(
            "genotyping is enabled but no read depth source is available".to_string(),
        ));
    }
    let start_time = SystemTime::now();
    let worker_pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.threads)
        .build()
        .map_err(|e| CallerError::Configuration(format!("failed to start worker pool: {e}")))?;

    let mut store = SignatureStore::new(contigs, settings.min_mapq);
    let mut pending: Vec<SignaturePartition> = Vec::new();
    let mut pending_signatures = 0;
    let mut results = Vec::new();
    let mut batch_count = 0;

    for signature in signatures {
        for partition in store.push(signature?)? {
            pending_signatures += partition.len();
            pending.push(partition);
        }
        if pending_signatures >= settings.batches {
            batch_count += 1;
            info!(
                "Processing batch {} ({} partitions, {} signatures)",
                batch_count,
                pending.len(),
                pending_signatures
            );
            results.extend(call_partitions(
                &worker_pool,
                std::mem::take(&mut pending),
                settings,
                depth_source,
            )?);
            pending_signatures = 0;
        }
    }
    pending.extend(store.finish_chromosome());
    if !pending.is_empty() {
        batch_count += 1;
        info!(
            "Processing batch {} ({} partitions)",
            batch_count,
            pending.len()
        );
        results.extend(call_partitions(&worker_pool, pending, settings, depth_source)?);
    }

    let mut call_set = merge_partition_results(results);
    call_set.stats.signatures = store.signature_count;
    call_set.stats.low_mapq_signatures = store.low_mapq_count;
    debug!(
        "Calling structural variants: {}s",
        start_time.elapsed().map(|d| d.as_secs()).unwrap_or(0)
    );
    Ok(call_set)
}
