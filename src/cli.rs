use chrono::Datelike;
use clap::Parser;
use std::path::PathBuf;

#[derive(Clone, Parser)]
#[clap(author, version, about,
    after_help = format!("Copyright (C) 2004-{}     Pacific Biosciences of California, Inc.
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year()))]
pub struct Arguments {
    /// Tab-separated SV signatures from the signature extraction stage. GZIP files allowed.
    #[clap(required = true)]
    #[clap(long = "signatures")]
    #[clap(value_name = "TSV")]
    pub signatures_filename: String,

    /// Indexed BAM the signatures were extracted from. Supplies contigs, sample name and read depth.
    #[clap(required = true)]
    #[clap(long = "bam")]
    #[clap(value_name = "BAM")]
    pub bam_filename: PathBuf,

    /// Output VCF path. A .gz suffix writes BGZF-compressed output.
    #[clap(required = true)]
    #[clap(long = "vcf")]
    #[clap(value_name = "VCF")]
    pub vcf_filename: PathBuf,

    /// Sample name for the VCF genotype column. Defaults to the BAM read group sample.
    #[clap(required = false)]
    #[clap(long = "sample")]
    #[clap(value_name = "STRING")]
    pub sample: Option<String>,

    /// Optional JSON report of supporting read names per emitted variant ID
    #[clap(required = false)]
    #[clap(long = "supporting-reads")]
    #[clap(value_name = "JSON")]
    pub supporting_reads_filename: Option<PathBuf>,

    /// Minimum number of reads that support a SV to be reported
    #[clap(long = "min-support")]
    #[clap(value_name = "INT")]
    #[clap(default_value = "3", allow_negative_numbers = true)]
    pub min_support: i64,

    /// Minimum length of SV to be reported
    #[clap(long = "min-length")]
    #[clap(value_name = "INT")]
    #[clap(default_value = "30", allow_negative_numbers = true)]
    pub min_length: i64,

    /// Minimum mapping quality of signatures and depth-counted reads
    #[clap(long = "min-mapq")]
    #[clap(value_name = "INT")]
    #[clap(default_value = "20", allow_negative_numbers = true)]
    pub min_mapq: i64,

    /// Maximum distance to cluster reads together for insertion
    #[clap(long = "max-cluster-bias-ins")]
    #[clap(value_name = "INT")]
    #[clap(default_value = "200", allow_negative_numbers = true)]
    pub max_cluster_bias_ins: i64,

    /// Maximum distance to cluster reads together for deletion
    #[clap(long = "max-cluster-bias-del")]
    #[clap(value_name = "INT")]
    #[clap(default_value = "200", allow_negative_numbers = true)]
    pub max_cluster_bias_del: i64,

    /// Maximum distance to cluster reads together for inversion
    #[clap(long = "max-cluster-bias-inv")]
    #[clap(value_name = "INT")]
    #[clap(default_value = "20", allow_negative_numbers = true)]
    pub max_cluster_bias_inv: i64,

    /// Maximum distance to cluster reads together for duplication
    #[clap(long = "max-cluster-bias-dup")]
    #[clap(value_name = "INT")]
    #[clap(default_value = "500", allow_negative_numbers = true)]
    pub max_cluster_bias_dup: i64,

    /// Maximum distance to cluster reads together for translocation, applied to both breakends
    #[clap(long = "max-cluster-bias-tra")]
    #[clap(value_name = "INT")]
    #[clap(default_value = "50", allow_negative_numbers = true)]
    pub max_cluster_bias_tra: i64,

    /// Minimum length identity for two insertion signatures to merge into one breakpoint
    #[clap(long = "diff-ratio-merging-ins")]
    #[clap(value_name = "FLOAT")]
    #[clap(default_value = "0.65", allow_negative_numbers = true)]
    pub diff_ratio_merging_ins: f64,

    /// Minimum length identity for two deletion signatures to merge into one breakpoint
    #[clap(long = "diff-ratio-merging-del")]
    #[clap(value_name = "FLOAT")]
    #[clap(default_value = "0.3", allow_negative_numbers = true)]
    pub diff_ratio_merging_del: f64,

    /// Filter insertion breakpoints with identity less than this value
    #[clap(long = "diff-ratio-filtering-ins")]
    #[clap(value_name = "FLOAT")]
    #[clap(default_value = "0.65", allow_negative_numbers = true)]
    pub diff_ratio_filtering_ins: f64,

    /// Filter deletion breakpoints with identity less than this value
    #[clap(long = "diff-ratio-filtering-del")]
    #[clap(value_name = "FLOAT")]
    #[clap(default_value = "0.35", allow_negative_numbers = true)]
    pub diff_ratio_filtering_del: f64,

    /// Filter translocation breakpoints with identity less than this value
    #[clap(long = "diff-ratio-filtering-tra")]
    #[clap(value_name = "FLOAT")]
    #[clap(default_value = "0.6", allow_negative_numbers = true)]
    pub diff_ratio_filtering_tra: f64,

    /// Enable genotyping (True/False)
    #[clap(long = "genotype")]
    #[clap(value_name = "BOOL")]
    #[clap(default_value = "False")]
    pub genotype: String,

    /// Number of worker threads
    #[clap(long = "threads")]
    #[clap(value_name = "INT")]
    #[clap(default_value = "16", allow_negative_numbers = true)]
    pub threads: i64,

    /// Number of signatures buffered before a batch of chromosomes is processed
    #[clap(long = "batches")]
    #[clap(value_name = "INT")]
    #[clap(default_value = "10000000", allow_negative_numbers = true)]
    pub batches: i64,

    /// Optional flag to print verbose output for debugging purposes.
    #[clap(long = "verbose")]
    pub verbose: bool,
}

pub fn get_args() -> Arguments {
    Arguments::parse()
}
