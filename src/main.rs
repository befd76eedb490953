use std::env;
use std::time::SystemTime;

use log::{debug, error, info, LevelFilter};
use svresolve::cli::{get_args, Arguments};
use svresolve::coverage::{BamDepthSource, DepthSource};
use svresolve::errors::CallerError;
use svresolve::ingester::{get_contigs_from_bam, get_sample_from_bam, SignatureReader};
use svresolve::result_writer;
use svresolve::settings::CallerSettings;
use svresolve::sv_caller::call_structural_variants;
use svresolve::utils::{is_local_file, DEFAULT_SAMPLE_NAME};

fn set_up() -> Arguments {
    let args = get_args();
    let filter_level: LevelFilter = match args.verbose {
        false => LevelFilter::Info,
        true => LevelFilter::Debug,
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();

    let version = env!("CARGO_PKG_VERSION");
    info!("\nRunning svresolve v{version}\n");

    let cmd: Vec<String> = env::args().collect();
    let cmd_str = cmd.join(" ");
    debug!("Run command: {cmd_str}");

    if !is_local_file(&args.signatures_filename) {
        error!("Signature file {} not found", args.signatures_filename);
        std::process::exit(exitcode::NOINPUT);
    }
    if !args.bam_filename.exists() {
        error!("BAM file {} not found", args.bam_filename.display());
        std::process::exit(exitcode::NOINPUT);
    }
    args
}

fn log_time(start_time: SystemTime) {
    let elapsed_time = start_time.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    let hours = elapsed_time / 3600;
    let minutes = (elapsed_time % 3600) / 60;
    let seconds = elapsed_time % 60;
    debug!("Running time: {hours}h:{minutes}m:{seconds}s");
}

fn run(args: Arguments) -> Result<(), CallerError> {
    let settings = CallerSettings::from_args(&args)?;
    debug!("{settings:?}");

    let contigs = get_contigs_from_bam(&args.bam_filename)?;
    let sample = match args.sample {
        Some(sample) => sample,
        None => get_sample_from_bam(&args.bam_filename)?
            .unwrap_or_else(|| DEFAULT_SAMPLE_NAME.to_string()),
    };
    info!("Sample: {sample}");

    let signatures = SignatureReader::from_path(&args.signatures_filename)?;
    let bam_depth_source = settings
        .genotype
        .then(|| BamDepthSource::new(args.bam_filename.clone(), settings.min_mapq));
    let depth_source = bam_depth_source
        .as_ref()
        .map(|source| source as &dyn DepthSource);

    let call_set = call_structural_variants(signatures, &contigs, &settings, depth_source)?;
    call_set.stats.log_summary();

    let file_date = chrono::Local::now().format("%Y%m%d").to_string();
    result_writer::write_vcf_file(
        &args.vcf_filename,
        &call_set.calls,
        &contigs,
        &sample,
        &file_date,
    )?;
    if let Some(json_filename) = &args.supporting_reads_filename {
        result_writer::write_supporting_reads(json_filename, &call_set.calls)?;
    }
    Ok(())
}

fn main() {
    let args = set_up();
    let start_time = SystemTime::now();
    if let Err(err) = run(args) {
        error!("{err}");
        std::process::exit(err.exit_code());
    }
    log_time(start_time);
}
