use bgzip::{BGZFWriter, Compression};
use flate2::write::GzEncoder;
use log::{debug, info};
use serde_derive::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::containers::{ContigInfo, ResolvedCall, SvType};
use crate::errors::CallerError;
use crate::utils::{PROGRAM_NAME, PROGRAM_VERSION};

/// Header lines following the contig lines, in output order
const FIXED_HEADER_LINES: [&str; 18] = [
    r#"##ALT=<ID=INS,Description="Insertion of novel sequence relative to the reference">"#,
    r#"##ALT=<ID=DEL,Description="Deletion relative to the reference">"#,
    r#"##ALT=<ID=DUP,Description="Region of elevated copy number relative to the reference">"#,
    r#"##ALT=<ID=INV,Description="Inversion of reference sequence">"#,
    r#"##ALT=<ID=TRA,Description="Translocation">"#,
    r#"##INFO=<ID=PRECISE,Number=0,Type=Flag,Description="Precise structural variant">"#,
    r#"##INFO=<ID=IMPRECISE,Number=0,Type=Flag,Description="Imprecise structural variant">"#,
    r#"##INFO=<ID=SVTYPE,Number=1,Type=String,Description="Type of structural variant">"#,
    r#"##INFO=<ID=SVLEN,Number=1,Type=Integer,Description="Difference in length between REF and ALT alleles">"#,
    r#"##INFO=<ID=CHR2,Number=1,Type=String,Description="Chromosome for END coordinate in case of a translocation">"#,
    r#"##INFO=<ID=END,Number=1,Type=Integer,Description="End position of the variant described in this record">"#,
    r#"##INFO=<ID=CIPOS,Number=2,Type=Integer,Description="Confidence interval around POS for imprecise variants">"#,
    r#"##INFO=<ID=CIEND,Number=2,Type=Integer,Description="Confidence interval around END for imprecise variants">"#,
    r#"##INFO=<ID=MATEID,Number=.,Type=String,Description="ID of mate breakends">"#,
    r#"##INFO=<ID=RE,Number=1,Type=Integer,Description="Number of read support this record">"#,
    r#"##FORMAT=<ID=GT,Number=1,Type=String,Description="Genotype">"#,
    r##"##FORMAT=<ID=DR,Number=1,Type=Integer,Description="# high-quality reference reads">"##,
    r##"##FORMAT=<ID=DV,Number=1,Type=Integer,Description="# high-quality variant reads">"##,
];

/// Sample column used when genotyping is disabled
const GENOTYPE_PLACEHOLDER: &str = "./.:.:.";

/// Write the VCF header block
pub fn write_vcf_header<W: Write>(
    writer: &mut W,
    contigs: &[ContigInfo],
    sample: &str,
    file_date: &str,
) -> io::Result<()> {
    writeln!(writer, "##fileformat=VCFv4.2")?;
    writeln!(writer, "##source={PROGRAM_NAME}-{PROGRAM_VERSION}")?;
    writeln!(writer, "##fileDate={file_date}")?;
    for contig in contigs {
        writeln!(
            writer,
            "##contig=<ID={},length={}>",
            contig.name, contig.length
        )?;
    }
    for line in FIXED_HEADER_LINES {
        writeln!(writer, "{line}")?;
    }
    writeln!(
        writer,
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{sample}"
    )
}

/// Record IDs in output order, numbered per SV type from 0
pub fn get_record_ids(calls: &[ResolvedCall]) -> Vec<String> {
    let mut type_counts: HashMap<SvType, usize> = HashMap::new();
    calls
        .iter()
        .map(|call| {
            let count = type_counts.entry(call.sv_type).or_insert(0);
            let id = format!("{}.{}.{}", PROGRAM_NAME, call.sv_type, count);
            *count += 1;
            id
        })
        .collect()
}

/// Format one VCF data line, without the trailing newline
pub fn format_record(call: &ResolvedCall, id: &str) -> String {
    let mut info_fields = vec![
        match call.precise {
            true => "PRECISE".to_string(),
            false => "IMPRECISE".to_string(),
        },
        format!("SVTYPE={}", call.sv_type),
    ];
    if let Some(svlen) = call.svlen {
        info_fields.push(format!("SVLEN={svlen}"));
    }
    if let Some(mate) = &call.mate {
        info_fields.push(format!("CHR2={}", mate.chrom));
    }
    info_fields.push(format!("END={}", call.end));
    if let Some((pos_ci, end_ci)) = call.confidence_interval {
        info_fields.push(format!("CIPOS=-{pos_ci},{pos_ci}"));
        info_fields.push(format!("CIEND=-{end_ci},{end_ci}"));
    }
    if call.mate.is_some() {
        info_fields.push(format!("MATEID={id}_mate"));
    }
    info_fields.push(format!("RE={}", call.support));

    let sample_field = match &call.genotype {
        Some(genotype_call) => format!(
            "{}:{}:{}",
            genotype_call.genotype, genotype_call.dr, genotype_call.dv
        ),
        None => GENOTYPE_PLACEHOLDER.to_string(),
    };
    format!(
        "{}\t{}\t{}\tN\t<{}>\t.\tPASS\t{}\tGT:DR:DV\t{}",
        call.chrom,
        call.pos,
        id,
        call.sv_type,
        info_fields.join(";"),
        sample_field
    )
}

/// Write the complete VCF: header, then one record per call in the given order
pub fn write_vcf<W: Write>(
    writer: &mut W,
    calls: &[ResolvedCall],
    contigs: &[ContigInfo],
    sample: &str,
    file_date: &str,
) -> io::Result<()> {
    write_vcf_header(writer, contigs, sample, file_date)?;
    for (call, id) in calls.iter().zip(get_record_ids(calls)) {
        writeln!(writer, "{}", format_record(call, &id))?;
    }
    writer.flush()
}

/// Write the VCF to a path, BGZF-compressed when the path ends in .gz
pub fn write_vcf_file(
    vcf_path: &Path,
    calls: &[ResolvedCall],
    contigs: &[ContigInfo],
    sample: &str,
    file_date: &str,
) -> Result<(), CallerError> {
    let write_result = (|| -> io::Result<()> {
        let file_handle = File::create(vcf_path)?;
        let mut buf_writer = BufWriter::new(file_handle);
        if vcf_path.extension().and_then(|ext| ext.to_str()) == Some("gz") {
            let mut writer = BGZFWriter::new(&mut buf_writer, Compression::default());
            write_vcf(&mut writer, calls, contigs, sample, file_date)?;
            writer.close()?;
        } else {
            write_vcf(&mut buf_writer, calls, contigs, sample, file_date)?;
        }
        buf_writer.flush()
    })();
    write_result.map_err(|e| CallerError::output_write(e, vcf_path))?;
    info!("VCF written to {}", vcf_path.display());
    Ok(())
}

#[derive(Debug, PartialEq, Serialize)]
pub struct VariantSupport {
    pub svtype: SvType,
    pub chrom: String,
    pub pos: i64,
    pub reads: Vec<String>,
}

/// Supporting read names of every emitted call, keyed by record ID
#[derive(Debug, PartialEq, Serialize)]
pub struct SupportingReadNames {
    pub version: String,
    pub variants: BTreeMap<String, VariantSupport>,
}

impl SupportingReadNames {
    pub fn new(calls: &[ResolvedCall]) -> Self {
        let variants = calls
            .iter()
            .zip(get_record_ids(calls))
            .map(|(call, id)| {
                let support = VariantSupport {
                    svtype: call.sv_type,
                    chrom: call.chrom.clone(),
                    pos: call.pos,
                    reads: call.supporting_reads.clone(),
                };
                (id, support)
            })
            .collect();
        SupportingReadNames {
            version: PROGRAM_VERSION.to_string(),
            variants,
        }
    }
}

/// Write the supporting read JSON report, gzip-compressed when the path ends in .gz
pub fn write_supporting_reads(json_path: &Path, calls: &[ResolvedCall]) -> Result<(), CallerError> {
    let report = SupportingReadNames::new(calls);
    debug!("{} variants in supporting read report", report.variants.len());
    let write_result = (|| -> io::Result<()> {
        let json_string = serde_json::to_string_pretty(&report)?;
        let file_handle = File::create(json_path)?;
        if json_path.extension().and_then(|ext| ext.to_str()) == Some("gz") {
            let mut gzip_filehandle = GzEncoder::new(file_handle, flate2::Compression::default());
            gzip_filehandle.write_all(json_string.as_bytes())?;
            gzip_filehandle.finish()?;
        } else {
            let mut writer = BufWriter::new(file_handle);
            writer.write_all(json_string.as_bytes())?;
            writer.flush()?;
        }
        Ok(())
    })();
    write_result.map_err(|e| CallerError::output_write(e, json_path))?;
    info!("Supporting reads written to {}", json_path.display());
    Ok(())
}
