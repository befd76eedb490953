use log::debug;
use rust_htslib::bam::{self, Read};
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use crate::containers::{ContigInfo, Mate, Signature, SvType};
use crate::errors::CallerError;
use crate::utils;

/// Extract sample name from bam header
///
/// This uses the sample name from the first read group found in the header, and does not
/// check for additional read groups. Returns None if no read group carries an SM tag.
pub fn get_sample_from_bam(bam_filename: &Path) -> Result<Option<String>, CallerError> {
    let bam_reader = open_bam(bam_filename)?;
    let header_text = String::from_utf8_lossy(bam_reader.header().as_bytes()).to_string();
    Ok(get_sample_from_header_text(&header_text))
}

fn get_sample_from_header_text(header_text: &str) -> Option<String> {
    for line in header_text.split('\n') {
        for (i, word) in line.split('\t').enumerate() {
            if i == 0 {
                if word != "@RG" {
                    break;
                }
            } else if let Some(sample_name) = word.strip_prefix("SM:") {
                return Some(sample_name.to_string());
            }
        }
    }
    None
}

/// Reference sequences in header order, used for VCF contig lines and output ordering
pub fn get_contigs_from_bam(bam_filename: &Path) -> Result<Vec<ContigInfo>, CallerError> {
    let bam_reader = open_bam(bam_filename)?;
    let header = bam_reader.header();
    let mut contigs = Vec::new();
    for tid in 0..header.target_count() {
        let name = String::from_utf8_lossy(header.tid2name(tid)).to_string();
        let length = header.target_len(tid).ok_or_else(|| {
            CallerError::Alignment(format!(
                "missing length for contig {} in {}",
                name,
                bam_filename.display()
            ))
        })?;
        contigs.push(ContigInfo { name, length });
    }
    debug!(
        "{} contigs read from {}",
        contigs.len(),
        bam_filename.display()
    );
    Ok(contigs)
}

fn open_bam(bam_filename: &Path) -> Result<bam::Reader, CallerError> {
    bam::Reader::from_path(bam_filename).map_err(|e| {
        CallerError::Alignment(format!(
            "Input BAM could not be opened: \"{}\" ({})",
            bam_filename.display(),
            e
        ))
    })
}

/// Streams signatures from a tab-separated signature table.
///
/// Columns: `SVTYPE CHROM POS VALUE READ_ID MAPQ [CHR2 POS2]`, where VALUE is the
/// length for INS/DEL, the end position for DUP/INV and ignored for TRA.
pub struct SignatureReader {
    lines: std::io::Lines<Box<dyn BufRead + Send>>,
    source: String,
    line_number: usize,
}

impl SignatureReader {
    pub fn from_path(signatures_filename: &str) -> Result<Self, CallerError> {
        let reader = utils::open_text_reader(signatures_filename)?;
        Ok(Self::new(reader, signatures_filename))
    }

    pub fn new(reader: Box<dyn BufRead + Send>, source: &str) -> Self {
        SignatureReader {
            lines: reader.lines(),
            source: source.to_string(),
            line_number: 0,
        }
    }
}

impl Iterator for SignatureReader {
    type Item = Result<Signature, CallerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(CallerError::input_read(e, &self.source))),
            };
            self.line_number += 1;
            match parse_signature_line(&line) {
                Ok(Some(signature)) => return Some(Ok(signature)),
                Ok(None) => continue,
                Err(msg) => {
                    return Some(Err(CallerError::MalformedInput(format!(
                        "{} line {}: {}",
                        self.source, self.line_number, msg
                    ))))
                }
            }
        }
    }
}

/// Parse one signature table line. Comment and blank lines yield None.
pub fn parse_signature_line(line: &str) -> Result<Option<Signature>, String> {
    let line = line.trim_end();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 6 {
        return Err(format!("expected at least 6 columns, found {}", fields.len()));
    }
    let sv_type = SvType::from_str(fields[0])
        .map_err(|e| format!("unknown SV type \"{}\"", e.0))?;
    let chrom = fields[1].to_string();
    let pos = parse_position(fields[2], "POS")?;
    let readname = fields[4].to_string();
    if readname.is_empty() {
        return Err("empty read name".to_string());
    }
    let mapq = fields[5]
        .parse::<u8>()
        .map_err(|_| format!("invalid MAPQ \"{}\"", fields[5]))?;

    let signature = match sv_type {
        SvType::Ins | SvType::Del => {
            let length = fields[3]
                .parse::<i64>()
                .map_err(|_| format!("invalid length \"{}\"", fields[3]))?;
            if length < 0 {
                return Err(format!("negative length {length}"));
            }
            if sv_type == SvType::Del && pos.checked_add(length).is_none() {
                return Err(format!("deletion end overflows: position {pos}, length {length}"));
            }
            Signature::new_indel(sv_type, chrom, pos, length, readname, mapq)
        }
        SvType::Dup | SvType::Inv => {
            let end = parse_position(fields[3], "END")?;
            if end < pos {
                return Err(format!("end {end} precedes position {pos}"));
            }
            Signature::new_span(sv_type, chrom, pos, end, readname, mapq)
        }
        SvType::Tra => {
            if fields.len() < 8 {
                return Err("TRA signature requires CHR2 and POS2 columns".to_string());
            }
            let mate = Mate {
                chrom: fields[6].to_string(),
                pos: parse_position(fields[7], "POS2")?,
            };
            Signature::new_translocation(chrom, pos, mate, readname, mapq)
        }
    };
    Ok(Some(signature))
}

fn parse_position(field: &str, label: &str) -> Result<i64, String> {
    let pos = field
        .parse::<i64>()
        .map_err(|_| format!("invalid {label} \"{field}\""))?;
    if pos < 1 {
        return Err(format!("{label} must be 1-based, got {pos}"));
    }
    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_indel_lines() {
        let del = parse_signature_line("DEL\tchr1\t1000\t500\tread1\t60")
            .unwrap()
            .unwrap();
        assert_eq!(del.sv_type, SvType::Del);
        assert_eq!((del.pos, del.end, del.length), (1000, 1500, 500));
        assert_eq!(del.readname, "read1");
        assert_eq!(del.mapq, 60);

        let ins = parse_signature_line("INS\tchr1\t1000\t300\tread2\t5\n")
            .unwrap()
            .unwrap();
        assert_eq!((ins.pos, ins.end, ins.length), (1000, 1000, 300));
    }

    #[test]
    fn test_parse_span_and_translocation_lines() {
        let inv = parse_signature_line("INV\tchr3\t200\t900\tread3\t30")
            .unwrap()
            .unwrap();
        assert_eq!((inv.pos, inv.end, inv.length), (200, 900, 700));

        let tra = parse_signature_line("TRA\tchr1\t5000\t.\tread4\t60\tchr2\t9000")
            .unwrap()
            .unwrap();
        assert_eq!(
            tra.mate,
            Some(Mate {
                chrom: "chr2".to_string(),
                pos: 9000
            })
        );
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        assert_eq!(parse_signature_line("#SVTYPE\tCHROM"), Ok(None));
        assert_eq!(parse_signature_line(""), Ok(None));
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(parse_signature_line("BND\tchr1\t10\t5\tr\t60").is_err());
        assert!(parse_signature_line("DEL\tchr1\t0\t5\tr\t60").is_err());
        assert!(parse_signature_line("DEL\tchr1\t10\t-5\tr\t60").is_err());
        assert!(parse_signature_line("DUP\tchr1\t100\t50\tr\t60").is_err());
        assert!(parse_signature_line("TRA\tchr1\t100\t.\tr\t60").is_err());
        assert!(parse_signature_line("DEL\tchr1\t10\t5\tr\t999").is_err());
        assert!(parse_signature_line("DEL\tchr1\t10").is_err());
    }

    #[test]
    fn test_parse_rejects_overflowing_deletion_end() {
        let line = format!("DEL\tchr1\t1000\t{}\tread1\t60", i64::MAX);
        let result = parse_signature_line(&line);
        assert!(matches!(result, Err(msg) if msg.contains("overflows")));

        let reader = SignatureReader::new(Box::new(std::io::Cursor::new(line)), "test.tsv");
        let results: Vec<Result<Signature, CallerError>> = reader.collect();
        assert!(matches!(&results[0], Err(CallerError::MalformedInput(_))));

        // an insertion of the same length has no end to overflow
        let line = format!("INS\tchr1\t1000\t{}\tread1\t60", i64::MAX);
        assert!(parse_signature_line(&line).unwrap().is_some());
    }

    #[test]
    fn test_signature_reader_reports_line_numbers() {
        let text = "#header\nDEL\tchr1\t100\t50\tr1\t60\nDEL\tchr1\tx\t50\tr2\t60\n";
        let reader = SignatureReader::new(Box::new(Cursor::new(text.to_string())), "test.tsv");
        let results: Vec<Result<Signature, CallerError>> = reader.collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(CallerError::MalformedInput(msg)) => assert!(msg.contains("test.tsv line 3")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_sample_from_header_text() {
        let header = "@HD\tVN:1.6\n@RG\tID:rg1\tSM:HG002\n@PG\tID:pbmm2";
        assert_eq!(
            get_sample_from_header_text(header),
            Some("HG002".to_string())
        );
        assert_eq!(get_sample_from_header_text("@HD\tVN:1.6"), None);
    }
}
