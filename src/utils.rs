use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};

use flate2::bufread::MultiGzDecoder;

use crate::errors::CallerError;

pub const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lowest variant allele fraction called heterozygous. Lower fractions are
/// genotyped 0/0 and the call is suppressed.
pub const HET_ALLELE_FRACTION_MIN: f64 = 0.2;

/// Lowest variant allele fraction called homozygous-variant
pub const HOM_ALT_ALLELE_FRACTION_MIN: f64 = 0.8;

/// Identity required for a PRECISE call on SV types that have no merging ratio
pub const UNMERGED_PRECISE_IDENTITY: f64 = 1.0;

/// Sample name written when none is given and the alignment header has none
pub const DEFAULT_SAMPLE_NAME: &str = "NULL";

/// first two bytes of a gzip file that indicatee the compression algorithm used
const GZIP_INDICATOR: [u8; 2] = [0x1F, 0x8B];

pub fn is_local_file(filepath: &str) -> bool {
    let path = std::path::Path::new(filepath);

    match std::fs::metadata(path) {
        Ok(metadata) => metadata.is_file(),
        Err(_) => false, // If there is an error (e.g., path doesn't exist), return false
    }
}

/// Check if a file starts with the gzip magic bytes
pub fn is_gzipped(path: &str) -> Result<bool, CallerError> {
    if !is_local_file(path) {
        return Ok(false);
    }
    let file_handle = File::open(path).map_err(|e| CallerError::input_read(e, path))?;
    let mut reader = BufReader::new(file_handle);
    let mut gzip_indicator_bytes = [0; 2];
    if reader.read_exact(&mut gzip_indicator_bytes).is_err() {
        // too short to be gzip
        return Ok(false);
    }
    reader
        .rewind()
        .map_err(|e| CallerError::input_read(e, path))?;
    Ok(gzip_indicator_bytes == GZIP_INDICATOR)
}

/// Open a plain text or gzipped text file as a buffered line reader
pub fn open_text_reader(file_path: &str) -> Result<Box<dyn BufRead + Send>, CallerError> {
    if !is_local_file(file_path) {
        return Err(CallerError::input_read(
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            file_path,
        ));
    }
    let gzipped = is_gzipped(file_path)?;
    let file = File::open(file_path).map_err(|e| CallerError::input_read(e, file_path))?;
    let reader: Box<dyn BufRead + Send> = match gzipped {
        true => Box::new(BufReader::new(MultiGzDecoder::new(BufReader::new(file)))),
        false => Box::new(BufReader::new(file)),
    };
    Ok(reader)
}

/// Median of a set of positions or sizes. Even-sized sets use the mean of the
/// two middle values.
pub fn get_median(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted_values = values.to_vec();
    sorted_values.sort_unstable();
    let middle_idx = (sorted_values.len() - 1) / 2;
    let median = match sorted_values.len() % 2 {
        0 => (sorted_values[middle_idx] + sorted_values[middle_idx + 1]) / 2,
        _ => sorted_values[middle_idx],
    };
    Some(median)
}

#[cfg(test)]
pub fn create_test_signature(
    sv_type: crate::containers::SvType,
    chrom: &str,
    pos: i64,
    size: i64,
    readname: &str,
) -> crate::containers::Signature {
    use crate::containers::{Signature, SvType};
    match sv_type {
        SvType::Ins | SvType::Del => Signature::new_indel(
            sv_type,
            chrom.to_string(),
            pos,
            size,
            readname.to_string(),
            60,
        ),
        SvType::Dup | SvType::Inv => Signature::new_span(
            sv_type,
            chrom.to_string(),
            pos,
            pos + size,
            readname.to_string(),
            60,
        ),
        SvType::Tra => panic!("use create_test_translocation for TRA signatures"),
    }
}

#[cfg(test)]
pub fn create_test_translocation(
    chrom: &str,
    pos: i64,
    mate_chrom: &str,
    mate_pos: i64,
    readname: &str,
) -> crate::containers::Signature {
    crate::containers::Signature::new_translocation(
        chrom.to_string(),
        pos,
        crate::containers::Mate {
            chrom: mate_chrom.to_string(),
            pos: mate_pos,
        },
        readname.to_string(),
        60,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_median() {
        assert_eq!(get_median(&[]), None);
        assert_eq!(get_median(&[7]), Some(7));
        assert_eq!(get_median(&[1005, 1000]), Some(1002));
        assert_eq!(get_median(&[3, 1, 100]), Some(3));
    }

    #[test]
    fn test_is_local_file_missing() {
        assert!(!is_local_file("/this/path/does/not/exist.tsv"));
        assert!(!is_gzipped("/this/path/does/not/exist.tsv").unwrap());
    }

    #[test]
    fn test_open_text_reader_missing_file() {
        let result = open_text_reader("/this/path/does/not/exist.tsv");
        assert!(matches!(result, Err(CallerError::InputRead { .. })));
    }
}
