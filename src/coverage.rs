use rust_htslib::bam::{self, Read};
use std::path::PathBuf;

use crate::errors::CallerError;

/// Supplies local read depth to the genotyper. One counter is opened per partition so
/// that workers never share reader state.
pub trait DepthSource: Sync {
    fn depth_counter(&self) -> Result<Box<dyn DepthCounter + '_>, CallerError>;
}

pub trait DepthCounter {
    /// Number of reads covering the 1-based position `pos` on `chrom`
    fn local_depth(&mut self, chrom: &str, pos: i64) -> Result<u32, CallerError>;
}

/// Counts read depth from an indexed BAM
pub struct BamDepthSource {
    bam_filename: PathBuf,
    min_mapq: u8,
}

impl BamDepthSource {
    pub fn new(bam_filename: PathBuf, min_mapq: u8) -> Self {
        BamDepthSource {
            bam_filename,
            min_mapq,
        }
    }
}

impl DepthSource for BamDepthSource {
    fn depth_counter(&self) -> Result<Box<dyn DepthCounter + '_>, CallerError> {
        let bam_reader = bam::IndexedReader::from_path(&self.bam_filename).map_err(|e| {
            CallerError::Alignment(format!(
                "Indexed BAM could not be opened: \"{}\" ({})",
                self.bam_filename.display(),
                e
            ))
        })?;
        Ok(Box::new(BamDepthCounter {
            bam_reader,
            min_mapq: self.min_mapq,
        }))
    }
}

struct BamDepthCounter {
    bam_reader: bam::IndexedReader,
    min_mapq: u8,
}

impl DepthCounter for BamDepthCounter {
    fn local_depth(&mut self, chrom: &str, pos: i64) -> Result<u32, CallerError> {
        // fetch coordinates are 0-based half-open
        let fetch_region = (chrom, pos - 1, pos);
        self.bam_reader.fetch(fetch_region).map_err(|e| {
            CallerError::Alignment(format!("Failed to fetch {chrom}:{pos} ({e})"))
        })?;
        let mut depth = 0;
        let mut record = bam::Record::new();
        while let Some(result) = self.bam_reader.read(&mut record) {
            if let Err(e) = result {
                return Err(CallerError::Alignment(format!(
                    "Error parsing BAM at {chrom}:{pos} ({e})"
                )));
            }
            if is_depth_countable(&record, self.min_mapq) {
                depth += 1;
            }
        }
        Ok(depth)
    }
}

/// Only primary, mapped, non-duplicate, QC-passing alignments count toward depth
fn is_depth_countable(record: &bam::Record, min_mapq: u8) -> bool {
    !(record.is_unmapped()
        || record.is_secondary()
        || record.is_supplementary()
        || record.is_duplicate()
        || record.is_quality_check_failed()
        || record.mapq() < min_mapq)
}

/// In-memory depth lookup keyed on (chrom, pos), with a fallback depth for other positions
#[cfg(test)]
pub struct TestDepthSource {
    pub depths: std::collections::HashMap<(String, i64), u32>,
    pub default_depth: u32,
}

#[cfg(test)]
impl TestDepthSource {
    pub fn uniform(default_depth: u32) -> Self {
        TestDepthSource {
            depths: std::collections::HashMap::new(),
            default_depth,
        }
    }
}

#[cfg(test)]
impl DepthSource for TestDepthSource {
    fn depth_counter(&self) -> Result<Box<dyn DepthCounter + '_>, CallerError> {
        Ok(Box::new(TestDepthCounter { source: self }))
    }
}

#[cfg(test)]
struct TestDepthCounter<'a> {
    source: &'a TestDepthSource,
}

#[cfg(test)]
impl DepthCounter for TestDepthCounter<'_> {
    fn local_depth(&mut self, chrom: &str, pos: i64) -> Result<u32, CallerError> {
        Ok(*self
            .source
            .depths
            .get(&(chrom.to_string(), pos))
            .unwrap_or(&self.source.default_depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_bam_reports_alignment_error() {
        let source = BamDepthSource::new(PathBuf::from("/this/path/does/not/exist.bam"), 20);
        assert!(matches!(
            source.depth_counter(),
            Err(CallerError::Alignment(_))
        ));
    }

    #[test]
    fn test_in_memory_depth_lookup() {
        let mut source = TestDepthSource::uniform(12);
        source.depths.insert(("chr1".to_string(), 100), 30);
        let mut counter = source.depth_counter().unwrap();
        assert_eq!(counter.local_depth("chr1", 100).unwrap(), 30);
        assert_eq!(counter.local_depth("chr1", 101).unwrap(), 12);
    }

    #[test]
    fn test_depth_countable_flags() {
        let mut record = bam::Record::new();
        record.set_mapq(60);
        record.set_flags(0);
        assert!(is_depth_countable(&record, 20));
        record.set_mapq(10);
        assert!(!is_depth_countable(&record, 20));
        record.set_mapq(60);
        record.set_flags(0x800);
        assert!(!is_depth_countable(&record, 20));
        record.set_flags(0x400);
        assert!(!is_depth_countable(&record, 20));
    }
}
