use core::fmt;
use log::debug;

use crate::containers::{BreakpointCandidate, SvType};
use crate::settings::CallerSettings;

/// Why a breakpoint candidate was not reported
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DropReason {
    InsufficientSupport,
    LowIdentity,
    TooShort,
}

impl fmt::Display for DropReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::InsufficientSupport => "insufficient support",
            DropReason::LowIdentity => "low identity",
            DropReason::TooShort => "too short",
        };
        write!(formatter, "{s}")
    }
}

/// Accept or reject a candidate as-is. Rules are checked in order: read support,
/// consensus identity against the type's filtering ratio, then minimum length
/// (translocations are exempt from the length rule).
pub fn filter_candidate(
    candidate: &BreakpointCandidate,
    settings: &CallerSettings,
) -> Result<(), DropReason> {
    let reason_opt = if candidate.support() < settings.min_support {
        Some(DropReason::InsufficientSupport)
    } else if settings
        .type_settings(candidate.sv_type)
        .diff_ratio_filtering
        .is_some_and(|ratio| candidate.identity < ratio)
    {
        Some(DropReason::LowIdentity)
    } else if candidate.sv_type != SvType::Tra && candidate.length.abs() < settings.min_length {
        Some(DropReason::TooShort)
    } else {
        None
    };

    match reason_opt {
        Some(reason) => {
            debug!("{} skipped: {}", candidate, reason);
            Err(reason)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{create_test_signature, create_test_translocation};

    fn create_test_candidate(sv_type: SvType, length: i64, identity: f64, reads: usize) -> BreakpointCandidate {
        let signatures = (0..reads)
            .map(|i| create_test_signature(sv_type, "chr1", 1000 + i as i64, length, &format!("read{i}")))
            .collect();
        BreakpointCandidate {
            chrom: "chr1".to_string(),
            sv_type,
            pos: 1000,
            end: 1000 + length,
            length,
            mate: None,
            identity,
            pos_spread: 0,
            end_spread: 0,
            signatures,
        }
    }

    #[test]
    fn test_passing_candidate_kept() {
        let settings = CallerSettings::default();
        let candidate = create_test_candidate(SvType::Del, 500, 0.9, 3);
        assert_eq!(filter_candidate(&candidate, &settings), Ok(()));
    }

    #[test]
    fn test_support_checked_first() {
        let settings = CallerSettings::default();
        // also too short and low identity, support wins
        let candidate = create_test_candidate(SvType::Del, 10, 0.1, 2);
        assert_eq!(
            filter_candidate(&candidate, &settings),
            Err(DropReason::InsufficientSupport)
        );
    }

    #[test]
    fn test_support_counts_distinct_reads() {
        let settings = CallerSettings::default();
        let mut candidate = create_test_candidate(SvType::Ins, 500, 0.9, 3);
        for signature in candidate.signatures.iter_mut() {
            signature.readname = "same_read".to_string();
        }
        assert_eq!(
            filter_candidate(&candidate, &settings),
            Err(DropReason::InsufficientSupport)
        );
    }

    #[test]
    fn test_identity_below_filtering_ratio_dropped() {
        let settings = CallerSettings::default();
        let candidate = create_test_candidate(SvType::Ins, 500, 0.6, 5);
        assert_eq!(
            filter_candidate(&candidate, &settings),
            Err(DropReason::LowIdentity)
        );
        // 0.6 clears the deletion ratio of 0.35
        let candidate = create_test_candidate(SvType::Del, 500, 0.6, 5);
        assert_eq!(filter_candidate(&candidate, &settings), Ok(()));
    }

    #[test]
    fn test_types_without_filtering_ratio_skip_identity_rule() {
        let settings = CallerSettings::default();
        let candidate = create_test_candidate(SvType::Dup, 500, 0.01, 3);
        assert_eq!(filter_candidate(&candidate, &settings), Ok(()));
    }

    #[test]
    fn test_short_candidate_dropped() {
        let settings = CallerSettings::default();
        let candidate = create_test_candidate(SvType::Inv, 29, 1.0, 3);
        assert_eq!(
            filter_candidate(&candidate, &settings),
            Err(DropReason::TooShort)
        );
        let candidate = create_test_candidate(SvType::Inv, 30, 1.0, 3);
        assert_eq!(filter_candidate(&candidate, &settings), Ok(()));
    }

    #[test]
    fn test_translocation_rules() {
        let settings = CallerSettings::default();
        let mut candidate = create_test_candidate(SvType::Ins, 0, 0.99, 0);
        candidate.sv_type = SvType::Tra;
        candidate.signatures = (0..3)
            .map(|i| create_test_translocation("chr1", 1000, "chr2", 9000, &format!("read{i}")))
            .collect();
        // no minimum length for translocations
        assert_eq!(filter_candidate(&candidate, &settings), Ok(()));
        candidate.identity = 0.5;
        assert_eq!(
            filter_candidate(&candidate, &settings),
            Err(DropReason::LowIdentity)
        );
    }
}
