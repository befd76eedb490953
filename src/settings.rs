use crate::cli::Arguments;
use crate::containers::SvType;
use crate::errors::CallerError;
use crate::utils;

/// Clustering, merging and filtering parameters for one SV type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSettings {
    /// Maximum distance between consecutive signatures of one cluster
    pub max_cluster_bias: i64,

    /// Minimum identity for two signatures to merge into one candidate.
    /// Without a ratio every cluster member merges into a single candidate.
    pub diff_ratio_merging: Option<f64>,

    /// Minimum candidate identity to be reported
    pub diff_ratio_filtering: Option<f64>,
}

/// Frozen parameter set shared by every partition of a run
#[derive(Debug, Clone, PartialEq)]
pub struct CallerSettings {
    pub min_support: usize,
    pub min_length: i64,
    pub min_mapq: u8,
    pub ins: TypeSettings,
    pub del: TypeSettings,
    pub dup: TypeSettings,
    pub inv: TypeSettings,
    pub tra: TypeSettings,
    pub genotype: bool,
    pub threads: usize,
    pub batches: usize,
}

impl Default for CallerSettings {
    fn default() -> Self {
        CallerSettings {
            min_support: 3,
            min_length: 30,
            min_mapq: 20,
            ins: TypeSettings {
                max_cluster_bias: 200,
                diff_ratio_merging: Some(0.65),
                diff_ratio_filtering: Some(0.65),
            },
            del: TypeSettings {
                max_cluster_bias: 200,
                diff_ratio_merging: Some(0.3),
                diff_ratio_filtering: Some(0.35),
            },
            dup: TypeSettings {
                max_cluster_bias: 500,
                diff_ratio_merging: None,
                diff_ratio_filtering: None,
            },
            inv: TypeSettings {
                max_cluster_bias: 20,
                diff_ratio_merging: None,
                diff_ratio_filtering: None,
            },
            tra: TypeSettings {
                max_cluster_bias: 50,
                diff_ratio_merging: None,
                diff_ratio_filtering: Some(0.6),
            },
            genotype: false,
            threads: 16,
            batches: 10_000_000,
        }
    }
}

impl CallerSettings {
    pub fn type_settings(&self, sv_type: SvType) -> &TypeSettings {
        match sv_type {
            SvType::Ins => &self.ins,
            SvType::Del => &self.del,
            SvType::Dup => &self.dup,
            SvType::Inv => &self.inv,
            SvType::Tra => &self.tra,
        }
    }

    /// Identity at or above which a candidate of this type is reported PRECISE
    pub fn precise_identity(&self, sv_type: SvType) -> f64 {
        self.type_settings(sv_type)
            .diff_ratio_merging
            .unwrap_or(utils::UNMERGED_PRECISE_IDENTITY)
    }

    /// Build and validate the parameter set from parsed command-line arguments
    pub fn from_args(args: &Arguments) -> Result<Self, CallerError> {
        let min_support = non_negative(args.min_support, "--min-support")? as usize;
        let min_mapq = u8::try_from(args.min_mapq).map_err(|_| {
            CallerError::Configuration(format!(
                "--min-mapq must be between 0 and 255, got {}",
                args.min_mapq
            ))
        })?;
        let settings = CallerSettings {
            min_support,
            min_length: non_negative(args.min_length, "--min-length")?,
            min_mapq,
            ins: TypeSettings {
                max_cluster_bias: non_negative(args.max_cluster_bias_ins, "--max-cluster-bias-ins")?,
                diff_ratio_merging: Some(args.diff_ratio_merging_ins),
                diff_ratio_filtering: Some(args.diff_ratio_filtering_ins),
            },
            del: TypeSettings {
                max_cluster_bias: non_negative(args.max_cluster_bias_del, "--max-cluster-bias-del")?,
                diff_ratio_merging: Some(args.diff_ratio_merging_del),
                diff_ratio_filtering: Some(args.diff_ratio_filtering_del),
            },
            dup: TypeSettings {
                max_cluster_bias: non_negative(args.max_cluster_bias_dup, "--max-cluster-bias-dup")?,
                diff_ratio_merging: None,
                diff_ratio_filtering: None,
            },
            inv: TypeSettings {
                max_cluster_bias: non_negative(args.max_cluster_bias_inv, "--max-cluster-bias-inv")?,
                diff_ratio_merging: None,
                diff_ratio_filtering: None,
            },
            tra: TypeSettings {
                max_cluster_bias: non_negative(args.max_cluster_bias_tra, "--max-cluster-bias-tra")?,
                diff_ratio_merging: None,
                diff_ratio_filtering: Some(args.diff_ratio_filtering_tra),
            },
            genotype: parse_bool_string(&args.genotype, "--genotype")?,
            threads: non_negative(args.threads, "--threads")? as usize,
            batches: non_negative(args.batches, "--batches")? as usize,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges that the type system does not enforce
    pub fn validate(&self) -> Result<(), CallerError> {
        if self.min_support < 1 {
            return Err(CallerError::Configuration(
                "--min-support must be at least 1".to_string(),
            ));
        }
        if self.min_length < 0 {
            return Err(CallerError::Configuration(format!(
                "--min-length must not be negative, got {}",
                self.min_length
            )));
        }
        if self.threads < 1 {
            return Err(CallerError::Configuration(
                "--threads must be at least 1".to_string(),
            ));
        }
        if self.batches < 1 {
            return Err(CallerError::Configuration(
                "--batches must be at least 1".to_string(),
            ));
        }
        for sv_type in SvType::ALL {
            let type_settings = self.type_settings(sv_type);
            if type_settings.max_cluster_bias < 0 {
                return Err(CallerError::Configuration(format!(
                    "max cluster bias for {} must not be negative, got {}",
                    sv_type, type_settings.max_cluster_bias
                )));
            }
            let ratios = [
                ("merging", type_settings.diff_ratio_merging),
                ("filtering", type_settings.diff_ratio_filtering),
            ];
            for (label, ratio_opt) in ratios {
                if let Some(ratio) = ratio_opt {
                    if !(0.0..=1.0).contains(&ratio) {
                        return Err(CallerError::Configuration(format!(
                            "{label} ratio for {sv_type} must be within [0, 1], got {ratio}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn non_negative(value: i64, label: &str) -> Result<i64, CallerError> {
    if value < 0 {
        return Err(CallerError::Configuration(format!(
            "{label} must not be negative, got {value}"
        )));
    }
    Ok(value)
}

/// Interpret a "True"/"False" option value
pub fn parse_bool_string(value: &str, label: &str) -> Result<bool, CallerError> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(CallerError::Configuration(format!(
            "{label} expects True or False, got \"{value}\""
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse_test_args(extra: &[&str]) -> Arguments {
        let mut argv = vec![
            "svresolve",
            "--signatures",
            "sigs.tsv",
            "--bam",
            "reads.bam",
            "--vcf",
            "out.vcf",
        ];
        argv.extend_from_slice(extra);
        Arguments::parse_from(argv)
    }

    #[test]
    fn test_defaults_match_argument_defaults() {
        let settings = CallerSettings::from_args(&parse_test_args(&[])).unwrap();
        assert_eq!(settings, CallerSettings::default());
    }

    #[test]
    fn test_type_settings_lookup() {
        let settings = CallerSettings::default();
        assert_eq!(settings.type_settings(SvType::Inv).max_cluster_bias, 20);
        assert_eq!(settings.type_settings(SvType::Dup).max_cluster_bias, 500);
        assert_eq!(settings.type_settings(SvType::Tra).diff_ratio_merging, None);
        assert_eq!(settings.precise_identity(SvType::Del), 0.3);
        assert_eq!(settings.precise_identity(SvType::Tra), 1.0);
    }

    #[test]
    fn test_genotype_flag_parsing() {
        let settings = CallerSettings::from_args(&parse_test_args(&["--genotype", "True"])).unwrap();
        assert!(settings.genotype);
        let settings = CallerSettings::from_args(&parse_test_args(&["--genotype", "false"])).unwrap();
        assert!(!settings.genotype);
        let result = CallerSettings::from_args(&parse_test_args(&["--genotype", "yes"]));
        assert!(matches!(result, Err(CallerError::Configuration(_))));
    }

    #[test]
    fn test_out_of_range_parameters_rejected() {
        let bad_args: [&[&str]; 6] = [
            &["--min-support", "0"],
            &["--min-length", "-1"],
            &["--threads", "0"],
            &["--max-cluster-bias-del", "-5"],
            &["--diff-ratio-merging-ins", "1.5"],
            &["--min-mapq", "300"],
        ];
        for extra in bad_args {
            let result = CallerSettings::from_args(&parse_test_args(extra));
            assert!(
                matches!(result, Err(CallerError::Configuration(_))),
                "{extra:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_bool_string() {
        assert!(parse_bool_string("TRUE", "x").unwrap());
        assert!(!parse_bool_string("False", "x").unwrap());
        assert!(parse_bool_string("", "x").is_err());
    }
}
