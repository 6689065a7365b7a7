//! Run configuration: column aliases, overlap threshold, fallback behavior.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CrosswalkError, Result};

/// Accepted column names for each identifier, matched case-insensitively.
/// When several aliases are present in a layer, the earliest alias in the list wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AliasConfig {
    pub fine: Vec<String>,
    pub medium: Vec<String>,
    pub coarse: Vec<String>,
    pub coarse_region: Vec<String>,
}

impl Default for AliasConfig {
    fn default() -> Self {
        fn names(list: &[&str]) -> Vec<String> { list.iter().map(|s| s.to_string()).collect() }
        Self {
            fine: names(&["MAZ", "MAZ_ID", "MAZ_ID_"]),
            medium: names(&["TAZ", "TAZ_ID", "TAZ1454"]),
            coarse: names(&["PUMA", "PUMACE20", "PUMA20", "PUMACE10"]),
            coarse_region: names(&["COUNTYFP20", "COUNTYFP", "COUNTY", "CO_FIPS", "COUNTY_FIPS"]),
        }
    }
}

/// Minimum intersection area a candidate needs to take part in the area comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinOverlap {
    /// Share of the medium zone's own area, in `[0, 1)`.
    Fraction(f64),
    /// Area in squared units of the working CRS.
    Absolute(f64),
}

impl Default for MinOverlap {
    fn default() -> Self { MinOverlap::Fraction(0.0) }
}

impl MinOverlap {
    /// Resolve the threshold to an absolute area for a medium zone of the given area.
    #[inline]
    pub fn threshold(&self, medium_area: f64) -> f64 {
        match *self {
            MinOverlap::Fraction(f) => f * medium_area,
            MinOverlap::Absolute(a) => a,
        }
    }
}

/// What to do with a medium zone that has no usable candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Coarse zone with the nearest centroid.
    #[default]
    NearestCentroid,
    /// Coarse zone with the smallest boundary-to-boundary distance.
    NearestBoundary,
    /// Abort the run.
    Reject,
}

/// Log level used when a fallback assignment is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLog {
    Off,
    Debug,
    Info,
    #[default]
    Warn,
}

/// Configuration consumed by every stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrosswalkConfig {
    pub aliases: AliasConfig,
    pub min_overlap: MinOverlap,
    pub tie_tolerance: f64,                 // Relative tolerance for equal areas and distances
    pub fallback_policy: FallbackPolicy,
    pub fallback_log: FallbackLog,
    pub region_filter: Option<Vec<String>>, // Region codes of interest for the coarse layer
    pub code_width: usize,                  // Zero-pad width for numeric region codes
    pub fine_epsg: Option<u32>,
    pub coarse_epsg: Option<u32>,
    pub threads: Option<usize>,
}

impl Default for CrosswalkConfig {
    fn default() -> Self {
        Self {
            aliases: AliasConfig::default(),
            min_overlap: MinOverlap::default(),
            tie_tolerance: 1e-9,
            fallback_policy: FallbackPolicy::default(),
            fallback_log: FallbackLog::default(),
            region_filter: None,
            code_width: 3,
            fine_epsg: None,
            coarse_epsg: None,
            threads: None,
        }
    }
}

impl CrosswalkConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_aliases(mut self, aliases: AliasConfig) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_min_overlap(mut self, min_overlap: MinOverlap) -> Self {
        self.min_overlap = min_overlap;
        self
    }

    pub fn with_tie_tolerance(mut self, tolerance: f64) -> Self {
        self.tie_tolerance = tolerance;
        self
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    pub fn with_fallback_log(mut self, level: FallbackLog) -> Self {
        self.fallback_log = level;
        self
    }

    pub fn with_region_filter(mut self, codes: Vec<String>) -> Self {
        self.region_filter = Some(codes);
        self
    }

    pub fn with_epsg(mut self, fine: Option<u32>, coarse: Option<u32>) -> Self {
        self.fine_epsg = fine;
        self.coarse_epsg = coarse;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Reject parameter values no run could use.
    pub fn validate(&self) -> Result<()> {
        match self.min_overlap {
            MinOverlap::Fraction(f) if !(0.0..1.0).contains(&f) => {
                return Err(CrosswalkError::Config(format!("min_overlap fraction must be in [0, 1), got {f}")))
            }
            MinOverlap::Absolute(a) if !a.is_finite() || a < 0.0 => {
                return Err(CrosswalkError::Config(format!("min_overlap area must be finite and >= 0, got {a}")))
            }
            _ => {}
        }
        if !self.tie_tolerance.is_finite() || self.tie_tolerance < 0.0 {
            return Err(CrosswalkError::Config(format!("tie_tolerance must be finite and >= 0, got {}", self.tie_tolerance)));
        }
        for (field, list) in [
            ("fine", &self.aliases.fine),
            ("medium", &self.aliases.medium),
            ("coarse", &self.aliases.coarse),
        ] {
            if list.is_empty() {
                return Err(CrosswalkError::Config(format!("alias list for {field} ids is empty")));
            }
        }
        if self.threads == Some(0) {
            return Err(CrosswalkError::Config("threads must be at least 1".into()));
        }
        Ok(())
    }

    /// Normalize a region code: trim, and zero-pad purely numeric codes to `code_width`.
    pub fn normalize_code(&self, raw: &str) -> String {
        let code = raw.trim();
        if !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()) && code.len() < self.code_width {
            format!("{code:0>width$}", width = self.code_width)
        } else {
            code.to_string()
        }
    }

    /// Whether two areas (or distances) are equal within the configured tolerance.
    #[inline]
    pub fn nearly_equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.tie_tolerance * a.abs().max(b.abs()) + f64::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: CrosswalkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CrosswalkConfig::default());
    }

    #[test]
    fn min_overlap_is_tagged() {
        let config: CrosswalkConfig = serde_json::from_str(
            r#"{ "min_overlap": { "absolute": 250.0 }, "fallback_policy": "nearest_boundary" }"#
        ).unwrap();
        assert_eq!(config.min_overlap, MinOverlap::Absolute(250.0));
        assert_eq!(config.fallback_policy, FallbackPolicy::NearestBoundary);
    }

    #[test]
    fn built_config_survives_json() {
        let aliases = AliasConfig {
            fine: vec!["BLOCK".into()],
            medium: vec!["TRACT".into(), "TRACTCE".into()],
            coarse: vec!["DISTRICT".into()],
            coarse_region: vec![],
        };
        let config = CrosswalkConfig::default()
            .with_aliases(aliases.clone())
            .with_fallback_log(FallbackLog::Info)
            .with_min_overlap(MinOverlap::Fraction(0.25))
            .with_region_filter(vec!["1".into(), "13".into()])
            .with_epsg(Some(26910), None);
        assert!(config.validate().is_ok());

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""fallback_log":"info""#));
        let back: CrosswalkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.aliases, aliases);
        assert_eq!(back.fallback_log, FallbackLog::Info);
    }

    #[test]
    fn empty_alias_list_is_rejected() {
        let aliases = AliasConfig { coarse: vec![], ..AliasConfig::default() };
        assert!(CrosswalkConfig::default().with_aliases(aliases).validate().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<CrosswalkConfig>(r#"{ "min_area": 3 }"#).is_err());
    }

    #[test]
    fn fraction_threshold_scales_with_area() {
        assert_eq!(MinOverlap::Fraction(0.1).threshold(50.0), 5.0);
        assert_eq!(MinOverlap::Absolute(2.0).threshold(50.0), 2.0);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(CrosswalkConfig::default().with_min_overlap(MinOverlap::Fraction(1.0)).validate().is_err());
        assert!(CrosswalkConfig::default().with_min_overlap(MinOverlap::Absolute(-1.0)).validate().is_err());
        assert!(CrosswalkConfig::default().with_tie_tolerance(f64::NAN).validate().is_err());
        assert!(CrosswalkConfig::default().with_threads(0).validate().is_err());
        assert!(CrosswalkConfig::default().validate().is_ok());
    }

    #[test]
    fn numeric_codes_are_zero_padded() {
        let config = CrosswalkConfig::default();
        assert_eq!(config.normalize_code("1"), "001");
        assert_eq!(config.normalize_code(" 075 "), "075");
        assert_eq!(config.normalize_code("06075"), "06075");
        assert_eq!(config.normalize_code("Marin"), "Marin");
    }

    #[test]
    fn nearly_equal_is_relative() {
        let config = CrosswalkConfig::default();
        assert!(config.nearly_equal(1.0e6, 1.0e6 + 1.0e-4));
        assert!(!config.nearly_equal(1.0, 1.001));
    }
}
