use std::path::Path;

use polars::{frame::DataFrame, prelude::{Column, NamedFrom}};
use tracing::info;

use crate::{
    common::{sha256_hex, write_atomic},
    config::CrosswalkConfig,
    crosswalk::{
        aggregate, assemble, ConsistencyValidator, Crosswalk, OverlapResolver, RegionKey, RegionTable, Resolution,
        ResolutionSummary,
    },
    error::Result,
    io::{read_shapefile, write_csv_bytes},
    layer::{load_layers, FineLayer, RawLayer},
};

/// One configured crosswalk build: load, aggregate, resolve, assemble, validate.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: CrosswalkConfig,
}

impl Pipeline {
    pub fn new(config: CrosswalkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline] pub fn config(&self) -> &CrosswalkConfig { &self.config }

    /// Build a validated crosswalk from in-memory layers.
    pub fn run(&self, fine: RawLayer, coarse: RawLayer, regions: &RegionTable) -> Result<CrosswalkRun> {
        let (fine, coarse) = load_layers(fine, coarse, &self.config, regions.key() == RegionKey::Fips)?;

        let mediums = aggregate(&fine)?;
        info!(medium_zones = mediums.len(), "aggregated fine zones");

        let resolutions = OverlapResolver::new(&coarse, &self.config)?.resolve_all(&mediums)?;
        let crosswalk = assemble(&fine, &coarse, &resolutions, regions)?;

        let validator = ConsistencyValidator::new(fine.zones());
        validator.check(&crosswalk, resolutions.iter().map(|r| &r.medium_id))?;
        validator.check_inheritance(&crosswalk)?;
        info!(records = crosswalk.len(), "crosswalk validated");

        let summary = ResolutionSummary::from_resolutions(&resolutions);
        Ok(CrosswalkRun { crosswalk, resolutions, summary })
    }

    /// Build a validated crosswalk from shapefiles and a region CSV.
    pub fn run_files(&self, fine: &Path, coarse: &Path, regions: &Path) -> Result<CrosswalkRun> {
        let regions = RegionTable::read_csv(regions, &self.config)?;
        self.run(read_shapefile(fine)?, read_shapefile(coarse)?, &regions)
    }

    /// Re-check a written crosswalk against its fine layer.
    pub fn validate(&self, crosswalk: &Crosswalk, fine: RawLayer) -> Result<()> {
        let fine = FineLayer::from_raw(fine, &self.config)?;
        let validator = ConsistencyValidator::new(fine.zones());
        validator.check(crosswalk, crosswalk.records().iter().map(|r| &r.medium_id))?;
        validator.check_parents(crosswalk)?;
        validator.check_inheritance(crosswalk)?;
        info!(records = crosswalk.len(), "crosswalk is consistent with fine layer");
        Ok(())
    }

    /// Re-check a crosswalk CSV against a fine-zone shapefile.
    pub fn validate_files(&self, crosswalk: &Path, fine: &Path) -> Result<Crosswalk> {
        let table = Crosswalk::read_csv(crosswalk)?;
        self.validate(&table, read_shapefile(fine)?)?;
        Ok(table)
    }
}

/// Result of a successful run. Only validated crosswalks are ever constructed.
#[derive(Debug, Clone)]
pub struct CrosswalkRun {
    pub crosswalk: Crosswalk,
    pub resolutions: Vec<Resolution>, // One per medium zone, sorted by medium id
    pub summary: ResolutionSummary,
}

impl CrosswalkRun {
    /// Write the crosswalk CSV atomically and return the SHA-256 of the written bytes.
    pub fn write_csv(&self, path: &Path, force: bool) -> Result<String> {
        let bytes = self.crosswalk.to_csv_bytes()?;
        write_atomic(path, &bytes, force)?;
        let digest = sha256_hex(&bytes);
        info!(path = %path.display(), records = self.crosswalk.len(), sha256 = %digest, "wrote crosswalk");
        Ok(digest)
    }

    /// One row per medium zone describing how its coarse zone was chosen.
    pub fn report_dataframe(&self) -> Result<DataFrame> {
        let r = &self.resolutions;
        Ok(DataFrame::new(vec![
            Column::new("medium_id".into(), r.iter().map(|r| r.medium_id.as_str()).collect::<Vec<_>>()),
            Column::new("coarse_id".into(), r.iter().map(|r| r.coarse_id.as_str()).collect::<Vec<_>>()),
            Column::new("method".into(), r.iter().map(|r| r.method.to_str()).collect::<Vec<_>>()),
            Column::new("overlap_share".into(), r.iter().map(|r| r.overlap_share).collect::<Vec<_>>()),
            Column::new("candidates".into(), r.iter().map(|r| r.candidates as u32).collect::<Vec<_>>()),
        ])?)
    }

    /// Write the resolution audit CSV atomically.
    pub fn write_report(&self, path: &Path, force: bool) -> Result<()> {
        write_atomic(path, &write_csv_bytes(&mut self.report_dataframe()?)?, force)?;
        info!(path = %path.display(), medium_zones = self.resolutions.len(), "wrote resolution report");
        Ok(())
    }
}
