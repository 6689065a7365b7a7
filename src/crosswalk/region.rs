use std::path::Path;

use ahash::AHashMap;
use polars::frame::DataFrame;
use tracing::debug;

use crate::{
    config::CrosswalkConfig,
    error::{CrosswalkError, Result},
    io::{read_string_csv, string_column},
    types::{CoarseZone, Region},
};

/// Which coarse-zone attribute the region table is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKey {
    /// Region code carried by the coarse layer (e.g. a county FIPS code).
    Fips,
    /// Coarse zone id itself.
    CoarseId,
}

impl RegionKey {
    pub fn column(&self) -> &'static str {
        match self {
            RegionKey::Fips => "region_fips",
            RegionKey::CoarseId => "coarse_id",
        }
    }
}

/// Reference table mapping coarse zones to administrative regions.
#[derive(Debug, Clone)]
pub struct RegionTable {
    key: RegionKey,
    regions: AHashMap<String, Region>,
}

impl RegionTable {
    /// Build a table from (key, region) entries. Repeated keys must agree.
    pub fn new(key: RegionKey, entries: impl IntoIterator<Item = (String, Region)>) -> Result<Self> {
        let mut regions = AHashMap::new();
        for (code, region) in entries {
            match regions.get(&code) {
                Some(existing) if existing != &region => {
                    return Err(CrosswalkError::Config(format!(
                        "region table has conflicting entries for {} {code:?}: {existing:?} vs {region:?}", key.column()
                    )))
                }
                Some(_) => {}
                None => { regions.insert(code, region); }
            }
        }
        Ok(Self { key, regions })
    }

    /// Build a table from a text DataFrame with `region_id`, `region_name`, and
    /// either `region_fips` or `coarse_id`.
    pub fn from_dataframe(df: &DataFrame, config: &CrosswalkConfig) -> Result<Self> {
        let names = df.get_column_names();
        let key = if names.iter().any(|c| c.as_str() == RegionKey::Fips.column()) {
            RegionKey::Fips
        } else {
            RegionKey::CoarseId
        };

        let keys = string_column(df, key.column(), "regions")?;
        let ids = string_column(df, "region_id", "regions")?;
        let labels = string_column(df, "region_name", "regions")?;

        let entries = keys.into_iter().zip(ids).zip(labels).enumerate()
            .map(|(row, ((code, id), name))| {
                let missing = |column: &str| CrosswalkError::MissingAttribute {
                    layer: "regions".into(),
                    column: column.into(),
                    row,
                };
                let code = code.ok_or_else(|| missing(key.column()))?;
                let code = match key {
                    RegionKey::Fips => config.normalize_code(code),
                    RegionKey::CoarseId => code.to_string(),
                };
                Ok((code, Region {
                    id: id.ok_or_else(|| missing("region_id"))?.to_string(),
                    name: name.ok_or_else(|| missing("region_name"))?.to_string(),
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(key, entries)
    }

    /// Read a region table from CSV.
    pub fn read_csv(path: &Path, config: &CrosswalkConfig) -> Result<Self> {
        let table = Self::from_dataframe(&read_string_csv(path)?, config)?;
        debug!(path = %path.display(), key = table.key.column(), regions = table.len(), "read region table");
        Ok(table)
    }

    #[inline] pub fn key(&self) -> RegionKey { self.key }

    #[inline] pub fn len(&self) -> usize { self.regions.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    /// Region for a coarse zone. A missing mapping is always an error.
    pub fn lookup(&self, zone: &CoarseZone) -> Result<&Region> {
        let code = match self.key {
            RegionKey::Fips => zone.region_code.as_deref().unwrap_or_default(),
            RegionKey::CoarseId => zone.id.as_str(),
        };
        self.regions.get(code).ok_or_else(|| CrosswalkError::UnknownRegion {
            coarse_id: zone.id.clone(),
            key: code.to_string(),
        })
    }
}
