use std::path::Path;

use ahash::AHashMap;
use polars::{frame::DataFrame, prelude::{Column, NamedFrom}};
use tracing::debug;

use crate::{
    crosswalk::{RegionTable, Resolution},
    error::{CrosswalkError, Result},
    io::{read_string_csv, string_column, write_csv_bytes},
    layer::{CoarseLayer, FineLayer},
    types::{CrosswalkRecord, Region, ZoneId},
};

/// The finished fine-zone crosswalk, sorted by fine id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crosswalk {
    records: Vec<CrosswalkRecord>,
}

impl Crosswalk {
    /// Build a crosswalk from records, sorting them by fine id.
    pub fn new(mut records: Vec<CrosswalkRecord>) -> Self {
        records.sort_by(|a, b| a.fine_id.cmp(&b.fine_id));
        Self { records }
    }

    #[inline] pub fn records(&self) -> &[CrosswalkRecord] { &self.records }

    #[inline] pub fn len(&self) -> usize { self.records.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Convert to a DataFrame with the canonical column order.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let [fine, medium, coarse, region_id, region_name] = CrosswalkRecord::COLUMNS;
        Ok(DataFrame::new(vec![
            Column::new(fine.into(), self.records.iter().map(|r| r.fine_id.as_str()).collect::<Vec<_>>()),
            Column::new(medium.into(), self.records.iter().map(|r| r.medium_id.as_str()).collect::<Vec<_>>()),
            Column::new(coarse.into(), self.records.iter().map(|r| r.coarse_id.as_str()).collect::<Vec<_>>()),
            Column::new(region_id.into(), self.records.iter().map(|r| r.region_id.as_str()).collect::<Vec<_>>()),
            Column::new(region_name.into(), self.records.iter().map(|r| r.region_name.as_str()).collect::<Vec<_>>()),
        ])?)
    }

    /// Read a written crosswalk CSV.
    pub fn read_csv(path: &Path) -> Result<Self> {
        Self::from_dataframe(&read_string_csv(path)?)
    }

    /// Serialize to CSV bytes.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        write_csv_bytes(&mut self.to_dataframe()?)
    }

    /// Rebuild a crosswalk from a written table. Empty assignment cells are kept
    /// as empty strings so validation can report them.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let [fine, medium, coarse, region_id, region_name] = CrosswalkRecord::COLUMNS
            .map(|name| string_column(df, name, "crosswalk"));
        let (fine, medium, coarse, region_id, region_name) = (fine?, medium?, coarse?, region_id?, region_name?);

        let records = (0..df.height())
            .map(|row| {
                let required = |values: &[Option<&str>], column: &str| {
                    values[row].map(ZoneId::new).ok_or_else(|| CrosswalkError::MissingAttribute {
                        layer: "crosswalk".into(),
                        column: column.into(),
                        row,
                    })
                };
                Ok(CrosswalkRecord {
                    fine_id: required(&fine, CrosswalkRecord::COLUMNS[0])?,
                    medium_id: required(&medium, CrosswalkRecord::COLUMNS[1])?,
                    coarse_id: ZoneId::new(coarse[row].unwrap_or_default()),
                    region_id: region_id[row].unwrap_or_default().to_string(),
                    region_name: region_name[row].unwrap_or_default().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { records })
    }
}

/// Propagate each medium zone's coarse assignment to its fine zones and attach regions.
///
/// Regions are looked up once per assigned coarse zone, in medium-id order, so the
/// first unknown region reported is the same on every run. Fine zones whose medium
/// zone has no resolution are left out; the validator rejects the result.
pub fn assemble(
    fine: &FineLayer,
    coarse: &CoarseLayer,
    resolutions: &[Resolution],
    regions: &RegionTable,
) -> Result<Crosswalk> {
    let mut region_of: AHashMap<usize, &Region> = AHashMap::new();
    let mut assigned: AHashMap<&ZoneId, (&ZoneId, &Region)> = AHashMap::with_capacity(resolutions.len());

    for resolution in resolutions {
        let region = match region_of.get(&resolution.coarse_index) {
            Some(region) => *region,
            None => {
                let region = regions.lookup(coarse.zone(resolution.coarse_index))?;
                region_of.insert(resolution.coarse_index, region);
                region
            }
        };
        assigned.insert(&resolution.medium_id, (&resolution.coarse_id, region));
    }

    let records = fine.zones().iter()
        .filter_map(|zone| {
            let (coarse_id, region) = assigned.get(&zone.medium_id)?;
            Some(CrosswalkRecord {
                fine_id: zone.id.clone(),
                medium_id: zone.medium_id.clone(),
                coarse_id: (*coarse_id).clone(),
                region_id: region.id.clone(),
                region_name: region.name.clone(),
            })
        })
        .collect::<Vec<_>>();

    debug!(records = records.len(), regions = region_of.len(), "assembled crosswalk");
    Ok(Crosswalk::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fine: &str, medium: &str, coarse: &str) -> CrosswalkRecord {
        CrosswalkRecord {
            fine_id: ZoneId::new(fine),
            medium_id: ZoneId::new(medium),
            coarse_id: ZoneId::new(coarse),
            region_id: "1".into(),
            region_name: "North".into(),
        }
    }

    #[test]
    fn records_sort_by_fine_id() {
        let crosswalk = Crosswalk::new(vec![record("10", "1", "7"), record("9", "1", "7"), record("100", "2", "7")]);
        let ids = crosswalk.records().iter().map(|r| r.fine_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["9", "10", "100"]);
    }

    #[test]
    fn csv_has_canonical_header() {
        let crosswalk = Crosswalk::new(vec![record("1", "10", "101")]);
        let text = String::from_utf8(crosswalk.to_csv_bytes().unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("fine_id,medium_id,coarse_id,region_id,region_name"));
        assert_eq!(lines.next(), Some("1,10,101,1,North"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn dataframe_round_trip_keeps_empty_cells() {
        let mut blank = record("2", "10", "");
        blank.region_name = String::new();
        let crosswalk = Crosswalk::new(vec![record("1", "10", "101"), blank]);
        let back = Crosswalk::from_dataframe(&crosswalk.to_dataframe().unwrap()).unwrap();
        assert_eq!(back.records()[1].coarse_id.as_str(), "");
        assert_eq!(back.records()[1].region_name, "");
        assert_eq!(back.records()[0], crosswalk.records()[0]);
    }
}
