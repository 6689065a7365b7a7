use std::collections::BTreeSet;

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::{
    crosswalk::Crosswalk,
    error::{CrosswalkError, Result},
    types::{FineZone, ZoneId, ZoneLevel},
};

/// Post-assembly checks. A crosswalk that fails any of them is never written.
#[derive(Debug)]
pub struct ConsistencyValidator<'a> {
    fine: &'a [FineZone],
}

impl<'a> ConsistencyValidator<'a> {
    pub fn new(fine: &'a [FineZone]) -> Self {
        Self { fine }
    }

    /// Run the coverage checks in order: record count, duplicate fine ids, missing
    /// fine ids, empty assignment fields, unresolved medium zones.
    pub fn check<'b>(&self, crosswalk: &Crosswalk, resolved: impl IntoIterator<Item = &'b ZoneId>) -> Result<()> {
        let records = crosswalk.records();
        if records.len() != self.fine.len() {
            return Err(CrosswalkError::coverage(
                "crosswalk",
                format!("{} records for {} fine zones", records.len(), self.fine.len()),
            ));
        }

        let mut seen = AHashSet::with_capacity(records.len());
        if let Some(dup) = records.iter().find(|r| !seen.insert(&r.fine_id)) {
            return Err(CrosswalkError::coverage(
                format!("{} zone {}", ZoneLevel::Fine, dup.fine_id),
                "fine id appears more than once",
            ));
        }

        if let Some(missing) = self.fine.iter().map(|z| &z.id).filter(|id| !seen.contains(id)).min() {
            return Err(CrosswalkError::coverage(
                format!("{} zone {missing}", ZoneLevel::Fine),
                "fine zone has no crosswalk record",
            ));
        }

        for record in records {
            let empty = [
                ("coarse_id", record.coarse_id.as_str()),
                ("region_id", record.region_id.as_str()),
                ("region_name", record.region_name.as_str()),
            ]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty());
            if let Some((field, _)) = empty {
                return Err(CrosswalkError::coverage(
                    format!("{} zone {}", ZoneLevel::Fine, record.fine_id),
                    format!("record has no {field}"),
                ));
            }
        }

        let resolved = resolved.into_iter().collect::<AHashSet<_>>();
        if let Some(missing) = self.fine.iter().map(|z| &z.medium_id).filter(|id| !resolved.contains(id)).min() {
            return Err(CrosswalkError::coverage(
                format!("{} zone {missing}", ZoneLevel::Medium),
                "medium zone has no resolved coarse zone",
            ));
        }

        debug!(records = records.len(), "crosswalk passed coverage checks");
        Ok(())
    }

    /// Check that every record names the medium zone its fine zone belongs to.
    pub fn check_parents(&self, crosswalk: &Crosswalk) -> Result<()> {
        let parent_of = self.fine.iter().map(|z| (&z.id, &z.medium_id)).collect::<AHashMap<_, _>>();
        let mismatch = crosswalk.records().iter().find_map(|r| {
            let medium = parent_of.get(&r.fine_id)?;
            (**medium != r.medium_id).then_some((r, *medium))
        });
        match mismatch {
            Some((record, medium)) => Err(CrosswalkError::coverage(
                format!("{} zone {}", ZoneLevel::Fine, record.fine_id),
                format!("record names medium zone {} but the fine layer says {medium}", record.medium_id),
            )),
            None => Ok(()),
        }
    }

    /// Check that all fine zones of a medium zone share one coarse zone and region.
    pub fn check_inheritance(&self, crosswalk: &Crosswalk) -> Result<()> {
        let mut parent: AHashMap<&ZoneId, (&ZoneId, &str)> = AHashMap::new();
        let mut conflicts = BTreeSet::new();
        for record in crosswalk.records() {
            let entry = parent.entry(&record.medium_id).or_insert((&record.coarse_id, record.region_id.as_str()));
            if *entry != (&record.coarse_id, record.region_id.as_str()) {
                conflicts.insert(&record.medium_id);
            }
        }

        match conflicts.first() {
            Some(medium) => Err(CrosswalkError::coverage(
                format!("{} zone {medium}", ZoneLevel::Medium),
                "fine zones of one medium zone map to different coarse zones or regions",
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CrosswalkRecord;

    fn fine(pairs: &[(&str, &str)]) -> Vec<FineZone> {
        pairs.iter().map(|(id, medium)| FineZone { id: ZoneId::new(id), medium_id: ZoneId::new(medium) }).collect()
    }

    fn record(fine: &str, medium: &str, coarse: &str, region: &str) -> CrosswalkRecord {
        CrosswalkRecord {
            fine_id: ZoneId::new(fine),
            medium_id: ZoneId::new(medium),
            coarse_id: ZoneId::new(coarse),
            region_id: region.into(),
            region_name: format!("Region {region}"),
        }
    }

    fn resolved(ids: &[&str]) -> Vec<ZoneId> {
        ids.iter().map(ZoneId::new).collect()
    }

    #[test]
    fn complete_crosswalk_passes() {
        let zones = fine(&[("1", "10"), ("2", "10")]);
        let crosswalk = Crosswalk::new(vec![record("1", "10", "7", "1"), record("2", "10", "7", "1")]);
        let validator = ConsistencyValidator::new(&zones);
        validator.check(&crosswalk, &resolved(&["10"])).unwrap();
        validator.check_inheritance(&crosswalk).unwrap();
    }

    #[test]
    fn count_mismatch_is_incomplete() {
        let zones = fine(&[("1", "10"), ("2", "10")]);
        let crosswalk = Crosswalk::new(vec![record("1", "10", "7", "1")]);
        let err = ConsistencyValidator::new(&zones).check(&crosswalk, &resolved(&["10"])).unwrap_err();
        assert!(matches!(err, CrosswalkError::IncompleteCoverage { .. }));
    }

    #[test]
    fn duplicate_fine_id_is_incomplete() {
        let zones = fine(&[("1", "10"), ("2", "10")]);
        let crosswalk = Crosswalk::new(vec![record("1", "10", "7", "1"), record("1", "10", "7", "1")]);
        let err = ConsistencyValidator::new(&zones).check(&crosswalk, &resolved(&["10"])).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn empty_region_is_incomplete() {
        let zones = fine(&[("1", "10")]);
        let crosswalk = Crosswalk::new(vec![record("1", "10", "7", "")]);
        let err = ConsistencyValidator::new(&zones).check(&crosswalk, &resolved(&["10"])).unwrap_err();
        assert!(err.to_string().contains("region_id"));
    }

    #[test]
    fn unresolved_medium_is_incomplete() {
        let zones = fine(&[("1", "10"), ("2", "20")]);
        let crosswalk = Crosswalk::new(vec![record("1", "10", "7", "1"), record("2", "20", "7", "1")]);
        let err = ConsistencyValidator::new(&zones).check(&crosswalk, &resolved(&["10"])).unwrap_err();
        assert!(err.to_string().contains("20"));
    }

    #[test]
    fn wrong_parent_is_reported() {
        let zones = fine(&[("1", "10")]);
        let crosswalk = Crosswalk::new(vec![record("1", "11", "7", "1")]);
        let err = ConsistencyValidator::new(&zones).check_parents(&crosswalk).unwrap_err();
        assert!(err.to_string().contains("medium zone 11"));
    }

    #[test]
    fn split_medium_zone_fails_inheritance() {
        let zones = fine(&[("1", "10"), ("2", "10")]);
        let crosswalk = Crosswalk::new(vec![record("1", "10", "7", "1"), record("2", "10", "9", "1")]);
        assert!(ConsistencyValidator::new(&zones).check_inheritance(&crosswalk).is_err());
    }
}
