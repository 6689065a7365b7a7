use geo::MultiPolygon;

use super::ZoneId;

/// Smallest unit of the hierarchy, owned by exactly one medium zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FineZone {
    pub id: ZoneId,
    pub medium_id: ZoneId,
}

/// Union of the fine zones sharing a medium id. Geometry is derived; the id is authoritative.
#[derive(Debug, Clone)]
pub struct MediumZone {
    pub id: ZoneId,
    pub geometry: MultiPolygon<f64>,
    pub fine_count: usize,
}

/// Zone of the independent coarse system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoarseZone {
    pub id: ZoneId,
    pub region_code: Option<String>, // Region attribute from the coarse layer, if present
}

/// Administrative region attached to coarse zones through the reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: String,
    pub name: String,
}

/// One output row per fine zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrosswalkRecord {
    pub fine_id: ZoneId,
    pub medium_id: ZoneId,
    pub coarse_id: ZoneId,
    pub region_id: String,
    pub region_name: String,
}

impl CrosswalkRecord {
    /// Canonical column order of the written crosswalk.
    pub const COLUMNS: [&'static str; 5] = ["fine_id", "medium_id", "coarse_id", "region_id", "region_name"];
}
