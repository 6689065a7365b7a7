mod zone;
mod zone_id;
mod zone_level;

pub use zone::{CoarseZone, CrosswalkRecord, FineZone, MediumZone, Region};
pub use zone_id::ZoneId;
pub use zone_level::ZoneLevel;
