#![doc = "Zonewalk: hierarchical zone crosswalks by area of overlap"]
mod common;
mod config;
mod crosswalk;
mod error;
mod geom;
mod io;
mod layer;
mod types;

#[doc(inline)]
pub use config::{AliasConfig, CrosswalkConfig, FallbackLog, FallbackPolicy, MinOverlap};

#[doc(inline)]
pub use crosswalk::{
    aggregate, assemble, ConsistencyValidator, Crosswalk, CrosswalkRun, OverlapResolver, Pipeline, RegionKey,
    RegionTable, Resolution, ResolutionMethod, ResolutionSummary,
};

#[doc(inline)]
pub use error::{CrosswalkError, Result};

#[doc(inline)]
pub use geom::Crs;

#[doc(inline)]
pub use io::read_shapefile;

#[doc(inline)]
pub use layer::{inspect, load_layers, CoarseLayer, FineLayer, LayerInfo, RawLayer};

#[doc(inline)]
pub use types::{CoarseZone, CrosswalkRecord, FineZone, MediumZone, Region, ZoneId, ZoneLevel};
