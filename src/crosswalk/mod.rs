mod aggregator;
mod assembler;
mod pipeline;
mod region;
mod resolve;
mod validate;

pub use aggregator::aggregate;
pub use assembler::{assemble, Crosswalk};
pub use pipeline::{CrosswalkRun, Pipeline};
pub use region::{RegionKey, RegionTable};
pub use resolve::{OverlapResolver, Resolution, ResolutionMethod, ResolutionSummary};
pub use validate::ConsistencyValidator;
