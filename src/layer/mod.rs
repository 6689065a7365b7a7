mod info;
mod load;
mod raw;

pub use info::{inspect, LayerInfo};
pub use load::{load_layers, CoarseLayer, FineLayer};
pub use raw::RawLayer;
