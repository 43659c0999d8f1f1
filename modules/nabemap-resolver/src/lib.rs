pub mod adjacency;
pub mod containment;
pub mod geojson;
pub mod geometry;
pub mod resolver;
pub mod set;
pub mod source;

pub use adjacency::{find_adjacent, AdjacencyReason, AdjacentMatch};
pub use containment::find_containing;
pub use geojson::{features_to_collection, neighborhood_to_feature};
pub use resolver::{NeighborhoodResolver, Resolution};
pub use set::NeighborhoodSet;
pub use source::{DatasetSource, FileSource, StaticSource};
