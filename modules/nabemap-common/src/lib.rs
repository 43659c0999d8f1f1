pub mod types;
pub mod config;
pub mod error;
pub mod file_config;

pub use types::*;
pub use config::AppConfig;
pub use error::{DatasetError, GeometryError, GeometryResult, ResolverError, ResolverResult};
pub use file_config::{load_config, FileConfig};
