mod defaults;
mod load;
mod paths;
mod types;

pub use load::{load, load_from_path};
pub use paths::config_path;
pub use types::{Config, ConfigError, Result};
