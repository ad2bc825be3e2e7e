//! Settings for the backend, the catalog, polling, audio analysis and the
//! mirror display, layered from defaults, a TOML file and `MIRRORTUNE__*`
//! environment variables.

mod load;
mod schema;

pub use load::default_log_path;
pub use schema::*;
