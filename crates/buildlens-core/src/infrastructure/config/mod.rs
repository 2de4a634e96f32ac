mod env;
pub mod interpolation;
pub mod loader;
pub mod schema;

pub use env::EnvSnapshot;
pub use interpolation::interpolate_with;
pub use loader::{
    ConfigLoadError,
    ConfigLoadResult,
    ConfigLoader,
    Settings,
    CONFIG_PATH_VAR,
};
pub use schema::{
    AnalysisConfig,
    BuildLensConfig,
    HttpConfig,
    InstanceFileConfig,
};
