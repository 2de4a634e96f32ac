pub mod application;
pub mod infrastructure;
pub mod logging;

pub use application::{
    Analysis,
    BuildInfoReport,
    BuildLensService,
    ConsoleLogReport,
    ErrorAnalysisReport,
    GitReferencesReport,
    InstancesReport,
};
pub use infrastructure::{
    ConfigLoadError,
    ConfigLoader,
    Settings,
};
