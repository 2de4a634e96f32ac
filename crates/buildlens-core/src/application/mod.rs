pub mod report;
mod service;

pub use report::{
    Analysis,
    BuildInfoReport,
    ConsoleLogReport,
    ErrorAnalysisReport,
    GitReferencesReport,
    InstanceSummary,
    InstancesReport,
    JobSummary,
};
pub use service::BuildLensService;
