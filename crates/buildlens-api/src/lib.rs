pub mod error;
pub mod transport;
pub mod types;
pub mod utils;

pub use error::{
    LensError,
    LensResult,
};
pub use transport::JenkinsTransport;
pub use types::{
    normalize_base_url,
    BuildInfo,
    BuildRef,
    BuildStatus,
    ErrorSnippet,
    GitReference,
    JenkinsInstance,
    JobReference,
    LogExtraction,
};
pub use utils::RetryPolicy;
