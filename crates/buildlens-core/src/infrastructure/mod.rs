pub mod config;

pub use config::{
    ConfigLoadError,
    ConfigLoader,
    Settings,
};
