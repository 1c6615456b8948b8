//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, BatchConfig, IdentifyConfig, LoaderConfig, LogFormat, LoggingConfig,
};
