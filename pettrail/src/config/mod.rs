//! User configuration for the telemetry pipeline.
//!
//! Configuration lives in `~/.pettrail/config.ini`. Settings structs are in
//! [`settings`], default values in [`defaults`], and the INI file handling
//! (load, save, validation errors) in [`file`].

pub mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ConfigFile, DeliverySettings, IngestSettings, LoggingSettings, QueueSettings, SamplingSettings,
};
