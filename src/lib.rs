//! Reader and validator for Code Surveyor config files.
//!
//! ```no_run
//! use surveyor_config::{config::ConfigReader, modules::BuiltinRegistry};
//!
//! let reader = ConfigReader::new(BuiltinRegistry::new());
//! for entry in reader.read_file("surveyor.code")? {
//!     println!("{entry}");
//! }
//! # Ok::<(), surveyor_config::config::ConfigError>(())
//! ```

pub mod config;
pub mod fileext;
pub mod logging;
pub mod modules;
pub mod settings;
