//! layertype: detect, convert and reconcile container image layer media types
//!
//! The heavy lifting lives in [`layertype_oci`]; this crate adds
//! configuration, the stack-file format and the command implementations used
//! by the `layertype` binary.
//!
//! # Example
//!
//! ```no_run
//! use layertype::{commands, Config};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(None)?;
//!     let media_type = commands::detect(
//!         &config,
//!         "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
//!     )?;
//!     println!("{media_type}");
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod stack;

pub use config::Config;
pub use error::{Error, Result};
pub use layertype_oci as oci;
