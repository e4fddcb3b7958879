//! Clap adapter for property definitions.
//!
//! This module is the optional bridge between the engine and the
//! [clap](https://docs.rs/clap) CLI parser. It is compiled only when the `clap`
//! Cargo feature is enabled (on by default).
//!
//! [`PropertyArgs`] adds a repeatable `-D name=value` flag to your clap
//! `#[derive(Parser)]` struct, the way JVM-style tools accept system
//! properties. [`PropertyArgs::into_source()`] turns the parsed definitions
//! into a [`MapSource`] ready for the [`Loader`](crate::Loader).
//!
//! If you use a different CLI parser (or no CLI at all), skip this module and
//! fill a [`MapSource`] directly.

use clap::Args;

use crate::error::BindError;
use crate::source::MapSource;

/// Clap-derived property definitions.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     properties: PropertyArgs,
/// }
/// ```
#[derive(Debug, Args)]
pub struct PropertyArgs {
    /// Set a configuration property (e.g. -D app.server.threads=20).
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE")]
    pub defines: Vec<String>,
}

impl PropertyArgs {
    /// Collect the definitions in command-line order. A later definition of the
    /// same name wins. `-D name=` defines an empty value, which restores the
    /// default.
    pub fn into_source(self) -> Result<MapSource, BindError> {
        let mut source = MapSource::new();
        for define in self.defines {
            let Some((name, value)) = define.split_once('=') else {
                return Err(BindError::InvalidDefinition(define));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(BindError::InvalidDefinition(define));
            }
            source.insert(name, value);
        }
        Ok(source)
    }
}
