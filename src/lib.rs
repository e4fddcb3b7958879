//! Bind a flat namespace of dotted properties onto a typed, nested
//! configuration graph.
//!
//! Confbind takes `name = value` pairs (from files, environment variables,
//! `-D` definitions, whatever has already been merged upstream) and maps them
//! onto configuration roots described by a declarative schema. Binding happens
//! once, while the application starts; afterwards the graph is frozen and only
//! the attributes declared runtime-overridable can change.
//!
//! ```ignore
//! let mut definition = ConfigDefinition::new();
//! definition.register_root(server_root)?;
//!
//! let mut config = Interpreter.materialize(&definition, MaterializePhase::Build)?;
//! let report = Loader::default().load_into(&source, &definition, &mut config)?;
//! let server: ServerSettings = config.root("ServerConfig")?;
//! ```
//!
//! # The pipeline
//!
//! ```text
//! RootDecl ──register_root──▶ ConfigDefinition   (descriptor tree + pattern index)
//!                                  │
//!                         Materializer::materialize
//!                                  ▼
//!                            RealizedConfig       (every root at its defaults)
//!                                  │
//!                 Loader::load ◀── PropertySource
//!                                  ▼
//!                            RealizedConfig       (overrides applied)
//!                                  │
//!                               freeze
//!                                  ▼
//!                             FrozenConfig ◀── Loader::re_resolve
//! ```
//!
//! Each stage is an explicit value you create and hand on. There is no global
//! registry; two definitions in one process never see each other.
//!
//! # Schemas
//!
//! A schema is plain data (see [`schema`]): a root wraps a group, and each
//! group field has a [`Shape`](schema::Shape): nested group, primitive, map,
//! list, optional, or plain object. Schemas can be written by hand or derived
//! from a `confique::Config` struct with [`introspect::root_from_config`].
//!
//! Registration derives every leaf's fully qualified pattern:
//!
//! - **Root names** come from the type name, `ServerConfig` → `server`, or an
//!   explicit (possibly dotted) name such as `log.file`.
//! - **Field names** are hyphenated by default (`max_backup_index` →
//!   `max-backup-index`); a field may keep its identifier, take an explicit
//!   name, or contribute no segment at all and inherit its parent's.
//! - **Maps** contribute a `{*}` wildcard segment. Any key may appear there,
//!   and quoted segments (`regions."eu.west".label`) allow keys with dots.
//!
//! Malformed schemas fail at registration with a schema error (see
//! [`BindError::is_schema_error`]), and a failed registration leaves the
//! definition exactly as it was.
//!
//! # Defaults
//!
//! Every leaf has a canonical default string: the declared one, or `false` for
//! booleans, `0` for numbers, and empty for everything else. An empty string
//! means "no value": an unset path, an empty list, an absent optional. Defaults
//! are converted once at registration, so a bad default is a schema error
//! rather than a surprise at load time.
//!
//! # Matching
//!
//! Property names start with the loader's namespace (`app` unless configured
//! otherwise); the rest is matched segment by segment against the pattern
//! index. A literal segment always beats the wildcard, and the matcher never
//! backtracks: if `server.regions.default` is a literal branch, the name
//! `app.server.regions.default.label` can only match below it.
//!
//! Names outside the namespace are reported as unmatched. Namespaced names
//! that match nothing are logged with `tracing::warn!` and listed in the
//! [`LoadReport`], unless the loader has them on its exception list. Neither
//! case is an error; a value that does not convert is.
//!
//! # Materialization
//!
//! Two strategies implement [`Materializer`]. The [`Interpreter`] walks the
//! descriptor tree. A [`ConstructionPlan`] is compiled from the tree once, with
//! every default already converted, and can be stored as JSON and replayed on
//! the next start. A plan remembers the fingerprint of the schema it was
//! compiled from and refuses to run against any other.
//!
//! [`MaterializePhase::Runtime`] skips build-time-only roots.
//!
//! # Runtime values
//!
//! [`RealizedConfig::freeze`] puts the graph behind an `Arc` and creates a
//! [`RuntimeCell`] for each runtime-overridable attribute. Cells are
//! `arc_swap` slots: [`Loader::re_resolve`] reads their properties again and
//! swaps in new values while readers keep going.
//!
//! # Error handling
//!
//! All fallible operations return [`BindError`]. Messages are written for the
//! person fixing the configuration: schema errors name the type and field,
//! conversion errors name the property and its value. See the [`error`] module
//! for the full set.

pub mod convert;
pub mod definition;
pub mod descriptor;
pub mod error;
pub mod introspect;
pub mod loader;
pub mod materialize;
pub mod name;
pub mod pattern;
pub mod runtime;
pub mod schema;
pub mod source;
pub mod types;
pub mod value;

#[cfg(feature = "clap")]
mod cli;
mod extract;
mod registrar;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::PropertyArgs;
pub use definition::ConfigDefinition;
pub use error::BindError;
pub use loader::{LoadReport, LoadTarget, Loader};
pub use materialize::{ConstructionPlan, Interpreter, Materializer, RealizedConfig};
pub use runtime::{FrozenConfig, RuntimeCell};
pub use source::{MapSource, PropertySource};
pub use types::{ConfigPhase, MaterializePhase};
pub use value::{Group, Value};
