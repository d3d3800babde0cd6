//! Populate typed configuration records from files, environment variables
//! and command-line flags, with explicit precedence.
//!
//! copre fills one destination value, your config struct, from any number of
//! sources. Each source is a [`Loader`]. Loaders run in the order you add
//! them and each one overrides what came before, so the last source wins.
//! Whatever the struct held before loading ranks below every source and acts
//! as its defaults.
//!
//! ```ignore
//! let mut config = Config { port: 8080, ..Config::default() };
//! Copre::builder(&mut config)
//!     .file(FileLoader::toml("app.toml").ignore_not_found(true))
//!     .flags(&ClapFlags::new(&command, &matches))
//!     .env(EnvLoader::new().prefix("APP"))
//!     .build()?;
//! ```
//!
//! # Making a type loadable
//!
//! A destination implements [`Record`], listing its fields in declaration
//! order together with their annotations. Leaf fields are any type
//! implementing [`Leaf`]: the primitives, `String`, `PathBuf`, `Duration`,
//! IP addresses and networks, and `Vec`/`HashMap`/`BTreeMap`/`Option` of
//! those. Nested records and `Option`al nested records are visited through
//! their own `visit` methods.
//!
//! Field annotations are `key:value` tags on the [`Field`] descriptor:
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `env:"NAME"` | read this environment variable instead of the computed one |
//! | `env:"NAME,noprefix"` | ...and do not prepend the loader's prefix |
//! | `env:",hex"` / `env:",base64"` | decode a byte field from hex or base64 |
//! | `flag:"name"` | bind the field to the flag called `name` |
//!
//! Fields marked [`internal()`](Field::internal) are never populated.
//!
//! # How layering works
//!
//! [`load`] gives each loader a fresh, zero-valued snapshot of the
//! destination type. The loader fills in what it can resolve. The snapshot is
//! then deep-merged into the destination with [`merge`]: every non-zero leaf
//! overwrites, zero leaves do nothing, nested records merge field by field.
//!
//! Two consequences follow from merging by zero-ness:
//!
//! - a source that sets a field to its zero value (`0`, `""`, `false`, an
//!   empty list) cannot override a non-zero default;
//! - an optional nested record stays unset unless some source provides a
//!   non-zero value inside it.
//!
//! The first failing loader aborts the load. Destinations are partially
//! updated by then: merges of the earlier loaders are not rolled back.
//!
//! # Sources
//!
//! - **Files**: [`FileLoader`] reads one file through a [`Decode`]r
//!   ([`Toml`], [`Json`] or any closure). Search paths add alternative
//!   locations; the first existing file wins, or all of them are merged in
//!   order with [`merge_all`](FileLoader::merge_all). A missing file is an
//!   error unless [`ignore_not_found`](FileLoader::ignore_not_found) is set.
//!
//! - **Environment**: [`EnvLoader`] computes a key per leaf,
//!   `DATABASE_POOL_SIZE` for `Database.PoolSize` by default, optionally
//!   prefixed, and converts the string value with [`Converter`]. The
//!   environment is read through an [`EnvSource`] so tests can inject one.
//!
//! - **Flags**: [`FlagLoader`] reads any [`FlagStore`]. Only flags the user
//!   actually passed count, unless defaults are requested. With the `clap`
//!   feature, `ClapFlags` adapts parsed clap matches.
//!
//! - **Anything else**: a closure `Fn(&mut R) -> Result<(), CopreError>` is a
//!   loader too.
//!
//! # String conversion
//!
//! [`convert`] is the textual front door used by the environment loader:
//! integers in any Rust-style radix, booleans, floats, durations
//! (`1h 30m`), IP addresses, masks and networks, lists (`a,b,c`) and maps
//! (`k=v,k2=v2`) with configurable delimiters. Conversions never silently
//! truncate; out-of-range numbers are errors.
//!
//! # Error handling
//!
//! Every fallible operation returns [`CopreError`]. Conversion failures carry
//! the field path and a [`ConvertError`] describing the rejected input.

pub mod error;
pub mod naming;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod convert;
mod decode;
mod env;
mod file;
mod flags;
mod leaf;
mod loader;
mod merge;
mod record;
mod value;
mod walk;

#[cfg(test)]
mod fixtures;

pub use builder::{Builder, Copre};
#[cfg(feature = "clap")]
pub use cli::ClapFlags;
pub use convert::{Converter, convert};
pub use decode::{Decode, Json, Toml};
pub use env::{EnvLoader, EnvSource, ProcessEnv};
pub use error::{BoxError, ConvertError, CopreError};
pub use file::{FileLoader, SearchPath};
pub use flags::{Flag, FlagLoader, FlagStore, MemoryFlags, collect_flags};
pub use leaf::{Leaf, Slot};
pub use loader::{Loader, load};
pub use merge::merge;
pub use record::{Field, FieldPath, OptionalRecord, Record, Visitor};
pub use value::{InvalidMask, Ipv4Mask, Kind, Value};
pub use walk::walk;
