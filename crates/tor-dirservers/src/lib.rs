//! Choosing the directory authorities and fallback caches to trust.
//!
//! # Overview
//!
//! This crate is part of
//! [Arti](https://gitlab.torproject.org/tpo/core/arti/), a project to
//! implement [Tor](https://www.torproject.org/) in Rust.
//!
//! Every Tor node needs to know, before it has any directory
//! information, which servers it can ask for some.  There are two kinds:
//! directory authorities, which vote on the consensus (or, for bridge
//! authorities, collect bridge descriptors), and fallback directory
//! caches, which just hold copies.  A node uses the ones that ship with
//! Tor unless its configuration says otherwise.
//!
//! Configuration is given as [`DirServerOptions`]: lines in the format
//! of Tor's `DirAuthority`, `AlternateBridgeAuthority`,
//! `AlternateDirAuthority`, and `FallbackDir` options.  A
//! [`DirServerRegistry`] turns those options into the lists of servers
//! in effect.
//!
//! # Examples
//!
//! ```
//! use tor_dirservers::{DirServerOptions, DirServerRegistry};
//! use tor_dircommon::DirInfo;
//!
//! # fn x() -> tor_dirservers::Result<()> {
//! let registry = DirServerRegistry::with_builtin_defaults();
//! let opts = DirServerOptions::default();
//! opts.validate()?;
//! registry.consider_adding_dir_servers(&opts, None)?;
//! assert!(registry.n_authorities(DirInfo::V3) > 0);
//! # Ok(()) }
//! # x().unwrap()
//! ```

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

mod config;
mod defaults;
mod dirserver;
mod err;
mod parse;
mod registry;
mod shared_ref;

pub use config::DirServerOptions;
pub use defaults::{BuiltinDefaults, DirServerDefaults, LineDefaults};
pub use dirserver::{DirServer, DirServerBuilder, DEFAULT_WEIGHT};
pub use err::Error;
pub use parse::{parse_dir_authority_line, parse_dir_fallback_line};
pub use registry::{DirServerLists, DirServerRegistry};

/// A Result as returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;
