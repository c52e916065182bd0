//! Bandwidth measurements and guard fractions for Tor directory authorities.
//!
//! # Overview
//!
//! This crate is part of
//! [Arti](https://gitlab.torproject.org/tpo/core/arti/), a project to
//! implement [Tor](https://www.torproject.org/) in Rust.
//!
//! A directory authority doesn't take relays' word for how much
//! bandwidth they have.  Instead, it reads a "bandwidth file" produced by
//! a separate scanner, and votes on the measured values.  It can also
//! read a "guardfraction file" describing how long each relay has been a
//! guard.  This crate parses both kinds of file and applies them to the
//! routerstatus entries of a vote under construction.
//!
//! Measurements are also kept in a [`MeasuredBwCache`], so that a relay
//! which drops out of one bandwidth file keeps its last measurement for a
//! few days.
//!
//! Files can be read on a background thread with the functions in
//! [`worker`]; applying them always happens on the caller's thread.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

mod bwcache;
mod bwfile;
mod bwline;
mod err;
mod guardfraction;
mod loader;
mod vote;
pub mod worker;

pub use bwcache::{CachedMeasurement, MeasuredBwCache, MAX_MEASUREMENT_AGE};
pub use bwfile::{
    read_measured_bandwidths, read_measured_bandwidths_file, BwFile, BwFileSummary,
    BW_FILE_TERMINATOR, MAX_BW_FILE_HEADERS,
};
pub use bwline::{is_valid_header_line, MeasuredBwLine, MAX_HEADER_LINE_LEN, MAX_NICKNAME_LEN};
pub use err::Error;
pub use guardfraction::{
    read_guardfraction_file, read_guardfraction_file_from_str, GuardFractionFile,
    GuardFractionSummary, GuardSeen, MAX_GUARDFRACTION_FILE_AGE,
};
pub use loader::{FileLoader, FsLoader};
pub use vote::{VoteRouterStatus, VoteRouterStatusSet};

/// A Result as returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;
