//! Configuration for choosing directory servers.
//!
//! Each list holds the values of one kind of configuration line, such as
//! `DirAuthority`.  An empty list is treated as if it were unset.

use crate::parse::{parse_dir_authority_line, parse_dir_fallback_line};
use crate::{Error, Result};

use serde::Deserialize;
use tor_dircommon::DirInfo;

/// Options that control which directory servers a node trusts.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DirServerOptions {
    /// Authorities to use instead of the default ones.
    #[serde(default)]
    pub dir_authorities: Option<Vec<String>>,
    /// Bridge authorities to use instead of the default ones.
    #[serde(default)]
    pub alternate_bridge_authority: Option<Vec<String>>,
    /// v3 authorities to use instead of the default ones.
    #[serde(default)]
    pub alternate_dir_authority: Option<Vec<String>>,
    /// Fallback directory caches to use instead of the default ones.
    #[serde(default)]
    pub fallback_dir: Option<Vec<String>>,
    /// Whether to use the default fallbacks when nothing overrides them.
    #[serde(default = "default_use_default_fallback_dirs")]
    pub use_default_fallback_dirs: bool,
}

/// Default value for `use_default_fallback_dirs`.
fn default_use_default_fallback_dirs() -> bool {
    true
}

impl Default for DirServerOptions {
    fn default() -> Self {
        DirServerOptions {
            dir_authorities: None,
            alternate_bridge_authority: None,
            alternate_dir_authority: None,
            fallback_dir: None,
            use_default_fallback_dirs: default_use_default_fallback_dirs(),
        }
    }
}

/// Return the lines in `opt`, or None if there are none.
fn lines(opt: &Option<Vec<String>>) -> Option<&[String]> {
    match opt {
        Some(v) if !v.is_empty() => Some(&v[..]),
        _ => None,
    }
}

impl DirServerOptions {
    /// Return the configured `DirAuthority` lines, if any.
    pub fn dir_authority_lines(&self) -> Option<&[String]> {
        lines(&self.dir_authorities)
    }
    /// Return the configured `AlternateBridgeAuthority` lines, if any.
    pub fn alternate_bridge_lines(&self) -> Option<&[String]> {
        lines(&self.alternate_bridge_authority)
    }
    /// Return the configured `AlternateDirAuthority` lines, if any.
    pub fn alternate_dir_lines(&self) -> Option<&[String]> {
        lines(&self.alternate_dir_authority)
    }
    /// Return the configured `FallbackDir` lines, if any.
    pub fn fallback_lines(&self) -> Option<&[String]> {
        lines(&self.fallback_dir)
    }

    /// Check that these options make sense together, and that every
    /// line in them parses.
    pub fn validate(&self) -> Result<()> {
        if self.dir_authority_lines().is_some()
            && (self.alternate_bridge_lines().is_some() || self.alternate_dir_lines().is_some())
        {
            return Err(Error::ConfigConflict(
                "DirAuthority can't be combined with AlternateBridgeAuthority or AlternateDirAuthority",
            ));
        }
        let auth_lines = self
            .dir_authority_lines()
            .into_iter()
            .chain(self.alternate_bridge_lines())
            .chain(self.alternate_dir_lines())
            .flatten();
        for line in auth_lines {
            parse_dir_authority_line(line, DirInfo::empty())?;
        }
        for line in self.fallback_lines().into_iter().flatten() {
            parse_dir_fallback_line(line)?;
        }
        Ok(())
    }
}
