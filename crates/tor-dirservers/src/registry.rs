//! The registry of directory servers that a node currently trusts.
//!
//! [`DirServerRegistry::consider_adding_dir_servers`] turns a set of
//! [`DirServerOptions`] into two lists: the trusted authorities, and the
//! fallbacks.  Every authority is also a fallback.  The lists are always
//! rebuilt from scratch and then swapped in as a unit, so a reader never
//! sees a half-built set.

use crate::config::DirServerOptions;
use crate::defaults::{BuiltinDefaults, DirServerDefaults};
use crate::dirserver::DirServer;
use crate::parse::{parse_dir_authority_line, parse_dir_fallback_line};
use crate::shared_ref::SharedMutArc;
use crate::Result;

use std::sync::Arc;
use tor_dircommon::DirInfo;
use tracing::{debug, info};

/// The trusted authorities and fallback directories in effect.
#[derive(Debug, Clone, Default)]
pub struct DirServerLists {
    /// Servers that are authorities.
    trusted: Vec<Arc<DirServer>>,
    /// Every server that we can ask for directory information: the
    /// authorities, and the fallbacks.
    fallbacks: Vec<Arc<DirServer>>,
}

impl DirServerLists {
    /// Add `ds` to these lists.
    fn add(&mut self, ds: DirServer) {
        let ds = Arc::new(ds);
        if ds.is_authority() {
            self.trusted.push(Arc::clone(&ds));
        }
        self.fallbacks.push(ds);
    }

    /// Return the trusted authorities.
    pub fn trusted(&self) -> &[Arc<DirServer>] {
        &self.trusted[..]
    }

    /// Return every directory server we know, authorities included.
    pub fn fallbacks(&self) -> &[Arc<DirServer>] {
        &self.fallbacks[..]
    }

    /// Return the number of authorities that provide any of the kinds
    /// of directory information in `dirinfo`.
    pub fn n_authorities(&self, dirinfo: DirInfo) -> usize {
        self.trusted
            .iter()
            .filter(|ds| ds.dirinfo().intersects(dirinfo))
            .count()
    }

    /// Return true if we know about fallbacks that aren't authorities.
    pub fn can_use_extra_fallbacks(&self) -> bool {
        self.trusted.len() < self.fallbacks.len()
    }
}

/// Holds the current [`DirServerLists`], and rebuilds them when the
/// configuration changes.
pub struct DirServerRegistry {
    /// Where we get servers when the configuration doesn't name them.
    defaults: Box<dyn DirServerDefaults + Send + Sync>,
    /// The lists in effect right now.
    lists: SharedMutArc<DirServerLists>,
}

impl std::fmt::Debug for DirServerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirServerRegistry")
            .field("lists", &self.lists)
            .finish()
    }
}

impl Default for DirServerRegistry {
    fn default() -> Self {
        Self::with_builtin_defaults()
    }
}

impl DirServerRegistry {
    /// Make a new empty registry that takes its defaults from `defaults`.
    pub fn new(defaults: Box<dyn DirServerDefaults + Send + Sync>) -> Self {
        DirServerRegistry {
            defaults,
            lists: SharedMutArc::new(),
        }
    }

    /// Make a new empty registry using the directory servers that ship
    /// with Tor as defaults.
    pub fn with_builtin_defaults() -> Self {
        Self::new(Box::new(BuiltinDefaults))
    }

    /// Return the lists currently in effect.
    pub fn current(&self) -> Arc<DirServerLists> {
        self.lists.get().unwrap_or_default()
    }

    /// Return the trusted authorities currently in effect.
    pub fn trusted(&self) -> Vec<Arc<DirServer>> {
        self.current().trusted().to_vec()
    }

    /// Return the fallbacks currently in effect.
    pub fn fallbacks(&self) -> Vec<Arc<DirServer>> {
        self.current().fallbacks().to_vec()
    }

    /// Return the number of current authorities that provide any of
    /// `dirinfo`.
    pub fn n_authorities(&self, dirinfo: DirInfo) -> usize {
        self.current().n_authorities(dirinfo)
    }

    /// Return true if we know about fallbacks that aren't authorities.
    pub fn can_use_extra_fallbacks(&self) -> bool {
        self.current().can_use_extra_fallbacks()
    }

    /// Forget every directory server.
    pub fn clear(&self) {
        self.lists.clear();
    }

    /// Rebuild our lists from `new`, if they need rebuilding.
    ///
    /// `old` is the configuration that we last built the lists from, if
    /// any.  If it's the same as `new` and we already have servers in
    /// both lists, nothing happens.  Otherwise both lists are replaced.
    ///
    /// Returns true if the lists were rebuilt.  On error, the lists
    /// in effect before the call are kept.
    ///
    /// `new` should already have passed [`DirServerOptions::validate`].
    pub fn consider_adding_dir_servers(
        &self,
        new: &DirServerOptions,
        old: Option<&DirServerOptions>,
    ) -> Result<bool> {
        let cur = self.current();
        let need_update = match old {
            None => true,
            Some(old) => old != new || cur.trusted.is_empty() || cur.fallbacks.is_empty(),
        };
        if !need_update {
            debug!("Directory server configuration unchanged");
            return Ok(false);
        }

        let lists = self.build_lists(new)?;
        info!(
            "Using {} directory authorities and {} other fallback directories",
            lists.trusted.len(),
            lists.fallbacks.len() - lists.trusted.len()
        );
        self.lists.replace(lists);
        Ok(true)
    }

    /// Build a new set of lists from `opts`.
    fn build_lists(&self, opts: &DirServerOptions) -> Result<DirServerLists> {
        let mut lists = DirServerLists::default();

        if opts.dir_authority_lines().is_none() {
            let mut want = DirInfo::empty();
            if opts.alternate_bridge_lines().is_none() {
                want |= DirInfo::BRIDGE;
            }
            if opts.alternate_dir_lines().is_none() {
                want |= DirInfo::v3_authority();
                if opts.fallback_lines().is_none() && opts.use_default_fallback_dirs {
                    for ds in self.defaults.fallbacks()? {
                        lists.add(ds);
                    }
                }
            }
            if !want.is_empty() {
                for ds in self.defaults.authorities()? {
                    if ds.dirinfo().intersects(want) {
                        lists.add(ds);
                    }
                }
            }
        }

        let configured = [
            (opts.dir_authority_lines(), DirInfo::empty()),
            (opts.alternate_bridge_lines(), DirInfo::BRIDGE),
            (opts.alternate_dir_lines(), DirInfo::v3_authority()),
        ];
        for (lines, required) in configured.iter() {
            for line in lines.iter().copied().flatten() {
                if let Some(ds) = parse_dir_authority_line(line, *required)? {
                    lists.add(ds);
                }
            }
        }
        for line in opts.fallback_lines().into_iter().flatten() {
            lists.add(parse_dir_fallback_line(line)?);
        }

        Ok(lists)
    }
}
