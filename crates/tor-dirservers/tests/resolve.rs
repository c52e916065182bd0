//! Tests for choosing directory servers from every combination of
//! configured authorities and fallbacks.

use tor_dircommon::{DirInfo, RsaIdentity};
use tor_dirservers::{
    DirServer, DirServerOptions, DirServerRegistry, Error, LineDefaults, Result,
};

use std::collections::HashSet;
use std::sync::Arc;

const DIR_AUTH: &str = "D0 orport=9000 v3ident=0023456789012345678901234567890123456789 \
                        127.0.0.1:60090 0123 4567 8901 2345 6789 0123 4567 8901 2345 6789";
const ALT_BRIDGE: &str = "B1 orport=9001 bridge \
                          127.0.0.1:60091 1123 4567 8901 2345 6789 0123 4567 8901 2345 6789";
const ALT_DIR: &str = "A2 orport=9002 v3ident=0223456789012345678901234567890123456789 \
                       127.0.0.1:60092 2123 4567 8901 2345 6789 0123 4567 8901 2345 6789";
const FALLBACK: &str = "127.0.0.1:60093 orport=9003 id=0323456789012345678901234567890123456789";

const DEFAULT_V3: &str = "DA0 orport=9100 v3ident=0A23456789012345678901234567890123456789 \
                          127.0.0.1:60100 0A23 4567 8901 2345 6789 0123 4567 8901 2345 6789";
const DEFAULT_BRIDGE: &str = "DB1 orport=9101 bridge \
                              127.0.0.1:60101 0B23 4567 8901 2345 6789 0123 4567 8901 2345 6789";
const DEFAULT_FALLBACK: &str =
    "127.0.0.1:60099 orport=9009 id=0923456789012345678901234567890123456789";

fn registry() -> DirServerRegistry {
    DirServerRegistry::new(Box::new(LineDefaults {
        authorities: vec![DEFAULT_V3.into(), DEFAULT_BRIDGE.into()],
        fallbacks: vec![DEFAULT_FALLBACK.into()],
    }))
}

fn opts(d: bool, b: bool, a: bool, f: bool) -> DirServerOptions {
    let some = |set: bool, line: &str| if set { Some(vec![line.to_string()]) } else { None };
    DirServerOptions {
        dir_authorities: some(d, DIR_AUTH),
        alternate_bridge_authority: some(b, ALT_BRIDGE),
        alternate_dir_authority: some(a, ALT_DIR),
        fallback_dir: some(f, FALLBACK),
        use_default_fallback_dirs: true,
    }
}

/// Assert that no two servers in `list` share an identity.
fn assert_unique_ids(list: &[Arc<DirServer>]) {
    let ids: HashSet<RsaIdentity> = list.iter().map(|ds| *ds.identity()).collect();
    assert_eq!(ids.len(), list.len());
}

/// Resolve `o` in a fresh registry; return the dirports of the trusted
/// and fallback lists.
fn resolve(o: &DirServerOptions) -> Result<(Vec<u16>, Vec<u16>)> {
    o.validate()?;
    let reg = registry();
    assert!(reg.consider_adding_dir_servers(o, None)?);
    let trusted = reg.trusted().iter().map(|ds| ds.dir_port()).collect();
    let fallbacks = reg.fallbacks().iter().map(|ds| ds.dir_port()).collect();
    Ok((trusted, fallbacks))
}

#[test]
fn explicit_authorities() -> Result<()> {
    assert_eq!(resolve(&opts(true, false, false, false))?, (vec![60090], vec![60090]));
    assert_eq!(
        resolve(&opts(true, false, false, true))?,
        (vec![60090], vec![60090, 60093])
    );
    Ok(())
}

#[test]
fn both_alternates() -> Result<()> {
    assert_eq!(
        resolve(&opts(false, true, true, false))?,
        (vec![60091, 60092], vec![60091, 60092])
    );
    assert_eq!(
        resolve(&opts(false, true, true, true))?,
        (vec![60091, 60092], vec![60091, 60092, 60093])
    );
    Ok(())
}

#[test]
fn alternate_bridge_only() -> Result<()> {
    // The default v3 authorities are kept, and so are the default
    // fallbacks unless some are configured.
    assert_eq!(
        resolve(&opts(false, true, false, false))?,
        (vec![60100, 60091], vec![60099, 60100, 60091])
    );
    assert_eq!(
        resolve(&opts(false, true, false, true))?,
        (vec![60100, 60091], vec![60100, 60091, 60093])
    );
    Ok(())
}

#[test]
fn alternate_dir_only() -> Result<()> {
    // The default bridge authority is kept; the default fallbacks never are.
    assert_eq!(
        resolve(&opts(false, false, true, false))?,
        (vec![60101, 60092], vec![60101, 60092])
    );
    assert_eq!(
        resolve(&opts(false, false, true, true))?,
        (vec![60101, 60092], vec![60101, 60092, 60093])
    );
    Ok(())
}

#[test]
fn defaults_only() -> Result<()> {
    assert_eq!(
        resolve(&opts(false, false, false, false))?,
        (vec![60100, 60101], vec![60099, 60100, 60101])
    );
    assert_eq!(
        resolve(&opts(false, false, false, true))?,
        (vec![60100, 60101], vec![60100, 60101, 60093])
    );

    let mut o = opts(false, false, false, false);
    o.use_default_fallback_dirs = false;
    assert_eq!(resolve(&o)?, (vec![60100, 60101], vec![60100, 60101]));
    Ok(())
}

#[test]
fn counts() -> Result<()> {
    let reg = registry();
    reg.consider_adding_dir_servers(&opts(false, false, false, false), None)?;
    assert_eq!(reg.n_authorities(DirInfo::BRIDGE), 1);
    assert_eq!(reg.n_authorities(DirInfo::V3), 1);
    assert_eq!(reg.n_authorities(DirInfo::V3 | DirInfo::BRIDGE), 2);
    assert!(reg.can_use_extra_fallbacks());

    let reg = registry();
    reg.consider_adding_dir_servers(&opts(true, false, false, false), None)?;
    assert_eq!(reg.n_authorities(DirInfo::BRIDGE), 0);
    assert!(!reg.can_use_extra_fallbacks());
    Ok(())
}

#[test]
fn unchanged_config() -> Result<()> {
    let reg = registry();
    let o = opts(false, false, false, true);
    assert!(reg.consider_adding_dir_servers(&o, None)?);
    let before = reg.current();

    assert!(!reg.consider_adding_dir_servers(&o, Some(&o))?);
    assert!(Arc::ptr_eq(&before, &reg.current()));

    // A changed config, or no old config at all, means a rebuild.
    let o2 = opts(false, false, false, false);
    assert!(reg.consider_adding_dir_servers(&o2, Some(&o))?);
    let trusted = reg.trusted();
    let fallbacks = reg.fallbacks();
    assert_eq!(fallbacks.len(), 3);
    assert_unique_ids(&trusted);
    assert_unique_ids(&fallbacks);

    // Rebuilding from the same config gives new lists with the same servers.
    assert!(reg.consider_adding_dir_servers(&o2, None)?);
    assert!(!Arc::ptr_eq(&fallbacks[0], &reg.fallbacks()[0]));
    assert_eq!(reg.trusted(), trusted);
    assert_eq!(reg.fallbacks(), fallbacks);

    // So do empty lists, even if the config is the same.
    reg.clear();
    assert!(reg.consider_adding_dir_servers(&o2, Some(&o2))?);
    assert_eq!(reg.fallbacks(), fallbacks);
    assert_unique_ids(&reg.fallbacks());
    Ok(())
}

#[test]
fn errors_keep_old_lists() -> Result<()> {
    let reg = registry();
    let o = opts(false, false, false, false);
    reg.consider_adding_dir_servers(&o, None)?;
    let before = reg.current();

    let mut bad = opts(true, false, false, false);
    bad.fallback_dir = Some(vec!["127.0.0.1:60093 orport=9003".into()]);
    let e = reg.consider_adding_dir_servers(&bad, Some(&o));
    assert!(matches!(e, Err(Error::BadDirLine { .. })));
    assert!(Arc::ptr_eq(&before, &reg.current()));
    Ok(())
}

#[test]
fn conflicts() {
    for (b, a) in &[(true, false), (false, true), (true, true)] {
        let o = opts(true, *b, *a, false);
        assert!(matches!(o.validate(), Err(Error::ConfigConflict(_))));
    }
}

#[test]
fn alternate_bridge_must_be_bridge() -> Result<()> {
    // An AlternateBridgeAuthority line without the bridge flag is ignored.
    let mut o = opts(false, true, true, false);
    o.alternate_bridge_authority = Some(vec![DIR_AUTH.into()]);
    assert_eq!(resolve(&o)?, (vec![60092], vec![60092]));
    Ok(())
}
