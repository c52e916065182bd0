//! The directory servers that we use when none are configured.

use crate::dirserver::DirServer;
use crate::parse::{parse_dir_authority_line, parse_dir_fallback_line};
use crate::Result;

use tor_dircommon::DirInfo;

/// A source of default directory authorities and fallbacks.
///
/// The registry asks for these whenever it rebuilds its lists and the
/// configuration leaves some kind of authority unset.
pub trait DirServerDefaults {
    /// Return the default directory authorities.
    fn authorities(&self) -> Result<Vec<DirServer>>;
    /// Return the default fallback directory caches.
    fn fallbacks(&self) -> Result<Vec<DirServer>>;
}

/// The authorities that ship with Tor.
const DEFAULT_AUTHORITIES: &[&str] = &[
    "moria1 orport=9101 v3ident=D586D18309DED4CD6D57C18FDB97EFA96D330566 \
     128.31.0.39:9131 9695 DFC3 5FFE B861 329B 9F1A B04C 4639 7020 CE31",
    "tor26 orport=443 v3ident=14C131DFC5C6F93646BE72FA1401C02A8DF2E8B4 \
     ipv6=[2001:858:2:2:aabb:0:563b:1526]:443 \
     86.59.21.38:80 847B 1F85 0344 D787 6491 A548 92F9 0493 4E4E B85D",
    "dizum orport=443 v3ident=E8A9C45EDE6D711294FADF8E7951F4DE6CA56B58 \
     45.66.33.45:80 7EA6 EAD6 FD83 083C 538F 4403 8BBF A077 587D D755",
    "Serge orport=9001 bridge \
     66.111.2.131:9030 BA44 A889 E64B 93FA A2B1 14E0 2C2A 279A 8555 C533",
    "gabelmoo orport=443 v3ident=ED03BB616EB2F60BEC80151114BB25CEF515B226 \
     ipv6=[2001:638:a000:4140::ffff:189]:443 \
     131.188.40.189:80 F204 4413 DAC2 E02E 3D6B CF47 35A1 9BCA 1DE9 7281",
    "dannenberg orport=443 v3ident=0232AF901C31A04EE9848595AF9BB7620D4C5B2E \
     ipv6=[2001:678:558:1000::244]:443 \
     193.23.244.244:80 7BE6 83E6 5D48 1413 21C5 ED92 F075 C553 64AC 7123",
    "maatuska orport=80 v3ident=49015F787433103580E3B66A1707A00E60F2D15B \
     ipv6=[2001:67c:289c::9]:80 \
     171.25.193.9:443 BD6A 8292 55CB 08E6 6FBE 7D37 4836 3586 E46B 3810",
    "Faravahar orport=443 v3ident=EFCBE720AB3A82B99F9E953CD5BF50F7EEFC7B97 \
     154.35.175.225:80 CF6D 0AAF B385 BE71 B8E1 11FC 5CFF 4B47 9237 9F29",
    "longclaw orport=443 v3ident=23D15D965BC35114467363C165C4F724B64B4F66 \
     199.58.81.140:80 74A9 1064 6BCE EFBC D2E8 74FC 1DC9 9743 0F96 8145",
    "bastet orport=443 v3ident=27102BC123E7AF1D4741AE047E160C91ADC76B21 \
     ipv6=[2620:13:4000:6000::1000:118]:443 \
     204.13.164.118:80 24E2 F139 121D 4394 C54B 5BCC 368B 3B41 1857 C413",
];

/// Fallback directory caches that ship with Tor.
const DEFAULT_FALLBACKS: &[&str] = &[
    "185.225.17.3:80 orport=443 id=0338F9F55111FE8E3570E7DE117EF3AF999CC1D7 \
     ipv6=[2a0a:c800:1:5::3]:443",
    "81.7.10.193:9002 orport=993 id=03C3069E814E296EB18776EB61B1ECB754ED89FE",
    "163.172.149.155:80 orport=443 id=0B85617241252517E8ECF2CFC7F4C1A32DCD153F",
    "5.200.21.144:80 orport=443 id=0C039F35C2E40DCB71CD8A07E97C7FD7787D42D6",
    "81.7.18.7:9030 orport=9001 id=0C475BA4D3AA3C289B716F95954CAD616E50C4E5",
];

/// Parse a list of authority lines, keeping every authority.
fn parse_authorities<S: AsRef<str>>(lines: &[S]) -> Result<Vec<DirServer>> {
    let mut result = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(ds) = parse_dir_authority_line(line.as_ref(), DirInfo::empty())? {
            result.push(ds);
        }
    }
    Ok(result)
}

/// Parse a list of fallback lines.
fn parse_fallbacks<S: AsRef<str>>(lines: &[S]) -> Result<Vec<DirServer>> {
    lines
        .iter()
        .map(|l| parse_dir_fallback_line(l.as_ref()))
        .collect()
}

/// The directory servers built in to this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDefaults;

impl DirServerDefaults for BuiltinDefaults {
    fn authorities(&self) -> Result<Vec<DirServer>> {
        parse_authorities(DEFAULT_AUTHORITIES)
    }
    fn fallbacks(&self) -> Result<Vec<DirServer>> {
        parse_fallbacks(DEFAULT_FALLBACKS)
    }
}

/// Default directory servers given as configuration lines.
///
/// Mostly useful for testing networks, where the servers that ship
/// with Tor aren't reachable.
#[derive(Debug, Clone, Default)]
pub struct LineDefaults {
    /// `DirAuthority` lines.
    pub authorities: Vec<String>,
    /// `FallbackDir` lines.
    pub fallbacks: Vec<String>,
}

impl DirServerDefaults for LineDefaults {
    fn authorities(&self) -> Result<Vec<DirServer>> {
        parse_authorities(&self.authorities)
    }
    fn fallbacks(&self) -> Result<Vec<DirServer>> {
        parse_fallbacks(&self.fallbacks)
    }
}
