//! Address Normalizer
//!
//! Turns raw header or socket text into a canonical [`NetworkAddress`] and
//! decides whether it is worth sending to an IP location provider.
//!
//! Classification also accepts colon-rich strings that fail the strict IPv6
//! grammar (2-7 colons, hex/colon/dot characters only) as public. This is
//! intentional and pinned by tests; do not tighten it without changing them.

use crate::domain::value_objects::{AddressClassification, NetworkAddress};

/// IPv6 prefixes treated as non-routable.
const RESERVED_V6_PREFIXES: &[&str] = &["fe80:", "fc00:", "fd00:"];

/// Canonicalize a raw address string.
///
/// Strips ports and brackets, lowercases hex digits and rewrites
/// IPv4-mapped IPv6 (`::ffff:a.b.c.d`) to plain IPv4.
pub fn normalize(raw: &str) -> NetworkAddress {
    let trimmed = raw.trim().trim_matches('"');

    // [v6]:port or [v6]
    let unbracketed = match trimmed.strip_prefix('[') {
        Some(rest) => match rest.find(']') {
            Some(end) => &rest[..end],
            None => rest,
        },
        None => trimmed,
    };

    let lowered = unbracketed.to_ascii_lowercase();
    let colons = lowered.matches(':').count();

    let canonical = if lowered.contains('.') && colons > 0 {
        if colons == 1 && !lowered.contains("::") {
            // a.b.c.d:port
            strip_port(&lowered).to_string()
        } else {
            unwrap_embedded_v4(&lowered)
        }
    } else {
        lowered
    };

    NetworkAddress::from_normalized(canonical)
}

/// Classify a normalized address.
pub fn classify(addr: &NetworkAddress) -> AddressClassification {
    let s = addr.as_str();

    if s.is_empty() || s == "unknown" || s == "localhost" {
        return AddressClassification::Invalid;
    }

    if is_reserved(s) {
        return AddressClassification::PrivateOrReserved;
    }

    if s.contains(':') {
        if is_valid_ipv6(s) || looks_like_ipv6(s) {
            AddressClassification::Public
        } else {
            AddressClassification::Invalid
        }
    } else if is_valid_ipv4(s) {
        AddressClassification::Public
    } else {
        AddressClassification::Invalid
    }
}

/// Drop a trailing `:digits` suffix.
fn strip_port(s: &str) -> &str {
    match s.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => s,
    }
}

/// Handle IPv6 text with a dotted IPv4 tail, optionally followed by a port.
fn unwrap_embedded_v4(s: &str) -> String {
    let groups: Vec<&str> = s.split(':').collect();
    let Some(v4_idx) = groups.iter().rposition(|g| g.contains('.')) else {
        return s.to_string();
    };

    let v4 = groups[v4_idx];
    let prefix = groups[..v4_idx].join(":");

    if prefix.ends_with("ffff") {
        return v4.to_string();
    }

    let has_port = v4_idx + 1 < groups.len()
        && groups[v4_idx + 1..]
            .iter()
            .all(|g| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit()));

    if has_port {
        format!("{}:{}", prefix, v4)
    } else {
        s.to_string()
    }
}

fn is_reserved(s: &str) -> bool {
    if s == "::1" {
        return true;
    }
    if RESERVED_V6_PREFIXES.iter().any(|p| s.starts_with(p)) {
        return true;
    }

    let mut octets = s.split('.').map(|o| o.parse::<u16>().ok());
    let first = octets.next().flatten();
    let second = octets.next().flatten();

    match (first, second) {
        (Some(127), _) | (Some(10), _) => true,
        (Some(172), Some(b)) => (16..=31).contains(&b),
        (Some(192), Some(168)) => true,
        (Some(169), Some(254)) => true,
        _ => false,
    }
}

fn is_valid_ipv4(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|p| {
            !p.is_empty() && p.len() <= 3 && p.bytes().all(|b| b.is_ascii_digit()) && p.parse::<u8>().is_ok()
        })
}

fn is_valid_ipv6(s: &str) -> bool {
    let colons = s.matches(':').count();
    if !(2..=7).contains(&colons) {
        return false;
    }

    let compressions = s.matches("::").count();
    if compressions > 1 || s.contains(":::") {
        return false;
    }

    let (body, v4_tail) = match s.rsplit_once(':') {
        Some((head, tail)) if tail.contains('.') => {
            if !is_valid_ipv4(tail) {
                return false;
            }
            (head, true)
        }
        _ => (s, false),
    };

    let groups: Vec<&str> = body.split(':').filter(|g| !g.is_empty()).collect();
    if !groups
        .iter()
        .all(|g| g.len() <= 4 && g.bytes().all(|b| b.is_ascii_hexdigit()))
    {
        return false;
    }

    // An IPv4 tail occupies two groups.
    let width = groups.len() + if v4_tail { 2 } else { 0 };
    if compressions == 1 {
        width < 8
    } else {
        width == 8
    }
}

/// Lenient fallback for text that is probably IPv6 but fails the strict check.
fn looks_like_ipv6(s: &str) -> bool {
    let colons = s.matches(':').count();
    (2..=7).contains(&colons) && s.bytes().all(|b| b.is_ascii_hexdigit() || b == b':' || b == b'.')
}
