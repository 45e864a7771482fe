//! IP-set arithmetic
//!
//! Pure helpers that expand declarative range lists into concrete address
//! sets and compute the difference the allocator draws from. Addresses are
//! ordered and compared as big-endian 128-bit integers with IPv4 occupying
//! the low 32 bits, and printed in canonical textual form (dotted quads,
//! compressed lowercase colon-hex).

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;
use thiserror::Error;

use crds::{IPVersion, ReservedIP, IPV4, IPV6};

/// Rejected range expressions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("unsupported IP version {0}")]
    UnknownVersion(IPVersion),

    #[error("{0:?} is not a valid IP, IP range, or CIDR")]
    Invalid(String),

    #[error("{ip} in {range:?} is not an IPv{version} address")]
    VersionMismatch {
        range: String,
        ip: String,
        version: IPVersion,
    },

    #[error("range {0:?} ends before it starts")]
    Inverted(String),
}

/// Expand every range expression into its member addresses.
///
/// Three forms are accepted per item: a single IP, an inclusive "a-b"
/// range, and a CIDR (expanded including the network and broadcast
/// addresses). The result keeps input order and duplicates; callers that
/// need a canonical set go through [`assemble_total_ips`].
pub fn parse_ip_ranges(version: IPVersion, ranges: &[String]) -> Result<Vec<IpAddr>, RangeError> {
    let mut ips = Vec::new();
    for range in ranges {
        expand_range(version, range, &mut ips)?;
    }
    Ok(ips)
}

/// Declared membership of a pool: expand(`ips`) minus expand(`exclude_ips`),
/// deduplicated and sorted ascending. The allocator indexes into this order.
pub fn assemble_total_ips(
    version: IPVersion,
    ips: &[String],
    exclude_ips: &[String],
) -> Result<Vec<IpAddr>, RangeError> {
    let mut include = parse_ip_ranges(version, ips)?;
    include.sort_unstable_by_key(|ip| ip_key(*ip));
    let exclude = parse_ip_ranges(version, exclude_ips)?;
    Ok(ips_diff_set(&include, &exclude))
}

/// Union of every reserved range declared for `version`, deduplicated and
/// sorted ascending. Entries of the other family are skipped.
pub fn assemble_reserved_ips(
    version: IPVersion,
    reserved: &[ReservedIP],
) -> Result<Vec<IpAddr>, RangeError> {
    let mut ips = Vec::new();
    for item in reserved {
        if item.spec.ip_version != version {
            continue;
        }
        for range in &item.spec.ips {
            expand_range(version, range, &mut ips)?;
        }
    }
    ips.sort_unstable_by_key(|ip| ip_key(*ip));
    ips.dedup();
    Ok(ips)
}

/// Elements of `a` absent from `b`, deduplicated, preserving `a`'s order.
pub fn ips_diff_set(a: &[IpAddr], b: &[IpAddr]) -> Vec<IpAddr> {
    let forbidden: HashSet<u128> = b.iter().map(|ip| ip_key(*ip)).collect();
    let mut seen = HashSet::new();
    a.iter()
        .copied()
        .filter(|ip| !forbidden.contains(&ip_key(*ip)) && seen.insert(ip_key(*ip)))
        .collect()
}

fn expand_range(version: IPVersion, range: &str, out: &mut Vec<IpAddr>) -> Result<(), RangeError> {
    if version != IPV4 && version != IPV6 {
        return Err(RangeError::UnknownVersion(version));
    }
    if let Some((lo, hi)) = range.split_once('-') {
        let lo = parse_single(version, range, lo)?;
        let hi = parse_single(version, range, hi)?;
        if ip_key(lo) > ip_key(hi) {
            return Err(RangeError::Inverted(range.to_string()));
        }
        push_span(version, ip_key(lo), ip_key(hi), out);
        return Ok(());
    }
    if range.contains('/') {
        let net: IpNet = range
            .trim()
            .parse()
            .map_err(|_| RangeError::Invalid(range.to_string()))?;
        check_version(version, range, net.network())?;
        push_span(version, ip_key(net.network()), ip_key(net.broadcast()), out);
        return Ok(());
    }
    let ip = parse_single(version, range, range)?;
    out.push(ip);
    Ok(())
}

fn parse_single(version: IPVersion, range: &str, s: &str) -> Result<IpAddr, RangeError> {
    let ip: IpAddr = s
        .trim()
        .parse()
        .map_err(|_| RangeError::Invalid(range.to_string()))?;
    check_version(version, range, ip)?;
    Ok(ip)
}

fn check_version(version: IPVersion, range: &str, ip: IpAddr) -> Result<(), RangeError> {
    let matched = match version {
        IPV4 => ip.is_ipv4(),
        IPV6 => ip.is_ipv6(),
        _ => false,
    };
    if matched {
        Ok(())
    } else {
        Err(RangeError::VersionMismatch {
            range: range.to_string(),
            ip: ip.to_string(),
            version,
        })
    }
}

/// Big-endian integer key; IPv4 occupies the low 32 bits.
fn ip_key(ip: IpAddr) -> u128 {
    match ip {
        IpAddr::V4(v4) => u32::from(v4) as u128,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn key_ip(version: IPVersion, key: u128) -> IpAddr {
    if version == IPV4 {
        IpAddr::V4(Ipv4Addr::from(key as u32))
    } else {
        IpAddr::V6(Ipv6Addr::from(key))
    }
}

fn push_span(version: IPVersion, lo: u128, hi: u128, out: &mut Vec<IpAddr>) {
    let mut key = lo;
    loop {
        out.push(key_ip(version, key));
        if key == hi {
            break;
        }
        key += 1;
    }
}
