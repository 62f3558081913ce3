// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Address and MAC conventions shared by the engine and the builders.

/// Drop a trailing `/prefix` from a textual address, if present.
pub fn strip_subnet_suffix(addr: &str) -> &str {
    match addr.split_once('/') {
        Some((bare, _)) => bare,
        None => addr,
    }
}

/// Append `/24` to an address that carries no prefix length.
pub fn ensure_subnet_suffix(addr: &str) -> String {
    if addr.contains('/') {
        addr.to_owned()
    } else {
        format!("{addr}/24")
    }
}

/// Format a MAC-instance id as a locally-administered address:
/// `02:` followed by the id zero-extended big-endian into five octets.
pub fn format_mac_address(mac_instance_id: u32) -> String {
    let id = u64::from(mac_instance_id);
    format!(
        "02:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        0xFF & (id >> 32),
        0xFF & (id >> 24),
        0xFF & (id >> 16),
        0xFF & (id >> 8),
        0xFF & id,
    )
}

/// Recover the instance id from a MAC produced by [`format_mac_address`].
/// Returns `None` for addresses outside the `02:` instance space.
pub fn mac_instance_id(mac: &str) -> Option<u32> {
    let mut octets = [0u8; 6];
    let mut parts = mac.split(':');
    for octet in &mut octets {
        let part = parts.next()?;
        if part.len() != 2 {
            return None;
        }
        *octet = u8::from_str_radix(part, 16).ok()?;
    }
    if parts.next().is_some() || octets[0] != 0x02 {
        return None;
    }
    let id = octets[1..]
        .iter()
        .fold(0u64, |acc, &octet| (acc << 8) | u64::from(octet));
    u32::try_from(id).ok()
}

/// Collect the non-empty addresses of an interface, IPv4 first.
pub fn ip_address_list(ipv4: &str, ipv6: &str) -> Vec<String> {
    let mut addrs = Vec::new();
    if !ipv4.is_empty() {
        addrs.push(ipv4.to_owned());
    }
    if !ipv6.is_empty() {
        addrs.push(ipv6.to_owned());
    }
    addrs
}

/// Render a value in lowercase base 36, the radix used for veth host-name
/// suffixes.
pub fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strip_round_trip() {
        bolero::check!()
            .with_type()
            .for_each(|(addr, prefix): &([u8; 4], u8)| {
                let bare = format!("{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3]);
                assert_eq!(strip_subnet_suffix(&format!("{bare}/{prefix}")), bare);
                assert_eq!(strip_subnet_suffix(&bare), bare);
            });
    }

    #[test]
    fn ensure_suffix_defaults_to_24() {
        assert_eq!(ensure_subnet_suffix("10.0.1.7"), "10.0.1.7/24");
        assert_eq!(ensure_subnet_suffix("10.0.1.7/16"), "10.0.1.7/16");
    }

    #[test]
    fn mac_format_parses_back() {
        bolero::check!().with_type().for_each(|id: &u32| {
            let mac = format_mac_address(*id);
            assert!(mac.starts_with("02:"));
            assert_eq!(mac_instance_id(&mac), Some(*id));
        });
    }

    #[test]
    fn mac_format_examples() {
        assert_eq!(format_mac_address(1), "02:00:00:00:00:01");
        assert_eq!(format_mac_address(0x1234_5678), "02:00:12:34:56:78");
        assert_eq!(mac_instance_id("02:00:00:00:00:01"), Some(1));
        assert_eq!(mac_instance_id("06:00:00:00:00:01"), None);
        assert_eq!(mac_instance_id("02:00:00:00:01"), None);
    }

    #[test]
    fn base36_matches_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(46655), "zzz");
    }
}
