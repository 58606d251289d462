//! IPv4/IPv6 literal recognition inside a byte buffer. No DNS, no
//! embedded-IPv4-in-IPv6 (`::1.2.3.4`) support — both are explicit
//! non-goals.

use crate::lex::hex_to_u16;

/// Outcome of [`ip4_prefix`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Ip4Status {
    /// A complete, valid dotted-quad was parsed.
    Ok,
    /// The final octet has a 4th+ digit: offset points inside the run.
    MoreValues,
    /// A disallowed byte followed an otherwise complete dotted-quad, or a
    /// non-terminal `.` appeared after all four octets.
    BadChar,
    /// Input ends before the address can be judged complete.
    MoreBytes,
}

/// Parses an IPv4 dotted-quad starting at `i`. Returns
/// `(next_offset, octets, status)`; `octets` holds whatever was parsed so
/// far even on a non-`Ok` status (partial results are still reported on
/// `BadChar`/`MoreValues`).
pub fn ip4_prefix(buf: &[u8], i: usize) -> (usize, [u8; 4], Ip4Status) {
    let mut octets = [0u8; 4];
    let mut pos = i;

    for part in 0..4 {
        let start = pos;
        let mut val: u32 = 0;
        let mut ndigits = 0usize;
        while pos < buf.len() && buf[pos].is_ascii_digit() && ndigits < 3 {
            val = val * 10 + (buf[pos] - b'0') as u32;
            pos += 1;
            ndigits += 1;
        }
        if ndigits == 0 {
            if pos >= buf.len() {
                return (pos, octets, Ip4Status::MoreBytes);
            }
            return (pos, octets, Ip4Status::BadChar);
        }
        if pos >= buf.len() {
            // Can't yet tell whether a 4th digit follows.
            return (pos, octets, Ip4Status::MoreBytes);
        }
        if buf[pos].is_ascii_digit() {
            return if part == 3 {
                (pos, octets, Ip4Status::MoreValues)
            } else {
                (pos, octets, Ip4Status::BadChar)
            };
        }
        if val > 255 {
            return (start, octets, Ip4Status::BadChar);
        }
        octets[part] = val as u8;
        if part < 3 {
            if buf[pos] != b'.' {
                return (pos, octets, Ip4Status::BadChar);
            }
            pos += 1;
        }
    }

    if pos < buf.len() {
        // Any trailing byte (including a non-terminal '.') after a
        // complete quad is disallowed here; the caller decides whether
        // that byte is actually fine in its own grammar.
        return (pos, octets, Ip4Status::BadChar);
    }
    (pos, octets, Ip4Status::Ok)
}

/// Outcome of [`ip6_prefix`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Ip6Status {
    /// A complete, valid address was parsed (and bracket closed, if any).
    Ok,
    /// Input ends before the address can be judged complete.
    MoreBytes,
    /// Malformed: two `::`, a bare leading `:`, an unclosed `[`, an
    /// embedded IPv4 dotted quad, or fewer than 8 groups without `::`.
    Bad,
}

/// Parses an IPv6 literal starting at `i`, optionally wrapped in `[...]`.
/// Returns `(next_offset, bytes, status)` where `bytes` is the 16-byte
/// big-endian form, valid only when `status == Ip6Status::Ok`.
pub fn ip6_prefix(buf: &[u8], i: usize) -> (usize, [u8; 16], Ip6Status) {
    let mut pos = i;
    let bracketed = pos < buf.len() && buf[pos] == b'[';
    if bracketed {
        pos += 1;
    }

    let mut head = [0u16; 8];
    let mut head_n = 0usize;
    let mut tail = [0u16; 8];
    let mut tail_n = 0usize;
    let mut compressed = false;

    if pos + 1 < buf.len() && buf[pos] == b':' && buf[pos + 1] == b':' {
        compressed = true;
        pos += 2;
    } else if pos < buf.len() && buf[pos] == b':' {
        return (pos, [0; 16], Ip6Status::Bad);
    }

    loop {
        if pos >= buf.len() {
            return (pos, [0; 16], Ip6Status::MoreBytes);
        }
        let (after_hex, val, ok) = hex_to_u16(buf, pos);
        if !ok {
            break;
        }
        if !compressed {
            if head_n >= 8 {
                return (pos, [0; 16], Ip6Status::Bad);
            }
            head[head_n] = val;
            head_n += 1;
        } else {
            if tail_n >= 8 {
                return (pos, [0; 16], Ip6Status::Bad);
            }
            tail[tail_n] = val;
            tail_n += 1;
        }
        pos = after_hex;

        if pos < buf.len() && buf[pos] == b':' {
            if pos + 1 >= buf.len() {
                return (pos, [0; 16], Ip6Status::MoreBytes);
            }
            if buf[pos + 1] == b':' {
                if compressed {
                    return (pos, [0; 16], Ip6Status::Bad);
                }
                compressed = true;
                pos += 2;
            } else {
                pos += 1;
            }
            continue;
        }
        break;
    }

    let total = head_n + tail_n;
    if compressed {
        if total > 7 {
            return (pos, [0; 16], Ip6Status::Bad);
        }
    } else if total != 8 {
        return (pos, [0; 16], Ip6Status::Bad);
    }

    if bracketed {
        if pos >= buf.len() {
            return (pos, [0; 16], Ip6Status::MoreBytes);
        }
        if buf[pos] != b']' {
            return (pos, [0; 16], Ip6Status::Bad);
        }
        pos += 1;
    }

    let mut out = [0u8; 16];
    for idx in 0..head_n {
        out[idx * 2] = (head[idx] >> 8) as u8;
        out[idx * 2 + 1] = (head[idx] & 0xff) as u8;
    }
    let splice = 8 - tail_n;
    for idx in 0..tail_n {
        let g = tail[idx];
        out[(splice + idx) * 2] = (g >> 8) as u8;
        out[(splice + idx) * 2 + 1] = (g & 0xff) as u8;
    }
    (pos, out, Ip6Status::Ok)
}

/// Hunts `buf[i..]` for an embedded IPv4 address, trying a `.`-anchored
/// window of a few candidate start offsets rather than a full prefix
/// parse at every position.
pub fn contains_ip4(buf: &[u8], i: usize) -> Option<(usize, usize, [u8; 4])> {
    let mut pos = i;
    while pos < buf.len() {
        if buf[pos] == b'.' {
            let earliest = pos.saturating_sub(3).max(i);
            for start in earliest..pos {
                if let (end, octets, Ip4Status::Ok) = ip4_prefix(buf, start) {
                    return Some((start, end, octets));
                }
            }
        }
        pos += 1;
    }
    None
}

/// Hunts `buf[i..]` for an embedded IPv6 address, trying a `:`-anchored
/// window of a few candidate start offsets.
pub fn contains_ip6(buf: &[u8], i: usize) -> Option<(usize, usize, [u8; 16])> {
    let mut pos = i;
    while pos < buf.len() {
        if buf[pos] == b':' {
            let earliest = pos.saturating_sub(4).max(i);
            for start in earliest..=pos {
                if start == pos {
                    continue;
                }
                if let (end, bytes, Ip6Status::Ok) = ip6_prefix(buf, start) {
                    if end > start + 2 {
                        return Some((start, end, bytes));
                    }
                }
            }
        }
        pos += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip4_round_trip() {
        assert_eq!(
            ip4_prefix(b"192.0.2.1 rest", 0),
            (9, [192, 0, 2, 1], Ip4Status::Ok)
        );
    }

    #[test]
    fn ip4_trailing_digits_are_more_values() {
        let (off, octets, status) = ip4_prefix(b"192.0.2.1234", 0);
        assert_eq!(status, Ip4Status::MoreValues);
        assert_eq!(octets, [192, 0, 2, 1]);
        assert_eq!(off, 11); // inside the trailing digit run
    }

    #[test]
    fn ip4_short_input_needs_more_bytes() {
        assert_eq!(ip4_prefix(b"192.0.2.", 0).2, Ip4Status::MoreBytes);
        assert_eq!(ip4_prefix(b"192.0.2", 0).2, Ip4Status::MoreBytes);
    }

    #[test]
    fn ip4_octet_over_255_is_bad() {
        assert_eq!(ip4_prefix(b"192.0.2.256 ", 0).2, Ip4Status::BadChar);
    }

    #[test]
    fn ip6_compression() {
        let input = b"1a01:2b02:3c03:4d04::6f06:7007:8108";
        let (off, bytes, status) = ip6_prefix(input, 0);
        assert_eq!(status, Ip6Status::Ok);
        assert_eq!(off, 35);
        assert_eq!(
            bytes,
            [
                0x1a, 0x01, 0x2b, 0x02, 0x3c, 0x03, 0x4d, 0x04, 0x00, 0x00, 0x6f, 0x06, 0x70,
                0x07, 0x81, 0x08
            ]
        );
    }

    #[test]
    fn ip6_bracketed() {
        let (off, bytes, status) = ip6_prefix(b"[::1]:5060", 0);
        assert_eq!(status, Ip6Status::Ok);
        assert_eq!(off, 5);
        assert_eq!(bytes[15], 1);
        assert_eq!(&bytes[..15], &[0u8; 15]);
    }

    #[test]
    fn ip6_double_compression_is_bad() {
        assert_eq!(ip6_prefix(b"1::2::3", 0).2, Ip6Status::Bad);
    }

    #[test]
    fn ip6_embedded_ipv4_not_supported() {
        // "::1.2.3.4" is explicitly not supported: the '.' is not a hex
        // digit, so the group scan stops and the address is judged
        // incomplete (no '::' compensates for the missing 8 groups
        // because only zero groups were actually read after it).
        assert_eq!(ip6_prefix(b"::1.2.3.4", 0).2, Ip6Status::Bad);
    }

    #[test]
    fn contains_ip4_finds_embedded_address() {
        let (start, end, octets) = contains_ip4(b"host=192.168.1.1;x", 0).unwrap();
        assert_eq!(&b"host=192.168.1.1;x"[start..end], b"192.168.1.1");
        assert_eq!(octets, [192, 168, 1, 1]);
    }
}
