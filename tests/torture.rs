//! Torture-message coverage in the spirit of RFC 4475 section 3.1: odd
//! but syntactically valid requests that must still parse cleanly, one
//! call to [`Message::step`] per message.

use sipwire::catalog::Method;
use sipwire::{Message, Outcome};

fn parse_whole(input: &[u8]) -> Message {
    let mut msg = Message::default();
    let (end, outcome) = msg.step(input, 0, 0).expect("parse should not error");
    assert_eq!(outcome, Outcome::Ok, "message did not finish parsing");
    assert_eq!(end, input.len(), "trailing bytes left unconsumed");
    msg
}

/// A method token built entirely from the unusual-but-legal `token`
/// characters (`!`, `%`, `*`, `_`, `+`, backtick, `'`, `~`), per
/// RFC 4475 3.1.1.2's "wide range of valid characters" case.
const WIDE_METHOD: &[u8] = b"!interesting-Method0123456789_*+`.%indeed'~ sip:user@example.com SIP/2.0\r\n\
Call-ID: wide-method-1@example.com\r\n\
CSeq: 1 !interesting-Method0123456789_*+`.%indeed'~\r\n\
Max-Forwards: 70\r\n\
To: <sip:user@example.com>\r\n\
From: <sip:caller@example.com>;tag=abc\r\n\
Content-Length: 0\r\n\r\n";

#[test]
fn wide_range_of_method_characters() {
    let msg = parse_whole(WIDE_METHOD);
    assert!(msg.first_line.is_request);
    assert_eq!(msg.first_line.method, Method::Other);
    assert_eq!(
        msg.first_line.method_raw.get(WIDE_METHOD),
        b"!interesting-Method0123456789_*+`.%indeed'~"
    );
}

/// Percent-escaping inside the userinfo portion of a URI, per
/// RFC 4475 3.1.1.3.
const ESCAPED_USERINFO: &[u8] = b"INVITE sip:sips%3Auser%40example.com@example.net SIP/2.0\r\n\
Call-ID: esc01@example.net\r\n\
CSeq: 1 INVITE\r\n\
Max-Forwards: 70\r\n\
To: <sip:sips%3Auser%40example.com@example.net>\r\n\
From: <sip:caller@example.net>;tag=314159\r\n\
Content-Length: 0\r\n\r\n";

#[test]
fn percent_escaped_userinfo() {
    let msg = parse_whole(ESCAPED_USERINFO);
    assert_eq!(
        msg.first_line.uri.user.get(ESCAPED_USERINFO),
        b"sips%3Auser%40example.com"
    );
    assert_eq!(msg.first_line.uri.host.get(ESCAPED_USERINFO), b"example.net");
}

/// Minimal whitespace around colons and between tokens: a single space
/// is the least this grammar allows between the header name's `:` and
/// its value, but nothing stops the value itself from being minimal.
const MINIMAL_WHITESPACE: &[u8] =
    b"OPTIONS sip:user@example.com SIP/2.0\r\nVia: SIP/2.0/UDP example.com\r\nTo: <sip:user@example.com>\r\nFrom: <sip:caller@example.com>;tag=9\r\nCall-ID: min@example.com\r\nCSeq: 1 OPTIONS\r\nMax-Forwards: 70\r\nContent-Length: 0\r\n\r\n";

#[test]
fn minimal_whitespace_between_headers() {
    let msg = parse_whole(MINIMAL_WHITESPACE);
    assert_eq!(msg.cseq.number, 1);
    assert_eq!(msg.max_forwards, 70);
}

/// Line-folded header values (obsolete but still legal LWS folding):
/// a header value wraps onto a continuation line indented with a tab.
const FOLDED_HEADER: &[u8] = b"INVITE sip:user@example.com SIP/2.0\r\n\
To: Bob\r\n\t<sip:user@example.com>\r\n\
From: Alice <sip:caller@example.com>;tag=776655\r\n\
Call-ID: folded@example.com\r\n\
CSeq: 1 INVITE\r\n\
Max-Forwards: 70\r\n\
Content-Length: 0\r\n\r\n";

#[test]
fn folded_header_value_still_parses() {
    let msg = parse_whole(FOLDED_HEADER);
    assert_eq!(msg.to.display_name.get(FOLDED_HEADER), b"Bob");
    assert_eq!(msg.to.uri.host.get(FOLDED_HEADER), b"example.com");
}

/// Multiple `Via` headers; this crate only keeps the most recent one
/// (`headers.seen` is the only record of "there was more than one"),
/// which a caller relying on full Via history must track itself by
/// inspecting raw header lines upstream of [`Message`].
const MULTIPLE_VIA: &[u8] = b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP bigbox3.site3.atlanta.com;branch=z9hG4bK77ef4c2312983.1\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bKnashds8;received=192.0.2.1\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 314159 INVITE\r\n\
Max-Forwards: 70\r\n\
Content-Length: 0\r\n\r\n";

#[test]
fn multiple_via_keeps_most_recent_and_counts_both() {
    let msg = parse_whole(MULTIPLE_VIA);
    assert_eq!(msg.via.get(MULTIPLE_VIA), b"SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bKnashds8;received=192.0.2.1");
    let via_lines = msg
        .headers
        .entries()
        .iter()
        .filter(|&&(kind, _)| kind == sipwire::catalog::HdrKind::Via)
        .count();
    assert_eq!(via_lines, 2);
}

/// Compact header forms (`f`, `t`, `i`, `m`, `l`) used throughout
/// instead of the long forms.
const COMPACT_FORMS: &[u8] = b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
v: SIP/2.0/UDP pc33.atlanta.com\r\n\
t: Bob <sip:bob@biloxi.com>\r\n\
f: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
i: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 1 INVITE\r\n\
Max-Forwards: 70\r\n\
m: <sip:alice@pc33.atlanta.com>\r\n\
l: 0\r\n\r\n";

#[test]
fn compact_header_forms_resolve_to_the_same_kinds() {
    let msg = parse_whole(COMPACT_FORMS);
    assert_eq!(msg.to.uri.host.get(COMPACT_FORMS), b"biloxi.com");
    assert_eq!(msg.from.tag.get(COMPACT_FORMS), b"1928301774");
    assert_eq!(msg.call_id.get(COMPACT_FORMS), b"a84b4c76e66710@pc33.atlanta.com");
    assert_eq!(msg.contacts.values().len(), 1);
}
