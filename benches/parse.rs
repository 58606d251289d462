#[macro_use]
extern crate bencher;

use bencher::Bencher;

use sipwire::signature::compute as compute_signature;
use sipwire::Message;

const INVITE: &[u8] = b"\
INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP bigbox3.site3.atlanta.com;branch=z9hG4bK77ef4c2312983.1\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bKnashds8;received=192.0.2.1\r\n\
Max-Forwards: 69\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 314159 INVITE\r\n\
Contact: <sip:alice@pc33.atlanta.com>\r\n\
User-Agent: softphone/1.0\r\n\
Content-Length: 0\r\n\r\n";

fn bench_parse_invite(b: &mut Bencher) {
    b.iter(|| {
        let mut msg = Message::default();
        let (end, _) = msg.step(INVITE, 0, 0).unwrap();
        bencher::black_box(end);
    });
    b.bytes = INVITE.len() as u64;
}

fn bench_parse_invite_byte_at_a_time(b: &mut Bencher) {
    b.iter(|| {
        let mut msg = Message::default();
        let mut end = 0;
        for n in 1..=INVITE.len() {
            match msg.step(&INVITE[..n], end, 0) {
                Ok((pos, _)) => end = pos,
                Err(_) => break,
            }
        }
        bencher::black_box(end);
    });
    b.bytes = INVITE.len() as u64;
}

fn bench_compute_signature(b: &mut Bencher) {
    let mut msg = Message::default();
    msg.step(INVITE, 0, 0).unwrap();
    b.iter(|| {
        bencher::black_box(compute_signature(&msg, INVITE));
    });
}

benchmark_group!(benches, bench_parse_invite, bench_parse_invite_byte_at_a_time, bench_compute_signature);
benchmark_main!(benches);
