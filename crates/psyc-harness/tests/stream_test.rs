//! Resumability: a stream split anywhere reads as the same packets.

use proptest::prelude::*;
use psyc_harness::{Fragmenter, PacketReader, ReceivedPacket};
use psyc_proto::{Limits, Modifier, ModifierFlag, Operator, Packet, ParseFlags, StateOp};

const PRESENCE: &[u8] = b":_context\tpsyc://10.100.1000/~ludwig\n97\n=_degree_availability\t_here\n=_description_presence 25\tI'm omnipresent right now\n_notice_presence\n|\n";

fn read_all(reader: &mut PacketReader, chunks: &[&[u8]]) -> Vec<ReceivedPacket> {
    let mut packets = Vec::new();
    for chunk in chunks {
        reader.feed(chunk);
        while let Some(packet) = reader.next_packet().unwrap() {
            packets.push(packet);
        }
    }
    packets
}

fn whole(stream: &[u8]) -> Vec<ReceivedPacket> {
    read_all(&mut PacketReader::new(), &[stream])
}

/// A stream of several packets, one with a body too large for small chunks.
fn mixed_stream() -> Vec<u8> {
    let big = vec![b'|'; 2000];
    let packets = [
        Packet::builder()
            .routing(Modifier::routing(Operator::Set, b"_target", b"psyc://example.net/@room"))
            .state_op(StateOp::Reset)
            .entity(Modifier::new(Operator::Assign, b"_nick", b"ludwig"))
            .build()
            .unwrap(),
        Packet::builder()
            .routing(Modifier::routing(Operator::Set, b"_source", b"psyc://example.net/~ludwig"))
            .entity(Modifier::new(Operator::Set, b"_blob", &big))
            .method(b"_message_public")
            .data(b"line one\nline two")
            .build()
            .unwrap(),
        Packet::builder().method(b"_request_ping").data(&big).build().unwrap(),
        Packet::builder().build().unwrap(),
    ];
    let mut stream = Vec::new();
    for packet in &packets {
        stream.extend_from_slice(&packet.to_bytes());
    }
    stream
}

#[test]
fn every_split_point_of_presence() {
    let expected = whole(PRESENCE);
    assert_eq!(expected.len(), 1);
    for k in 0..=PRESENCE.len() {
        let mut reader = PacketReader::new();
        let packets = read_all(&mut reader, &[&PRESENCE[..k], &PRESENCE[k..]]);
        assert_eq!(packets, expected, "split at {k}");
        assert_eq!(reader.buffered(), 0);
    }
}

#[test]
fn byte_by_byte() {
    let stream = mixed_stream();
    let expected = whole(&stream);
    assert_eq!(expected.len(), 4);
    let chunks: Vec<&[u8]> = stream.chunks(1).collect();
    assert_eq!(read_all(&mut PacketReader::new(), &chunks), expected);
}

#[test]
fn seeded_fragments() {
    let stream = mixed_stream();
    let expected = whole(&stream);
    assert_eq!(&expected[1].data[..], b"line one\nline two");
    assert_eq!(expected[1].entity[0].value.len(), 2000);
    assert_eq!(expected[2].data.len(), 2000);
    assert_eq!(expected[0].state_op, StateOp::Reset);

    for seed in 0..64 {
        let chunks = Fragmenter::new(seed, 1 + (seed as usize % 300)).split(&stream);
        assert_eq!(read_all(&mut PacketReader::new(), &chunks), expected, "seed {seed}");
    }
}

#[test]
fn relay_forwards_raw_content() {
    let stream = mixed_stream();
    let expected = whole(&stream);

    let relayed = read_all(&mut PacketReader::with_flags(ParseFlags::ROUTING_ONLY), &[&stream]);
    let mut forwarded = Vec::new();
    for packet in &relayed {
        forwarded.extend_from_slice(&packet.as_packet(&Limits::default()).unwrap().to_bytes());
    }
    assert_eq!(whole(&forwarded), expected);
}

#[test]
fn routing_only_under_splits() {
    let stream = mixed_stream();
    let relay = || PacketReader::with_flags(ParseFlags::ROUTING_ONLY);
    let expected = read_all(&mut relay(), &[&stream]);
    assert_eq!(expected.len(), 4);
    assert!(expected[2].content.len() > 2000);

    let bytewise: Vec<&[u8]> = stream.chunks(1).collect();
    assert_eq!(read_all(&mut relay(), &bytewise), expected);

    for seed in 0..32 {
        let chunks = Fragmenter::new(seed, 1 + (seed as usize * 37 % 500)).split(&stream);
        assert_eq!(read_all(&mut relay(), &chunks), expected, "seed {seed}");
    }
}

#[test]
fn received_packets_render_back() {
    let packet = Packet::builder()
        .entity(
            Modifier::new(Operator::Assign, b"_description", b"short").with_flag(ModifierFlag::NeedLength),
        )
        .method(b"_notice")
        .build()
        .unwrap();
    let received = whole(&packet.to_bytes());
    let rebuilt = received[0].as_packet(&Limits::default()).unwrap();
    // the forced length is not kept; both forms read the same
    assert_eq!(whole(&rebuilt.to_bytes()), received);
}

proptest! {
    #[test]
    fn random_fragmentation(seed in any::<u64>(), max_chunk in 1usize..64, data in proptest::collection::vec(any::<u8>(), 0..1500)) {
        let packet = Packet::builder()
            .routing(Modifier::routing(Operator::Set, b"_context", b"psyc://example.net/@room"))
            .entity(Modifier::new(Operator::Set, b"_value", &data))
            .method(b"_message")
            .data(&data)
            .build()
            .unwrap();
        let mut stream = packet.to_bytes().to_vec();
        stream.extend_from_slice(PRESENCE);

        let expected = whole(&stream);
        prop_assert_eq!(expected.len(), 2);
        prop_assert_eq!(&expected[0].data[..], &data[..]);

        let chunks = Fragmenter::new(seed, max_chunk).split(&stream);
        prop_assert_eq!(read_all(&mut PacketReader::new(), &chunks), expected);
    }
}
