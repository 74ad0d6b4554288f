#![no_main]

use libfuzzer_sys::fuzz_target;
use psyc_harness::{Fragmenter, PacketReader, ReceivedPacket};

/// Packets read before the first error, and whether one occurred.
fn read(chunks: &[&[u8]]) -> (Vec<ReceivedPacket>, bool) {
    let mut reader = PacketReader::new();
    let mut packets = Vec::new();
    for chunk in chunks {
        reader.feed(chunk);
        loop {
            match reader.next_packet() {
                Ok(Some(packet)) => packets.push(packet),
                Ok(None) => break,
                Err(_) => return (packets, true),
            }
        }
    }
    (packets, false)
}

fuzz_target!(|input: (u64, u8, &[u8])| {
    let (seed, max_chunk, stream) = input;
    let chunks = Fragmenter::new(seed, usize::from(max_chunk)).split(stream);
    assert_eq!(read(&chunks), read(&[stream]));
});
