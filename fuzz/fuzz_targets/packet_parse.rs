#![no_main]

use libfuzzer_sys::fuzz_target;
use psyc_proto::{PacketEvent, PacketParser, ParseFlags};

fuzz_target!(|data: &[u8]| {
    for flags in [ParseFlags::empty(), ParseFlags::ROUTING_ONLY] {
        let mut parser = PacketParser::new(flags);
        // Every event consumes input or ends the call
        for _ in 0..=data.len() + 2 {
            match parser.parse(data) {
                Ok(PacketEvent::Insufficient) | Err(_) => break,
                Ok(_) => assert!(parser.cursor() <= data.len()),
            }
        }
    }

    let mut parser = PacketParser::for_content(data.len());
    for _ in 0..=data.len() + 2 {
        match parser.parse(data) {
            Ok(PacketEvent::Insufficient | PacketEvent::Complete) | Err(_) => break,
            Ok(_) => {},
        }
    }
});
