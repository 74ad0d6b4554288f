#![no_main]

use libfuzzer_sys::fuzz_target;
use psyc_proto::{Dict, IndexPath, List, Update};

fuzz_target!(|data: &[u8]| {
    if let Ok(list) = List::parse(data) {
        let rendered = list.to_bytes();
        assert_eq!(rendered.len(), list.wire_len());
    }
    if let Ok(dict) = Dict::parse(data) {
        let rendered = dict.to_bytes();
        assert_eq!(rendered.len(), dict.wire_len());
    }
    let _ = IndexPath::parse(data);
    let _ = Update::parse(data);
});
