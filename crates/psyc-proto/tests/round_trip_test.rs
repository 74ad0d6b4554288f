//! Property tests: rendered packets and values parse back unchanged, whole or
//! split at any point.

use proptest::{collection::vec, prelude::*};
use psyc_proto::{
    Dict, DictEntry, Elem, List, Modifier, Operator, Packet, PacketEvent, PacketParser, StateOp,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Mod {
    oper: Operator,
    name: Vec<u8>,
    value: Vec<u8>,
}

/// A packet assembled from parser events.
#[derive(Debug, Default, PartialEq, Eq)]
struct Assembled {
    routing: Vec<Mod>,
    entity: Vec<Mod>,
    state_op: Option<StateOp>,
    method: Vec<u8>,
    data: Vec<u8>,
}

impl Assembled {
    fn apply(&mut self, event: PacketEvent<'_>) {
        let owned = |oper, name: &[u8], value: &[u8]| Mod { oper, name: name.to_vec(), value: value.to_vec() };
        match event {
            PacketEvent::Routing { oper, name, value } => self.routing.push(owned(oper, name, value)),
            PacketEvent::Entity { oper, name, value } | PacketEvent::EntityStart { oper, name, value, .. } => {
                self.entity.push(owned(oper, name, value));
            },
            PacketEvent::EntityCont(piece) | PacketEvent::EntityEnd(piece) => {
                self.entity.last_mut().unwrap().value.extend_from_slice(piece);
            },
            PacketEvent::StateReset => self.state_op = Some(StateOp::Reset),
            PacketEvent::StateResync => self.state_op = Some(StateOp::Resync),
            PacketEvent::Body { method, data } | PacketEvent::BodyStart { method, data, .. } => {
                self.method = method.to_vec();
                self.data = data.to_vec();
            },
            PacketEvent::BodyCont(piece) | PacketEvent::BodyEnd(piece) => self.data.extend_from_slice(piece),
            other => panic!("unexpected event {other:?}"),
        }
    }
}

/// Parse `bytes`, first seeing only `bytes[..split]`.
fn assemble(bytes: &[u8], split: usize) -> Assembled {
    let mut parser = PacketParser::default();
    let mut packet = Assembled::default();
    let mut available = &bytes[..split];
    loop {
        match parser.parse(available).unwrap() {
            PacketEvent::Complete => return packet,
            PacketEvent::Insufficient => {
                assert!(available.len() < bytes.len(), "complete input reported insufficient");
                available = bytes;
            },
            event => packet.apply(event),
        }
    }
}

fn operator() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Set),
        Just(Operator::Assign),
        Just(Operator::Augment),
        Just(Operator::Diminish),
        Just(Operator::Update),
        Just(Operator::Query),
    ]
}

fn name() -> impl Strategy<Value = Vec<u8>> {
    "_[a-z][a-z_]{0,12}".prop_map(String::into_bytes)
}

fn routing_mod() -> impl Strategy<Value = Mod> {
    (operator(), name(), "[ -~]{0,40}").prop_map(|(oper, name, value)| Mod { oper, name, value: value.into_bytes() })
}

fn entity_mod() -> impl Strategy<Value = Mod> {
    (operator(), name(), vec(any::<u8>(), 0..600)).prop_map(|(oper, name, value)| Mod { oper, name, value })
}

fn state_op() -> impl Strategy<Value = StateOp> {
    prop_oneof![Just(StateOp::NoOp), Just(StateOp::Reset), Just(StateOp::Resync)]
}

/// Body data; mostly text with delimiter-like bytes mixed in.
fn data() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        vec(prop_oneof![Just(b'|'), Just(b'\n'), Just(b'a')], 0..12),
        vec(any::<u8>(), 0..600),
    ]
}

fn body() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    prop_oneof![Just((Vec::new(), Vec::new())), (name(), data())]
}

proptest! {
    #[test]
    fn packets_survive_render_and_split_parse(
        routing in vec(routing_mod(), 0..4),
        entity in vec(entity_mod(), 0..4),
        state_op in state_op(),
        (method, data) in body(),
        split_at in any::<prop::sample::Index>(),
    ) {
        let mut builder = Packet::builder().state_op(state_op).method(&method).data(&data);
        for m in &routing {
            builder = builder.routing(Modifier::routing(m.oper, &m.name, &m.value));
        }
        for m in &entity {
            builder = builder.entity(Modifier::new(m.oper, &m.name, &m.value));
        }
        let packet = builder.build().unwrap();
        let bytes = packet.to_bytes();
        prop_assert_eq!(bytes.len(), packet.total_len());

        let expected = Assembled {
            routing: routing.clone(),
            entity: entity.clone(),
            state_op: (state_op != StateOp::NoOp).then_some(state_op),
            method: method.clone(),
            data: data.clone(),
        };
        prop_assert_eq!(&assemble(&bytes, bytes.len()), &expected);

        let split = split_at.index(bytes.len() + 1);
        prop_assert_eq!(&assemble(&bytes, split), &expected);
    }

    #[test]
    fn lists_survive_render_and_parse(values in vec(vec(any::<u8>(), 0..500), 0..6)) {
        let list = List::new(values.iter().map(|v| Elem::new(v)).collect()).unwrap();
        let bytes = list.to_bytes();
        prop_assert_eq!(bytes.len(), list.wire_len());
        let parsed = List::parse(&bytes).unwrap();
        let parsed: Vec<&[u8]> = parsed.elems().iter().map(|e| e.value).collect();
        let values: Vec<&[u8]> = values.iter().map(Vec::as_slice).collect();
        prop_assert_eq!(parsed, values);
    }

    #[test]
    fn dicts_survive_render_and_parse(
        entries in vec((vec(any::<u8>(), 0..40), vec(any::<u8>(), 0..80)), 0..6),
    ) {
        let dict = Dict::new(entries.iter().map(|(k, v)| DictEntry::new(k, v)).collect()).unwrap();
        let bytes = dict.to_bytes();
        prop_assert_eq!(bytes.len(), dict.wire_len());
        let parsed = Dict::parse(&bytes).unwrap();
        let parsed: Vec<(&[u8], &[u8])> = parsed.entries().iter().map(|e| (e.key.value, e.value.value)).collect();
        let entries: Vec<(&[u8], &[u8])> = entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice())).collect();
        prop_assert_eq!(parsed, entries);
    }
}
