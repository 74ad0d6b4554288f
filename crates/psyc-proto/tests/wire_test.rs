//! Wire-level behavior of the public API: the documented examples, length
//! thresholds and delimiter safety.

use hex_literal::hex;
use insta::assert_snapshot;
use psyc_proto::{
    Elem, ElemFlag, IndexPath, IndexSegment, Limits, List, ListError, Modifier, ModifierFlag,
    Operator, Packet, PacketEvent, PacketFlag, PacketParser, ParseFlags, StateOp, Update,
};

const PRESENCE: &[u8] = b":_context\tpsyc://10.100.1000/~ludwig\n97\n=_degree_availability\t_here\n=_description_presence 25\tI'm omnipresent right now\n_notice_presence\n|\n";

fn presence() -> Packet<'static> {
    Packet::builder()
        .routing(Modifier::routing(Operator::Set, b"_context", b"psyc://10.100.1000/~ludwig"))
        .entity(Modifier::new(Operator::Assign, b"_degree_availability", b"_here"))
        .entity(
            Modifier::new(Operator::Assign, b"_description_presence", b"I'm omnipresent right now")
                .with_flag(ModifierFlag::NeedLength),
        )
        .method(b"_notice_presence")
        .build()
        .unwrap()
}

fn describe(event: &PacketEvent<'_>) -> String {
    match *event {
        PacketEvent::Routing { oper, name, value } => {
            format!("routing {}{} {}", char::from(oper.glyph()), name.escape_ascii(), value.escape_ascii())
        },
        PacketEvent::Entity { oper, name, value } => {
            format!("entity {}{} {}", char::from(oper.glyph()), name.escape_ascii(), value.escape_ascii())
        },
        PacketEvent::StateReset => "state =".to_owned(),
        PacketEvent::StateResync => "state ?".to_owned(),
        PacketEvent::Body { method, data } if data.is_empty() => format!("body {}", method.escape_ascii()),
        PacketEvent::Body { method, data } => {
            format!("body {} {}", method.escape_ascii(), data.escape_ascii())
        },
        PacketEvent::Content(data) => format!("content {}", data.escape_ascii()),
        PacketEvent::Complete => "complete".to_owned(),
        other => format!("{other:?}"),
    }
}

/// Parse one complete packet from `input`.
fn parse_all(parser: &mut PacketParser, input: &[u8]) -> String {
    let mut out = Vec::new();
    loop {
        let event = parser.parse(input).unwrap();
        assert_ne!(event, PacketEvent::Insufficient, "packet is complete");
        out.push(describe(&event));
        if event == PacketEvent::Complete {
            return out.join("; ");
        }
    }
}

#[test]
fn presence_renders_exactly() {
    let packet = presence();
    let bytes = packet.to_bytes();
    assert_eq!(&bytes[..], PRESENCE);
    assert_eq!(bytes.len(), packet.total_len());
    assert_snapshot!(
        bytes.escape_ascii().to_string(),
        @r":_context\tpsyc://10.100.1000/~ludwig\n97\n=_degree_availability\t_here\n=_description_presence 25\tI\'m omnipresent right now\n_notice_presence\n|\n"
    );
}

#[test]
fn presence_parses_back() {
    let mut parser = PacketParser::default();
    assert_snapshot!(
        parse_all(&mut parser, PRESENCE),
        @r"routing :_context psyc://10.100.1000/~ludwig; entity =_degree_availability _here; entity =_description_presence I\'m omnipresent right now; body _notice_presence; complete"
    );
}

#[test]
fn routing_only_then_content() {
    let mut relay = PacketParser::new(ParseFlags::ROUTING_ONLY);
    let mut content = None;
    loop {
        match relay.parse(PRESENCE).unwrap() {
            PacketEvent::Content(raw) => content = Some(raw),
            PacketEvent::Complete => break,
            _ => {},
        }
    }
    let content = content.unwrap();
    assert_eq!(content.len(), 97);

    let mut parser = PacketParser::for_content(content.len());
    assert_snapshot!(
        parse_all(&mut parser, content),
        @r"entity =_degree_availability _here; entity =_description_presence I\'m omnipresent right now; body _notice_presence; complete"
    );
}

#[test]
fn update_example() {
    let update = Update::parse(b"#1{foo}._bar =_foo:3 bar").unwrap();
    assert_eq!(
        update.path().segments(),
        &[
            IndexSegment::List(1),
            IndexSegment::Dict { key: b"foo", flag: ElemFlag::NoLength },
            IndexSegment::Struct(b"bar"),
        ]
    );
    assert_eq!(update.oper(), Operator::Assign);
    assert_eq!(update.ty(), b"_foo");
    assert_eq!(update.value().value, b"bar");
    assert_eq!(&update.to_bytes()[..], b"#1{foo}._bar =_foo:3 bar");
}

#[test]
fn list_example() {
    let list = List::parse(b"| foo| bar| baz").unwrap();
    let values: Vec<&[u8]> = list.elems().iter().map(|e| e.value).collect();
    assert_eq!(values, [&b"foo"[..], b"bar", b"baz"]);
    assert!(list.elems().iter().all(|e| e.ty.is_empty() && !e.has_length()));
    assert_eq!(list.to_bytes().len(), list.wire_len());
}

#[test]
fn single_pipe_data_forces_length() {
    let packet = Packet::builder().method(b"_message").data(b"|").build().unwrap();
    assert_eq!(packet.flag(), PacketFlag::NeedLength);
    let bytes = packet.to_bytes();
    assert_eq!(&bytes[..], b"11\n_message\n|\n|\n");

    let mut parser = PacketParser::default();
    assert_eq!(parse_all(&mut parser, &bytes), "body _message |; complete");
}

#[test]
fn modifier_threshold_boundary() {
    let at = vec![b'a'; 444];
    let over = vec![b'a'; 445];
    let cases: [(&[u8], ModifierFlag); 3] = [
        (&at[..], ModifierFlag::NoLength),
        (&over[..], ModifierFlag::NeedLength),
        (&b"a\nb"[..], ModifierFlag::NeedLength),
    ];
    for (value, flag) in cases {
        let packet = Packet::builder().entity(Modifier::new(Operator::Set, b"_v", value)).build().unwrap();
        assert_eq!(packet.entity()[0].flag, flag, "value of {} bytes", value.len());
        let expected = if flag == ModifierFlag::NeedLength { PacketFlag::NeedLength } else { PacketFlag::NoLength };
        assert_eq!(packet.flag(), expected);
    }
}

#[test]
fn custom_limits_move_the_boundary() {
    let limits = Limits::default().with_modifier_threshold(4);
    let packet = Packet::builder()
        .entity(Modifier::new(Operator::Set, b"_v", b"12345"))
        .build_with(&limits)
        .unwrap();
    assert!(packet.entity()[0].needs_length());
}

#[test]
fn list_element_with_pipe_needs_its_length() {
    let original: &[u8] = b"a|b";

    let safe = List::new(vec![Elem::new(original)]).unwrap();
    assert!(safe.elems()[0].has_length());
    let bytes = safe.to_bytes();
    assert_eq!(&bytes[..], b"|:3 a|b");
    let parsed = List::parse(&bytes).unwrap();
    assert_eq!(parsed.elems()[0].value, original);

    let unsafe_list = List::new(vec![Elem::new(original).with_flag(ElemFlag::NoLength)]).unwrap();
    let bytes = unsafe_list.to_bytes();
    assert_eq!(&bytes[..], b"| a|b");
    assert_eq!(List::parse(&bytes), Err(ListError::ElemLength { at: 4 }));
}

#[test]
fn binary_entity_value() {
    let blob = hex!("00 0a 7c ff");
    let packet = Packet::builder()
        .entity(Modifier::new(Operator::Assign, b"_key", &blob))
        .method(b"_data_binary")
        .build()
        .unwrap();
    let bytes = packet.to_bytes();
    assert_eq!(
        &bytes[..],
        hex!("32 36 0a 3d 5f 6b 65 79 20 34 09 00 0a 7c ff 0a 5f 64 61 74 61 5f 62 69 6e 61 72 79 0a 7c 0a")
    );

    let mut parser = PacketParser::default();
    let mut value = None;
    loop {
        match parser.parse(&bytes).unwrap() {
            PacketEvent::Entity { name, value: v, .. } if name == b"_key" => value = Some(v),
            PacketEvent::Complete => break,
            _ => {},
        }
    }
    assert_eq!(value, Some(&blob[..]));
}

#[test]
fn state_reset_round_trip() {
    let packet = Packet::builder()
        .state_op(StateOp::Reset)
        .entity(Modifier::new(Operator::Assign, b"_nick", b"ludwig"))
        .build()
        .unwrap();
    let bytes = packet.to_bytes();
    let mut parser = PacketParser::default();
    assert_eq!(parse_all(&mut parser, &bytes), "state =; entity =_nick ludwig; complete");
}

#[test]
fn index_path_round_trip() {
    let path = IndexPath::new(vec![
        IndexSegment::List(12),
        IndexSegment::dict(b"9lives"),
        IndexSegment::Struct(b"name"),
        IndexSegment::dict(b"plain"),
    ])
    .unwrap();
    let bytes = path.to_bytes();
    assert_eq!(&bytes[..], b"#12{6 9lives}._name{plain}");
    let parsed = IndexPath::parse(&bytes).unwrap();
    assert_eq!(parsed.segments(), path.segments());
}
