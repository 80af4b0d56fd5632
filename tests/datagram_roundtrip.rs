use bytes::BytesMut;
use chanwire::protocol::{FrameDecoder, encode_frame, metrics_snapshot};
use chanwire::{
    CONTROL_CHANNEL, ControlMessage, DGSIZE_MAX, Datagram, DatagramIterator, Envelope, Error,
    ErrorKind, MessageType, Subsystem,
};
use proptest::prelude::*;

#[test]
fn multi_envelope_is_canonical_and_routable() {
    let set_field = MessageType::STATESERVER_OBJECT_SET_FIELD;
    let mut dg = Datagram::with_multi_header([5, 3, 9, 3], 1, set_field).unwrap();
    dg.add_doid(1000).unwrap();
    dg.add_u16(7).unwrap();
    dg.add_string("hello").unwrap();

    // Same set, different order, same bytes.
    let mut other = Datagram::with_multi_header([9, 5, 3], 1, set_field).unwrap();
    other.add_doid(1000).unwrap();
    other.add_u16(7).unwrap();
    other.add_string("hello").unwrap();
    assert_eq!(dg, other);

    let mut it = dg.iter();
    let envelope = it.read_envelope().unwrap();
    assert_eq!(envelope.recipients(), vec![3, 5, 9]);
    assert_eq!(envelope.sender(), Some(1));
    assert_eq!(envelope.msg_type().subsystem(), Some(Subsystem::StateServer));
    assert_eq!(it.read_doid().unwrap(), 1000);
    assert_eq!(it.read_u16().unwrap(), 7);
    assert_eq!(it.read_string().unwrap(), "hello");
    assert!(it.is_empty());
}

#[test]
fn control_messages_survive_the_wire() {
    let mut post =
        Datagram::with_server_header(4000, 12, MessageType::STATESERVER_OBJECT_DELETE_RAM)
            .unwrap();
    post.add_doid(4000).unwrap();

    let messages = [
        ControlMessage::AddChannel(4000),
        ControlMessage::AddRange {
            low: 100_000,
            high: 199_999,
        },
        ControlMessage::add_post_remove(&post),
        ControlMessage::SetConName("stateserver".to_owned()),
        ControlMessage::ClearPostRemoves,
    ];

    let mut stream = BytesMut::new();
    for message in &messages {
        stream.extend_from_slice(&encode_frame(&message.to_datagram().unwrap()));
    }

    let mut decoder = FrameDecoder::new();
    for expected in &messages {
        let frame = decoder.decode(&mut stream).expect("complete frame");
        let mut it = DatagramIterator::new(frame);
        let envelope = it.clone().read_envelope().unwrap();
        assert_eq!(envelope.recipients(), vec![CONTROL_CHANNEL]);
        assert_eq!(&ControlMessage::read(&mut it).unwrap(), expected);
        assert!(it.is_empty());
    }
    assert!(decoder.decode(&mut stream).is_none());
}

#[test]
fn control_read_rejects_server_envelope() {
    let dg = Datagram::with_server_header(5, 3, MessageType::CONTROL_ADD_CHANNEL).unwrap();
    let mut it = dg.iter();
    assert_eq!(
        ControlMessage::read(&mut it),
        Err(Error::UnknownMessageType(MessageType::CONTROL_ADD_CHANNEL.as_u16()))
    );
    assert_eq!(it.tell(), 0);
}

#[test]
fn failed_reads_and_appends_are_counted() {
    let before = metrics_snapshot();

    let mut it = DatagramIterator::new(&[1u8, 2, 3][..]);
    assert_eq!(it.read_u32().unwrap_err().kind(), ErrorKind::Underrun);

    let mut dg = Datagram::new();
    assert!(dg.add_multi_header(std::iter::empty(), 1, MessageType::RESERVED).is_err());

    let after = metrics_snapshot();
    assert!(after.underrun_errors > before.underrun_errors);
    assert!(after.malformed_errors > before.malformed_errors);
}

#[cfg(not(feature = "dgsize32"))]
#[test]
fn datagram_fills_to_the_ceiling_and_no_further() {
    let mut dg = Datagram::new();
    dg.add_data(&vec![0xAB; DGSIZE_MAX - 1]).unwrap();
    dg.add_u8(1).unwrap();
    assert_eq!(dg.len(), DGSIZE_MAX);

    assert_eq!(
        dg.add_u8(2),
        Err(Error::Overflow {
            attempted: DGSIZE_MAX + 1,
            max: DGSIZE_MAX
        })
    );
    assert_eq!(dg.len(), DGSIZE_MAX);

    let mut it = dg.iter();
    it.skip(DGSIZE_MAX - 1).unwrap();
    assert_eq!(it.read_u8().unwrap(), 1);
    assert!(it.read_u8().unwrap_err().is_underrun());
}

#[test]
fn control_channel_cannot_masquerade_as_server_recipient() {
    let set_field = MessageType::STATESERVER_OBJECT_SET_FIELD;
    assert_eq!(
        Datagram::with_server_header(CONTROL_CHANNEL, 0xABCD_0102, set_field),
        Err(Error::ReservedChannel(CONTROL_CHANNEL))
    );
    assert_eq!(
        Datagram::with_multi_header([CONTROL_CHANNEL], 9, set_field),
        Err(Error::ReservedChannel(CONTROL_CHANNEL))
    );
}

#[test]
fn envelope_serializes_through_write() {
    let envelope = Envelope::Control {
        msg_type: MessageType::CONTROL_LOG_MESSAGE,
    };
    let mut dg = Datagram::new();
    envelope.write(&mut dg).unwrap();
    assert_eq!(dg.len(), envelope.encoded_len());
    assert_eq!(envelope.sender(), None);
    assert_eq!(dg.iter().read_envelope().unwrap(), envelope);
}

proptest! {
    /// Property: a read of `n` bytes succeeds exactly when `n` bytes remain
    #[test]
    fn reads_succeed_only_within_bounds(len in 0usize..64, want in 0usize..72) {
        let dg = Datagram::from_bytes(&vec![7u8; len]).unwrap();
        let mut it = dg.iter();
        let result = it.read_data(want);
        if want <= len {
            prop_assert_eq!(result.unwrap().len(), want);
            prop_assert_eq!(it.remaining(), len - want);
        } else {
            prop_assert!(result.unwrap_err().is_underrun());
            prop_assert_eq!(it.tell(), 0);
        }
    }

    /// Property: multi headers decode to the deduplicated, sorted recipient set
    #[test]
    fn multi_header_roundtrip(
        recipients in prop::collection::vec(
            any::<u64>().prop_filter("not control", |c| *c != CONTROL_CHANNEL),
            1..40,
        ),
        from in any::<u64>(),
        msg_type in any::<u16>(),
    ) {
        let msg_type = MessageType::new(msg_type);
        let dg = Datagram::with_multi_header(recipients.iter().copied(), from, msg_type).unwrap();
        let envelope = dg.iter().read_envelope().unwrap();

        let mut expected = recipients.clone();
        expected.sort_unstable();
        expected.dedup();
        prop_assert_eq!(envelope.recipients(), expected);
        prop_assert_eq!(envelope.sender(), Some(from));
        prop_assert_eq!(envelope.msg_type(), msg_type);
        prop_assert_eq!(envelope.encoded_len(), dg.len());
    }

    /// Property: strings and blobs read back exactly as written
    #[test]
    fn strings_and_blobs_roundtrip(
        text in ".{0,64}",
        blob in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let mut dg = Datagram::new();
        dg.add_string(&text).unwrap();
        dg.add_blob(&blob).unwrap();

        let mut it = dg.iter();
        prop_assert_eq!(it.read_string().unwrap(), text.as_str());
        prop_assert_eq!(it.read_blob().unwrap(), blob.as_slice());
        prop_assert!(it.is_empty());
    }
}
