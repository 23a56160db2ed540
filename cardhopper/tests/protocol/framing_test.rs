use cardhopper::Error;
use cardhopper::protocol::{MAGIC_END, MAGIC_ERR, MAGIC_READ, Packet, PacketChannel, encode};
use cardhopper::transport::{MockTransport, StreamTransport};
use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn every_length_survives_framing() -> anyhow::Result<()> {
    let mut writer = PacketChannel::new(MockTransport::new());
    for len in 0..=255usize {
        let payload: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
        writer.write_ignoring_ack(&payload).await?;
    }

    let mut reader = PacketChannel::new(MockTransport::new());
    reader
        .transport_mut()
        .push_input(&writer.transport().sent_bytes());

    let mut p = Packet::new();
    for len in 0..=255usize {
        let expected: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
        assert_eq!(reader.read_packet(&mut p).await?, len + 1);
        assert_eq!(p.as_bytes(), expected.as_slice());
    }
    assert_eq!(reader.read_packet(&mut p).await?, 0);
    Ok(())
}

#[test]
fn length_256_is_rejected() {
    assert!(matches!(
        encode(&[0u8; 256]),
        Err(Error::PacketTooBig { len: 256, max: 255 })
    ));
    let mut p = Packet::new();
    assert!(p.write(&[0u8; 256]).is_err());
}

#[test]
fn magic_packets_wire_form() {
    assert_eq!(hex::encode(encode(MAGIC_READ).unwrap()), "0452454144");
    assert_eq!(hex::encode(encode(MAGIC_END).unwrap()), "04ff454e44");
    assert_eq!(hex::encode(encode(MAGIC_ERR).unwrap()), "04ff455252");
}

#[tokio::test]
async fn framing_over_split_stream_writes() -> anyhow::Result<()> {
    let (near, mut far) = tokio::io::duplex(64);
    let mut ch = PacketChannel::new(StreamTransport::new(near));

    // The relay dribbles the packet out in pieces.
    tokio::spawn(async move {
        far.write_all(&[0x05, 0x00, 0xA4]).await.unwrap();
        tokio::task::yield_now().await;
        far.write_all(&[0x04, 0x00]).await.unwrap();
        tokio::task::yield_now().await;
        far.write_all(&[0x00]).await.unwrap();
    });

    let p = ch.read().await?;
    assert_eq!(p.as_bytes(), &[0x00, 0xA4, 0x04, 0x00, 0x00]);
    Ok(())
}

#[tokio::test]
async fn closed_stream_mid_packet_is_truncated() {
    let (near, mut far) = tokio::io::duplex(64);
    far.write_all(&[0x03, 0x01]).await.unwrap();
    drop(far);

    let mut ch = PacketChannel::new(StreamTransport::new(near));
    assert!(matches!(
        ch.read().await,
        Err(Error::TruncatedRead {
            expected: 3,
            actual: 1
        })
    ));
}
