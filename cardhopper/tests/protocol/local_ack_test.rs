use cardhopper::Error;
use cardhopper::protocol::{Command, PacketChannel};
use cardhopper::transport::{Acker, MockTransport, Transport};

#[tokio::test]
async fn writes_are_acked_without_touching_the_stream() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.push_input(&[0x42]);
    let mut ch = PacketChannel::with_local_ack(mock);

    let payloads: [&[u8]; 3] = [b"CARD", &[0x0B], &[0x0E, 0x0B]];
    for payload in payloads {
        ch.write_with_ack(payload).await?;
    }
    assert_eq!(ch.transport().inner().receive_calls, 0);
    assert_eq!(ch.transport().inner().input.len(), 1);
    Ok(())
}

#[tokio::test]
async fn standalone_command_reads_real_stream() -> anyhow::Result<()> {
    let mut mock = MockTransport::new();
    mock.push_input(&[0x77]);
    let mut acker = Acker::new(mock);

    acker.send(&Command::ENTER_STANDALONE.to_bytes()).await?;
    let mut buf = [0u8; 1];
    assert_eq!(acker.receive(&mut buf).await?, 1);
    assert_eq!(buf[0], 0x77);
    assert_eq!(acker.inner().receive_calls, 1);
    Ok(())
}

#[tokio::test]
async fn device_ack_must_be_fe() {
    let mut ch = PacketChannel::new(MockTransport::new());
    ch.transport_mut().push_input(&[0xFD]);
    assert!(matches!(ch.write_with_ack(b"CARD").await, Err(Error::BadAck(0xFD))));
}
