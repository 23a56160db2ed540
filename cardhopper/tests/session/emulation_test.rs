#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use cardhopper::cancel::CancelContext;
use cardhopper::cardhopper::{CardHopper, SessionConfig};
use cardhopper::test_support::{MutatingTracer, RecordingHandler, RecordingTracer, relay_link};
use cardhopper::type4::EmulatedCard;
use cardhopper::TraceDirection;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

/// Setup writes for the sample identity: command, CARD, tag type, timing, UID, ATS
const SETUP_LEN: usize = 11 + 5 + 2 + 3 + 8 + 6;

async fn send(relay: &mut DuplexStream, block: &[u8]) -> anyhow::Result<()> {
    let mut wire = vec![block.len() as u8];
    wire.extend_from_slice(block);
    relay.write_all(&wire).await?;
    Ok(())
}

async fn recv(relay: &mut DuplexStream) -> anyhow::Result<Vec<u8>> {
    let len = relay.read_u8().await?;
    let mut block = vec![0u8; len as usize];
    relay.read_exact(&mut block).await?;
    Ok(block)
}

async fn skip_setup(relay: &mut DuplexStream) -> anyhow::Result<()> {
    let mut setup = [0u8; SETUP_LEN];
    relay.read_exact(&mut setup).await?;
    Ok(())
}

#[tokio::test]
async fn reader_session_end_to_end() -> anyhow::Result<()> {
    common::init_logging();
    let (transport, mut relay) = relay_link();
    let handler = Arc::new(RecordingHandler::new());
    handler.push_response(vec![0x90, 0x00]);
    handler.push_response(hex::decode("000F20003B00340406E10400FF00FF9000")?);
    let tracer = Arc::new(RecordingTracer::default());
    let card = EmulatedCard::new(common::fixtures::sample_identity(), handler.clone())
        .with_tracer(tracer.clone());
    let mut hopper = CardHopper::new(transport, card).with_config(SessionConfig::immediate());
    let ctx = CancelContext::new();

    let session = async {
        let res = hopper.run(&ctx).await;
        hopper.close().await;
        res
    };

    let reader = async {
        skip_setup(&mut relay).await?;

        send(&mut relay, &[0xE0, 0x80]).await?;

        // SELECT split across two I-blocks.
        let select = common::fixtures::select_ndef_app();
        let (head, tail) = select.split_at(6);
        let mut first = vec![0x12];
        first.extend_from_slice(head);
        send(&mut relay, &first).await?;
        assert_eq!(recv(&mut relay).await?, vec![0xA2]);

        let mut last = vec![0x03];
        last.extend_from_slice(tail);
        send(&mut relay, &last).await?;
        assert_eq!(recv(&mut relay).await?, vec![0x03, 0x90, 0x00]);

        // Reader lost the answer and asks again for block 1.
        send(&mut relay, &[0xB3]).await?;
        assert_eq!(recv(&mut relay).await?, vec![0x03, 0x90, 0x00]);

        send(&mut relay, &common::fixtures::i_block(0, &common::fixtures::read_binary_cc())).await?;
        assert_eq!(
            hex::encode_upper(recv(&mut relay).await?),
            "02000F20003B00340406E10400FF00FF9000"
        );

        send(&mut relay, &[0xC2]).await?;
        assert_eq!(recv(&mut relay).await?, vec![0xC2]);

        ctx.cancel();

        let mut teardown = [0u8; 21];
        relay.read_exact(&mut teardown).await?;
        assert_eq!(&teardown[..], b"\x07RESTART\x07RESTART\x04\xFFEND");
        anyhow::Ok(())
    };

    let (session_res, reader_res) = tokio::join!(session, reader);
    session_res?;
    reader_res?;

    assert_eq!(
        handler.capdus(),
        vec![
            common::fixtures::select_ndef_app(),
            common::fixtures::read_binary_cc()
        ]
    );
    assert_eq!(handler.reset_count(), 1);
    assert_eq!(tracer.events().len(), 4);
    assert_eq!(tracer.events()[0], (TraceDirection::Reader, common::fixtures::select_ndef_app()));
    Ok(())
}

#[tokio::test]
async fn handler_failures_keep_session_alive() -> anyhow::Result<()> {
    let (transport, mut relay) = relay_link();
    let handler = Arc::new(RecordingHandler::new());
    handler.push_error(cardhopper::Error::Handler("applet crashed".into()));
    let card = EmulatedCard::new(common::fixtures::sample_identity(), handler.clone());
    let mut hopper = CardHopper::new(transport, card).with_config(SessionConfig::immediate());
    let ctx = CancelContext::new();

    let reader = async {
        skip_setup(&mut relay).await?;
        send(&mut relay, &common::fixtures::i_block(0, &[0x00, 0xA4, 0x00, 0x0C])).await?;
        assert_eq!(recv(&mut relay).await?, vec![0x02, 0x6F, 0x00]);
        send(&mut relay, &common::fixtures::i_block(1, &[0x00, 0xB0, 0x00, 0x00])).await?;
        assert_eq!(recv(&mut relay).await?, vec![0x03, 0x90, 0x00]);
        ctx.cancel();
        anyhow::Ok(())
    };

    let (session_res, reader_res) = tokio::join!(hopper.run(&ctx), reader);
    session_res?;
    reader_res?;
    assert_eq!(handler.capdus().len(), 2);
    Ok(())
}

#[tokio::test]
async fn mutating_tracer_answers_internal_exception() -> anyhow::Result<()> {
    let (transport, mut relay) = relay_link();
    let handler = Arc::new(RecordingHandler::new());
    let card = EmulatedCard::new(common::fixtures::sample_identity(), handler.clone())
        .with_tracer(Arc::new(MutatingTracer::tag()));
    let mut hopper = CardHopper::new(transport, card).with_config(SessionConfig::immediate());
    let ctx = CancelContext::new();

    let reader = async {
        skip_setup(&mut relay).await?;
        send(&mut relay, &common::fixtures::i_block(0, &common::fixtures::read_binary_cc())).await?;
        assert_eq!(recv(&mut relay).await?, vec![0x02, 0x6F, 0x00]);
        ctx.cancel();
        anyhow::Ok(())
    };

    let (session_res, reader_res) = tokio::join!(hopper.run(&ctx), reader);
    session_res?;
    reader_res?;
    // The handler ran; its response was discarded.
    assert_eq!(handler.capdus().len(), 1);
    Ok(())
}

#[tokio::test]
async fn idle_session_stops_at_deadline() -> anyhow::Result<()> {
    let (transport, mut relay) = relay_link();
    let card = EmulatedCard::new(
        common::fixtures::sample_identity(),
        Arc::new(RecordingHandler::new()),
    );
    let mut hopper = CardHopper::new(transport, card).with_config(SessionConfig::immediate());
    let ctx = CancelContext::new().with_timeout(Duration::from_millis(100));

    let start = Instant::now();
    hopper.run(&ctx).await?;
    assert!(start.elapsed() < Duration::from_secs(2));

    skip_setup(&mut relay).await?;
    Ok(())
}
