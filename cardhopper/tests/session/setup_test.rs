#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use cardhopper::Error;
use cardhopper::cancel::{CancelContext, Cause};
use cardhopper::cardhopper::{CardHopper, CardHopperBuilder, SessionConfig};
use cardhopper::protocol::Command;
use cardhopper::test_support::{RecordingHandler, relay_link};
use cardhopper::type4::EmulatedCard;
use tokio::io::AsyncReadExt;

fn card() -> EmulatedCard {
    EmulatedCard::new(
        common::fixtures::sample_identity(),
        Arc::new(RecordingHandler::new()),
    )
}

#[tokio::test]
async fn setup_bytes_on_the_wire() -> anyhow::Result<()> {
    common::init_logging();
    let (transport, mut relay) = relay_link();
    let mut hopper = CardHopperBuilder::new()
        .with_transport(transport)
        .with_card(card())
        .with_config(SessionConfig::immediate())
        .build()?;

    hopper.setup(&CancelContext::new()).await?;

    let mut expected = Command::ENTER_STANDALONE.to_bytes();
    expected.extend_from_slice(b"\x04CARD");
    expected.extend_from_slice(&[0x01, 0x0B]);
    expected.extend_from_slice(&[0x02, 0x0E, 0x0B]);
    expected.push(7);
    expected.extend_from_slice(&common::fixtures::sample_uid());
    expected.push(5);
    expected.extend_from_slice(&common::fixtures::sample_ats());

    let mut got = vec![0u8; expected.len()];
    relay.read_exact(&mut got).await?;
    assert_eq!(hex::encode(got), hex::encode(expected));
    Ok(())
}

#[tokio::test]
async fn setup_fails_when_relay_is_gone() {
    let (transport, relay) = relay_link();
    drop(relay);
    let mut hopper = CardHopper::new(transport, card()).with_config(SessionConfig::immediate());

    assert!(matches!(
        hopper.setup(&CancelContext::new()).await,
        Err(Error::Io(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn setup_honours_deadline() {
    let (transport, _relay) = relay_link();
    let mut hopper = CardHopper::new(transport, card());
    let ctx = CancelContext::new().with_timeout(Duration::from_millis(1050));

    match hopper.setup(&ctx).await {
        Err(Error::Cancelled(Cause::DeadlineExceeded)) => {}
        other => panic!("expected deadline, got: {:?}", other),
    }
}

#[tokio::test]
async fn close_bytes_on_the_wire() -> anyhow::Result<()> {
    let (transport, mut relay) = relay_link();
    let mut hopper = CardHopper::new(transport, card()).with_config(SessionConfig::immediate());
    hopper.close().await;
    drop(hopper);

    let mut got = Vec::new();
    relay.read_to_end(&mut got).await?;
    assert_eq!(got, b"\x07RESTART\x07RESTART\x04\xFFEND".to_vec());
    Ok(())
}
