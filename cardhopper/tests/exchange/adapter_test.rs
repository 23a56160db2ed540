#[path = "../common/mod.rs"]
mod common;

use std::sync::{Arc, Mutex};

use cardhopper::apdu::{Capdu, Rapdu};
use cardhopper::cancel::CancelContext;
use cardhopper::exchange::{
    ApduExchanger, ApduerFn, Exchanger, RawSmartCard, RawSmartCardExchanger,
};
use cardhopper::test_support::{MutatingTracer, RecordingTracer};
use cardhopper::type4::{MultiTracer, Tracer, TracingExchanger};
use cardhopper::{Error, TraceDirection};

/// Card that answers SELECT with 9000 and anything else with 6D00.
struct SelectOnlyCard {
    seen: Mutex<Vec<Vec<u8>>>,
}

impl RawSmartCard for SelectOnlyCard {
    fn transmit(&self, data: &[u8]) -> cardhopper::Result<Vec<u8>> {
        self.seen.lock().unwrap().push(data.to_vec());
        match data.get(1) {
            Some(0xA4) => Ok(vec![0x90, 0x00]),
            _ => Ok(vec![0x6D, 0x00]),
        }
    }
}

#[tokio::test]
async fn raw_card_behind_tracer() -> anyhow::Result<()> {
    let card = Arc::new(SelectOnlyCard {
        seen: Mutex::new(Vec::new()),
    });
    let tracer = Arc::new(RecordingTracer::default());
    let ex = TracingExchanger::new(tracer.clone(), RawSmartCardExchanger::new(card.clone()));
    let ctx = CancelContext::new();

    let select = common::fixtures::select_ndef_app();
    assert_eq!(ex.exchange(&ctx, &select).await?, vec![0x90, 0x00]);

    let r = ex
        .apdu(&ctx, &Capdu::parse(&common::fixtures::read_binary_cc())?)
        .await?;
    assert_eq!(r.sw(), 0x6D00);

    assert_eq!(card.seen.lock().unwrap().len(), 2);
    assert_eq!(
        tracer.events()[3],
        (TraceDirection::Tag, vec![0x6D, 0x00])
    );
    Ok(())
}

#[tokio::test]
async fn apdu_handler_lifted_to_bytes() -> anyhow::Result<()> {
    let apduer = ApduerFn(|_ctx: CancelContext, capdu: Capdu| async move {
        if capdu.ins == 0xB0 {
            Ok::<_, Error>(Rapdu::new(vec![0u8; capdu.ne.min(4)], 0x90, 0x00))
        } else {
            Ok(Rapdu::new(vec![], 0x6A, 0x82))
        }
    });
    let ex = ApduExchanger(apduer);
    let ctx = CancelContext::new();

    assert_eq!(
        ex.exchange(&ctx, &common::fixtures::read_binary_cc()).await?,
        vec![0, 0, 0, 0, 0x90, 0x00]
    );
    assert_eq!(
        ex.exchange(&ctx, &common::fixtures::select_ndef_app()).await?,
        vec![0x6A, 0x82]
    );
    assert!(matches!(
        ex.exchange(&ctx, &[0x00, 0xA4]).await,
        Err(Error::InvalidApdu(_))
    ));
    Ok(())
}

#[tokio::test]
async fn one_bad_tracer_in_a_chain_fails_the_exchange() {
    let recorder = Arc::new(RecordingTracer::default());
    let chain = MultiTracer::new(vec![
        recorder.clone() as Arc<dyn Tracer>,
        Arc::new(MutatingTracer::reader()),
    ]);
    let card = Arc::new(SelectOnlyCard {
        seen: Mutex::new(Vec::new()),
    });
    let ex = TracingExchanger::new(Arc::new(chain), RawSmartCardExchanger::new(card.clone()));

    let res = ex
        .exchange(&CancelContext::new(), &common::fixtures::select_ndef_app())
        .await;
    assert!(matches!(res, Err(Error::TracerMutated(TraceDirection::Reader))));
    assert!(card.seen.lock().unwrap().is_empty());
    assert_eq!(recorder.events().len(), 1);
}
