//! End-to-end sampling against the loopback transport.

use std::time::Duration;

use proptest::prelude::*;
use scpi_link::{Instrument, LoopbackTransport, Sampler};

fn instrument_with_latencies(
    reply: &'static str,
    latencies_ms: &[u64],
) -> Instrument<LoopbackTransport> {
    let mut transport = LoopbackTransport::new();
    for &ms in latencies_ms {
        transport.push_delayed(reply, Duration::from_millis(ms));
    }
    Instrument::new(transport)
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
#[allow(clippy::approx_constant)]
async fn test_steady_cadence() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("scpi_link=debug")
        .with_test_writer()
        .try_init();

    let mut instrument = instrument_with_latencies("3.14", &[30, 30, 30]);
    let values = instrument
        .sample::<f64>("MEAS:VOLT?", 3, Duration::from_millis(100))
        .await
        .unwrap();
    assert_eq!(values, vec![Some(3.14), Some(3.14), Some(3.14)]);
}

#[tokio::test(start_paused = true)]
#[allow(clippy::approx_constant)]
async fn test_slow_cycle_is_dropped() {
    let mut instrument = instrument_with_latencies("3.14", &[10, 80, 10]);
    let values = instrument
        .sample::<f64>("MEAS:VOLT?", 3, Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(values, vec![Some(3.14), None, Some(3.14)]);
}

#[tokio::test(start_paused = true)]
async fn test_echo_sampling() {
    let mut instrument = Instrument::new(LoopbackTransport::echo());
    let values = Sampler::default()
        .count(4)
        .sample::<_, i64>(&mut instrument, "-20")
        .await
        .unwrap();
    assert_eq!(values, vec![Some(-20); 4]);
    assert_eq!(instrument.transport().writes().len(), 4);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_length_and_overrun(
        latencies in prop::collection::vec(0u64..120, 0..12),
        cadence_ms in 0u64..80,
    ) {
        let runtime = paused_runtime();
        let values = runtime.block_on(async {
            let mut instrument = instrument_with_latencies("1", &latencies);
            instrument
                .sample::<i64>("N?", latencies.len(), Duration::from_millis(cadence_ms))
                .await
        }).unwrap();

        prop_assert_eq!(values.len(), latencies.len());
        for (value, &latency) in values.iter().zip(&latencies) {
            if cadence_ms == 0 || latency < cadence_ms {
                prop_assert_eq!(*value, Some(1));
            } else {
                prop_assert_eq!(*value, None);
            }
        }
    }
}
