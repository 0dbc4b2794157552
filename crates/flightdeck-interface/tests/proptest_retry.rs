//! Property-based tests for the bounded retry of control requests.

#[cfg(test)]
mod proptest_retry {
    use flightdeck_interface::{
        ControlRequest, MemoryTransport, RetriedRequest, RetryState, TickOutcome,
    };
    use proptest::prelude::*;

    // --- Retry bound ---

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn unacknowledged_request_sends_limit_plus_one(
            limit in 0u32..25,
            extra_ticks in 0usize..40,
        ) {
            let transport = MemoryTransport::new(true);
            let mut request = RetriedRequest::new(limit);
            request.send(ControlRequest::LoadModule, "load module", &transport);

            let ticks = limit as usize + 1 + extra_ticks;
            for _ in 0..ticks {
                request.tick(&transport);
            }

            prop_assert_eq!(transport.sent().len(), limit as usize + 1);
            prop_assert_eq!(request.state(), RetryState::GivenUp);
        }

        #[test]
        fn not_ready_ticks_never_consume_budget(
            limit in 1u32..10,
            pattern in proptest::collection::vec(any::<bool>(), 0..60),
        ) {
            let transport = MemoryTransport::new(false);
            let mut request = RetriedRequest::new(limit);
            request.send(ControlRequest::LoadDriver("F-16C".to_string()), "driver", &transport);

            let mut resent = 0u32;
            for ready in pattern {
                transport.set_ready(ready);
                match request.tick(&transport) {
                    TickOutcome::Resent => resent += 1,
                    TickOutcome::NotReady => prop_assert!(!ready),
                    TickOutcome::GaveUp | TickOutcome::Idle => {}
                }
            }

            prop_assert!(resent <= limit);
            prop_assert_eq!(request.retry_count(), resent);
            prop_assert_eq!(transport.sent().len() as u32, resent);
        }

        #[test]
        fn acknowledgement_stops_everything(
            limit in 1u32..10,
            acked_after in 0u32..10,
            later_ticks in 0usize..20,
        ) {
            let transport = MemoryTransport::new(true);
            let mut request = RetriedRequest::new(limit);
            request.send(ControlRequest::LoadModule, "load module", &transport);
            for _ in 0..acked_after {
                request.tick(&transport);
            }
            request.stop();
            let sent = transport.sent().len();

            for _ in 0..later_ticks {
                prop_assert_eq!(request.tick(&transport), TickOutcome::Idle);
            }
            prop_assert_eq!(transport.sent().len(), sent);
        }
    }

    // --- Examples ---

    #[test]
    fn default_limit_sends_eleven_times() {
        let transport = MemoryTransport::new(true);
        let mut request = RetriedRequest::new(10);
        request.send(ControlRequest::LoadModule, "load module", &transport);
        let mut outcomes = Vec::new();
        for _ in 0..20 {
            outcomes.push(request.tick(&transport));
        }
        assert_eq!(transport.sent().len(), 11);
        assert_eq!(
            outcomes.iter().filter(|o| **o == TickOutcome::GaveUp).count(),
            1
        );
    }
}
