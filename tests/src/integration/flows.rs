//! # Integration Test Flows
//!
//! The token engine publishing audit events through the shared bus.
//!
//! ## Flows Tested
//!
//! 1. **Engine → Bus**: every accepted mutation reaches subscribers, in order
//! 2. **Topic and partition filters**: indexers see only what they asked for
//! 3. **Rejections**: failed calls publish nothing

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use shared_bus::{
        EventFilter, EventPublisher, EventTopic, InMemoryEventBus, LedgerEvent, Operation,
        Subscription,
    };
    use shared_types::{Identity, PartitionId, Role, StatusCode};
    use token_engine::{
        repartition_data, AtomicLogicalClock, BusEventSink, EventSink, PartitionSeed, TokenApi,
        TokenConfig, TokenEngine, TokenError,
    };

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    const ISSUER: Identity = Identity::new([0x15; 20]);
    const ALICE: Identity = Identity::new([0xA1; 20]);
    const BOB: Identity = Identity::new([0xB0; 20]);

    fn locked() -> PartitionId {
        PartitionId::from_label("locked")
    }

    fn unlocked() -> PartitionId {
        PartitionId::from_label("unlocked")
    }

    /// Engine wired to a fresh bus, with an issuer holding MINTER and PAUSER.
    fn wired() -> (TokenEngine, Arc<InMemoryEventBus>) {
        let bus = Arc::new(InMemoryEventBus::new());
        let sink: Arc<dyn EventSink> = Arc::new(BusEventSink::new(bus.clone()));
        let config = TokenConfig {
            partitions: vec![
                PartitionSeed {
                    id: locked(),
                    cap: Some(1_000_000),
                },
                PartitionSeed {
                    id: unlocked(),
                    cap: Some(1_000_000),
                },
            ],
            ..TokenConfig::with_admin(ISSUER)
        };

        let engine =
            match TokenEngine::bootstrap(&config, Arc::new(AtomicLogicalClock::new()), sink) {
                Ok(engine) => engine,
                Err(e) => panic!("bootstrap failed: {e}"),
            };
        engine.add_role(ISSUER, Role::Minter, ISSUER).unwrap();
        engine.add_role(ISSUER, Role::Pauser, ISSUER).unwrap();
        (engine, bus)
    }

    async fn next(sub: &mut Subscription) -> LedgerEvent {
        timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout waiting for event")
            .expect("bus closed")
    }

    // =========================================================================
    // ENGINE → BUS
    // =========================================================================

    #[tokio::test]
    async fn test_issuance_reaches_subscriber() {
        let (engine, bus) = wired();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Issuance]));

        engine
            .issue_by_partition(ISSUER, locked(), ALICE, 500, b"genesis")
            .unwrap();

        match next(&mut sub).await {
            LedgerEvent::BalanceChanged(record) => {
                assert_eq!(record.operation, Operation::Issue);
                assert_eq!(record.to, Some(ALICE));
                assert_eq!(record.amount, 500);
                assert_eq!(record.resulting_balances[0].balance, 500);
            }
            other => panic!("Expected BalanceChanged, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_repartition_visible_to_target_partition_indexer() {
        let (engine, bus) = wired();
        engine.issue_by_partition(ISSUER, locked(), ALICE, 500, &[]).unwrap();

        // Indexer of the unlocked tranche only
        let mut sub = bus.subscribe(EventFilter::for_partitions(vec![unlocked()]));

        engine
            .transfer_by_partition(ALICE, locked(), ALICE, 200, &repartition_data(unlocked()))
            .unwrap();

        let LedgerEvent::BalanceChanged(record) = next(&mut sub).await else {
            panic!("Expected BalanceChanged");
        };
        assert_eq!(record.operation, Operation::Repartition);
        assert_eq!(record.partition, locked());
        assert_eq!(record.target_partition, Some(unlocked()));

        let after: Vec<_> = record
            .resulting_balances
            .iter()
            .map(|s| (s.partition, s.balance))
            .collect();
        assert_eq!(after, vec![(locked(), 300), (unlocked(), 200)]);
    }

    #[tokio::test]
    async fn test_events_arrive_in_sequence_order() {
        let (engine, bus) = wired();
        let mut stream = bus.event_stream(EventFilter::all());

        engine.issue_by_partition(ISSUER, locked(), ALICE, 100, &[]).unwrap();
        engine.transfer_by_partition(ALICE, locked(), BOB, 40, &[]).unwrap();
        engine.pause(ISSUER).unwrap();
        engine.unpause(ISSUER).unwrap();

        let mut sequences = Vec::new();
        for _ in 0..4 {
            let event = timeout(Duration::from_millis(100), stream.next())
                .await
                .expect("timeout waiting for event")
                .expect("stream ended");
            sequences.push(event.sequence());
        }
        assert!(sequences.windows(2).all(|w| w[0] < w[1]), "{sequences:?}");
    }

    #[tokio::test]
    async fn test_administration_topic() {
        let (engine, bus) = wired();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Administration]));

        engine.issue_by_partition(ISSUER, locked(), ALICE, 100, &[]).unwrap();
        engine.pause(ISSUER).unwrap();

        assert!(matches!(
            next(&mut sub).await,
            LedgerEvent::Paused { by, .. } if by == ISSUER
        ));
    }

    #[tokio::test]
    async fn test_delegation_topic() {
        let (engine, bus) = wired();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Delegation]));

        engine
            .authorize_operator_by_partition(ALICE, locked(), BOB)
            .unwrap();
        engine.revoke_operator_by_partition(ALICE, locked(), BOB).unwrap();

        assert!(matches!(
            next(&mut sub).await,
            LedgerEvent::OperatorAuthorized { holder, operator, .. } if holder == ALICE && operator == BOB
        ));
        assert!(matches!(
            next(&mut sub).await,
            LedgerEvent::OperatorRevoked { .. }
        ));
    }

    // =========================================================================
    // REJECTIONS
    // =========================================================================

    #[tokio::test]
    async fn test_rejected_transfer_publishes_nothing() {
        let (engine, bus) = wired();
        engine.issue_by_partition(ISSUER, locked(), ALICE, 100, &[]).unwrap();
        let published = bus.events_published();
        let mut sub = bus.subscribe(EventFilter::all());

        let err = engine
            .transfer_by_partition(ALICE, locked(), BOB, 101, &[])
            .unwrap_err();
        assert_eq!(
            err,
            TokenError::TransferRejected {
                status: StatusCode::InsufficientBalance,
                partition: locked(),
            }
        );

        assert_eq!(bus.events_published(), published);
        assert!(sub.drain().is_empty());
    }

    #[tokio::test]
    async fn test_engine_shared_across_tasks() {
        let (engine, bus) = wired();
        let engine = Arc::new(engine);
        engine.issue_by_partition(ISSUER, locked(), ALICE, 1_000, &[]).unwrap();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Transfer]));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let engine = engine.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                engine.transfer_by_partition(ALICE, locked(), BOB, 10, &[])
            }));
        }
        for handle in handles {
            handle.await.expect("task panicked").unwrap();
        }

        assert_eq!(engine.balance_of_by_partition(locked(), BOB), 100);
        assert_eq!(sub.drain().len(), 10);
    }
}
