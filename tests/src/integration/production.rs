//! # Block Production
//!
//! One producing node, optionally followed by a peer that applies its
//! blocks.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, blocks_of, transfer, TestNet};
    use dc_05_controller::ChainConfig;
    use shared_bus::{SignalFilter, SignalKind};

    fn fast_rotation() -> ChainConfig {
        ChainConfig {
            producer_repetitions: 2,
            ..ChainConfig::default()
        }
    }

    #[test]
    fn test_producers_rotate_and_lib_follows() {
        let net = TestNet::with_config(3, fast_rotation());
        let mut node = net.open_node();
        let mut confirmed = node.bus.subscribe(SignalFilter::kinds(vec![SignalKind::BlockConfirmed]));

        for slot in 1..=12u32 {
            let state = net.produce(&mut node);
            assert_eq!(state.header_state.timestamp().slot(), slot);
            let expected = net.producer((slot % 6) / 2);
            assert_eq!(state.header_state.producer(), expected, "slot {slot}");
        }

        // Last produced: producerab 10, producerac 12, produceraa 13. Two of
        // three producers have built on block 12.
        assert_eq!(node.controller.head_block_num(), 13);
        assert_eq!(node.controller.last_irreversible_block_num(), 12);
        assert_eq!(node.controller.fork_db().root().block_num(), 12);
        assert_eq!(node.controller.fork_db().len(), 2);
        assert_eq!(confirmed.drain().len(), 11);
    }

    #[test]
    fn test_transfers_execute_in_one_block() {
        let net = TestNet::new(3);
        let mut node = net.open_node();

        let mut nonce = 0;
        for round in 0..3 {
            for i in 0..10 {
                nonce += 1;
                node.controller
                    .push_transaction(transfer(account(i), nonce))
                    .unwrap_or_else(|e| panic!("round {round}: {e}"));
            }
        }

        let state = net.produce(&mut node);
        assert_eq!(state.block.transaction_count(), 31);
        assert_eq!(node.controller.pending_transaction_count(), 0);
        for i in 0..10 {
            assert_eq!(node.transfers(account(i)), 3);
        }
    }

    #[test]
    fn test_peer_applies_produced_blocks() {
        let net = TestNet::with_config(3, fast_rotation());
        let mut producer = net.open_node();
        let mut peer = net.open_node();
        let mut validated = peer.bus.subscribe(SignalFilter::kinds(vec![SignalKind::BlockValidated]));

        let mut produced = Vec::new();
        for n in 0..8u64 {
            producer
                .controller
                .push_transaction(transfer(account((n % 3) as u8), n))
                .unwrap();
            produced.push(net.produce(&mut producer));
        }
        peer.push_blocks(&blocks_of(&produced));

        assert_eq!(peer.controller.head_block_id(), producer.controller.head_block_id());
        assert_eq!(
            peer.controller.last_irreversible_block_num(),
            producer.controller.last_irreversible_block_num()
        );
        for i in 0..3 {
            assert_eq!(peer.transfers(account(i)), producer.transfers(account(i)));
        }
        assert_eq!(validated.drain().len(), produced.len());

        // The peer can take over production on the same chain.
        let next = net.produce(&mut peer);
        producer.push_blocks([next.block.as_ref()]);
        assert_eq!(producer.controller.head_block_id(), next.id());
    }

    #[tokio::test]
    async fn test_subscriber_receives_block_signals() {
        let net = TestNet::new(1);
        let mut node = net.open_node();
        let mut blocks = node.bus.subscribe(SignalFilter::blocks());

        let produced = net.produce(&mut node);
        let consumer = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(signal) = blocks.recv().await {
                seen.push(signal.kind());
                if signal.kind() == SignalKind::BlockConfirmed {
                    break;
                }
            }
            seen
        });

        let seen = consumer.await.unwrap();
        assert_eq!(
            seen,
            vec![
                SignalKind::BlockLinked,
                SignalKind::BlockValidated,
                SignalKind::BlockConfirmed
            ]
        );
        assert_eq!(node.controller.last_irreversible_block_num(), produced.block_num());
    }
}
