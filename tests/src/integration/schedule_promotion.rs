//! # Producer Schedule Promotion
//!
//! A `setprods` proposal travels from the block that carries it to the
//! active schedule once that block is irreversible, on the producing node
//! and on a peer that only applies blocks.

#[cfg(test)]
mod tests {
    use crate::fixtures::{blocks_of, expiration, TestNet};
    use dc_05_controller::execution::setprods_transaction;
    use dc_05_controller::ChainConfig;
    use shared_types::ProducerKey;

    /// One slot per producer, so the LIB moves every block.
    fn make_net() -> TestNet {
        TestNet::with_config(
            3,
            ChainConfig {
                producer_repetitions: 1,
                ..ChainConfig::default()
            },
        )
    }

    fn producer_keys(net: &TestNet, indices: &[u32]) -> Vec<ProducerKey> {
        indices.iter().map(|&i| net.producer_key(i)).collect()
    }

    #[test]
    fn test_new_producer_joins_after_promotion() {
        let net = make_net();
        let mut node = net.open_node();
        let proposed = producer_keys(&net, &[0, 1, 2, 3]);

        node.controller
            .push_transaction(setprods_transaction(proposed.clone(), expiration()))
            .unwrap();

        let proposing = net.produce(&mut node);
        assert_eq!(proposing.block_num(), 2);
        assert_eq!(proposing.header_state.producer(), net.producer(1));
        assert_eq!(node.controller.pending_producers().map(|s| s.version), Some(1));
        assert_eq!(node.controller.active_producers().version, 0);

        // Block 3 makes block 2 irreversible; it is still produced and
        // stamped under the old schedule.
        let promoting = net.produce(&mut node);
        assert_eq!(promoting.header_state.producer(), net.producer(2));
        assert_eq!(promoting.header_state.header.header.schedule_version, 0);
        assert_eq!(node.controller.active_producers().version, 1);
        assert_eq!(node.controller.active_producers().producers, proposed);
        assert!(node.controller.pending_producers().is_none());

        let first_new = net.produce(&mut node);
        assert_eq!(first_new.header_state.timestamp().slot(), 3);
        assert_eq!(first_new.header_state.producer(), net.producer(3));
        assert_eq!(first_new.header_state.header.header.schedule_version, 1);

        let mut peer = net.open_node();
        peer.push_blocks(&blocks_of(&[proposing, promoting, first_new.clone()]));
        assert_eq!(peer.controller.head_block_id(), first_new.id());
        assert_eq!(peer.controller.active_producers(), node.controller.active_producers());
    }

    #[test]
    fn test_departing_producer_loses_its_slots() {
        let net = make_net();
        let mut node = net.open_node();
        let departing = net.producer(0);

        node.controller
            .push_transaction(setprods_transaction(producer_keys(&net, &[1, 2]), expiration()))
            .unwrap();
        net.produce(&mut node);
        net.produce(&mut node);
        assert_eq!(node.controller.active_producers().len(), 2);

        for _ in 0..6 {
            let state = net.produce(&mut node);
            assert_ne!(state.header_state.producer(), departing);
        }
        assert!(node
            .controller
            .next_production_slot(departing)
            .unwrap()
            .is_none());
        assert!(node.controller.producer_key(departing).is_none());
    }
}
