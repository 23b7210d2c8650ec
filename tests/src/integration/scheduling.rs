//! # Block Layout
//!
//! How the scheduling algorithm and the block size limit shape produced
//! blocks, and that peers accept every shape.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, blocks_of, transfer, TestNet};
    use dc_04_block_scheduler::SchedulingAlgorithm;
    use dc_05_controller::ChainConfig;
    use shared_types::Transaction;

    fn make_net(scheduling_algorithm: SchedulingAlgorithm, max_block_size: usize) -> TestNet {
        TestNet::with_config(
            1,
            ChainConfig {
                scheduling_algorithm,
                max_block_size,
                ..ChainConfig::default()
            },
        )
    }

    #[test]
    fn test_single_thread_keeps_push_order() {
        let net = make_net(SchedulingAlgorithm::InSingleThread, 1024 * 1024);
        let mut node = net.open_node();

        let pushed: Vec<Transaction> = (0..6u64).map(|n| transfer(account((n % 3) as u8), n)).collect();
        for trx in &pushed {
            node.controller.push_transaction(trx.clone()).unwrap();
        }

        let state = net.produce(&mut node);
        let region = &state.block.regions[0];
        assert_eq!(state.block.regions.len(), 1);
        // The onblock cycle, then one cycle holding a single shard.
        assert_eq!(region.cycles_summary.len(), 2);
        assert_eq!(region.cycles_summary[1].len(), 1);

        let order: Vec<_> = region.cycles_summary[1][0]
            .transactions
            .iter()
            .map(|r| r.id)
            .collect();
        let expected: Vec<_> = pushed.iter().map(Transaction::id).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_conflicting_transfers_cycle_apart() {
        let net = make_net(SchedulingAlgorithm::ByCyclingConflicts, 1024 * 1024);
        let mut producer = net.open_node();
        let sender = account(0);

        for nonce in 0..3 {
            producer.controller.push_transaction(transfer(sender, nonce)).unwrap();
        }
        let state = net.produce(&mut producer);

        let cycles = &state.block.regions[0].cycles_summary;
        assert_eq!(cycles.len(), 4);
        assert!(cycles[1..].iter().all(|cycle| cycle.len() == 1));
        assert_eq!(producer.transfers(sender), 3);

        let mut peer = net.open_node();
        peer.push_blocks(&blocks_of(&[state]));
        assert_eq!(peer.transfers(sender), 3);
    }

    #[test]
    fn test_size_limit_postpones_transactions() {
        let net = make_net(SchedulingAlgorithm::ByThreadingConflicts, 4096);
        let mut producer = net.open_node();
        let mut peer = net.open_node();

        for nonce in 0..200u64 {
            producer
                .controller
                .push_transaction(transfer(account((nonce % 10) as u8), nonce))
                .unwrap();
        }

        let first = net.produce(&mut producer);
        // Every transfer fits on its own, none is dropped.
        assert!(first.block.transaction_count() > 1);
        let waiting = producer.controller.pending_transaction_count();
        assert!(waiting > 0);
        assert_eq!(first.block.transaction_count() - 1 + waiting, 200);

        let mut blocks = vec![first];
        while producer.controller.pending_transaction_count() > 0 {
            assert!(blocks.len() < 200, "queue does not drain");
            blocks.push(net.produce(&mut producer));
        }

        let total: u64 = (0..10).map(|i| producer.transfers(account(i))).sum();
        assert_eq!(total, 200);

        peer.push_blocks(&blocks_of(&blocks));
        assert_eq!(peer.controller.head_block_id(), producer.controller.head_block_id());
        for i in 0..10 {
            assert_eq!(peer.transfers(account(i)), 20);
        }
    }
}
