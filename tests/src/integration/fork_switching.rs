//! # Fork Switching
//!
//! Two nodes build competing branches from genesis and exchange them.
//!
//! With two slots per producer and three producers, slot 1 belongs to
//! `produceraa`, slots 2 and 3 to `producerab`, slots 4 and 5 to
//! `producerac`.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, transfer, TestNet};
    use dc_02_block_header_state::HeaderStateError;
    use dc_05_controller::{ChainConfig, ControllerError, ForkDbError};
    use shared_bus::{SignalFilter, SignalKind};

    fn make_net() -> TestNet {
        TestNet::with_config(
            3,
            ChainConfig {
                producer_repetitions: 2,
                ..ChainConfig::default()
            },
        )
    }

    #[test]
    fn test_switches_to_branch_with_higher_lib() {
        let net = make_net();
        let mut alpha = net.open_node();
        let mut beta = net.open_node();

        let local = transfer(account(0), 1);
        alpha.controller.push_transaction(local.clone()).unwrap();
        let alpha_block = net.produce_at(&mut alpha, 1);

        beta.controller.push_transaction(transfer(account(1), 2)).unwrap();
        let beta_first = net.produce_at(&mut beta, 2);
        let beta_second = net.produce_at(&mut beta, 4);
        assert_eq!(beta.controller.last_irreversible_block_num(), 2);

        // Same length as the local branch: no switch.
        alpha.push_blocks([beta_first.block.as_ref()]);
        assert_eq!(alpha.controller.head_block_id(), alpha_block.id());

        alpha.push_blocks([beta_second.block.as_ref()]);
        assert_eq!(alpha.controller.head_block_id(), beta_second.id());
        assert_eq!(alpha.controller.last_irreversible_block_num(), 2);
        assert!(!alpha.controller.fork_db().contains(&alpha_block.id()));

        // State follows the new branch; the dropped transfer is queued again.
        assert_eq!(alpha.transfers(account(0)), 0);
        assert_eq!(alpha.transfers(account(1)), 1);
        assert_eq!(alpha.controller.pending_transaction_count(), 1);

        let next = net.produce(&mut alpha);
        assert_eq!(next.header_state.producer(), net.producer(2));
        assert!(next.find_transaction(&local.id()).is_some());
        assert_eq!(alpha.transfers(account(0)), 1);

        // The losing block no longer links on the winning side.
        let result = beta.controller.push_block(alpha_block.block.as_ref().clone());
        assert!(matches!(
            result,
            Err(ControllerError::ForkDb(ForkDbError::UnlinkableBlock { .. }))
        ));
    }

    #[test]
    fn test_longer_branch_wins_at_equal_lib() {
        let net = TestNet::new(3);
        let mut alpha = net.open_node();
        let mut beta = net.open_node();

        let alpha_head = net.produce_at(&mut alpha, 1);
        let beta_blocks = [
            net.produce_at(&mut beta, 12),
            net.produce_at(&mut beta, 13),
        ];

        alpha.push_blocks([beta_blocks[0].block.as_ref()]);
        assert_eq!(alpha.controller.head_block_id(), alpha_head.id());

        alpha.push_blocks([beta_blocks[1].block.as_ref()]);
        assert_eq!(alpha.controller.head_block_id(), beta_blocks[1].id());
        // Nothing became irreversible, so the old branch is still known.
        assert!(alpha.controller.fork_db().contains(&alpha_head.id()));
        assert_eq!(alpha.controller.fork_db().len(), 4);
    }

    #[test]
    fn test_confirmations_make_block_irreversible() {
        let net = TestNet::new(3);
        let mut node = net.open_node();
        let mut confirmed = node.bus.subscribe(SignalFilter::kinds(vec![SignalKind::BlockConfirmed]));

        let state = net.produce(&mut node);
        assert_eq!(node.controller.last_irreversible_block_num(), 1);

        for i in 0..2 {
            node.controller
                .add_confirmation(net.confirm(&state, net.producer(i)))
                .unwrap();
        }
        assert_eq!(node.controller.last_irreversible_block_num(), 1);

        let outsider = account(0);
        assert!(matches!(
            node.controller.add_confirmation(net.confirm(&state, outsider)),
            Err(ControllerError::ForkDb(ForkDbError::HeaderState(
                HeaderStateError::UnknownProducer { .. }
            )))
        ));

        node.controller
            .add_confirmation(net.confirm(&state, net.producer(2)))
            .unwrap();
        assert_eq!(node.controller.last_irreversible_block_num(), 2);
        assert_eq!(node.controller.fork_db().root().id(), state.id());
        assert_eq!(confirmed.drain().len(), 1);

        let duplicate = node.controller.add_confirmation(net.confirm(&state, net.producer(0)));
        assert!(duplicate.is_err());
    }
}
