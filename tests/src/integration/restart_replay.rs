//! # Restart and Replay
//!
//! Nodes over a file-backed block log rebuild their state by replaying it.
//! Only irreversible blocks are logged.

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, transfer, Node, TestNet};
    use dc_05_controller::{ControllerError, FileBlockLog};
    use std::path::Path;

    fn open_at(net: &TestNet, path: &Path) -> Result<Node, ControllerError> {
        let log = FileBlockLog::open(path).unwrap();
        net.open_node_with_log(Box::new(log))
    }

    #[test]
    fn test_replay_restores_head_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.log");
        let net = TestNet::new(1);
        let sender = account(0);

        let head_id = {
            let mut node = open_at(&net, &path).unwrap();
            for nonce in 0..5 {
                node.controller.push_transaction(transfer(sender, nonce)).unwrap();
                net.produce(&mut node);
            }
            assert_eq!(node.controller.last_irreversible_block_num(), 6);
            node.controller.head_block_id()
        };

        let mut node = open_at(&net, &path).unwrap();
        assert_eq!(node.controller.head_block_num(), 6);
        assert_eq!(node.controller.head_block_id(), head_id);
        assert_eq!(node.transfers(sender), 5);
        assert_eq!(node.controller.fork_db().len(), 1);

        // Replayed transactions are known duplicates.
        assert!(node.controller.push_transaction(transfer(sender, 4)).is_err());

        node.controller.push_transaction(transfer(sender, 5)).unwrap();
        let next = net.produce(&mut node);
        assert_eq!(next.block_num(), 7);
        assert_eq!(node.transfers(sender), 6);
    }

    #[test]
    fn test_log_of_another_chain_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.log");
        let net = TestNet::new(1);
        {
            let mut node = open_at(&net, &path).unwrap();
            net.produce(&mut node);
        }

        let mut other = net.clone();
        other.genesis.key_seed = "another chain".into();
        assert!(matches!(
            open_at(&other, &path),
            Err(ControllerError::GenesisMismatch { .. })
        ));
    }

    #[test]
    fn test_reversible_blocks_are_not_replayed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.log");
        let net = TestNet::new(3);
        {
            let mut node = open_at(&net, &path).unwrap();
            net.produce(&mut node);
            net.produce(&mut node);
            assert_eq!(node.controller.last_irreversible_block_num(), 1);
        }

        let node = open_at(&net, &path).unwrap();
        assert_eq!(node.controller.head_block_num(), 1);
    }
}
