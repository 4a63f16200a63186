//! Integration tests: independent replicas replaying one action log

use async_trait::async_trait;
use namechain_consensus::ChainContext;
use namechain_core::{
    Address, BlockHeight, Gateway, RegistrationType, MINOR_UNITS_PER_TOKEN,
};
use namechain_crypto::{Digest32, HashPrimitive, Sha256Primitive};
use namechain_node::{Ledger, NodeConfig};
use std::collections::HashSet;

/// Host chain whose block identifiers are derived from the height
struct ReplayChain {
    height: BlockHeight,
}

impl HashPrimitive for ReplayChain {
    fn digest(&self, data: &[u8]) -> Digest32 {
        Sha256Primitive.digest(data)
    }
}

#[async_trait]
impl ChainContext for ReplayChain {
    fn block_height(&self) -> BlockHeight {
        self.height
    }

    async fn block_identifier(&self, height: BlockHeight) -> Option<String> {
        Some(format!("blk{:09}", height))
    }
}

#[derive(Clone, Debug)]
enum Action {
    Join { address: &'static str, tokens: u64 },
    Purchase,
    OpenAuction { name: &'static str, initiator: &'static str },
    Bid { name: &'static str, bidder: &'static str },
}

fn action_log() -> Vec<(BlockHeight, Action)> {
    let mut log = Vec::new();
    let operators = ["gw-a", "gw-b", "gw-c", "gw-d", "gw-e", "gw-f", "gw-g", "gw-h"];
    for (i, address) in operators.into_iter().enumerate() {
        log.push((
            i as u64 * 10,
            Action::Join {
                address,
                tokens: 10_000 * (i as u64 + 1),
            },
        ));
    }
    for height in (5..400).step_by(15) {
        log.push((height, Action::Purchase));
    }
    log.push((120, Action::OpenAuction { name: "ardrive", initiator: "gw-a" }));
    log.push((180, Action::Bid { name: "ardrive", bidder: "gw-b" }));
    log.push((200, Action::OpenAuction { name: "expiring", initiator: "gw-c" }));
    log.sort_by_key(|(height, _)| *height);
    log
}

fn node_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.protocol.epochs.epoch_block_length = 100;
    config.protocol.demand.period_block_count = 50;
    config.protocol.observers.max_observers_per_epoch = 3;
    config.protocol.auctions.auction_duration_blocks = 150;
    config
}

async fn replay(log: &[(BlockHeight, Action)], until: BlockHeight) -> Ledger {
    let mut ledger = Ledger::new(node_config().protocol).unwrap();
    let mut actions = log.iter().peekable();

    for height in 0..=until {
        let chain = ReplayChain { height };
        ledger.maybe_advance_demand_period(height).unwrap();
        ledger.maybe_advance_observer_epoch(&chain, height).await.unwrap();
        ledger.remove_expired_auctions(height);

        while let Some((_, action)) = actions.next_if(|(h, _)| *h == height) {
            match action {
                Action::Join { address, tokens } => {
                    ledger.upsert_gateway(Gateway::joined(
                        *address,
                        tokens * MINOR_UNITS_PER_TOKEN,
                        height,
                    ));
                }
                Action::Purchase => ledger.tally_purchase(),
                Action::OpenAuction { name, initiator } => {
                    ledger
                        .open_auction(name, RegistrationType::Permabuy, &Address::from(*initiator), 0, height)
                        .unwrap();
                }
                Action::Bid { name, bidder } => {
                    ledger
                        .settle_auction_bid(name, &Address::from(*bidder), None, height)
                        .unwrap();
                }
            }
        }
    }
    ledger
}

#[tokio::test]
async fn test_replicas_converge_on_identical_state() {
    let log = action_log();
    let first = replay(&log, 400).await;
    let second = replay(&log, 400).await;

    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
    assert_eq!(first.state(), second.state());
}

#[tokio::test]
async fn test_replay_advances_both_cadences() {
    let ledger = replay(&action_log(), 400).await;
    let state = ledger.state();

    // one period closes every 50 blocks
    assert_eq!(state.demand.current_period, 8);
    assert!(state.demand.demand_factor_ppm >= ledger.settings().demand.min_ppm);

    let epoch = state.observers.as_ref().unwrap();
    assert_eq!(epoch.window.start_height, 400);
    assert_eq!(epoch.committee.len(), 3);
    let distinct: HashSet<_> = epoch.committee.iter().map(|o| &o.gateway_address).collect();
    assert_eq!(distinct.len(), 3);
}

#[tokio::test]
async fn test_auctions_settle_and_expire_during_replay() {
    let log = action_log();

    let mid = replay(&log, 250).await;
    assert!(!mid.state().auctions.contains_key("ardrive"));
    assert!(mid.state().auctions.contains_key("expiring"));

    let end = replay(&log, 400).await;
    assert!(end.state().auctions.is_empty());
}

#[tokio::test]
async fn test_committee_queries_match_persisted_epoch() {
    let ledger = replay(&action_log(), 250).await;
    let chain = ReplayChain { height: 250 };

    let committee = ledger.prescribed_observers(&chain, 250).await.unwrap();
    assert_eq!(committee, ledger.state().observers.as_ref().unwrap().committee);

    for observer in &committee {
        assert!(ledger
            .prescribed_observer(&chain, 250, &observer.observer_address)
            .await
            .unwrap());
    }

    // a query for a later epoch is computed on the fly and not stored
    let next = ledger.prescribed_observers(&chain, 300).await.unwrap();
    assert_eq!(next.len(), 3);
    assert_eq!(ledger.state().observers.as_ref().unwrap().window.start_height, 200);
}

#[tokio::test]
async fn test_committees_follow_block_identifiers() {
    let log = action_log();

    let ledger = replay(&log, 150).await;
    let epoch = ledger.state().observers.as_ref().unwrap();
    assert_eq!(epoch.window.start_height, 100);
    let seated: Vec<&str> = epoch.committee.iter().map(|o| o.gateway_address.as_str()).collect();
    assert_eq!(seated, vec!["gw-f", "gw-g", "gw-h"]);

    let ledger = replay(&log, 400).await;
    let epoch = ledger.state().observers.as_ref().unwrap();
    let seated: Vec<&str> = epoch.committee.iter().map(|o| o.gateway_address.as_str()).collect();
    assert_eq!(seated, vec!["gw-b", "gw-f", "gw-c"]);
}
