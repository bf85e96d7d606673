//! Genesis vectors and cross-network invariants

use atb_params::genesis::GENESIS_REWARD;
use atb_params::{check_proof_of_work, ChainParams, GenesisSpec, Hash256, NetworkType};
use std::collections::HashSet;

const MERKLE_ROOT: &str = "8b84fb784ad17de6c112871615c9a9c93c87cc645ee9de490524f6986700b163";

fn genesis_hash(nonce: u32, bits: u32) -> Hash256 {
    GenesisSpec::standard(1495548862, nonce, bits, 1, GENESIS_REWARD)
        .unwrap()
        .build()
        .hash()
}

#[test]
fn test_main_genesis_vector() {
    let block = GenesisSpec::standard(1495548862, 158421284, 0x1f00ffff, 1, GENESIS_REWARD)
        .unwrap()
        .build();
    assert_eq!(
        block.hash().to_string(),
        "0000b21284e2a7a29d1320a6007977c67044e3c4f5bbef132f19f2095187d3c9"
    );
    assert_eq!(block.header.merkle_root.to_string(), MERKLE_ROOT);
}

#[test]
fn test_test_genesis_vector() {
    assert_eq!(
        genesis_hash(194097, 0x1f00ffff).to_string(),
        "00002378030638c4563c434e4fb29e298240325fc49101d00b3c549ca7266375"
    );
}

#[test]
fn test_regtest_genesis_vector() {
    assert_eq!(
        genesis_hash(1, 0x207fffff).to_string(),
        "0843c2f4603770b9a0612a5367a9196d449ce9b0423484ad9e93796c97606a0e"
    );
}

#[test]
fn test_all_networks_share_merkle_root() {
    for network in NetworkType::ALL {
        let params = ChainParams::from_network(network).unwrap();
        assert_eq!(params.consensus.genesis_merkle_root.to_string(), MERKLE_ROOT);
        assert_eq!(params.genesis.compute_merkle_root(), params.genesis.header.merkle_root);
        assert_eq!(params.genesis.transactions.len(), 1);
        assert!(params.genesis.transactions[0].is_coinbase());
    }
}

#[test]
fn test_magic_and_port_distinct() {
    let pairs: HashSet<([u8; 4], u16)> = NetworkType::ALL
        .into_iter()
        .map(|network| {
            let params = ChainParams::from_network(network).unwrap();
            (params.message_start, params.default_port)
        })
        .collect();
    assert_eq!(pairs.len(), 3);
}

#[test]
fn test_checkpoints_start_at_genesis() {
    for network in NetworkType::ALL {
        let params = ChainParams::from_network(network).unwrap();
        let heights: Vec<u32> = params.checkpoints.iter().map(|(h, _)| h).collect();
        assert!(heights.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(params.checkpoints.get(0), Some(&params.genesis_hash()));
    }
}

#[test]
fn test_genesis_satisfies_proof_of_work() {
    for network in NetworkType::ALL {
        let params = ChainParams::from_network(network).unwrap();
        let header = &params.genesis.header;
        assert!(
            check_proof_of_work(&header.hash(), header.bits, params.consensus.pow_limit),
            "{} genesis fails its own target",
            network
        );
    }
}

#[test]
fn test_bip34_hash_matches_genesis() {
    let main = ChainParams::mainnet().unwrap();
    assert_eq!(main.consensus.bip34_hash, main.genesis_hash());

    let test = ChainParams::testnet().unwrap();
    assert_eq!(test.consensus.bip34_hash, test.genesis_hash());

    let regtest = ChainParams::regtest().unwrap();
    assert!(regtest.consensus.bip34_hash.is_zero());
}
