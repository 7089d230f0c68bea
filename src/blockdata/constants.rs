// Rust Bitcoin Library
// Written in 2014 by
//     Andrew Poelstra <apoelstra@wpsoftware.net>
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication
// along with this software.
// If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.
//
// Changes for chainparams is licensed as below.
// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.
//

//! Blockdata constants
//!
//! This module provides various constants relating to the blockchain and
//! consensus code. In particular, it defines the genesis block of every
//! supported network, both as a structured value and as the raw bytes a
//! node embeds.
//!

use hashes::hex::FromHex;
use hashes::Hash;

use crate::blockdata::block::{Block, BlockHeader, Version};
use crate::blockdata::transaction::{OutPoint, Transaction, TxIn, TxOut};
use crate::hash_types::{BlockHash, TxMerkleNode};
use crate::network::constants::Network;
use crate::pow::CompactTarget;

/// The maximum allowable sequence number
pub const MAX_SEQUENCE: u32 = 0xFFFFFFFF;
/// How many satoshis are in "one bitcoin"
pub const COIN_VALUE: u64 = 100_000_000;
/// Number of previous headers whose median timestamp forms the median time past.
pub const MEDIAN_TIME_SPAN: usize = 11;

/// Public key the genesis coinbase pays to.
const GENESIS_OUTPUT_PK: &str = "04678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5f";

/// Appends the transaction count and the shared genesis coinbase to a
/// serialized genesis header.
macro_rules! genesis_hex {
    ($header:literal) => {
        concat!(
            $header,
            "01",
            "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000"
        )
    };
}

/// Serialized genesis block of the main network.
pub const MAIN_GENESIS_HEX: &str = genesis_hex!("0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c");
/// Serialized genesis block of the test network.
pub const TESTNET_GENESIS_HEX: &str = genesis_hex!("0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4adae5494dffff001d1aa4ae18");
/// Serialized genesis block of the default signet.
pub const SIGNET_GENESIS_HEX: &str = genesis_hex!("0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a008f4d5fae77031e8ad22203");
/// Serialized genesis block of regtest.
pub const REGTEST_GENESIS_HEX: &str = genesis_hex!("0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4adae5494dffff7f2002000000");
/// Serialized genesis block of simnet.
pub const SIMNET_GENESIS_HEX: &str = genesis_hex!("0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a45068653ffff7f2002000000");

/// Returns the embedded serialized genesis block for `network`, hex encoded.
pub fn genesis_hex(network: Network) -> &'static str {
    match network {
        Network::Main => MAIN_GENESIS_HEX,
        Network::Testnet => TESTNET_GENESIS_HEX,
        Network::Signet => SIGNET_GENESIS_HEX,
        Network::Regtest => REGTEST_GENESIS_HEX,
        Network::Simnet => SIMNET_GENESIS_HEX,
    }
}

/// Block hash of the genesis block, as printed by block explorers.
pub fn genesis_hash_hex(network: Network) -> &'static str {
    match network {
        Network::Main => "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f",
        Network::Testnet => "000000000933ea01ad0ee984209779baaec3ced90fa3f408719526f8d77f4943",
        Network::Signet => "00000008819873e925422c1ff0f99f7cc9bbb232af63a077a480a3633bee1ef6",
        Network::Regtest => "0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206",
        Network::Simnet => "683e86bd5c6d110d91b94b97137ba6bfe02dbbdb8e3dff722a669b5d69d77af6",
    }
}

/// Constructs and returns the coinbase (and only) transaction of the Bitcoin genesis block
fn bitcoin_genesis_tx() -> Transaction {
    // Base
    let mut ret = Transaction {
        version: 1,
        lock_time: 0,
        input: vec![],
        output: vec![],
    };

    // Inputs: push(486604799) push(4) push(headline)
    let headline = b"The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";
    let mut in_script = vec![0x04, 0xff, 0xff, 0x00, 0x1d, 0x01, 0x04, headline.len() as u8];
    in_script.extend_from_slice(&headline[..]);
    ret.input.push(TxIn {
        previous_output: OutPoint::null(),
        script_sig: in_script,
        sequence: MAX_SEQUENCE,
    });

    // Outputs: push(pubkey) OP_CHECKSIG
    let pk = Vec::<u8>::from_hex(GENESIS_OUTPUT_PK).expect("static hex");
    let mut out_script = vec![pk.len() as u8];
    out_script.extend_from_slice(&pk);
    out_script.push(0xac);
    ret.output.push(TxOut {
        value: 50 * COIN_VALUE,
        script_pubkey: out_script,
    });

    // end
    ret
}

/// Constructs and returns the genesis block
pub fn genesis_block(network: Network) -> Block {
    let txdata = vec![bitcoin_genesis_tx()];
    let merkle_root = TxMerkleNode::from_inner(txdata[0].txid().into_inner());

    let (time, bits, nonce) = match network {
        Network::Main => (1231006505, 0x1d00ffff, 2083236893),
        Network::Testnet => (1296688602, 0x1d00ffff, 414098458),
        Network::Signet => (1598918400, 0x1e0377ae, 52613770),
        Network::Regtest => (1296688602, 0x207fffff, 2),
        Network::Simnet => (1401292357, 0x207fffff, 2),
    };

    Block {
        header: BlockHeader {
            version: Version::ONE,
            prev_blockhash: BlockHash::default(),
            merkle_root,
            time,
            bits: CompactTarget::from_consensus(bits),
            nonce,
        },
        txdata,
    }
}
