// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.

//! Genesis verification
//!
//! Every network embeds its genesis block twice: as header fields and as
//! raw serialized bytes, together with the expected block hash. Verifying
//! that all three agree yields the height-0 [`Anchor`] of the chain.
//!

use std::{error, fmt};

use hashes::hex::FromHex;

use crate::blockdata::block::{Block, BlockHeader, Version};
use crate::blockdata::constants;
use crate::consensus::encode::{self, deserialize};
use crate::hash_types::{BlockHash, TxMerkleNode};
use crate::network::constants::Network;
use crate::pow::{CompactTarget, Work};

/// The chain's starting point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Anchor {
    /// Always zero.
    pub height: u32,
    /// Genesis block hash.
    pub hash: BlockHash,
    /// Chainwork credited to the anchor.
    pub chainwork: Work,
}

/// Why the raw genesis bytes are not a well-formed genesis block.
#[derive(Debug)]
pub enum Malformed {
    /// The bytes do not decode as a block.
    Decode(encode::Error),
    /// The block does not hold exactly one transaction.
    TransactionCount(usize),
    /// The only transaction is not a coinbase.
    NotCoinbase,
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Malformed::Decode(ref e) => write!(f, "decode failed: {}", e),
            Malformed::TransactionCount(n) => write!(f, "expected one transaction, found {}", n),
            Malformed::NotCoinbase => f.write_str("transaction is not a coinbase"),
        }
    }
}

/// Genesis verification failures.
#[derive(Debug)]
pub enum GenesisError {
    /// The raw bytes are not a single-transaction block.
    Malformed(Malformed),
    /// The block hash differs from the stored hash.
    Mismatch {
        /// The stored hash.
        expected: BlockHash,
        /// The hash of the raw block.
        found: BlockHash,
    },
    /// The header's merkle root does not commit to the coinbase.
    MerkleRootMismatch,
    /// The raw header differs from the descriptor's header fields.
    HeaderMismatch,
}

impl fmt::Display for GenesisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GenesisError::Malformed(ref m) => write!(f, "malformed genesis block: {}", m),
            GenesisError::Mismatch { ref expected, ref found } => {
                write!(f, "genesis hash mismatch: expected {}, found {}", expected, found)
            }
            GenesisError::MerkleRootMismatch => f.write_str("genesis merkle root does not match its coinbase"),
            GenesisError::HeaderMismatch => f.write_str("genesis header does not match its raw bytes"),
        }
    }
}

impl error::Error for GenesisError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            GenesisError::Malformed(Malformed::Decode(ref e)) => Some(e),
            _ => None,
        }
    }
}

/// A network's embedded genesis block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenesisDescriptor {
    /// Header version.
    pub version: Version,
    /// Always all zeros.
    pub prev_blockhash: BlockHash,
    /// Commitment to the coinbase.
    pub merkle_root: TxMerkleNode,
    /// Header timestamp.
    pub time: u32,
    /// Header bits.
    pub bits: CompactTarget,
    /// Header nonce.
    pub nonce: u32,
    /// The serialized block.
    pub raw: Vec<u8>,
    /// Expected block hash.
    pub hash: BlockHash,
}

impl GenesisDescriptor {
    /// The built-in genesis of `network`.
    pub fn for_network(network: Network) -> GenesisDescriptor {
        let header = constants::genesis_block(network).header;
        GenesisDescriptor {
            version: header.version,
            prev_blockhash: header.prev_blockhash,
            merkle_root: header.merkle_root,
            time: header.time,
            bits: header.bits,
            nonce: header.nonce,
            raw: Vec::from_hex(constants::genesis_hex(network)).expect("static genesis hex"),
            hash: BlockHash::from_display_hex(constants::genesis_hash_hex(network))
                .expect("static genesis hash"),
        }
    }

    /// The header described by the descriptor's fields.
    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            version: self.version,
            prev_blockhash: self.prev_blockhash,
            merkle_root: self.merkle_root,
            time: self.time,
            bits: self.bits,
            nonce: self.nonce,
        }
    }

    /// Decodes the raw bytes and checks them against the header fields and
    /// the stored hash. On success the anchor carries `chainwork`.
    pub fn verify(&self, chainwork: Work) -> Result<Anchor, GenesisError> {
        let block: Block =
            deserialize(&self.raw).map_err(|e| GenesisError::Malformed(Malformed::Decode(e)))?;

        if block.txdata.len() != 1 {
            return Err(GenesisError::Malformed(Malformed::TransactionCount(block.txdata.len())));
        }
        if !block.coinbase().map_or(false, |tx| tx.is_coin_base()) {
            return Err(GenesisError::Malformed(Malformed::NotCoinbase));
        }
        if block.header != self.header() {
            return Err(GenesisError::HeaderMismatch);
        }
        if !block.check_merkle_root() {
            return Err(GenesisError::MerkleRootMismatch);
        }

        let found = block.block_hash();
        if found != self.hash {
            return Err(GenesisError::Mismatch { expected: self.hash, found });
        }

        Ok(Anchor { height: 0, hash: found, chainwork })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::encode::serialize;
    use crate::consensus::params::NetworkParams;

    #[test]
    fn builtin_genesis_blocks_verify() {
        for network in Network::ALL.iter() {
            let params = NetworkParams::new(*network);
            let anchor = params.genesis.verify(params.pow.chainwork).unwrap();
            assert_eq!(anchor.height, 0);
            assert_eq!(anchor.hash, params.genesis.hash);
            assert_eq!(anchor.chainwork, params.pow.chainwork);
            assert_eq!(params.genesis.header().block_hash(), params.genesis.hash);
        }
    }

    #[test]
    fn any_flipped_byte_fails() {
        for network in Network::ALL.iter() {
            let genesis = GenesisDescriptor::for_network(*network);
            for i in 0..genesis.raw.len() {
                let mut corrupted = genesis.clone();
                corrupted.raw[i] ^= 0x01;
                assert!(corrupted.verify(Work::ZERO).is_err(), "{} byte {}", network, i);
            }
        }
    }

    #[test]
    fn failure_kinds() {
        let genesis = GenesisDescriptor::for_network(Network::Signet);

        let mut header_flip = genesis.clone();
        header_flip.raw[76] ^= 0xff; // nonce
        match header_flip.verify(Work::ZERO) {
            Err(GenesisError::HeaderMismatch) => {}
            x => panic!("{:?}", x),
        }

        // Coinbase value lives well inside the transaction.
        let mut tx_flip = genesis.clone();
        tx_flip.raw[BlockHeader::SIZE + 1 + 4 + 1 + 36 + 1 + 77 + 4 + 1] ^= 0x01;
        match tx_flip.verify(Work::ZERO) {
            Err(GenesisError::MerkleRootMismatch) => {}
            x => panic!("{:?}", x),
        }

        let mut truncated = genesis.clone();
        truncated.raw.pop();
        match truncated.verify(Work::ZERO) {
            Err(GenesisError::Malformed(Malformed::Decode(_))) => {}
            x => panic!("{:?}", x),
        }

        // A consistent block with a different stored hash.
        let mut wrong_hash = genesis.clone();
        wrong_hash.hash = GenesisDescriptor::for_network(Network::Main).hash;
        match wrong_hash.verify(Work::ZERO) {
            Err(GenesisError::Mismatch { expected, found }) => {
                assert_eq!(expected, wrong_hash.hash);
                assert_eq!(found, genesis.hash);
            }
            x => panic!("{:?}", x),
        }

        // Two transactions.
        let mut block = constants::genesis_block(Network::Signet);
        block.txdata.push(block.txdata[0].clone());
        let mut doubled = genesis.clone();
        doubled.raw = serialize(&block);
        match doubled.verify(Work::ZERO) {
            Err(GenesisError::Malformed(Malformed::TransactionCount(2))) => {}
            x => panic!("{:?}", x),
        }
    }
}
