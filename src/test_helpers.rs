// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.

//! Internal helper functions for unit tests
//!
//!

use std::sync::Arc;

use crate::blockdata::block::{BlockHeader, Version};
use crate::consensus::chain::{ChainEntry, HeaderIndex, MemoryIndex};
use crate::consensus::params::NetworkParams;
use crate::hash_types::{BlockHash, TxMerkleNode};
use crate::network::constants::Network;
use crate::pow::{check_proof_of_work, CompactTarget, Target};

pub fn index_for(network: Network) -> MemoryIndex {
    let params = NetworkParams::get(network);
    MemoryIndex::new(params.genesis.header(), params.pow.chainwork)
}

pub fn regtest_index() -> MemoryIndex {
    index_for(Network::Regtest)
}

/// Grinds the nonce until `header` meets its own bits.
pub fn mine(header: &mut BlockHeader, limit: &Target) {
    while check_proof_of_work(&header.block_hash(), header.bits, limit).is_err() {
        header.nonce += 1;
    }
}

/// Appends headers to a [`MemoryIndex`] branch.
pub struct ChainBuilder<'a> {
    index: &'a mut MemoryIndex,
    tip: BlockHash,
    spacing: u32,
    time_offset: u32,
    version: Version,
    bits: Option<CompactTarget>,
    limit: Option<Target>,
}

impl<'a> ChainBuilder<'a> {
    pub fn new(index: &'a mut MemoryIndex, tip: BlockHash) -> ChainBuilder<'a> {
        ChainBuilder {
            index,
            tip,
            spacing: 600,
            time_offset: 0,
            version: Version::NO_SOFT_FORK_SIGNALLING,
            bits: None,
            limit: None,
        }
    }

    /// Seconds between consecutive headers.
    pub fn spacing(mut self, spacing: u32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Extra seconds added to every header, to fork a distinct branch.
    pub fn time_offset(mut self, offset: u32) -> Self {
        self.time_offset = offset;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Bits of new headers; defaults to the parent's bits.
    pub fn bits(mut self, bits: CompactTarget) -> Self {
        self.bits = Some(bits);
        self
    }

    /// Grind nonces so every header passes the proof-of-work check.
    pub fn mined(mut self, limit: Target) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The header that would extend `parent`.
    pub fn next_header(&self, parent: &ChainEntry) -> BlockHeader {
        let mut header = BlockHeader {
            version: self.version,
            prev_blockhash: parent.hash,
            merkle_root: TxMerkleNode::default(),
            time: parent.time() + self.spacing + self.time_offset,
            bits: self.bits.unwrap_or(parent.header.bits),
            nonce: 0,
        };
        if let Some(ref limit) = self.limit {
            mine(&mut header, limit);
        }
        header
    }

    /// Appends `count` headers and returns the new tip.
    pub fn extend(&mut self, count: u32) -> Arc<ChainEntry> {
        let mut tip = self.index.entry(&self.tip).expect("builder tip is indexed");
        for _ in 0..count {
            let header = self.next_header(&tip);
            tip = self.index.insert(header).unwrap();
        }
        self.tip = tip.hash;
        tip
    }
}
