// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.

//! Header index
//!
//! The validation primitives in this crate never own a chain. They read
//! headers through the [`HeaderIndex`] trait, which a node implements over
//! whatever block index it keeps. [`MemoryIndex`] is a simple in-memory
//! implementation that tracks every branch it is given.
//!

use std::collections::HashMap;
use std::sync::Arc;
use std::{error, fmt};

use crate::blockdata::block::BlockHeader;
use crate::blockdata::constants::MEDIAN_TIME_SPAN;
use crate::hash_types::BlockHash;
use crate::pow::{CompactTargetError, Work};

/// A header together with its position in the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainEntry {
    /// Hash of `header`.
    pub hash: BlockHash,
    /// Distance from genesis.
    pub height: u32,
    /// The header itself.
    pub header: BlockHeader,
    /// Total work of the chain up to and including this header.
    pub chainwork: Work,
}

impl ChainEntry {
    /// Creates the height-0 entry.
    pub fn genesis(header: BlockHeader, chainwork: Work) -> ChainEntry {
        ChainEntry {
            hash: header.block_hash(),
            height: 0,
            header,
            chainwork,
        }
    }

    /// Creates the entry for `header` on top of `parent`.
    pub fn from_parent(parent: &ChainEntry, header: BlockHeader) -> ChainEntry {
        ChainEntry {
            hash: header.block_hash(),
            height: parent.height + 1,
            header,
            chainwork: parent.chainwork + header.work(),
        }
    }

    /// The header timestamp.
    pub fn time(&self) -> u32 {
        self.header.time
    }
}

/// Header index errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The header's parent is not in the index.
    UnknownParent(BlockHash),
    /// An ancestor the index should hold is missing.
    MissingAncestor {
        /// The block whose ancestry was walked.
        hash: BlockHash,
        /// The height that could not be reached.
        height: u32,
    },
    /// A header in the index carries undecodable bits.
    InvalidBits(CompactTargetError),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ChainError::UnknownParent(ref hash) => write!(f, "unknown parent block {}", hash),
            ChainError::MissingAncestor { ref hash, height } => {
                write!(f, "block {} has no known ancestor at height {}", hash, height)
            }
            ChainError::InvalidBits(ref e) => write!(f, "invalid header bits: {}", e),
        }
    }
}

impl error::Error for ChainError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ChainError::InvalidBits(ref e) => Some(e),
            _ => None,
        }
    }
}

#[doc(hidden)]
impl From<CompactTargetError> for ChainError {
    fn from(e: CompactTargetError) -> ChainError {
        ChainError::InvalidBits(e)
    }
}

/// Read access to a tree of block headers.
pub trait HeaderIndex {
    /// Looks up an entry by block hash.
    fn entry(&self, hash: &BlockHash) -> Option<Arc<ChainEntry>>;

    /// Returns the parent of `entry`, `None` for genesis.
    fn parent(&self, entry: &ChainEntry) -> Option<Arc<ChainEntry>> {
        if entry.height == 0 {
            return None;
        }
        self.entry(&entry.header.prev_blockhash)
    }

    /// Returns the ancestor of `entry` at `height`, which may be `entry`
    /// itself. `None` if `height` is above `entry` or the walk hits a hole.
    fn ancestor(&self, entry: &Arc<ChainEntry>, height: u32) -> Option<Arc<ChainEntry>> {
        if height > entry.height {
            return None;
        }
        let mut current = entry.clone();
        while current.height > height {
            current = self.parent(&current)?;
        }
        Some(current)
    }

    /// Returns the last entry shared by the branches ending at `a` and `b`.
    fn find_fork(&self, a: &Arc<ChainEntry>, b: &Arc<ChainEntry>) -> Option<Arc<ChainEntry>> {
        let height = a.height.min(b.height);
        let mut a = self.ancestor(a, height)?;
        let mut b = self.ancestor(b, height)?;
        while a.hash != b.hash {
            a = self.parent(&a)?;
            b = self.parent(&b)?;
        }
        Some(a)
    }

    /// Median timestamp of `entry` and up to ten of its ancestors.
    fn median_time_past(&self, entry: &Arc<ChainEntry>) -> u32 {
        let mut times = Vec::with_capacity(MEDIAN_TIME_SPAN);
        let mut current = Some(entry.clone());
        while let Some(e) = current {
            times.push(e.time());
            if times.len() == MEDIAN_TIME_SPAN {
                break;
            }
            current = self.parent(&e);
        }
        times.sort_unstable();
        times[times.len() / 2]
    }
}

/// An in-memory [`HeaderIndex`] holding every inserted branch.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    entries: HashMap<BlockHash, Arc<ChainEntry>>,
    genesis: Arc<ChainEntry>,
    best: Arc<ChainEntry>,
}

impl MemoryIndex {
    /// Creates an index rooted at `genesis`, whose chainwork is `chainwork`.
    pub fn new(genesis: BlockHeader, chainwork: Work) -> MemoryIndex {
        let genesis = Arc::new(ChainEntry::genesis(genesis, chainwork));
        let mut entries = HashMap::new();
        entries.insert(genesis.hash, genesis.clone());
        MemoryIndex {
            entries,
            best: genesis.clone(),
            genesis,
        }
    }

    /// Adds `header`, whose parent must already be known. Inserting a known
    /// header returns the existing entry.
    pub fn insert(&mut self, header: BlockHeader) -> Result<Arc<ChainEntry>, ChainError> {
        let hash = header.block_hash();
        if let Some(existing) = self.entries.get(&hash) {
            return Ok(existing.clone());
        }
        let parent = self
            .entries
            .get(&header.prev_blockhash)
            .ok_or(ChainError::UnknownParent(header.prev_blockhash))?;
        let entry = Arc::new(ChainEntry::from_parent(parent, header));
        self.entries.insert(hash, entry.clone());
        if entry.chainwork > self.best.chainwork {
            self.best = entry.clone();
        }
        Ok(entry)
    }

    /// The height-0 entry.
    pub fn genesis(&self) -> &Arc<ChainEntry> {
        &self.genesis
    }

    /// The entry with the most chainwork, first seen wins ties.
    pub fn best(&self) -> &Arc<ChainEntry> {
        &self.best
    }

    /// Number of entries, genesis included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false, an index holds at least its genesis.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HeaderIndex for MemoryIndex {
    fn entry(&self, hash: &BlockHash) -> Option<Arc<ChainEntry>> {
        self.entries.get(hash).cloned()
    }
}
