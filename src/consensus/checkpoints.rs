// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.

//! Checkpoints
//!
//! Hard-coded `(height, hash)` pairs. A block at a checkpointed height must
//! carry exactly the listed hash, and no chain may fork off below the last
//! checkpoint. Checkpoints are never trusted beyond that exact comparison.
//!

use std::collections::BTreeMap;
use std::sync::Arc;
use std::{error, fmt};

use log::warn;

use crate::consensus::chain::{ChainEntry, HeaderIndex};
use crate::hash_types::BlockHash;

/// A single checkpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Checkpoint {
    /// Block height.
    pub height: u32,
    /// Block hash expected at `height`.
    pub hash: BlockHash,
}

/// Outcome of a successful checkpoint check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// The height is checkpointed and the hash matches.
    Checkpointed,
    /// No checkpoint applies; defer to the other consensus rules.
    Unconstrained,
}

/// Checkpoint failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    /// A block at a checkpointed height has the wrong hash.
    Violation {
        /// The checkpointed height.
        height: u32,
        /// The hash in the table.
        expected: BlockHash,
        /// The hash offered.
        found: BlockHash,
    },
    /// A reorganization would replace blocks at or below the last checkpoint.
    ReorgBelowCheckpoint {
        /// Height of the last block shared by both branches.
        fork_height: u32,
        /// Height of the last checkpoint.
        last_checkpoint: u32,
    },
    /// Table heights are not strictly increasing.
    Unordered {
        /// Height of the preceding entry.
        previous: u32,
        /// Offending height.
        height: u32,
    },
    /// The ancestor at a checkpointed height could not be found.
    MissingAncestor {
        /// Block whose ancestry was checked.
        hash: BlockHash,
        /// The checkpointed height.
        height: u32,
    },
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CheckpointError::Violation { height, ref expected, ref found } => write!(
                f,
                "checkpoint violation at height {}: expected {}, found {}",
                height, expected, found
            ),
            CheckpointError::ReorgBelowCheckpoint { fork_height, last_checkpoint } => write!(
                f,
                "reorganization from height {} crosses the last checkpoint at {}",
                fork_height, last_checkpoint
            ),
            CheckpointError::Unordered { previous, height } => write!(
                f,
                "checkpoint heights must increase, {} follows {}",
                height, previous
            ),
            CheckpointError::MissingAncestor { ref hash, height } => write!(
                f,
                "block {} has no ancestor at checkpoint height {}",
                hash, height
            ),
        }
    }
}

impl error::Error for CheckpointError {}

/// A height-indexed checkpoint table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Checkpoints {
    table: BTreeMap<u32, BlockHash>,
}

impl Checkpoints {
    /// Builds a table from checkpoints listed in increasing height order.
    pub fn new<I>(checkpoints: I) -> Result<Checkpoints, CheckpointError>
    where
        I: IntoIterator<Item = Checkpoint>,
    {
        let mut table = BTreeMap::new();
        let mut previous: Option<u32> = None;
        for cp in checkpoints {
            if let Some(previous) = previous {
                if cp.height <= previous {
                    return Err(CheckpointError::Unordered { previous, height: cp.height });
                }
            }
            previous = Some(cp.height);
            table.insert(cp.height, cp.hash);
        }
        Ok(Checkpoints { table })
    }

    /// A table with no checkpoints.
    pub fn empty() -> Checkpoints {
        Checkpoints::default()
    }

    /// Number of checkpoints.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if there are no checkpoints.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The checkpointed hash at `height`.
    pub fn get(&self, height: u32) -> Option<&BlockHash> {
        self.table.get(&height)
    }

    /// Iterates in increasing height order.
    pub fn iter(&self) -> impl Iterator<Item = Checkpoint> + '_ {
        self.table.iter().map(|(height, hash)| Checkpoint { height: *height, hash: *hash })
    }

    /// The highest checkpoint.
    pub fn last_checkpoint(&self) -> Option<Checkpoint> {
        self.table.iter().next_back().map(|(height, hash)| Checkpoint { height: *height, hash: *hash })
    }

    /// The highest checkpoint at or below `height`.
    pub fn checkpoint_at_or_below(&self, height: u32) -> Option<Checkpoint> {
        self.table
            .range(..=height)
            .next_back()
            .map(|(height, hash)| Checkpoint { height: *height, hash: *hash })
    }

    /// Checks a candidate block against the table.
    pub fn check(&self, height: u32, hash: &BlockHash) -> Result<Decision, CheckpointError> {
        match self.table.get(&height) {
            None => Ok(Decision::Unconstrained),
            Some(expected) if expected == hash => Ok(Decision::Checkpointed),
            Some(expected) => {
                warn!("checkpoint mismatch at height {}: expected {}, got {}", height, expected, hash);
                Err(CheckpointError::Violation { height, expected: *expected, found: *hash })
            }
        }
    }

    /// Checks that `entry` descends from the checkpointed block at the
    /// highest checkpoint not above it.
    pub fn check_ancestry<I>(&self, index: &I, entry: &Arc<ChainEntry>) -> Result<Decision, CheckpointError>
    where
        I: HeaderIndex + ?Sized,
    {
        let cp = match self.checkpoint_at_or_below(entry.height) {
            Some(cp) => cp,
            None => return Ok(Decision::Unconstrained),
        };
        let ancestor = index
            .ancestor(entry, cp.height)
            .ok_or(CheckpointError::MissingAncestor { hash: entry.hash, height: cp.height })?;
        self.check(cp.height, &ancestor.hash)
    }

    /// Refuses a reorganization whose fork point lies below the last checkpoint.
    pub fn check_reorg(&self, fork_height: u32) -> Result<(), CheckpointError> {
        self.check_fork(fork_height, u32::MAX)
    }

    /// Refuses a fork below the highest checkpoint the best chain, at
    /// `best_height`, has already passed.
    pub fn check_fork(&self, fork_height: u32, best_height: u32) -> Result<(), CheckpointError> {
        match self.checkpoint_at_or_below(best_height) {
            Some(last) if fork_height < last.height => {
                warn!(
                    "refusing reorganization from height {} below checkpoint {}",
                    fork_height, last.height
                );
                Err(CheckpointError::ReorgBelowCheckpoint { fork_height, last_checkpoint: last.height })
            }
            _ => Ok(()),
        }
    }
}
