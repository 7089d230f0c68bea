// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.

//! Contextual header checks
//!
//! [`HeaderValidator`] ties the checkpoint table, the retargeter and the
//! proof-of-work check together for a header about to join a
//! [`HeaderIndex`].
//!

use std::sync::Arc;
use std::{error, fmt};

use crate::blockdata::block::BlockHeader;
use crate::consensus::chain::{ChainEntry, ChainError, HeaderIndex};
use crate::consensus::checkpoints::{CheckpointError, Decision};
use crate::consensus::params::NetworkParams;
use crate::consensus::retarget::Retargeter;
use crate::pow::{check_proof_of_work, CompactTarget, PowError};

/// Header rejection reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The header does not connect to the index.
    Chain(ChainError),
    /// A checkpoint rule failed.
    Checkpoint(CheckpointError),
    /// The bits differ from what the retargeter requires.
    BadDiffBits {
        /// Required bits.
        expected: CompactTarget,
        /// Header bits.
        found: CompactTarget,
    },
    /// The timestamp is not after the median time past of its parent.
    TimeTooOld {
        /// Header time.
        time: u32,
        /// Median time past of the parent.
        median: u32,
    },
    /// Proof of work failed.
    Pow(PowError),
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            HeaderError::Chain(ref e) => fmt::Display::fmt(e, f),
            HeaderError::Checkpoint(ref e) => fmt::Display::fmt(e, f),
            HeaderError::BadDiffBits { expected, found } => {
                write!(f, "incorrect difficulty bits {}, expected {}", found, expected)
            }
            HeaderError::TimeTooOld { time, median } => {
                write!(f, "header time {} is not after median time past {}", time, median)
            }
            HeaderError::Pow(ref e) => fmt::Display::fmt(e, f),
        }
    }
}

impl error::Error for HeaderError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            HeaderError::Chain(ref e) => Some(e),
            HeaderError::Checkpoint(ref e) => Some(e),
            HeaderError::Pow(ref e) => Some(e),
            _ => None,
        }
    }
}

#[doc(hidden)]
impl From<ChainError> for HeaderError {
    fn from(e: ChainError) -> HeaderError {
        HeaderError::Chain(e)
    }
}

#[doc(hidden)]
impl From<CheckpointError> for HeaderError {
    fn from(e: CheckpointError) -> HeaderError {
        HeaderError::Checkpoint(e)
    }
}

#[doc(hidden)]
impl From<PowError> for HeaderError {
    fn from(e: PowError) -> HeaderError {
        HeaderError::Pow(e)
    }
}

/// Validates headers against a network's consensus parameters.
#[derive(Debug, Clone)]
pub struct HeaderValidator {
    params: Arc<NetworkParams>,
    retargeter: Retargeter,
}

impl HeaderValidator {
    /// Creates a validator with the default retargeter.
    pub fn new(params: Arc<NetworkParams>) -> HeaderValidator {
        let retargeter = Retargeter::new(params.clone());
        HeaderValidator { params, retargeter }
    }

    /// Replaces the retargeter.
    pub fn with_retargeter(mut self, retargeter: Retargeter) -> HeaderValidator {
        self.retargeter = retargeter;
        self
    }

    /// Checks `header` as a child of its parent in `index`, while `best` is
    /// the current best tip.
    pub fn check_header<I>(&self, index: &I, header: &BlockHeader, best: &Arc<ChainEntry>) -> Result<Decision, HeaderError>
    where
        I: HeaderIndex + ?Sized,
    {
        let parent = index
            .entry(&header.prev_blockhash)
            .ok_or(ChainError::UnknownParent(header.prev_blockhash))?;
        let height = parent.height + 1;
        let hash = header.block_hash();
        let checkpoints = &self.params.checkpoints;

        let decision = checkpoints.check(height, &hash)?;
        checkpoints.check_ancestry(index, &parent)?;

        let fork = index.find_fork(&parent, best).ok_or(ChainError::MissingAncestor {
            hash: parent.hash,
            height: parent.height.min(best.height),
        })?;
        if fork.height < best.height {
            checkpoints.check_fork(fork.height, best.height)?;
        }

        let expected = self.retargeter.next_work_required(index, &parent, header.time)?;
        if header.bits != expected {
            return Err(HeaderError::BadDiffBits { expected, found: header.bits });
        }

        let median = index.median_time_past(&parent);
        if header.time <= median {
            return Err(HeaderError::TimeTooOld { time: header.time, median });
        }

        check_proof_of_work(&hash, header.bits, &self.params.pow.limit)?;
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::checkpoints::{Checkpoint, Checkpoints};
    use crate::hash_types::BlockHash;
    use crate::network::constants::Network;
    use crate::test_helpers::{regtest_index, ChainBuilder};

    #[test]
    fn accepts_mined_headers() {
        let params = NetworkParams::get(Network::Regtest);
        let validator = HeaderValidator::new(params.clone())
            .with_retargeter(Retargeter::new(params.clone()).with_reset_gap(600));
        let mut index = regtest_index();
        let mut tip = index.genesis().clone();

        for _ in 0..12 {
            let header = ChainBuilder::new(&mut index, tip.hash).mined(params.pow.limit).next_header(&tip);
            assert_eq!(validator.check_header(&index, &header, &tip), Ok(Decision::Unconstrained));
            tip = index.insert(header).unwrap();
        }
        assert_eq!(tip.height, 12);
    }

    #[test]
    fn rejects_bad_headers() {
        let params = NetworkParams::get(Network::Regtest);
        let validator = HeaderValidator::new(params.clone());
        let mut index = regtest_index();
        let genesis = index.genesis().hash;
        let tip = ChainBuilder::new(&mut index, genesis).mined(params.pow.limit).extend(11);
        let good = ChainBuilder::new(&mut index, tip.hash).mined(params.pow.limit).next_header(&tip);
        assert!(validator.check_header(&index, &good, &tip).is_ok());

        let mut orphan = good;
        orphan.prev_blockhash = BlockHash::default();
        assert_eq!(
            validator.check_header(&index, &orphan, &tip),
            Err(HeaderError::Chain(ChainError::UnknownParent(BlockHash::default())))
        );

        let mut bits = good;
        bits.bits = CompactTarget::from_consensus(0x1f00ffff);
        assert_eq!(
            validator.check_header(&index, &bits, &tip),
            Err(HeaderError::BadDiffBits { expected: good.bits, found: bits.bits })
        );

        let median = index.median_time_past(&tip);
        let mut old = good;
        old.time = median;
        assert_eq!(
            validator.check_header(&index, &old, &tip),
            Err(HeaderError::TimeTooOld { time: median, median })
        );

        let mut high = good;
        while check_proof_of_work(&high.block_hash(), high.bits, &params.pow.limit).is_ok() {
            high.nonce += 1;
        }
        assert_eq!(
            validator.check_header(&index, &high, &tip),
            Err(HeaderError::Pow(PowError::HighHash(high.block_hash())))
        );
    }

    fn with_checkpoints(extra: Vec<Checkpoint>) -> Arc<NetworkParams> {
        let mut params = NetworkParams::new(Network::Regtest);
        let table: Vec<Checkpoint> = params.checkpoints.iter().chain(extra).collect();
        params.checkpoints = Checkpoints::new(table).unwrap();
        Arc::new(params)
    }

    #[test]
    fn checkpoint_violation() {
        let mut index = regtest_index();
        let genesis = index.genesis().hash;
        let limit = NetworkParams::get(Network::Regtest).pow.limit;
        let tip = ChainBuilder::new(&mut index, genesis).mined(limit).extend(5);
        let header = ChainBuilder::new(&mut index, tip.hash).mined(limit).next_header(&tip);

        let validator = HeaderValidator::new(with_checkpoints(vec![Checkpoint { height: 6, hash: header.block_hash() }]));
        assert_eq!(validator.check_header(&index, &header, &tip), Ok(Decision::Checkpointed));

        let validator = HeaderValidator::new(with_checkpoints(vec![Checkpoint { height: 6, hash: BlockHash::default() }]));
        match validator.check_header(&index, &header, &tip) {
            Err(HeaderError::Checkpoint(CheckpointError::Violation { height: 6, .. })) => {}
            x => panic!("{:?}", x),
        }
    }

    #[test]
    fn forks_below_a_passed_checkpoint_are_refused() {
        let mut index = regtest_index();
        let genesis = index.genesis().hash;
        let limit = NetworkParams::get(Network::Regtest).pow.limit;
        let main = ChainBuilder::new(&mut index, genesis).mined(limit).extend(6);
        let at_one = index.ancestor(&main, 1).unwrap();
        let at_two = index.ancestor(&main, 2).unwrap();
        let at_three = index.ancestor(&main, 3).unwrap();
        let at_four = index.ancestor(&main, 4).unwrap();
        let validator = HeaderValidator::new(with_checkpoints(vec![Checkpoint { height: 3, hash: at_three.hash }]));

        // A sibling of block 2.
        let early = ChainBuilder::new(&mut index, at_one.hash).mined(limit).time_offset(5).next_header(&at_one);
        assert_eq!(
            validator.check_header(&index, &early, &main),
            Err(HeaderError::Checkpoint(CheckpointError::ReorgBelowCheckpoint { fork_height: 1, last_checkpoint: 3 }))
        );
        // Before the best chain reaches the checkpoint the same fork is fine.
        assert_eq!(validator.check_header(&index, &early, &at_two), Ok(Decision::Unconstrained));

        // A sibling of block 5 forks above the checkpoint.
        let late = ChainBuilder::new(&mut index, at_four.hash).mined(limit).time_offset(5).next_header(&at_four);
        assert_eq!(validator.check_header(&index, &late, &main), Ok(Decision::Unconstrained));

        // A branch off block 2 contradicts the checkpoint at 3.
        let side = ChainBuilder::new(&mut index, at_two.hash).mined(limit).time_offset(9).extend(1);
        let header = ChainBuilder::new(&mut index, side.hash).mined(limit).next_header(&side);
        match validator.check_header(&index, &header, &main) {
            Err(HeaderError::Checkpoint(CheckpointError::Violation { height: 3, .. })) => {}
            x => panic!("{:?}", x),
        }
    }
}
