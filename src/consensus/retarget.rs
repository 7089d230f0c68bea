// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.

//! Difficulty retargeting
//!
//! Every `retarget_interval` blocks the target is rescaled by how long the
//! previous interval actually took, within a factor of four either way and
//! never easier than the network's limit.
//!

use std::sync::Arc;

use log::debug;

use crate::blockdata::block::BlockHeader;
use crate::consensus::chain::{ChainEntry, ChainError, HeaderIndex};
use crate::consensus::params::{NetworkParams, PowParams};
use crate::pow::{CompactTarget, CompactTargetError, Target};
use crate::util::uint::Uint256;

/// Computes the bits that follow `last`, the final header of an interval
/// that began with `first`. A zero `target_timespan` keeps `last.bits`.
pub fn next_target(last: &BlockHeader, first: &BlockHeader, pow: &PowParams) -> Result<CompactTarget, CompactTargetError> {
    if pow.no_retargeting || pow.target_timespan == 0 {
        return Ok(last.bits);
    }

    let timespan = pow.target_timespan;
    let actual = last.time.saturating_sub(first.time).max(timespan / 4).min(timespan * 4);

    let previous = Target::from_compact(last.bits)?;
    let scaled = previous.to_uint().to_integer() * actual / timespan;
    let mut target = Uint256::from_integer(&scaled).map_or(pow.limit, Target::from_uint);
    if target > pow.limit {
        debug!("retarget clamped to the pow limit (actual timespan {}s)", actual);
        target = pow.limit;
    }

    let bits = target.to_compact_lossy();
    debug!("retarget {} -> {} over {}s", last.bits, bits, actual);
    Ok(bits)
}

/// Chooses the bits required of the next block.
#[derive(Debug, Clone)]
pub struct Retargeter {
    params: Arc<NetworkParams>,
    reset_gap: u32,
}

impl Retargeter {
    /// Creates a retargeter whose minimum difficulty gap is twice the target
    /// spacing.
    ///
    /// `block.max_tip_age` is not used here. It bounds how stale a tip may be
    /// before the node counts as syncing (a day, unbounded on regtest and
    /// simnet), which is far longer than the gap after which testnet allows a
    /// minimum difficulty block. Pass it to [`Retargeter::with_reset_gap`] to
    /// tie the two together.
    pub fn new(params: Arc<NetworkParams>) -> Retargeter {
        let reset_gap = params.pow.target_spacing * 2;
        Retargeter { params, reset_gap }
    }

    /// Sets the gap after which a `target_reset` network accepts a minimum
    /// difficulty block.
    pub fn with_reset_gap(mut self, reset_gap: u32) -> Retargeter {
        self.reset_gap = reset_gap;
        self
    }

    /// The minimum difficulty gap in seconds.
    pub fn reset_gap(&self) -> u32 {
        self.reset_gap
    }

    /// Bits required of a block at `time` built on `prev`. A zero
    /// `retarget_interval` never reaches a retarget boundary.
    pub fn next_work_required<I>(&self, index: &I, prev: &Arc<ChainEntry>, time: u32) -> Result<CompactTarget, ChainError>
    where
        I: HeaderIndex + ?Sized,
    {
        let pow = &self.params.pow;
        let interval = pow.retarget_interval;

        if (prev.height + 1).checked_rem(interval) != Some(0) {
            if !pow.target_reset {
                return Ok(prev.header.bits);
            }
            let limit_bits = pow.limit.to_compact_lossy();
            if time > prev.time().saturating_add(self.reset_gap) {
                return Ok(limit_bits);
            }
            // The last block that was not mined at minimum difficulty.
            let mut entry = prev.clone();
            while entry.height.checked_rem(interval) != Some(0) && entry.header.bits == limit_bits {
                entry = match index.parent(&entry) {
                    Some(parent) => parent,
                    None => break,
                };
            }
            return Ok(entry.header.bits);
        }

        let first_height = prev.height + 1 - interval;
        let first = index
            .ancestor(prev, first_height)
            .ok_or(ChainError::MissingAncestor { hash: prev.hash, height: first_height })?;
        Ok(next_target(&prev.header, &first.header, pow)?)
    }
}
