// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.

//! Proof-of-work related integer types.
//!
//! Provides the [`CompactTarget`] "bits" representation found in block
//! headers, the full 256-bit [`Target`] it expands to, and [`Work`], the
//! amount of effort a target represents. Chainwork is the running sum of
//! `Work` along a chain.
//!

use std::{error, fmt, io, ops};

use hashes::Hash;
use rug::Integer;

use crate::consensus::encode::{self, Decodable, Encodable};
use crate::hash_types::BlockHash;
use crate::util::uint::Uint256;

/// Encoding of a 256-bit target as a 32-bit float-like number: one exponent
/// byte followed by a 3-byte mantissa whose top bit is a sign bit.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CompactTarget(u32);

impl CompactTarget {
    /// Creates a compact target from the consensus encoded `u32`.
    pub const fn from_consensus(bits: u32) -> CompactTarget {
        CompactTarget(bits)
    }

    /// Returns the consensus encoded `u32`.
    pub const fn to_consensus(self) -> u32 {
        self.0
    }
}

impl fmt::LowerHex for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::Debug for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CompactTarget({:#010x})", self.0)
    }
}

impl fmt::Display for CompactTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl Encodable for CompactTarget {
    #[inline]
    fn consensus_encode<S: io::Write>(&self, s: S) -> Result<usize, encode::Error> {
        self.0.consensus_encode(s)
    }
}

impl Decodable for CompactTarget {
    #[inline]
    fn consensus_decode<D: io::Read>(d: D) -> Result<Self, encode::Error> {
        Ok(CompactTarget(Decodable::consensus_decode(d)?))
    }
}

/// Compact target decoding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactTargetError {
    /// The sign bit is set on a non-zero mantissa.
    Negative(CompactTarget),
    /// The expanded value does not fit in 256 bits.
    Overflow(CompactTarget),
}

impl fmt::Display for CompactTargetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CompactTargetError::Negative(bits) => write!(f, "negative compact target {}", bits),
            CompactTargetError::Overflow(bits) => write!(f, "compact target {} overflows 256 bits", bits),
        }
    }
}

impl error::Error for CompactTargetError {}

/// A 256-bit proof-of-work target. A block hash, read as a little-endian
/// integer, must not exceed the target.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Target(Uint256);

impl Target {
    /// The zero target, which no hash can meet.
    pub const ZERO: Target = Target(Uint256::ZERO);

    /// Wraps a 256-bit value.
    pub const fn from_uint(value: Uint256) -> Target {
        Target(value)
    }

    /// Returns the underlying 256-bit value.
    pub fn to_uint(self) -> Uint256 {
        self.0
    }

    /// Expands compact "bits" into a full target.
    pub fn from_compact(bits: CompactTarget) -> Result<Target, CompactTargetError> {
        let compact = bits.to_consensus();
        let size = compact >> 24;
        let mut word = compact & 0x007f_ffff;

        let value = if size <= 3 {
            word >>= 8 * (3 - size);
            Integer::from(word)
        } else {
            Integer::from(word) << (8 * (size - 3))
        };

        if word != 0 && compact & 0x0080_0000 != 0 {
            return Err(CompactTargetError::Negative(bits));
        }
        if word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32)) {
            return Err(CompactTargetError::Overflow(bits));
        }

        Uint256::from_integer(&value)
            .map(Target)
            .ok_or(CompactTargetError::Overflow(bits))
    }

    /// Encodes the target into compact form. Only the three most significant
    /// bytes survive, so decoding the result yields a target that is less
    /// than or equal to this one.
    pub fn to_compact_lossy(self) -> CompactTarget {
        let value = self.0.to_integer();
        let mut size = (self.0.bits() + 7) / 8;
        let mut compact = if size <= 3 {
            value.to_u32_wrapping() << (8 * (3 - size))
        } else {
            (value >> (8 * (size - 3))).to_u32_wrapping()
        };

        // The mantissa's top bit is a sign bit, so shift it out of the way.
        if compact & 0x0080_0000 != 0 {
            compact >>= 8;
            size += 1;
        }
        CompactTarget(compact | (size << 24))
    }

    /// Returns the expected number of hashes needed to meet this target,
    /// `2^256 / (target + 1)`. The zero target yields zero work.
    pub fn to_work(self) -> Work {
        if self.0.is_zero() {
            return Work::ZERO;
        }
        let denominator = self.0.to_integer() + 1u32;
        let work = (Integer::from(1) << 256u32) / denominator;
        Work(Uint256::from_integer(&work).unwrap_or(Uint256::MAX))
    }

    /// Returns true if `hash`, read as a little-endian integer, is at or below
    /// this target.
    pub fn is_met_by(&self, hash: &BlockHash) -> bool {
        Uint256::from_le_bytes(hash.into_inner()) <= self.0
    }
}

impl fmt::LowerHex for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Cumulative proof-of-work. Ordered so that the chain with more work
/// compares greater.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Work(Uint256);

impl Work {
    /// No work at all.
    pub const ZERO: Work = Work(Uint256::ZERO);

    /// Wraps a 256-bit value.
    pub const fn from_uint(value: Uint256) -> Work {
        Work(value)
    }

    /// Returns the underlying 256-bit value.
    pub fn to_uint(self) -> Uint256 {
        self.0
    }
}

impl ops::Add for Work {
    type Output = Work;

    /// Saturates at 2^256 - 1, which no real chain approaches.
    fn add(self, rhs: Work) -> Work {
        let sum = self.0.to_integer() + rhs.0.to_integer();
        Work(Uint256::from_integer(&sum).unwrap_or(Uint256::MAX))
    }
}

impl ops::AddAssign for Work {
    fn add_assign(&mut self, rhs: Work) {
        *self = *self + rhs;
    }
}

impl fmt::LowerHex for Work {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Proof-of-work check failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowError {
    /// The header bits do not decode to a valid target.
    BadCompact(CompactTargetError),
    /// The target is zero or easier than the network allows.
    TargetOutOfRange(CompactTarget),
    /// The block hash does not meet the target.
    HighHash(BlockHash),
}

impl fmt::Display for PowError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PowError::BadCompact(ref e) => write!(f, "bad target: {}", e),
            PowError::TargetOutOfRange(bits) => write!(f, "target {} is out of range", bits),
            PowError::HighHash(ref hash) => write!(f, "block hash {} does not meet its target", hash),
        }
    }
}

impl error::Error for PowError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            PowError::BadCompact(ref e) => Some(e),
            PowError::TargetOutOfRange(_) | PowError::HighHash(_) => None,
        }
    }
}

#[doc(hidden)]
impl From<CompactTargetError> for PowError {
    fn from(e: CompactTargetError) -> PowError {
        PowError::BadCompact(e)
    }
}

/// Checks that `hash` satisfies the target encoded in `bits` and that the
/// target itself lies within `(0, limit]`.
pub fn check_proof_of_work(hash: &BlockHash, bits: CompactTarget, limit: &Target) -> Result<(), PowError> {
    let target = Target::from_compact(bits)?;
    if target == Target::ZERO || target > *limit {
        return Err(PowError::TargetOutOfRange(bits));
    }
    if !target.is_met_by(hash) {
        return Err(PowError::HighHash(*hash));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(hex: &str) -> Target {
        Target::from_uint(Uint256::from_be_hex(hex).unwrap())
    }

    #[test]
    fn compact_decoding() {
        let main = Target::from_compact(CompactTarget::from_consensus(0x1d00ffff)).unwrap();
        assert_eq!(main, target("00000000ffff0000000000000000000000000000000000000000000000000000"));

        let signet = Target::from_compact(CompactTarget::from_consensus(0x1e0377ae)).unwrap();
        assert_eq!(signet, target("00000377ae000000000000000000000000000000000000000000000000000000"));

        let regtest = Target::from_compact(CompactTarget::from_consensus(0x207fffff)).unwrap();
        assert_eq!(regtest, target("7fffff0000000000000000000000000000000000000000000000000000000000"));

        // Small exponents shift the mantissa right.
        let small = Target::from_compact(CompactTarget::from_consensus(0x01123456)).unwrap();
        assert_eq!(small.to_uint(), Uint256::from_u64(0x12));
        assert_eq!(Target::from_compact(CompactTarget::from_consensus(0)).unwrap(), Target::ZERO);
    }

    #[test]
    fn compact_decoding_errors() {
        let negative = CompactTarget::from_consensus(0x04923456);
        assert_eq!(Target::from_compact(negative), Err(CompactTargetError::Negative(negative)));

        let overflow = CompactTarget::from_consensus(0xff123456);
        assert_eq!(Target::from_compact(overflow), Err(CompactTargetError::Overflow(overflow)));

        // A negative zero is just zero.
        let zero = Target::from_compact(CompactTarget::from_consensus(0x01803456)).unwrap();
        assert_eq!(zero, Target::ZERO);
    }

    #[test]
    fn compact_round_trip_is_stable() {
        for bits in &[0x1d00ffffu32, 0x1e0377ae, 0x207fffff, 0x1b0404cb, 0x170d1f8c, 0x1a05db8b, 0x05009234, 0x04123456] {
            let compact = CompactTarget::from_consensus(*bits);
            let target = Target::from_compact(compact).unwrap();
            assert_eq!(target.to_compact_lossy(), compact, "bits {:#x}", bits);
        }
    }

    #[test]
    fn compact_encoding_is_lossy_downwards() {
        let precise = target("00000000ffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
        let compact = precise.to_compact_lossy();
        assert_eq!(compact, CompactTarget::from_consensus(0x1d00ffff));
        assert!(Target::from_compact(compact).unwrap() <= precise);

        // Mantissa with the sign bit set gets an extra exponent byte.
        let value = Target::from_uint(Uint256::from_u64(0x80));
        assert_eq!(value.to_compact_lossy(), CompactTarget::from_consensus(0x02008000));
        assert_eq!(Target::ZERO.to_compact_lossy(), CompactTarget::from_consensus(0));
    }

    #[test]
    fn work_from_target() {
        let main = Target::from_compact(CompactTarget::from_consensus(0x1d00ffff)).unwrap();
        assert_eq!(main.to_work().to_uint(), Uint256::from_u64(0x1_0001_0001));
        assert_eq!(Target::ZERO.to_work(), Work::ZERO);
        assert_eq!(Target::from_uint(Uint256::MAX).to_work().to_uint(), Uint256::from_u64(1));

        let mut total = Work::ZERO;
        total += main.to_work();
        total += main.to_work();
        assert_eq!(total.to_uint(), Uint256::from_u64(0x2_0002_0002));
        assert!(total > main.to_work());
    }

    #[test]
    fn proof_of_work_check() {
        let limit = target("7fffff0000000000000000000000000000000000000000000000000000000000");
        let bits = CompactTarget::from_consensus(0x207fffff);

        let mut low = [0u8; 32];
        low[31] = 0x10;
        let low = BlockHash::from_inner(low);
        assert_eq!(check_proof_of_work(&low, bits, &limit), Ok(()));

        let high = BlockHash::from_inner([0xffu8; 32]);
        assert_eq!(check_proof_of_work(&high, bits, &limit), Err(PowError::HighHash(high)));

        let easier = CompactTarget::from_consensus(0x2100ffff);
        assert_eq!(check_proof_of_work(&low, easier, &limit), Err(PowError::TargetOutOfRange(easier)));

        let zero = CompactTarget::from_consensus(0);
        assert_eq!(check_proof_of_work(&low, zero, &limit), Err(PowError::TargetOutOfRange(zero)));
    }
}
