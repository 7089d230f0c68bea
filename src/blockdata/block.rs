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

//! Bitcoin blocks.
//!
//! A block is a bundle of transactions with a proof-of-work attached,
//! which commits to an earlier block to form the blockchain. This
//! module describes structures and functions needed to describe
//! these blocks and the blockchain.
//!

use std::{fmt, io, ops};

use hashes::{sha256d, Hash, HashEngine};

use crate::blockdata::transaction::Transaction;
use crate::consensus::encode::{self, Decodable, Encodable};
use crate::hash_types::{BlockHash, TxMerkleNode};
use crate::pow::{CompactTarget, Target, Work};

/// Bitcoin block header.
///
/// Contains all the block's information except the actual transactions, but
/// including a root of a merkle tree commiting to all transactions in the block.
#[derive(Copy, PartialEq, Eq, Clone, Debug, Hash)]
pub struct BlockHeader {
    /// Block version, now repurposed for soft fork signalling.
    pub version: Version,
    /// Reference to the previous block in the chain.
    pub prev_blockhash: BlockHash,
    /// The root hash of the merkle tree of transactions in the block.
    pub merkle_root: TxMerkleNode,
    /// The timestamp of the block, as claimed by the miner.
    pub time: u32,
    /// The target value below which the blockhash must lie, encoded as a
    /// a float (with well-defined rounding, of course).
    pub bits: CompactTarget,
    /// The nonce, selected to obtain a low enough blockhash.
    pub nonce: u32,
}
impl_consensus_encoding!(BlockHeader, version, prev_blockhash, merkle_root, time, bits, nonce);

impl BlockHeader {
    /// The number of bytes that the block header contributes to the size of a block.
    pub const SIZE: usize = 4 + 32 + 32 + 4 + 4 + 4; // 80

    /// Returns the block hash.
    pub fn block_hash(&self) -> BlockHash {
        let mut engine = BlockHash::engine();
        self.consensus_encode(&mut engine).expect("engines don't error");
        BlockHash::from_engine(engine)
    }

    /// Computes the target the header's hash must meet.
    pub fn target(&self) -> Result<Target, crate::pow::CompactTargetError> {
        Target::from_compact(self.bits)
    }

    /// Returns the work this header contributes to chainwork, zero when the
    /// bits are not a valid target.
    pub fn work(&self) -> Work {
        self.target().map(Target::to_work).unwrap_or(Work::ZERO)
    }
}

/// Bitcoin block version number.
///
/// Originally used as a protocol version, but repurposed for soft-fork signaling.
///
/// The inner value is a signed integer in Bitcoin Core for historical reasons, if version bits is
/// being used the top three bits must be 001, this gives us a useful range of [0x20000000...0x3FFFFFFF].
///
/// > When a block nVersion does not have top bits 001, it is treated as if all bits are 0 for the purposes of deployments.
#[derive(Copy, PartialEq, Eq, Clone, Debug, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version(i32);

impl Version {
    /// The original Bitcoin Block v1.
    pub const ONE: Self = Self(1);

    /// BIP-34 Block v2.
    pub const TWO: Self = Self(2);

    /// BIP-9 compatible version number that does not signal for any softforks.
    pub const NO_SOFT_FORK_SIGNALLING: Self = Self(Self::USE_VERSION_BITS as i32);

    /// BIP-9 soft fork signal bits mask.
    const VERSION_BITS_MASK: u32 = 0x1FFF_FFFF;

    /// 32bit value starting with `001` to use version bits.
    ///
    /// The value has the top three bits `001` which enables the use of version bits to signal for soft forks.
    const USE_VERSION_BITS: u32 = 0x2000_0000;

    /// Creates a [`Version`] from a signed 32 bit integer value.
    ///
    /// This is the data type used in consensus code in Bitcoin Core.
    pub const fn from_consensus(v: i32) -> Self { Version(v) }

    /// Returns the inner `i32` value.
    ///
    /// This is the data type used in consensus code in Bitcoin Core.
    pub fn to_consensus(self) -> i32 { self.0 }

    /// Returns true if the top three bits are `001`.
    pub fn uses_version_bits(self) -> bool {
        (self.0 as u32) & !Self::VERSION_BITS_MASK == Self::USE_VERSION_BITS
    }

    /// Checks whether the version number is signalling a soft fork at the given bit.
    ///
    /// A block is signalling for a soft fork under BIP-9 if the first 3 bits are `001` and
    /// the version bit for the specific soft fork is toggled on.
    pub fn is_signalling_soft_fork(&self, bit: u8) -> bool {
        VersionBits::from_version(*self).map_or(false, |bits| bits.has(bit))
    }
}

impl Default for Version {
    fn default() -> Version { Self::NO_SOFT_FORK_SIGNALLING }
}

impl Encodable for Version {
    fn consensus_encode<S: io::Write>(&self, s: S) -> Result<usize, encode::Error> {
        self.0.consensus_encode(s)
    }
}

impl Decodable for Version {
    fn consensus_decode<D: io::Read>(d: D) -> Result<Self, encode::Error> {
        Decodable::consensus_decode(d).map(Version)
    }
}

/// The 29 soft fork signalling bits of a versionbits block version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionBits(u32);

impl VersionBits {
    /// No bit set.
    pub const NONE: VersionBits = VersionBits(0);

    /// Highest usable bit.
    pub const MAX_BIT: u8 = 28;

    /// Returns the set of bits a version signals, or `None` if the version
    /// does not use versionbits at all.
    pub fn from_version(version: Version) -> Option<VersionBits> {
        if !version.uses_version_bits() {
            return None;
        }
        Some(VersionBits(version.0 as u32 & Version::VERSION_BITS_MASK))
    }

    /// Builds the block version that signals exactly these bits.
    pub fn to_version(self) -> Version {
        Version((Version::USE_VERSION_BITS | self.0) as i32)
    }

    /// Adds `bit` to the set. Bits above [`VersionBits::MAX_BIT`] are ignored.
    ///
    /// Returns itself.
    pub fn set(&mut self, bit: u8) -> VersionBits {
        if bit <= Self::MAX_BIT {
            self.0 |= 1 << bit;
        }
        *self
    }

    /// Removes `bit` from the set.
    ///
    /// Returns itself.
    pub fn unset(&mut self, bit: u8) -> VersionBits {
        if bit <= Self::MAX_BIT {
            self.0 &= !(1 << bit);
        }
        *self
    }

    /// Checks whether `bit` is in the set.
    pub fn has(&self, bit: u8) -> bool {
        bit <= Self::MAX_BIT && self.0 & (1 << bit) != 0
    }

    /// Returns true if no bit is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates over the set bits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> {
        let bits = self.0;
        (0..=Self::MAX_BIT).filter(move |bit| bits & (1 << *bit) != 0)
    }
}

impl fmt::Display for VersionBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "VersionBits(")?;
        for (i, bit) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "|")?;
            }
            write!(f, "{}", bit)?;
        }
        write!(f, ")")
    }
}

impl ops::BitOr for VersionBits {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        VersionBits(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for VersionBits {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Bitcoin block.
///
/// A collection of transactions with an attached proof of work.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Block {
    /// The block header
    pub header: BlockHeader,
    /// List of transactions contained in the block
    pub txdata: Vec<Transaction>,
}
impl_consensus_encoding!(Block, header, txdata);

impl Block {
    /// Returns the block hash.
    pub fn block_hash(&self) -> BlockHash { self.header.block_hash() }

    /// Checks if merkle root of header matches merkle root of the transaction list.
    pub fn check_merkle_root(&self) -> bool {
        match self.compute_merkle_root() {
            Some(merkle_root) => self.header.merkle_root == merkle_root,
            None => false,
        }
    }

    /// Computes the transaction merkle root, `None` for an empty block.
    pub fn compute_merkle_root(&self) -> Option<TxMerkleNode> {
        let hashes = self.txdata.iter().map(|tx| sha256d::Hash::from_inner(tx.txid().into_inner()));
        merkle_root(hashes).map(|root| TxMerkleNode::from_inner(root.into_inner()))
    }

    /// Returns the coinbase transaction, if one is present.
    pub fn coinbase(&self) -> Option<&Transaction> { self.txdata.first() }
}

/// Calculates the merkle root of a list of hashes, duplicating the last
/// hash of odd-sized levels.
pub fn merkle_root<I>(hashes: I) -> Option<sha256d::Hash>
where
    I: Iterator<Item = sha256d::Hash>,
{
    let mut level: Vec<sha256d::Hash> = hashes.collect();
    if level.is_empty() {
        return None;
    }
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            let mut engine = sha256d::Hash::engine();
            engine.input(&left[..]);
            engine.input(&right[..]);
            next.push(sha256d::Hash::from_engine(engine));
        }
        level = next;
    }
    Some(level[0])
}
