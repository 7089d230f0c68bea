// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.

//! 256-bit unsigned integers
//!
//! A fixed-size value type used for proof-of-work targets and chainwork.
//! Arithmetic is delegated to `rug`; the value itself is stored as 32
//! big-endian bytes so the derived ordering is numeric.
//!

use std::fmt;

use hashes::hex::{self, FromHex};
use rug::integer::Order;
use rug::Integer;

/// An unsigned 256-bit integer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Uint256([u8; 32]);

impl Uint256 {
    /// Zero.
    pub const ZERO: Uint256 = Uint256([0u8; 32]);
    /// The largest representable value, 2^256 - 1.
    pub const MAX: Uint256 = Uint256([0xffu8; 32]);

    /// Creates a value from big-endian bytes.
    pub const fn from_be_bytes(bytes: [u8; 32]) -> Uint256 {
        Uint256(bytes)
    }

    /// Creates a value from little-endian bytes, the order hashes are
    /// serialized in.
    pub fn from_le_bytes(mut bytes: [u8; 32]) -> Uint256 {
        bytes.reverse();
        Uint256(bytes)
    }

    /// Returns the big-endian bytes.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Returns the little-endian bytes.
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }

    /// Creates a value from a `u64`.
    pub fn from_u64(value: u64) -> Uint256 {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Uint256(bytes)
    }

    /// Parses a big-endian hex string of exactly 64 characters.
    pub fn from_be_hex(s: &str) -> Result<Uint256, hex::Error> {
        let bytes: Vec<u8> = Vec::from_hex(s)?;
        if bytes.len() != 32 {
            return Err(hex::Error::InvalidLength(64, s.len()));
        }
        let mut inner = [0u8; 32];
        inner.copy_from_slice(&bytes);
        Ok(Uint256(inner))
    }

    /// Returns true if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Number of significant bits.
    pub fn bits(&self) -> u32 {
        for (i, byte) in self.0.iter().enumerate() {
            if *byte != 0 {
                return (32 - i as u32) * 8 - byte.leading_zeros();
            }
        }
        0
    }

    /// Converts into an arbitrary precision integer.
    pub fn to_integer(&self) -> Integer {
        Integer::from_digits(&self.0[..], Order::MsfBe)
    }

    /// Converts from an arbitrary precision integer, returning `None` when the
    /// value is negative or does not fit in 256 bits.
    pub fn from_integer(int: &Integer) -> Option<Uint256> {
        if *int < 0 || int.significant_bits() > 256 {
            return None;
        }
        let digits = int.to_digits::<u8>(Order::MsfBe);
        let mut bytes = [0u8; 32];
        bytes[32 - digits.len()..].copy_from_slice(&digits);
        Some(Uint256(bytes))
    }
}

impl fmt::LowerHex for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(self, f)
    }
}

impl fmt::Debug for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:x}", self)
    }
}
