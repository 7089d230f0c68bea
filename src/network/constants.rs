// Rust Bitcoin Library
// Written in 2014 by
//   Andrew Poelstra <apoelstra@wpsoftware.net>
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

//! Network constants
//!
//! This module provides the [`Network`] identity and the [`Magic`] bytes
//! which open every message on the given network.
//!
//! # Example: encoding a network's magic bytes
//!
//! ```rust
//! use chainparams::network::constants::{Magic, Network};
//! use chainparams::consensus::encode::serialize;
//!
//! let bytes = serialize(&Magic::from_network(Network::Signet));
//!
//! assert_eq!(&bytes[..], &[0x0a, 0x03, 0xcf, 0x40]);
//! ```

use std::{error, fmt, io};

use crate::consensus::encode::{self, Decodable, Encodable};

user_enum! {
    /// The network to act on
    #[derive(Copy, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Debug)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
    pub enum Network {
        /// Mainnet
        Main <-> "main",
        /// The public test network
        Testnet <-> "test",
        /// The default signet, whose blocks carry a signature challenge
        Signet <-> "signet",
        /// Local regression testing
        Regtest <-> "regtest",
        /// Simulation network with trivial proof of work
        Simnet <-> "simnet"
    }
}

impl Network {
    /// Converts a `Network` to its equivalent `bitcoind -chain` argument name.
    ///
    /// ```bash
    /// $ bitcoin-23.0/bin/bitcoind --help | grep -C 3 '\-chain=<chain>'
    /// Chain selection options:
    ///
    /// -chain=<chain>
    /// Use the chain <chain> (default: main). Allowed values: main, test, signet, regtest
    /// ```
    pub fn to_core_arg(self) -> &'static str {
        self.as_str()
    }

    /// Converts a `bitcoind -chain` argument name to its equivalent `Network`.
    pub fn from_core_arg(core_arg: &str) -> Result<Self, ParseNetworkError> {
        core_arg.parse()
    }
}

#[cfg(feature = "serde")]
pub mod as_core_arg {
    //! Module for serialization/deserialization of network variants into/from Bitcoin Core values
    #![allow(missing_docs)]

    use super::Network;

    pub fn serialize<S>(network: &Network, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(network.to_core_arg())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Network, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct NetworkVisitor;

        impl<'de> serde::de::Visitor<'de> for NetworkVisitor {
            type Value = Network;

            fn visit_str<E: serde::de::Error>(self, s: &str) -> Result<Self::Value, E> {
                Network::from_core_arg(s).map_err(|_| {
                    E::invalid_value(
                        serde::de::Unexpected::Str(s),
                        &"bitcoin network encoded as a string (main, test, signet, regtest or simnet)",
                    )
                })
            }

            fn expecting(&self, formatter: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(
                    formatter,
                    "bitcoin network encoded as a string (main, test, signet, regtest or simnet)"
                )
            }
        }

        deserializer.deserialize_str(NetworkVisitor)
    }
}

/// An error in parsing network string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNetworkError(pub String);

impl fmt::Display for ParseNetworkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "failed to parse {} as network", self.0)
    }
}

impl error::Error for ParseNetworkError {}

/// Network magic, the four bytes which open every P2P message. Encoded
/// little-endian on the wire.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Magic(u32);

impl Magic {
    /// Bitcoin mainnet magic.
    pub const MAIN: Magic = Magic(0xd9b4bef9);
    /// Testnet3 magic.
    pub const TESTNET: Magic = Magic(0x0709110b);
    /// Default signet magic, derived from its challenge script.
    pub const SIGNET: Magic = Magic(0x40cf030a);
    /// Regtest magic.
    pub const REGTEST: Magic = Magic(0xdab5bffa);
    /// Simnet magic.
    pub const SIMNET: Magic = Magic(0x12141c16);

    /// Creates a magic from its integer value.
    pub const fn from_u32(magic: u32) -> Magic {
        Magic(magic)
    }

    /// Returns the magic as an integer.
    pub const fn to_u32(self) -> u32 {
        self.0
    }

    /// Returns the bytes in wire order.
    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Return the network magic bytes, which should be encoded little-endian
    /// at the start of every message
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chainparams::network::constants::{Magic, Network};
    ///
    /// assert_eq!(Magic::from_network(Network::Main).to_u32(), 0xD9B4BEF9);
    /// ```
    pub fn from_network(network: Network) -> Magic {
        match network {
            Network::Main => Magic::MAIN,
            Network::Testnet => Magic::TESTNET,
            Network::Signet => Magic::SIGNET,
            Network::Regtest => Magic::REGTEST,
            Network::Simnet => Magic::SIMNET,
        }
    }

    /// Returns the network using this magic, if any.
    pub fn network(self) -> Option<Network> {
        Network::ALL.iter().cloned().find(|n| Magic::from_network(*n) == self)
    }
}

impl fmt::Debug for Magic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Magic({:#010x})", self.0)
    }
}

impl fmt::LowerHex for Magic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Encodable for Magic {
    #[inline]
    fn consensus_encode<S: io::Write>(&self, s: S) -> Result<usize, encode::Error> {
        self.0.consensus_encode(s)
    }
}

impl Decodable for Magic {
    #[inline]
    fn consensus_decode<D: io::Read>(d: D) -> Result<Self, encode::Error> {
        Ok(Magic(Decodable::consensus_decode(d)?))
    }
}
