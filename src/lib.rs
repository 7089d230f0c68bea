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

//! # Chain parameters
//!
//! Consensus parameters for the Bitcoin family of networks (main, test,
//! signet, regtest and simnet) together with the primitives a validating
//! node needs to make them meaningful: genesis self-verification,
//! checkpoint-gated chain acceptance, proof-of-work retargeting and
//! BIP9 versionbits deployment tracking.
//!
//! Every network descriptor is immutable. It is built once per process and
//! shared by reference between validation threads.
//!
//! ```rust
//! use chainparams::{Network, NetworkParams};
//!
//! let params = NetworkParams::get(Network::Signet);
//! assert_eq!(params.magic.to_u32(), 0x40cf030a);
//! assert_eq!(params.port, 38333);
//! ```
//!

#![crate_name = "chainparams"]
#![crate_type = "rlib"]

// Coding conventions
#![forbid(unsafe_code)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![warn(dead_code)]
#![warn(unused_imports)]
#![warn(missing_docs)]

// Re-exported dependencies.
#[macro_use] pub extern crate bitcoin_hashes as hashes;
pub extern crate secp256k1;

#[cfg(feature = "serde")] extern crate serde;
#[cfg(all(test, feature = "serde"))] extern crate serde_json;
#[cfg(all(test, feature = "serde"))] extern crate serde_test;

extern crate log;
extern crate once_cell;
extern crate parking_lot;
extern crate rug;

#[cfg(target_pointer_width = "16")]
compile_error!("chainparams cannot be used on 16-bit architectures");

#[cfg(test)]
mod test_helpers;
#[macro_use]
mod internal_macros;
pub mod network;
pub mod blockdata;
pub mod consensus;
pub mod pow;
pub mod util;
// Do not remove: required in order to get hash types implementation macros to work correctly
#[allow(unused_imports)]
pub mod hash_types;

pub use crate::hash_types::*;
pub use crate::blockdata::block::Block;
pub use crate::blockdata::block::BlockHeader;
pub use crate::blockdata::block::Version;
pub use crate::blockdata::block::VersionBits;
pub use crate::blockdata::transaction::Transaction;
pub use crate::blockdata::transaction::TxIn;
pub use crate::blockdata::transaction::TxOut;
pub use crate::blockdata::transaction::OutPoint;
pub use crate::consensus::encode::VarInt;
pub use crate::consensus::chain::{ChainEntry, HeaderIndex, MemoryIndex};
pub use crate::consensus::checkpoints::{Checkpoint, Checkpoints, Decision};
pub use crate::consensus::genesis::{Anchor, GenesisDescriptor};
pub use crate::consensus::params::{select, Deployment, NetworkParams, PowParams};
pub use crate::consensus::retarget::Retargeter;
pub use crate::consensus::signet::SignetChallenge;
pub use crate::consensus::validation::HeaderValidator;
pub use crate::consensus::versionbits::{DeploymentTracker, ThresholdState};
pub use crate::network::constants::Magic;
pub use crate::network::constants::Network;
pub use crate::pow::{CompactTarget, Target, Work};
pub use crate::util::Error;
pub use crate::util::uint::Uint256;
