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

//! Consensus
//!
//! This module defines structures, functions, and traits which are needed to
//! conform to Bitcoin consensus: the network parameter registry and the
//! validation primitives that consume it.
//!

pub mod encode;
pub mod params;
pub mod chain;
pub mod checkpoints;
pub mod genesis;
pub mod retarget;
pub mod signet;
pub mod validation;
pub mod versionbits;

pub use self::encode::{Encodable, Decodable, serialize, deserialize, deserialize_partial};
pub use self::params::NetworkParams;
