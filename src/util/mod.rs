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
// Changes for chainparams is licensed as below.
// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.
//

//! Utility functions
//!
//! Functions needed by all parts of the library.
//!

pub mod uint;

use std::{error, fmt};

use crate::consensus::chain::ChainError;
use crate::consensus::checkpoints::CheckpointError;
use crate::consensus::encode;
use crate::consensus::genesis::GenesisError;
use crate::consensus::params::{DeploymentConfigError, ParamsError};
use crate::consensus::signet::SignetError;
use crate::consensus::validation::HeaderError;
use crate::consensus::versionbits::VersionBitsError;
use crate::network::constants::ParseNetworkError;
use crate::pow::{CompactTargetError, PowError};

/// A general error code, other errors should implement conversions to/from this
/// if appropriate.
#[derive(Debug)]
pub enum Error {
    /// Encoding error
    Encode(encode::Error),
    /// Network name did not parse
    Network(ParseNetworkError),
    /// Invalid compact target
    CompactTarget(CompactTargetError),
    /// Proof of work failure
    Pow(PowError),
    /// Embedded genesis block failed verification
    Genesis(GenesisError),
    /// Checkpoint failure
    Checkpoint(CheckpointError),
    /// Network parameters violate a load-time invariant
    Params(ParamsError),
    /// Misconfigured deployment
    DeploymentConfig(DeploymentConfigError),
    /// Header index failure
    Chain(ChainError),
    /// Signet challenge did not parse
    Signet(SignetError),
    /// Deployment state lookup failure
    VersionBits(VersionBitsError),
    /// Header rejected
    Header(HeaderError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Encode(ref e) => fmt::Display::fmt(e, f),
            Error::Network(ref e) => fmt::Display::fmt(e, f),
            Error::CompactTarget(ref e) => fmt::Display::fmt(e, f),
            Error::Pow(ref e) => fmt::Display::fmt(e, f),
            Error::Genesis(ref e) => fmt::Display::fmt(e, f),
            Error::Checkpoint(ref e) => fmt::Display::fmt(e, f),
            Error::Params(ref e) => fmt::Display::fmt(e, f),
            Error::DeploymentConfig(ref e) => fmt::Display::fmt(e, f),
            Error::Chain(ref e) => fmt::Display::fmt(e, f),
            Error::Signet(ref e) => fmt::Display::fmt(e, f),
            Error::VersionBits(ref e) => fmt::Display::fmt(e, f),
            Error::Header(ref e) => fmt::Display::fmt(e, f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Encode(ref e) => Some(e),
            Error::Network(ref e) => Some(e),
            Error::CompactTarget(ref e) => Some(e),
            Error::Pow(ref e) => Some(e),
            Error::Genesis(ref e) => Some(e),
            Error::Checkpoint(ref e) => Some(e),
            Error::Params(ref e) => Some(e),
            Error::DeploymentConfig(ref e) => Some(e),
            Error::Chain(ref e) => Some(e),
            Error::Signet(ref e) => Some(e),
            Error::VersionBits(ref e) => Some(e),
            Error::Header(ref e) => Some(e),
        }
    }
}

macro_rules! impl_from_error {
    ($($from:ty => $variant:ident),*) => {
        $(
            #[doc(hidden)]
            impl From<$from> for Error {
                fn from(e: $from) -> Error {
                    Error::$variant(e)
                }
            }
        )*
    };
}

impl_from_error!(
    encode::Error => Encode,
    ParseNetworkError => Network,
    CompactTargetError => CompactTarget,
    PowError => Pow,
    GenesisError => Genesis,
    CheckpointError => Checkpoint,
    ParamsError => Params,
    DeploymentConfigError => DeploymentConfig,
    ChainError => Chain,
    SignetError => Signet,
    VersionBitsError => VersionBits,
    HeaderError => Header
);
