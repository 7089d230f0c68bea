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

//! Consensus parameters
//!
//! This module provides predefined set of parameters for different chains.
//! Each [`NetworkParams`] is built once per process and shared read-only
//! between validation threads through [`NetworkParams::get`].
//!

use std::sync::Arc;
use std::{error, fmt};

use hashes::hex::FromHex;
use log::info;
use once_cell::sync::Lazy;

use crate::consensus::checkpoints::{Checkpoint, Checkpoints};
use crate::consensus::genesis::{Anchor, GenesisDescriptor};
use crate::consensus::signet::SignetChallenge;
use crate::hash_types::BlockHash;
use crate::network::constants::{Magic, Network};
use crate::pow::{CompactTarget, CompactTargetError, Target, Work};
use crate::util::uint::Uint256;
use crate::util::Error;

/// Highest block version bit usable by a deployment.
pub const MAX_DEPLOYMENT_BIT: u8 = 28;

/// Proof-of-work parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PowParams {
    /// Easiest target a block may claim.
    pub limit: Target,
    /// Bits of the genesis block.
    pub bits: CompactTarget,
    /// Initial chainwork, credited to the genesis anchor.
    pub chainwork: Work,
    /// Expected duration of a retarget interval, in seconds.
    pub target_timespan: u32,
    /// Expected time between blocks, in seconds.
    pub target_spacing: u32,
    /// Blocks between retargets.
    pub retarget_interval: u32,
    /// Allow minimum difficulty blocks after a long gap.
    pub target_reset: bool,
    /// Never change difficulty.
    pub no_retargeting: bool,
}

/// Block storage and sync policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockPolicy {
    /// Height below which pruning never happens.
    pub prune_after_height: u32,
    /// Blocks a pruned node keeps.
    pub keep_blocks: u32,
    /// Age, in seconds, past which a tip is considered stale.
    pub max_tip_age: u32,
    /// Height after which block processing gets slow.
    pub slow_height: u32,
}

/// Activation point of a buried soft fork.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SoftForkHeight {
    /// Activation height.
    pub height: u32,
    /// Hash of the block at `height`, when pinned.
    pub hash: Option<BlockHash>,
}

/// Buried soft fork heights.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoftForks {
    /// Blocks exempt from the BIP30 duplicate txid rule.
    pub bip30: Vec<Checkpoint>,
    /// Height in coinbase.
    pub bip34: SoftForkHeight,
    /// OP_CHECKLOCKTIMEVERIFY.
    pub bip65: SoftForkHeight,
    /// Strict DER signatures.
    pub bip66: SoftForkHeight,
    /// Relative lock times.
    pub csv: SoftForkHeight,
    /// Segregated witness.
    pub segwit: SoftForkHeight,
}

/// A BIP9 deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deployment {
    /// Deployment name.
    pub name: &'static str,
    /// Version bit, in `0..=28`.
    pub bit: u8,
    /// Median time past at which signalling may start.
    pub start_time: u32,
    /// Median time past at which the deployment fails.
    pub timeout: u32,
    /// Signalling blocks needed in a window. `None` uses the network's
    /// activation threshold.
    pub threshold: Option<u32>,
    /// Window length. `None` uses the network's miner window.
    pub window: Option<u32>,
    /// Whether blocks must signal.
    pub required: bool,
    /// Lock in at the start time without signalling.
    pub force: bool,
}

impl Deployment {
    /// Timeout of deployments that never expire.
    pub const NO_TIMEOUT: u32 = u32::MAX;

    fn window_or(&self, default: u32) -> u32 {
        self.window.unwrap_or(default)
    }

    fn threshold_or(&self, default: u32) -> u32 {
        self.threshold.unwrap_or(default)
    }
}

/// Extended key version words, one per script type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExtendedKeyVersions {
    /// P2PKH or P2SH.
    pub p2pkh: u32,
    /// P2WPKH nested in P2SH.
    pub nested_p2wpkh: u32,
    /// Native P2WPKH.
    pub p2wpkh: u32,
    /// P2WSH nested in P2SH.
    pub nested_p2wsh: u32,
    /// Native P2WSH.
    pub p2wsh: u32,
}

/// Key encoding prefixes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyPrefixes {
    /// WIF private key prefix.
    pub privkey: u8,
    /// Extended public key versions.
    pub xpubkey: ExtendedKeyVersions,
    /// Extended private key versions.
    pub xprvkey: ExtendedKeyVersions,
    /// BIP44 coin type.
    pub coin_type: u32,
}

/// Address encoding prefixes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AddressPrefixes {
    /// Base58 P2PKH version byte.
    pub p2pkh: u8,
    /// Base58 P2SH version byte.
    pub p2sh: u8,
    /// Bech32 human readable part.
    pub bech32_hrp: &'static str,
}

/// A deployment that breaks a load-time rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentConfigError {
    /// Bit outside `0..=28`.
    BitOutOfRange {
        /// Deployment name.
        name: &'static str,
        /// The bit.
        bit: u8,
    },
    /// More signals required than the window holds.
    ThresholdExceedsWindow {
        /// Deployment name.
        name: &'static str,
        /// Effective threshold.
        threshold: u32,
        /// Effective window.
        window: u32,
    },
    /// The window is empty.
    ZeroWindow(&'static str),
    /// Two deployments share a bit while both may be live.
    DuplicateBit {
        /// The bit.
        bit: u8,
        /// First deployment.
        first: &'static str,
        /// Second deployment.
        second: &'static str,
    },
}

impl fmt::Display for DeploymentConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DeploymentConfigError::BitOutOfRange { name, bit } => {
                write!(f, "deployment {} uses bit {} outside 0..={}", name, bit, MAX_DEPLOYMENT_BIT)
            }
            DeploymentConfigError::ThresholdExceedsWindow { name, threshold, window } => {
                write!(f, "deployment {} threshold {} exceeds window {}", name, threshold, window)
            }
            DeploymentConfigError::ZeroWindow(name) => write!(f, "deployment {} has an empty window", name),
            DeploymentConfigError::DuplicateBit { bit, first, second } => {
                write!(f, "deployments {} and {} both use bit {} at the same time", first, second, bit)
            }
        }
    }
}

impl error::Error for DeploymentConfigError {}

/// A network descriptor that breaks a load-time invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    /// `last_checkpoint` disagrees with the table.
    LastCheckpoint {
        /// Highest table height, zero for an empty table.
        table: u32,
        /// The stored value.
        stored: u32,
    },
    /// `target_spacing` is zero.
    ZeroTargetSpacing,
    /// `target_timespan` is zero.
    ZeroTargetTimespan,
    /// `retarget_interval` is zero.
    ZeroRetargetInterval,
    /// `retarget_interval != target_timespan / target_spacing`.
    RetargetInterval {
        /// The stored interval.
        interval: u32,
        /// The derived interval.
        expected: u32,
    },
    /// The initial bits do not decode.
    InitialBits(CompactTargetError),
    /// The initial target is easier than the limit.
    InitialBitsAboveLimit(CompactTarget),
    /// Genesis bits differ from the pow bits.
    GenesisBits {
        /// Genesis header bits.
        genesis: CompactTarget,
        /// Pow bits.
        pow: CompactTarget,
    },
    /// A deployment is misconfigured.
    Deployment(DeploymentConfigError),
    /// The magic does not match the signet challenge.
    SignetMagic {
        /// The stored magic.
        stored: Magic,
        /// The magic derived from the challenge.
        derived: Magic,
    },
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParamsError::LastCheckpoint { table, stored } => {
                write!(f, "last checkpoint is {} but the table ends at {}", stored, table)
            }
            ParamsError::ZeroTargetSpacing => f.write_str("target spacing is zero"),
            ParamsError::ZeroTargetTimespan => f.write_str("target timespan is zero"),
            ParamsError::ZeroRetargetInterval => f.write_str("retarget interval is zero"),
            ParamsError::RetargetInterval { interval, expected } => {
                write!(f, "retarget interval {} should be {}", interval, expected)
            }
            ParamsError::InitialBits(ref e) => write!(f, "initial bits: {}", e),
            ParamsError::InitialBitsAboveLimit(bits) => write!(f, "initial bits {} exceed the pow limit", bits),
            ParamsError::GenesisBits { genesis, pow } => {
                write!(f, "genesis bits {} differ from pow bits {}", genesis, pow)
            }
            ParamsError::Deployment(ref e) => fmt::Display::fmt(e, f),
            ParamsError::SignetMagic { stored, derived } => {
                write!(f, "magic {:x} does not match challenge magic {:x}", stored, derived)
            }
        }
    }
}

impl error::Error for ParamsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            ParamsError::InitialBits(ref e) => Some(e),
            ParamsError::Deployment(ref e) => Some(e),
            _ => None,
        }
    }
}

#[doc(hidden)]
impl From<DeploymentConfigError> for ParamsError {
    fn from(e: DeploymentConfigError) -> ParamsError {
        ParamsError::Deployment(e)
    }
}

/// Parameters that influence chain consensus, plus the policy values
/// consumers read alongside them.
#[derive(Debug, Clone)]
pub struct NetworkParams {
    /// Network for which parameters are valid.
    pub network: Network,
    /// Display name.
    pub name: &'static str,
    /// Message start bytes.
    pub magic: Magic,
    /// Default P2P port.
    pub port: u16,
    /// Default RPC port.
    pub rpc_port: u16,
    /// DNS seeds and seed addresses.
    pub seeds: &'static [&'static str],
    /// Checkpoint table.
    pub checkpoints: Checkpoints,
    /// Height of the highest checkpoint.
    pub last_checkpoint: u32,
    /// Blocks between subsidy halvings.
    pub halving_interval: u32,
    /// The embedded genesis block.
    pub genesis: GenesisDescriptor,
    /// Proof-of-work parameters.
    pub pow: PowParams,
    /// Storage and sync policy.
    pub block: BlockPolicy,
    /// Buried soft fork heights.
    pub softforks: SoftForks,
    /// Default signalling threshold of a deployment window.
    pub activation_threshold: u32,
    /// Default deployment window length.
    pub miner_window: u32,
    /// BIP9 deployments.
    pub deployments: Vec<Deployment>,
    /// Block challenge, signet only.
    pub signet_challenge: Option<SignetChallenge>,
    /// Key encoding prefixes.
    pub key: KeyPrefixes,
    /// Address encoding prefixes.
    pub address: AddressPrefixes,
    /// Relay only standard transactions.
    pub require_standard: bool,
    /// Minimum relay fee rate, satoshis per kilobyte.
    pub min_relay: u64,
    /// Default fee rate, satoshis per kilobyte.
    pub fee_rate: u64,
    /// Highest acceptable fee rate, satoshis per kilobyte.
    pub max_fee_rate: u64,
    /// Allow connecting to ourselves.
    pub self_connect: bool,
    /// Ask peers for their mempool on connect.
    pub request_mempool: bool,
}

fn hash(s: &str) -> BlockHash {
    BlockHash::from_display_hex(s).expect("static block hash")
}

fn uint(s: &str) -> Uint256 {
    Uint256::from_be_hex(s).expect("static 256-bit value")
}

fn checkpoints(list: &[(u32, &str)]) -> Checkpoints {
    Checkpoints::new(list.iter().map(|&(height, h)| Checkpoint { height, hash: hash(h) }))
        .expect("static checkpoints are ordered")
}

fn buried(height: u32, h: Option<&str>) -> SoftForkHeight {
    SoftForkHeight { height, hash: h.map(hash) }
}

const MAIN_SEEDS: &[&str] = &[
    "seed.bitcoin.sipa.be",
    "dnsseed.bluematt.me",
    "dnsseed.bitcoin.dashjr.org",
    "seed.bitcoinstats.com",
    "seed.bitcoin.jonasschnelli.ch",
    "seed.btc.petertodd.org",
    "seed.bitcoin.sprovoost.nl",
    "dnsseed.emzy.de",
    "seed.bitcoin.wiz.biz",
];

const TESTNET_SEEDS: &[&str] = &[
    "testnet-seed.bitcoin.jonasschnelli.ch",
    "seed.tbtc.petertodd.org",
    "seed.testnet.bitcoin.sprovoost.nl",
    "testnet-seed.bluematt.me",
];

const SIGNET_SEEDS: &[&str] = &["seed.signet.bitcoin.sprovoost.nl.", "178.128.221.177"];

const SIGNET_CHALLENGE: &str = "512103ad5e0edad18cb1f0fc0d28a3d4f1f3e445640337489abb10404f2d1e086be430210359ef5021964fe22d6f8e05b2463c9540ce96883fe3b278760f048f5189f2e6c452ae";

const MAIN_XPUB: ExtendedKeyVersions = ExtendedKeyVersions {
    p2pkh: 0x0488b21e,        // xpub
    nested_p2wpkh: 0x049d7cb2, // ypub
    p2wpkh: 0x04b24746,       // zpub
    nested_p2wsh: 0x0295b43f,  // Ypub
    p2wsh: 0x02aa7ed3,        // Zpub
};

const MAIN_XPRV: ExtendedKeyVersions = ExtendedKeyVersions {
    p2pkh: 0x0488ade4,
    nested_p2wpkh: 0x049d7878,
    p2wpkh: 0x04b2430c,
    nested_p2wsh: 0x0295b005,
    p2wsh: 0x02aa7a99,
};

const TEST_XPUB: ExtendedKeyVersions = ExtendedKeyVersions {
    p2pkh: 0x043587cf,        // tpub
    nested_p2wpkh: 0x044a5262, // upub
    p2wpkh: 0x045f1cf6,       // vpub
    nested_p2wsh: 0x024289ef,  // Upub
    p2wsh: 0x02575483,        // Vpub
};

const TEST_XPRV: ExtendedKeyVersions = ExtendedKeyVersions {
    p2pkh: 0x04358394,
    nested_p2wpkh: 0x044a4e28,
    p2wpkh: 0x045f18bc,
    nested_p2wsh: 0x024285b5,
    p2wsh: 0x02575048,
};

const SIMNET_XPUB: ExtendedKeyVersions = ExtendedKeyVersions {
    p2pkh: 0x0420bd3a,
    nested_p2wpkh: 0x0420bd3a,
    p2wpkh: 0x0420bd3a,
    nested_p2wsh: 0x0420bd3a,
    p2wsh: 0x0420bd3a,
};

const SIMNET_XPRV: ExtendedKeyVersions = ExtendedKeyVersions {
    p2pkh: 0x0420b900,
    nested_p2wpkh: 0x0420b900,
    p2wpkh: 0x0420b900,
    nested_p2wsh: 0x0420b900,
    p2wsh: 0x0420b900,
};

const TWO_WEEKS: u32 = 14 * 24 * 60 * 60;
const TEN_MINUTES: u32 = 10 * 60;
const ONE_DAY: u32 = 24 * 60 * 60;

fn testdummy(start_time: u32, timeout: u32, force: bool) -> Deployment {
    Deployment {
        name: "testdummy",
        bit: 28,
        start_time,
        timeout,
        threshold: None,
        window: None,
        required: false,
        force,
    }
}

fn open_ended(name: &'static str, bit: u8, required: bool) -> Deployment {
    Deployment {
        name,
        bit,
        start_time: 0,
        timeout: Deployment::NO_TIMEOUT,
        threshold: None,
        window: None,
        required,
        force: false,
    }
}

impl NetworkParams {
    /// Creates parameters set for the given network.
    pub fn new(network: Network) -> Self {
        match network {
            Network::Main => NetworkParams {
                network: Network::Main,
                name: "main",
                magic: Magic::MAIN,
                port: 8333,
                rpc_port: 8332,
                seeds: MAIN_SEEDS,
                checkpoints: checkpoints(&[
                    (11111, "0000000069e244f73d78e8fd29ba2fd2ed618bd6fa2ee92559f542fdb26e7c1d"),
                    (33333, "000000002dd5588a74784eaa7ab0507a18ad16a236e7b1ce69f00d7ddfb5d0a6"),
                    (74000, "0000000000573993a3c9e41ce34471c079dcf5f52a0e824a81e7f953b8661a20"),
                    (105000, "00000000000291ce28027faea320c8d2b054b2e0fe44a773f3eefb151d6bdc97"),
                    (134444, "00000000000005b12ffd4cd315cd34ffd4a594f430ac814c91184a0d42d2b0fe"),
                    (168000, "000000000000099e61ea72015e79632f216fe6cb33d7899acb35b75c8303b763"),
                    (193000, "000000000000059f452a5f7340de6682a977387c17010ff6e6c3bd83ca8b1317"),
                    (210000, "000000000000048b95347e83192f69cf0366076336c639f9b7228e9ba171342e"),
                    (216116, "00000000000001b4f4b433e81ee46494af945cf96014816a4e2370f11b23df4e"),
                    (225430, "00000000000001c108384350f74090433e7fcf79a606b8e797f065b130575932"),
                    (250000, "000000000000003887df1f29024b06fc2200b55f8af8f35453d7be294df2d214"),
                    (279000, "0000000000000001ae8c72a0b0c301f67e3afca10e819efa9041e458e9bd7e40"),
                    (295000, "00000000000000004d9b4ef50f0f9d686fd69db2e03af35a100370c64632a983"),
                ]),
                last_checkpoint: 295000,
                halving_interval: 210000,
                genesis: GenesisDescriptor::for_network(Network::Main),
                pow: PowParams {
                    limit: Target::from_uint(uint("00000000ffff0000000000000000000000000000000000000000000000000000")),
                    bits: CompactTarget::from_consensus(0x1d00ffff),
                    chainwork: Work::from_uint(uint("00000000000000000000000000000000000000001533efd8d716a517fe2c5008")),
                    target_timespan: TWO_WEEKS,
                    target_spacing: TEN_MINUTES,
                    retarget_interval: 2016,
                    target_reset: false,
                    no_retargeting: false,
                },
                block: BlockPolicy {
                    prune_after_height: 1000,
                    keep_blocks: 288,
                    max_tip_age: ONE_DAY,
                    slow_height: 325000,
                },
                softforks: SoftForks {
                    bip30: vec![
                        Checkpoint { height: 91842, hash: hash("00000000000a4d0a398161ffc163c503763b1f4360639393e0e4c8e300e0caec") },
                        Checkpoint { height: 91880, hash: hash("00000000000743f190a18c5577a3c2d2a1f610ae9601ac046a38084ccb7cd721") },
                    ],
                    bip34: buried(227931, Some("000000000000024b89b42a942fe0d9fea3bb44ab7bd1b19115dd6a759c0808b8")),
                    bip65: buried(388381, Some("000000000000000004c2b624ed5d7756c508d90fd0da2c7c679febfa6c4735f0")),
                    bip66: buried(363725, Some("00000000000000000379eaa19dce8c9b722d46ae6a57c2f1a988119488b50931")),
                    csv: buried(419328, Some("000000000000000004a1b34462cb8aeebd5799177f7a29cf28f2d1961716b5b5")),
                    segwit: buried(481824, Some("0000000000000000001c8018d9cb3b742ef25114f27563e3fc4a1902167f9893")),
                },
                activation_threshold: 1916,
                miner_window: 2016,
                deployments: vec![
                    Deployment {
                        name: "csv",
                        bit: 0,
                        start_time: 1462060800,
                        timeout: 1493596800,
                        threshold: None,
                        window: None,
                        required: false,
                        force: false,
                    },
                    Deployment {
                        name: "segwit",
                        bit: 1,
                        start_time: 1479168000,
                        timeout: 1510704000,
                        threshold: None,
                        window: None,
                        required: true,
                        force: false,
                    },
                    Deployment {
                        name: "taproot",
                        bit: 2,
                        start_time: 1619222400,
                        timeout: 1628640000,
                        threshold: Some(1815),
                        window: Some(2016),
                        required: false,
                        force: false,
                    },
                    testdummy(1199145601, 1230767999, false),
                ],
                signet_challenge: None,
                key: KeyPrefixes {
                    privkey: 0x80,
                    xpubkey: MAIN_XPUB,
                    xprvkey: MAIN_XPRV,
                    coin_type: 0,
                },
                address: AddressPrefixes { p2pkh: 0x00, p2sh: 0x05, bech32_hrp: "bc" },
                require_standard: true,
                min_relay: 1000,
                fee_rate: 100000,
                max_fee_rate: 400000,
                self_connect: false,
                request_mempool: false,
            },
            Network::Testnet => NetworkParams {
                network: Network::Testnet,
                name: "testnet",
                magic: Magic::TESTNET,
                port: 18333,
                rpc_port: 18332,
                seeds: TESTNET_SEEDS,
                checkpoints: checkpoints(&[
                    (546, "000000002a936ca763904c3c35fce2f3556c559c0214345d31b1bcebf76acb70"),
                ]),
                last_checkpoint: 546,
                halving_interval: 210000,
                genesis: GenesisDescriptor::for_network(Network::Testnet),
                pow: PowParams {
                    limit: Target::from_uint(uint("00000000ffff0000000000000000000000000000000000000000000000000000")),
                    bits: CompactTarget::from_consensus(0x1d00ffff),
                    chainwork: Work::from_uint(uint("0000000000000000000000000000000000000000000001db6ec4ac88cf2272c6")),
                    target_timespan: TWO_WEEKS,
                    target_spacing: TEN_MINUTES,
                    retarget_interval: 2016,
                    target_reset: true,
                    no_retargeting: false,
                },
                block: BlockPolicy {
                    prune_after_height: 1000,
                    keep_blocks: 10000,
                    max_tip_age: ONE_DAY,
                    slow_height: 950000,
                },
                softforks: SoftForks {
                    bip30: vec![],
                    bip34: buried(21111, Some("0000000023b3a96d3484e5abb3755c413e7d41500f8e2a5c3f0dd01299cd8ef8")),
                    bip65: buried(581885, Some("00000000007f6655f22f98e72ed80d8b06dc761d5da09df0fa1dc4be4f861eb6")),
                    bip66: buried(330776, Some("000000002104c8c45e99a8853285a3b592602a3ccde2b832481da85e9e4ba182")),
                    csv: buried(770112, Some("00000000025e930139bac5c6c31a403776da130831ab85be56578f3fa75369bb")),
                    segwit: buried(834624, Some("00000000002b980fcd729daaa248fd9316a5200e9b367f4ff2c42453e84201ca")),
                },
                activation_threshold: 1512,
                miner_window: 2016,
                deployments: vec![
                    Deployment {
                        name: "csv",
                        bit: 0,
                        start_time: 1456790400,
                        timeout: 1493596800,
                        threshold: None,
                        window: None,
                        required: false,
                        force: false,
                    },
                    Deployment {
                        name: "segwit",
                        bit: 1,
                        start_time: 1462060800,
                        timeout: 1493596800,
                        threshold: None,
                        window: None,
                        required: true,
                        force: false,
                    },
                    testdummy(1199145601, 1230767999, false),
                ],
                signet_challenge: None,
                key: KeyPrefixes {
                    privkey: 0xef,
                    xpubkey: TEST_XPUB,
                    xprvkey: TEST_XPRV,
                    coin_type: 1,
                },
                address: AddressPrefixes { p2pkh: 0x6f, p2sh: 0xc4, bech32_hrp: "tb" },
                require_standard: false,
                min_relay: 1000,
                fee_rate: 20000,
                max_fee_rate: 60000,
                self_connect: false,
                request_mempool: false,
            },
            Network::Signet => NetworkParams {
                network: Network::Signet,
                name: "signet",
                magic: Magic::SIGNET,
                port: 38333,
                rpc_port: 38332,
                seeds: SIGNET_SEEDS,
                checkpoints: checkpoints(&[
                    (10000, "000000ade699ac51fe9f23005115eccafe986e9d0c97f87403579698d31f1692"),
                    (20000, "000000d86368960eddbf7e127f8ba93a56efe71420b5dd8dbf8b0a68fa9ebbd1"),
                    (30000, "00000018629ddf1cef19d764cab5fc630dadffca9819d8ff9ae93d4bd76729f0"),
                    (40000, "0000014086ddfe6836bd52179c2ce1ce5eb8a9b85aee87c18be05c605723793c"),
                    (50000, "000000f43b569ea4bdce85a92e8140e90049d6efbffd95c1b6e80de4e397cb01"),
                    (60000, "00000130ab66a74ee232acb3f7ae35f9763dcec197b82b22f482ad0ea4c801f1"),
                ]),
                last_checkpoint: 60000,
                halving_interval: 210000,
                genesis: GenesisDescriptor::for_network(Network::Signet),
                pow: PowParams {
                    limit: Target::from_uint(uint("00000377ae000000000000000000000000000000000000000000000000000000")),
                    bits: CompactTarget::from_consensus(0x1e0377ae),
                    chainwork: Work::from_uint(uint("000000000000000000000000000000000000000000000000000000a93e40a89b")),
                    target_timespan: TWO_WEEKS,
                    target_spacing: TEN_MINUTES,
                    retarget_interval: 2016,
                    target_reset: false,
                    no_retargeting: false,
                },
                block: BlockPolicy {
                    prune_after_height: 1000,
                    keep_blocks: 10000,
                    max_tip_age: ONE_DAY,
                    slow_height: 0,
                },
                softforks: {
                    let h = "00000086d6b2636cb2a392d45edc4ec544a10024d30141c9adf4bfd9de533b53";
                    SoftForks {
                        bip30: vec![],
                        bip34: buried(1, Some(h)),
                        bip65: buried(1, Some(h)),
                        bip66: buried(1, Some(h)),
                        csv: buried(1, Some(h)),
                        segwit: buried(1, Some(h)),
                    }
                },
                activation_threshold: 1815, // 90% of 2016
                miner_window: 2016,
                deployments: vec![testdummy(1199145601, 1230767999, true)],
                signet_challenge: Some(
                    SignetChallenge::from_script(Vec::from_hex(SIGNET_CHALLENGE).expect("static hex"))
                        .expect("static signet challenge"),
                ),
                key: KeyPrefixes {
                    privkey: 0xef,
                    xpubkey: TEST_XPUB,
                    xprvkey: TEST_XPRV,
                    coin_type: 1,
                },
                address: AddressPrefixes { p2pkh: 0x6f, p2sh: 0xc4, bech32_hrp: "tb" },
                require_standard: true,
                min_relay: 1000,
                fee_rate: 20000,
                max_fee_rate: 60000,
                self_connect: false,
                request_mempool: false,
            },
            Network::Regtest => NetworkParams {
                network: Network::Regtest,
                name: "regtest",
                magic: Magic::REGTEST,
                port: 18444,
                rpc_port: 18443,
                seeds: &[],
                checkpoints: checkpoints(&[(0, crate::blockdata::constants::genesis_hash_hex(Network::Regtest))]),
                last_checkpoint: 0,
                halving_interval: 150,
                genesis: GenesisDescriptor::for_network(Network::Regtest),
                pow: PowParams {
                    limit: Target::from_uint(uint("7fffff0000000000000000000000000000000000000000000000000000000000")),
                    bits: CompactTarget::from_consensus(0x207fffff),
                    chainwork: Work::ZERO,
                    target_timespan: TWO_WEEKS,
                    target_spacing: TEN_MINUTES,
                    retarget_interval: 2016,
                    target_reset: true,
                    no_retargeting: true,
                },
                block: BlockPolicy {
                    prune_after_height: 1000,
                    keep_blocks: 10000,
                    max_tip_age: u32::MAX,
                    slow_height: 0,
                },
                softforks: SoftForks {
                    bip30: vec![],
                    bip34: buried(500, None),
                    bip65: buried(1351, None),
                    bip66: buried(1251, None),
                    csv: buried(432, None),
                    segwit: buried(0, None),
                },
                activation_threshold: 108, // 75% for testchains
                miner_window: 144, // Faster than normal for regtest
                deployments: vec![
                    open_ended("csv", 0, false),
                    open_ended("segwit", 1, true),
                    testdummy(0, Deployment::NO_TIMEOUT, false),
                ],
                signet_challenge: None,
                key: KeyPrefixes {
                    privkey: 0xef,
                    xpubkey: TEST_XPUB,
                    xprvkey: TEST_XPRV,
                    coin_type: 1,
                },
                address: AddressPrefixes { p2pkh: 0x6f, p2sh: 0xc4, bech32_hrp: "bcrt" },
                require_standard: false,
                min_relay: 1000,
                fee_rate: 20000,
                max_fee_rate: 60000,
                self_connect: true,
                request_mempool: true,
            },
            Network::Simnet => NetworkParams {
                network: Network::Simnet,
                name: "simnet",
                magic: Magic::SIMNET,
                port: 18555,
                rpc_port: 18556,
                seeds: &[],
                checkpoints: Checkpoints::empty(),
                last_checkpoint: 0,
                halving_interval: 210000,
                genesis: GenesisDescriptor::for_network(Network::Simnet),
                pow: PowParams {
                    limit: Target::from_uint(uint("7fffff0000000000000000000000000000000000000000000000000000000000")),
                    bits: CompactTarget::from_consensus(0x207fffff),
                    chainwork: Work::ZERO,
                    target_timespan: TWO_WEEKS,
                    target_spacing: TEN_MINUTES,
                    retarget_interval: 2016,
                    target_reset: true,
                    no_retargeting: false,
                },
                block: BlockPolicy {
                    prune_after_height: 1000,
                    keep_blocks: 10000,
                    max_tip_age: u32::MAX,
                    slow_height: 0,
                },
                softforks: SoftForks {
                    bip30: vec![],
                    bip34: buried(0, None),
                    bip65: buried(0, None),
                    bip66: buried(0, None),
                    csv: buried(0, None),
                    segwit: buried(0, None),
                },
                activation_threshold: 75,
                miner_window: 100,
                deployments: vec![
                    open_ended("csv", 0, false),
                    open_ended("segwit", 1, true),
                    testdummy(0, Deployment::NO_TIMEOUT, false),
                ],
                signet_challenge: None,
                key: KeyPrefixes {
                    privkey: 0x64,
                    xpubkey: SIMNET_XPUB,
                    xprvkey: SIMNET_XPRV,
                    coin_type: 115,
                },
                address: AddressPrefixes { p2pkh: 0x3f, p2sh: 0x7b, bech32_hrp: "sb" },
                require_standard: false,
                min_relay: 1000,
                fee_rate: 20000,
                max_fee_rate: 60000,
                self_connect: true,
                request_mempool: true,
            },
        }
    }

    /// Returns the process-wide shared parameters of `network`, building them
    /// on first use.
    pub fn get(network: Network) -> Arc<NetworkParams> {
        static MAIN: Lazy<Arc<NetworkParams>> = Lazy::new(|| Arc::new(NetworkParams::new(Network::Main)));
        static TESTNET: Lazy<Arc<NetworkParams>> = Lazy::new(|| Arc::new(NetworkParams::new(Network::Testnet)));
        static SIGNET: Lazy<Arc<NetworkParams>> = Lazy::new(|| Arc::new(NetworkParams::new(Network::Signet)));
        static REGTEST: Lazy<Arc<NetworkParams>> = Lazy::new(|| Arc::new(NetworkParams::new(Network::Regtest)));
        static SIMNET: Lazy<Arc<NetworkParams>> = Lazy::new(|| Arc::new(NetworkParams::new(Network::Simnet)));

        match network {
            Network::Main => MAIN.clone(),
            Network::Testnet => TESTNET.clone(),
            Network::Signet => SIGNET.clone(),
            Network::Regtest => REGTEST.clone(),
            Network::Simnet => SIMNET.clone(),
        }
    }

    /// Looks up a deployment by name.
    pub fn deployment(&self, name: &str) -> Option<&Deployment> {
        self.deployments.iter().find(|d| d.name == name)
    }

    /// Signalling blocks `deployment` needs per window.
    pub fn threshold_of(&self, deployment: &Deployment) -> u32 {
        deployment.threshold_or(self.activation_threshold)
    }

    /// Window length of `deployment`.
    pub fn window_of(&self, deployment: &Deployment) -> u32 {
        deployment.window_or(self.miner_window)
    }

    /// Verifies the embedded genesis block, crediting the initial chainwork.
    pub fn verify_genesis(&self) -> Result<Anchor, Error> {
        Ok(self.genesis.verify(self.pow.chainwork)?)
    }

    /// Checks the load-time invariants of the descriptor.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let table_last = self.checkpoints.last_checkpoint().map_or(0, |cp| cp.height);
        if table_last != self.last_checkpoint {
            return Err(ParamsError::LastCheckpoint { table: table_last, stored: self.last_checkpoint });
        }

        let pow = &self.pow;
        // Divisors of the retargeter, with or without retargeting.
        if pow.target_spacing == 0 {
            return Err(ParamsError::ZeroTargetSpacing);
        }
        if pow.target_timespan == 0 {
            return Err(ParamsError::ZeroTargetTimespan);
        }
        if pow.retarget_interval == 0 {
            return Err(ParamsError::ZeroRetargetInterval);
        }
        if !pow.no_retargeting {
            let expected = pow.target_timespan / pow.target_spacing;
            if pow.retarget_interval != expected {
                return Err(ParamsError::RetargetInterval { interval: pow.retarget_interval, expected });
            }
        }
        let initial = Target::from_compact(pow.bits).map_err(ParamsError::InitialBits)?;
        if initial > pow.limit {
            return Err(ParamsError::InitialBitsAboveLimit(pow.bits));
        }
        if self.genesis.bits != pow.bits {
            return Err(ParamsError::GenesisBits { genesis: self.genesis.bits, pow: pow.bits });
        }

        self.validate_deployments()?;

        if let Some(ref challenge) = self.signet_challenge {
            let derived = challenge.magic();
            if derived != self.magic {
                return Err(ParamsError::SignetMagic { stored: self.magic, derived });
            }
        }
        Ok(())
    }

    fn validate_deployments(&self) -> Result<(), DeploymentConfigError> {
        for (i, d) in self.deployments.iter().enumerate() {
            if d.bit > MAX_DEPLOYMENT_BIT {
                return Err(DeploymentConfigError::BitOutOfRange { name: d.name, bit: d.bit });
            }
            let window = self.window_of(d);
            if window == 0 {
                return Err(DeploymentConfigError::ZeroWindow(d.name));
            }
            let threshold = self.threshold_of(d);
            if threshold > window {
                return Err(DeploymentConfigError::ThresholdExceedsWindow { name: d.name, threshold, window });
            }
            // Deployments may reuse a bit once the earlier one is over.
            for other in &self.deployments[..i] {
                let overlaps = d.start_time < other.timeout && other.start_time < d.timeout;
                if other.bit == d.bit && overlaps {
                    return Err(DeploymentConfigError::DuplicateBit { bit: d.bit, first: other.name, second: d.name });
                }
            }
        }
        Ok(())
    }
}

/// Validates the parameters of `network`, verifies its genesis block and
/// returns the shared descriptor together with the chain anchor.
pub fn select(network: Network) -> Result<(Arc<NetworkParams>, Anchor), Error> {
    let params = NetworkParams::get(network);
    params.validate()?;
    let anchor = params.verify_genesis()?;
    info!(
        "selected network {} (magic {:#010x}, port {}, genesis {}, last checkpoint {})",
        params.name,
        params.magic.to_u32(),
        params.port,
        anchor.hash,
        params.last_checkpoint
    );
    Ok((params, anchor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_params_validate() {
        for network in Network::ALL.iter() {
            let params = NetworkParams::new(*network);
            assert_eq!(params.network, *network);
            assert_eq!(params.validate(), Ok(()), "{}", network);
            assert_eq!(params.magic, Magic::from_network(*network));
        }
    }

    #[test]
    fn signet_params() {
        let params = NetworkParams::new(Network::Signet);
        assert_eq!(params.magic.to_u32(), 0x40cf030a);
        assert_eq!(params.port, 38333);
        assert_eq!(params.rpc_port, 38332);
        assert_eq!(params.seeds, &["seed.signet.bitcoin.sprovoost.nl.", "178.128.221.177"]);
        assert_eq!(params.halving_interval, 210000);
        assert_eq!(params.pow.retarget_interval, 2016);
        assert_eq!(params.pow.target_timespan, 1209600);
        assert_eq!(params.pow.target_spacing, 600);
        assert!(!params.pow.target_reset);
        assert!(!params.pow.no_retargeting);
        assert_eq!(params.block.max_tip_age, 86400);
        assert_eq!(params.softforks.segwit.height, 1);
        assert!(params.softforks.bip30.is_empty());
        assert_eq!(params.key.xpubkey.p2pkh, 0x043587cf);
        assert_eq!(params.key.xprvkey.p2wsh, 0x02575048);
        assert_eq!(params.address.bech32_hrp, "tb");
        assert!(params.require_standard);
        assert_eq!((params.min_relay, params.fee_rate, params.max_fee_rate), (1000, 20000, 60000));
        assert_eq!(params.signet_challenge.as_ref().unwrap().magic(), params.magic);

        let testdummy = params.deployment("testdummy").unwrap();
        assert_eq!(testdummy.bit, 28);
        assert_eq!(testdummy.threshold, None);
        assert_eq!(params.threshold_of(testdummy), 1815);
        assert_eq!(params.window_of(testdummy), 2016);
        assert!(testdummy.force);
        assert!(params.deployment("taproot").is_none());
    }

    #[test]
    fn shared_params_are_built_once() {
        let a = NetworkParams::get(Network::Signet);
        let b = NetworkParams::get(Network::Signet);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &NetworkParams::get(Network::Main)));
    }

    #[test]
    fn select_verifies_and_anchors() {
        for network in Network::ALL.iter() {
            let (params, anchor) = select(*network).unwrap();
            assert_eq!(anchor.hash, params.genesis.hash);
            assert_eq!(anchor.chainwork, params.pow.chainwork);
        }
    }

    #[test]
    fn invalid_descriptors_are_rejected() {
        let base = NetworkParams::new(Network::Signet);

        let mut params = base.clone();
        params.last_checkpoint = 50000;
        assert_eq!(params.validate(), Err(ParamsError::LastCheckpoint { table: 60000, stored: 50000 }));

        let mut params = base.clone();
        params.pow.target_spacing = 0;
        assert_eq!(params.validate(), Err(ParamsError::ZeroTargetSpacing));

        let mut params = base.clone();
        params.pow.target_timespan = 0;
        assert_eq!(params.validate(), Err(ParamsError::ZeroTargetTimespan));

        let mut params = base.clone();
        params.pow.retarget_interval = 0;
        assert_eq!(params.validate(), Err(ParamsError::ZeroRetargetInterval));

        // Regtest skips the interval ratio but not the zero checks.
        let mut params = NetworkParams::new(Network::Regtest);
        assert!(params.pow.no_retargeting);
        params.pow.retarget_interval = 0;
        assert_eq!(params.validate(), Err(ParamsError::ZeroRetargetInterval));
        params.pow.retarget_interval = 2016;
        params.pow.target_spacing = 0;
        assert_eq!(params.validate(), Err(ParamsError::ZeroTargetSpacing));

        let mut params = base.clone();
        params.pow.retarget_interval = 2015;
        assert_eq!(params.validate(), Err(ParamsError::RetargetInterval { interval: 2015, expected: 2016 }));

        let mut params = base.clone();
        params.pow.bits = CompactTarget::from_consensus(0x1e0477ae);
        assert_eq!(params.validate(), Err(ParamsError::InitialBitsAboveLimit(params.pow.bits)));

        let mut params = base.clone();
        params.pow.bits = CompactTarget::from_consensus(0x1d00ffff);
        match params.validate() {
            Err(ParamsError::GenesisBits { .. }) => {}
            x => panic!("{:?}", x),
        }

        let mut params = base.clone();
        params.magic = Magic::MAIN;
        match params.validate() {
            Err(ParamsError::SignetMagic { derived, .. }) => assert_eq!(derived, Magic::SIGNET),
            x => panic!("{:?}", x),
        }
    }

    #[test]
    fn invalid_deployments_are_rejected() {
        let base = NetworkParams::new(Network::Main);

        let mut params = base.clone();
        params.deployments[0].bit = 29;
        assert_eq!(
            params.validate(),
            Err(ParamsError::Deployment(DeploymentConfigError::BitOutOfRange { name: "csv", bit: 29 }))
        );

        let mut params = base.clone();
        params.deployments[2].threshold = Some(2017);
        assert_eq!(
            params.validate(),
            Err(ParamsError::Deployment(DeploymentConfigError::ThresholdExceedsWindow {
                name: "taproot",
                threshold: 2017,
                window: 2016,
            }))
        );

        let mut params = base.clone();
        params.deployments[2].window = Some(0);
        assert_eq!(params.validate(), Err(ParamsError::Deployment(DeploymentConfigError::ZeroWindow("taproot"))));

        // segwit overlaps csv in time; sharing a bit is an error.
        let mut params = base.clone();
        params.deployments[1].bit = 0;
        assert_eq!(
            params.validate(),
            Err(ParamsError::Deployment(DeploymentConfigError::DuplicateBit { bit: 0, first: "csv", second: "segwit" }))
        );

        // taproot starts after csv timed out, so reusing bit 0 is fine.
        let mut params = base.clone();
        params.deployments[2].bit = 0;
        assert_eq!(params.validate(), Ok(()));
    }
}
