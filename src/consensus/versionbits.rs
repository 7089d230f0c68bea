// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.

//! BIP9 version bits
//!
//! Soft fork deployments are tracked per window of `window` blocks. The
//! state of a deployment only changes at window boundaries, so the state
//! that applies to a block is derived from the last block of the previous
//! window. [`DeploymentTracker`] caches one state per (deployment, boundary
//! block) and computes each entry at most once, even when several threads
//! ask for it at the same time.
//!

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::{error, fmt};

use log::{debug, trace};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::blockdata::block::{Version, VersionBits};
use crate::consensus::chain::{ChainEntry, ChainError, HeaderIndex};
use crate::consensus::params::{Deployment, DeploymentConfigError, NetworkParams};
use crate::hash_types::BlockHash;

/// Deployment state. Ordered by progress, `Failed` last.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThresholdState {
    /// The start time has not been reached.
    Defined,
    /// Miners may signal.
    Started,
    /// Enough blocks signalled; activation follows one window later.
    LockedIn,
    /// The new rules are enforced.
    Active,
    /// The timeout passed without lock in.
    Failed,
}

impl ThresholdState {
    /// True for `Active` and `Failed`.
    pub fn is_final(self) -> bool {
        match self {
            ThresholdState::Active | ThresholdState::Failed => true,
            _ => false,
        }
    }
}

impl fmt::Display for ThresholdState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(match *self {
            ThresholdState::Defined => "defined",
            ThresholdState::Started => "started",
            ThresholdState::LockedIn => "locked_in",
            ThresholdState::Active => "active",
            ThresholdState::Failed => "failed",
        })
    }
}

/// Deployment state lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionBitsError {
    /// No deployment of that name on this network.
    UnknownDeployment(String),
    /// The header index is missing an ancestor.
    Chain(ChainError),
    /// The deployment cannot be evaluated with these parameters.
    Config(DeploymentConfigError),
}

impl fmt::Display for VersionBitsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            VersionBitsError::UnknownDeployment(ref name) => write!(f, "unknown deployment {}", name),
            VersionBitsError::Chain(ref e) => fmt::Display::fmt(e, f),
            VersionBitsError::Config(ref e) => fmt::Display::fmt(e, f),
        }
    }
}

impl error::Error for VersionBitsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            VersionBitsError::Chain(ref e) => Some(e),
            VersionBitsError::Config(ref e) => Some(e),
            VersionBitsError::UnknownDeployment(_) => None,
        }
    }
}

#[doc(hidden)]
impl From<ChainError> for VersionBitsError {
    fn from(e: ChainError) -> VersionBitsError {
        VersionBitsError::Chain(e)
    }
}

#[doc(hidden)]
impl From<DeploymentConfigError> for VersionBitsError {
    fn from(e: DeploymentConfigError) -> VersionBitsError {
        VersionBitsError::Config(e)
    }
}

type StateCell = Arc<OnceCell<ThresholdState>>;

/// Computes and caches deployment states for one network.
#[derive(Debug)]
pub struct DeploymentTracker {
    params: Arc<NetworkParams>,
    cache: Mutex<HashMap<(usize, BlockHash), StateCell>>,
    computations: AtomicUsize,
}

impl DeploymentTracker {
    /// Creates a tracker with an empty cache.
    pub fn new(params: Arc<NetworkParams>) -> DeploymentTracker {
        DeploymentTracker {
            params,
            cache: Mutex::new(HashMap::new()),
            computations: AtomicUsize::new(0),
        }
    }

    /// The network parameters.
    pub fn params(&self) -> &Arc<NetworkParams> {
        &self.params
    }

    /// Number of boundary states computed so far. Cache hits do not count.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }

    fn lookup(&self, name: &str) -> Result<(usize, &Deployment), VersionBitsError> {
        self.params
            .deployments
            .iter()
            .enumerate()
            .find(|(_, d)| d.name == name)
            .ok_or_else(|| VersionBitsError::UnknownDeployment(name.to_owned()))
    }

    fn cell(&self, pos: usize, hash: BlockHash) -> StateCell {
        self.cache.lock().entry((pos, hash)).or_insert_with(Default::default).clone()
    }

    /// The state of `name` for `entry`.
    pub fn state_at<I>(&self, index: &I, entry: &Arc<ChainEntry>, name: &str) -> Result<ThresholdState, VersionBitsError>
    where
        I: HeaderIndex + ?Sized,
    {
        let parent = index.parent(entry);
        if entry.height > 0 && parent.is_none() {
            return Err(ChainError::UnknownParent(entry.header.prev_blockhash).into());
        }
        self.state_after(index, parent.as_ref(), name)
    }

    /// The state of `name` for a block built on `prev`. `None` stands for the
    /// parent of genesis.
    pub fn state_after<I>(
        &self,
        index: &I,
        prev: Option<&Arc<ChainEntry>>,
        name: &str,
    ) -> Result<ThresholdState, VersionBitsError>
    where
        I: HeaderIndex + ?Sized,
    {
        let (pos, deployment) = self.lookup(name)?;
        let window = self.params.window_of(deployment);
        if window == 0 {
            return Err(DeploymentConfigError::ZeroWindow(deployment.name).into());
        }
        let threshold = self.params.threshold_of(deployment);

        // The last block of the window before the one `prev`'s child is in.
        let mut boundary = match prev {
            Some(prev) => match prev.height.checked_sub((prev.height + 1) % window) {
                Some(height) => Some(ancestor(index, prev, height)?),
                None => None,
            },
            None => None,
        };

        let mut pending = Vec::new();
        let mut state = loop {
            let entry = match boundary {
                Some(entry) => entry,
                None => break ThresholdState::Defined,
            };
            let cell = self.cell(pos, entry.hash);
            if let Some(state) = cell.get() {
                trace!("{} at {}: cached {}", deployment.name, entry.height, state);
                break *state;
            }
            let median = index.median_time_past(&entry);
            if median < deployment.start_time {
                break *cell.get_or_init(|| ThresholdState::Defined);
            }
            boundary = match entry.height.checked_sub(window) {
                Some(height) => Some(ancestor(index, &entry, height)?),
                None => None,
            };
            pending.push((entry, median, cell));
        };

        // Walk forward from the oldest uncached boundary.
        for (entry, median, cell) in pending.into_iter().rev() {
            let previous = state;
            state = *cell.get_or_try_init(|| {
                self.computations.fetch_add(1, Ordering::SeqCst);
                next_state(index, deployment, previous, &entry, median, threshold, window)
            })?;
            if state != previous {
                debug!(
                    "deployment {} moves from {} to {} after height {}",
                    deployment.name, previous, state, entry.height
                );
            }
        }
        Ok(state)
    }

    /// Whether the rules of `name` apply to a block built on `prev`.
    pub fn is_active<I>(&self, index: &I, prev: Option<&Arc<ChainEntry>>, name: &str) -> Result<bool, VersionBitsError>
    where
        I: HeaderIndex + ?Sized,
    {
        Ok(self.state_after(index, prev, name)? == ThresholdState::Active)
    }

    /// The version a miner should put in a block built on `prev`: the version
    /// bits top bits plus the bit of every deployment still collecting or
    /// waiting on signals. Forced deployments never signal.
    pub fn compute_block_version<I>(&self, index: &I, prev: Option<&Arc<ChainEntry>>) -> Result<Version, VersionBitsError>
    where
        I: HeaderIndex + ?Sized,
    {
        let mut bits = VersionBits::NONE;
        for deployment in self.params.deployments.iter().filter(|d| !d.force) {
            match self.state_after(index, prev, deployment.name)? {
                ThresholdState::Started | ThresholdState::LockedIn => {
                    bits.set(deployment.bit);
                }
                _ => {}
            }
        }
        Ok(bits.to_version())
    }
}

fn ancestor<I>(index: &I, entry: &Arc<ChainEntry>, height: u32) -> Result<Arc<ChainEntry>, ChainError>
where
    I: HeaderIndex + ?Sized,
{
    index.ancestor(entry, height).ok_or(ChainError::MissingAncestor { hash: entry.hash, height })
}

/// Signalling blocks among `entry` and the `window - 1` blocks before it.
fn count_signals<I>(index: &I, entry: &Arc<ChainEntry>, bit: u8, window: u32) -> Result<u32, ChainError>
where
    I: HeaderIndex + ?Sized,
{
    let mut count = 0;
    let mut current = entry.clone();
    for i in 0..window {
        if current.header.version.is_signalling_soft_fork(bit) {
            count += 1;
        }
        if i + 1 < window {
            current = index.parent(&current).ok_or(ChainError::MissingAncestor {
                hash: entry.hash,
                height: current.height.saturating_sub(1),
            })?;
        }
    }
    Ok(count)
}

fn next_state<I>(
    index: &I,
    deployment: &Deployment,
    previous: ThresholdState,
    boundary: &Arc<ChainEntry>,
    median: u32,
    threshold: u32,
    window: u32,
) -> Result<ThresholdState, VersionBitsError>
where
    I: HeaderIndex + ?Sized,
{
    let state = match previous {
        ThresholdState::Defined => {
            if deployment.force && median >= deployment.start_time {
                ThresholdState::LockedIn
            } else if median >= deployment.timeout {
                ThresholdState::Failed
            } else if median >= deployment.start_time {
                ThresholdState::Started
            } else {
                ThresholdState::Defined
            }
        }
        ThresholdState::Started => {
            if deployment.force {
                ThresholdState::LockedIn
            } else if median >= deployment.timeout {
                ThresholdState::Failed
            } else if count_signals(index, boundary, deployment.bit, window)? >= threshold {
                ThresholdState::LockedIn
            } else {
                ThresholdState::Started
            }
        }
        ThresholdState::LockedIn => ThresholdState::Active,
        ThresholdState::Active | ThresholdState::Failed => previous,
    };
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::chain::MemoryIndex;
    use crate::network::constants::Network;
    use crate::test_helpers::{index_for, regtest_index, ChainBuilder};
    use std::thread;

    fn signalling(bit: u8) -> Version {
        let mut bits = VersionBits::NONE;
        bits.set(bit).to_version()
    }

    #[test]
    fn forced_deployment_locks_in_without_signals() {
        let params = NetworkParams::get(Network::Signet);
        let tracker = DeploymentTracker::new(params.clone());
        let mut index = index_for(Network::Signet);
        let genesis = index.genesis().clone();
        let tip = ChainBuilder::new(&mut index, genesis.hash).extend(4100);

        let state = |height: u32| {
            let entry = index.ancestor(&tip, height).unwrap();
            tracker.state_at(&index, &entry, "testdummy").unwrap()
        };
        assert_eq!(state(0), ThresholdState::Defined);
        assert_eq!(state(2015), ThresholdState::Defined);
        assert_eq!(state(2016), ThresholdState::LockedIn);
        assert_eq!(state(4031), ThresholdState::LockedIn);
        assert_eq!(state(4032), ThresholdState::Active);
        assert_eq!(state(4100), ThresholdState::Active);
        assert!(state(4100).is_final());
        assert!(!state(2016).is_final());

        let prev = index.ancestor(&tip, 4031).unwrap();
        assert!(tracker.is_active(&index, Some(&prev), "testdummy").unwrap());
        assert!(!tracker.is_active(&index, None, "testdummy").unwrap());

        // Forced deployments are not advertised in block versions.
        assert_eq!(
            tracker.compute_block_version(&index, Some(&prev)).unwrap(),
            Version::NO_SOFT_FORK_SIGNALLING
        );
    }

    #[test]
    fn signalling_locks_in_then_activates() {
        let tracker = DeploymentTracker::new(NetworkParams::get(Network::Regtest));
        let mut index = regtest_index();
        let genesis = index.genesis().hash;

        // Window 144, threshold 108. The first window is always DEFINED and
        // the second STARTED.
        let first = ChainBuilder::new(&mut index, genesis).extend(143);
        assert_eq!(tracker.state_after(&index, Some(&first), "testdummy").unwrap(), ThresholdState::Started);
        assert_eq!(
            tracker.compute_block_version(&index, Some(&first)).unwrap(),
            VersionBits::NONE.set(0).set(1).set(28).to_version()
        );

        // 107 signalling blocks are one short.
        let tip = ChainBuilder::new(&mut index, first.hash).version(signalling(28)).extend(107);
        let short = ChainBuilder::new(&mut index, tip.hash).extend(37);
        assert_eq!(short.height, 287);
        assert_eq!(tracker.state_after(&index, Some(&short), "testdummy").unwrap(), ThresholdState::Started);

        // A sibling branch with 108 signals locks in.
        let tip = ChainBuilder::new(&mut index, first.hash).version(signalling(28)).extend(108);
        let enough = ChainBuilder::new(&mut index, tip.hash).time_offset(1).extend(36);
        assert_eq!(enough.height, 287);
        assert_eq!(tracker.state_after(&index, Some(&enough), "testdummy").unwrap(), ThresholdState::LockedIn);
        assert_eq!(tracker.state_after(&index, Some(&enough), "csv").unwrap(), ThresholdState::Started);

        let locked = ChainBuilder::new(&mut index, enough.hash).extend(143);
        assert_eq!(tracker.state_after(&index, Some(&locked), "testdummy").unwrap(), ThresholdState::LockedIn);
        let active = ChainBuilder::new(&mut index, locked.hash).extend(1);
        assert_eq!(active.height, 431);
        assert!(tracker.is_active(&index, Some(&active), "testdummy").unwrap());

        // Once active, a window without signals changes nothing.
        let later = ChainBuilder::new(&mut index, active.hash).extend(300);
        assert!(tracker.is_active(&index, Some(&later), "testdummy").unwrap());
        assert!(!tracker.compute_block_version(&index, Some(&later)).unwrap().is_signalling_soft_fork(28));
    }

    #[test]
    fn timeout_fails_deployment() {
        let mut params = NetworkParams::new(Network::Regtest);
        let genesis_time = params.genesis.time;
        let testdummy = params.deployments.iter_mut().find(|d| d.name == "testdummy").unwrap();
        testdummy.timeout = genesis_time + 200 * 600;
        let tracker = DeploymentTracker::new(Arc::new(params));

        let mut index = regtest_index();
        let genesis = index.genesis().hash;
        let tip = ChainBuilder::new(&mut index, genesis).version(signalling(28)).extend(600);

        let mut last = ThresholdState::Defined;
        for height in 0..=600 {
            let entry = index.ancestor(&tip, height).unwrap();
            let state = tracker.state_at(&index, &entry, "testdummy").unwrap();
            assert!(state >= last, "state went back at {}", height);
            last = state;
        }
        // The median time of block 287 is past the timeout, so signalling
        // in the second window came too late.
        assert_eq!(last, ThresholdState::Failed);
        let entry = index.ancestor(&tip, 288).unwrap();
        assert_eq!(tracker.state_at(&index, &entry, "testdummy").unwrap(), ThresholdState::Failed);
    }

    #[test]
    fn unknown_deployment() {
        let tracker = DeploymentTracker::new(NetworkParams::get(Network::Signet));
        let index = index_for(Network::Signet);
        match tracker.state_after(&index, Some(index.genesis()), "taproot") {
            Err(VersionBitsError::UnknownDeployment(name)) => assert_eq!(name, "taproot"),
            x => panic!("{:?}", x),
        }
    }

    #[test]
    fn empty_window_is_an_error() {
        let mut params = NetworkParams::new(Network::Regtest);
        params.miner_window = 0;
        let tracker = DeploymentTracker::new(Arc::new(params));
        let mut index = regtest_index();
        let genesis = index.genesis().hash;
        let tip = ChainBuilder::new(&mut index, genesis).extend(3);
        assert_eq!(
            tracker.state_after(&index, Some(&tip), "testdummy"),
            Err(VersionBitsError::Config(DeploymentConfigError::ZeroWindow("testdummy")))
        );
        assert!(tracker.compute_block_version(&index, Some(&tip)).is_err());
        assert_eq!(tracker.computations(), 0);
    }

    #[test]
    fn states_are_cached() {
        let tracker = DeploymentTracker::new(NetworkParams::get(Network::Regtest));
        let mut index = regtest_index();
        let genesis = index.genesis().hash;
        let tip = ChainBuilder::new(&mut index, genesis).extend(431);

        tracker.state_after(&index, Some(&tip), "testdummy").unwrap();
        // Boundaries 143, 287 and 431.
        assert_eq!(tracker.computations(), 3);
        tracker.state_after(&index, Some(&tip), "testdummy").unwrap();
        let mid = index.ancestor(&tip, 300).unwrap();
        tracker.state_after(&index, Some(&mid), "testdummy").unwrap();
        assert_eq!(tracker.computations(), 3);

        tracker.state_after(&index, Some(&tip), "csv").unwrap();
        assert_eq!(tracker.computations(), 6);
    }

    #[test]
    fn concurrent_lookups_compute_once() {
        let tracker = Arc::new(DeploymentTracker::new(NetworkParams::get(Network::Regtest)));
        let mut index = regtest_index();
        let genesis = index.genesis().hash;
        let tip = ChainBuilder::new(&mut index, genesis).version(signalling(28)).extend(1439);
        let index: Arc<MemoryIndex> = Arc::new(index);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                let index = index.clone();
                let tip = tip.clone();
                thread::spawn(move || tracker.state_after(&*index, Some(&tip), "testdummy").unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), ThresholdState::Active);
        }
        // One computation per boundary, 143 through 1439.
        assert_eq!(tracker.computations(), 10);
    }
}
