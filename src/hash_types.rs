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

//! File defines types for hashes used throughout the library. These types are needed in order
//! to avoid mixing data of the same hash format (like SHA256d) but of different meaning
//! (transaction id, block hash etc).

use hashes::hex::FromHex;
use hashes::{sha256d, Hash};

hash_newtype!(Txid, sha256d::Hash, 32, doc="A bitcoin transaction hash/transaction ID.");
hash_newtype!(BlockHash, sha256d::Hash, 32, doc="A bitcoin block hash.");
hash_newtype!(TxMerkleNode, sha256d::Hash, 32, doc="A hash of the Merkle tree branch or root for transactions");

impl_hashencode!(Txid);
impl_hashencode!(BlockHash);
impl_hashencode!(TxMerkleNode);

impl BlockHash {
    /// Parses a block hash written the way block explorers and RPC print it,
    /// that is with the byte order reversed.
    pub fn from_display_hex(s: &str) -> Result<BlockHash, hashes::hex::Error> {
        let mut bytes: Vec<u8> = Vec::from_hex(s)?;
        if bytes.len() != 32 {
            return Err(hashes::hex::Error::InvalidLength(64, s.len()));
        }
        bytes.reverse();
        let mut inner = [0u8; 32];
        inner.copy_from_slice(&bytes);
        Ok(BlockHash::from_inner(inner))
    }

    /// Returns true if every byte of the hash is zero, as in the previous
    /// block hash of a genesis header.
    pub fn is_all_zeros(&self) -> bool {
        self.into_inner().iter().all(|b| *b == 0)
    }
}
