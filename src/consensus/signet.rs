// Copyright (c) 2021 Chaintope Inc.
// Distributed under the MIT software license, see the accompanying
// file COPYING or http://www.opensource.org/licenses/mit-license.php.

//! Signet challenge
//!
//! A signet's blocks must satisfy a challenge script instead of relying on
//! proof of work alone. The network magic is derived from that script, so
//! two signets with different challenges never talk to each other.
//!

use std::{error, fmt};

use hashes::{sha256d, Hash, HashEngine};
use secp256k1::PublicKey;

use crate::consensus::encode::{Encodable, VarInt};
use crate::network::constants::Magic;

const OP_PUSHBYTES_33: u8 = 0x21;
const OP_1: u8 = 0x51;
const OP_16: u8 = 0x60;
const OP_CHECKMULTISIG: u8 = 0xae;

/// Challenge script parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignetError {
    /// The script ended early.
    Truncated,
    /// An opcode other than the multisig template expects.
    UnexpectedOpcode {
        /// Byte offset in the script.
        position: usize,
        /// The opcode found.
        opcode: u8,
    },
    /// A pushed key does not parse.
    InvalidKey(secp256k1::Error),
    /// The declared key count differs from the pushed keys.
    KeyCount {
        /// The `n` in `m-of-n`.
        declared: usize,
        /// Keys actually pushed.
        found: usize,
    },
    /// `m` exceeds `n`.
    Threshold {
        /// Required signatures.
        required: usize,
        /// Available keys.
        keys: usize,
    },
    /// Bytes follow `OP_CHECKMULTISIG`.
    TrailingData,
}

impl fmt::Display for SignetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SignetError::Truncated => f.write_str("challenge script is truncated"),
            SignetError::UnexpectedOpcode { position, opcode } => {
                write!(f, "unexpected opcode {:#04x} at {}", opcode, position)
            }
            SignetError::InvalidKey(ref e) => write!(f, "invalid challenge key: {}", e),
            SignetError::KeyCount { declared, found } => {
                write!(f, "challenge declares {} keys but pushes {}", declared, found)
            }
            SignetError::Threshold { required, keys } => {
                write!(f, "challenge requires {} of only {} keys", required, keys)
            }
            SignetError::TrailingData => f.write_str("data after OP_CHECKMULTISIG"),
        }
    }
}

impl error::Error for SignetError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            SignetError::InvalidKey(ref e) => Some(e),
            _ => None,
        }
    }
}

/// An `m-of-n` bare multisig challenge script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignetChallenge {
    script: Vec<u8>,
    required: usize,
    keys: Vec<PublicKey>,
}

impl SignetChallenge {
    /// Parses `OP_m <key>... OP_n OP_CHECKMULTISIG` with compressed keys.
    pub fn from_script(script: Vec<u8>) -> Result<SignetChallenge, SignetError> {
        let small_int = |position: usize| -> Result<usize, SignetError> {
            match script.get(position) {
                None => Err(SignetError::Truncated),
                Some(op) if (OP_1..=OP_16).contains(op) => Ok((op - OP_1 + 1) as usize),
                Some(op) => Err(SignetError::UnexpectedOpcode { position, opcode: *op }),
            }
        };

        let required = small_int(0)?;
        let mut keys = Vec::new();
        let mut pos = 1;
        while script.get(pos) == Some(&OP_PUSHBYTES_33) {
            let key = script.get(pos + 1..pos + 34).ok_or(SignetError::Truncated)?;
            keys.push(PublicKey::from_slice(key).map_err(SignetError::InvalidKey)?);
            pos += 34;
        }

        let declared = small_int(pos)?;
        if declared != keys.len() {
            return Err(SignetError::KeyCount { declared, found: keys.len() });
        }
        if required > declared {
            return Err(SignetError::Threshold { required, keys: declared });
        }
        pos += 1;
        match script.get(pos) {
            None => return Err(SignetError::Truncated),
            Some(&OP_CHECKMULTISIG) => {}
            Some(op) => return Err(SignetError::UnexpectedOpcode { position: pos, opcode: *op }),
        }
        if pos + 1 != script.len() {
            return Err(SignetError::TrailingData);
        }

        Ok(SignetChallenge { script, required, keys })
    }

    /// The raw script.
    pub fn as_bytes(&self) -> &[u8] {
        &self.script
    }

    /// Signatures required.
    pub fn required(&self) -> usize {
        self.required
    }

    /// The signing keys, in script order.
    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }

    /// First four bytes of sha256d over the length-prefixed script, read
    /// little-endian.
    pub fn magic(&self) -> Magic {
        let mut engine = sha256d::Hash::engine();
        VarInt(self.script.len() as u64)
            .consensus_encode(&mut engine)
            .expect("engines don't error");
        engine.input(&self.script);
        let hash = sha256d::Hash::from_engine(engine);
        let mut word = [0u8; 4];
        word.copy_from_slice(&hash[..4]);
        Magic::from_u32(u32::from_le_bytes(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_CHALLENGE: &str = "512103ad5e0edad18cb1f0fc0d28a3d4f1f3e445640337489abb10404f2d1e086be430210359ef5021964fe22d6f8e05b2463c9540ce96883fe3b278760f048f5189f2e6c452ae";

    #[test]
    fn default_challenge_parses() {
        let challenge = SignetChallenge::from_script(hex::decode(DEFAULT_CHALLENGE).unwrap()).unwrap();
        assert_eq!(challenge.required(), 1);
        assert_eq!(challenge.keys().len(), 2);
        assert_eq!(challenge.as_bytes().len(), 71);
        assert_eq!(
            hex::encode(&challenge.keys()[0].serialize()[..]),
            "03ad5e0edad18cb1f0fc0d28a3d4f1f3e445640337489abb10404f2d1e086be430"
        );
    }

    #[test]
    fn default_challenge_magic() {
        let challenge = SignetChallenge::from_script(hex::decode(DEFAULT_CHALLENGE).unwrap()).unwrap();
        assert_eq!(challenge.magic(), Magic::SIGNET);
        assert_eq!(challenge.magic().to_u32(), 0x40cf030a);
    }

    #[test]
    fn malformed_challenges() {
        let script = hex::decode(DEFAULT_CHALLENGE).unwrap();

        let mut wrong_n = script.clone();
        wrong_n[69] = 0x53;
        assert_eq!(
            SignetChallenge::from_script(wrong_n),
            Err(SignetError::KeyCount { declared: 3, found: 2 })
        );

        let mut too_many = script.clone();
        too_many[0] = 0x53;
        assert_eq!(
            SignetChallenge::from_script(too_many),
            Err(SignetError::Threshold { required: 3, keys: 2 })
        );

        let mut bad_key = script.clone();
        bad_key[2] = 0x05;
        match SignetChallenge::from_script(bad_key) {
            Err(SignetError::InvalidKey(_)) => {}
            x => panic!("{:?}", x),
        }

        let mut not_multisig = script.clone();
        not_multisig[70] = 0xac;
        assert_eq!(
            SignetChallenge::from_script(not_multisig),
            Err(SignetError::UnexpectedOpcode { position: 70, opcode: 0xac })
        );

        let mut trailing = script.clone();
        trailing.push(0x00);
        assert_eq!(SignetChallenge::from_script(trailing), Err(SignetError::TrailingData));

        assert_eq!(SignetChallenge::from_script(script[..40].to_vec()), Err(SignetError::Truncated));
        assert_eq!(SignetChallenge::from_script(vec![]), Err(SignetError::Truncated));
        assert_eq!(
            SignetChallenge::from_script(vec![0x00]),
            Err(SignetError::UnexpectedOpcode { position: 0, opcode: 0x00 })
        );
    }
}
