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

//! Internal Macros
//!
//! Macros meant to be used inside the library
//!

/// Implements `Encodable` and `Decodable` for a struct by encoding its
/// fields in declaration order.
macro_rules! impl_consensus_encoding {
    ($thing:ident, $($field:ident),+) => (
        impl $crate::consensus::Encodable for $thing {
            #[inline]
            fn consensus_encode<S: ::std::io::Write>(
                &self,
                mut s: S,
            ) -> Result<usize, $crate::consensus::encode::Error> {
                let mut len = 0;
                $(len += $crate::consensus::Encodable::consensus_encode(&self.$field, &mut s)?;)+
                Ok(len)
            }
        }

        impl $crate::consensus::Decodable for $thing {
            #[inline]
            fn consensus_decode<D: ::std::io::Read>(
                mut d: D,
            ) -> Result<$thing, $crate::consensus::encode::Error> {
                Ok($thing {
                    $($field: $crate::consensus::Decodable::consensus_decode(&mut d)?),+
                })
            }
        }
    );
}

/// Implements consensus encoding for a hash newtype by encoding its inner
/// byte array.
macro_rules! impl_hashencode {
    ($hashtype:ident) => {
        impl $crate::consensus::Encodable for $hashtype {
            fn consensus_encode<S: ::std::io::Write>(
                &self,
                s: S,
            ) -> Result<usize, $crate::consensus::encode::Error> {
                $crate::consensus::Encodable::consensus_encode(
                    &$crate::hashes::Hash::into_inner(*self),
                    s,
                )
            }
        }

        impl $crate::consensus::Decodable for $hashtype {
            fn consensus_decode<D: ::std::io::Read>(
                d: D,
            ) -> Result<Self, $crate::consensus::encode::Error> {
                let inner: [u8; 32] = $crate::consensus::Decodable::consensus_decode(d)?;
                Ok(<$hashtype as $crate::hashes::Hash>::from_inner(inner))
            }
        }
    };
}

/// Implements the `Display` and `FromStr` pair plus the `core arg` helpers for
/// a plain field-less enum given as `Variant <-> "name"` pairs.
macro_rules! user_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $(#[$doc:meta]
              $elem:ident <-> $txt:literal),*
        }
    ) => (
        $(#[$attr])*
        pub enum $name {
            $(#[$doc] $elem),*
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$elem),*];

            /// Returns the lowercase name of this variant.
            pub fn as_str(&self) -> &'static str {
                match *self {
                    $($name::$elem => $txt),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::network::constants::ParseNetworkError;
            #[inline]
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($txt => Ok($name::$elem)),*,
                    _ => Err($crate::network::constants::ParseNetworkError(s.to_owned())),
                }
            }
        }
    );
}
