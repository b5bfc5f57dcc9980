//! Element and connection identifiers
//!
//! Ids look like `el_<unix-millis>_<suffix>`: the timestamp keeps them
//! roughly time-ordered, the 20-char base36 suffix (~103 random bits from an
//! OS-seeded RNG) keeps them unique in practice.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;

/// Id prefix for board elements
pub const ELEMENT_ID_PREFIX: &str = "el_";
/// Id prefix for connections
pub const CONNECTION_ID_PREFIX: &str = "cn_";
/// Number of random base36 characters after the timestamp
pub const ID_SUFFIX_LEN: usize = 20;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Id of a board element
    ElementId
);

string_id!(
    /// Id of a connection between two elements
    ConnectionId
);

/// Generates element and connection ids
pub struct IdGenerator {
    rng: Box<dyn RngCore>,
}

impl IdGenerator {
    /// Generator seeded from the operating system RNG
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Generator over a caller-supplied RNG (deterministic in tests)
    pub fn with_rng(rng: impl RngCore + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    pub fn element_id(&mut self, now: Timestamp) -> ElementId {
        ElementId(self.generate(ELEMENT_ID_PREFIX, now))
    }

    pub fn connection_id(&mut self, now: Timestamp) -> ConnectionId {
        ConnectionId(self.generate(CONNECTION_ID_PREFIX, now))
    }

    fn generate(&mut self, prefix: &str, now: Timestamp) -> String {
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| BASE36[self.rng.random_range(0..BASE36.len())] as char)
            .collect();
        format!("{prefix}{}_{suffix}", now.unix_millis())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator").finish_non_exhaustive()
    }
}
