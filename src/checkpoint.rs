use crate::error::Result;
use crate::sse::OperatorString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Everything needed to continue a Markov chain: the sweep counter and the configuration.
///
/// Loop updates also store their imaginary time configuration as `O`, without it a restored
/// chain starts from an empty one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "S: Deserialize<'de>, O: Deserialize<'de>"))]
pub struct Checkpoint<S, O = OperatorString> {
    /// Sweeps done so far, thermalization included.
    pub sweeps: u64,
    /// Per site state.
    pub spins: Vec<S>,
    /// Operators of a loop update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<O>,
}

impl<S> Checkpoint<S> {
    /// Make a checkpoint of a classical configuration.
    pub fn new(sweeps: u64, spins: Vec<S>) -> Self {
        Self {
            sweeps,
            spins,
            operators: None,
        }
    }
}

impl<S, O> Checkpoint<S, O> {
    /// Attach the operators of a loop update.
    pub fn with_operators<P>(self, operators: P) -> Checkpoint<S, P> {
        Checkpoint {
            sweeps: self.sweeps,
            spins: self.spins,
            operators: Some(operators),
        }
    }
}

impl<S, O> Checkpoint<S, O>
where
    S: Serialize + DeserializeOwned,
    O: Serialize + DeserializeOwned,
{
    /// Encode to an opaque blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a blob written by [`Checkpoint::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
