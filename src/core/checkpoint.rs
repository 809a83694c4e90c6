use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BatchError;

/// Opaque token describing how far a reader got.
///
/// The runtime stores whatever [`ItemReader::checkpoint_info`] returns at each
/// commit and hands it back to [`ItemReader::open`] on restart. For the
/// readers in this crate the token is the number of items already read.
///
/// [`ItemReader::checkpoint_info`]: crate::core::item::ItemReader::checkpoint_info
/// [`ItemReader::open`]: crate::core::item::ItemReader::open
///
/// # Examples
///
/// ```
/// use batch_fixtures::core::checkpoint::Checkpoint;
///
/// let checkpoint = Checkpoint::new(3);
/// let token = checkpoint.to_json().unwrap();
///
/// assert_eq!(token, "3");
/// assert_eq!(Checkpoint::from_json(&token).unwrap(), checkpoint);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkpoint(usize);

impl Checkpoint {
    pub fn new(position: usize) -> Self {
        Self(position)
    }

    pub fn position(&self) -> usize {
        self.0
    }

    /// Serializes the token so a runtime can persist it.
    pub fn to_json(&self) -> Result<String, BatchError> {
        serde_json::to_string(self).map_err(|error| BatchError::Checkpoint(error.to_string()))
    }

    /// Restores a token previously produced by [`Checkpoint::to_json`].
    pub fn from_json(token: &str) -> Result<Self, BatchError> {
        serde_json::from_str(token).map_err(|error| BatchError::Checkpoint(error.to_string()))
    }
}

impl From<usize> for Checkpoint {
    fn from(position: usize) -> Self {
        Self(position)
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
