//! durable storage for the virtual-clock offset

use std::path::PathBuf;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::Error;

const STORE_VERSION: u32 = 1;

/// Persisted record of the last confirmed clock override.
///
/// Written on every successful set/restore and read once at startup so a
/// process restart does not silently revert to wall-clock time. `time_diff`
/// is retained for shape compatibility with the original web client's record
/// and is always written as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredOffset {
    pub version: u32,
    pub current_date: Timestamp,
    pub time_diff: i64,
    pub real_time_diff: i64,
    pub active: bool,
}

impl Default for StoredOffset {
    fn default() -> Self {
        StoredOffset::zero()
    }
}

impl StoredOffset {
    /// The no-override record: displayed time equals wall-clock time.
    pub fn zero() -> Self {
        StoredOffset {
            version: STORE_VERSION,
            current_date: Timestamp::now(),
            time_diff: 0,
            real_time_diff: 0,
            active: false,
        }
    }

    /// Record for an override confirmed at virtual time `current_date`.
    pub fn active_at(current_date: Timestamp, real_time_diff: SignedDuration) -> Self {
        StoredOffset {
            version: STORE_VERSION,
            current_date,
            time_diff: 0,
            real_time_diff: real_time_diff.as_millis() as i64,
            active: true,
        }
    }

    pub fn real_time_diff(&self) -> SignedDuration {
        SignedDuration::from_millis(self.real_time_diff)
    }
}

/// File-backed store for the current [`StoredOffset`].
pub struct OffsetStore {
    path: PathBuf,
}

impl OffsetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        OffsetStore { path: path.into() }
    }

    /// Read the stored offset. A missing, unreadable, malformed, or
    /// unrecognized-version file is treated as "no override", never as an
    /// error.
    pub fn load(&self) -> StoredOffset {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return StoredOffset::zero(),
        };
        match serde_json::from_str::<StoredOffset>(&contents) {
            Ok(offset) if offset.version == STORE_VERSION => offset,
            Ok(offset) => {
                warn!(
                    "discarding offset record with unknown version {}",
                    offset.version
                );
                StoredOffset::zero()
            }
            Err(err) => {
                warn!("discarding malformed offset record: {}", err);
                StoredOffset::zero()
            }
        }
    }

    /// Overwrite the stored offset. Writes to a sibling temp file and
    /// renames it over the target so readers never observe a partial write.
    pub fn save(&self, offset: &StoredOffset) -> Result<(), Error> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_string(offset)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
