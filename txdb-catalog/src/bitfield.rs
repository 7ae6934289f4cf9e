//! Edition membership bitfield from the level table

use serde::{Deserialize, Serialize};

const CURRENT_EDITION_BIT: i64 = 1;
const EXTENDED_SERVICE_BIT: i64 = 1 << 1;

/// Independent edition memberships of one catalog key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EditionFlags {
    /// Playable in the currently active edition (bit 0)
    pub current: bool,
    /// Available in the extended-service edition (bit 1)
    pub extended_service: bool,
}

impl EditionFlags {
    /// Decode a flag value; bits other than 0 and 1 are ignored.
    pub fn decode(flag: i64) -> Self {
        Self {
            current: flag & CURRENT_EDITION_BIT != 0,
            extended_service: flag & EXTENDED_SERVICE_BIT != 0,
        }
    }
}
