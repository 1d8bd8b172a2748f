//! Droplet lifecycle to portable node status.

use super::portable::NodeStatus;
use crate::domain::DropletStatus;

/// Maps a droplet lifecycle state onto the portable node status.
#[must_use]
pub const fn to_portable_status(status: DropletStatus) -> NodeStatus {
    match status {
        DropletStatus::Active => NodeStatus::Running,
        DropletStatus::New => NodeStatus::Pending,
        DropletStatus::Off => NodeStatus::Suspended,
        DropletStatus::Archive => NodeStatus::Terminated,
        DropletStatus::Unrecognized => NodeStatus::Unrecognized,
    }
}

impl From<DropletStatus> for NodeStatus {
    fn from(value: DropletStatus) -> Self {
        to_portable_status(value)
    }
}
