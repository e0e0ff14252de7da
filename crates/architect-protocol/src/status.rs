use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StatusCodeError;

/// Desired state of a resource, assigned by the reconciliation policy.
///
/// Codes match the fleet wire representation, which leaves gaps where the
/// actual status has intermediate steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceRequestedStatus {
    #[default]
    Unknown,
    Initialized,
    Created,
    Completed,
    Stopped,
    Destroyed,
}

impl ResourceRequestedStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Initialized => 1,
            Self::Created => 3,
            Self::Completed => 5,
            Self::Stopped => 7,
            Self::Destroyed => 9,
        }
    }
}

impl TryFrom<i32> for ResourceRequestedStatus {
    type Error = StatusCodeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Initialized),
            3 => Ok(Self::Created),
            5 => Ok(Self::Completed),
            7 => Ok(Self::Stopped),
            9 => Ok(Self::Destroyed),
            other => Err(StatusCodeError::UnknownRequested(other)),
        }
    }
}

impl fmt::Display for ResourceRequestedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Last observed state of a resource, reported by the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceActualStatus {
    #[default]
    Unknown,
    Initialized,
    Creating,
    Created,
    Running,
    Completed,
    Stopping,
    Stopped,
    Destroying,
    Destroyed,
}

impl ResourceActualStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Initialized => 1,
            Self::Creating => 2,
            Self::Created => 3,
            Self::Running => 4,
            Self::Completed => 5,
            Self::Stopping => 6,
            Self::Stopped => 7,
            Self::Destroying => 8,
            Self::Destroyed => 9,
        }
    }
}

impl TryFrom<i32> for ResourceActualStatus {
    type Error = StatusCodeError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Initialized),
            2 => Ok(Self::Creating),
            3 => Ok(Self::Created),
            4 => Ok(Self::Running),
            5 => Ok(Self::Completed),
            6 => Ok(Self::Stopping),
            7 => Ok(Self::Stopped),
            8 => Ok(Self::Destroying),
            9 => Ok(Self::Destroyed),
            other => Err(StatusCodeError::UnknownActual(other)),
        }
    }
}

impl fmt::Display for ResourceActualStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub requested_status: ResourceRequestedStatus,
    pub actual_status: ResourceActualStatus,
}

impl Default for ResourceState {
    fn default() -> Self {
        Self {
            requested_status: ResourceRequestedStatus::Initialized,
            actual_status: ResourceActualStatus::Unknown,
        }
    }
}
