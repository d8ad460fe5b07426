//! Shared serializable types: entity identifiers and priority.
//!
//! Each identifier is a distinct newtype over [`uuid::Uuid`] so a
//! `RequesterId` can never be passed where a `ResourceId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request priority. Higher values are served first; ties break FIFO on
/// submission time.
pub type Priority = i32;

macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Return the inner UUID value.
            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(
    /// Identifier of a capacity-bounded resource (a course).
    ResourceId
);
define_id!(
    /// Identifier of a requester competing for an allocation (a student).
    RequesterId
);
define_id!(
    /// Identifier of a reviewer authorized to approve or reject requests.
    ReviewerId
);
define_id!(
    /// Identifier of an admission request.
    RequestId
);
define_id!(
    /// Identifier of a confirmed allocation.
    AllocationId
);
