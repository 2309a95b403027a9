//! Strongly-typed identifiers for confpipe entities
//!
//! All IDs are UUID-based but wrapped in newtype structs for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a business (tenant root)
    BusinessId,
    "biz"
);

entity_id!(
    /// Unique identifier for an application
    AppId,
    "app"
);

entity_id!(
    /// Unique identifier for a config set
    CfgsetId,
    "cfgset"
);

entity_id!(
    /// Unique identifier for a commit
    CommitId,
    "commit"
);

entity_id!(
    /// Unique identifier for a multi-commit aggregate
    MultiCommitId,
    "mcommit"
);

entity_id!(
    /// Unique identifier for a targeting strategy
    StrategyId,
    "strategy"
);

entity_id!(
    /// Unique identifier for a release
    ReleaseId,
    "release"
);

entity_id!(
    /// Unique identifier for a multi-release aggregate
    MultiReleaseId,
    "mrelease"
);
