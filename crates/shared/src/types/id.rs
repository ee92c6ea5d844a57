//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing an `AccountId` where a
//! `GiftCardId` is expected. All ids are database-assigned integers.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers around an integer key.
macro_rules! typed_id {
    ($name:ident, $inner:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Wraps a raw database key.
            #[must_use]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Returns the raw database key.
            #[must_use]
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

typed_id!(UserId, i32, "Identifier of an authenticated caller.");
typed_id!(CompanyId, i32, "Unique identifier for a company.");
typed_id!(AccountId, i64, "Unique identifier for a ledger account.");
typed_id!(GiftCardId, i64, "Unique identifier for a gift card.");
typed_id!(LedgerId, i64, "Unique identifier for a ledger header.");
typed_id!(LedgerEntryId, i64, "Unique identifier for a ledger entry.");
