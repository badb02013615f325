//! Opaque string ids (§3, §6 "Persisted state layout").
//!
//! Every entity id is a newtype over [`uuid::Uuid`] so the storage layer and
//! the domain layer can't accidentally mix up an `AuctionId` and a
//! `TeamId` at a call site, while still mapping onto a single Postgres `UUID`
//! column via `sqlx::Type`'s `#[sqlx(transparent)]`.

use {
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            sqlx::Type,
        )]
        #[sqlx(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

id_type!(AuctionId);
id_type!(TeamId);
id_type!(PlayerId);
id_type!(TierId);
id_type!(RoundId);
id_type!(BidId);
