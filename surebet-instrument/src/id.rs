use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

macro_rules! smol_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Deserialize, Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub SmolStr);

        impl $name {
            pub fn new(value: impl Into<SmolStr>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(SmolStr::new(value))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(SmolStr::from(value))
            }
        }

        impl From<SmolStr> for $name {
            fn from(value: SmolStr) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }
    };
}

smol_id!(
    /// Unique identifier of a bookmaker feed (eg/ "pinnacle", "bet365").
    BookmakerId
);

smol_id!(
    /// Canonical event identifier, shared by every bookmaker quoting the same fixture.
    EventId
);

smol_id!(
    /// Canonical market identifier within an event (eg/ "1X2", "OU2.5").
    MarketId
);

smol_id!(
    /// Outcome label. Matching across bookmakers is exact and case-sensitive, so
    /// "Home" and "home" are different outcomes.
    OutcomeName
);

/// Key under which one event/market is tracked: a newer snapshot with the same key replaces
/// the older one.
#[derive(
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Display,
    Constructor,
    Deserialize,
    Serialize,
)]
#[display("{event_id}/{market_id}")]
pub struct MarketKey {
    pub event_id: EventId,
    pub market_id: MarketId,
}
