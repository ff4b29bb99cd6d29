use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a Discord snowflake newtype.
///
/// Snowflakes are never zero on the wire, so `is_valid` is the only check the
/// ingest path needs before trusting an id.
macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u64 {
                self.0
            }

            pub const fn is_valid(self) -> bool {
                self.0 != 0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// A Discord user (message author, bot identity, mitigation target).
    UserId
);
snowflake!(
    /// A Discord channel a message was posted in.
    ChannelId
);
snowflake!(
    /// A single Discord message.
    MessageId
);
snowflake!(
    /// The guild (server) a message belongs to.
    GuildId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_display_and_validity() {
        let user = UserId::new(856315760224894986);
        assert_eq!(user.to_string(), "856315760224894986");
        assert!(user.is_valid());
        assert!(!ChannelId::from(0).is_valid());
    }

    #[test]
    fn test_snowflake_serializes_as_bare_number() {
        let json = serde_json::to_string(&MessageId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(), 42);
    }
}
