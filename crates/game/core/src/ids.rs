//! Identifier newtypes for world records.
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Unique identifier of a planet.
    PlanetId,
    "planet"
);
id_type!(
    /// Unique identifier of a ship (or fleet) in transit.
    ShipId,
    "ship"
);
id_type!(
    /// Unique identifier of an entry in a construction queue.
    QueueItemId,
    "item"
);
id_type!(
    /// Owning player of a planet or ship.
    PlayerId,
    "player"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_with_prefix() {
        assert_eq!(PlanetId(7).to_string(), "planet#7");
        assert_eq!(ShipId(3).to_string(), "ship#3");
        assert_eq!(QueueItemId::from(12).to_string(), "item#12");
    }
}
