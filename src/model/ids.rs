//! Type-safe identifiers.
//!
//! Every id is a transparent `u64` on the wire and renders with a short prefix in logs.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }
    };
}

id_type!(
    /// A dish on a restaurant's menu; the identity of a cart line.
    MenuItemId,
    "item"
);
id_type!(RestaurantId, "restaurant");
id_type!(CustomerId, "customer");
id_type!(DriverId, "driver");
id_type!(OrderId, "order");
