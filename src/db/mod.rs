//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TRIPS: &str = "trips";
    /// User stats aggregates (keyed by uid)
    pub const USER_STATS: &str = "user-stats";
    pub const FAV_LOCATIONS: &str = "fav-locations";
    pub const CARS: &str = "cars1";
}
