//! User profile, favorite location and car models.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// User profile stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    /// Firebase uid (document ID)
    #[serde(default, alias = "_firestore_id", skip_serializing)]
    pub uid: String,
    /// Email address (may be None if the sign-in provider hides it)
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Name shown on the leaderboard: the local part of the email, or the uid.
    pub fn display_name(&self) -> String {
        display_name(&self.uid, self.email.as_deref())
    }
}

/// Derive a display name from an optional email address.
fn display_name(uid: &str, email: Option<&str>) -> String {
    email
        .and_then(|e| e.split('@').next())
        .map(str::trim)
        .filter(|local| !local.is_empty())
        .unwrap_or(uid)
        .to_string()
}

/// A saved place (`fav-locations`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteLocation {
    #[serde(default, alias = "_firestore_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub uid: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(length(max = 300))]
    pub address: Option<String>,
}

/// A car in the user's garage (`cars1`).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    #[serde(default, alias = "_firestore_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub uid: String,
    #[validate(length(min = 1, max = 50))]
    pub make: String,
    #[validate(length(min = 1, max = 50))]
    pub model: String,
    #[validate(range(min = 1886, max = 2100))]
    pub year: Option<u16>,
    #[validate(length(max = 20))]
    pub plate: Option<String>,
    /// Bluetooth address of the paired OBD-II adapter
    #[validate(length(max = 17))]
    pub obd_device_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_from_email() {
        assert_eq!(display_name("uid-1", Some("jane.doe@example.com")), "jane.doe");

        let user = User {
            uid: "uid-2".to_string(),
            email: Some("Max@example.com".to_string()),
        };
        assert_eq!(user.display_name(), "Max");
    }

    #[test]
    fn test_display_name_falls_back_to_uid() {
        assert_eq!(display_name("uid-1", None), "uid-1");
        assert_eq!(display_name("uid-1", Some("@example.com")), "uid-1");
    }

    #[test]
    fn test_favorite_validation() {
        let favorite = FavoriteLocation {
            id: None,
            uid: "u".to_string(),
            name: String::new(),
            latitude: 91.0,
            longitude: 0.0,
            address: None,
        };
        let errors = favorite.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("latitude"));
    }
}
