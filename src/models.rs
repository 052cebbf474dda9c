//! Defines the core data structures used in the tiktok-scout application.

use serde::Serialize;

/// Column headers of an exported collection, in output order.
pub(crate) const EXPORT_COLUMNS: [&str; 5] = ["Name", "Username", "Followers", "Likes", "Profile URL"];

/// The fields read for one profile by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScrapedProfile {
    /// Display name shown in the profile header.
    pub name: String,
    /// Handle taken from the profile URL (without the leading "@").
    pub username: String,
    /// Follower count as displayed, e.g. "1.2M".
    pub followers: String,
    /// Like count as displayed.
    pub likes: String,
}

/// One collected profile, as it appears in the collection and the export.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProfileRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Username")]
    pub username: String,
    /// Display-formatted, never parsed as a number.
    #[serde(rename = "Followers")]
    pub followers: String,
    #[serde(rename = "Likes")]
    pub likes: String,
    #[serde(rename = "Profile URL")]
    pub profile_url: String,
}

impl ProfileRecord {
    /// Builds a record from scraped fields and the URL they were read from.
    pub(crate) fn new(scraped: ScrapedProfile, profile_url: String) -> Self {
        Self {
            name: scraped.name,
            username: scraped.username,
            followers: scraped.followers,
            likes: scraped.likes,
            profile_url,
        }
    }

    /// The record's fields in export column order.
    pub(crate) fn to_row(&self) -> [&str; 5] {
        [
            &self.name,
            &self.username,
            &self.followers,
            &self.likes,
            &self.profile_url,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> ProfileRecord {
        ProfileRecord::new(
            ScrapedProfile {
                name: "Alice".to_string(),
                username: "alice".to_string(),
                followers: "1.2M".to_string(),
                likes: "50M".to_string(),
            },
            "https://www.tiktok.com/@alice".to_string(),
        )
    }

    #[test]
    fn test_row_follows_column_order() {
        assert_eq!(
            alice().to_row(),
            ["Alice", "alice", "1.2M", "50M", "https://www.tiktok.com/@alice"]
        );
    }

    #[test]
    fn test_json_uses_column_names() {
        let value = serde_json::to_value(alice()).unwrap();
        assert_eq!(value["Profile URL"], "https://www.tiktok.com/@alice");
        assert_eq!(value["Followers"], "1.2M");
    }
}
