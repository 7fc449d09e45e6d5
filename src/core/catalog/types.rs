//! Row types for the catalog tables.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `images.image_category`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageCategory {
    General,
    Mask,
    Control,
    User,
    Other,
}

impl ImageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Mask => "mask",
            Self::Control => "control",
            Self::User => "user",
            Self::Other => "other",
        }
    }
}

/// `images.image_origin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrigin {
    Internal,
    External,
}

impl ImageOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }
}

/// The pair of fields reclassification rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: ImageCategory,
    pub origin: ImageOrigin,
}

impl Classification {
    /// Uploaded asset: `user` / `external`
    pub const ASSET: Classification = Classification {
        category: ImageCategory::User,
        origin: ImageOrigin::External,
    };

    /// Regular generated image: `general` / `internal`
    pub const GENERAL: Classification = Classification {
        category: ImageCategory::General,
        origin: ImageOrigin::Internal,
    };
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category.as_str(), self.origin.as_str())
    }
}

/// A row of `boards`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub board_id: String,
    pub board_name: String,
    pub created_at: Option<String>,
}

/// A row to insert into `images`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewImage {
    pub image_name: String,
    pub classification: Classification,
    pub is_intermediate: bool,
    pub width: u32,
    pub height: u32,
    /// Opaque generation parameters
    pub metadata: Option<String>,
    pub has_workflow: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Outcome of a batched classification update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdate {
    /// Rows matched and rewritten
    pub updated: usize,
    /// Names with no row in `images`
    pub skipped: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_values_match_invokeai() {
        assert_eq!(ImageCategory::User.as_str(), "user");
        assert_eq!(ImageCategory::General.as_str(), "general");
        assert_eq!(ImageOrigin::External.as_str(), "external");
        assert_eq!(ImageOrigin::Internal.as_str(), "internal");
    }

    #[test]
    fn classification_display() {
        assert_eq!(Classification::ASSET.to_string(), "user/external");
        assert_eq!(Classification::GENERAL.to_string(), "general/internal");
    }
}
