use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of media a post holds, derived from the declared content type of the
/// uploaded file. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Video,
}

impl FileType {
    /// Anything declared `video/*` is a video; everything else is an image.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("video/") {
            Self::Video
        } else {
            Self::Image
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub caption: String,
    pub url: String,
    pub file_type: FileType,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_content_types_map_to_video() {
        assert_eq!(FileType::from_content_type("video/mp4"), FileType::Video);
        assert_eq!(FileType::from_content_type("video/webm"), FileType::Video);
    }

    #[test]
    fn everything_else_maps_to_image() {
        assert_eq!(FileType::from_content_type("image/jpeg"), FileType::Image);
        assert_eq!(FileType::from_content_type("image/png"), FileType::Image);
        assert_eq!(FileType::from_content_type(""), FileType::Image);
        assert_eq!(
            FileType::from_content_type("application/octet-stream"),
            FileType::Image
        );
    }

    #[test]
    fn file_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FileType::Image).unwrap(),
            "\"image\""
        );
        assert_eq!(
            serde_json::to_string(&FileType::Video).unwrap(),
            "\"video\""
        );
    }
}
