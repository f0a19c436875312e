//! Library assets - images and poses the user can place on a canvas.
//!
//! Assets are immutable once created. The only flag that can be chosen at
//! construction time is whether the asset was uploaded by the user.

use serde::{Deserialize, Serialize};

/// Numeric identifier of a library asset.
pub type AssetId = u64;

/// An image in the asset library.
///
/// Serializes without a `type` field; the discriminant lives on
/// [`CombinedAsset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    id: AssetId,
    name: String,
    url: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    is_user_uploaded: bool,
}

impl Asset {
    /// Create a library image.
    #[must_use]
    pub fn new(id: AssetId, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
            is_user_uploaded: false,
        }
    }

    /// Create an image the user uploaded.
    #[must_use]
    pub fn user_uploaded(id: AssetId, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            is_user_uploaded: true,
            ..Self::new(id, name, url)
        }
    }

    /// Asset identifier.
    #[must_use]
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the user uploaded this image.
    #[must_use]
    pub fn is_user_uploaded(&self) -> bool {
        self.is_user_uploaded
    }
}

/// A preset human pose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    id: AssetId,
    name: String,
    pose_id: String,
    thumbnail: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    is_user_uploaded: bool,
}

impl Pose {
    /// Create a library pose.
    #[must_use]
    pub fn new(
        id: AssetId,
        name: impl Into<String>,
        pose_id: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            pose_id: pose_id.into(),
            thumbnail: thumbnail.into(),
            is_user_uploaded: false,
        }
    }

    /// Create a pose the user uploaded.
    #[must_use]
    pub fn user_uploaded(
        id: AssetId,
        name: impl Into<String>,
        pose_id: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        Self {
            is_user_uploaded: true,
            ..Self::new(id, name, pose_id, thumbnail)
        }
    }

    /// Asset identifier.
    #[must_use]
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pose key understood by the generation backend.
    #[must_use]
    pub fn pose_id(&self) -> &str {
        &self.pose_id
    }

    /// Preview image URL.
    #[must_use]
    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    /// Whether the user uploaded this pose.
    #[must_use]
    pub fn is_user_uploaded(&self) -> bool {
        self.is_user_uploaded
    }
}

/// Either kind of library entry, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CombinedAsset {
    /// An image asset (`"type": "image"`).
    Image(Asset),
    /// A pose asset (`"type": "pose"`).
    Pose(Pose),
}

impl CombinedAsset {
    /// Asset identifier. Images and poses have separate id spaces.
    #[must_use]
    pub fn id(&self) -> AssetId {
        match self {
            Self::Image(asset) => asset.id(),
            Self::Pose(pose) => pose.id(),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Image(asset) => asset.name(),
            Self::Pose(pose) => pose.name(),
        }
    }

    /// URL to show in a library grid.
    #[must_use]
    pub fn preview_url(&self) -> &str {
        match self {
            Self::Image(asset) => asset.url(),
            Self::Pose(pose) => pose.thumbnail(),
        }
    }

    /// Whether the user uploaded this entry.
    #[must_use]
    pub fn is_user_uploaded(&self) -> bool {
        match self {
            Self::Image(asset) => asset.is_user_uploaded(),
            Self::Pose(pose) => pose.is_user_uploaded(),
        }
    }
}

impl From<Asset> for CombinedAsset {
    fn from(asset: Asset) -> Self {
        Self::Image(asset)
    }
}

impl From<Pose> for CombinedAsset {
    fn from(pose: Pose) -> Self {
        Self::Pose(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_combined_asset_tagged_by_type() {
        let image: CombinedAsset = Asset::new(1, "Sample", "https://x/1.png").into();
        let value = serde_json::to_value(&image).expect("serialize");
        assert_eq!(
            value,
            json!({"type": "image", "id": 1, "name": "Sample", "url": "https://x/1.png"})
        );

        let pose: CombinedAsset = serde_json::from_value(json!({
            "type": "pose",
            "id": 3,
            "name": "Sitting",
            "poseId": "sitting",
            "thumbnail": "https://x/sit.png"
        }))
        .expect("deserialize");
        match pose {
            CombinedAsset::Pose(p) => {
                assert_eq!(p.pose_id(), "sitting");
                assert!(!p.is_user_uploaded());
            }
            CombinedAsset::Image(_) => panic!("expected pose"),
        }
    }

    #[test]
    fn test_user_uploaded_flag_round_trips() {
        let asset = Asset::user_uploaded(7, "Mine", "https://x/mine.png");
        let value = serde_json::to_value(&asset).expect("serialize");
        assert_eq!(value["isUserUploaded"], json!(true));

        let back: Asset = serde_json::from_value(value).expect("deserialize");
        assert!(back.is_user_uploaded());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<CombinedAsset, _> =
            serde_json::from_value(json!({"type": "video", "id": 1, "name": "x", "url": "y"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_preview_url_per_kind() {
        let pose: CombinedAsset = Pose::new(1, "Wave", "waving", "https://x/wave.png").into();
        assert_eq!(pose.preview_url(), "https://x/wave.png");
        let image: CombinedAsset = Asset::new(1, "Pic", "https://x/pic.png").into();
        assert_eq!(image.preview_url(), "https://x/pic.png");
    }
}
