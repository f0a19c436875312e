//! In-memory asset library.
//!
//! The editor ships with an empty library by default; [`AssetCatalog::demo`]
//! seeds it with placeholder poses and images for local development.

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, AssetId, CombinedAsset, Pose};

const DEMO_POSES: &[(&str, &str, &str)] = &[
    ("Standing", "standing", "https://picsum.photos/800/800?random=21"),
    ("Waving", "waving", "https://picsum.photos/1920/1080?random=22"),
    ("Sitting", "sitting", "https://picsum.photos/1080/1920?random=23"),
    ("Thinking", "thinking", "https://picsum.photos/1600/1200?random=24"),
    ("Running", "running", "https://picsum.photos/1200/1600?random=25"),
    ("Jumping", "jumping", "https://picsum.photos/300/300?random=26"),
];

const DEMO_IMAGES: &[(&str, &str)] = &[
    ("Sample image 1", "https://picsum.photos/800/800?random=1"),
    ("Sample image 2", "https://picsum.photos/1920/1080?random=2"),
    ("Sample image 3", "https://picsum.photos/1080/1920?random=3"),
    ("Sample image 4", "https://picsum.photos/1600/1200?random=4"),
    ("Sample image 5", "https://picsum.photos/1200/1600?random=5"),
];

/// The selectable poses and images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCatalog {
    poses: Vec<Pose>,
    images: Vec<Asset>,
}

impl AssetCatalog {
    /// Create the default (empty) library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library seeded with the demo poses and images.
    #[must_use]
    pub fn demo() -> Self {
        let poses = DEMO_POSES
            .iter()
            .zip(1..)
            .map(|(&(name, pose_id, thumbnail), id)| Pose::new(id, name, pose_id, thumbnail))
            .collect();
        let images = DEMO_IMAGES
            .iter()
            .zip(1..)
            .map(|(&(name, url), id)| Asset::new(id, name, url))
            .collect();
        Self { poses, images }
    }

    /// Build a library from explicit lists.
    #[must_use]
    pub fn from_parts(poses: Vec<Pose>, images: Vec<Asset>) -> Self {
        Self { poses, images }
    }

    /// All poses in insertion order.
    #[must_use]
    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    /// All images in insertion order.
    #[must_use]
    pub fn images(&self) -> &[Asset] {
        &self.images
    }

    /// Poses followed by images, as shown in the library panel.
    pub fn combined(&self) -> impl Iterator<Item = CombinedAsset> + '_ {
        self.poses
            .iter()
            .cloned()
            .map(CombinedAsset::Pose)
            .chain(self.images.iter().cloned().map(CombinedAsset::Image))
    }

    /// Find an image by id.
    #[must_use]
    pub fn find_image(&self, id: AssetId) -> Option<&Asset> {
        self.images.iter().find(|asset| asset.id() == id)
    }

    /// Find a pose by id.
    #[must_use]
    pub fn find_pose(&self, id: AssetId) -> Option<&Pose> {
        self.poses.iter().find(|pose| pose.id() == id)
    }

    /// Register an image the user uploaded and return it.
    ///
    /// The new asset takes the next id after the highest image id.
    pub fn add_uploaded_image(&mut self, name: impl Into<String>, url: impl Into<String>) -> Asset {
        let id = self.images.iter().map(Asset::id).max().unwrap_or(0) + 1;
        let asset = Asset::user_uploaded(id, name, url);
        tracing::debug!(asset_id = id, "Added user-uploaded image to catalog");
        self.images.push(asset.clone());
        asset
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.poses.len() + self.images.len()
    }

    /// Whether the library has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty() && self.images.is_empty()
    }
}
