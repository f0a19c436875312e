//! # Easel Core
//!
//! Data model for the Easel canvas editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 easel-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Asset Library   │  Canvas Model            │
//! │  - Images        │  - Elements (11 types)   │
//! │  - Poses         │  - Sessions              │
//! │  - Catalog       │  - Image formats         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The model performs no I/O. Uploading and image generation live in
//! `easel-aigc`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod catalog;
pub mod element;
pub mod error;
pub mod session;

pub use asset::{Asset, AssetId, CombinedAsset, Pose};
pub use catalog::AssetCatalog;
pub use element::{
    CanvasElement, ElementId, ElementKind, ElementType, Geometry, ImageFormat, Point,
    OCTET_STREAM,
};
pub use error::{CanvasError, CanvasResult};
pub use session::CanvasSession;

/// Easel core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
