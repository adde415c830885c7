//! ColorLens core: pixel plumbing and color naming behind the mobile app.
//!
//! This crate owns the host-format codec, the color-vision-deficiency
//! transform and its pipeline, and the palette-backed color classifier.
//! It has no platform or FFI dependencies; `colorlens-ffi` adapts it to C.

pub mod assets;
pub mod classify;
pub mod codec;
pub mod config;
pub mod error;
pub mod host;
pub mod image;
pub mod labels;
pub mod pipeline;
pub mod service;
pub mod transform;

// Re-exports for convenience.
pub use assets::{AssetStorage, DirAssetStorage};
pub use classify::{ColorClassifier, ColorPrediction};
pub use config::ColorLensConfig;
pub use error::{ColorLensError, Result};
pub use host::{HostImage, MemoryImage};
pub use image::{CanonicalBuffer, ImageInfo, ImageView, PixelFormat};
pub use labels::{ColorLabel, PaletteStore, ReferencePalette};
pub use pipeline::{BitmapTransformPipeline, FormatPolicy, ProcessReport};
pub use service::{ColorLens, ModelSummary};
pub use transform::apply::ColorTransform;
pub use transform::params::{Deficiency, TransformDescriptor, TransformKind};
pub use transform::simulate::{CvdSimulator, MachadoSimulator};
