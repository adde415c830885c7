//! [`ColorLens`]: the owned state behind every boundary call.
//!
//! One instance holds the palette store, classifier and pipeline. Hosts
//! create it explicitly; there is no process-wide state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::assets::AssetStorage;
use crate::classify::{ColorClassifier, ColorPrediction};
use crate::config::ColorLensConfig;
use crate::error::{ColorLensError, Result};
use crate::host::HostImage;
use crate::labels::{PaletteStore, ReferencePalette};
use crate::pipeline::{BitmapTransformPipeline, ProcessReport};
use crate::transform::apply::ColorTransform;
use crate::transform::params::TransformDescriptor;
use crate::transform::simulate::{CvdSimulator, MachadoSimulator};

/// Outcome of a successful `init_model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSummary {
    /// Size of the model asset in bytes.
    pub model_bytes: usize,
    /// Label count after loading, or `None` if the label asset was absent
    /// and the previous palette was kept.
    pub labels: Option<usize>,
}

#[derive(Debug)]
pub struct ColorLens {
    config: ColorLensConfig,
    store: Arc<PaletteStore>,
    classifier: ColorClassifier,
    pipeline: BitmapTransformPipeline,
    model_bytes: AtomicUsize,
}

impl ColorLens {
    pub fn new(config: ColorLensConfig) -> Self {
        Self::with_simulator(config, Arc::new(MachadoSimulator))
    }

    /// Use a third-party simulator in place of the bundled one.
    pub fn with_simulator(config: ColorLensConfig, simulator: Arc<dyn CvdSimulator>) -> Self {
        let store = Arc::new(PaletteStore::default());
        let pipeline =
            BitmapTransformPipeline::new(ColorTransform::new(simulator), config.format_policy);
        Self {
            classifier: ColorClassifier::new(Arc::clone(&store)),
            store,
            pipeline,
            config,
            model_bytes: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &ColorLensConfig {
        &self.config
    }

    pub fn palette_store(&self) -> &Arc<PaletteStore> {
        &self.store
    }

    pub fn pipeline(&self) -> &BitmapTransformPipeline {
        &self.pipeline
    }

    /// Whether `init_model` has succeeded at least once.
    pub fn is_initialized(&self) -> bool {
        self.model_bytes.load(Ordering::Acquire) > 0
    }

    /// Read the model asset and (re)load the label palette.
    ///
    /// The model asset must exist and be non-empty. A missing label asset, or
    /// one that yields no labels, is not an error: the current palette is
    /// kept. Other label read failures are returned.
    pub fn init_model(&self, storage: &dyn AssetStorage, asset_name: &str) -> Result<ModelSummary> {
        let model = storage.read(asset_name)?;
        if model.is_empty() {
            return Err(ColorLensError::AssetNotFound(format!(
                "{asset_name} is empty"
            )));
        }
        tracing::info!("loaded model asset {asset_name} size={}", model.len());

        let labels = match storage.read(&self.config.palette_asset) {
            Ok(bytes) => {
                let palette = ReferencePalette::parse(&bytes);
                if palette.is_empty() {
                    tracing::info!("no labels loaded: {} has no labels", self.config.palette_asset);
                    None
                } else {
                    let count = palette.len();
                    self.store.replace(palette);
                    tracing::info!("loaded {count} labels");
                    Some(count)
                }
            }
            Err(ColorLensError::AssetNotFound(name)) => {
                tracing::info!("no labels loaded: {name} not found");
                None
            }
            Err(e) => return Err(e),
        };

        self.model_bytes.store(model.len(), Ordering::Release);
        Ok(ModelSummary {
            model_bytes: model.len(),
            labels,
        })
    }

    /// Replace the palette from raw label bytes. Returns the label count.
    pub fn reload_palette(&self, bytes: &[u8]) -> usize {
        self.store.load(bytes)
    }

    /// Name a normalized RGB color. Never fails.
    pub fn classify(&self, r: f32, g: f32, b: f32) -> ColorPrediction {
        self.classifier.classify(r, g, b)
    }

    /// Simulate `deficiency` (host code) on `host` in place.
    pub fn process_bitmap<H: HostImage + ?Sized>(
        &self,
        host: &mut H,
        deficiency: i32,
        severity: f32,
    ) -> Result<ProcessReport> {
        let descriptor = TransformDescriptor::from_host(deficiency, severity)?;
        self.pipeline.process(host, &descriptor)
    }

    /// Classify the pixel nearest the normalized coordinate `(nx, ny)`.
    pub fn sample<H: HostImage + ?Sized>(
        &self,
        host: &mut H,
        nx: f32,
        ny: f32,
    ) -> Result<ColorPrediction> {
        let [r, g, b, _] = self.pipeline.sample(host, nx, ny)?;
        Ok(self.classifier.classify_rgb8([r, g, b]))
    }
}

impl Default for ColorLens {
    fn default() -> Self {
        Self::new(ColorLensConfig::default())
    }
}
