//! End-to-end pipeline behavior against instrumented host images.
//!
//! Run with: `cargo test -p colorlens-core`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use colorlens_core::{
    BitmapTransformPipeline, ColorLensError, ColorTransform, CvdSimulator, Deficiency, FormatPolicy,
    HostImage, ImageInfo, MemoryImage, PixelFormat, Result, TransformDescriptor,
};

/// Host image that counts lock traffic and can refuse to lock.
struct TrackingImage {
    inner: MemoryImage,
    deny_lock: bool,
    locks: usize,
    unlocks: usize,
}

impl TrackingImage {
    fn new(inner: MemoryImage) -> Self {
        Self {
            inner,
            deny_lock: false,
            locks: 0,
            unlocks: 0,
        }
    }
}

impl HostImage for TrackingImage {
    fn handle_id(&self) -> usize {
        self.inner.handle_id()
    }

    fn info(&self) -> Result<ImageInfo> {
        self.inner.info()
    }

    fn lock_pixels(&mut self) -> Result<()> {
        if self.deny_lock {
            return Err(ColorLensError::LockAcquisition("denied by host".into()));
        }
        self.locks += 1;
        self.inner.lock_pixels()
    }

    fn locked_pixels(&mut self) -> &mut [u8] {
        self.inner.locked_pixels()
    }

    fn unlock_pixels(&mut self) {
        self.unlocks += 1;
        self.inner.unlock_pixels();
    }
}

/// Simulator that panics if it is ever asked to run.
struct Unreachable;

impl CvdSimulator for Unreachable {
    fn simulate_pixel(&self, _: Deficiency, _: f32, _: [u8; 3]) -> [u8; 3] {
        panic!("simulator must not run");
    }
}

fn noise(width: u32, height: u32, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    (0..width * height * 4)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

#[test]
fn identity_is_byte_exact_for_every_format_and_stride() {
    let pipeline = BitmapTransformPipeline::default();
    for format in [
        PixelFormat::Rgba8888Bytes,
        PixelFormat::Argb8888Word,
        PixelFormat::Bgra8888Bytes,
    ] {
        for stride in [20usize, 28] {
            let info = ImageInfo {
                width: 5,
                height: 3,
                stride,
                format,
            };
            let bytes = noise(stride as u32, 3, stride as u32 + format.code());
            let bytes = bytes[..stride * 3].to_vec();
            let mut image = MemoryImage::new(info, bytes.clone());

            pipeline
                .process(&mut image, &TransformDescriptor::identity())
                .unwrap();
            assert_eq!(image.data(), &bytes[..], "{format} stride {stride}");
        }
    }
}

#[test]
fn lock_denied_performs_no_mutation_and_no_unlock() {
    let pipeline = BitmapTransformPipeline::default();
    let bytes = noise(4, 4, 7);
    let mut image = TrackingImage::new(MemoryImage::from_rgba(4, 4, bytes.clone()));
    image.deny_lock = true;

    let err = pipeline
        .process(&mut image, &TransformDescriptor::simulate(Deficiency::Protan, 1.0))
        .unwrap_err();

    assert!(matches!(err, ColorLensError::LockAcquisition(_)));
    assert_eq!((image.locks, image.unlocks), (0, 0));
    assert_eq!(image.inner.data(), &bytes[..]);

    // The in-flight slot was released: a retry with the lock available works.
    image.deny_lock = false;
    pipeline
        .process(&mut image, &TransformDescriptor::identity())
        .unwrap();
    assert_eq!((image.locks, image.unlocks), (1, 1));
}

#[test]
fn every_failure_after_locking_unlocks_exactly_once() {
    // Geometry error: the host claims more rows than it has bytes for.
    let info = ImageInfo::packed(4, 8, PixelFormat::Rgba8888Bytes);
    let mut short = TrackingImage::new(MemoryImage::new(info, vec![0; 16]));
    let pipeline = BitmapTransformPipeline::default();
    assert!(matches!(
        pipeline.process(&mut short, &TransformDescriptor::identity()),
        Err(ColorLensError::InvalidArgument(_))
    ));
    assert_eq!((short.locks, short.unlocks), (1, 1));
    assert!(!short.inner.is_locked());

    // Unsupported format under the strict policy fails before locking.
    let strict = BitmapTransformPipeline::new(ColorTransform::default(), FormatPolicy::Strict);
    let info = ImageInfo::packed(2, 2, PixelFormat::RgbaF16);
    let mut f16 = TrackingImage::new(MemoryImage::new(info, vec![0; 16]));
    assert!(matches!(
        strict.process(&mut f16, &TransformDescriptor::identity()),
        Err(ColorLensError::UnsupportedFormat { format: PixelFormat::RgbaF16 })
    ));
    assert_eq!((f16.locks, f16.unlocks), (0, 0));
}

#[test]
fn identity_never_calls_the_simulator() {
    let pipeline =
        BitmapTransformPipeline::new(ColorTransform::new(Arc::new(Unreachable)), FormatPolicy::Strict);
    let mut image = MemoryImage::from_rgba(3, 3, noise(3, 3, 11));
    pipeline
        .process(&mut image, &TransformDescriptor::identity())
        .unwrap();
}

#[test]
fn concurrent_distinct_handles_match_sequential() {
    let descriptors: Vec<TransformDescriptor> = Deficiency::all()
        .iter()
        .flat_map(|d| [0.3, 1.0].map(|s| TransformDescriptor::simulate(*d, s)))
        .collect();
    let inputs: Vec<Vec<u8>> = (0..descriptors.len() as u32)
        .map(|i| noise(32, 24, i + 1))
        .collect();

    let pipeline = BitmapTransformPipeline::default();
    let sequential: Vec<Vec<u8>> = inputs
        .iter()
        .zip(&descriptors)
        .map(|(bytes, desc)| {
            let mut image = MemoryImage::from_rgba(32, 24, bytes.clone());
            pipeline.process(&mut image, desc).unwrap();
            image.into_data()
        })
        .collect();

    let concurrent: Vec<Vec<u8>> = thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .zip(&descriptors)
            .map(|(bytes, desc)| {
                let pipeline = &pipeline;
                scope.spawn(move || {
                    let mut image = MemoryImage::from_rgba(32, 24, bytes.clone());
                    pipeline.process(&mut image, desc).unwrap();
                    image.into_data()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, concurrent);
}

#[test]
fn second_simulation_pass_changes_pixels_again() {
    // Simulation is not a projection: a second pass on the same handle
    // keeps moving colors while alpha stays put.
    let pipeline = BitmapTransformPipeline::default();
    let desc = TransformDescriptor::simulate(Deficiency::Tritan, 0.6);
    let mut image = MemoryImage::from_rgba(8, 8, noise(8, 8, 3));
    pipeline.process(&mut image, &desc).unwrap();
    let once = image.data().to_vec();
    pipeline.process(&mut image, &desc).unwrap();
    let twice = image.data();

    assert_ne!(twice, &once[..]);
    for (a, b) in once.chunks_exact(4).zip(twice.chunks_exact(4)) {
        assert_eq!(a[3], b[3]);
    }
}

/// Simulator slow enough that two calls overlap.
struct Slow;

impl CvdSimulator for Slow {
    fn simulate_pixel(&self, _: Deficiency, _: f32, [r, g, b]: [u8; 3]) -> [u8; 3] {
        thread::sleep(Duration::from_millis(2));
        [g, b, r]
    }
}

#[test]
fn cloned_image_processes_alongside_its_original() {
    let pipeline = BitmapTransformPipeline::new(ColorTransform::new(Arc::new(Slow)), FormatPolicy::Strict);
    let desc = TransformDescriptor::simulate(Deficiency::Protan, 1.0);
    let mut original = MemoryImage::from_rgba(4, 4, noise(4, 4, 9));
    let mut copy = original.clone();

    let (a, b) = thread::scope(|scope| {
        let pipeline = &pipeline;
        let desc = &desc;
        let a = scope.spawn(|| pipeline.process(&mut original, desc).map(|_| ()));
        let b = scope.spawn(|| pipeline.process(&mut copy, desc).map(|_| ()));
        (a.join().unwrap(), b.join().unwrap())
    });

    assert!(a.is_ok(), "{a:?}");
    assert!(b.is_ok(), "{b:?}");
    assert_eq!(original.data(), copy.data());
}
