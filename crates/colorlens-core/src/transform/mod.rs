//! Color transforms: descriptors, the simulator seam, and in-place application.

pub mod apply;
pub mod params;
pub mod simulate;
