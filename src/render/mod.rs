//! Display lists, text shaping, the CPU rasterizer and canvas surfaces.

pub mod cpu;
pub mod display;
pub mod surface;
pub mod text;

pub use cpu::{CpuRenderer, FrameRGBA};
pub use display::{DisplayItem, DisplayList, DrawOp, GlowStops};
pub use surface::CanvasSurface;
pub use text::{ShapedText, TextEngine};
