//! Visual layers mounted by the stage.
//!
//! Every layer owns its animation state exclusively. The stage drives all of them with the same
//! `now` per tick and collects their draw ops into one display list.

use crate::{foundation::core::Viewport, render::display::DisplayList};

pub mod ambient;
pub mod fireworks;
pub mod intro;
pub mod loading;
pub mod reveal;
pub mod theme;

/// Common surface of a mounted layer.
pub trait Layer {
    fn name(&self) -> &'static str;

    fn z_index(&self) -> i32;

    /// Advance internal state to `now` (stage seconds).
    fn tick(&mut self, now: f64);

    /// Emit draw ops for the state reached by the last [`Layer::tick`].
    fn paint(&self, viewport: Viewport, list: &mut DisplayList);

    /// Cancel every timer and loop the layer started. Idempotent.
    fn teardown(&mut self);
}
