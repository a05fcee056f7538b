pub mod clock;
pub mod ease;
pub mod timeline;
pub mod timer;
pub mod tween;
