#![forbid(unsafe_code)]
//! Deterministic animated landing stage.
//!
//! An intro flight of actors, a hand-drawn reveal of a vector illustration, ambient light and
//! particle layers, and a periodic cinematic light/dark theme switch. Everything runs off one
//! owned clock and is rasterized on the CPU.

pub mod animation;
pub mod assets;
pub mod foundation;
pub mod layers;
pub mod render;
pub mod stage;
pub mod theme;

pub use animation::{
    clock::FrameClock,
    ease::Ease,
    timeline::Timeline,
    timer::{Fired, TimerId, TimerQueue},
    tween::{Lerp, Repeat, Tween},
};
pub use assets::{
    AssetSource, FsAssetSource, InlineAssetSource,
    preload::{PreloadOutcome, Preloader},
    svg::RevealArtwork,
};
#[cfg(feature = "http")]
pub use assets::HttpAssetSource;
pub use foundation::{
    color::Color,
    core::{Fps, Rgba8Premul, Viewport, VisualProps},
    error::{AssetError, StageError, StageResult},
};
pub use layers::{
    Layer,
    ambient::{
        CloudBandsConfig, CloudBandsLayer, RayOrigin, SparkleDustConfig, SparkleDustLayer,
        SunHaloConfig, SunHaloLayer, SunRaysConfig, SunRaysLayer,
    },
    fireworks::{FireworksConfig, FireworksLayer},
    intro::{IntroConfig, IntroEvent, IntroLayer},
    loading::{LoadingDecorConfig, LoadingDecorLayer},
    reveal::{EffectTarget, EffectTargets, RevealConfig, RevealEvent, RevealLayer, RevealPhase},
    theme::{SwitcherEvent, SwitcherState, ThemeSwitcher, ThemeSwitcherConfig},
};
pub use render::{
    CanvasSurface, CpuRenderer, DisplayList, DrawOp, FrameRGBA, ShapedText, TextEngine,
};
pub use stage::{Stage, StageConfig, StageEvent, StageFlags};
pub use theme::{FileThemeStore, MemoryThemeStore, Theme, ThemeCell, ThemeStore};
