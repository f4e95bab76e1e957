//! Core compositing and transition engine for the Luminaire LED
//! installation.
//!
//! The crate turns generative visual layers into per-frame color buffers:
//! layers are grouped into [`Scene`]s, scenes into [`Playlist`]s, and a
//! [`Renderer`] drives the active selection, crossfading whenever the
//! selection or the active playlist changes. Layers can additionally respond
//! to a smoothed brainwave-headset signal through the [`responsive`] module.
//!
//! The engine is single-threaded and synchronous: the driving loop supplies
//! fresh [`EffectParameters`] each tick, the renderer produces exactly one
//! finished frame per call, and the caller forwards the buffer to the
//! hardware boundary. Sensor acquisition and output-format conversion live
//! outside this crate.

pub mod config;
pub mod effects;
pub mod error;
pub mod fade;
pub mod frame;
pub mod layer;
pub mod model;
pub mod playlist;
pub mod renderer;
pub mod responsive;
pub mod scene;

pub use config::RendererConfig;
pub use effects::{
    BlinkyLayer, DigitalRainLayer, GammaLayer, MultiplierLayer, PlasmaLayer, PositionColorLayer,
    SnowstormLayer, SolidColorLayer, TechnicolorSnowstormLayer, WavesLayer, WhiteOutLayer,
};
pub use error::{LuminaireError, Result};
pub use fade::{Fade, LinearFade, TwoStepFade};
pub use frame::{Color, EffectParameters, Frame, SensorMetric, SensorReading};
pub use layer::EffectLayer;
pub use model::Model;
pub use playlist::Playlist;
pub use renderer::Renderer;
pub use responsive::{Responsive, ResponsiveRender, SensorSmoother, SignalDuotoneLayer};
pub use scene::{Scene, SharedScene};
