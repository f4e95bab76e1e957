use crate::frame::{EffectParameters, Frame};
use crate::model::Model;
use crate::Result;

/// Recommended transition dwell, in seconds, for layers that do not declare
/// their own.
pub const DEFAULT_TRANSITION_FADE_TIME: f64 = 1.0;

/// One layer of an LED light effect.
///
/// Layers operate on a shared framebuffer, adding their own contribution to
/// the buffer and possibly blending or overlaying with data from prior
/// layers; they must not assume the buffer arrives zeroed. The `frame`
/// passed to [`render`](EffectLayer::render) holds one RGB triple per LED in
/// the same order as the identifiers recognized by the `model`, with
/// components in a normalized [0, 1] brightness range. Components pushed
/// beyond that range are clamped later, during conversion to the hardware
/// color format.
///
/// Layers may keep per-instance animation state; `render` is called once per
/// frame with a fresh set of parameters.
pub trait EffectLayer {
    /// Accumulates this layer's contribution for one frame.
    ///
    /// An error is reported to the scene, which logs it and skips the layer
    /// for this frame rather than aborting the render.
    fn render(
        &mut self,
        model: &Model,
        params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()>;

    /// How long, in seconds, a transition should dwell on this layer when
    /// its scene is used as the intermediate step of a playlist swap.
    fn transition_fade_time(&self) -> f64 {
        DEFAULT_TRANSITION_FADE_TIME
    }
}
