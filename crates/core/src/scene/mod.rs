use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::frame::{EffectParameters, Frame};
use crate::layer::{EffectLayer, DEFAULT_TRANSITION_FADE_TIME};
use crate::model::Model;

/// An ordered list of effect layers rendered together into one frame. Later
/// layers composite atop the accumulated contribution of earlier ones.
///
/// The layer list is immutable once the scene is built, but individual
/// layers mutate their own animation state while rendering, hence the
/// interior mutability.
pub struct Scene {
    layers: Vec<RefCell<Box<dyn EffectLayer>>>,
}

/// Shared handle to a scene. Playlists and any in-flight fade alias the same
/// scene instance, so its per-layer state (noise phases, smoothing history)
/// carries across transitions.
pub type SharedScene = Rc<Scene>;

impl Scene {
    pub fn new(layers: Vec<Box<dyn EffectLayer>>) -> Self {
        Self {
            layers: layers.into_iter().map(RefCell::new).collect(),
        }
    }

    /// Convenience constructor returning the shared handle directly.
    pub fn shared(layers: Vec<Box<dyn EffectLayer>>) -> SharedScene {
        Rc::new(Self::new(layers))
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Renders every layer in order into `frame`.
    ///
    /// A layer that reports an error is logged and skipped for this frame;
    /// the remaining layers still run, and the call never fails.
    pub fn render_into(&self, model: &Model, params: &EffectParameters, frame: &mut Frame) {
        for (index, layer) in self.layers.iter().enumerate() {
            if let Err(error) = layer.borrow_mut().render(model, params, frame) {
                tracing::warn!(layer = index, %error, "layer failed to render, skipping");
            }
        }
    }

    /// Longest recommended transition dwell declared by any layer in this
    /// scene.
    pub fn transition_fade_time(&self) -> f64 {
        self.layers
            .iter()
            .map(|layer| layer.borrow().transition_fade_time())
            .fold(DEFAULT_TRANSITION_FADE_TIME, f64::max)
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("layers", &self.layers.len())
            .finish()
    }
}
