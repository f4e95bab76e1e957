//! Transition state machines that blend between two scenes over time.
//!
//! A fade is installed by the renderer when the selected scene changes and
//! is driven once per frame until it reports done. Fades hold nothing but
//! scene references, so replacing one mid-flight needs no teardown.

use crate::frame::{EffectParameters, Frame};
use crate::model::Model;
use crate::scene::SharedScene;

/// A linear crossfade between two optional scenes.
///
/// Each call renders the end scene into the output frame. While the fade is
/// in progress the frame is scaled by the completed fraction; the start
/// scene is rendered into a zeroed scratch buffer, scaled by the remaining
/// fraction, and added in, so the end scene's weight rises from 0 to 1 as
/// the start scene's falls. An absent scene contributes nothing, which yields
/// fade-from-black and fade-to-black. The clock starts on the first render
/// call, not at construction.
#[derive(Debug)]
pub struct LinearFade {
    start: Option<SharedScene>,
    end: Option<SharedScene>,
    duration: f64,
    begun_at: Option<f64>,
    done: bool,
}

impl LinearFade {
    pub fn new(start: Option<SharedScene>, end: Option<SharedScene>, duration: f64) -> Self {
        Self {
            start,
            end,
            duration,
            begun_at: None,
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn render(&mut self, model: &Model, params: &EffectParameters, frame: &mut Frame) {
        let begun_at = *self.begun_at.get_or_insert(params.time);
        if let Some(end) = &self.end {
            end.render_into(model, params, frame);
        }

        let progress = if self.duration > 0.0 {
            (params.time - begun_at) / self.duration
        } else {
            1.0
        };
        if progress >= 1.0 {
            // The frame already holds the fully rendered end scene.
            self.done = true;
        } else {
            frame.scale(progress as f32);
            if let Some(start) = &self.start {
                let mut outgoing = Frame::new(frame.len());
                start.render_into(model, params, &mut outgoing);
                outgoing.scale((1.0 - progress) as f32);
                frame.add(&outgoing);
            }
        }
    }
}

/// Runs one fade to completion, then a second. Only one of the two sub-fades
/// ever touches the frame in a given call.
#[derive(Debug)]
pub struct TwoStepFade {
    first: LinearFade,
    second: LinearFade,
    done: bool,
}

impl TwoStepFade {
    pub fn new(first: LinearFade, second: LinearFade) -> Self {
        Self {
            first,
            second,
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn render(&mut self, model: &Model, params: &EffectParameters, frame: &mut Frame) {
        if !self.first.is_done() {
            self.first.render(model, params, frame);
        } else {
            self.second.render(model, params, frame);
            self.done = self.second.is_done();
        }
    }
}

/// A transition in flight. The renderer owns at most one; a new transition
/// request replaces it outright, with no blending from the interrupted
/// state.
#[derive(Debug)]
pub enum Fade {
    Linear(LinearFade),
    TwoStep(TwoStepFade),
}

impl Fade {
    /// Direct crossfade between two scenes. Either side may be absent to
    /// fade from or to black.
    pub fn linear(start: Option<SharedScene>, end: Option<SharedScene>, duration: f64) -> Self {
        Fade::Linear(LinearFade::new(start, end, duration))
    }

    /// Fades the start scene out to black, then the end scene in from
    /// black. Cheaper than a direct crossfade, since the two scenes are
    /// never composited within the same frame, at the cost of a visible dip.
    pub fn fast(start: SharedScene, end: SharedScene, duration: f64) -> Self {
        Fade::TwoStep(TwoStepFade::new(
            LinearFade::new(Some(start), None, duration / 2.0),
            LinearFade::new(None, Some(end), duration / 2.0),
        ))
    }

    /// Crossfades to an intermediate scene, dwells on it for the second
    /// leg's duration, and crossfades on to the final scene. Useful for
    /// making something brief and dramatic happen on the way.
    pub fn two_step_linear(
        current: SharedScene,
        middle: SharedScene,
        target: SharedScene,
        first_duration: f64,
        second_duration: f64,
    ) -> Self {
        Fade::TwoStep(TwoStepFade::new(
            LinearFade::new(Some(current), Some(middle.clone()), first_duration),
            LinearFade::new(Some(middle), Some(target), second_duration),
        ))
    }

    pub fn render(&mut self, model: &Model, params: &EffectParameters, frame: &mut Frame) {
        match self {
            Fade::Linear(fade) => fade.render(model, params, frame),
            Fade::TwoStep(fade) => fade.render(model, params, frame),
        }
    }

    pub fn is_done(&self) -> bool {
        match self {
            Fade::Linear(fade) => fade.is_done(),
            Fade::TwoStep(fade) => fade.is_done(),
        }
    }
}
