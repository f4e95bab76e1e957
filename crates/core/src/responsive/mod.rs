//! Sensor-responsive layers.
//!
//! Headset samples are noisy and arrive irregularly at roughly one per
//! second. Fed straight into a layer they make the output pop visibly on
//! every sample, so responsive layers run each reading through a two-stage
//! smoother: a windowed mean suppresses the noise, and a one-second fade
//! between successive means hides the step to the next value.

use std::collections::VecDeque;

use crate::frame::{Color, EffectParameters, Frame, SensorMetric};
use crate::layer::{EffectLayer, DEFAULT_TRANSITION_FADE_TIME};
use crate::model::Model;
use crate::Result;

/// Duration of the fade between successive smoothed values. Readings are
/// assumed to arrive at ~1 Hz, so the fade spans the gap to the next one.
const READING_FADE_SECS: f64 = 1.0;

/// Turns the once-per-second sensor reading stream into a continuously
/// interpolated response level.
///
/// The smoother keeps a newest-first history of (measurement, timestamp)
/// pairs for one metric. Each new reading is averaged with the rest of the
/// window and the emitted level fades linearly toward that mean over the
/// following second. While no reading has ever been seen the level is
/// `None`, which renderers treat as an explicit "no signal" state.
#[derive(Debug, Clone)]
pub struct SensorSmoother {
    metric: SensorMetric,
    window_secs: f64,
    history: VecDeque<(f32, f64)>,
    last_sequence: Option<u64>,
    last_response_level: Option<f32>,
    fading_to: Option<f32>,
}

impl SensorSmoother {
    /// Creates a smoother tracking `metric`, averaging readings over
    /// `window_secs` seconds.
    pub fn new(metric: SensorMetric, window_secs: f64) -> Self {
        Self {
            metric,
            window_secs,
            history: VecDeque::new(),
            last_sequence: None,
            last_response_level: None,
            fading_to: None,
        }
    }

    pub fn metric(&self) -> SensorMetric {
        self.metric
    }

    /// Consumes one frame's parameters and returns the response level to
    /// render with, or `None` while no signal has ever been seen.
    pub fn update(&mut self, params: &EffectParameters) -> Option<f32> {
        let now = params.time;
        let fresh = params
            .sensor
            .filter(|reading| reading.on && self.last_sequence != Some(reading.sequence));

        if let Some(reading) = fresh {
            // A fresh reading always resolves a fade still in flight first.
            self.end_fade();
            self.last_sequence = Some(reading.sequence);
            self.history.push_front((reading.value(self.metric), now));
            self.trim();

            let mean = self.history.iter().map(|(value, _)| value).sum::<f32>()
                / self.history.len() as f32;
            if self.history.len() > 1 {
                self.start_fade(mean);
            } else {
                // The first reading ever: take it as the level outright.
                self.last_response_level = Some(mean);
            }
            self.last_response_level
        } else if let (Some(target), Some(current)) = (self.fading_to, self.last_response_level) {
            let elapsed = now - self.fade_anchor(now);
            if elapsed >= READING_FADE_SECS {
                self.end_fade();
                self.last_response_level
            } else {
                let progress = elapsed as f32;
                Some(progress * target + (1.0 - progress) * current)
            }
        } else {
            self.last_response_level
        }
    }

    /// Timestamp of the newest measurement, which anchors the cross-sample
    /// fade.
    fn fade_anchor(&self, fallback: f64) -> f64 {
        self.history
            .front()
            .map(|(_, timestamp)| *timestamp)
            .unwrap_or(fallback)
    }

    /// Drops history older than the smoothing window. Walking newest to
    /// oldest, the first entry whose age exceeds the window is retained
    /// along with everything newer; entries past it are dropped.
    fn trim(&mut self) {
        let newest = match self.history.front() {
            Some((_, timestamp)) => *timestamp,
            None => return,
        };
        if let Some(cut) = self
            .history
            .iter()
            .position(|(_, timestamp)| newest - timestamp > self.window_secs)
        {
            self.history.truncate(cut + 1);
        }
    }

    fn start_fade(&mut self, new_level: f32) {
        if self.last_response_level.is_none() {
            self.last_response_level = Some(new_level);
        } else {
            self.fading_to = Some(new_level);
        }
    }

    fn end_fade(&mut self) {
        if let Some(target) = self.fading_to.take() {
            self.last_response_level = Some(target);
        }
    }
}

/// Rendering half of a responsive layer.
///
/// Implementors receive the smoothed response level alongside the usual
/// layer inputs: `Some` once the smoother has resolved a level, `None` while
/// no signal has ever been seen.
pub trait ResponsiveRender {
    fn render_responsive(
        &mut self,
        model: &Model,
        params: &EffectParameters,
        frame: &mut Frame,
        level: Option<f32>,
    ) -> Result<()>;

    /// See [`EffectLayer::transition_fade_time`].
    fn transition_fade_time(&self) -> f64 {
        DEFAULT_TRANSITION_FADE_TIME
    }
}

/// Couples a [`SensorSmoother`] with a [`ResponsiveRender`] implementation,
/// forming a complete [`EffectLayer`].
pub struct Responsive<R> {
    smoother: SensorSmoother,
    inner: R,
}

impl<R: ResponsiveRender> Responsive<R> {
    pub fn new(metric: SensorMetric, window_secs: f64, inner: R) -> Self {
        Self {
            smoother: SensorSmoother::new(metric, window_secs),
            inner,
        }
    }
}

impl<R: ResponsiveRender> EffectLayer for Responsive<R> {
    fn render(
        &mut self,
        model: &Model,
        params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        let level = self.smoother.update(params);
        self.inner.render_responsive(model, params, frame, level)
    }

    fn transition_fade_time(&self) -> f64 {
        self.inner.transition_fade_time()
    }
}

/// Blends between two colors by the response level: the low color at 0, the
/// high color at 1, interpolating in between. While no signal has been seen
/// a distinct no-signal color is rendered instead.
#[derive(Debug, Clone)]
pub struct SignalDuotoneLayer {
    low: Color,
    high: Color,
    no_signal: Color,
}

impl SignalDuotoneLayer {
    /// The classic scheme: red when the metric is low, green when high,
    /// blue while there is no signal.
    pub fn new(low: Color, high: Color) -> Self {
        Self {
            low,
            high,
            no_signal: [0.0, 0.0, 1.0],
        }
    }

    pub fn with_no_signal_color(mut self, color: Color) -> Self {
        self.no_signal = color;
        self
    }
}

impl ResponsiveRender for SignalDuotoneLayer {
    fn render_responsive(
        &mut self,
        _model: &Model,
        _params: &EffectParameters,
        frame: &mut Frame,
        level: Option<f32>,
    ) -> Result<()> {
        match level {
            None => frame.add_color(self.no_signal),
            Some(level) => {
                let mut blend = [0.0; 3];
                for (channel, value) in blend.iter_mut().enumerate() {
                    *value = self.low[channel] * (1.0 - level) + self.high[channel] * level;
                }
                frame.add_color(blend);
            }
        }
        Ok(())
    }
}
