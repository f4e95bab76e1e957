use serde::{Deserialize, Serialize};

/// One RGB triple. Components are floating point with a normalized
/// brightness range of [0, 1]. Values beyond that range are permitted while
/// layers composite; they are clamped during conversion to the hardware
/// color format, outside this crate.
pub type Color = [f32; 3];

/// Dense framebuffer holding one [`Color`] per LED, in the same order as the
/// identifiers used by the installation [`Model`](crate::Model).
///
/// Layers accumulate into the buffer rather than assuming it is zeroed; the
/// driving loop clears it between ticks. The arithmetic here (uniform scale,
/// element-wise add and multiply) is what the fades and the multiplier layer
/// are built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: Vec<Color>,
}

impl Frame {
    /// Creates a zeroed frame with one pixel per LED.
    pub fn new(led_count: usize) -> Self {
        Self {
            pixels: vec![[0.0; 3]; led_count],
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Resets every component to zero.
    pub fn clear(&mut self) {
        for pixel in &mut self.pixels {
            *pixel = [0.0; 3];
        }
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Multiplies every component by `factor`.
    pub fn scale(&mut self, factor: f32) {
        for pixel in &mut self.pixels {
            for component in pixel {
                *component *= factor;
            }
        }
    }

    /// Adds `other` element-wise into this frame.
    pub fn add(&mut self, other: &Frame) {
        for (pixel, rhs) in self.pixels.iter_mut().zip(&other.pixels) {
            for (component, value) in pixel.iter_mut().zip(rhs) {
                *component += value;
            }
        }
    }

    /// Multiplies this frame element-wise by `other`.
    pub fn multiply(&mut self, other: &Frame) {
        for (pixel, rhs) in self.pixels.iter_mut().zip(&other.pixels) {
            for (component, value) in pixel.iter_mut().zip(rhs) {
                *component *= value;
            }
        }
    }

    /// Adds `color` to every pixel.
    pub fn add_color(&mut self, color: Color) {
        for pixel in &mut self.pixels {
            for (component, value) in pixel.iter_mut().zip(&color) {
                *component += value;
            }
        }
    }
}

impl std::ops::Index<usize> for Frame {
    type Output = Color;

    fn index(&self, led: usize) -> &Color {
        &self.pixels[led]
    }
}

impl std::ops::IndexMut<usize> for Frame {
    fn index_mut(&mut self, led: usize) -> &mut Color {
        &mut self.pixels[led]
    }
}

/// Inputs to the individual effect layers for a single frame. Constructed
/// fresh by the driving loop each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectParameters {
    /// Timestamp of the frame being generated, in seconds. Stamped by the
    /// driving loop; every fade and smoothing computation in the engine
    /// measures elapsed time against it.
    pub time: f64,
    /// Frame rate the driving loop is aiming for. A hint, not enforced.
    pub target_frame_rate: f32,
    /// Most recent headset reading, if any has arrived yet.
    pub sensor: Option<SensorReading>,
}

impl EffectParameters {
    /// Parameters for a frame at the given timestamp, with no sensor data.
    pub fn at(time: f64) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            time: 0.0,
            target_frame_rate: 60.0,
            sensor: None,
        }
    }
}

/// The headset metrics a responsive layer can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorMetric {
    Attention,
    Meditation,
}

/// One processed headset sample. Attention and meditation are scaled to
/// [0, 1]; `on` reports whether the headset was actually being worn when the
/// sample was taken. Readings carry a monotonic sequence number so consumers
/// can tell a fresh sample from a re-delivered one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sequence: u64,
    pub attention: f32,
    pub meditation: f32,
    pub on: bool,
}

impl SensorReading {
    /// Returns the value of the requested metric.
    pub fn value(&self, metric: SensorMetric) -> f32 {
        match metric {
            SensorMetric::Attention => self.attention,
            SensorMetric::Meditation => self.meditation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_every_component() {
        let mut frame = Frame::new(2);
        frame[0] = [1.0, 0.5, 0.25];
        frame[1] = [0.0, 2.0, 4.0];

        frame.scale(0.5);

        assert_eq!(frame[0], [0.5, 0.25, 0.125]);
        assert_eq!(frame[1], [0.0, 1.0, 2.0]);
    }

    #[test]
    fn adds_element_wise() {
        let mut frame = Frame::new(1);
        frame[0] = [0.1, 0.2, 0.3];
        let mut other = Frame::new(1);
        other[0] = [0.4, 0.4, 0.4];

        frame.add(&other);

        for (component, expected) in frame[0].iter().zip([0.5, 0.6, 0.7]) {
            assert!((component - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn multiplies_element_wise() {
        let mut frame = Frame::new(1);
        frame[0] = [0.5, 0.5, 2.0];
        let mut other = Frame::new(1);
        other[0] = [0.5, 2.0, 0.25];

        frame.multiply(&other);

        assert_eq!(frame[0], [0.25, 1.0, 0.5]);
    }

    #[test]
    fn clears_to_zero() {
        let mut frame = Frame::new(3);
        frame.add_color([1.0, 1.0, 1.0]);
        frame.clear();

        assert!(frame.pixels().iter().all(|pixel| *pixel == [0.0; 3]));
    }

    #[test]
    fn reading_selects_metric() {
        let reading = SensorReading {
            sequence: 1,
            attention: 0.7,
            meditation: 0.2,
            on: true,
        };

        assert_eq!(reading.value(SensorMetric::Attention), 0.7);
        assert_eq!(reading.value(SensorMetric::Meditation), 0.2);
    }
}
