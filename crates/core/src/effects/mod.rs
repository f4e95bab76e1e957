//! Effect kernels implementing the [`EffectLayer`] contract.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::frame::{Color, EffectParameters, Frame};
use crate::layer::EffectLayer;
use crate::model::Model;
use crate::Result;

/// Adds a constant color to every LED.
#[derive(Debug, Clone)]
pub struct SolidColorLayer {
    color: Color,
}

impl SolidColorLayer {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl EffectLayer for SolidColorLayer {
    fn render(
        &mut self,
        _model: &Model,
        _params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        frame.add_color(self.color);
        Ok(())
    }
}

/// Draws a static RGB color cube: each LED takes its normalized position as
/// its color. Handy for checking that the model mapping is wired correctly.
#[derive(Debug, Clone, Default)]
pub struct PositionColorLayer;

impl EffectLayer for PositionColorLayer {
    fn render(
        &mut self,
        model: &Model,
        _params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        for (pixel, position) in frame.pixels_mut().iter_mut().zip(model.positions()) {
            *pixel = *position;
        }
        Ok(())
    }
}

/// Renders two sub-layers into temporary zeroed frames, then adds their
/// element-wise product into the target frame.
pub struct MultiplierLayer {
    first: Box<dyn EffectLayer>,
    second: Box<dyn EffectLayer>,
}

impl MultiplierLayer {
    pub fn new(first: Box<dyn EffectLayer>, second: Box<dyn EffectLayer>) -> Self {
        Self { first, second }
    }
}

impl EffectLayer for MultiplierLayer {
    fn render(
        &mut self,
        model: &Model,
        params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        let mut left = Frame::new(frame.len());
        let mut right = Frame::new(frame.len());
        self.first.render(model, params, &mut left)?;
        self.second.render(model, params, &mut right)?;
        left.multiply(&right);
        frame.add(&left);
        Ok(())
    }
}

/// Blinks everything on and off on alternate frames, to eyeball the timing
/// accuracy of the driving loop.
#[derive(Debug, Clone, Default)]
pub struct BlinkyLayer {
    on: bool,
}

impl EffectLayer for BlinkyLayer {
    fn render(
        &mut self,
        _model: &Model,
        _params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        self.on = !self.on;
        if self.on {
            frame.add_color([1.0, 1.0, 1.0]);
        }
        Ok(())
    }
}

/// Adds a fresh random white brightness to each LED every frame.
#[derive(Debug, Clone, Default)]
pub struct SnowstormLayer;

impl EffectLayer for SnowstormLayer {
    fn render(
        &mut self,
        _model: &Model,
        _params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        let mut rng = rand::rng();
        for pixel in frame.pixels_mut() {
            let level: f32 = rng.random();
            for component in pixel {
                *component += level;
            }
        }
        Ok(())
    }
}

/// Like [`SnowstormLayer`], but every channel rolls its own brightness.
#[derive(Debug, Clone, Default)]
pub struct TechnicolorSnowstormLayer;

impl EffectLayer for TechnicolorSnowstormLayer {
    fn render(
        &mut self,
        _model: &Model,
        _params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        let mut rng = rand::rng();
        for pixel in frame.pixels_mut() {
            for component in pixel {
                *component += rng.random::<f32>();
            }
        }
        Ok(())
    }
}

/// Sets everything to white.
#[derive(Debug, Clone, Default)]
pub struct WhiteOutLayer;

impl EffectLayer for WhiteOutLayer {
    fn render(
        &mut self,
        _model: &Model,
        _params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        frame.add_color([1.0, 1.0, 1.0]);
        Ok(())
    }
}

/// Occasional wavefronts of light which propagate outward from the base of
/// the installation.
#[derive(Debug, Clone, Default)]
pub struct WavesLayer;

impl EffectLayer for WavesLayer {
    fn render(
        &mut self,
        model: &Model,
        params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        // Center of the expanding wavefront. The cycle is longer than the
        // piece, so waves arrive with a pause between them.
        let center = ((params.time * 2.8) % 15.0) as f32;
        let width = 0.4;

        for (pixel, distance) in frame.pixels_mut().iter_mut().zip(model.distances()) {
            let offset = ((distance - center) / width).abs();
            if offset < 1.0 {
                // Cosine-shaped pulse in a blue-white color.
                let brightness = (offset * std::f32::consts::FRAC_PI_2).cos();
                pixel[0] += brightness * 0.5;
                pixel[1] += brightness * 0.5;
                pixel[2] += brightness;
            }
        }
        Ok(())
    }
}

/// Number of phase-shifted columns the digital rain falls in.
const RAIN_COLUMNS: usize = 6;

/// Entries in the precomputed rain pulse color table.
const RAIN_TABLE_SIZE: usize = 100;

/// Columns of green glyphs raining down the installation, in the manner of
/// The Matrix.
///
/// LEDs are grouped into columns by their bearing around the center, and the
/// columns fall out of phase with each other. The pulse shape (a bright
/// head, a green tail falling off as sin², then darkness) is precomputed
/// into a color table sampled per LED. Recommends a long transition dwell,
/// for use as an intermediate scene.
pub struct DigitalRainLayer {
    offsets: [f32; RAIN_COLUMNS],
    table: Vec<Color>,
}

impl DigitalRainLayer {
    const PERIOD: f32 = std::f32::consts::TAU;
    const SPEED: f32 = 2.0;
    const HEIGHT: f32 = 1.0 / 3.0;

    pub fn new() -> Self {
        let mut offsets = [0.0; RAIN_COLUMNS];
        for (column, offset) in offsets.iter_mut().enumerate() {
            *offset = Self::PERIOD * column as f32 / RAIN_COLUMNS as f32;
        }
        offsets.shuffle(&mut rand::rng());

        let table = (0..RAIN_TABLE_SIZE)
            .map(|i| Self::pulse_color(Self::PERIOD * i as f32 / RAIN_TABLE_SIZE as f32))
            .collect();
        Self { offsets, table }
    }

    /// One period of the falling pulse.
    fn pulse_color(phase: f32) -> Color {
        let head = [140.0 / 255.0, 234.0 / 255.0, 191.0 / 255.0];
        let tail = [90.0 / 255.0, 210.0 / 255.0, 90.0 / 255.0];
        if phase < std::f32::consts::FRAC_PI_4 {
            head
        } else if phase < std::f32::consts::PI {
            let fall_off = phase.sin().powi(2);
            [tail[0] * fall_off, tail[1] * fall_off, tail[2] * fall_off]
        } else {
            [0.0; 3]
        }
    }

    /// Linearly interpolated lookup into the pulse color table.
    fn sampled(&self, phase: f32) -> Color {
        let scaled = phase / Self::PERIOD * RAIN_TABLE_SIZE as f32;
        let index = (scaled as usize).min(RAIN_TABLE_SIZE - 1);
        let next = (index + 1).min(RAIN_TABLE_SIZE - 1);
        let t = scaled - index as f32;
        let mut color = [0.0; 3];
        for channel in 0..3 {
            color[channel] = lerp(self.table[index][channel], self.table[next][channel], t);
        }
        color
    }
}

impl Default for DigitalRainLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectLayer for DigitalRainLayer {
    fn render(
        &mut self,
        model: &Model,
        params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        let mut rng = rand::rng();
        let scroll = params.time as f32 * Self::SPEED;

        for (led, pixel) in frame.pixels_mut().iter_mut().enumerate() {
            let [x, y, z] = model.position(led);
            let column = rain_column(x, y);
            let phase = ((z + 0.5 * model.distance(led)) / Self::HEIGHT
                + scroll
                + self.offsets[column])
                .rem_euclid(Self::PERIOD);
            let color = self.sampled(phase);

            // Random flicker between 75% and full brightness.
            let flicker = 0.75 + 0.25 * rng.random::<f32>();
            for (component, value) in pixel.iter_mut().zip(&color) {
                *component += value * flicker;
            }
        }
        Ok(())
    }

    fn transition_fade_time(&self) -> f64 {
        5.0
    }
}

/// Groups an LED into one of the rain columns by its bearing around the
/// center of the installation.
fn rain_column(x: f32, y: f32) -> usize {
    let angle = (y - 0.5).atan2(x - 0.5) + std::f32::consts::PI;
    let sector = (angle / std::f32::consts::TAU * RAIN_COLUMNS as f32) as usize;
    sector.min(RAIN_COLUMNS - 1)
}

/// Period, in lattice units, after which the noise field used by
/// [`PlasmaLayer`] repeats. The drifting time offset wraps here so the
/// coordinates stay in a comfortable single-precision range.
const NOISE_WRAP: f64 = 1024.0;

/// A plasma cloud layer, implemented with smoothed value noise.
///
/// With a color, noise values accumulate that color into the frame. Without
/// one, the layer modulates the brightness of the framebuffer's existing
/// contents instead.
#[derive(Debug, Clone)]
pub struct PlasmaLayer {
    color: Option<Color>,
    zoom: f32,
    octaves: u32,
    time_const: f64,
}

impl PlasmaLayer {
    pub fn new(color: Color) -> Self {
        Self::with_zoom(Some(color), 0.6)
    }

    /// A plasma layer that multiplies whatever earlier layers have produced.
    pub fn modulating() -> Self {
        Self::with_zoom(None, 0.6)
    }

    /// Spatial scale, in noise periods visible along the installation.
    /// Larger values "zoom out". Staying zoomed in keeps detail in the
    /// higher octaves while the low-frequency octave drifts gradually.
    pub fn with_zoom(color: Option<Color>, zoom: f32) -> Self {
        Self {
            color,
            zoom,
            octaves: 3,
            time_const: -1.5,
        }
    }
}

impl EffectLayer for PlasmaLayer {
    fn render(
        &mut self,
        model: &Model,
        params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        let s = self.zoom;
        // Time-varying vertical offset: the field "flows" upward, slowly.
        let z0 = ((params.time * self.time_const) % NOISE_WRAP) as f32;

        for (pixel, position) in frame.pixels_mut().iter_mut().zip(model.positions()) {
            let [x, y, z] = *position;
            let noise = fbm(x * s, y * s, z * s + z0, self.octaves);
            let level = 1.2 * (0.35 + noise);
            match self.color {
                Some(color) => {
                    for (component, value) in pixel.iter_mut().zip(&color) {
                        *component += value * level;
                    }
                }
                None => {
                    for component in pixel {
                        *component *= level;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Integer-lattice hash onto [-1, 1].
fn lattice(x: i32, y: i32, z: i32) -> f32 {
    let mut h = (x as u32)
        .wrapping_mul(0x8da6_b343)
        .wrapping_add((y as u32).wrapping_mul(0xd816_3841))
        .wrapping_add((z as u32).wrapping_mul(0xcb1a_b31f));
    h ^= h >> 13;
    h = h.wrapping_mul(0x27d4_eb2d);
    h ^= h >> 15;
    (h & 0xffff) as f32 / 32767.5 - 1.0
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Trilinearly smoothed value noise over the integer lattice, in [-1, 1].
fn value_noise(x: f32, y: f32, z: f32) -> f32 {
    let (xf, yf, zf) = (x.floor(), y.floor(), z.floor());
    let (xi, yi, zi) = (xf as i32, yf as i32, zf as i32);
    let (tx, ty, tz) = (
        smoothstep(x - xf),
        smoothstep(y - yf),
        smoothstep(z - zf),
    );

    let x00 = lerp(lattice(xi, yi, zi), lattice(xi + 1, yi, zi), tx);
    let x10 = lerp(lattice(xi, yi + 1, zi), lattice(xi + 1, yi + 1, zi), tx);
    let x01 = lerp(lattice(xi, yi, zi + 1), lattice(xi + 1, yi, zi + 1), tx);
    let x11 = lerp(
        lattice(xi, yi + 1, zi + 1),
        lattice(xi + 1, yi + 1, zi + 1),
        tx,
    );

    lerp(lerp(x00, x10, ty), lerp(x01, x11, ty), tz)
}

/// Fractal sum of `octaves` noise layers, each at double the frequency and
/// half the amplitude of the previous one.
fn fbm(x: f32, y: f32, z: f32, octaves: u32) -> f32 {
    let mut total = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = 1.0;
    for _ in 0..octaves {
        total += amplitude * value_noise(x * frequency, y * frequency, z * frequency);
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    total
}

/// Resolution of the gamma lookup table.
const GAMMA_LUT_SIZE: usize = 256;

/// Applies a gamma correction to the brightness, to adjust for the eye's
/// nonlinear sensitivity.
///
/// Correction goes through a lookup table of `x^gamma` sampled over [0, 1]
/// inclusive, with linear interpolation between entries; inputs are clamped
/// into the table's range first. The renderer applies this exactly once per
/// finished frame: for any exponent other than 1, a second application
/// would darken the frame again.
#[derive(Debug, Clone)]
pub struct GammaLayer {
    lut: Vec<f32>,
}

impl GammaLayer {
    pub fn new(gamma: f32) -> Self {
        let lut = (0..GAMMA_LUT_SIZE)
            .map(|i| (i as f32 / (GAMMA_LUT_SIZE - 1) as f32).powf(gamma))
            .collect();
        Self { lut }
    }

    /// Corrects every component of the frame in place.
    pub fn apply(&self, frame: &mut Frame) {
        for pixel in frame.pixels_mut() {
            for component in pixel {
                *component = self.correct(*component);
            }
        }
    }

    fn correct(&self, value: f32) -> f32 {
        let scaled = value.clamp(0.0, 1.0) * (GAMMA_LUT_SIZE - 1) as f32;
        let index = scaled as usize;
        if index >= GAMMA_LUT_SIZE - 1 {
            return self.lut[GAMMA_LUT_SIZE - 1];
        }
        lerp(self.lut[index], self.lut[index + 1], scaled - index as f32)
    }
}

impl EffectLayer for GammaLayer {
    fn render(
        &mut self,
        _model: &Model,
        _params: &EffectParameters,
        frame: &mut Frame,
    ) -> Result<()> {
        self.apply(frame);
        Ok(())
    }
}
