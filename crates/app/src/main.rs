use std::collections::HashMap;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use luminaire_core::{
    DigitalRainLayer, EffectParameters, Frame, Model, PlasmaLayer, Playlist, PositionColorLayer,
    Renderer, RendererConfig, Responsive, Scene, SensorMetric, SensorReading, SignalDuotoneLayer,
    SnowstormLayer, SolidColorLayer, WavesLayer, WhiteOutLayer,
};
use tracing_subscriber::EnvFilter;

fn main() -> luminaire_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            model,
            config,
            duration,
            advance_every,
        } => run(model, config, duration, advance_every),
        Commands::Inspect { model } => inspect(&model),
    }
}

fn run(
    model_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    duration: Option<f64>,
    advance_every: f64,
) -> luminaire_core::Result<()> {
    let config = match config_path {
        Some(path) => RendererConfig::from_file(&path)?,
        None => RendererConfig::default(),
    };
    let model = match model_path {
        Some(path) => Model::from_file(&path)?,
        None => helix_model(64),
    };

    let active = config.active_playlist.as_deref().unwrap_or("ambient");
    let mut renderer = Renderer::new(
        demo_playlists()?,
        Some(active),
        config.use_fast_fades,
        config.gamma,
    )?;
    tracing::info!(
        leds = model.led_count(),
        playlist = active,
        fps = config.target_frame_rate,
        "starting render loop"
    );

    let tick = Duration::from_secs_f32(1.0 / config.target_frame_rate.max(1.0));
    let started = Instant::now();
    let mut frame = Frame::new(model.led_count());
    let mut headset = SimulatedHeadset::new();
    let mut next_transition = advance_every;
    let mut advances = 0_u32;
    let mut home = active;

    loop {
        let now = started.elapsed().as_secs_f64();
        if duration.is_some_and(|limit| now >= limit) {
            break;
        }

        let params = EffectParameters {
            time: now,
            target_frame_rate: config.target_frame_rate,
            sensor: headset.sample(now),
        };
        frame.clear();
        renderer.render(&model, &params, &mut frame);
        // The finished frame would be handed to the output server here.

        if now >= next_transition {
            next_transition = now + advance_every;
            advances += 1;
            if advances % 4 == 0 {
                home = if home == "ambient" { "focus" } else { "ambient" };
                tracing::info!(playlist = home, "swapping playlists");
                renderer.swap_playlists(home, Some("transition"), true, 2.0)?;
            } else {
                tracing::info!("advancing current playlist");
                renderer.advance_current_playlist(1.0)?;
            }
        }

        thread::sleep(tick);
    }

    tracing::info!(seconds = started.elapsed().as_secs(), "render loop finished");
    Ok(())
}

fn inspect(path: &PathBuf) -> luminaire_core::Result<()> {
    let model = Model::from_file(path)?;
    println!("{}: {} LEDs", path.display(), model.led_count());
    if let Some(first) = model.positions().first() {
        println!("first LED at ({:.3}, {:.3}, {:.3})", first[0], first[1], first[2]);
    }
    Ok(())
}

/// The playlists the installation runs when no content files are supplied:
/// an ambient set, a headset-responsive set, and the brief dramatic scenes
/// used as transition intermediates.
fn demo_playlists() -> luminaire_core::Result<HashMap<String, Playlist>> {
    let mut playlists = HashMap::new();
    playlists.insert(
        "ambient".to_string(),
        Playlist::shuffled(vec![
            Scene::shared(vec![
                Box::new(SolidColorLayer::new([0.0, 0.0, 0.1])),
                Box::new(PlasmaLayer::new([0.9, 0.3, 0.6])),
            ]),
            Scene::shared(vec![Box::new(PlasmaLayer::with_zoom(
                Some([0.2, 0.5, 0.9]),
                0.3,
            ))]),
            Scene::shared(vec![
                Box::new(PositionColorLayer),
                Box::new(PlasmaLayer::modulating()),
            ]),
        ])?,
    );
    playlists.insert(
        "focus".to_string(),
        Playlist::new(vec![
            Scene::shared(vec![
                Box::new(Responsive::new(
                    SensorMetric::Attention,
                    5.0,
                    SignalDuotoneLayer::new([0.8, 0.1, 0.1], [0.1, 0.8, 0.1]),
                )),
                Box::new(WavesLayer),
            ]),
            Scene::shared(vec![
                Box::new(Responsive::new(
                    SensorMetric::Meditation,
                    5.0,
                    SignalDuotoneLayer::new([0.5, 0.2, 0.6], [0.1, 0.4, 0.9]),
                )),
                Box::new(PlasmaLayer::modulating()),
            ]),
        ])?,
    );
    playlists.insert(
        "transition".to_string(),
        Playlist::new(vec![
            Scene::shared(vec![Box::new(DigitalRainLayer::new())]),
            Scene::shared(vec![Box::new(WhiteOutLayer)]),
            Scene::shared(vec![Box::new(SnowstormLayer)]),
        ])?,
    );
    Ok(playlists)
}

/// A synthetic stand-in for the real installation geometry: LEDs wound
/// three turns up a helix.
fn helix_model(led_count: usize) -> Model {
    let positions = (0..led_count)
        .map(|i| {
            let t = i as f32 / led_count.max(2) as f32;
            let angle = t * std::f32::consts::TAU * 3.0;
            [angle.cos(), angle.sin(), t]
        })
        .collect();
    Model::from_positions(positions)
}

/// Stands in for the headset thread: emits a fresh reading about once per
/// second, wandering smoothly so the responsive layers have something to
/// chase.
struct SimulatedHeadset {
    sequence: u64,
    last_emit: f64,
    reading: Option<SensorReading>,
}

impl SimulatedHeadset {
    fn new() -> Self {
        Self {
            sequence: 0,
            last_emit: 0.0,
            reading: None,
        }
    }

    fn sample(&mut self, now: f64) -> Option<SensorReading> {
        if self.reading.is_none() || now - self.last_emit >= 1.0 {
            self.sequence += 1;
            self.last_emit = now;
            self.reading = Some(SensorReading {
                sequence: self.sequence,
                attention: (0.5 + 0.5 * (now * 0.35).sin()) as f32,
                meditation: (0.5 + 0.5 * (now * 0.21).cos()) as f32,
                on: true,
            });
        }
        self.reading
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Luminaire LED installation driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the installation with the built-in demo playlists.
    Run {
        /// Path to a JSON model file. A synthetic helix is used if omitted.
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Path to a JSON renderer configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop after this many seconds instead of running forever.
        #[arg(short, long)]
        duration: Option<f64>,
        /// Seconds between automatic playlist transitions.
        #[arg(long, default_value_t = 20.0)]
        advance_every: f64,
    },
    /// Load a model file and print a summary of its geometry.
    Inspect {
        /// Path to the JSON model file to inspect.
        model: PathBuf,
    },
}
