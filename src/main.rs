//! Modular Graph demo.
//!
//! Builds a small generative patch and either plays it on the default output
//! device (`--features cpal-output`) or renders a few seconds offline and
//! prints levels.

use modular_graph::{
    create, AudioProcessor, EngineConfig, EngineController, EngineEvent, NodeKind, Result,
};
use tracing::info;

fn build_patch(ctl: &mut EngineController) -> Result<()> {
    ctl.add_node(0, NodeKind::Clock)?;
    ctl.add_node(1, NodeKind::Noise)?;
    ctl.add_node(2, NodeKind::SampleHold)?;
    ctl.add_node(3, NodeKind::Quantizer)?;
    ctl.add_node(4, NodeKind::Glide)?;
    ctl.add_node(5, NodeKind::Oscillator)?;
    ctl.add_node(6, NodeKind::Vca)?;
    ctl.add_node(7, NodeKind::Reverb)?;
    ctl.add_node(8, NodeKind::Speaker)?;

    ctl.set_parameter(0, "bpm", 96.0)?;
    ctl.set_parameter(0, "mode", 1usize)?;
    ctl.set_parameter(1, "level", 1.0)?;
    ctl.set_parameter(3, "scale", 3usize)?;
    ctl.set_parameter(4, "time", 0.05)?;
    ctl.set_parameter(5, "frequency", 110.0)?;
    ctl.set_parameter(5, "waveform", 3usize)?;
    ctl.set_parameter(7, "mix", 0.4)?;
    ctl.set_parameter(8, "volume", 0.5)?;

    ctl.connect_ports(1, "out", 2, "in")?;
    ctl.connect_ports(0, "out", 2, "trigger")?;
    ctl.connect_ports(2, "out", 3, "in")?;
    ctl.connect_ports(3, "out", 4, "in")?;
    ctl.connect_ports(4, "out", 5, "pitch")?;
    ctl.connect_ports(5, "out", 6, "in")?;
    ctl.connect_ports(0, "out", 6, "cv")?;
    ctl.connect_ports(6, "out", 7, "in")?;
    ctl.connect_ports(7, "out", 8, "in")?;
    Ok(())
}

/// Creates an engine for `config` with the demo patch loaded.
fn demo(config: EngineConfig) -> Result<(EngineController, AudioProcessor)> {
    let (mut ctl, processor) = create(config);
    build_patch(&mut ctl)?;
    info!(nodes = ctl.node_count(), "demo patch built");

    let patch = ctl.capture("demo");
    info!(bytes = patch.to_json()?.len(), "patch captured");
    Ok((ctl, processor))
}

#[cfg(feature = "cpal-output")]
fn run() -> Result<()> {
    use modular_graph::engine::AudioEngine;
    use std::time::Duration;

    // Nodes are built for the rate the device actually runs at
    let mut engine = AudioEngine::new()?;
    let config = EngineConfig::default().with_sample_rate(engine.sample_rate() as f32);
    info!(device = %engine.device_name(), sample_rate = config.sample_rate, "output device opened");

    let (mut ctl, processor) = demo(config)?;
    engine.start(processor)?;

    for _ in 0..40 {
        std::thread::sleep(Duration::from_millis(250));
        report(&mut ctl);
    }
    engine.stop()?;
    Ok(())
}

#[cfg(not(feature = "cpal-output"))]
fn run() -> Result<()> {
    const CALLBACK_FRAMES: usize = 512;
    const SECONDS: f32 = 4.0;

    let (mut ctl, mut processor) = demo(EngineConfig::default())?;

    let channels = ctl.config().channels;
    let sample_rate = ctl.config().sample_rate;
    let callbacks = (SECONDS * sample_rate / CALLBACK_FRAMES as f32) as usize;
    let mut buffer = vec![0.0; CALLBACK_FRAMES * channels];
    let mut peak = 0.0f32;

    for _ in 0..callbacks {
        processor.render_callback(&mut buffer, channels);
        peak = buffer.iter().fold(peak, |p, s| p.max(s.abs()));
        report(&mut ctl);
    }

    info!(
        seconds = processor.dsp_time(),
        peak,
        "offline render finished"
    );
    Ok(())
}

fn report(ctl: &mut EngineController) {
    for event in ctl.poll_events() {
        match event {
            EngineEvent::OutputLevel { left, right } => {
                tracing::debug!(left, right, "output level");
            }
            EngineEvent::CpuLoad(load) => tracing::debug!(load, "cpu load"),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    run()
}
