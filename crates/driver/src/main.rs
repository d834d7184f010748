//! Headless scene runner.
//!
//! Builds a small pond scene (a player walking in circles, a drifting boat
//! and a wading character), runs it for a number of frames and reports what
//! the solvers did.
//!
//! Usage: `fluid_driver [config.json|config.yaml] [--frames N] [--dump heights.raw]`

use std::path::{Path, PathBuf};

use fluid::{
    BodyId, BodyInfo, ForceRegistry, MaterialId, SimConfig, SimThread, SimWorld, SkeletalTrigger,
    StaticTrigger, TriggerBoneInfo, VolumeHandle, WaterDriver,
};
use glam::{UVec2, Vec3};

const WATER_MATERIAL: MaterialId = MaterialId(1);
const POND: BodyId = BodyId(1);
const DT: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u32 = 600;
const REPORT_INTERVAL: u32 = 60;

struct Args {
    config: Option<PathBuf>,
    frames: u32,
    dump: Option<PathBuf>,
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let mut args = Args {
        config: None,
        frames: DEFAULT_FRAMES,
        dump: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--frames" => {
                let value = iter.next().ok_or("--frames needs a value")?;
                args.frames = value.parse()?;
            }
            "--dump" => {
                let value = iter.next().ok_or("--dump needs a path")?;
                args.dump = Some(PathBuf::from(value));
            }
            _ if arg.starts_with("--") => return Err(format!("unknown option {}", arg).into()),
            _ => args.config = Some(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&Path>) -> Result<SimConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => SimConfig::load(path),
        None => {
            let config = SimConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn default_bones() -> Vec<TriggerBoneInfo> {
    vec![
        TriggerBoneInfo::new("foot_l", 20.0, 2.0),
        TriggerBoneInfo::new("foot_r", 20.0, 2.0),
    ]
}

/// Player walking a circle around the origin.
fn player_location(t: f32) -> Vec3 {
    let angle = t * 0.5;
    Vec3::new(angle.cos() * 300.0, angle.sin() * 300.0, 0.0)
}

fn boat_location(t: f32) -> Vec3 {
    Vec3::new(-200.0 + t * 25.0, 150.0, 0.0)
}

/// Feet swing back and forth next to a wading character.
fn bone_locations(count: usize, t: f32) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let phase = t * 4.0 + i as f32 * std::f32::consts::PI;
            Vec3::new(100.0 + phase.sin() * 30.0, -80.0 + i as f32 * 25.0, -5.0)
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = parse_args()?;
    let mut config = load_config(args.config.as_deref())?;
    if config.triggers.bones.is_empty() {
        config.triggers.bones = default_bones();
    }

    println!("=== INTERACTIVE WATER SCENE ===");
    println!(
        "field {}x{}, area {}, {} updates/s, {} volume(s), {} frames",
        config.water.field_size[0],
        config.water.field_size[1],
        config.water.interactive_area_size,
        config.water.iterations_per_second,
        config.volumes.len(),
        args.frames
    );

    let sim = SimThread::spawn(SimWorld::new())?;
    let field_size = UVec2::from(config.water.field_size);
    sim.enqueue(move |world| world.set_water_resource(field_size));

    let volumes: Vec<VolumeHandle> = config
        .volumes
        .iter()
        .cloned()
        .map(VolumeHandle::new)
        .collect();
    for handle in &volumes {
        sim.add_volume(handle);
    }

    // Scene setup
    let pond = BodyInfo::new(POND, Some(WATER_MATERIAL), Vec3::ZERO);
    let mut registry = ForceRegistry::new(Some(WATER_MATERIAL));

    let mut driver = WaterDriver::new(config.water.clone());
    driver.begin_play(player_location(0.0), &[pond], &mut registry);
    driver.on_begin_overlap(&pond, &mut registry);

    let mut boat = StaticTrigger::with_tolerance(40.0, config.triggers.static_offset_tolerance);
    boat.begin_play(boat_location(0.0), &[pond], &mut registry);

    let mut wader = SkeletalTrigger::new(config.triggers.bones.clone());
    let bone_count = wader.bones().len();
    let overlaps: Vec<(usize, BodyInfo)> = (0..bone_count).map(|i| (i, pond)).collect();
    wader.begin_play(&bone_locations(bone_count, 0.0), &overlaps, &mut registry);

    let mut updates = 0u32;
    let mut emitted = 0usize;

    for frame in 1..=args.frames {
        let t = frame as f32 * DT;

        if boat.tick(boat_location(t), &mut registry).is_some() {
            emitted += 1;
        }
        emitted += wader.tick(&bone_locations(bone_count, t), &mut registry).len();

        if let Some(tick) = driver.tick(DT, player_location(t), &mut registry) {
            if let Some(material) = tick.material {
                log::trace!(
                    "material: wave size {}, role uv {:?}",
                    material.wave_size,
                    material.role_uv
                );
            }
            sim.submit_water(tick.frame);
            updates += 1;
        }

        for handle in &volumes {
            handle.set_time_step(DT);
        }
        sim.step_volumes();

        if frame % REPORT_INTERVAL == 0 {
            report(&sim, frame, updates, emitted);
        }
    }

    if !sim.flush() {
        return Err("simulation thread stopped unexpectedly".into());
    }

    if let Some(path) = &args.dump {
        let bytes = sim
            .read(|world| world.water().map(|w| w.height_bytes().to_vec()))
            .flatten()
            .ok_or("no height field to dump")?;
        std::fs::write(path, &bytes)?;
        println!("wrote {} bytes of height data to {}", bytes.len(), path.display());
    }

    let world = sim.shutdown().ok_or("simulation thread panicked")?;
    println!("\n=== SUMMARY ===");
    println!("water updates submitted: {}", updates);
    println!("force points emitted:    {}", emitted);
    if let Some(water) = world.water() {
        let stats = water.dispatcher().stats();
        println!(
            "water cycles: {}, passes: {}, groups: {}",
            water.cycles(),
            stats.passes,
            stats.groups
        );
    }
    for (i, state) in world.volumes.states().enumerate() {
        let stats = state.dispatcher().stats();
        println!(
            "volume {} {:?}: {} frames, {} passes, max speed {:.3}",
            i,
            state.size(),
            state.frame(),
            stats.passes,
            state.velocity().max_length()
        );
    }

    Ok(())
}

fn report(sim: &SimThread, frame: u32, updates: u32, emitted: usize) {
    let snapshot = sim.read(|world| {
        let water = world
            .water()
            .map(|w| (w.cycles(), w.max_abs_height()))
            .unwrap_or((0, 0.0));
        let volume_frames: Vec<u64> = world.volumes.states().map(|s| s.frame()).collect();
        (water, volume_frames)
    });

    match snapshot {
        Some(((cycles, peak), volume_frames)) => println!(
            "frame {:4}: updates {:3}, cycles {:3}, points {:4}, peak height {:.4}, volumes {:?}",
            frame, updates, cycles, emitted, peak, volume_frames
        ),
        None => log::error!("simulation thread did not answer at frame {}", frame),
    }
}
