//! Simulation thread tests
//!
//! Command ordering, volume lifetime through weak handles and water updates
//! submitted from the gameplay side.

use std::sync::{Arc, Mutex};

use fluid::water::ForcePointParam;
use fluid::{SimThread, SimWorld, UVec2, UVec3, VolumeFluidParams, VolumeHandle, WaterFrame};

fn spawn() -> SimThread {
    SimThread::spawn(SimWorld::new()).expect("spawn simulation thread")
}

#[test]
fn test_commands_run_in_submission_order() {
    let sim = spawn();
    let log = Arc::new(Mutex::new(Vec::new()));
    for i in 0..50 {
        let log = Arc::clone(&log);
        sim.enqueue(move |_| log.lock().unwrap().push(i));
    }
    assert!(sim.flush());
    assert_eq!(*log.lock().unwrap(), (0..50).collect::<Vec<_>>());
}

#[test]
fn test_submitted_water_frames_update_the_field() {
    let sim = spawn();
    sim.enqueue(|world| world.set_water_resource(UVec2::splat(32)));

    let frame = WaterFrame {
        force_points: vec![ForcePointParam {
            uv: [0.5, 0.5],
            radius: 0.1,
            strength: 1.0,
        }],
        attenuation: 0.925,
        time_weight: 1.0,
        ..Default::default()
    };
    for _ in 0..3 {
        assert!(sim.submit_water(frame.clone()));
    }

    let (cycles, peak) = sim
        .read(|world| {
            let water = world.water().expect("field allocated");
            (water.cycles(), water.max_abs_height())
        })
        .expect("worker alive");
    assert_eq!(cycles, 3);
    assert!(peak > 0.0);
}

#[test]
fn test_released_water_skips_updates() {
    let sim = spawn();
    sim.enqueue(|world| world.set_water_resource(UVec2::splat(16)));
    sim.enqueue(|world| world.release_water());
    sim.submit_water(WaterFrame::default());
    assert_eq!(sim.read(|world| world.is_water_valid()), Some(false));
}

#[test]
fn test_dropping_handle_retires_volume() {
    let sim = spawn();
    let smoke = VolumeHandle::new(VolumeFluidParams::with_size(UVec3::splat(8)));
    let steam = VolumeHandle::new(VolumeFluidParams::with_size(UVec3::splat(16)));
    sim.add_volume(&smoke);
    sim.add_volume(&steam);

    sim.step_volumes();
    assert_eq!(sim.read(|world| world.volumes.len()), Some(2));

    drop(steam);
    sim.step_volumes();
    let frames = sim
        .read(|world| world.volumes.states().map(|s| s.frame()).collect::<Vec<_>>())
        .expect("worker alive");
    assert_eq!(frames, vec![2]);
}

#[test]
fn test_handle_edits_reach_the_solver() {
    let sim = spawn();
    let handle = VolumeHandle::new(VolumeFluidParams::with_size(UVec3::splat(8)));
    sim.add_volume(&handle);

    handle.update(|p| p.iteration_count = 5);
    handle.set_time_step(1.0 / 30.0);
    sim.step_volumes();

    let passes = sim
        .read(|world| world.volumes.state(0).map(|s| s.dispatcher().passes().len()))
        .flatten();
    assert_eq!(passes, Some(8 + 4));
}

#[test]
fn test_shutdown_drains_queue() {
    let sim = spawn();
    let handle = VolumeHandle::new(VolumeFluidParams::with_size(UVec3::splat(8)));
    sim.add_volume(&handle);
    for _ in 0..4 {
        sim.step_volumes();
    }

    let world = sim.shutdown().expect("clean exit");
    assert_eq!(world.volumes.state(0).map(|s| s.frame()), Some(4));
}
