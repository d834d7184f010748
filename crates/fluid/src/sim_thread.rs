//! Dedicated simulation thread.
//!
//! All solver buffers live in a [`SimWorld`] owned by one worker thread.
//! Gameplay code never touches them directly: it enqueues closures that the
//! worker runs in submission order. Results come back through a oneshot
//! channel (`read`) or not at all (`enqueue`).

use std::cell::Cell;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use glam::UVec2;

use crate::volume::{VolumeHandle, VolumeManager};
use crate::water::{HeightFieldSolver, WaterFrame};

thread_local! {
    static IN_SIM_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// True when called from a closure running on the simulation thread.
pub fn is_in_sim_thread() -> bool {
    IN_SIM_THREAD.with(|flag| flag.get())
}

/// State owned by the simulation thread.
#[derive(Debug, Default)]
pub struct SimWorld {
    water: Option<HeightFieldSolver>,
    pub volumes: VolumeManager,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)allocate the height-field buffers.
    pub fn set_water_resource(&mut self, field_size: UVec2) {
        log::info!("allocating water field {}x{}", field_size.x, field_size.y);
        self.water = Some(HeightFieldSolver::new(field_size));
    }

    pub fn is_water_valid(&self) -> bool {
        self.water.is_some()
    }

    pub fn release_water(&mut self) {
        self.water = None;
    }

    pub fn water(&self) -> Option<&HeightFieldSolver> {
        self.water.as_ref()
    }

    /// Run one water cycle. Skipped with a warning when no field exists.
    pub fn update_water(&mut self, frame: &WaterFrame) -> bool {
        match &mut self.water {
            Some(solver) => {
                solver.update_water(frame);
                true
            }
            None => {
                log::warn!("water resources not allocated, skipping update");
                false
            }
        }
    }
}

type Command = Box<dyn FnOnce(&mut SimWorld) + Send + 'static>;

/// Handle to the worker thread. Dropping it drains the queue and joins.
pub struct SimThread {
    sender: Option<mpsc::Sender<Command>>,
    handle: Option<JoinHandle<SimWorld>>,
}

impl std::fmt::Debug for SimThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimThread")
            .field("running", &self.handle.is_some())
            .finish()
    }
}

impl SimThread {
    /// Start the worker with `world` as its state.
    pub fn spawn(world: SimWorld) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let handle = thread::Builder::new()
            .name("fluid-sim".into())
            .spawn(move || {
                IN_SIM_THREAD.with(|flag| flag.set(true));
                let mut world = world;
                while let Ok(command) = receiver.recv() {
                    command(&mut world);
                }
                log::debug!("simulation thread exiting");
                world
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue `f`. Returns false if the worker is gone.
    pub fn enqueue<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut SimWorld) + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return false;
        };
        if sender.send(Box::new(f)).is_err() {
            log::error!("simulation thread is not running, command dropped");
            return false;
        }
        true
    }

    /// Run `f` on the worker and wait for its result.
    pub fn read<R, F>(&self, f: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut SimWorld) -> R + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        if !self.enqueue(move |world| {
            let _ = tx.send(f(world));
        }) {
            return None;
        }
        rx.recv().ok()
    }

    /// Block until every command queued so far has run.
    pub fn flush(&self) -> bool {
        self.read(|_| ()).is_some()
    }

    pub fn submit_water(&self, frame: WaterFrame) -> bool {
        self.enqueue(move |world| {
            world.update_water(&frame);
        })
    }

    pub fn add_volume(&self, handle: &VolumeHandle) -> bool {
        let params = handle.downgrade();
        self.enqueue(move |world| world.volumes.add_proxy(params))
    }

    pub fn step_volumes(&self) -> bool {
        self.enqueue(|world| {
            world.volumes.step_all();
        })
    }

    /// Stop the worker after it drains the queue and take back its state.
    pub fn shutdown(mut self) -> Option<SimWorld> {
        self.join()
    }

    fn join(&mut self) -> Option<SimWorld> {
        self.sender = None;
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(world) => Some(world),
            Err(_) => {
                log::error!("simulation thread panicked");
                None
            }
        }
    }
}

impl Drop for SimThread {
    fn drop(&mut self) {
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_run_on_worker() {
        let sim = SimThread::spawn(SimWorld::new()).expect("spawn");
        assert!(!is_in_sim_thread());
        assert_eq!(sim.read(|_| is_in_sim_thread()), Some(true));
    }

    #[test]
    fn test_update_without_water_is_skipped() {
        let sim = SimThread::spawn(SimWorld::new()).expect("spawn");
        let ran = sim.read(|world| world.update_water(&WaterFrame::default()));
        assert_eq!(ran, Some(false));
    }

    #[test]
    fn test_shutdown_returns_world() {
        let sim = SimThread::spawn(SimWorld::new()).expect("spawn");
        sim.enqueue(|world| world.set_water_resource(UVec2::splat(8)));
        let world = sim.shutdown().expect("clean exit");
        assert!(world.is_water_valid());
    }
}
