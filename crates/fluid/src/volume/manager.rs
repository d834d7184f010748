//! Owner of every live fluid volume on the simulation side.
//!
//! Gameplay code holds a [`VolumeHandle`]; the manager only keeps a weak
//! reference to the handle's parameters. Dropping the handle retires the
//! volume on the next [`VolumeManager::step_all`].

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use glam::UVec3;

use super::state::{VolumeFluidParams, VolumeFluidState};

type SharedParams = Arc<Mutex<VolumeFluidParams>>;

fn lock(params: &Mutex<VolumeFluidParams>) -> MutexGuard<'_, VolumeFluidParams> {
    params.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Gameplay-side owner of one volume's parameters.
#[derive(Debug, Clone)]
pub struct VolumeHandle {
    params: SharedParams,
}

impl VolumeHandle {
    pub fn new(params: VolumeFluidParams) -> Self {
        Self {
            params: Arc::new(Mutex::new(params)),
        }
    }

    /// Weak reference for the manager.
    pub fn downgrade(&self) -> Weak<Mutex<VolumeFluidParams>> {
        Arc::downgrade(&self.params)
    }

    pub fn params(&self) -> VolumeFluidParams {
        lock(&self.params).clone()
    }

    /// Edit the parameters in place.
    pub fn update<F: FnOnce(&mut VolumeFluidParams)>(&self, f: F) {
        f(&mut lock(&self.params));
    }

    /// Publish this frame's delta time.
    pub fn set_time_step(&self, dt: f32) {
        lock(&self.params).time_step = dt;
    }

    pub fn set_size(&self, size: UVec3) {
        lock(&self.params).size = size;
    }
}

struct VolumeEntry {
    params: Weak<Mutex<VolumeFluidParams>>,
    state: Option<VolumeFluidState>,
}

/// Steps every registered volume once per frame.
#[derive(Default)]
pub struct VolumeManager {
    entries: Vec<VolumeEntry>,
}

impl std::fmt::Debug for VolumeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeManager")
            .field("volumes", &self.entries.len())
            .finish()
    }
}

impl VolumeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a volume. Its buffers are allocated on the first step.
    pub fn add_proxy(&mut self, params: Weak<Mutex<VolumeFluidParams>>) {
        self.entries.push(VolumeEntry { params, state: None });
        log::info!("volume registered ({} total)", self.entries.len());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop volumes whose handle is gone, then step the rest.
    ///
    /// A volume whose size changed gets fresh buffers. Returns the number of
    /// volumes stepped.
    pub fn step_all(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.params.strong_count() > 0);
        let pruned = before - self.entries.len();
        if pruned > 0 {
            log::info!("released {} volume(s)", pruned);
        }

        let mut stepped = 0;
        for entry in &mut self.entries {
            let Some(shared) = entry.params.upgrade() else {
                continue;
            };
            let params = lock(&shared).clone();
            if let Err(e) = params.validate() {
                log::warn!("skipping volume with invalid params: {}", e);
                continue;
            }

            let stale = entry
                .state
                .as_ref()
                .map_or(true, |state| state.size() != params.size);
            if stale {
                log::info!("allocating volume buffers {:?}", params.size);
                entry.state = Some(VolumeFluidState::new(params.size));
            }
            if let Some(state) = &mut entry.state {
                state.step(&params);
                stepped += 1;
            }
        }
        stepped
    }

    /// Solver state of the `index`-th live volume, once stepped.
    pub fn state(&self, index: usize) -> Option<&VolumeFluidState> {
        self.entries.get(index).and_then(|e| e.state.as_ref())
    }

    pub fn states(&self) -> impl Iterator<Item = &VolumeFluidState> {
        self.entries.iter().filter_map(|e| e.state.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_handle_is_pruned() {
        let mut manager = VolumeManager::new();
        let keep = VolumeHandle::new(VolumeFluidParams::with_size(UVec3::splat(8)));
        let gone = VolumeHandle::new(VolumeFluidParams::with_size(UVec3::splat(8)));
        manager.add_proxy(keep.downgrade());
        manager.add_proxy(gone.downgrade());

        assert_eq!(manager.step_all(), 2);
        drop(gone);
        assert_eq!(manager.step_all(), 1);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_resize_reallocates() {
        let mut manager = VolumeManager::new();
        let handle = VolumeHandle::new(VolumeFluidParams::with_size(UVec3::splat(8)));
        manager.add_proxy(handle.downgrade());
        manager.step_all();
        manager.step_all();
        assert_eq!(manager.state(0).map(|s| s.frame()), Some(2));

        handle.set_size(UVec3::new(16, 8, 8));
        manager.step_all();
        let state = manager.state(0).expect("state exists");
        assert_eq!(state.size(), UVec3::new(16, 8, 8));
        assert_eq!(state.frame(), 1, "fresh buffers start counting again");
    }
}
