//! Scene configuration: water field, fluid volumes and triggers.
//!
//! Every section falls back to its defaults when omitted, so a config file
//! only needs the values it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FIELD_SIZE, DEFAULT_FORCE_STRENGTH, DEFAULT_INTERACTIVE_AREA_SIZE,
    DEFAULT_ITERATIONS_PER_SECOND, DEFAULT_STATIC_OFFSET_TOLERANCE,
    DEFAULT_STOP_SIMULATION_THRESHOLD,
};
use crate::triggers::TriggerBoneInfo;
use crate::volume::VolumeFluidParams;

/// Interactive water field settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    /// Height-field resolution per axis.
    pub field_size: [u32; 2],
    /// World-space footprint of the field.
    pub interactive_area_size: f32,
    pub iterations_per_second: f32,
    /// Seconds without force points before updates pause.
    pub stop_simulation_threshold: f32,
    /// Height injected at the centre of each force point.
    pub force_strength: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            field_size: [DEFAULT_FIELD_SIZE; 2],
            interactive_area_size: DEFAULT_INTERACTIVE_AREA_SIZE,
            iterations_per_second: DEFAULT_ITERATIONS_PER_SECOND,
            stop_simulation_threshold: DEFAULT_STOP_SIMULATION_THRESHOLD,
            force_strength: DEFAULT_FORCE_STRENGTH,
        }
    }
}

impl WaterConfig {
    pub fn per_simulate_duration(&self) -> f32 {
        1.0 / self.iterations_per_second
    }
}

/// Trigger defaults for the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub static_offset_tolerance: f32,
    pub bones: Vec<TriggerBoneInfo>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            static_offset_tolerance: DEFAULT_STATIC_OFFSET_TOLERANCE,
            bones: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub water: WaterConfig,
    pub volumes: Vec<VolumeFluidParams>,
    pub triggers: TriggerConfig,
}

impl SimConfig {
    /// Check value ranges. Returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let water = &self.water;
        if water.field_size[0] < 3 || water.field_size[1] < 3 {
            return Err(format!(
                "water.field_size must be at least 3x3, got {:?}",
                water.field_size
            ));
        }
        if water.interactive_area_size <= 0.0 {
            return Err(format!(
                "water.interactive_area_size must be positive, got {}",
                water.interactive_area_size
            ));
        }
        if water.iterations_per_second <= 0.0 {
            return Err(format!(
                "water.iterations_per_second must be positive, got {}",
                water.iterations_per_second
            ));
        }
        if water.stop_simulation_threshold < 0.0 {
            return Err(format!(
                "water.stop_simulation_threshold must not be negative, got {}",
                water.stop_simulation_threshold
            ));
        }

        for (i, volume) in self.volumes.iter().enumerate() {
            volume
                .validate()
                .map_err(|e| format!("volumes[{}]: {}", i, e))?;
        }

        if self.triggers.static_offset_tolerance < 0.0 {
            return Err(format!(
                "triggers.static_offset_tolerance must not be negative, got {}",
                self.triggers.static_offset_tolerance
            ));
        }
        for bone in &self.triggers.bones {
            if bone.influence_radius <= 0.0 {
                return Err(format!(
                    "bone {} influence_radius must be positive, got {}",
                    bone.bone_name, bone.influence_radius
                ));
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save configuration to YAML file
    pub fn save_yaml(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Load configuration from YAML file
    pub fn load_yaml(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Load by extension: `.yaml`/`.yml` as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let config = if is_yaml(path) {
            Self::load_yaml(path)?
        } else {
            Self::load_json(path)?
        };
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save by extension, mirroring [`SimConfig::load`].
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if is_yaml(path) {
            self.save_yaml(path)
        } else {
            self.save_json(path)
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
