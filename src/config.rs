use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VisrecConfig {
    pub features: FeatureConfig,
    pub classifier: ClassifierConfig,
    #[serde(rename = "macro")]
    pub macros: MacroConfig,
    pub persistence: PersistenceConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeatureConfig {
    /// Width of the downsampled descriptor grid
    #[serde(default = "default_grid_width")]
    pub grid_width: u32,

    /// Height of the downsampled descriptor grid
    #[serde(default = "default_grid_height")]
    pub grid_height: u32,

    /// Gaussian blur sigma applied before downsampling (0 disables)
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassifierConfig {
    /// Steepness of the distance-to-confidence falloff
    #[serde(default = "default_confidence_falloff")]
    pub confidence_falloff: f64,

    /// Distances closer than this are treated as ties
    #[serde(default = "default_tie_tolerance")]
    pub tie_tolerance: f64,

    /// Best matches below this confidence are reported as unknown
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MacroConfig {
    /// Repeat count used when the UI does not supply one
    #[serde(default = "default_repeat_count")]
    pub default_repeat_count: u32,

    /// Upper bound accepted for a repeat count
    #[serde(default = "default_max_repeat_count")]
    pub max_repeat_count: u32,

    /// Pointer moves closer together than this are coalesced while recording
    #[serde(default = "default_min_move_interval_ms")]
    pub min_move_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PersistenceConfig {
    /// Restore and save snapshots at all
    #[serde(default = "default_persistence_enabled")]
    pub enabled: bool,

    /// Snapshot file path
    #[serde(default = "default_persistence_path")]
    pub path: String,

    /// Write a snapshot during shutdown
    #[serde(default = "default_save_on_exit")]
    pub save_on_exit: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl VisrecConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("visrec.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("features.grid_width", default_grid_width())?
            .set_default("features.grid_height", default_grid_height())?
            .set_default("features.blur_sigma", default_blur_sigma() as f64)?
            .set_default(
                "classifier.confidence_falloff",
                default_confidence_falloff(),
            )?
            .set_default("classifier.tie_tolerance", default_tie_tolerance())?
            .set_default(
                "classifier.min_confidence",
                default_min_confidence() as f64,
            )?
            .set_default("macro.default_repeat_count", default_repeat_count())?
            .set_default("macro.max_repeat_count", default_max_repeat_count())?
            .set_default(
                "macro.min_move_interval_ms",
                default_min_move_interval_ms(),
            )?
            .set_default("persistence.enabled", default_persistence_enabled())?
            .set_default("persistence.path", default_persistence_path())?
            .set_default("persistence.save_on_exit", default_save_on_exit())?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            // VISREC_SECTION__KEY, e.g. VISREC_MACRO__MAX_REPEAT_COUNT
            .add_source(
                Environment::with_prefix("VISREC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: VisrecConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.features.grid_width == 0 || self.features.grid_height == 0 {
            return Err(ConfigError::Message(
                "Feature grid dimensions must be greater than 0".to_string(),
            ));
        }

        if !self.features.blur_sigma.is_finite() || self.features.blur_sigma < 0.0 {
            return Err(ConfigError::Message(
                "Feature blur_sigma must be a non-negative number".to_string(),
            ));
        }

        if !self.classifier.confidence_falloff.is_finite()
            || self.classifier.confidence_falloff <= 0.0
        {
            return Err(ConfigError::Message(
                "Classifier confidence_falloff must be greater than 0".to_string(),
            ));
        }

        if !self.classifier.tie_tolerance.is_finite() || self.classifier.tie_tolerance < 0.0 {
            return Err(ConfigError::Message(
                "Classifier tie_tolerance must be non-negative".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.classifier.min_confidence) {
            return Err(ConfigError::Message(
                "Classifier min_confidence must be within [0, 1]".to_string(),
            ));
        }

        if self.macros.max_repeat_count == 0 {
            return Err(ConfigError::Message(
                "Macro max_repeat_count must be greater than 0".to_string(),
            ));
        }

        if self.macros.default_repeat_count == 0
            || self.macros.default_repeat_count > self.macros.max_repeat_count
        {
            return Err(ConfigError::Message(format!(
                "Macro default_repeat_count must be within 1..={}",
                self.macros.max_repeat_count
            )));
        }

        if self.persistence.enabled && self.persistence.path.trim().is_empty() {
            return Err(ConfigError::Message(
                "Persistence path must be set when persistence is enabled".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for VisrecConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            classifier: ClassifierConfig::default(),
            macros: MacroConfig::default(),
            persistence: PersistenceConfig {
                enabled: default_persistence_enabled(),
                path: default_persistence_path(),
                save_on_exit: default_save_on_exit(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
            blur_sigma: default_blur_sigma(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            confidence_falloff: default_confidence_falloff(),
            tie_tolerance: default_tie_tolerance(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            default_repeat_count: default_repeat_count(),
            max_repeat_count: default_max_repeat_count(),
            min_move_interval_ms: default_min_move_interval_ms(),
        }
    }
}

// Default value functions
fn default_grid_width() -> u32 {
    16
}
fn default_grid_height() -> u32 {
    16
}
fn default_blur_sigma() -> f32 {
    0.0
}

fn default_confidence_falloff() -> f64 {
    4.0
}
fn default_tie_tolerance() -> f64 {
    1e-6
}
fn default_min_confidence() -> f32 {
    0.0
}

fn default_repeat_count() -> u32 {
    1
}
fn default_max_repeat_count() -> u32 {
    10_000
}
fn default_min_move_interval_ms() -> u64 {
    0
}

fn default_persistence_enabled() -> bool {
    true
}
fn default_persistence_path() -> String {
    "./visrec-state.json".to_string()
}
fn default_save_on_exit() -> bool {
    true
}

fn default_event_bus_capacity() -> usize {
    256
}
