//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest accepted render distance, in chunks.
pub const MAX_RENDER_DISTANCE: u32 = 16;

const CONFIG_FILE: &str = "config.ron";

/// Top-level world configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Chunk geometry, seed, and view radius.
    pub world: WorldConfig,
    /// Terrain generation settings.
    pub terrain: TerrainConfig,
    /// Background streaming settings.
    pub streaming: StreamingConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed added to every noise sample position.
    pub seed: i32,
    /// Chunk width and depth in blocks.
    pub chunk_size: u32,
    /// Chunk height in blocks.
    pub chunk_height: u32,
    /// Streaming radius in chunks around the observer (Chebyshev).
    pub render_distance: u32,
}

/// Parameters of one octave-summed noise field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseSettings {
    /// Number of summed layers. Layer `i` uses frequency `2^i`.
    pub octaves: u32,
    /// Multiplier applied to the sample coordinates.
    pub scale: f32,
    /// Integer offset added to the scaled coordinates.
    pub offset: (i32, i32),
    /// Amplitude falloff per octave.
    pub persistence: f32,
    /// Factor applied before the exponent in redistribution.
    pub redistribution_modifier: f32,
    /// Exponent applied in redistribution.
    pub exponent: f32,
}

/// Two noise fields and an amplitude that offset sample coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WarpConfig {
    /// Noise that displaces the x coordinate.
    pub x: NoiseSettings,
    /// Noise that displaces the z coordinate.
    pub z: NoiseSettings,
    /// Displacement amplitude per axis, in blocks.
    pub amplitude: (i32, i32),
}

/// One entry of a layer-rule chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LayerKind {
    /// Air above the ground (and above the sea).
    Air,
    /// Noise-driven stone outcrops.
    Stone,
    /// Surface and subsurface blocks.
    Surface,
    /// Tree stamping on flagged columns.
    Tree,
    /// Water below sea level with sandy shores.
    Water,
    /// Bedrock floor and underground fill.
    Underground,
}

impl LayerKind {
    /// The standard first-pass chain, in priority order.
    pub fn standard_chain() -> Vec<LayerKind> {
        vec![
            LayerKind::Air,
            LayerKind::Stone,
            LayerKind::Surface,
            LayerKind::Water,
            LayerKind::Underground,
        ]
    }
}

/// Block names the layer rules place. Resolved against the registry once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlockNames {
    pub surface: String,
    pub subsurface: String,
    pub underground: String,
    pub bedrock: String,
    pub water: String,
    pub shore: String,
    pub trunk: String,
    pub leaves: String,
}

/// Terrain generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Highest absolute y that fills with water.
    pub sea_level: i32,
    /// Subsurface band thickness below the ground block.
    pub surface_depth: i32,
    /// Sand band thickness below the ground, where it is under the sea.
    pub shore_depth: i32,
    /// Absolute y of the bedrock floor.
    pub bedrock_height: i32,
    /// Trees only grow on columns whose ground is at or below this height.
    pub tree_height_limit: i32,
    /// Stone outcrops appear where stone noise exceeds this value.
    pub stone_threshold: f32,
    /// Noise shaping the ground height.
    pub biome_noise: NoiseSettings,
    /// Noise driving stone outcrops.
    pub stone_noise: NoiseSettings,
    /// Noise whose local maxima become trees.
    pub tree_noise: NoiseSettings,
    /// Domain warp shared by every terrain noise field.
    pub warp: WarpConfig,
    /// Blocks placed by the rules.
    pub blocks: BlockNames,
    /// First-pass rule chain.
    pub layers: Vec<LayerKind>,
    /// Second-pass rule chain, run once per column after neighbours exist.
    pub additional_layers: Vec<LayerKind>,
}

/// Background streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Seconds between observer position checks.
    pub load_check_interval_secs: f32,
    /// Chunks activated per host tick.
    pub activations_per_tick: usize,
    /// Worker threads per stage (0 = derive from CPU count).
    pub worker_threads: usize,
    /// Extra chunk rows streamed below the origin row (0 = X/Z only).
    pub vertical_rows: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            chunk_size: 16,
            chunk_height: 100,
            render_distance: 8,
        }
    }
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            octaves: 4,
            scale: 0.01,
            offset: (0, 0),
            persistence: 0.5,
            redistribution_modifier: 1.0,
            exponent: 1.0,
        }
    }
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            x: NoiseSettings {
                octaves: 3,
                scale: 0.05,
                ..NoiseSettings::default()
            },
            z: NoiseSettings {
                octaves: 3,
                scale: 0.05,
                offset: (100, 100),
                ..NoiseSettings::default()
            },
            amplitude: (20, 20),
        }
    }
}

impl Default for BlockNames {
    fn default() -> Self {
        Self {
            surface: "grass".to_string(),
            subsurface: "dirt".to_string(),
            underground: "stone".to_string(),
            bedrock: "bedrock".to_string(),
            water: "water".to_string(),
            shore: "sand".to_string(),
            trunk: "log".to_string(),
            leaves: "oak_leaves".to_string(),
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            sea_level: 34,
            surface_depth: 4,
            shore_depth: 4,
            bedrock_height: -200,
            tree_height_limit: 60,
            stone_threshold: 0.5,
            biome_noise: NoiseSettings {
                octaves: 5,
                scale: 0.01,
                offset: (5000, 5000),
                persistence: 0.5,
                redistribution_modifier: 1.2,
                exponent: 1.8,
            },
            stone_noise: NoiseSettings {
                octaves: 3,
                scale: 0.03,
                offset: (-3000, 1200),
                persistence: 0.5,
                redistribution_modifier: 1.0,
                exponent: 2.0,
            },
            tree_noise: NoiseSettings {
                octaves: 1,
                scale: 0.15,
                offset: (700, -700),
                ..NoiseSettings::default()
            },
            warp: WarpConfig::default(),
            blocks: BlockNames::default(),
            layers: LayerKind::standard_chain(),
            additional_layers: vec![LayerKind::Tree],
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_check_interval_secs: 1.0,
            activations_per_tick: 1,
            worker_threads: 0,
            vertical_rows: 0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Default configuration directory: `<platform config dir>/strata`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("strata")
}

// --- Validation ---

impl Config {
    /// Rejects values the world cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.chunk_size == 0 {
            return Err(invalid("world.chunk_size", "must be greater than zero"));
        }
        if self.world.chunk_height == 0 {
            return Err(invalid("world.chunk_height", "must be greater than zero"));
        }
        if self.world.render_distance > MAX_RENDER_DISTANCE {
            return Err(invalid(
                "world.render_distance",
                format!("must be at most {MAX_RENDER_DISTANCE}"),
            ));
        }
        for (field, noise) in [
            ("terrain.biome_noise.octaves", &self.terrain.biome_noise),
            ("terrain.stone_noise.octaves", &self.terrain.stone_noise),
            ("terrain.tree_noise.octaves", &self.terrain.tree_noise),
            ("terrain.warp.x.octaves", &self.terrain.warp.x),
            ("terrain.warp.z.octaves", &self.terrain.warp.z),
        ] {
            if noise.octaves == 0 {
                return Err(invalid(field, "must be at least 1"));
            }
        }
        if self.streaming.activations_per_tick == 0 {
            return Err(invalid(
                "streaming.activations_per_tick",
                "must be at least 1",
            ));
        }
        let interval = self.streaming.load_check_interval_secs;
        if interval.is_nan() || interval <= 0.0 {
            return Err(invalid(
                "streaming.load_check_interval_secs",
                "must be positive",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(false)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
