//! Block registry: maps compact [`BlockId`] values to [`BlockDef`] metadata and back.
//!
//! The registry is built once at startup. Air is always ID 0 so that freshly
//! allocated chunk memory represents empty space. Unknown names and IDs are
//! reported as errors rather than defaulted, since they indicate a data bug.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::atlas::AtlasLayout;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compact identifier stored inside every block cell (2 bytes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The air / unset sentinel.
    pub const AIR: BlockId = BlockId(0);

    /// Returns `true` for the air sentinel.
    pub fn is_air(self) -> bool {
        self == Self::AIR
    }
}

/// Atlas tile offsets (in whole tiles) for the three face groups of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceTiles {
    /// Tile used by the upward face.
    pub top: (u16, u16),
    /// Tile used by the downward face.
    pub bottom: (u16, u16),
    /// Tile used by the four side faces.
    pub side: (u16, u16),
}

/// Full descriptor for a block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    /// Human-readable name (e.g. "stone", "grass", "water").
    pub name: String,
    /// Occupies its cell for face culling. Liquids are solid so that
    /// adjacent liquid cells hide their shared faces.
    pub solid: bool,
    /// Lets neighbouring faces show through.
    pub transparent: bool,
    /// Contributes geometry to the collision mesh.
    pub collidable: bool,
    /// Atlas tiles. `None` for blocks that never emit faces.
    pub tiles: Option<FaceTiles>,
}

impl BlockDef {
    /// A solid, opaque, collidable block without tiles assigned yet.
    pub fn opaque(name: &str) -> Self {
        Self {
            name: name.to_string(),
            solid: true,
            transparent: false,
            collidable: true,
            tiles: None,
        }
    }

    /// A solid, transparent block. `collidable` picks whether it blocks movement.
    pub fn transparent(name: &str, collidable: bool) -> Self {
        Self {
            name: name.to_string(),
            solid: true,
            transparent: true,
            collidable,
            tiles: None,
        }
    }

    fn air() -> Self {
        Self {
            name: AIR_NAME.to_string(),
            solid: false,
            transparent: true,
            collidable: false,
            tiles: None,
        }
    }
}

/// Name under which the air sentinel is registered.
pub const AIR_NAME: &str = "air";

/// Errors raised by registration and lookup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A block with the same name has already been registered.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// All 65 536 slots have been consumed.
    #[error("block registry is full (max 65536 types)")]
    RegistryFull,
    /// No block is registered under this name.
    #[error("unknown block name: {0}")]
    UnknownName(String),
    /// No block is registered under this id.
    #[error("unknown block id: {0}")]
    UnknownId(u16),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`BlockId`] → [`BlockDef`] by index and names → [`BlockId`] by hash.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    /// Dense array where `index == BlockId.0`.
    blocks: Vec<BlockDef>,
    name_to_id: HashMap<String, BlockId>,
}

impl BlockRegistry {
    /// Creates a new registry with air pre-registered as ID 0.
    pub fn new() -> Self {
        let mut name_to_id = HashMap::new();
        name_to_id.insert(AIR_NAME.to_string(), BlockId::AIR);

        Self {
            blocks: vec![BlockDef::air()],
            name_to_id,
        }
    }

    /// Creates a registry holding the stock block set, with atlas tiles
    /// assigned in registration order.
    pub fn with_default_blocks() -> Self {
        let mut layout = AtlasLayout::default();
        let mut registry = Self::new();
        let defs = [
            BlockDef::opaque("stone"),
            BlockDef::opaque("dirt"),
            BlockDef::opaque("grass"),
            BlockDef::opaque("sand"),
            BlockDef::transparent("water", false),
            BlockDef::opaque("log"),
            BlockDef::transparent("oak_leaves", false),
            BlockDef::opaque("bedrock"),
            BlockDef::transparent("ice", true),
        ];
        for mut def in defs {
            def.tiles = layout.allocate();
            // The stock set is far below the registry and atlas limits.
            if let Err(err) = registry.register(def) {
                tracing::error!(%err, "stock block registration failed");
            }
        }
        registry
    }

    /// Registers a new block type and returns its assigned ID.
    ///
    /// IDs are assigned sequentially starting from 1 (0 is air).
    pub fn register(&mut self, def: BlockDef) -> Result<BlockId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if self.blocks.len() > u16::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }

        let id = BlockId(self.blocks.len() as u16);
        self.name_to_id.insert(def.name.clone(), id);
        self.blocks.push(def);
        Ok(id)
    }

    /// Returns the ID registered under `name`.
    pub fn id_of(&self, name: &str) -> Result<BlockId, RegistryError> {
        self.name_to_id
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::UnknownName(name.to_string()))
    }

    /// Returns the definition for `id`.
    pub fn data_of(&self, id: BlockId) -> Result<&BlockDef, RegistryError> {
        self.blocks
            .get(id.0 as usize)
            .ok_or(RegistryError::UnknownId(id.0))
    }

    /// Returns the definition registered under `name`.
    pub fn data_of_name(&self, name: &str) -> Result<&BlockDef, RegistryError> {
        self.id_of(name).and_then(|id| self.data_of(id))
    }

    /// Returns the definition for `id`, or `None` if it was never registered.
    pub fn get(&self, id: BlockId) -> Option<&BlockDef> {
        self.blocks.get(id.0 as usize)
    }

    /// Returns the total number of registered blocks (including air).
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if only air is registered.
    pub fn is_empty(&self) -> bool {
        self.blocks.len() <= 1
    }

    /// Iterates `(id, def)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &BlockDef)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, def)| (BlockId(i as u16), def))
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
