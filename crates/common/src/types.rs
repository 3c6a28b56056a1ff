use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Realm assumed for positions whose dimension was never recorded.
pub const DEFAULT_DIMENSION: &str = "minecraft:overworld";

/// Unique identity of a player.
///
/// Display names change and collide; this id is the only authoritative
/// handle for ownership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Integer block coordinate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn below(self) -> Self {
        Self::new(self.x, self.y - 1, self.z)
    }

    pub const fn north(self) -> Self {
        Self::new(self.x, self.y, self.z - 1)
    }

    pub const fn south(self) -> Self {
        Self::new(self.x, self.y, self.z + 1)
    }

    pub const fn east(self) -> Self {
        Self::new(self.x + 1, self.y, self.z)
    }

    pub const fn west(self) -> Self {
        Self::new(self.x - 1, self.y, self.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X: {}, Y: {}, Z: {}", self.x, self.y, self.z)
    }
}

/// Identity of a container: exact `(dimension, x, y, z)` match, nothing fuzzier.
///
/// Ordering is by dimension first, then position, which keeps tables keyed
/// by it deterministic on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerKey {
    pub dimension: String,
    pub pos: BlockPos,
}

impl ContainerKey {
    pub fn new(pos: BlockPos, dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            pos,
        }
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.dimension, self.pos.x, self.pos.y, self.pos.z
        )
    }
}
