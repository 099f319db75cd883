//! The six axis-aligned directions a block face can point.

use glam::{IVec3, Vec3};
use strata_voxel::FaceTiles;

/// One of the six cardinal directions a block face can point.
///
/// North is +Z and East is +X.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaceDirection {
    /// +Y direction.
    Up = 0,
    /// −Y direction.
    Down = 1,
    /// +X direction.
    East = 2,
    /// −X direction.
    West = 3,
    /// +Z direction.
    North = 4,
    /// −Z direction.
    South = 5,
}

impl FaceDirection {
    /// All six directions, in emission order.
    pub const ALL: [FaceDirection; 6] = [
        Self::Up,
        Self::Down,
        Self::East,
        Self::West,
        Self::North,
        Self::South,
    ];

    /// Unit step toward the neighbour on this side.
    pub fn offset(self) -> IVec3 {
        match self {
            Self::Up => IVec3::Y,
            Self::Down => IVec3::NEG_Y,
            Self::East => IVec3::X,
            Self::West => IVec3::NEG_X,
            Self::North => IVec3::Z,
            Self::South => IVec3::NEG_Z,
        }
    }

    /// Returns the unit normal as `[f32; 3]` for this face direction.
    pub fn normal(self) -> [f32; 3] {
        self.offset().as_vec3().to_array()
    }

    /// Returns the opposite face direction.
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::North => Self::South,
            Self::South => Self::North,
        }
    }

    /// Returns the direction index (0–5).
    pub fn index(self) -> usize {
        self as usize
    }

    /// The four corners of this face of the unit block centred on `center`.
    ///
    /// The order is fixed per direction; triangles `{0,1,2}` and `{0,2,3}`
    /// share one winding across every face.
    pub fn quad_corners(self, center: Vec3) -> [[f32; 3]; 4] {
        let corners: [[f32; 3]; 4] = match self {
            Self::East => [
                [0.5, -0.5, -0.5],
                [0.5, 0.5, -0.5],
                [0.5, 0.5, 0.5],
                [0.5, -0.5, 0.5],
            ],
            Self::West => [
                [-0.5, -0.5, 0.5],
                [-0.5, 0.5, 0.5],
                [-0.5, 0.5, -0.5],
                [-0.5, -0.5, -0.5],
            ],
            Self::Down => [
                [-0.5, -0.5, -0.5],
                [0.5, -0.5, -0.5],
                [0.5, -0.5, 0.5],
                [-0.5, -0.5, 0.5],
            ],
            Self::Up => [
                [-0.5, 0.5, 0.5],
                [0.5, 0.5, 0.5],
                [0.5, 0.5, -0.5],
                [-0.5, 0.5, -0.5],
            ],
            Self::North => [
                [0.5, -0.5, 0.5],
                [0.5, 0.5, 0.5],
                [-0.5, 0.5, 0.5],
                [-0.5, -0.5, 0.5],
            ],
            Self::South => [
                [-0.5, -0.5, -0.5],
                [-0.5, 0.5, -0.5],
                [0.5, 0.5, -0.5],
                [0.5, -0.5, -0.5],
            ],
        };
        corners.map(|c| (center + Vec3::from_array(c)).to_array())
    }

    /// Atlas tile used by this face: top for Up, bottom for Down, side otherwise.
    pub fn tile(self, tiles: &FaceTiles) -> (u16, u16) {
        match self {
            Self::Up => tiles.top,
            Self::Down => tiles.bottom,
            _ => tiles.side,
        }
    }
}
