//! # Neighbours Module
//!
//! The eight horizontal directions a chunk can have a neighbour in, and the
//! presence set a volume is marched against.
//!
//! Neighbours are never referenced directly. The world looks them up by grid
//! coordinate and only tells a volume which slots are occupied.

use cgmath::{Point3, Vector3};
use num_derive::FromPrimitive;

/// A horizontal direction from one chunk to another.
///
/// The values index [`Neighbours`] and match the order of [`NeighbourDirection::all`].
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum NeighbourDirection {
    /// Towards negative X
    Front = 0,
    /// Towards positive X
    Back = 1,
    /// Towards negative Z
    Left = 2,
    /// Towards positive Z
    Right = 3,
    /// Negative X, negative Z
    FrontLeft = 4,
    /// Negative X, positive Z
    FrontRight = 5,
    /// Positive X, negative Z
    BackLeft = 6,
    /// Positive X, positive Z
    BackRight = 7,
}

impl NeighbourDirection {
    /// All eight directions, cardinals first.
    pub fn all() -> [NeighbourDirection; 8] {
        [
            NeighbourDirection::Front,
            NeighbourDirection::Back,
            NeighbourDirection::Left,
            NeighbourDirection::Right,
            NeighbourDirection::FrontLeft,
            NeighbourDirection::FrontRight,
            NeighbourDirection::BackLeft,
            NeighbourDirection::BackRight,
        ]
    }

    /// The four directions that share a face with the chunk.
    pub fn cardinals() -> [NeighbourDirection; 4] {
        [
            NeighbourDirection::Front,
            NeighbourDirection::Back,
            NeighbourDirection::Left,
            NeighbourDirection::Right,
        ]
    }

    /// Converts a slot index back into a direction.
    pub fn from_index(index: u8) -> Option<Self> {
        num_traits::FromPrimitive::from_u8(index)
    }

    /// Whether this direction shares a face (rather than only a corner column).
    pub fn is_cardinal(self) -> bool {
        (self as u8) < 4
    }

    /// The direction of a horizontal grid step, or `None` for `(0, 0)` and steps
    /// longer than one chunk.
    pub fn from_offset(dx: i32, dz: i32) -> Option<Self> {
        NeighbourDirection::all()
            .into_iter()
            .find(|direction| direction.offset() == Vector3::new(dx, 0, dz))
    }

    /// The grid step from a chunk to its neighbour in this direction.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            NeighbourDirection::Front => Vector3::new(-1, 0, 0),
            NeighbourDirection::Back => Vector3::new(1, 0, 0),
            NeighbourDirection::Left => Vector3::new(0, 0, -1),
            NeighbourDirection::Right => Vector3::new(0, 0, 1),
            NeighbourDirection::FrontLeft => Vector3::new(-1, 0, -1),
            NeighbourDirection::FrontRight => Vector3::new(-1, 0, 1),
            NeighbourDirection::BackLeft => Vector3::new(1, 0, -1),
            NeighbourDirection::BackRight => Vector3::new(1, 0, 1),
        }
    }
}

/// Which neighbour slots of a chunk are occupied.
///
/// This is a snapshot. It must be rebuilt whenever chunks are added or removed
/// around the chunk it describes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Neighbours {
    present: [bool; 8],
}

impl Neighbours {
    /// A chunk standing alone.
    pub fn none() -> Self {
        Neighbours::default()
    }

    /// Builds the presence set of the chunk at `position` from a lookup.
    pub fn from_lookup(position: Point3<i32>, is_occupied: impl Fn(Point3<i32>) -> bool) -> Self {
        let mut neighbours = Neighbours::none();
        for direction in NeighbourDirection::all() {
            neighbours.set(direction, is_occupied(position + direction.offset()));
        }
        neighbours
    }

    /// Marks a slot as occupied or free.
    pub fn set(&mut self, direction: NeighbourDirection, present: bool) {
        self.present[direction as usize] = present;
    }

    /// Returns the same set with `direction` occupied.
    pub fn with(mut self, direction: NeighbourDirection) -> Self {
        self.set(direction, true);
        self
    }

    /// Whether a neighbour exists in `direction`.
    pub fn has(&self, direction: NeighbourDirection) -> bool {
        self.present[direction as usize]
    }

    /// Iterates the occupied directions.
    pub fn iter(&self) -> impl Iterator<Item = NeighbourDirection> + '_ {
        self.present
            .iter()
            .enumerate()
            .filter(|(_, &present)| present)
            .filter_map(|(index, _)| NeighbourDirection::from_index(index as u8))
    }

    /// Number of occupied slots.
    pub fn count(&self) -> usize {
        self.present.iter().filter(|&&present| present).count()
    }
}
