//! # Marching Module
//!
//! The per-cell half of marching cubes: the constant case table and the cell that
//! reads it.
//!
//! ## Data Flow
//!
//! 1. A volume hands a [`Cell`] its eight corner samples
//! 2. The cell derives the case index from the threshold
//! 3. The case table names the crossed edges and how to connect them
//! 4. Each crossed edge is interpolated and the triangles are emitted in table order

pub mod case_table;
pub mod cell;

pub use cell::{interpolate_edge, Cell, CornerSample, Triangle};
