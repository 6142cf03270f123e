//! Geometric helpers shared by the crystal models and the engine.

pub mod geometry;
