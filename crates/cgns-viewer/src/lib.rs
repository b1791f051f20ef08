// src/lib.rs
//! Interactive viewer for CGNS mesh files.
//!
//! Loads the grid point coordinates of a structured zone and renders them
//! as a point cloud into an off-screen target composited into the egui UI.

pub mod app;
pub mod renderer;
pub mod scene;
pub mod ui;
