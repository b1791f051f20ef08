//! Mesh-to-renderable adapter: loads a CGNS file, extracts the grid point
//! coordinates of the first structured zone and owns the resulting GPU
//! point cloud together with the parsed metadata shown in the UI.

pub mod point_cloud;

pub use self::point_cloud::PointCloud;

use crate::renderer::pipelines::points::PointsPipeline;
use cgns::{GridCoordinates, Zone};
use glam::Vec3;
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file contains no bases")]
    NoBase,
    #[error("base {base:?} contains no zones")]
    NoZone { base: String },
    #[error("zone {zone:?} has an unsupported kind; only structured zones can be displayed")]
    UnsupportedZone { zone: String },
    #[error("zone {zone:?} has no grid coordinates")]
    NoGridCoordinates { zone: String },
    #[error("expected 3 coordinate arrays (X, Y, Z), found {found}")]
    CoordinateArrayCount { found: usize },
    #[error("coordinate array {name:?} holds {len} values, expected {expected}")]
    CoordinateLengthMismatch {
        name: String,
        len: usize,
        expected: usize,
    },
}

/// Packs the three coordinate arrays of a grid-coordinates node into one
/// interleaved (x0,y0,z0,x1,y1,z1,...) sequence.
///
/// X and Z are divided by 10 and Y is multiplied by 10. This is a view
/// normalization tuned to the sample data the original tool ships with,
/// not a general transform; keep it hardcoded until a camera exists.
pub fn pack_vertices(grid: &GridCoordinates) -> Result<Vec<f32>, LoadError> {
    if grid.data_arrays.len() != 3 {
        return Err(LoadError::CoordinateArrayCount {
            found: grid.data_arrays.len(),
        });
    }

    let (xs, ys, zs) = (
        &grid.data_arrays[0],
        &grid.data_arrays[1],
        &grid.data_arrays[2],
    );

    let n_points = xs.len();
    for array in [ys, zs] {
        if array.len() != n_points {
            return Err(LoadError::CoordinateLengthMismatch {
                name: array.name().to_owned(),
                len: array.len(),
                expected: n_points,
            });
        }
    }

    let vertices = (0..n_points)
        .into_par_iter()
        .flat_map_iter(|i| {
            [
                (xs.value(i) / 10.0) as f32,
                (ys.value(i) * 10.0) as f32,
                (zs.value(i) / 10.0) as f32,
            ]
        })
        .collect();

    Ok(vertices)
}

/// Locates the grid-coordinates node the viewer displays: the first node of
/// the first zone of the first base, which must be structured.
fn displayed_grid(root: &cgns::Root) -> Result<&GridCoordinates, LoadError> {
    let base = root.bases.first().ok_or(LoadError::NoBase)?;
    let zone = base.zones.first().ok_or_else(|| LoadError::NoZone {
        base: base.name.clone(),
    })?;

    let structured = match zone {
        Zone::Structured(z) => z,
        Zone::Unstructured(_) => {
            return Err(LoadError::UnsupportedZone {
                zone: zone.name().to_owned(),
            })
        }
    };

    structured
        .grid_coordinates
        .first()
        .ok_or_else(|| LoadError::NoGridCoordinates {
            zone: structured.name.clone(),
        })
}

/// Currently loaded mesh and its renderable form.
pub struct Scene {
    /// Material scalars; the fixed-color point shader does not consume them
    /// yet, they are only surfaced in the properties panel.
    pub color: Vec3,
    pub roughness: f32,
    pub metallic: f32,

    file: Option<PathBuf>,
    root: Option<cgns::Root>,
    cloud: Option<PointCloud>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            color: Vec3::new(1.0, 0.0, 0.0),
            roughness: 0.2,
            metallic: 0.1,
            file: None,
            root: None,
            cloud: None,
        }
    }

    /// Parses the file and replaces the current point cloud with one built
    /// from its first structured zone. On any error the previous state is
    /// left completely unchanged.
    pub fn load_file(&mut self, device: &wgpu::Device, path: &Path) -> Result<(), LoadError> {
        let root = cgns::read_file(path).map_err(|source| LoadError::Read {
            path: path.to_owned(),
            source,
        })?;

        let vertices = pack_vertices(displayed_grid(&root)?)?;
        let cloud = PointCloud::upload(device, &vertices);

        self.cloud = Some(cloud);
        self.root = Some(root);
        self.file = Some(path.to_owned());

        Ok(())
    }

    /// Whether a point cloud is loaded and will be drawn.
    pub fn is_loaded(&self) -> bool {
        self.cloud.is_some()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Parsed metadata for the tree view, if a file is loaded.
    pub fn root(&self) -> Option<&cgns::Root> {
        self.root.as_ref()
    }

    pub fn point_count(&self) -> u32 {
        self.cloud.as_ref().map_or(0, PointCloud::point_count)
    }

    /// Draws the point cloud when one is present; a no-op otherwise.
    pub fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, pipeline: &'a PointsPipeline) {
        if let Some(cloud) = &self.cloud {
            cloud.draw(pass, pipeline);
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgns::{Base, DataArray, Root, StructuredZone, UnstructuredZone};

    fn grid(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> GridCoordinates {
        GridCoordinates {
            name: "GridCoordinates".into(),
            data_arrays: vec![
                DataArray::Real64 {
                    name: "CoordinateX".into(),
                    data: x,
                },
                DataArray::Real64 {
                    name: "CoordinateY".into(),
                    data: y,
                },
                DataArray::Real64 {
                    name: "CoordinateZ".into(),
                    data: z,
                },
            ],
        }
    }

    fn root_with_zone(zone: Zone) -> Root {
        Root {
            bases: vec![Base {
                name: "Base".into(),
                cell_dimension: 3,
                physical_dimension: 3,
                zones: vec![zone],
                families: vec![],
            }],
        }
    }

    #[test]
    fn test_pack_interleaves_and_scales() {
        let grid = grid(vec![10.0, 20.0], vec![1.0, 2.0], vec![5.0, 15.0]);
        let packed = pack_vertices(&grid).unwrap();
        assert_eq!(packed, vec![1.0, 10.0, 0.5, 2.0, 20.0, 1.5]);
    }

    #[test]
    fn test_pack_output_length_is_three_per_point() {
        let n = 17;
        let coords = vec![0.25f64; n];
        let grid = grid(coords.clone(), coords.clone(), coords);
        assert_eq!(pack_vertices(&grid).unwrap().len(), 3 * n);
    }

    #[test]
    fn test_pack_accepts_real32_arrays() {
        let grid = GridCoordinates {
            name: "GridCoordinates".into(),
            data_arrays: vec![
                DataArray::Real32 {
                    name: "CoordinateX".into(),
                    data: vec![10.0],
                },
                DataArray::Real32 {
                    name: "CoordinateY".into(),
                    data: vec![1.0],
                },
                DataArray::Real32 {
                    name: "CoordinateZ".into(),
                    data: vec![5.0],
                },
            ],
        };
        assert_eq!(pack_vertices(&grid).unwrap(), vec![1.0, 10.0, 0.5]);
    }

    #[test]
    fn test_pack_rejects_wrong_array_count() {
        let mut grid = grid(vec![1.0], vec![2.0], vec![3.0]);
        grid.data_arrays.pop();
        assert!(matches!(
            pack_vertices(&grid),
            Err(LoadError::CoordinateArrayCount { found: 2 })
        ));
    }

    #[test]
    fn test_pack_rejects_length_mismatch() {
        let grid = grid(vec![1.0, 2.0], vec![3.0], vec![4.0, 5.0]);
        let err = pack_vertices(&grid).unwrap_err();
        assert!(matches!(
            err,
            LoadError::CoordinateLengthMismatch {
                len: 1,
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_displayed_grid_rejects_unstructured_zone() {
        let root = root_with_zone(Zone::Unstructured(UnstructuredZone {
            name: "tet-region".into(),
            vertex_count: 4,
            cell_count: 1,
            grid_coordinates: vec![grid(vec![0.0], vec![0.0], vec![0.0])],
        }));

        let err = displayed_grid(&root).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedZone { zone } if zone == "tet-region"));
    }

    #[test]
    fn test_displayed_grid_requires_base_zone_and_coordinates() {
        assert!(matches!(
            displayed_grid(&Root { bases: vec![] }),
            Err(LoadError::NoBase)
        ));

        let root = Root {
            bases: vec![Base {
                name: "Base".into(),
                cell_dimension: 3,
                physical_dimension: 3,
                zones: vec![],
                families: vec![],
            }],
        };
        assert!(matches!(
            displayed_grid(&root),
            Err(LoadError::NoZone { .. })
        ));

        let root = root_with_zone(Zone::Structured(StructuredZone {
            name: "blk-1".into(),
            vertex_counts: [0; 3],
            cell_counts: [0; 3],
            grid_coordinates: vec![],
        }));
        assert!(matches!(
            displayed_grid(&root),
            Err(LoadError::NoGridCoordinates { .. })
        ));
    }

    #[test]
    fn test_displayed_grid_picks_first_node() {
        let root = root_with_zone(Zone::Structured(StructuredZone {
            name: "blk-1".into(),
            vertex_counts: [2, 1, 1],
            cell_counts: [1, 0, 0],
            grid_coordinates: vec![
                grid(vec![10.0, 20.0], vec![1.0, 2.0], vec![5.0, 15.0]),
                grid(vec![0.0], vec![0.0], vec![0.0]),
            ],
        }));

        let packed = pack_vertices(displayed_grid(&root).unwrap()).unwrap();
        assert_eq!(packed, vec![1.0, 10.0, 0.5, 2.0, 20.0, 1.5]);
    }
}
