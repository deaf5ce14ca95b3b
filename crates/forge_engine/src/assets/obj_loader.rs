//! OBJ file loading
//!
//! Thin wrapper over tobj producing [`MeshData`]. Faces are triangulated
//! and re-indexed on load; missing normals fall back to +Y and missing
//! texture coordinates to the origin.

use std::path::Path;
use thiserror::Error;

use crate::render::mesh::{MeshData, Vertex};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("OBJ load error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file into mesh data
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<MeshData, AssetError> {
        let (models, _materials) = tobj::load_obj(
            path.as_ref(),
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )?;

        Self::from_models(&models)
    }

    fn from_models(models: &[tobj::Model]) -> Result<MeshData, AssetError> {
        let mut data = MeshData::default();

        for model in models {
            let mesh = &model.mesh;
            let base = data.vertices.len() as u32;

            let vertex_count = mesh.positions.len() / 3;
            for i in 0..vertex_count {
                let position = [
                    mesh.positions[3 * i],
                    mesh.positions[3 * i + 1],
                    mesh.positions[3 * i + 2],
                ];

                let normal = if mesh.normals.len() >= 3 * (i + 1) {
                    [mesh.normals[3 * i], mesh.normals[3 * i + 1], mesh.normals[3 * i + 2]]
                } else {
                    [0.0, 1.0, 0.0]
                };

                let uv = if mesh.texcoords.len() >= 2 * (i + 1) {
                    [mesh.texcoords[2 * i], mesh.texcoords[2 * i + 1]]
                } else {
                    [0.0, 0.0]
                };

                let color = if mesh.vertex_color.len() >= 3 * (i + 1) {
                    [
                        mesh.vertex_color[3 * i],
                        mesh.vertex_color[3 * i + 1],
                        mesh.vertex_color[3 * i + 2],
                    ]
                } else {
                    [1.0, 1.0, 1.0]
                };

                data.vertices.push(Vertex {
                    position,
                    color,
                    normal,
                    uv,
                });
            }

            data.indices.extend(mesh.indices.iter().map(|&i| base + i));
        }

        if data.vertices.is_empty() {
            return Err(AssetError::InvalidModel("No vertices found in OBJ file".to_string()));
        }

        log::debug!(
            "Loaded OBJ: {} vertices, {} indices across {} model(s)",
            data.vertices.len(),
            data.indices.len(),
            models.len()
        );

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    const TRIANGLE_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 1.0
f 1//1 2//1 3//1
";

    fn load_str(source: &str) -> Result<MeshData, AssetError> {
        let mut reader = BufReader::new(source.as_bytes());
        let (models, _) = tobj::load_obj_buf(
            &mut reader,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
            |_| Ok((Vec::new(), Default::default())),
        )
        .expect("obj parse failed");
        ObjLoader::from_models(&models)
    }

    #[test]
    fn test_triangle_loads_with_normals() {
        let data = load_str(TRIANGLE_OBJ).unwrap();

        assert_eq!(data.vertices.len(), 3);
        assert_eq!(data.indices.len(), 3);
        for vertex in &data.vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_quad_is_triangulated() {
        let quad = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
f 1 2 3 4
";
        let data = load_str(quad).unwrap();

        // One quad becomes two triangles
        assert_eq!(data.indices.len(), 6);
    }

    #[test]
    fn test_empty_obj_is_rejected() {
        let result = load_str("# nothing here\n");
        assert!(matches!(result, Err(AssetError::InvalidModel(_))));
    }
}
