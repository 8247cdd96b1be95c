//! Wavefront OBJ decoding via `tobj`
//!
//! Each named object/group in the file becomes one child of the root.
//! Consecutive models that share a name (tobj splits an object per material)
//! are merged back into the same node. OBJ carries no animation, so the
//! resulting asset has no explode clips.

use std::path::Path;

use log::{debug, warn};

use super::scene_graph::{MeshData, SceneGraph, Transform};
use crate::error::LoadError;

const DEFAULT_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Decodes an OBJ file (and its MTL library, when present) from disk.
pub fn decode_path(path: &Path) -> Result<SceneGraph, LoadError> {
    let (models, materials) = tobj::load_obj(path, &load_options())?;
    let materials = materials.unwrap_or_else(|err| {
        debug!("no usable MTL for {}: {err}", path.display());
        Vec::new()
    });
    let root_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    build_graph(root_name, &models, &materials)
}

/// Decodes OBJ text held in memory. Material libraries cannot be resolved
/// without a file system, so every mesh gets the default colour.
pub fn decode_bytes(bytes: &[u8]) -> Result<SceneGraph, LoadError> {
    let mut reader = bytes;
    let (models, _materials) = tobj::load_obj_buf(&mut reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })?;
    build_graph(String::new(), &models, &[])
}

fn material_color(materials: &[tobj::Material], material_id: Option<usize>) -> [f32; 4] {
    let Some(mtl) = material_id.and_then(|id| materials.get(id)) else {
        return DEFAULT_COLOR;
    };
    let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)]
}

fn build_graph(
    root_name: String,
    models: &[tobj::Model],
    materials: &[tobj::Material],
) -> Result<SceneGraph, LoadError> {
    if models.is_empty() {
        return Err(LoadError::NoSceneRoot);
    }

    let mut graph = SceneGraph::new(root_name);
    let mut current: Option<(String, usize)> = None;

    for model in models {
        let mesh = &model.mesh;
        if mesh.positions.is_empty() || mesh.indices.is_empty() {
            warn!("skipping OBJ model '{}' without faces", model.name);
            continue;
        }

        let node = match &current {
            Some((name, node)) if *name == model.name => *node,
            _ => {
                let node = graph.add_node(graph.root(), model.name.clone(), Transform::default());
                current = Some((model.name.clone(), node));
                node
            }
        };

        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        let normals: Vec<[f32; 3]> = mesh
            .normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect();

        graph.add_mesh(
            node,
            MeshData::new(
                positions,
                normals,
                mesh.indices.clone(),
                material_color(materials, mesh.material_id),
            ),
        );
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_OBJECTS: &str = "\
o Section 1
v 0 0 0
v 1 0 0
v 1 1 0
f 1 2 3
o Housing
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
f 4 5 6 7
";

    #[test]
    fn test_decode_bytes_builds_one_node_per_object() {
        let graph = decode_bytes(TWO_OBJECTS.as_bytes()).unwrap();
        let root = graph.node(graph.root()).unwrap();
        assert_eq!(root.children.len(), 2);

        let names: Vec<&str> = root
            .children
            .iter()
            .map(|&c| graph.node(c).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["Section 1", "Housing"]);

        // quad face triangulated
        let housing = graph.node(root.children[1]).unwrap();
        assert_eq!(housing.meshes[0].triangle_count(), 2);
        assert_eq!(housing.meshes[0].base_color, DEFAULT_COLOR);
    }

    #[test]
    fn test_decode_path_reads_mtl_dissolve() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("part.mtl"),
            "newmtl glass\nKd 0.2 0.4 0.6\nd 0.5\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("part.obj"),
            "mtllib part.mtl\no lens\nusemtl glass\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
        )
        .unwrap();

        let graph = decode_path(&dir.path().join("part.obj")).unwrap();
        assert_eq!(graph.node(0).unwrap().name, "part");
        let lens = graph.node(1).unwrap();
        assert_eq!(lens.name, "lens");
        assert_eq!(lens.meshes[0].base_color, [0.2, 0.4, 0.6, 0.5]);
    }

    #[test]
    fn test_empty_obj_has_no_scene_root() {
        let result = decode_bytes(b"# nothing here\n");
        assert!(matches!(result, Err(LoadError::NoSceneRoot)));
    }
}
