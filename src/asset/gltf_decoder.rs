//! glTF 2.0 decoding via the `gltf` crate
//!
//! The default scene (or the first scene when none is marked default) becomes
//! the graph root; its top-level nodes are the root's children. Every
//! animation in the document is kept as an explode clip.

use std::collections::HashMap;
use std::path::Path;

use cgmath::{Quaternion, Vector3};
use gltf::animation::util::ReadOutputs;
use log::{debug, warn};

use super::animation::{AnimationClip, Interpolation, Track, TrackValues};
use super::scene_graph::{MeshData, NodeId, SceneGraph, Transform};
use crate::error::LoadError;

pub fn decode_path(path: &Path) -> Result<(SceneGraph, Vec<AnimationClip>), LoadError> {
    let (document, buffers, _images) = gltf::import(path)?;
    build(&document, &buffers)
}

pub fn decode_bytes(bytes: &[u8]) -> Result<(SceneGraph, Vec<AnimationClip>), LoadError> {
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    build(&document, &buffers)
}

fn build(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<(SceneGraph, Vec<AnimationClip>), LoadError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(LoadError::NoSceneRoot)?;

    let mut graph = SceneGraph::new(scene.name().unwrap_or_default());
    let mut node_map: HashMap<usize, NodeId> = HashMap::new();

    let root = graph.root();
    for node in scene.nodes() {
        add_node_recursive(&mut graph, &mut node_map, buffers, root, &node);
    }

    let clips = document
        .animations()
        .enumerate()
        .map(|(i, animation)| read_animation(&animation, i, buffers, &node_map))
        .filter(|clip| !clip.tracks.is_empty())
        .collect();

    Ok((graph, clips))
}

fn read_transform(node: &gltf::Node) -> Transform {
    let (translation, rotation, scale) = node.transform().decomposed();
    Transform {
        translation: Vector3::from(translation),
        rotation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: Vector3::from(scale),
    }
}

fn add_node_recursive(
    graph: &mut SceneGraph,
    node_map: &mut HashMap<usize, NodeId>,
    buffers: &[gltf::buffer::Data],
    parent: NodeId,
    node: &gltf::Node,
) {
    let id = graph.add_node(parent, node.name().unwrap_or_default(), read_transform(node));
    node_map.insert(node.index(), id);

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if let Some(data) = read_primitive(&primitive, buffers) {
                graph.add_mesh(id, data);
            }
        }
    }

    for child in node.children() {
        add_node_recursive(graph, node_map, buffers, id, &child);
    }
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Option<MeshData> {
    if !matches!(primitive.mode(), gltf::mesh::Mode::Triangles) {
        debug!("skipping non-triangle primitive {:?}", primitive.mode());
        return None;
    }

    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| iter.collect())
        .unwrap_or_default();
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    let material = primitive.material();
    let mut base_color = material.pbr_metallic_roughness().base_color_factor();
    if matches!(material.alpha_mode(), gltf::material::AlphaMode::Opaque) {
        base_color[3] = 1.0;
    }

    Some(MeshData::new(positions, normals, indices, base_color))
}

fn read_animation(
    animation: &gltf::Animation,
    index: usize,
    buffers: &[gltf::buffer::Data],
    node_map: &HashMap<usize, NodeId>,
) -> AnimationClip {
    let mut tracks = Vec::new();

    for channel in animation.channels() {
        let target_index = channel.target().node().index();
        let Some(&node) = node_map.get(&target_index) else {
            // node outside the displayed scene
            continue;
        };

        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();

        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };

        let values = match reader.read_outputs() {
            Some(ReadOutputs::Translations(iter)) => {
                TrackValues::Translations(iter.map(Vector3::from).collect())
            }
            Some(ReadOutputs::Rotations(rotations)) => TrackValues::Rotations(
                rotations
                    .into_f32()
                    .map(|[x, y, z, w]| Quaternion::new(w, x, y, z))
                    .collect(),
            ),
            Some(ReadOutputs::Scales(iter)) => TrackValues::Scales(iter.map(Vector3::from).collect()),
            Some(ReadOutputs::MorphTargetWeights(_)) => {
                debug!("skipping morph target channel on node {target_index}");
                continue;
            }
            None => {
                warn!("animation channel on node {target_index} has no output data");
                continue;
            }
        };

        tracks.push(Track {
            node,
            times,
            values,
            interpolation,
        });
    }

    let name = animation
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("animation_{index}"));
    AnimationClip::new(name, tracks)
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    use super::*;

    /// One triangle at node "sec 1" under a "group" node, plus a translation
    /// animation moving "sec 1" along +X over one second.
    fn sample_gltf() -> Vec<u8> {
        let mut bin: Vec<u8> = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for t in [0.0f32, 1.0] {
            bin.extend_from_slice(&t.to_le_bytes());
        }
        for v in [0.0f32, 0.0, 0.0, 2.0, 0.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        let encoded = STANDARD.encode(&bin);

        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [ {{ "name": "Scene", "nodes": [0] }} ],
  "nodes": [
    {{ "name": "group", "children": [1] }},
    {{ "name": "sec 1", "mesh": 0 }}
  ],
  "meshes": [ {{ "primitives": [ {{ "attributes": {{ "POSITION": 0 }} }} ] }} ],
  "animations": [ {{
    "name": "Explode",
    "channels": [ {{ "sampler": 0, "target": {{ "node": 1, "path": "translation" }} }} ],
    "samplers": [ {{ "input": 1, "output": 2, "interpolation": "LINEAR" }} ]
  }} ],
  "buffers": [ {{ "byteLength": {len}, "uri": "data:application/octet-stream;base64,{encoded}" }} ],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 8 }},
    {{ "buffer": 0, "byteOffset": 44, "byteLength": 24 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
       "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5126, "count": 2, "type": "SCALAR",
       "min": [0.0], "max": [1.0] }},
    {{ "bufferView": 2, "componentType": 5126, "count": 2, "type": "VEC3" }}
  ]
}}"#,
            len = bin.len(),
        )
        .into_bytes()
    }

    #[test]
    fn test_decode_hierarchy_and_clip() {
        let (graph, clips) = decode_bytes(&sample_gltf()).unwrap();

        assert_eq!(graph.node(0).unwrap().name, "Scene");
        let group = graph.find_by_name("group").unwrap();
        let section = graph.find_by_name("sec 1").unwrap();
        assert_eq!(graph.node(section).unwrap().parent, Some(group));
        assert!(graph.is_renderable(section));
        assert!(!graph.is_renderable(group));

        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].name, "Explode");
        assert_eq!(clips[0].duration, 1.0);
        assert_eq!(clips[0].tracks[0].node, section);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            decode_bytes(b"{ not gltf"),
            Err(LoadError::Gltf(_))
        ));
    }
}
