//! # Scene Graph
//!
//! Normalized in-memory form of a decoded asset: a tree of named nodes with
//! rest transforms, some of which carry triangle meshes.
//!
//! Nodes are stored parent-before-child, so world matrices can be composed
//! in a single forward pass over the node list. Node `0` is always the root.

use cgmath::{
    EuclideanSpace, InnerSpace, Matrix4, Point3, Quaternion, SquareMatrix, Transform as _,
    Vector3, Zero,
};

/// Index of a node inside its [`SceneGraph`].
pub type NodeId = usize;

/// Local translation / rotation / scale of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vector3::zero(),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Composes `T * R * S`.
    pub fn matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.translation);
        let r = Matrix4::from(self.rotation.normalize());
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        t * r * s
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Bounds {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create bounds from a set of points. Returns `None` for an empty slice.
    pub fn from_points(points: &[[f32; 3]]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self::new(Vector3::from(*first), Vector3::from(*first));
        for p in points.iter().skip(1) {
            bounds.expand_point(Vector3::from(*p));
        }
        Some(bounds)
    }

    pub fn expand_point(&mut self, p: Vector3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        let mut merged = *self;
        merged.expand_point(other.min);
        merged.expand_point(other.max);
        merged
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::from_vec((self.min + self.max) * 0.5)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }

    /// Bounds of the eight corners after applying `matrix`.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Bounds {
        let mut out: Option<Bounds> = None;
        for i in 0..8 {
            let corner = Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = matrix.transform_point(corner);
            let v = Vector3::new(p.x, p.y, p.z);
            match out.as_mut() {
                Some(b) => b.expand_point(v),
                None => out = Some(Bounds::new(v, v)),
            }
        }
        out.unwrap_or(*self)
    }
}

/// Triangle mesh attached to a node, with its material colour.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    /// RGBA base colour; alpha is the material opacity.
    pub base_color: [f32; 4],
}

impl MeshData {
    /// Builds a mesh, computing per-vertex normals when none (or a mismatched
    /// count) are supplied.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        indices: Vec<u32>,
        base_color: [f32; 4],
    ) -> Self {
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            Self::calculate_vertex_normals(&positions, &indices)
        };
        Self {
            positions,
            normals,
            indices,
            base_color,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.base_color[3]
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.positions)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Averages the face normals touching each vertex.
    pub fn calculate_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut sums = vec![Vector3::<f32>::zero(); positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
                continue;
            }
            let v0 = Vector3::from(positions[i0]);
            let v1 = Vector3::from(positions[i1]);
            let v2 = Vector3::from(positions[i2]);
            let face_normal = (v1 - v0).cross(v2 - v0);
            for idx in [i0, i1, i2] {
                sums[idx] += face_normal;
            }
        }

        sums.into_iter()
            .map(|n| {
                if n.magnitude2() > 0.0 {
                    n.normalize().into()
                } else {
                    [0.0, 1.0, 0.0]
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Rest (bind) transform relative to the parent.
    pub transform: Transform,
    pub meshes: Vec<MeshData>,
}

impl SceneNode {
    pub fn is_renderable(&self) -> bool {
        self.meshes.iter().any(|m| !m.indices.is_empty())
    }
}

/// Local transforms for every node of a graph at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub locals: Vec<Transform>,
}

/// Tree of [`SceneNode`]s rooted at node `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Creates a graph holding only a root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![SceneNode {
                name: root_name.into(),
                parent: None,
                children: Vec::new(),
                transform: Transform::default(),
                meshes: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    /// Adds a child of `parent` and returns its id.
    ///
    /// # Panics
    /// Panics if `parent` is not an existing node.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
    ) -> NodeId {
        assert!(parent < self.nodes.len(), "parent node {parent} does not exist");
        let id = self.nodes.len();
        self.nodes.push(SceneNode {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            transform,
            meshes: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn add_mesh(&mut self, node: NodeId, mesh: MeshData) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.meshes.push(mesh);
        }
    }

    pub fn set_root_transform(&mut self, transform: Transform) {
        self.nodes[0].transform = transform;
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_renderable(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(SceneNode::is_renderable)
    }

    /// Pre-order traversal of the subtree rooted at `id`, including `id`.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Subtree nodes paired with their depth below `id` (`id` itself is depth 0).
    pub fn subtree_with_depth(&self, id: NodeId) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![(id, 0)];
        while let Some((current, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push((current, depth));
            stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
        }
        out
    }

    /// Mesh-carrying nodes in the subtree rooted at `id`, in traversal order.
    pub fn renderables_under(&self, id: NodeId) -> Vec<NodeId> {
        self.subtree(id)
            .into_iter()
            .filter(|&n| self.is_renderable(n))
            .collect()
    }

    /// First node (pre-order from the root) whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.subtree(self.root())
            .into_iter()
            .find(|&id| self.nodes[id].name == name)
    }

    pub fn rest_pose(&self) -> Pose {
        Pose {
            locals: self.nodes.iter().map(|n| n.transform).collect(),
        }
    }

    /// World matrix for every node, with `root_transform` applied above the root.
    pub fn world_matrices(&self, pose: &Pose, root_transform: Matrix4<f32>) -> Vec<Matrix4<f32>> {
        let mut worlds: Vec<Matrix4<f32>> = Vec::with_capacity(self.nodes.len());
        for (id, node) in self.nodes.iter().enumerate() {
            let local = pose
                .locals
                .get(id)
                .copied()
                .unwrap_or(node.transform)
                .matrix();
            let parent_world = node
                .parent
                .and_then(|p| worlds.get(p).copied())
                .unwrap_or(root_transform);
            worlds.push(parent_world * local);
        }
        worlds
    }

    /// World-space bounds of every mesh under `id`.
    pub fn bounds_of(&self, id: NodeId, worlds: &[Matrix4<f32>]) -> Option<Bounds> {
        let mut out: Option<Bounds> = None;
        for node_id in self.renderables_under(id) {
            let world = worlds.get(node_id).copied().unwrap_or_else(Matrix4::identity);
            for mesh in &self.nodes[node_id].meshes {
                let Some(local) = mesh.bounds() else {
                    continue;
                };
                let b = local.transformed(&world);
                out = Some(match out {
                    Some(acc) => acc.union(&b),
                    None => b,
                });
            }
        }
        out
    }

    /// World position used to aim the camera at a node: the center of its
    /// geometry if it has any, otherwise its origin.
    pub fn focus_point(&self, id: NodeId, worlds: &[Matrix4<f32>]) -> Option<Point3<f32>> {
        if id >= self.nodes.len() {
            return None;
        }
        if let Some(bounds) = self.bounds_of(id, worlds) {
            return Some(bounds.center());
        }
        let world = worlds.get(id)?;
        Some(world.transform_point(Point3::new(0.0, 0.0, 0.0)))
    }
}
