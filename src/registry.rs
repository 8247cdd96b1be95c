//! # Part Registry
//!
//! Derives the controllable parts of a loaded asset and the subset of them
//! that are "named sections" (parts whose name reads like `Section 4`,
//! `sec 12` or `SE3`). Named sections become the focus stages after the
//! overview and exploded stages.
//!
//! ## Part Discovery
//!
//! 1. Every direct child of the root with at least one mesh in its subtree
//!    is a part, in traversal order.
//! 2. If no child qualifies, mesh-carrying nodes are grouped by their
//!    immediate parent instead.
//!
//! The registry is rebuilt from scratch on every load and never mutated
//! structurally afterwards.

use log::debug;

use crate::asset::{NodeId, SceneGraph};
use crate::config::{IsolationConfig, SectionPromotion};

/// An independently controllable unit of the loaded asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// Position in the registry, stable for the lifetime of one load.
    pub index: usize,
    /// Name from the source asset. May be empty and is not unique.
    pub name: String,
    /// Scene graph node the part is rooted at.
    pub node: NodeId,
    /// Mesh-carrying nodes drawn as part of this part.
    pub renderables: Vec<NodeId>,
    /// Opacity at full visibility, captured from the material at load time.
    pub base_opacity: f32,
    pub(crate) is_visible: bool,
    pub(crate) opacity: f32,
}

impl Part {
    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    /// Opacity currently applied to the part's materials.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }
}

/// A part recognised as a numbered section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSection {
    pub part_index: usize,
    pub section_number: u32,
    /// The trimmed name that matched, as shown in stage UI.
    pub display_name: String,
}

/// Parses `sec N`, `se N` or `section N` (case-insensitive, whitespace
/// between token and number optional) and returns `N`. The whole trimmed
/// name must match.
///
/// ```
/// use explodeview::registry::parse_section_name;
///
/// assert_eq!(parse_section_name("Section 4"), Some(4));
/// assert_eq!(parse_section_name("sec4"), Some(4));
/// assert_eq!(parse_section_name("Section 4a"), None);
/// ```
pub fn parse_section_name(name: &str) -> Option<u32> {
    let lowered = name.trim().to_lowercase();
    let rest = ["section", "sec", "se"]
        .iter()
        .find_map(|token| lowered.strip_prefix(token))?;
    let digits = rest.trim_start();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Ordered parts plus their named-section view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartRegistry {
    parts: Vec<Part>,
    sections: Vec<NamedSection>,
    /// Trimmed name of every node, in traversal order.
    node_names: Vec<(String, NodeId)>,
}

impl PartRegistry {
    /// Builds the registry for `graph`.
    pub fn build(
        graph: &SceneGraph,
        promotion: SectionPromotion,
        isolation: &IsolationConfig,
    ) -> Self {
        let groups = Self::discover_parts(graph);

        let parts: Vec<Part> = groups
            .into_iter()
            .enumerate()
            .map(|(index, (node, renderables))| {
                let raw = renderables
                    .iter()
                    .filter_map(|&r| graph.node(r))
                    .flat_map(|n| n.meshes.iter())
                    .map(|m| m.opacity())
                    .next()
                    .unwrap_or(1.0);
                let base_opacity = Self::normalize_opacity(raw, isolation);
                Part {
                    index,
                    name: graph.node(node).map(|n| n.name.clone()).unwrap_or_default(),
                    node,
                    renderables,
                    base_opacity,
                    is_visible: true,
                    opacity: base_opacity,
                }
            })
            .collect();

        let mut sections: Vec<NamedSection> = parts
            .iter()
            .filter_map(|part| Self::match_section(graph, part, promotion))
            .collect();
        // stable: equal numbers keep traversal order
        sections.sort_by_key(|s| s.section_number);

        debug!(
            "registry built: {} parts, {} named sections",
            parts.len(),
            sections.len()
        );
        let node_names = graph
            .subtree(graph.root())
            .into_iter()
            .filter_map(|id| Some((graph.node(id)?.name.trim().to_string(), id)))
            .collect();

        Self {
            parts,
            sections,
            node_names,
        }
    }

    fn discover_parts(graph: &SceneGraph) -> Vec<(NodeId, Vec<NodeId>)> {
        let Some(root) = graph.node(graph.root()) else {
            return Vec::new();
        };

        let mut grouped: Vec<(NodeId, Vec<NodeId>)> = root
            .children
            .iter()
            .map(|&child| (child, graph.renderables_under(child)))
            .filter(|(_, renderables)| !renderables.is_empty())
            .collect();
        if !grouped.is_empty() {
            // meshes on the root itself form their own part, first in traversal order
            if root.is_renderable() {
                grouped.insert(0, (graph.root(), vec![graph.root()]));
            }
            return grouped;
        }

        // flat hierarchy: group mesh nodes by immediate parent
        let mut by_parent: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
        for leaf in graph.renderables_under(graph.root()) {
            let parent = graph.node(leaf).and_then(|n| n.parent).unwrap_or(leaf);
            match by_parent.iter_mut().find(|(p, _)| *p == parent) {
                Some((_, leaves)) => leaves.push(leaf),
                None => by_parent.push((parent, vec![leaf])),
            }
        }
        by_parent
    }

    /// Material opacity as captured at load. Near-zero alphas would leave a
    /// part permanently invisible and are treated as opaque.
    fn normalize_opacity(raw: f32, isolation: &IsolationConfig) -> f32 {
        if raw <= isolation.min_material_opacity {
            1.0
        } else {
            raw
        }
    }

    fn match_section(
        graph: &SceneGraph,
        part: &Part,
        promotion: SectionPromotion,
    ) -> Option<NamedSection> {
        // a root-level part would otherwise claim every section below it
        let own_name_only = part.node == graph.root();
        let candidates: Vec<NodeId> = match promotion {
            _ if own_name_only => vec![part.node],
            SectionPromotion::OwnName => vec![part.node],
            SectionPromotion::Descendants { max_depth } => graph
                .subtree_with_depth(part.node)
                .into_iter()
                .filter(|(_, depth)| max_depth.map_or(true, |max| *depth <= max))
                .map(|(id, _)| id)
                .collect(),
        };

        candidates.into_iter().find_map(|id| {
            let name = &graph.node(id)?.name;
            let number = parse_section_name(name)?;
            Some(NamedSection {
                part_index: part.index,
                section_number: number,
                display_name: name.trim().to_string(),
            })
        })
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub(crate) fn parts_mut(&mut self) -> &mut [Part] {
        &mut self.parts
    }

    pub fn part(&self, index: usize) -> Option<&Part> {
        self.parts.get(index)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn part_names(&self) -> Vec<String> {
        self.parts.iter().map(|p| p.name.clone()).collect()
    }

    /// Named sections sorted ascending by section number.
    pub fn named_sections(&self) -> &[NamedSection] {
        &self.sections
    }

    /// First node (in traversal order) whose trimmed name equals the trimmed
    /// `name`. Empty names never match.
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.node_names
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, id)| *id)
    }

    /// `2 + sections`, or 0 when there are no parts at all.
    pub fn total_stages(&self) -> usize {
        if self.parts.is_empty() {
            0
        } else {
            2 + self.sections.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{MeshData, Transform};

    fn triangle(alpha: f32) -> MeshData {
        MeshData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            Vec::new(),
            vec![0, 1, 2],
            [1.0, 1.0, 1.0, alpha],
        )
    }

    fn graph_with_parts(names: &[&str]) -> SceneGraph {
        let mut graph = SceneGraph::new("root");
        for name in names {
            let node = graph.add_node(0, *name, Transform::default());
            graph.add_mesh(node, triangle(1.0));
        }
        graph
    }

    fn build(graph: &SceneGraph, promotion: SectionPromotion) -> PartRegistry {
        PartRegistry::build(graph, promotion, &IsolationConfig::default())
    }

    #[test]
    fn test_section_name_boundaries() {
        assert_eq!(parse_section_name("Section 4"), Some(4));
        assert_eq!(parse_section_name("sec4"), Some(4));
        assert_eq!(parse_section_name("SE 4"), Some(4));
        assert_eq!(parse_section_name("  sec 12  "), Some(12));
        assert_eq!(parse_section_name("SECTION\t7"), Some(7));

        assert_eq!(parse_section_name("Section 4a"), None);
        assert_eq!(parse_section_name("foo sec 4"), None);
        assert_eq!(parse_section_name("sec"), None);
        assert_eq!(parse_section_name("sector 4"), None);
        assert_eq!(parse_section_name("sec -4"), None);
        assert_eq!(parse_section_name(""), None);
    }

    #[test]
    fn test_sections_sorted_regardless_of_traversal_order() {
        let graph = graph_with_parts(&["sec 3", "housing", "sec 1", "Section 10", "se 2"]);
        let registry = build(&graph, SectionPromotion::OwnName);

        assert_eq!(registry.len(), 5);
        let numbers: Vec<u32> = registry
            .named_sections()
            .iter()
            .map(|s| s.section_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 10]);
        assert_eq!(registry.named_sections()[0].part_index, 2);
        assert_eq!(registry.total_stages(), 6);
    }

    #[test]
    fn test_duplicate_section_numbers_keep_traversal_order() {
        let graph = graph_with_parts(&["sec 2", "sec 1", "SEC 2"]);
        let registry = build(&graph, SectionPromotion::OwnName);
        let order: Vec<usize> = registry
            .named_sections()
            .iter()
            .map(|s| s.part_index)
            .collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_descendant_promotion_only_in_mobile_mode() {
        let mut graph = SceneGraph::new("root");
        let body = graph.add_node(0, "Body", Transform::default());
        let marker = graph.add_node(body, "sec 5", Transform::default());
        graph.add_mesh(marker, triangle(1.0));

        let desktop = build(&graph, SectionPromotion::OwnName);
        assert!(desktop.named_sections().is_empty());

        let mobile = build(&graph, SectionPromotion::Descendants { max_depth: None });
        assert_eq!(mobile.named_sections().len(), 1);
        assert_eq!(mobile.named_sections()[0].section_number, 5);
        assert_eq!(mobile.named_sections()[0].part_index, 0);

        let shallow = build(&graph, SectionPromotion::Descendants { max_depth: Some(0) });
        assert!(shallow.named_sections().is_empty());
    }

    #[test]
    fn test_flat_hierarchy_falls_back_to_parent_grouping() {
        let mut graph = SceneGraph::new("root");
        graph.add_mesh(0, triangle(1.0));
        let registry = build(&graph, SectionPromotion::OwnName);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.parts()[0].node, 0);
        assert_eq!(registry.parts()[0].renderables, vec![0]);
    }

    #[test]
    fn test_children_without_meshes_are_not_parts() {
        let mut graph = graph_with_parts(&["a"]);
        graph.add_node(0, "empty", Transform::default());
        let registry = build(&graph, SectionPromotion::OwnName);
        assert_eq!(registry.part_names(), vec!["a".to_string()]);
    }

    #[test]
    fn test_base_opacity_normalization() {
        let mut graph = SceneGraph::new("root");
        for (name, alpha) in [("invisible", 0.0), ("glass", 0.4), ("nearly", 0.99)] {
            let node = graph.add_node(0, name, Transform::default());
            graph.add_mesh(node, triangle(alpha));
        }
        let registry = build(&graph, SectionPromotion::OwnName);
        let base: Vec<f32> = registry.parts().iter().map(|p| p.base_opacity).collect();
        assert_eq!(base, vec![1.0, 0.4, 0.99]);
    }

    #[test]
    fn test_root_meshes_form_their_own_part() {
        let mut graph = graph_with_parts(&["sec 1", "housing"]);
        graph.add_mesh(0, triangle(1.0));

        let registry = build(&graph, SectionPromotion::Descendants { max_depth: None });
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.parts()[0].node, 0);
        assert_eq!(registry.parts()[0].renderables, vec![0]);
        assert_eq!(registry.part_names()[1..], ["sec 1".to_string(), "housing".to_string()]);

        let sections = registry.named_sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].part_index, 1);
    }

    #[test]
    fn test_find_node_by_name_uses_trimmed_names() {
        let mut graph = graph_with_parts(&["  sec 1 ", "housing"]);
        let inner = graph.add_node(2, "screw", Transform::default());
        let registry = build(&graph, SectionPromotion::OwnName);

        assert_eq!(registry.find_node_by_name("sec 1"), Some(1));
        assert_eq!(registry.find_node_by_name("screw "), Some(inner));
        assert_eq!(registry.find_node_by_name("missing"), None);
        assert_eq!(registry.find_node_by_name("  "), None);
    }

    #[test]
    fn test_empty_registry_has_no_stages() {
        let graph = SceneGraph::new("root");
        let registry = build(&graph, SectionPromotion::OwnName);
        assert!(registry.is_empty());
        assert_eq!(registry.total_stages(), 0);
    }
}
