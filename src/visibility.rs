//! # Visibility and Isolation
//!
//! Two masking operations over the registry's parts. They touch the same
//! material state but mean different things and are kept apart:
//!
//! - [`isolate`] dims every part except one. Nothing is hidden, so dimmed
//!   parts stay in the scene as context.
//! - [`set_visible_mask`] hides every part outside a set outright.
//!
//! Every write goes to both the part record and the backend, for each
//! mesh-carrying node of the part.

use log::debug;

use crate::backend::SceneBackend;
use crate::config::IsolationConfig;
use crate::registry::{Part, PartRegistry};

/// Opacity a part returns to when it is not dimmed.
pub fn restored_opacity(part: &Part, config: &IsolationConfig) -> f32 {
    if part.base_opacity >= config.opaque_threshold {
        1.0
    } else {
        part.base_opacity
    }
}

fn apply_opacity<B: SceneBackend + ?Sized>(part: &mut Part, opacity: f32, backend: &mut B) {
    part.opacity = opacity;
    for &node in &part.renderables {
        backend.set_node_opacity(node, opacity);
    }
}

fn apply_visible<B: SceneBackend + ?Sized>(part: &mut Part, visible: bool, backend: &mut B) {
    part.is_visible = visible;
    for &node in &part.renderables {
        backend.set_node_visible(node, visible);
    }
}

/// Dims every part except `target` to `dim_opacity` (clamped to the
/// configured range). `None` restores all parts. Visibility flags are left
/// untouched.
pub fn isolate<B: SceneBackend + ?Sized>(
    registry: &mut PartRegistry,
    target: Option<usize>,
    dim_opacity: f32,
    config: &IsolationConfig,
    backend: &mut B,
) {
    let dim = dim_opacity.clamp(config.min_dim_opacity, config.max_dim_opacity);
    for part in registry.parts_mut() {
        let focused = target.map_or(true, |t| t == part.index);
        let opacity = if focused {
            restored_opacity(part, config)
        } else {
            dim
        };
        apply_opacity(part, opacity, backend);
    }
    debug!("isolate {:?} (dim {dim:.2})", target);
}

/// Shows exactly the parts in `indices` at their base opacity and hides the
/// rest at opacity 0. `None` shows everything.
pub fn set_visible_mask<B: SceneBackend + ?Sized>(
    registry: &mut PartRegistry,
    indices: Option<&[usize]>,
    config: &IsolationConfig,
    backend: &mut B,
) {
    for part in registry.parts_mut() {
        let shown = indices.map_or(true, |set| set.contains(&part.index));
        if shown {
            let opacity = restored_opacity(part, config);
            apply_visible(part, true, backend);
            apply_opacity(part, opacity, backend);
        } else {
            apply_visible(part, false, backend);
            apply_opacity(part, 0.0, backend);
        }
    }
    debug!("visible mask {:?}", indices);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{MeshData, SceneGraph, Transform};
    use crate::backend::HeadlessBackend;
    use crate::config::SectionPromotion;

    fn registry() -> PartRegistry {
        let mut graph = SceneGraph::new("root");
        for (name, alpha) in [("a", 1.0), ("glass", 0.4), ("c", 0.99)] {
            let node = graph.add_node(0, name, Transform::default());
            graph.add_mesh(
                node,
                MeshData::new(
                    vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                    Vec::new(),
                    vec![0, 1, 2],
                    [1.0, 1.0, 1.0, alpha],
                ),
            );
        }
        PartRegistry::build(&graph, SectionPromotion::OwnName, &IsolationConfig::default())
    }

    fn opacities(registry: &PartRegistry) -> Vec<f32> {
        registry.parts().iter().map(|p| p.opacity()).collect()
    }

    #[test]
    fn test_isolate_round_trip_restores_base_opacity() {
        let config = IsolationConfig::default();
        let mut registry = registry();
        let mut backend = HeadlessBackend::new();
        let restored: Vec<f32> = registry
            .parts()
            .iter()
            .map(|p| restored_opacity(p, &config))
            .collect();
        assert_eq!(restored, vec![1.0, 0.4, 1.0]);

        isolate(&mut registry, None, 0.22, &config, &mut backend);
        isolate(&mut registry, Some(1), 0.22, &config, &mut backend);
        assert_eq!(opacities(&registry), vec![0.22, 0.4, 0.22]);
        isolate(&mut registry, None, 0.22, &config, &mut backend);

        for (now, expected) in opacities(&registry).iter().zip(&restored) {
            assert!((now - expected).abs() < 1e-6);
        }
        assert!(registry.parts().iter().all(|p| p.is_visible()));
    }

    #[test]
    fn test_dim_is_clamped() {
        let config = IsolationConfig::default();
        let mut registry = registry();
        let mut backend = HeadlessBackend::new();

        isolate(&mut registry, Some(0), 0.0, &config, &mut backend);
        assert_eq!(registry.parts()[1].opacity(), 0.08);
        isolate(&mut registry, Some(0), 0.9, &config, &mut backend);
        assert_eq!(registry.parts()[1].opacity(), 0.5);
        assert_eq!(backend.node_opacity(registry.parts()[1].node), Some(0.5));
    }

    #[test]
    fn test_visible_mask_hides_outside_set() {
        let config = IsolationConfig::default();
        let mut registry = registry();
        let mut backend = HeadlessBackend::new();

        set_visible_mask(&mut registry, Some(&[1]), &config, &mut backend);
        let visible: Vec<bool> = registry.parts().iter().map(|p| p.is_visible()).collect();
        assert_eq!(visible, vec![false, true, false]);
        assert_eq!(opacities(&registry), vec![0.0, 0.4, 0.0]);
        assert_eq!(backend.node_visible(registry.parts()[0].node), Some(false));

        set_visible_mask(&mut registry, None, &config, &mut backend);
        assert!(registry.parts().iter().all(|p| p.is_visible()));
        assert_eq!(opacities(&registry), vec![1.0, 0.4, 1.0]);
    }

    #[test]
    fn test_isolate_does_not_unhide() {
        let config = IsolationConfig::default();
        let mut registry = registry();
        let mut backend = HeadlessBackend::new();
        set_visible_mask(&mut registry, Some(&[0]), &config, &mut backend);
        isolate(&mut registry, None, 0.22, &config, &mut backend);
        assert!(!registry.parts()[2].is_visible());
    }
}
