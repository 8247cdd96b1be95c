//! # Viewer
//!
//! One explicitly owned viewer instance: the loaded asset, its parts, the
//! explode and stage state, the camera rig, gesture handling and the XR
//! session, all pushing their results into a [`SceneBackend`].
//!
//! Nothing is global. Create as many viewers as needed with
//! [`create_viewer`] and tear each down with [`Viewer::dispose`].
//!
//! ## Usage
//!
//! ```no_run
//! use explodeview::asset::AssetSource;
//! use explodeview::backend::HeadlessBackend;
//! use explodeview::config::ViewerConfig;
//! use explodeview::viewer::create_viewer;
//!
//! let mut viewer = create_viewer(ViewerConfig::default(), HeadlessBackend::new());
//! pollster::block_on(viewer.load_asset(AssetSource::path("product.glb")))?;
//!
//! viewer.next_stage();
//! viewer.tick(1.0 / 60.0);
//! println!("stage {} of {}", viewer.current_stage(), viewer.total_stages());
//! # Ok::<(), explodeview::error::ViewerError>(())
//! ```
//!
//! ## Frame Order
//!
//! [`Viewer::tick`] advances the explode clips and pushes node transforms,
//! then smooths the camera (target and dolly), polls the XR runtime, and
//! finally hands the camera to the backend.

use cgmath::{EuclideanSpace, Matrix4, Point3, SquareMatrix};
use log::{debug, error, info, warn};

use crate::asset::{AssetLoader, AssetSource, LoadedAsset};
use crate::backend::SceneBackend;
use crate::camera::{CameraRig, OrbitControls};
use crate::config::ViewerConfig;
use crate::error::{ViewerError, XrError};
use crate::explode::{ExplodeController, ExplodeState};
use crate::gesture::{GestureRouter, InputEvent, Intent};
use crate::registry::{NamedSection, PartRegistry};
use crate::stage::{ExplodeTarget, Stage, StageSequencer};
use crate::visibility;
use crate::xr::{XrMode, XrRuntime, XrSession, XrState, XrUpdate};

/// User-facing notifications the host should surface (toast, status line).
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    XrUnsupported(XrMode),
    XrRejected(String),
    XrEnded,
}

struct LoadedScene {
    asset: LoadedAsset,
    registry: PartRegistry,
}

pub struct Viewer<B: SceneBackend> {
    config: ViewerConfig,
    backend: B,
    scene: Option<LoadedScene>,
    rig: CameraRig,
    controls: OrbitControls,
    router: GestureRouter,
    explode: ExplodeController,
    sequencer: StageSequencer,
    placement: Matrix4<f32>,
    transforms_dirty: bool,
    exposure: f32,
    xr: XrSession,
    xr_runtime: Option<Box<dyn XrRuntime>>,
    notices: Vec<Notice>,
}

/// Creates a viewer drawing through `backend`. No asset is loaded yet.
pub fn create_viewer<B: SceneBackend>(config: ViewerConfig, backend: B) -> Viewer<B> {
    Viewer::new(config, backend)
}

impl<B: SceneBackend> Viewer<B> {
    pub fn new(config: ViewerConfig, mut backend: B) -> Self {
        let rig = CameraRig::new(config.camera);
        let exposure = 1.0;
        backend.set_lighting(
            config.profile.light_rig,
            config.profile.environment_intensity,
        );
        backend.set_exposure(exposure);
        backend.set_camera(&rig.view());

        Self {
            config,
            backend,
            scene: None,
            rig,
            controls: OrbitControls::default(),
            router: GestureRouter::new(config.gestures),
            explode: ExplodeController::new(config.explode),
            sequencer: StageSequencer::new(),
            placement: Matrix4::identity(),
            transforms_dirty: false,
            exposure,
            xr: XrSession::new(),
            xr_runtime: None,
            notices: Vec::new(),
        }
    }

    /// Decodes `source` and swaps it in. On error the current asset, if
    /// any, stays loaded and displayed.
    pub async fn load_asset(&mut self, source: AssetSource) -> Result<(), ViewerError> {
        info!("loading asset {}", source.describe());
        let asset = AssetLoader::decode(&source).map_err(|err| {
            error!("failed to load {}: {err}", source.describe());
            ViewerError::from(err)
        })?;
        self.load_decoded(asset)
    }

    /// Swaps in an already decoded asset: detach the old one, attach the
    /// new one, fit the camera and apply stage 0.
    pub fn load_decoded(&mut self, asset: LoadedAsset) -> Result<(), ViewerError> {
        let asset = if self.config.profile.center_pivot {
            asset.with_centered_pivot()
        } else {
            asset
        };
        let mut registry = PartRegistry::build(
            &asset.graph,
            self.config.profile.section_promotion,
            &self.config.isolation,
        );

        self.backend.detach_asset();
        if let Err(err) = self.backend.attach_asset(&asset) {
            error!("backend rejected asset: {err}");
            self.restore_previous_scene();
            return Err(err);
        }

        info!(
            "loaded asset: {} parts, {} named sections, {} clips",
            registry.len(),
            registry.named_sections().len(),
            asset.clips.len()
        );

        self.placement = Matrix4::identity();
        self.explode.load(&asset.graph, &asset.clips);
        self.rig.fit_to_bounds(&asset.view_bounds());
        self.sequencer.reset(registry.total_stages());
        visibility::set_visible_mask(&mut registry, None, &self.config.isolation, &mut self.backend);
        self.scene = Some(LoadedScene { asset, registry });

        self.apply_stage();
        self.push_transforms();
        self.backend.set_camera(&self.rig.view());
        Ok(())
    }

    fn restore_previous_scene(&mut self) {
        let Some(scene) = &self.scene else {
            return;
        };
        if let Err(err) = self.backend.attach_asset(&scene.asset) {
            warn!("could not restore previous asset: {err}");
            return;
        }
        for part in scene.registry.parts() {
            for &node in &part.renderables {
                self.backend.set_node_opacity(node, part.opacity());
                self.backend.set_node_visible(node, part.is_visible());
            }
        }
        self.push_transforms();
    }

    /// Applies the current stage's plan in full.
    fn apply_stage(&mut self) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        let plan = self.sequencer.plan(scene.registry.named_sections());
        debug!(
            "applying stage {}/{}: {:?}",
            self.sequencer.current(),
            self.sequencer.total(),
            plan.stage
        );

        match plan.explode {
            ExplodeTarget::Overview => self.explode.enter_overview(&mut self.rig),
            ExplodeTarget::Exploded => self.explode.enter_exploded(&mut self.rig),
        }
        visibility::isolate(
            &mut scene.registry,
            plan.isolate,
            self.config.isolation.dim_opacity,
            &self.config.isolation,
            &mut self.backend,
        );
        self.transforms_dirty = true;

        let target = plan.target_name.as_deref().and_then(|name| self.resolve_target(name));
        self.rig.set_desired_target(target);
    }

    /// World position of the node called `name` in the layout the explode
    /// controller is heading to. `None` (centroid) when the name is unknown.
    fn resolve_target(&self, name: &str) -> Option<Point3<f32>> {
        let scene = self.scene.as_ref()?;
        let Some(node) = scene.registry.find_node_by_name(name) else {
            warn!("camera target '{name}' not found, using centroid");
            return None;
        };
        scene
            .asset
            .node_focus(node, &self.explode.settled_pose(), self.placement)
    }

    fn push_transforms(&mut self) {
        self.transforms_dirty = false;
        let Some(scene) = &self.scene else {
            return;
        };
        let graph = &scene.asset.graph;
        let worlds = graph.world_matrices(
            &self.explode.current_pose(),
            scene.asset.root_transform(self.placement),
        );
        for (id, world) in worlds.into_iter().enumerate() {
            if graph.is_renderable(id) {
                self.backend.set_node_transform(id, world);
            }
        }
    }

    /// Advances the viewer by `dt` seconds of real time.
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let animating = self.explode.is_animating();
        self.explode.tick(dt);
        if animating || self.transforms_dirty {
            self.push_transforms();
        }

        self.rig.tick(dt);
        self.poll_xr();
        if self.transforms_dirty {
            self.push_transforms();
        }
        self.backend.set_camera(&self.rig.view());
    }

    fn poll_xr(&mut self) {
        let Some(runtime) = self.xr_runtime.as_deref_mut() else {
            return;
        };
        let updates = self.xr.poll(runtime);
        for update in updates {
            match update {
                XrUpdate::Place(point) => {
                    debug!("placing asset at {point:?}");
                    self.placement = Matrix4::from_translation(point.to_vec());
                    self.transforms_dirty = true;
                }
                XrUpdate::StateChanged(XrState::Ended) => {
                    self.placement = Matrix4::identity();
                    self.transforms_dirty = true;
                    self.notices.push(Notice::XrEnded);
                }
                XrUpdate::StateChanged(_) => {}
                XrUpdate::Failed(err) => self.notices.push(Notice::XrRejected(err.to_string())),
            }
        }
    }

    /// Routes a raw input event through the gesture router and the orbit
    /// controls.
    pub fn handle_input(&mut self, event: &InputEvent) {
        let intent = self.router.handle(event);
        self.controls.process_event(
            event,
            self.router.orbit_suppressed(),
            self.router.active_touches(),
            &mut self.rig,
        );
        match intent {
            Some(Intent::DollyBy(factor)) => self.rig.dolly(factor),
            Some(Intent::ChangeStage(delta)) => {
                self.sequencer.step(i64::from(delta));
                self.apply_stage();
            }
            None => {}
        }
    }

    // Commands

    pub fn set_stage(&mut self, index: usize) -> usize {
        let stage = self.sequencer.set(index as i64);
        self.apply_stage();
        stage
    }

    pub fn next_stage(&mut self) -> usize {
        let stage = self.sequencer.next();
        self.apply_stage();
        stage
    }

    pub fn previous_stage(&mut self) -> usize {
        let stage = self.sequencer.previous();
        self.apply_stage();
        stage
    }

    pub fn set_exposure(&mut self, exposure: f32) {
        if !exposure.is_finite() {
            return;
        }
        self.exposure = exposure.max(0.0);
        self.backend.set_exposure(self.exposure);
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        self.rig.set_auto_rotate(enabled);
    }

    /// Back to stage 0 with every part shown and the camera at its home pose.
    pub fn reset_to_overview(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            visibility::set_visible_mask(
                &mut scene.registry,
                None,
                &self.config.isolation,
                &mut self.backend,
            );
        }
        self.sequencer.set(0);
        self.apply_stage();
        self.rig.reset();
        self.backend.set_camera(&self.rig.view());
    }

    /// Continuous explode control; see [`ExplodeController::set_explode_amount`].
    pub fn set_explode_amount(&mut self, amount: f32) {
        self.explode.set_explode_amount(amount, &mut self.rig);
        self.transforms_dirty = true;
    }

    /// Shows only the parts at `indices`; `None` shows every part.
    pub fn show_only(&mut self, indices: Option<&[usize]>) {
        if let Some(scene) = self.scene.as_mut() {
            visibility::set_visible_mask(
                &mut scene.registry,
                indices,
                &self.config.isolation,
                &mut self.backend,
            );
        }
    }

    pub fn set_xr_runtime(&mut self, runtime: Box<dyn XrRuntime>) {
        if let Some(old) = self.xr_runtime.as_deref_mut() {
            self.xr.end(old);
        }
        self.xr = XrSession::new();
        self.xr_runtime = Some(runtime);
    }

    /// Asks the host runtime for an immersive session showing the asset.
    /// Unsupported modes are also reported as [`Notice::XrUnsupported`].
    pub fn enter_xr(&mut self, mode: XrMode) -> Result<(), XrError> {
        let Some(runtime) = self.xr_runtime.as_deref_mut() else {
            warn!("no XR runtime registered");
            self.notices.push(Notice::XrUnsupported(mode));
            return Err(XrError::NoRuntime);
        };
        let Some(scene) = &self.scene else {
            return Err(XrError::Rejected("no asset loaded".to_string()));
        };
        let root = scene.asset.graph.root();
        match self.xr.request(runtime, mode, root) {
            Ok(()) => Ok(()),
            Err(XrError::Unsupported(mode)) => {
                self.notices.push(Notice::XrUnsupported(mode));
                Err(XrError::Unsupported(mode))
            }
            Err(err) => {
                self.notices.push(Notice::XrRejected(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn exit_xr(&mut self) {
        let Some(runtime) = self.xr_runtime.as_deref_mut() else {
            return;
        };
        if self.xr.end(runtime) {
            self.placement = Matrix4::identity();
            self.transforms_dirty = true;
        }
    }

    /// Drains pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.rig.resize(width, height);
    }

    /// Tears the viewer down and hands the backend back.
    pub fn dispose(mut self) -> B {
        if let Some(runtime) = self.xr_runtime.as_deref_mut() {
            self.xr.end(runtime);
        }
        if self.scene.take().is_some() {
            self.backend.detach_asset();
        }
        self.explode.clear();
        info!("viewer disposed");
        self.backend
    }

    // Queries

    pub fn is_loaded(&self) -> bool {
        self.scene.is_some()
    }

    pub fn part_names(&self) -> Vec<String> {
        self.scene
            .as_ref()
            .map(|s| s.registry.part_names())
            .unwrap_or_default()
    }

    pub fn part_count(&self) -> usize {
        self.scene.as_ref().map_or(0, |s| s.registry.len())
    }

    pub fn named_sections(&self) -> &[NamedSection] {
        self.scene
            .as_ref()
            .map(|s| s.registry.named_sections())
            .unwrap_or(&[])
    }

    pub fn current_stage(&self) -> usize {
        self.sequencer.current()
    }

    pub fn total_stages(&self) -> usize {
        self.sequencer.total()
    }

    pub fn current_stage_kind(&self) -> Stage {
        self.sequencer.stage(self.named_sections())
    }

    pub fn explode_state(&self) -> ExplodeState {
        self.explode.state()
    }

    pub fn xr_state(&self) -> XrState {
        self.xr.state()
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn placement(&self) -> Matrix4<f32> {
        self.placement
    }

    pub fn registry(&self) -> Option<&PartRegistry> {
        self.scene.as_ref().map(|s| &s.registry)
    }

    pub fn asset(&self) -> Option<&LoadedAsset> {
        self.scene.as_ref().map(|s| &s.asset)
    }

    pub fn camera_rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{
        AnimationClip, Interpolation, MeshData, SceneGraph, Track, TrackValues, Transform,
    };
    use crate::backend::HeadlessBackend;
    use crate::config::RenderProfile;
    use crate::gesture::{Modifiers, PointerId};
    use crate::xr::testing::ScriptedRuntime;
    use crate::xr::XrRuntimeEvent;
    use cgmath::{InnerSpace, Vector3};

    const TWO_SECTIONS: &str = "\
o housing
v 0 0 0
v 4 0 0
v 0 4 0
f 1 2 3
o sec 2
v 10 0 0
v 12 0 0
v 10 2 0
f 4 5 6
o sec 1
v -10 0 0
v -8 0 0
v -10 2 0
f 7 8 9
";

    fn close(a: Point3<f32>, b: Point3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    fn viewer() -> Viewer<HeadlessBackend> {
        create_viewer(ViewerConfig::default(), HeadlessBackend::new())
    }

    fn loaded_obj() -> Viewer<HeadlessBackend> {
        let mut viewer = viewer();
        pollster::block_on(viewer.load_asset(AssetSource::bytes(TWO_SECTIONS))).unwrap();
        viewer
    }

    fn triangle() -> MeshData {
        MeshData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            Vec::new(),
            vec![0, 1, 2],
            [1.0, 1.0, 1.0, 1.0],
        )
    }

    /// "sec 1" slides 4 units along +X over one second; "base" stays put.
    fn animated_asset() -> LoadedAsset {
        let mut graph = SceneGraph::new("product");
        let section = graph.add_node(0, "sec 1", Transform::default());
        graph.add_mesh(section, triangle());
        let base = graph.add_node(0, "base", Transform::default());
        graph.add_mesh(base, triangle());

        let clip = AnimationClip::new(
            "explode",
            vec![Track {
                node: section,
                times: vec![0.0, 1.0],
                values: TrackValues::Translations(vec![
                    Vector3::new(0.0, 0.0, 0.0),
                    Vector3::new(4.0, 0.0, 0.0),
                ]),
                interpolation: Interpolation::Linear,
            }],
        );
        LoadedAsset::new(graph, vec![clip]).unwrap()
    }

    fn opacities(viewer: &Viewer<HeadlessBackend>) -> Vec<f32> {
        viewer
            .registry()
            .unwrap()
            .parts()
            .iter()
            .map(|p| p.opacity())
            .collect()
    }

    #[test]
    fn test_two_sections_give_four_stages() {
        let viewer = loaded_obj();
        assert!(viewer.is_loaded());
        assert_eq!(viewer.part_names(), vec!["housing", "sec 2", "sec 1"]);
        assert_eq!(viewer.part_count(), 3);
        assert_eq!(viewer.total_stages(), 4);
        assert_eq!(viewer.current_stage(), 0);
        let names: Vec<&str> = viewer
            .named_sections()
            .iter()
            .map(|s| s.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["sec 1", "sec 2"]);
    }

    #[test]
    fn test_previous_from_overview_focuses_last_section() {
        let mut viewer = loaded_obj();
        assert_eq!(viewer.previous_stage(), 3);
        assert_eq!(viewer.current_stage_kind(), Stage::Section(1));

        // "sec 2" is part 1
        assert_eq!(opacities(&viewer), vec![0.22, 1.0, 0.22]);
        let target = viewer.camera_rig().desired_target();
        assert!(close(target, Point3::new(11.0, 1.0, 0.0)));

        for _ in 0..4 {
            viewer.next_stage();
        }
        assert_eq!(viewer.current_stage(), 3);
    }

    #[test]
    fn test_overview_restores_isolation_and_target() {
        let mut viewer = loaded_obj();
        viewer.set_stage(2);
        viewer.set_stage(0);
        assert_eq!(opacities(&viewer), vec![1.0, 1.0, 1.0]);
        assert_eq!(
            viewer.camera_rig().desired_target(),
            viewer.camera_rig().centroid()
        );
    }

    #[test]
    fn test_failed_decode_keeps_previous_asset() {
        let mut viewer = loaded_obj();
        let result = pollster::block_on(viewer.load_asset(AssetSource::bytes("{ not gltf")));
        assert!(matches!(result, Err(ViewerError::Load(_))));

        assert!(viewer.is_loaded());
        assert_eq!(viewer.part_count(), 3);
        assert_eq!(viewer.backend().attach_count(), 1);
        assert_eq!(viewer.backend().detach_count(), 0);
    }

    #[test]
    fn test_backend_failure_reattaches_previous_asset() {
        let mut viewer = loaded_obj();
        viewer.set_stage(2);
        viewer.backend_mut().fail_next_attach("device lost");

        let result = viewer.load_decoded(animated_asset());
        assert!(matches!(result, Err(ViewerError::Backend(_))));
        assert_eq!(viewer.part_count(), 3);
        assert_eq!(viewer.current_stage(), 2);
        assert!(viewer.backend().attached().is_some());

        let dimmed = viewer.registry().unwrap().parts()[0].renderables[0];
        assert_eq!(viewer.backend().node_opacity(dimmed), Some(0.22));
    }

    #[test]
    fn test_section_stage_explodes_and_targets_settled_layout() {
        let mut viewer = viewer();
        viewer.load_decoded(animated_asset()).unwrap();
        assert_eq!(viewer.total_stages(), 3);
        assert_eq!(viewer.explode_state(), ExplodeState::Overview);

        viewer.set_stage(2);
        assert_eq!(viewer.explode_state(), ExplodeState::Exploded);
        assert!(close(
            viewer.camera_rig().desired_target(),
            Point3::new(4.5, 0.5, 0.0)
        ));

        viewer.tick(2.0);
        let world = viewer.backend().node_transform(1).unwrap();
        assert!((world.w.x - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_target_name_falls_back_to_centroid() {
        let mut viewer = loaded_obj();
        viewer.set_stage(2);
        assert!(viewer.resolve_target("sec 1").is_some());
        assert_eq!(viewer.resolve_target("missing"), None);

        let target = viewer.resolve_target("missing");
        viewer.rig.set_desired_target(target);
        assert!(close(
            viewer.camera_rig().desired_target(),
            viewer.camera_rig().centroid()
        ));
    }

    #[test]
    fn test_scrub_through_viewer() {
        let mut viewer = viewer();
        viewer.load_decoded(animated_asset()).unwrap();
        viewer.set_explode_amount(0.5);
        assert_eq!(viewer.explode_state(), ExplodeState::Scrubbing);
        viewer.tick(0.0);
        let world = viewer.backend().node_transform(1).unwrap();
        assert!((world.w.x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_wheel_changes_stage_once_per_cooldown() {
        let mut viewer = loaded_obj();
        let wheel = |time_ms| InputEvent::Wheel {
            delta_y: 50.0,
            modifiers: Modifiers::default(),
            time_ms,
        };
        viewer.handle_input(&wheel(1000.0));
        assert_eq!(viewer.current_stage(), 1);
        viewer.handle_input(&wheel(1100.0));
        assert_eq!(viewer.current_stage(), 1);
        viewer.handle_input(&wheel(1400.0));
        assert_eq!(viewer.current_stage(), 2);
    }

    #[test]
    fn test_pinch_dollies_camera() {
        let mut viewer = loaded_obj();
        let before = viewer.camera_rig().distance();
        let touch = |id, x: f32, down: bool| {
            if down {
                InputEvent::PointerDown {
                    pointer: PointerId::touch(id),
                    position: [x, 0.0],
                    time_ms: 0.0,
                }
            } else {
                InputEvent::PointerMove {
                    pointer: PointerId::touch(id),
                    position: [x, 0.0],
                    time_ms: 10.0,
                }
            }
        };
        viewer.handle_input(&touch(1, 0.0, true));
        viewer.handle_input(&touch(2, 100.0, true));
        viewer.handle_input(&touch(2, 150.0, false));
        let after = viewer.camera_rig().distance();
        assert!((after - before / 1.5).abs() < 1e-3);
        assert_eq!(viewer.current_stage(), 0);
    }

    #[test]
    fn test_xr_without_runtime_reports_unsupported() {
        let mut viewer = loaded_obj();
        assert_eq!(viewer.enter_xr(XrMode::ImmersiveAr), Err(XrError::NoRuntime));
        assert_eq!(
            viewer.take_notices(),
            vec![Notice::XrUnsupported(XrMode::ImmersiveAr)]
        );
        assert!(viewer.take_notices().is_empty());
        assert_eq!(viewer.xr_state(), XrState::Idle);
    }

    #[test]
    fn test_xr_select_places_asset() {
        let mut viewer = loaded_obj();
        let runtime = ScriptedRuntime::supporting(&[XrMode::ImmersiveAr]);
        viewer.set_xr_runtime(Box::new(runtime.clone()));

        assert_eq!(
            viewer.enter_xr(XrMode::ImmersiveVr),
            Err(XrError::Unsupported(XrMode::ImmersiveVr))
        );
        assert_eq!(
            viewer.take_notices(),
            vec![Notice::XrUnsupported(XrMode::ImmersiveVr)]
        );

        viewer.enter_xr(XrMode::ImmersiveAr).unwrap();
        runtime.push(XrRuntimeEvent::Granted);
        runtime.push(XrRuntimeEvent::Select(Point3::new(0.0, -1.0, -3.0)));
        viewer.tick(1.0 / 60.0);
        assert_eq!(viewer.xr_state(), XrState::Active);

        let housing = viewer.registry().unwrap().parts()[0].renderables[0];
        let world = viewer.backend().node_transform(housing).unwrap();
        assert_eq!(world.w.truncate(), Vector3::new(0.0, -1.0, -3.0));

        viewer.exit_xr();
        assert_eq!(viewer.xr_state(), XrState::Ended);
        viewer.tick(1.0 / 60.0);
        let world = viewer.backend().node_transform(housing).unwrap();
        assert_eq!(world.w.truncate(), Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_mobile_profile_centers_pivot_and_promotes_descendants() {
        let mut graph = SceneGraph::new("root");
        let body = graph.add_node(0, "Body", Transform::from_translation(Vector3::new(10.0, 0.0, 0.0)));
        let marker = graph.add_node(body, "se 3", Transform::default());
        graph.add_mesh(marker, triangle());
        let asset = LoadedAsset::new(graph, Vec::new()).unwrap();

        let config = ViewerConfig::default().with_profile(RenderProfile::mobile());
        let mut viewer = create_viewer(config, HeadlessBackend::new());
        viewer.load_decoded(asset).unwrap();

        assert!(close(viewer.camera_rig().centroid(), Point3::new(0.0, 0.0, 0.0)));
        assert_eq!(viewer.named_sections().len(), 1);
        assert_eq!(viewer.named_sections()[0].section_number, 3);
        assert_eq!(
            viewer.backend().lighting(),
            Some((crate::config::LightRig::Hemisphere, 0.8))
        );
    }

    #[test]
    fn test_reset_to_overview_shows_everything() {
        let mut viewer = loaded_obj();
        viewer.set_stage(3);
        viewer.show_only(Some(&[1]));
        viewer.set_auto_rotate(true);
        viewer.tick(0.5);

        viewer.reset_to_overview();
        assert_eq!(viewer.current_stage(), 0);
        assert!(viewer
            .registry()
            .unwrap()
            .parts()
            .iter()
            .all(|p| p.is_visible() && p.opacity() == 1.0));
        assert_eq!(
            viewer.camera_rig().current_target(),
            viewer.camera_rig().centroid()
        );
    }

    #[test]
    fn test_tick_pushes_camera_and_exposure_passes_through() {
        let mut viewer = loaded_obj();
        viewer.set_exposure(1.5);
        viewer.tick(1.0 / 60.0);
        assert_eq!(viewer.backend().exposure(), 1.5);
        assert_eq!(
            viewer.backend().camera().copied(),
            Some(viewer.camera_rig().view())
        );
    }

    #[test]
    fn test_empty_viewer_is_inert() {
        let mut viewer = viewer();
        assert_eq!(viewer.next_stage(), 0);
        assert_eq!(viewer.total_stages(), 0);
        assert!(viewer.part_names().is_empty());
        viewer.tick(0.1);
        assert_eq!(viewer.current_stage_kind(), Stage::Overview);
    }

    #[test]
    fn test_dispose_detaches_and_returns_backend() {
        let viewer = loaded_obj();
        let backend = viewer.dispose();
        assert!(backend.attached().is_none());
        assert_eq!(backend.detach_count(), 1);
    }

    #[test]
    fn test_viewers_are_independent() {
        let mut first = loaded_obj();
        let second = loaded_obj();
        first.next_stage();
        assert_eq!(first.current_stage(), 1);
        assert_eq!(second.current_stage(), 0);
    }
}
