//! Per-viewport input session
//!
//! Turns raw pointer and key events into camera moves, bone picks, bone
//! rotation drags and timeline commands. The host owns the camera, rig,
//! timeline display and scene loader and lends them to each handler through
//! an [`EditContext`].

use macroquad::input::KeyCode;
use macroquad::math::{Mat4, Vec2};
use crate::camera::{Camera, CameraRig, DragButtons};
use crate::config::RigConfig;
use crate::rig::ray::world_to_screen;
use crate::rig::{pick_bone, BoneEditor, Rig, SceneLoader, Viewport};
use crate::timeline::{Mode, TimelineController, TimelineView};
use super::{Command, KeyBindings};

/// Host-owned state a handler may touch
pub struct EditContext<'a> {
    pub camera: &'a mut dyn Camera,
    pub rig: &'a mut Rig,
    pub timeline: &'a mut dyn TimelineView,
    pub loader: &'a mut dyn SceneLoader,
}

/// Pointer position (window pixels, y down) and held buttons
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Vec2,
    pub buttons: DragButtons,
}

impl PointerEvent {
    pub fn new(position: Vec2, buttons: DragButtons) -> Self {
        Self { position, buttons }
    }

    /// A move with no buttons held
    pub fn hover(position: Vec2) -> Self {
        Self { position, buttons: DragButtons::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Camera,
    Bone(BoneEditor),
}

pub struct InputController {
    viewport: Viewport,
    camera_rig: CameraRig,
    timeline: TimelineController,
    bindings: KeyBindings,
    /// Scene assets for the number key slots
    scenes: Vec<String>,

    drag: DragState,
    previous: Option<Vec2>,
}

impl InputController {
    pub fn new(config: &RigConfig, viewport: Viewport) -> Self {
        Self {
            viewport,
            camera_rig: CameraRig::new(config),
            timeline: TimelineController::new(config.track_length),
            bindings: KeyBindings::default(),
            scenes: config.scenes.clone(),
            drag: DragState::Idle,
            previous: None,
        }
    }

    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The host window changed size
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_first_person(&mut self, first_person: bool) {
        self.camera_rig.first_person = first_person;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag != DragState::Idle
    }

    /// Bone being rotated by the current drag
    pub fn selected_bone(&self) -> Option<usize> {
        match self.drag {
            DragState::Bone(editor) => Some(editor.bone),
            _ => None,
        }
    }

    // ========================================================================
    // Pointer
    // ========================================================================

    /// Button pressed. Grabs the highlighted bone if there is one, otherwise
    /// starts moving the camera. Presses outside the 3D view are ignored.
    pub fn drag_start(&mut self, event: PointerEvent, ctx: &mut EditContext) {
        if !self.viewport.contains(event.position) {
            return;
        }

        self.drag = match ctx.rig.skeleton.highlighted() {
            Some(index) => {
                let pivot = ctx
                    .rig
                    .skeleton
                    .bone(index)
                    .and_then(|bone| world_to_screen(bone.rest_position(), &self.viewport, &*ctx.camera));
                match pivot {
                    Some(pivot) => DragState::Bone(BoneEditor::new(index, pivot)),
                    None => {
                        log::debug!("bone {} is behind the camera, dragging camera instead", index);
                        DragState::Camera
                    }
                }
            }
            None => DragState::Camera,
        };
        self.previous = Some(event.position);
    }

    /// Pointer moved, with or without a drag in progress
    pub fn drag(&mut self, event: PointerEvent, ctx: &mut EditContext) {
        match (self.drag, self.previous) {
            (DragState::Bone(editor), Some(previous)) => {
                editor.drag(&mut ctx.rig.skeleton, &*ctx.camera, previous, event.position);
                self.previous = Some(event.position);
            }
            (DragState::Camera, Some(previous)) if previous != event.position => {
                self.camera_rig.drag(ctx.camera, event.position - previous, event.buttons);
                self.previous = Some(event.position);
            }
            _ => {}
        }

        if self.viewport.contains(event.position) {
            pick_bone(&*ctx.camera, &self.viewport, event.position, &mut ctx.rig.skeleton);
        } else {
            ctx.rig.skeleton.set_highlighted(None);
        }
    }

    /// Button released
    pub fn drag_end(&mut self, _event: PointerEvent) {
        self.drag = DragState::Idle;
        self.previous = None;
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Run the command bound to `key`. Returns false for unbound keys.
    pub fn on_key(&mut self, key: KeyCode, ctx: &mut EditContext) -> bool {
        let Some(command) = self.bindings.command(key) else {
            log::debug!("no command bound to {:?}", key);
            return false;
        };
        self.run(command, ctx);
        true
    }

    pub fn run(&mut self, command: Command, ctx: &mut EditContext) {
        match command {
            Command::Camera(movement) => self.camera_rig.apply(ctx.camera, movement),
            Command::AddKeyFrame => {
                self.timeline.add_key_frame(ctx.rig, ctx.timeline);
            }
            Command::TogglePlayback => {
                self.timeline.start_playback(ctx.rig, ctx.timeline);
            }
            Command::ResetScene => ctx.rig.skeleton.reset_to_rest(),
            Command::LoadScene(slot) => self.load_scene(slot, ctx),
        }
    }

    fn load_scene(&mut self, slot: usize, ctx: &mut EditContext) {
        let Some(asset) = self.scenes.get(slot) else {
            log::debug!("no scene in slot {}", slot + 1);
            return;
        };
        match ctx.loader.load_scene(asset) {
            Ok(rig) => {
                log::info!("scene '{}' loaded into slot {}", asset, slot + 1);
                *ctx.rig = rig;
                self.timeline.reset(ctx.timeline);
                self.drag = DragState::Idle;
                self.previous = None;
            }
            Err(e) => log::warn!("failed to load scene '{}': {}", asset, e),
        }
    }

    // ========================================================================
    // Timeline
    // ========================================================================

    /// Per-frame tick
    pub fn increment_time(&mut self, dt: f32, ctx: &mut EditContext) {
        self.timeline.increment_time(dt, ctx.rig, ctx.timeline);
    }

    /// Move a keyframe marker (not the first) along the track
    pub fn retime_key_frame(&mut self, index: usize, time: f32, ctx: &mut EditContext) -> bool {
        self.timeline.retime_key_frame(index, time, ctx.rig, ctx.timeline)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn view_matrix(&self, camera: &dyn Camera) -> Mat4 {
        camera.view_matrix()
    }

    pub fn proj_matrix(&self, camera: &dyn Camera) -> Mat4 {
        camera.proj_matrix()
    }

    pub fn mode(&self) -> Mode {
        self.timeline.mode()
    }

    pub fn mode_string(&self, rig: &Rig) -> String {
        self.timeline.mode_string(rig)
    }

    pub fn key_frame_count(&self, rig: &Rig) -> usize {
        rig.key_frame_count()
    }

    /// Playback clock
    pub fn time(&self) -> f32 {
        self.timeline.time()
    }

    pub fn max_time(&self, rig: &Rig) -> f32 {
        self.timeline.max_time(rig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::f32::consts::FRAC_PI_2;
    use macroquad::math::{Quat, Vec3};
    use crate::camera::OrbitCamera;
    use crate::config::CameraConfig;
    use crate::rig::file::load_scene_from_str;
    use crate::rig::SceneError;
    use crate::timeline::TimelineState;

    const TWO_BONES: &str = r#"(
        name: "two_bones",
        bones: [
            (name: "root", parent: None, position: (0.0, -3.0, 0.0), endpoint: (0.0, -1.5, 0.0), radius: 0.2),
            (name: "child", parent: Some(0), position: (0.0, -1.5, 0.0), endpoint: (0.0, 1.5, 0.0), radius: 0.2),
        ],
    )"#;

    const ONE_BONE: &str = r#"(
        name: "one_bone",
        bones: [(position: (0.0, 0.0, 0.0), endpoint: (1.0, 0.0, 0.0), radius: 0.1)],
    )"#;

    /// Scenes from memory instead of disk
    struct MemoryLoader(HashMap<String, &'static str>);

    impl SceneLoader for MemoryLoader {
        fn load_scene(&mut self, asset: &str) -> Result<Rig, SceneError> {
            match self.0.get(asset) {
                Some(text) => load_scene_from_str(text),
                None => Err(SceneError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    asset.to_string(),
                ))),
            }
        }
    }

    struct Host {
        camera: OrbitCamera,
        rig: Rig,
        timeline: TimelineState,
        loader: MemoryLoader,
    }

    impl Host {
        fn new() -> Self {
            let mut scenes = HashMap::new();
            scenes.insert("two_bones".to_string(), TWO_BONES);
            scenes.insert("one_bone".to_string(), ONE_BONE);
            Self {
                camera: OrbitCamera::from_config(&CameraConfig::default(), 800.0 / 600.0),
                rig: load_scene_from_str(TWO_BONES).unwrap(),
                timeline: TimelineState::new(68.0, 10.0),
                loader: MemoryLoader(scenes),
            }
        }

        fn ctx(&mut self) -> EditContext<'_> {
            EditContext {
                camera: &mut self.camera,
                rig: &mut self.rig,
                timeline: &mut self.timeline,
                loader: &mut self.loader,
            }
        }
    }

    fn controller() -> InputController {
        let config = RigConfig {
            scenes: vec!["two_bones".into(), "one_bone".into(), "missing".into()],
            ..RigConfig::default()
        };
        InputController::new(&config, Viewport::above_panel(800.0, 800.0, 200.0))
    }

    fn child_center(host: &Host, input: &InputController) -> Vec2 {
        let child = host.rig.skeleton.bone(1).unwrap();
        let center = (child.position() + child.endpoint()) * 0.5;
        world_to_screen(center, &input.viewport(), &host.camera).unwrap()
    }

    #[test]
    fn test_hover_highlights_child() {
        let mut host = Host::new();
        let mut input = controller();
        let pointer = child_center(&host, &input);

        input.drag(PointerEvent::hover(pointer), &mut host.ctx());
        assert_eq!(host.rig.skeleton.highlighted(), Some(1));
        assert!(!host.rig.skeleton.bone(0).unwrap().is_highlighted());

        input.drag(PointerEvent::hover(Vec2::new(5.0, 5.0)), &mut host.ctx());
        assert_eq!(host.rig.skeleton.highlighted(), None);
    }

    #[test]
    fn test_drag_highlighted_bone() {
        let mut host = Host::new();
        let mut input = controller();
        let pointer = child_center(&host, &input);
        input.drag(PointerEvent::hover(pointer), &mut host.ctx());

        input.drag_start(PointerEvent::new(pointer, DragButtons::PRIMARY), &mut host.ctx());
        assert_eq!(input.selected_bone(), Some(1));

        // Pivot is the child's rest position on screen, directly below the pointer.
        // Sweeping from below the pivot to its right is a quarter turn.
        let pivot = world_to_screen(Vec3::new(0.0, -1.5, 0.0), &input.viewport(), &host.camera).unwrap();
        assert!((pivot.x - pointer.x).abs() < 1e-3);
        let camera_before = host.camera.pos();
        input.drag(PointerEvent::new(pivot + Vec2::new(100.0, 0.0), DragButtons::PRIMARY), &mut host.ctx());

        let child = host.rig.skeleton.bone(1).unwrap();
        let expected = Quat::from_rotation_z(FRAC_PI_2);
        assert!(child.local_rotation().dot(expected).abs() > 0.9999);
        assert!((child.endpoint() - Vec3::new(-3.0, -1.5, 0.0)).length() < 1e-4, "endpoint={:?}", child.endpoint());
        assert_eq!(host.rig.skeleton.bone(0).unwrap().local_rotation(), Quat::IDENTITY);
        assert_eq!(host.camera.pos(), camera_before);

        input.drag_end(PointerEvent::hover(pivot));
        assert!(!input.is_dragging());
        assert_eq!(input.selected_bone(), None);
    }

    #[test]
    fn test_drag_empty_space_moves_camera() {
        let mut host = Host::new();
        let mut input = controller();
        let start = Vec2::new(10.0, 10.0);

        input.drag_start(PointerEvent::new(start, DragButtons::PRIMARY), &mut host.ctx());
        assert!(input.is_dragging());
        assert_eq!(input.selected_bone(), None);
        input.drag(PointerEvent::new(start + Vec2::new(20.0, 0.0), DragButtons::PRIMARY), &mut host.ctx());

        assert!((host.camera.pos() - Vec3::new(0.0, 0.0, -6.0)).length() > 1e-3);
        // Orbiting keeps the distance to the target
        assert!((host.camera.distance() - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_press_outside_viewport_ignored() {
        let mut host = Host::new();
        let mut input = controller();
        let start = Vec2::new(400.0, 700.0);

        input.drag_start(PointerEvent::new(start, DragButtons::PRIMARY), &mut host.ctx());
        assert!(!input.is_dragging());
        input.drag(PointerEvent::new(start + Vec2::new(30.0, 0.0), DragButtons::PRIMARY), &mut host.ctx());
        assert_eq!(host.camera.pos(), Vec3::new(0.0, 0.0, -6.0));
    }

    #[test]
    fn test_unbound_key() {
        let mut host = Host::new();
        let mut input = controller();
        assert!(!input.on_key(KeyCode::F12, &mut host.ctx()));
    }

    #[test]
    fn test_custom_bindings() {
        let mut host = Host::new();
        let mut bindings = KeyBindings::empty();
        bindings.bind(KeyCode::Enter, Command::AddKeyFrame);
        let mut input = controller().with_bindings(bindings);

        assert!(!input.on_key(KeyCode::K, &mut host.ctx()));
        assert!(input.on_key(KeyCode::Enter, &mut host.ctx()));
        assert_eq!(host.rig.key_frame_count(), 1);

        input.bindings_mut().unbind(KeyCode::Enter);
        input.bindings_mut().bind(KeyCode::Space, Command::TogglePlayback);
        assert!(!input.on_key(KeyCode::Enter, &mut host.ctx()));
        assert_eq!(host.rig.key_frame_count(), 1);
    }

    #[test]
    fn test_camera_keys() {
        let mut host = Host::new();
        let mut input = controller();
        assert!(input.on_key(KeyCode::W, &mut host.ctx()));
        // Forward moves toward the target
        assert!((host.camera.pos() - Vec3::new(0.0, 0.0, -5.9)).length() < 1e-4);
    }

    #[test]
    fn test_key_frames_and_playback() {
        let mut host = Host::new();
        let mut input = controller();
        assert!(host.timeline.scrub(3.0 * 68.0));

        input.on_key(KeyCode::K, &mut host.ctx());
        assert_eq!(input.key_frame_count(&host.rig), 2);
        assert_eq!(input.mode_string(&host.rig), "edit: 2 keyframes");
        assert_eq!(input.max_time(&host.rig), 3.0);

        input.on_key(KeyCode::Space, &mut host.ctx());
        assert_eq!(input.mode(), Mode::Playback);

        // Keyframes can't be added during playback
        input.on_key(KeyCode::K, &mut host.ctx());
        assert_eq!(input.key_frame_count(&host.rig), 2);

        input.increment_time(1.0, &mut host.ctx());
        assert!((input.time() - 1.0).abs() < 1e-5);
        assert_eq!(input.mode_string(&host.rig), "playback: 1.00 / 3.00");

        input.increment_time(2.5, &mut host.ctx());
        assert_eq!(input.mode(), Mode::Edit);
        assert_eq!(input.time(), 0.0);
    }

    #[test]
    fn test_reset_scene() {
        let mut host = Host::new();
        let mut input = controller();
        host.rig
            .skeleton
            .apply_local_rotations(&[Quat::from_rotation_x(0.4), Quat::IDENTITY])
            .unwrap();
        input.on_key(KeyCode::R, &mut host.ctx());
        assert!(host.rig.skeleton.local_rotations().iter().all(|q| *q == Quat::IDENTITY));
    }

    #[test]
    fn test_load_scene() {
        let mut host = Host::new();
        let mut input = controller();
        host.timeline.scrub(68.0);
        input.on_key(KeyCode::K, &mut host.ctx());
        assert_eq!(host.timeline.markers().len(), 2);

        input.on_key(KeyCode::Key2, &mut host.ctx());
        assert_eq!(host.rig.name, "one_bone");
        assert_eq!(host.rig.key_frame_count(), 0);
        assert!(host.timeline.markers().is_empty());
    }

    #[test]
    fn test_failed_load_keeps_rig() {
        let mut host = Host::new();
        let mut input = controller();

        // Slot bound to a missing asset
        input.on_key(KeyCode::Key3, &mut host.ctx());
        assert_eq!(host.rig.name, "two_bones");

        // Slot with nothing configured
        input.on_key(KeyCode::Key8, &mut host.ctx());
        assert_eq!(host.rig.name, "two_bones");
    }

    #[test]
    fn test_load_scene_drops_drag() {
        let mut host = Host::new();
        let mut input = controller();
        input.drag_start(PointerEvent::new(Vec2::new(10.0, 10.0), DragButtons::PRIMARY), &mut host.ctx());
        input.on_key(KeyCode::Key1, &mut host.ctx());
        assert!(!input.is_dragging());
    }

    #[test]
    fn test_matrices_follow_camera() {
        let host = Host::new();
        let input = controller();
        assert_eq!(input.view_matrix(&host.camera), host.camera.view_matrix());
        assert_eq!(input.proj_matrix(&host.camera), host.camera.proj_matrix());
    }
}
