//! Mannequin: pose a skeleton and record keyframes
//!
//! Window host for the rig editor. The top of the window is the 3D view,
//! the bottom panel is the timeline track.
//!
//! Controls:
//! - Hover a bone to highlight it, drag to rotate it about the view axis
//! - Left drag on empty space orbits, right drag zooms
//! - WASD / Up / Down move the camera, Left / Right roll it
//! - K captures a keyframe, Space or P plays, R resets the pose
//! - 1..8 load scenes, Tab toggles first-person look
//! - Drag the playhead or a keyframe marker along the track

use std::path::Path;
use macroquad::prelude::*;
use mannequin::camera::{Camera as RigCamera, DragButtons, OrbitCamera};
use mannequin::input::{EditContext, InputController, PointerEvent};
use mannequin::rig::{Rig, RonSceneLoader, SceneLoader, Viewport};
use mannequin::timeline::{Mode, TimelineState, TimelineView};
use mannequin::{RigConfig, VERSION};

/// Config file read at startup when no path is given on the command line
const DEFAULT_CONFIG: &str = "mannequin.ron";

// Timeline panel layout
const TRACK_LEFT: f32 = 20.0;
const TRACK_TOP: f32 = 60.0;
const TRACK_HEIGHT: f32 = 40.0;
/// How close (px) a press must be to grab a keyframe marker
const MARKER_GRAB: f32 = 6.0;

const BG_COLOR: Color = Color::new(0.08, 0.08, 0.1, 1.0);
const PANEL_COLOR: Color = Color::new(0.14, 0.14, 0.16, 1.0);
const BONE_COLOR: Color = Color::new(0.85, 0.85, 0.8, 1.0);
const HIGHLIGHT_COLOR: Color = Color::new(1.0, 0.75, 0.2, 1.0);
const MARKER_COLOR: Color = Color::new(0.3, 0.7, 1.0, 1.0);
const PLAYHEAD_COLOR: Color = Color::new(1.0, 0.3, 0.3, 1.0);

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Mannequin v{}", VERSION),
        window_width: 1024,
        window_height: 768,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// What a press in the timeline panel grabbed
#[derive(Debug, Clone, Copy, PartialEq)]
enum PanelDrag {
    Idle,
    Playhead,
    Marker(usize),
}

fn load_config() -> RigConfig {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let path = Path::new(&path);
    if !path.exists() {
        log::info!("no config at {}, using defaults", path.display());
        return RigConfig::default();
    }
    match RigConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("failed to load config {}: {}, using defaults", path.display(), e);
            RigConfig::default()
        }
    }
}

fn view_for_window(config: &RigConfig) -> Viewport {
    Viewport::above_panel(screen_width(), screen_height(), config.timeline_panel_height)
}

fn held_buttons() -> DragButtons {
    DragButtons {
        primary: is_mouse_button_down(MouseButton::Left),
        secondary: is_mouse_button_down(MouseButton::Right),
    }
}

/// Everything the controller edits, owned by the host
struct Scene {
    camera: OrbitCamera,
    rig: Rig,
    timeline: TimelineState,
    loader: RonSceneLoader,
}

impl Scene {
    fn ctx(&mut self) -> EditContext<'_> {
        EditContext {
            camera: &mut self.camera,
            rig: &mut self.rig,
            timeline: &mut self.timeline,
            loader: &mut self.loader,
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config();
    let mut viewport = view_for_window(&config);
    let mut input = InputController::new(&config, viewport);
    let mut loader = RonSceneLoader::new(&config.scenes_dir);

    // Start on the first scene slot, or an empty rig if it won't load
    let rig = match config.scene_for_slot(0) {
        Some(asset) => loader.load_scene(asset).unwrap_or_else(|e| {
            log::warn!("failed to load scene '{}': {}", asset, e);
            Rig::default()
        }),
        None => Rig::default(),
    };

    let mut scene = Scene {
        camera: OrbitCamera::from_config(&config.camera, viewport.aspect()),
        rig,
        timeline: TimelineState::new(config.px_per_second, config.track_length),
        loader,
    };

    let mut first_person = false;
    let mut panel_drag = PanelDrag::Idle;
    let mut last_pointer = Vec2::from(mouse_position());

    log::info!("mannequin v{} ready, {} scene(s) bound", VERSION, config.scenes.len());

    loop {
        // Window resize
        let current = view_for_window(&config);
        if current != viewport {
            viewport = current;
            scene.camera.aspect = viewport.aspect();
            input.resize(viewport);
        }

        // Pointer: the 3D view goes to the controller, the panel is handled here
        let pointer = Vec2::from(mouse_position());
        let event = PointerEvent::new(pointer, held_buttons());
        if is_mouse_button_pressed(MouseButton::Left) || is_mouse_button_pressed(MouseButton::Right) {
            if viewport.contains(pointer) {
                input.drag_start(event, &mut scene.ctx());
            } else {
                panel_drag = grab_panel(pointer, viewport, &scene.timeline);
            }
        }
        if pointer != last_pointer {
            match panel_drag {
                PanelDrag::Idle => input.drag(event, &mut scene.ctx()),
                PanelDrag::Playhead => {
                    scene.timeline.scrub(pointer.x - last_pointer.x);
                }
                PanelDrag::Marker(index) => {
                    let time = scene.timeline.px_to_time(pointer.x - TRACK_LEFT);
                    input.retime_key_frame(index, time, &mut scene.ctx());
                }
            }
        }
        if is_mouse_button_released(MouseButton::Left) || is_mouse_button_released(MouseButton::Right) {
            input.drag_end(event);
            panel_drag = PanelDrag::Idle;
        }
        last_pointer = pointer;

        // Keys
        if is_key_pressed(KeyCode::Tab) {
            first_person = !first_person;
            input.set_first_person(first_person);
            log::info!("first-person look {}", if first_person { "on" } else { "off" });
        }
        for key in get_keys_pressed() {
            if key != KeyCode::Tab {
                input.on_key(key, &mut scene.ctx());
            }
        }

        // Playback steps through keyframes without blending
        input.increment_time(get_frame_time(), &mut scene.ctx());
        if input.mode() == Mode::Playback {
            if let Some(key_frame) = scene.rig.key_frame_at(input.time()) {
                let rotations = key_frame.rotations.clone();
                if let Err(e) = scene.rig.skeleton.apply_local_rotations(&rotations) {
                    log::warn!("keyframe does not fit the skeleton: {}", e);
                }
            }
        }

        clear_background(BG_COLOR);
        draw_rig(&scene.rig, &scene.camera, viewport);
        draw_panel(&input, &scene.rig, &scene.timeline, viewport);

        next_frame().await
    }
}

/// Pick what a press in the timeline panel grabs: a keyframe marker under
/// the pointer (the first one is pinned) or else the playhead
fn grab_panel(pointer: Vec2, viewport: Viewport, timeline: &TimelineState) -> PanelDrag {
    let track_y = viewport.height + TRACK_TOP;
    if pointer.y < track_y || pointer.y > track_y + TRACK_HEIGHT {
        return PanelDrag::Idle;
    }
    match timeline.marker_at(pointer.x - TRACK_LEFT, MARKER_GRAB) {
        Some(marker) if marker.index > 0 => PanelDrag::Marker(marker.index),
        _ => PanelDrag::Playhead,
    }
}

fn draw_rig(rig: &Rig, camera: &OrbitCamera, viewport: Viewport) {
    let dpi = screen_dpi_scale();
    set_camera(&Camera3D {
        position: camera.pos(),
        target: camera.pos() - camera.forward(),
        up: camera.up(),
        fovy: camera.fov_y,
        aspect: Some(viewport.aspect()),
        // GL viewport is in physical pixels with a bottom-left origin,
        // the panel sits below the view
        viewport: Some((
            0,
            ((screen_height() - viewport.height) * dpi) as i32,
            (viewport.width * dpi) as i32,
            (viewport.height * dpi) as i32,
        )),
        ..Default::default()
    });

    draw_grid(10, 1.0, DARKGRAY, GRAY);
    for bone in rig.skeleton.iter() {
        let color = if bone.is_highlighted() { HIGHLIGHT_COLOR } else { BONE_COLOR };
        draw_line_3d(bone.position(), bone.endpoint(), color);
        draw_sphere_wires(bone.position(), bone.radius, None, color);
    }

    set_default_camera();
}

fn draw_panel(input: &InputController, rig: &Rig, timeline: &TimelineState, viewport: Viewport) {
    let top = viewport.height;
    draw_rectangle(0.0, top, screen_width(), screen_height() - top, PANEL_COLOR);
    draw_text(&input.mode_string(rig), TRACK_LEFT, top + 30.0, 24.0, WHITE);

    let track_y = top + TRACK_TOP;
    let track_w = timeline.time_to_px(timeline.track_length);
    draw_rectangle_lines(TRACK_LEFT, track_y, track_w, TRACK_HEIGHT, 1.0, GRAY);

    // Second ticks
    let seconds = timeline.track_length.floor() as i32;
    for s in 0..=seconds {
        let x = TRACK_LEFT + timeline.time_to_px(s as f32);
        draw_line(x, track_y + TRACK_HEIGHT, x, track_y + TRACK_HEIGHT + 6.0, 1.0, GRAY);
        draw_text(&s.to_string(), x - 3.0, track_y + TRACK_HEIGHT + 20.0, 16.0, GRAY);
    }

    for marker in timeline.markers() {
        let x = TRACK_LEFT + timeline.time_to_px(marker.time);
        draw_rectangle(x - 3.0, track_y + 4.0, 6.0, TRACK_HEIGHT - 8.0, MARKER_COLOR);
    }

    let playhead = match input.mode() {
        Mode::Edit => timeline.playhead_time(),
        Mode::Playback => input.time(),
    };
    let x = TRACK_LEFT + timeline.time_to_px(playhead);
    draw_line(x, track_y - 4.0, x, track_y + TRACK_HEIGHT + 4.0, 2.0, PLAYHEAD_COLOR);
}
