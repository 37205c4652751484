// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for frame control: bracketing, presentation, resize and screenshots.

use tessera_core::math::Rgba8;
use tessera_core::renderer::{
    DeviceError, GraphicsContext, GraphicsSettings, RenderError,
};
use tessera_infra::HeadlessDevice;

fn headless_context(width: u32, height: u32) -> GraphicsContext {
    let _ = env_logger::builder().is_test(true).try_init();
    let settings = GraphicsSettings {
        initial_size: (width, height),
        clear_colour: Rgba8::RED,
        vsync: false,
        ..GraphicsSettings::default()
    };
    GraphicsContext::new(Box::new(HeadlessDevice::new(width, height)), &settings)
        .expect("headless context creation cannot fail")
}

fn headless(ctx: &GraphicsContext) -> &HeadlessDevice {
    ctx.device_as::<HeadlessDevice>().unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Bracketing
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_settings_are_applied_at_creation() {
    let ctx = headless_context(16, 8);
    assert!(!ctx.vsync());
    assert!(!headless(&ctx).vsync());
    assert_eq!(headless(&ctx).clear_colour(), Rgba8::RED);
    assert_eq!(ctx.framebuffer_size(), (16, 8));
}

#[test]
fn test_frame_presents_once() {
    let mut ctx = headless_context(16, 8);
    assert!(!ctx.is_in_frame());

    ctx.begin_frame();
    assert!(ctx.is_in_frame());
    assert!(headless(&ctx).is_in_frame());
    assert_eq!(ctx.frame_stats().frame_number, 1);
    ctx.clear();
    ctx.end_frame().unwrap();

    assert!(!ctx.is_in_frame());
    assert_eq!(headless(&ctx).frames_presented(), 1);
}

#[test]
#[should_panic(expected = "begin_frame called twice")]
fn test_nested_begin_frame_panics() {
    let mut ctx = headless_context(16, 8);
    ctx.begin_frame();
    ctx.begin_frame();
}

#[test]
#[should_panic(expected = "end_frame called without begin_frame")]
fn test_end_frame_without_begin_panics() {
    let mut ctx = headless_context(16, 8);
    let _ = ctx.end_frame();
}

#[test]
fn test_lost_device_fails_end_frame() {
    let mut ctx = headless_context(16, 8);
    ctx.device_as_mut::<HeadlessDevice>().unwrap().lose_device();

    ctx.begin_frame();
    let result = ctx.end_frame();
    assert!(matches!(
        result,
        Err(RenderError::Device(DeviceError::DeviceLost))
    ));
    assert!(!ctx.is_in_frame());
    assert_eq!(headless(&ctx).frames_presented(), 0);
}

#[test]
fn test_vsync_toggle_reaches_device() {
    let mut ctx = headless_context(16, 8);
    ctx.set_vsync(true);
    assert!(ctx.vsync());
    assert!(headless(&ctx).vsync());
}

// ─────────────────────────────────────────────────────────────────────────────
// Resize and screenshots
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_resize_updates_device() {
    let mut ctx = headless_context(16, 8);
    ctx.on_window_resize(32, 24);
    assert_eq!(ctx.framebuffer_size(), (32, 24));
    assert_eq!(headless(&ctx).size(), (32, 24));

    // Zero sizes (minimised windows) are ignored.
    ctx.on_window_resize(0, 24);
    assert_eq!(ctx.framebuffer_size(), (32, 24));
    assert_eq!(headless(&ctx).size(), (32, 24));
}

#[test]
fn test_screenshot_writes_cleared_framebuffer() {
    let mut ctx = headless_context(8, 4);
    ctx.begin_frame();
    ctx.clear();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.png");
    ctx.take_screenshot(&path, 8, 4).unwrap();
    ctx.end_frame().unwrap();

    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (8, 4));
    assert!(image.pixels().all(|p| p.0 == [255, 0, 0, 255]));
}

#[test]
fn test_screenshot_is_resampled_to_requested_size() {
    let mut ctx = headless_context(8, 8);
    ctx.set_clear_colour(Rgba8::BLUE);
    ctx.clear();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.png");
    ctx.take_screenshot(&path, 2, 2).unwrap();

    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (2, 2));
    assert!(image.pixels().all(|p| p.0 == [0, 0, 255, 255]));
}

#[test]
fn test_screenshot_after_resize_uses_new_size() {
    let mut ctx = headless_context(8, 8);
    ctx.clear();
    ctx.on_window_resize(4, 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resized.png");
    ctx.take_screenshot(&path, 4, 2).unwrap();

    // The resized framebuffer has not been cleared yet.
    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (4, 2));
    assert!(image.pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[test]
fn test_colour_write_off_masks_clear() {
    let mut ctx = headless_context(4, 4);
    ctx.set_colour_write(false);
    ctx.clear();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("masked.png");
    ctx.take_screenshot(&path, 4, 4).unwrap();
    let image = image::open(&path).unwrap().to_rgba8();
    assert!(image.pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[test]
fn test_screenshot_to_unwritable_path_fails() {
    let mut ctx = headless_context(4, 4);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("shot.png");
    let result = ctx.take_screenshot(&path, 4, 4);
    assert!(matches!(result, Err(RenderError::Screenshot { .. })));
}

#[test]
fn test_zero_size_screenshot_fails() {
    let mut ctx = headless_context(4, 4);
    let dir = tempfile::tempdir().unwrap();
    let result = ctx.take_screenshot(dir.path().join("zero.png"), 0, 4);
    assert!(matches!(result, Err(RenderError::Screenshot { .. })));
}

#[test]
fn test_long_running_headless_context_stays_bounded() {
    let mut ctx = headless_context(4, 4);
    for _ in 0..1000 {
        ctx.begin_frame();
        ctx.clear();
        ctx.draw_2d_quad(0.0, 0.0, 2.0, 2.0, Rgba8::GREEN);
        ctx.end_frame().unwrap();
    }
    assert_eq!(headless(&ctx).commands().len(), 4);
    assert_eq!(headless(&ctx).frames_presented(), 1000);
    assert_eq!(ctx.frame_stats().frame_number, 1000);
}
