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

//! Integration tests for the render state machine and the matrix stacks.

use tessera_core::math::{Mat4, Rgba8, Vec3};
use tessera_core::renderer::{
    BlendFunc, CompareFunc, FogMode, GraphicsContext, GraphicsSettings, MatrixType, RenderState,
};
use tessera_infra::{DeviceCommand, HeadlessDevice};

fn headless_context() -> GraphicsContext {
    let _ = env_logger::builder().is_test(true).try_init();
    GraphicsContext::new(
        Box::new(HeadlessDevice::new(320, 240)),
        &GraphicsSettings::default(),
    )
    .expect("headless context creation cannot fail")
}

fn headless(ctx: &GraphicsContext) -> &HeadlessDevice {
    ctx.device_as::<HeadlessDevice>().unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Render state
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_initial_state_is_pushed_to_device() {
    let ctx = headless_context();
    assert_eq!(*ctx.render_state(), RenderState::default());
    assert_eq!(*headless(&ctx).state(), RenderState::default());
    for kind in MatrixType::ALL {
        assert_eq!(headless(&ctx).matrix(kind), Mat4::IDENTITY);
    }
    assert!(headless(&ctx).vsync());
}

#[test]
fn test_every_state_write_reaches_device() {
    let mut ctx = headless_context();
    ctx.device_as_mut::<HeadlessDevice>()
        .unwrap()
        .take_commands();

    ctx.set_texturing(true);
    ctx.set_fog(true);
    ctx.set_fog_mode(FogMode::Exp2);
    ctx.set_fog_colour(Rgba8::new(10, 20, 30, 40));
    ctx.set_fog_density(0.25);
    ctx.set_fog_start(4.0);
    ctx.set_fog_end(96.0);
    ctx.set_face_culling(true);
    ctx.set_alpha_test(true);
    ctx.set_alpha_test_func(CompareFunc::GreaterEqual, 0.75);
    ctx.set_alpha_blending(true);
    ctx.set_alpha_blend_func(BlendFunc::One, BlendFunc::Zero);
    ctx.set_depth_test(true);
    ctx.set_depth_test_func(CompareFunc::Less);
    ctx.set_depth_write(false);
    ctx.set_colour_write(false);
    ctx.set_clear_colour(Rgba8::BLUE);

    let device = headless(&ctx);
    assert_eq!(device.state(), ctx.render_state());
    assert_eq!(device.clear_colour(), Rgba8::BLUE);
    assert_eq!(ctx.clear_colour(), Rgba8::BLUE);

    let state = ctx.render_state();
    assert!(state.texturing && state.fog.enabled && state.face_culling);
    assert_eq!(state.fog.mode, FogMode::Exp2);
    assert_eq!((state.fog.density, state.fog.start, state.fog.end), (0.25, 4.0, 96.0));
    assert_eq!(state.alpha_test.func, CompareFunc::GreaterEqual);
    assert_eq!(state.alpha_test.reference, 0.75);
    assert_eq!((state.blend.src, state.blend.dst), (BlendFunc::One, BlendFunc::Zero));
    assert_eq!(state.depth.func, CompareFunc::Less);
    assert!(!state.depth.write && !state.colour_write);

    // Redundant writes are still forwarded.
    let changes = device
        .commands()
        .iter()
        .filter(|c| c.is_state_change())
        .count();
    assert_eq!(changes, 16);
}

#[test]
fn test_redundant_write_is_forwarded() {
    let mut ctx = headless_context();
    ctx.device_as_mut::<HeadlessDevice>()
        .unwrap()
        .take_commands();
    ctx.set_depth_write(true);
    ctx.set_depth_write(true);
    assert_eq!(
        headless(&ctx).commands(),
        &[
            DeviceCommand::SetDepthWrite(true),
            DeviceCommand::SetDepthWrite(true)
        ]
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Matrix stacks
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_push_pop_restores_matrix_and_depth() {
    let mut ctx = headless_context();
    let translation = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

    ctx.set_matrix_mode(MatrixType::Modelview);
    ctx.load_matrix(&translation);
    ctx.push_matrix();
    assert_eq!(ctx.matrix_depth(MatrixType::Modelview), 1);
    assert_eq!(ctx.matrix(MatrixType::Modelview), translation);

    ctx.multiply_matrix(&Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0)));
    assert_ne!(headless(&ctx).matrix(MatrixType::Modelview), translation);

    ctx.pop_matrix();
    assert_eq!(ctx.matrix_depth(MatrixType::Modelview), 0);
    assert_eq!(ctx.matrix(MatrixType::Modelview), translation);
    assert_eq!(headless(&ctx).matrix(MatrixType::Modelview), translation);
}

#[test]
fn test_depth_tracks_every_push_pop_sequence() {
    let mut ctx = headless_context();
    ctx.set_matrix_mode(MatrixType::Modelview);

    // Every sequence of up to 10 operations, bit set = push, skipping underflows.
    for length in 0..=10u32 {
        for bits in 0..(1u32 << length) {
            let mut model = vec![Mat4::IDENTITY];
            let (mut pushes, mut pops) = (0usize, 0usize);

            for step in 0..length {
                if bits & (1 << step) != 0 {
                    ctx.push_matrix();
                    let top = Mat4::from_translation(Vec3::new(step as f32, length as f32, 0.0));
                    ctx.load_matrix(&top);
                    model.push(top);
                    pushes += 1;
                } else if model.len() > 1 {
                    ctx.pop_matrix();
                    model.pop();
                    pops += 1;
                }
                assert_eq!(ctx.matrix_depth(MatrixType::Modelview), pushes - pops);
                assert_eq!(ctx.matrix(MatrixType::Modelview), *model.last().unwrap());
                assert_eq!(
                    headless(&ctx).matrix(MatrixType::Modelview),
                    *model.last().unwrap()
                );
            }

            // Back to the base entry for the next sequence.
            for _ in 0..pushes - pops {
                ctx.pop_matrix();
            }
            assert_eq!(ctx.matrix_depth(MatrixType::Modelview), 0);
        }
    }
}

#[test]
fn test_stacks_are_independent() {
    let mut ctx = headless_context();
    ctx.set_matrix_mode(MatrixType::Texture);
    ctx.push_matrix();
    ctx.load_matrix(&Mat4::from_scale(Vec3::new(0.5, 0.5, 1.0)));

    assert_eq!(ctx.matrix_depth(MatrixType::Texture), 1);
    assert_eq!(ctx.matrix_depth(MatrixType::Modelview), 0);
    assert_eq!(ctx.matrix(MatrixType::Projection), Mat4::IDENTITY);
    assert_eq!(
        headless(&ctx).matrix(MatrixType::Texture),
        Mat4::from_scale(Vec3::new(0.5, 0.5, 1.0))
    );
}

#[test]
fn test_load_identity_resets_top() {
    let mut ctx = headless_context();
    ctx.set_matrix_mode(MatrixType::Projection);
    ctx.load_matrix(&Mat4::perspective_rh_zo(1.0, 1.5, 0.1, 100.0));
    ctx.load_identity_matrix();
    assert_eq!(headless(&ctx).matrix(MatrixType::Projection), Mat4::IDENTITY);
}

#[test]
#[should_panic]
fn test_pop_without_push_panics() {
    let mut ctx = headless_context();
    ctx.set_matrix_mode(MatrixType::Modelview);
    ctx.pop_matrix();
}

#[test]
fn test_mode_2d_sets_screen_projection() {
    let mut ctx = headless_context();
    ctx.mode_2d(320.0, 240.0);

    assert_eq!(ctx.matrix_mode(), MatrixType::Modelview);
    assert_eq!(ctx.matrix_depth(MatrixType::Projection), 1);
    assert_eq!(ctx.matrix_depth(MatrixType::Modelview), 1);
    assert_eq!(ctx.matrix(MatrixType::Modelview), Mat4::IDENTITY);
    let ortho = Mat4::orthographic_rh_zo(0.0, 320.0, 240.0, 0.0, 0.0, 1.0);
    assert_eq!(headless(&ctx).matrix(MatrixType::Projection), ortho);
    assert!(!ctx.render_state().depth.test);
    assert!(ctx.render_state().blend.enabled);
}

#[test]
fn test_mode_2d_then_3d_restores_stacks() {
    let mut ctx = headless_context();
    let projection = Mat4::perspective_rh_zo(1.2, 4.0 / 3.0, 0.1, 256.0);
    let view = Mat4::from_translation(Vec3::new(0.0, -1.6, -5.0));
    ctx.set_matrix_mode(MatrixType::Projection);
    ctx.load_matrix(&projection);
    ctx.set_matrix_mode(MatrixType::Modelview);
    ctx.load_matrix(&view);

    ctx.mode_2d(320.0, 240.0);
    ctx.mode_3d();

    assert_eq!(ctx.matrix(MatrixType::Projection), projection);
    assert_eq!(ctx.matrix(MatrixType::Modelview), view);
    assert_eq!(ctx.matrix_depth(MatrixType::Projection), 0);
    assert_eq!(ctx.matrix_depth(MatrixType::Modelview), 0);
    assert_eq!(headless(&ctx).matrix(MatrixType::Projection), projection);
    assert_eq!(headless(&ctx).matrix(MatrixType::Modelview), view);
    assert!(ctx.render_state().depth.test);
    assert!(!ctx.render_state().blend.enabled);
}

#[test]
#[should_panic]
fn test_mode_3d_without_mode_2d_panics() {
    let mut ctx = headless_context();
    ctx.mode_3d();
}
