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

//! Integration tests for the draw dispatcher.

use tessera_core::math::Rgba8;
use tessera_core::renderer::{
    DrawMode, GraphicsContext, GraphicsSettings, TexturedQuad, VertexFormat, VertexPosCol,
    VertexPosTex, VertexPosTexCol,
};
use tessera_infra::{DeviceCommand, HeadlessDevice};
use tessera_infra::graphics::headless::decode_vertices;

fn headless_context() -> GraphicsContext {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut ctx = GraphicsContext::new(
        Box::new(HeadlessDevice::new(320, 240)),
        &GraphicsSettings::default(),
    )
    .expect("headless context creation cannot fail");
    ctx.device_as_mut::<HeadlessDevice>()
        .unwrap()
        .take_commands();
    ctx
}

fn last_draw(ctx: &GraphicsContext) -> DeviceCommand {
    ctx.device_as::<HeadlessDevice>()
        .unwrap()
        .commands()
        .iter()
        .rev()
        .find(|c| c.is_draw())
        .cloned()
        .expect("a draw was recorded")
}

fn quad_vertices(x: f32, y: f32) -> Vec<VertexPosTexCol> {
    [(1.0, 0.0), (1.0, 1.0), (0.0, 0.0), (0.0, 1.0)]
        .iter()
        .map(|&(dx, dy)| VertexPosTexCol::new(x + dx, y + dy, 0.0, dx, dy, Rgba8::WHITE))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// 2D helpers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_draw_2d_quad_vertex_order() {
    let mut ctx = headless_context();
    ctx.draw_2d_quad(10.0, 20.0, 30.0, 40.0, Rgba8::RED);

    let DeviceCommand::DrawDynamicVertexBuffer {
        mode,
        id,
        data,
        count,
    } = last_draw(&ctx)
    else {
        panic!("expected a dynamic draw");
    };
    assert_eq!(mode, DrawMode::TriangleStrip);
    assert_eq!(id, ctx.shared_colour_quad_buffer());
    assert_eq!(count, 4);

    let vertices = decode_vertices::<VertexPosCol>(&data);
    let corners: Vec<(f32, f32)> = vertices
        .iter()
        .map(|v| (v.position.x, v.position.y))
        .collect();
    assert_eq!(
        corners,
        vec![(40.0, 20.0), (40.0, 60.0), (10.0, 20.0), (10.0, 60.0)]
    );
    assert!(vertices
        .iter()
        .all(|v| v.colour == Rgba8::RED && v.position.z == 0.0));
}

#[test]
fn test_draw_2d_texture_vertex_order() {
    let mut ctx = headless_context();
    let quad = TexturedQuad::with_uv(10.0, 20.0, 30.0, 40.0, [0.25, 0.5, 0.75, 1.0]);
    ctx.draw_2d_texture(&quad);

    let DeviceCommand::DrawDynamicVertexBuffer { id, data, count, .. } = last_draw(&ctx) else {
        panic!("expected a dynamic draw");
    };
    assert_eq!(id, ctx.shared_texture_quad_buffer());
    assert_eq!(count, 4);
    let vertices = decode_vertices::<VertexPosTex>(&data);
    assert_eq!(
        vertices,
        vec![
            VertexPosTex::new(40.0, 20.0, 0.0, 0.75, 0.5),
            VertexPosTex::new(40.0, 60.0, 0.0, 0.75, 1.0),
            VertexPosTex::new(10.0, 20.0, 0.0, 0.25, 0.5),
            VertexPosTex::new(10.0, 60.0, 0.0, 0.25, 1.0),
        ]
    );
}

#[test]
fn test_dynamic_buffer_holds_last_upload() {
    let mut ctx = headless_context();
    ctx.draw_2d_quad(0.0, 0.0, 1.0, 1.0, Rgba8::RED);
    ctx.draw_2d_quad(5.0, 5.0, 1.0, 1.0, Rgba8::GREEN);

    let device = ctx.device_as::<HeadlessDevice>().unwrap();
    let contents = device
        .dynamic_contents(ctx.shared_colour_quad_buffer())
        .unwrap();
    let vertices = decode_vertices::<VertexPosCol>(contents);
    assert_eq!(vertices[2].position.x, 5.0);
    assert_eq!(vertices[0].colour, Rgba8::GREEN);

    // Each draw kept its own snapshot.
    let draws: Vec<_> = device.commands().iter().filter(|c| c.is_draw()).collect();
    assert_eq!(draws.len(), 2);
    let DeviceCommand::DrawDynamicVertexBuffer { data, .. } = draws[0] else {
        panic!("expected a dynamic draw");
    };
    assert_eq!(decode_vertices::<VertexPosCol>(data)[0].colour, Rgba8::RED);
}

// ─────────────────────────────────────────────────────────────────────────────
// Static and indexed draws
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_draw_vertex_buffer_forwards_range() {
    let mut ctx = headless_context();
    let vertices = [VertexPosCol::new(0.0, 0.0, 0.0, Rgba8::WHITE); 6];
    let vb = ctx.create_vertex_buffer(&vertices).unwrap();

    ctx.draw_vertex_buffer(DrawMode::Triangles, vb, 3, 3);
    assert_eq!(
        last_draw(&ctx),
        DeviceCommand::DrawVertexBuffer {
            mode: DrawMode::Triangles,
            id: vb,
            start_vertex: 3,
            count: 3
        }
    );
}

#[test]
fn test_draw_quads_uses_shared_index_buffer() {
    let mut ctx = headless_context();
    let vertices: Vec<_> = (0..3).flat_map(|i| quad_vertices(i as f32, 0.0)).collect();
    let vb = ctx.create_vertex_buffer(&vertices).unwrap();

    ctx.draw_quads(
        DrawMode::Triangles,
        vb,
        VertexFormat::PositionTextureColour,
        2,
        4,
    )
    .unwrap();

    let ib = ctx.build_shared_quad_index_buffer().unwrap();
    let device = ctx.device_as::<HeadlessDevice>().unwrap();
    assert_eq!(device.bound_index_buffer(), ib);
    assert_eq!(device.bound_vertex_buffer(), vb);
    assert_eq!(
        device.batch_format(),
        Some(VertexFormat::PositionTextureColour)
    );
    assert_eq!(
        last_draw(&ctx),
        DeviceCommand::DrawIndexedVertexBuffer {
            mode: DrawMode::Triangles,
            index_count: 12,
            start_vertex: 4,
            start_index: 0
        }
    );
}

#[test]
fn test_draws_update_frame_stats() {
    let mut ctx = headless_context();
    ctx.begin_frame();
    ctx.draw_2d_quad(0.0, 0.0, 1.0, 1.0, Rgba8::WHITE);
    ctx.draw_2d_texture(&TexturedQuad::new(0.0, 0.0, 8.0, 8.0));
    let stats = ctx.frame_stats();
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.vertices, 8);
    ctx.end_frame().unwrap();

    ctx.begin_frame();
    assert_eq!(ctx.frame_stats().draw_calls, 0);
    assert_eq!(ctx.frame_stats().frame_number, 2);
    ctx.end_frame().unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Contract violations
// ─────────────────────────────────────────────────────────────────────────────

#[test]
#[should_panic(expected = "no vertex buffer bound")]
fn test_indexed_draw_without_vertex_buffer_panics() {
    let mut ctx = headless_context();
    ctx.draw_indexed_vertex_buffer(DrawMode::Triangles, 6, 0, 0);
}

#[test]
#[should_panic(expected = "batch format does not match")]
fn test_indexed_draw_with_wrong_batch_format_panics() {
    let mut ctx = headless_context();
    let vb = ctx
        .create_vertex_buffer(&[VertexPosCol::default(); 4])
        .unwrap();
    let ib = ctx.build_shared_quad_index_buffer().unwrap();
    ctx.bind_vertex_buffer(vb);
    ctx.bind_index_buffer(ib);
    ctx.set_batch_format(VertexFormat::PositionTexture);
    ctx.draw_indexed_vertex_buffer(DrawMode::Triangles, 6, 0, 0);
}

#[test]
#[should_panic(expected = "vertex format does not match")]
fn test_dynamic_draw_with_wrong_format_panics() {
    let mut ctx = headless_context();
    let vb = ctx.shared_colour_quad_buffer();
    let vertices = [VertexPosTex::default(); 4];
    ctx.draw_dynamic_vertex_buffer(DrawMode::TriangleStrip, vb, &vertices, 4);
}

#[test]
#[should_panic(expected = "exceed the capacity")]
fn test_dynamic_draw_over_capacity_panics() {
    let mut ctx = headless_context();
    let vb = ctx.shared_colour_quad_buffer();
    let vertices = [VertexPosCol::default(); 5];
    ctx.draw_dynamic_vertex_buffer(DrawMode::TriangleStrip, vb, &vertices, 5);
}

#[test]
#[should_panic(expected = "exceed the")]
fn test_draw_past_end_of_buffer_panics() {
    let mut ctx = headless_context();
    let vb = ctx
        .create_vertex_buffer(&[VertexPosCol::default(); 3])
        .unwrap();
    ctx.draw_vertex_buffer(DrawMode::Triangles, vb, 1, 3);
}

#[test]
#[should_panic(expected = "past the 4 vertices")]
fn test_draw_quads_past_end_of_buffer_panics() {
    let mut ctx = headless_context();
    let vb = ctx
        .create_vertex_buffer(&[VertexPosCol::default(); 4])
        .unwrap();
    ctx.draw_quads(DrawMode::Triangles, vb, VertexFormat::PositionColour, 100, 0)
        .unwrap();
}

#[test]
#[should_panic(expected = "past the 8 vertices")]
fn test_draw_quads_with_offset_past_end_panics() {
    let mut ctx = headless_context();
    let vb = ctx
        .create_vertex_buffer(&[VertexPosCol::default(); 8])
        .unwrap();
    ctx.draw_quads(DrawMode::Triangles, vb, VertexFormat::PositionColour, 2, 4)
        .unwrap();
}
