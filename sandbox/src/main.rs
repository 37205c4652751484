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

use anyhow::Result;
use tessera_core::math::{Mat4, Rgba8, Vec3};
use tessera_core::renderer::{
    BackendKind, DrawMode, GraphicsContext, GraphicsDevice, GraphicsSettings, MatrixType,
    TextureData, TexturedQuad, VertexFormat, VertexPosCol,
};
use tessera_infra::{HeadlessDevice, WgpuDevice};

const SCREENSHOT_PATH: &str = "sandbox.png";

/// Builds the device the settings ask for, falling back to the headless one.
fn create_device(settings: &GraphicsSettings) -> Box<dyn GraphicsDevice> {
    let (width, height) = settings.initial_size;
    match settings.backend {
        BackendKind::Wgpu => match WgpuDevice::create_offscreen(settings) {
            Ok(device) => return Box::new(device),
            Err(e) => log::warn!("wgpu backend unavailable ({e}), using the headless device"),
        },
        BackendKind::Gl => {
            log::warn!("The OpenGL backend needs a GL context from the windowing layer, using the headless device")
        }
        BackendKind::Headless => {}
    }
    Box::new(HeadlessDevice::new(width, height))
}

fn checkerboard(size: u32) -> TextureData {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = (x / 4 + y / 4) % 2 == 0;
            let v = if light { 230 } else { 40 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    TextureData::new(size, size, tessera_core::renderer::PixelFormat::Rgba8, pixels)
}

/// A row of coloured quads in the XY plane, four vertices per quad.
fn quad_row(count: usize) -> Vec<VertexPosCol> {
    let palette = [Rgba8::RED, Rgba8::GREEN, Rgba8::BLUE];
    (0..count)
        .flat_map(|i| {
            let x = i as f32 * 1.5 - count as f32 * 0.75;
            let colour = palette[i % palette.len()];
            [
                VertexPosCol::new(x + 1.0, 1.0, 0.0, colour),
                VertexPosCol::new(x + 1.0, 0.0, 0.0, colour),
                VertexPosCol::new(x, 0.0, 0.0, colour),
                VertexPosCol::new(x, 1.0, 0.0, colour),
            ]
        })
        .collect()
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    let settings = match std::env::args().nth(1) {
        Some(path) => GraphicsSettings::load(path)?,
        None => GraphicsSettings::default(),
    };
    let (width, height) = settings.initial_size;

    let mut gfx = GraphicsContext::new(create_device(&settings), &settings)?;
    gfx.log_api_info();

    let mut texture = gfx.create_texture(&checkerboard(32))?;
    let quads = quad_row(4);
    let mut row = gfx.create_vertex_buffer(&quads)?;

    gfx.begin_frame();
    gfx.set_clear_colour(Rgba8::rgb(100, 149, 237));
    gfx.clear();

    // 3D: the quad row seen from a few units back.
    gfx.set_depth_test(true);
    gfx.set_matrix_mode(MatrixType::Projection);
    gfx.load_matrix(&Mat4::perspective_rh_zo(
        70f32.to_radians(),
        width as f32 / height as f32,
        0.1,
        100.0,
    ));
    gfx.set_matrix_mode(MatrixType::Modelview);
    gfx.load_matrix(&Mat4::from_translation(Vec3::new(0.0, -0.5, -4.0)));
    gfx.draw_quads(
        DrawMode::Triangles,
        row,
        VertexFormat::PositionColour,
        quads.len() / 4,
        0,
    )?;

    // 2D overlay.
    gfx.mode_2d(width as f32, height as f32);
    gfx.draw_2d_quad(16.0, 16.0, 200.0, 48.0, Rgba8::new(0, 0, 0, 160));
    gfx.bind_texture(texture);
    gfx.set_texturing(true);
    gfx.draw_2d_texture(&TexturedQuad::new(24.0, 24.0, 32.0, 32.0));
    gfx.set_texturing(false);
    gfx.mode_3d();

    let stats = gfx.frame_stats();
    log::info!(
        "Frame {}: {} draw calls, {} vertices",
        stats.frame_number,
        stats.draw_calls,
        stats.vertices
    );
    gfx.take_screenshot(SCREENSHOT_PATH, width, height)?;
    gfx.end_frame()?;

    gfx.delete_vertex_buffer(&mut row);
    gfx.delete_texture(&mut texture);
    gfx.dispose();
    log::info!("Resources at exit: {:?}", gfx.resource_usage());
    Ok(())
}
