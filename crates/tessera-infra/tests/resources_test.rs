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

//! Integration tests for texture and buffer lifecycle through the graphics context,
//! observed on the headless device.

use std::io::Cursor;
use tessera_core::event::TextureEvent;
use tessera_core::renderer::{
    DeviceError, GraphicsContext, GraphicsSettings, PixelFormat, ResourceError, TextureData,
    TextureId, VertexFormat, VertexPosCol, MAX_QUAD_INDICES,
};
use tessera_core::math::Rgba8;
use tessera_infra::HeadlessDevice;

/// Helper: a context over a 64x32 headless device.
fn headless_context(settings: GraphicsSettings) -> GraphicsContext {
    let _ = env_logger::builder().is_test(true).try_init();
    GraphicsContext::new(Box::new(HeadlessDevice::new(64, 32)), &settings)
        .expect("headless context creation cannot fail")
}

fn encoded_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("png encoding");
    bytes.into_inner()
}

// ─────────────────────────────────────────────────────────────────────────────
// Textures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_texture_create_delete_restores_usage() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let before = ctx.resource_usage();

    let mut id = ctx
        .create_texture(&TextureData::solid(16, 8, [1, 2, 3, 4]))
        .unwrap();
    assert!(id.is_some());
    assert_eq!(ctx.resource_usage().textures, before.textures + 1);
    assert_eq!(ctx.resource_usage().texture_bytes, 16 * 8 * 4);
    assert_eq!(ctx.texture_size(id), Some((16, 8)));

    ctx.delete_texture(&mut id);
    assert_eq!(id, TextureId::NONE);
    assert_eq!(ctx.resource_usage(), before);

    // Deleting NONE again is a no-op.
    ctx.delete_texture(&mut id);
    assert_eq!(ctx.resource_usage(), before);
}

#[test]
fn test_texture_handles_are_unique() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let data = TextureData::solid(2, 2, [0, 0, 0, 255]);
    let a = ctx.create_texture(&data).unwrap();
    let b = ctx.create_texture(&data).unwrap();
    assert_ne!(a, b);
    assert!(a.is_some() && b.is_some());
}

#[test]
fn test_deleting_bound_texture_unbinds_it() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let mut id = ctx
        .create_texture(&TextureData::solid(4, 4, [255; 4]))
        .unwrap();
    ctx.bind_texture(id);
    assert_eq!(ctx.bound_texture(), id);

    ctx.delete_texture(&mut id);
    assert_eq!(ctx.bound_texture(), TextureId::NONE);
    let device = ctx.device_as::<HeadlessDevice>().unwrap();
    assert_eq!(device.bound_texture(), TextureId::NONE);
}

#[test]
fn test_texture_above_limit_is_rejected() {
    let settings = GraphicsSettings {
        max_texture_dimensions: Some(32),
        ..GraphicsSettings::default()
    };
    let mut ctx = headless_context(settings);
    assert_eq!(ctx.max_texture_dimensions(), (32, 32));

    let result = ctx.create_texture(&TextureData::solid(33, 4, [0; 4]));
    match result {
        Err(ResourceError::DimensionTooLarge { width, height, max }) => {
            assert_eq!((width, height, max), (33, 4, (32, 32)));
        }
        other => panic!("expected DimensionTooLarge, got {other:?}"),
    }
    assert!(ctx.create_texture(&TextureData::solid(32, 32, [0; 4])).is_ok());
}

#[test]
fn test_unsupported_and_malformed_textures_are_rejected() {
    let mut ctx = headless_context(GraphicsSettings::default());
    assert!(!ctx.supports_pixel_format(PixelFormat::Luma8));

    let luma = TextureData::new(2, 2, PixelFormat::Luma8, vec![0; 4]);
    assert!(matches!(
        ctx.create_texture(&luma),
        Err(ResourceError::UnsupportedFormat(_))
    ));

    let short = TextureData::new(2, 2, PixelFormat::Rgba8, vec![0; 3]);
    assert!(matches!(
        ctx.create_texture(&short),
        Err(ResourceError::UnsupportedFormat(_))
    ));

    let empty = TextureData::new(0, 2, PixelFormat::Rgba8, Vec::new());
    assert!(matches!(
        ctx.create_texture(&empty),
        Err(ResourceError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_missing_texture_file_is_not_found() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.png");
    assert!(matches!(
        ctx.create_texture_from_path(&path),
        Err(ResourceError::NotFound(p)) if p == path
    ));
}

#[test]
fn test_texture_loads_from_png_file() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terrain.png");
    std::fs::write(&path, encoded_png(3, 5, [10, 20, 30, 255])).unwrap();

    let id = ctx.create_texture_from_path(&path).unwrap();
    assert_eq!(ctx.texture_size(id), Some((3, 5)));
    let device = ctx.device_as::<HeadlessDevice>().unwrap();
    let uploaded = device.texture(id).unwrap();
    assert_eq!(uploaded.format, PixelFormat::Rgba8);
    assert_eq!(&uploaded.pixels[..4], &[10, 20, 30, 255]);
}

#[test]
fn test_injected_out_of_memory_surfaces_as_device_error() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let before = ctx.resource_usage();
    ctx.device_as_mut::<HeadlessDevice>()
        .unwrap()
        .fail_next_allocation();

    let result = ctx.create_texture(&TextureData::solid(2, 2, [0; 4]));
    assert!(matches!(
        result,
        Err(ResourceError::Device(DeviceError::OutOfMemory))
    ));
    assert_eq!(ctx.resource_usage(), before);

    // The failure is one-shot.
    assert!(ctx.create_texture(&TextureData::solid(2, 2, [0; 4])).is_ok());
}

#[test]
fn test_replace_texture_publishes_change() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let events = ctx.subscribe_texture_events();
    let mut id = ctx
        .create_texture(&TextureData::solid(2, 2, [0; 4]))
        .unwrap();
    let old = id;

    ctx.replace_texture(&mut id, "terrain.png", &encoded_png(4, 4, [9, 9, 9, 255]))
        .unwrap();
    assert_ne!(id, old);
    assert_eq!(ctx.texture_size(old), None);
    assert_eq!(ctx.texture_size(id), Some((4, 4)));

    match events.try_recv() {
        Ok(TextureEvent::TextureChanged { name, data }) => {
            assert_eq!(name, "terrain.png");
            assert_eq!((data.width, data.height), (4, 4));
        }
        other => panic!("expected TextureChanged, got {other:?}"),
    }
    assert!(events.try_recv().is_err());
}

#[test]
fn test_replace_font_texture_also_publishes_font_changed() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let events = ctx.subscribe_texture_events();
    let mut id = TextureId::NONE;

    ctx.replace_texture(&mut id, "default.png", &encoded_png(8, 8, [255; 4]))
        .unwrap();
    assert!(id.is_some());
    assert!(matches!(
        events.try_recv(),
        Ok(TextureEvent::TextureChanged { .. })
    ));
    assert_eq!(events.try_recv(), Ok(TextureEvent::FontChanged));
}

#[test]
fn test_replace_texture_with_garbage_keeps_old_texture() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let events = ctx.subscribe_texture_events();
    let mut id = ctx
        .create_texture(&TextureData::solid(2, 2, [0; 4]))
        .unwrap();
    let old = id;

    let result = ctx.replace_texture(&mut id, "terrain.png", b"not a png");
    assert!(matches!(result, Err(ResourceError::UnsupportedFormat(_))));
    assert_eq!(id, old);
    assert_eq!(ctx.texture_size(id), Some((2, 2)));
    assert!(events.try_recv().is_err());
}

// ─────────────────────────────────────────────────────────────────────────────
// Buffers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_shared_quad_index_buffer_pattern() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let ib = ctx.build_shared_quad_index_buffer().unwrap();
    // Built once, at context creation.
    assert_eq!(ctx.build_shared_quad_index_buffer().unwrap(), ib);

    let device = ctx.device_as::<HeadlessDevice>().unwrap();
    let indices = device.index_buffer(ib).unwrap();
    assert_eq!(indices.len(), MAX_QUAD_INDICES);
    assert_eq!(indices.len(), 98304);
    for (quad, chunk) in indices.chunks_exact(6).enumerate() {
        let base = (quad * 4) as u16;
        assert_eq!(chunk, &[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
}

#[test]
fn test_vertex_buffer_lifecycle() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let before = ctx.resource_usage();
    let vertices = [VertexPosCol::new(0.0, 0.0, 0.0, Rgba8::RED); 3];

    let mut vb = ctx.create_vertex_buffer(&vertices).unwrap();
    let usage = ctx.resource_usage();
    assert_eq!(usage.vertex_buffers, before.vertex_buffers + 1);
    assert_eq!(
        usage.vertex_buffer_bytes,
        before.vertex_buffer_bytes + 3 * VertexFormat::PositionColour.stride()
    );

    ctx.bind_vertex_buffer(vb);
    ctx.delete_vertex_buffer(&mut vb);
    assert!(vb.is_none());
    assert_eq!(ctx.resource_usage(), before);
    let device = ctx.device_as::<HeadlessDevice>().unwrap();
    assert!(device.bound_vertex_buffer().is_none());
}

#[test]
fn test_index_buffer_lifecycle() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let before = ctx.resource_usage();

    let mut ib = ctx.create_index_buffer(&[0, 1, 2]).unwrap();
    let usage = ctx.resource_usage();
    assert_eq!(usage.index_buffers, before.index_buffers + 1);
    assert_eq!(usage.index_buffer_bytes, before.index_buffer_bytes + 6);

    ctx.delete_index_buffer(&mut ib);
    assert!(ib.is_none());
    assert_eq!(ctx.resource_usage(), before);
}

#[test]
fn test_dispose_releases_shared_buffers() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let usage = ctx.resource_usage();
    assert_eq!(usage.vertex_buffers, 2);
    assert_eq!(usage.index_buffers, 1);

    ctx.dispose();
    let usage = ctx.resource_usage();
    assert_eq!(usage.vertex_buffers, 0);
    assert_eq!(usage.index_buffers, 0);
    assert!(ctx.shared_colour_quad_buffer().is_none());

    // Idempotent.
    ctx.dispose();
}

#[test]
#[should_panic(expected = "owned by the graphics context")]
fn test_deleting_shared_quad_buffer_panics() {
    let mut ctx = headless_context(GraphicsSettings::default());
    let mut shared = ctx.shared_colour_quad_buffer();
    ctx.delete_dynamic_vertex_buffer(&mut shared);
}
