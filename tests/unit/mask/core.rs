use std::sync::Arc;

use super::*;
use crate::foundation::core::Borders;
use crate::host::material::MemoryMaterials;
use crate::host::scene::MemoryScene;
use crate::host::texture::{Sprite, SpritePacking, Texture2d, TextureHandle, TextureId};
use crate::mask::def::ChannelsDef;

fn scene_with_mask_node(rect: Rect) -> (MemoryScene, NodeId) {
    let mut scene = MemoryScene::new();
    let root = scene.add_canvas();
    let node = scene.add_child(root);
    scene.set_rect(node, rect);
    (scene, node)
}

fn tex(id: u64, w: u32, h: u32) -> Arc<Texture2d> {
    let px = vec![255u8; (w * h * 4) as usize];
    Arc::new(Texture2d::from_rgba8(TextureId(id), w, h, px).unwrap())
}

#[test]
fn tick_recomputes_solid_parameters_from_the_node_rect() {
    let (scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 100.0, 50.0));
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);
    mask.enable();

    mask.tick(&scene, &mut dev);
    assert_eq!(mask.params.mask_rect, Rect::new(0.0, 0.0, 100.0, 50.0));
    assert!(mask.params.texture.is_none());
    assert_eq!(mask.state, MaskState::Enabled { dirty: false });
}

#[test]
fn rect_change_forces_recompute_without_an_explicit_dirty() {
    let (mut scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 10.0, 10.0));
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);
    mask.enable();
    mask.tick(&scene, &mut dev);

    scene.set_rect(node, Rect::new(0.0, 0.0, 30.0, 30.0));
    mask.tick(&scene, &mut dev);
    assert_eq!(mask.params.mask_rect, Rect::new(0.0, 0.0, 30.0, 30.0));
}

#[test]
fn apply_def_validates_and_marks_dirty() {
    let (scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 10.0, 10.0));
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);
    mask.enable();
    mask.tick(&scene, &mut dev);
    assert_eq!(mask.state, MaskState::Enabled { dirty: false });

    let bad = MaskDef {
        raycast_threshold: 1.5,
        ..MaskDef::default()
    };
    assert!(mask.apply_def(&bad).is_err());

    let good = MaskDef {
        channels: ChannelsDef::Gray,
        invert_inside: true,
        ..MaskDef::default()
    };
    mask.apply_def(&good).unwrap();
    assert_eq!(mask.state, MaskState::Enabled { dirty: true });

    mask.tick(&scene, &mut dev);
    assert_eq!(mask.params.weights, ChannelWeights::GRAY);
    assert!(mask.params.invert_inside);
}

#[test]
fn sliced_sprite_source_produces_border_geometry() {
    let (scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);
    mask.set_source(MaskSource::Sprite {
        sprite: Sprite {
            texture: tex(1, 64, 64),
            rect_px: Rect::new(0.0, 0.0, 64.0, 64.0),
            border_px: Borders::uniform(8.0),
            pixels_per_unit: 100.0,
            packing: SpritePacking::Rect,
        },
        mode: BorderMode::Sliced,
        ppu_multiplier: 1.0,
    });
    mask.enable();
    mask.tick(&scene, &mut dev);

    // 8 px at 1 px-per-unit: an 8-unit border on every side.
    assert_eq!(mask.params.border_rect, Rect::new(8.0, 8.0, 92.0, 92.0));
    assert_eq!(mask.params.border_uv, Rect::new(0.125, 0.125, 0.875, 0.875));
    assert_eq!(mask.params.mode, BorderMode::Sliced);
}

#[test]
fn tiled_repeat_keeps_non_integer_ratios() {
    let (scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);
    mask.set_source(MaskSource::Sprite {
        sprite: Sprite {
            texture: tex(1, 64, 64),
            rect_px: Rect::new(0.0, 0.0, 64.0, 64.0),
            border_px: Borders::uniform(8.0),
            pixels_per_unit: 100.0,
            packing: SpritePacking::Rect,
        },
        mode: BorderMode::Tiled,
        ppu_multiplier: 1.0,
    });
    mask.enable();
    mask.tick(&scene, &mut dev);

    // Center spans 84 local units over a 48 px source tile: 1.75 tiles.
    assert!((mask.params.tile_repeat.x - 1.75).abs() < 1e-9);
    assert!((mask.params.tile_repeat.y - 1.75).abs() < 1e-9);
}

#[test]
fn overlapping_borders_are_clamped_before_application() {
    let (scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 10.0, 10.0));
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);
    mask.set_source(MaskSource::Sprite {
        sprite: Sprite {
            texture: tex(1, 64, 64),
            rect_px: Rect::new(0.0, 0.0, 64.0, 64.0),
            border_px: Borders::uniform(8.0),
            pixels_per_unit: 100.0,
            packing: SpritePacking::Rect,
        },
        mode: BorderMode::Sliced,
        ppu_multiplier: 1.0,
    });
    mask.enable();
    mask.tick(&scene, &mut dev);

    // 8 + 8 units of border over a 10-unit rect: both sides meet at center.
    let br = mask.params.border_rect;
    assert!((br.x0 - 5.0).abs() < 1e-9);
    assert!((br.x1 - 5.0).abs() < 1e-9);
}

#[test]
fn tight_packed_sprite_falls_back_to_solid() {
    let (scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 10.0, 10.0));
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);
    mask.set_source(MaskSource::Sprite {
        sprite: Sprite {
            texture: tex(1, 64, 64),
            rect_px: Rect::new(0.0, 0.0, 64.0, 64.0),
            border_px: Borders::uniform(8.0),
            pixels_per_unit: 100.0,
            packing: SpritePacking::Tight,
        },
        mode: BorderMode::Tiled,
        ppu_multiplier: 1.0,
    });
    mask.enable();
    mask.tick(&scene, &mut dev);

    assert!(mask.flags.contains(DiagFlags::TIGHT_PACKED_SPRITE));
    assert!(mask.params.texture.is_none());
    assert_eq!(mask.params.mode, BorderMode::Simple);
}

#[test]
fn preserve_aspect_applies_to_simple_graphic_sources() {
    let (mut scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 100.0, 100.0));
    scene.set_image(
        node,
        Some(crate::host::scene::NodeImage::Sprite {
            sprite: Sprite {
                texture: tex(1, 128, 64),
                rect_px: Rect::new(0.0, 0.0, 128.0, 64.0),
                border_px: Borders::default(),
                pixels_per_unit: 100.0,
                packing: SpritePacking::Rect,
            },
            mode: BorderMode::Simple,
            preserve_aspect: true,
        }),
    );
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);
    mask.enable();
    mask.tick(&scene, &mut dev);

    // 2:1 source inside a square rect: height halves, anchored at the min.
    assert_eq!(mask.params.mask_rect, Rect::new(0.0, 0.0, 100.0, 50.0));
}

#[test]
fn hit_test_respects_rect_threshold_and_inverts() {
    let (scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);

    // Checker alpha: opaque top-left and bottom-right quadrants.
    let px = vec![
        255, 255, 255, 255, 0, 0, 0, 0, //
        0, 0, 0, 0, 255, 255, 255, 255, //
    ];
    let t = Arc::new(Texture2d::from_rgba8(TextureId(5), 2, 2, px).unwrap());
    mask.set_source(MaskSource::Texture {
        texture: TextureHandle::Image(t),
        uv: Rect::new(0.0, 0.0, 1.0, 1.0),
    });
    mask.raycast_threshold = 0.5;
    mask.enable();
    mask.tick(&scene, &mut dev);

    assert!(!mask.hit_test(Point::new(150.0, 50.0)), "outside the rect");
    assert!(mask.hit_test(Point::new(25.0, 75.0)), "opaque quadrant");
    assert!(!mask.hit_test(Point::new(75.0, 75.0)), "transparent quadrant");

    mask.invert_inside = true;
    mask.invert_outside = true;
    mask.mark_dirty();
    mask.tick(&scene, &mut dev);
    assert!(mask.hit_test(Point::new(150.0, 50.0)), "inverted outside");
    assert!(!mask.hit_test(Point::new(25.0, 75.0)), "inverted inside");
    assert!(mask.hit_test(Point::new(75.0, 75.0)));
}

#[test]
fn hit_test_with_zero_threshold_skips_sampling() {
    let (scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);
    mask.set_source(MaskSource::Texture {
        texture: TextureHandle::RenderTarget(TextureId(8)),
        uv: Rect::new(0.0, 0.0, 1.0, 1.0),
    });
    mask.enable();
    mask.tick(&scene, &mut dev);

    // Unsamplable texture, but threshold 0 never samples.
    assert!(mask.hit_test(Point::new(50.0, 50.0)));
    assert!(mask.flags.is_empty());
}

#[test]
fn hit_test_sampling_failure_treats_points_as_inside() {
    let (scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut dev = MemoryMaterials::new();
    let mut mask = SoftMask::new(node);
    mask.set_source(MaskSource::Texture {
        texture: TextureHandle::RenderTarget(TextureId(8)),
        uv: Rect::new(0.0, 0.0, 1.0, 1.0),
    });
    mask.raycast_threshold = 0.5;
    mask.enable();
    mask.tick(&scene, &mut dev);

    assert!(mask.hit_test(Point::new(50.0, 50.0)));
    assert!(mask.flags.contains(DiagFlags::UNREADABLE_TEXTURE));
}

#[test]
fn disable_destroys_every_replacement() {
    let (scene, node) = scene_with_mask_node(Rect::new(0.0, 0.0, 10.0, 10.0));
    let mut dev = MemoryMaterials::new();
    let chain = ReplacerChain::new();
    let mut mask = SoftMask::new(node);
    mask.enable();
    mask.tick(&scene, &mut dev);

    let original = dev.create("ui/default");
    let repl = mask.grant(original, &chain, &mut dev).unwrap().unwrap();
    assert!(dev.is_alive(repl));

    mask.disable(&mut dev);
    assert!(!dev.is_alive(repl));
    assert!(!mask.is_enabled());
    assert_eq!(mask.cache.live_replacements(), 0);
}
