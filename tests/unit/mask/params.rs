use std::sync::Arc;

use super::*;
use crate::host::material::MemoryMaterials;
use crate::host::texture::{Texture2d, TextureId};

fn simple_params(rect: Rect) -> MaskParameters {
    MaskParameters {
        mask_rect: rect,
        ..MaskParameters::default()
    }
}

fn checker() -> Arc<Texture2d> {
    let px = vec![
        255, 255, 255, 255, 0, 0, 0, 0, // top row
        0, 0, 0, 0, 255, 255, 255, 255, // bottom row
    ];
    Arc::new(Texture2d::from_rgba8(TextureId(1), 2, 2, px).unwrap())
}

#[test]
fn simple_mode_maps_rect_center_to_uv_center() {
    let p = simple_params(Rect::new(0.0, 0.0, 100.0, 100.0));
    let uv = p.local_to_uv(Point::new(50.0, 50.0));
    assert!((uv.x - 0.5).abs() < 1e-9);
    assert!((uv.y - 0.5).abs() < 1e-9);
}

#[test]
fn sliced_zero_border_axis_is_degenerate_but_finite() {
    // Zero border on y, nonzero on x: the y mapping collapses to the plain
    // center stretch with no division by zero.
    let p = MaskParameters {
        mask_rect: Rect::new(0.0, 0.0, 100.0, 100.0),
        border_rect: Rect::new(10.0, 0.0, 90.0, 100.0),
        mask_uv: Rect::new(0.0, 0.0, 1.0, 1.0),
        border_uv: Rect::new(0.25, 0.0, 0.75, 1.0),
        mode: BorderMode::Sliced,
        ..MaskParameters::default()
    };
    let uv = p.local_to_uv(Point::new(50.0, 50.0));
    assert!(uv.x.is_finite() && uv.y.is_finite());
    assert!((uv.x - 0.5).abs() < 1e-9);
    assert!((uv.y - 0.5).abs() < 1e-9);

    let uv = p.local_to_uv(Point::new(5.0, 0.0));
    assert!((uv.x - 0.125).abs() < 1e-9);
    assert!((uv.y - 0.0).abs() < 1e-9);
}

#[test]
fn tiled_mode_repeats_the_center() {
    let p = MaskParameters {
        mask_rect: Rect::new(0.0, 0.0, 100.0, 100.0),
        border_rect: Rect::new(10.0, 10.0, 90.0, 90.0),
        border_uv: Rect::new(0.25, 0.25, 0.75, 0.75),
        tile_repeat: Vec2::new(2.0, 2.0),
        mode: BorderMode::Tiled,
        ..MaskParameters::default()
    };
    let a = p.local_to_uv(Point::new(30.0, 50.0));
    let b = p.local_to_uv(Point::new(70.0, 50.0));
    assert!((a.x - b.x).abs() < 1e-9, "tiles should sample alike");
}

#[test]
fn sample_solid_fill_is_full_opacity() {
    let p = simple_params(Rect::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(p.sample(Point::new(5.0, 5.0)), Ok(1.0));
}

#[test]
fn sample_weights_select_channels() {
    let p = MaskParameters {
        mask_rect: Rect::new(0.0, 0.0, 100.0, 100.0),
        texture: TextureHandle::Image(checker()),
        ..MaskParameters::default()
    };
    // Top-left texel center: opaque white.
    let v = p.sample(Point::new(25.0, 75.0)).unwrap();
    assert!((v - 1.0).abs() < 1e-6);

    let p = MaskParameters {
        weights: ChannelWeights::GRAY,
        ..p
    };
    let v = p.sample(Point::new(75.0, 75.0)).unwrap();
    assert!(v.abs() < 1e-6, "transparent black under gray weights");
}

#[test]
fn sample_render_target_is_unsupported() {
    let p = MaskParameters {
        mask_rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        texture: TextureHandle::RenderTarget(TextureId(3)),
        ..MaskParameters::default()
    };
    assert_eq!(
        p.sample(Point::new(5.0, 5.0)),
        Err(SampleError::UnsupportedKind)
    );
}

#[test]
fn sample_non_readable_texture_fails_softly() {
    let t = Arc::new(
        Texture2d::from_rgba8(TextureId(4), 1, 1, vec![255; 4])
            .unwrap()
            .non_readable(),
    );
    let p = MaskParameters {
        mask_rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        texture: TextureHandle::Image(t),
        ..MaskParameters::default()
    };
    assert_eq!(
        p.sample(Point::new(5.0, 5.0)),
        Err(SampleError::NonReadable)
    );
}

#[test]
fn apply_binds_mode_keywords_mutually_exclusively() {
    let mut dev = MemoryMaterials::new();
    let m = dev.create("ui/masked");

    for (mode, expect) in [
        (BorderMode::Simple, shader_props::KEYWORD_SIMPLE),
        (BorderMode::Sliced, shader_props::KEYWORD_SLICED),
        (BorderMode::Tiled, shader_props::KEYWORD_TILED),
    ] {
        let p = MaskParameters {
            mode,
            ..MaskParameters::default()
        };
        p.apply(&mut dev, m);
        let rec = dev.record(m).unwrap();
        let on: Vec<&str> = rec
            .keywords
            .iter()
            .filter(|&(_, &v)| v)
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(on, vec![expect]);
    }
}

#[test]
fn apply_skips_border_fields_in_simple_mode() {
    let mut dev = MemoryMaterials::new();
    let m = dev.create("ui/masked");
    simple_params(Rect::new(0.0, 0.0, 1.0, 1.0)).apply(&mut dev, m);

    let rec = dev.record(m).unwrap();
    assert!(rec.vectors.contains_key(shader_props::MASK_RECT));
    assert!(!rec.vectors.contains_key(shader_props::MASK_BORDER_RECT));
    assert!(!rec.vectors.contains_key(shader_props::MASK_TILE_REPEAT));
}

#[test]
fn apply_twice_is_idempotent_on_bound_state() {
    let mut dev = MemoryMaterials::new();
    let m = dev.create("ui/masked");
    let p = MaskParameters {
        mask_rect: Rect::new(0.0, 0.0, 64.0, 32.0),
        invert_inside: true,
        ..MaskParameters::default()
    };

    p.apply(&mut dev, m);
    let first = dev.record(m).unwrap().clone();
    p.apply(&mut dev, m);
    let second = dev.record(m).unwrap().clone();

    assert_eq!(first.vectors, second.vectors);
    assert_eq!(first.colors, second.colors);
    assert_eq!(first.floats, second.floats);
    assert_eq!(first.matrices, second.matrices);
    assert_eq!(first.textures, second.textures);
    assert_eq!(first.keywords, second.keywords);
}

#[test]
fn fingerprint_tracks_bound_fields() {
    let base = simple_params(Rect::new(0.0, 0.0, 10.0, 10.0));
    assert_eq!(base.fingerprint(), base.clone().fingerprint());

    let moved = MaskParameters {
        mask_rect: Rect::new(0.0, 0.0, 10.0, 11.0),
        ..base.clone()
    };
    assert_ne!(base.fingerprint(), moved.fingerprint());

    let inverted = MaskParameters {
        invert_outside: true,
        ..base.clone()
    };
    assert_ne!(base.fingerprint(), inverted.fingerprint());

    let textured = MaskParameters {
        texture: TextureHandle::RenderTarget(TextureId(9)),
        ..base
    };
    assert_ne!(textured.fingerprint(), inverted.fingerprint());
}
