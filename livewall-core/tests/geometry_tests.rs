// livewall-core/tests/geometry_tests.rs
//
// Sweeps many source sizes through the planner and checks the properties
// every plan must hold, whatever the fit mode.

use livewall_core::config::{FitMode, TargetResolution};
use livewall_core::processing::Transform;
use livewall_core::processing::geometry::plan_for_dimensions;

const SIZES: &[u32] = &[
    2, 3, 64, 101, 240, 360, 480, 607, 720, 1000, 1080, 1081, 1280, 1440, 1920, 2160, 2376,
    2400, 3840, 4096,
];

fn targets() -> [TargetResolution; 2] {
    [TargetResolution::PHONE_20_9, TargetResolution::PHONE_11_5]
}

#[test]
fn test_crop_window_stays_inside_the_source() {
    for target in targets() {
        for &w in SIZES {
            for &h in SIZES {
                let Ok(plan) = plan_for_dimensions(w, h, target, FitMode::Crop, false) else {
                    continue;
                };
                assert_eq!((plan.output_width, plan.output_height), (target.width, target.height));
                if let Transform::Crop {
                    width,
                    height,
                    x,
                    y,
                } = plan.transform
                {
                    assert!(width > 0 && height > 0, "{w}x{h}");
                    assert!(x + width <= w, "{w}x{h}: crop overflows horizontally");
                    assert!(y + height <= h, "{w}x{h}: crop overflows vertically");
                    // Either the full width or the full height is kept.
                    assert!(width == w || height == h, "{w}x{h}");
                    // Centred, biased at most one pixel.
                    assert!((w - width) / 2 == x && (h - height) / 2 == y, "{w}x{h}");
                }
            }
        }
    }
}

#[test]
fn test_pad_placement_fits_the_canvas() {
    for fit in [FitMode::Pad, FitMode::Blur] {
        for target in targets() {
            for &w in SIZES {
                for &h in SIZES {
                    let plan = plan_for_dimensions(w, h, target, fit, false).unwrap();
                    if let Transform::Pad {
                        scaled_width,
                        scaled_height,
                        x,
                        y,
                    } = plan.transform
                    {
                        assert!(scaled_width <= target.width, "{w}x{h}");
                        assert!(scaled_height <= target.height, "{w}x{h}");
                        assert_eq!(scaled_width % 2, 0, "{w}x{h}");
                        assert_eq!(scaled_height % 2, 0, "{w}x{h}");
                        assert!(x + scaled_width <= target.width, "{w}x{h}");
                        assert!(y + scaled_height <= target.height, "{w}x{h}");
                        assert!(
                            scaled_width == target.width || scaled_height == target.height,
                            "{w}x{h}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_rotation_only_applies_to_landscape() {
    for &w in SIZES {
        for &h in SIZES {
            let plan =
                plan_for_dimensions(w, h, TargetResolution::PHONE_20_9, FitMode::Pad, true).unwrap();
            assert_eq!(plan.rotate_clockwise, w > h, "{w}x{h}");
            if plan.rotate_clockwise {
                assert_eq!((plan.source_width, plan.source_height), (h, w));
                assert_eq!(plan.filter_chain().first().map(String::as_str), Some("transpose=1"));
            }
        }
    }
}

#[test]
fn test_matching_aspect_is_scale_only() {
    for (w, h) in [(540, 1200), (1080, 2400), (2160, 4800)] {
        let plan =
            plan_for_dimensions(w, h, TargetResolution::PHONE_20_9, FitMode::Crop, false).unwrap();
        assert_eq!(plan.transform, Transform::ScaleOnly);
    }
}
