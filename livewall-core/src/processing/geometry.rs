//! Geometry planning: how a source frame becomes a target-sized frame.
//!
//! All arithmetic is integer. Crop windows and pad offsets are centred with
//! floor division, so odd remainders bias one pixel towards the left/top.

use serde::Serialize;

use crate::config::{FitMode, TargetResolution};
use crate::error::{CoreError, CoreResult};
use crate::media::SourceMedia;

/// Aspect ratios closer than this are treated as equal.
pub const ASPECT_EPSILON: f64 = 1e-3;

/// Sigma of the gaussian blur behind letterboxed content.
pub const BLUR_SIGMA: u32 = 20;

/// The one geometric operation applied before (or while) scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Transform {
    /// Aspect already matches; scale straight to the target.
    ScaleOnly,
    /// Cut a centred window with the target aspect, then scale it.
    Crop {
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    },
    /// Scale to fit inside the target, then place at (x, y) on the canvas.
    Pad {
        scaled_width: u32,
        scaled_height: u32,
        x: u32,
        y: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeometryPlan {
    /// Source size as seen by the first filter (display rotation applied,
    /// before the optional `transpose`).
    pub display_width: u32,
    pub display_height: u32,
    /// A 90° clockwise rotation precedes the transform.
    pub rotate_clockwise: bool,
    /// Size the transform operates on (after the optional rotation).
    pub source_width: u32,
    pub source_height: u32,
    pub transform: Transform,
    pub fit: FitMode,
    pub output_width: u32,
    pub output_height: u32,
}

/// Picks the transform that maps `source` onto `target`.
pub fn plan_geometry(
    source: &SourceMedia,
    target: TargetResolution,
    fit: FitMode,
    rotate_landscape: bool,
) -> CoreResult<GeometryPlan> {
    let (display_width, display_height) = source.display_dimensions();
    plan_for_dimensions(display_width, display_height, target, fit, rotate_landscape)
}

/// Same as [`plan_geometry`] for bare dimensions.
pub fn plan_for_dimensions(
    display_width: u32,
    display_height: u32,
    target: TargetResolution,
    fit: FitMode,
    rotate_landscape: bool,
) -> CoreResult<GeometryPlan> {
    if display_width == 0 || display_height == 0 {
        return Err(CoreError::Geometry(format!(
            "source has zero dimension ({display_width}x{display_height})"
        )));
    }
    if target.width == 0 || target.height == 0 {
        return Err(CoreError::Geometry(format!(
            "target has zero dimension ({target})"
        )));
    }

    let rotate_clockwise = rotate_landscape && display_width > display_height;
    let (w, h) = if rotate_clockwise {
        (display_height, display_width)
    } else {
        (display_width, display_height)
    };
    let (tw, th) = (target.width, target.height);

    let source_aspect = f64::from(w) / f64::from(h);
    let transform = if (source_aspect - target.aspect()).abs() < ASPECT_EPSILON {
        Transform::ScaleOnly
    } else {
        // w/h > tw/th without floating point.
        let source_wider = u64::from(w) * u64::from(th) > u64::from(h) * u64::from(tw);
        match fit {
            FitMode::Crop => crop_window(w, h, tw, th, source_wider)?,
            FitMode::Pad | FitMode::Blur => pad_placement(w, h, tw, th, source_wider),
        }
    };

    Ok(GeometryPlan {
        display_width,
        display_height,
        rotate_clockwise,
        source_width: w,
        source_height: h,
        transform,
        fit,
        output_width: tw,
        output_height: th,
    })
}

fn crop_window(w: u32, h: u32, tw: u32, th: u32, source_wider: bool) -> CoreResult<Transform> {
    let (width, height) = if source_wider {
        (mul_div(h, tw, th), h)
    } else {
        (w, mul_div(w, th, tw))
    };
    if width == 0 || height == 0 {
        return Err(CoreError::Geometry(format!(
            "source {w}x{h} is too small to crop to the target aspect"
        )));
    }
    Ok(Transform::Crop {
        width,
        height,
        x: (w - width) / 2,
        y: (h - height) / 2,
    })
}

fn pad_placement(w: u32, h: u32, tw: u32, th: u32, source_wider: bool) -> Transform {
    let (scaled_width, scaled_height) = if source_wider {
        (tw, even_floor(mul_div(h, tw, w)).min(th))
    } else {
        (even_floor(mul_div(w, th, h)).min(tw), th)
    };
    Transform::Pad {
        scaled_width,
        scaled_height,
        x: (tw - scaled_width) / 2,
        y: (th - scaled_height) / 2,
    }
}

/// floor(a * b / c) in 64-bit.
fn mul_div(a: u32, b: u32, c: u32) -> u32 {
    let value = u64::from(a) * u64::from(b) / u64::from(c);
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Largest even value not above `v`, at least 2.
fn even_floor(v: u32) -> u32 {
    (v & !1).max(2)
}

impl GeometryPlan {
    /// Whether the plan needs a filter graph rather than a linear chain.
    #[must_use]
    pub fn needs_graph(&self) -> bool {
        self.fit == FitMode::Blur && matches!(self.transform, Transform::Pad { .. })
    }

    /// Linear `-vf` steps, in order. Not meaningful when [`needs_graph`]
    /// is true.
    ///
    /// [`needs_graph`]: GeometryPlan::needs_graph
    #[must_use]
    pub fn filter_chain(&self) -> Vec<String> {
        let mut steps = Vec::new();
        if self.rotate_clockwise {
            steps.push("transpose=1".to_string());
        }
        match self.transform {
            Transform::ScaleOnly => {
                steps.push(lanczos_scale(self.output_width, self.output_height));
            }
            Transform::Crop {
                width,
                height,
                x,
                y,
            } => {
                steps.push(format!("crop={width}:{height}:{x}:{y}"));
                steps.push(lanczos_scale(self.output_width, self.output_height));
            }
            Transform::Pad {
                scaled_width,
                scaled_height,
                x,
                y,
            } => {
                steps.push(lanczos_scale(scaled_width, scaled_height));
                steps.push(format!(
                    "pad={}:{}:{x}:{y}:color=black",
                    self.output_width, self.output_height
                ));
            }
        }
        steps.push("setsar=1".to_string());
        steps
    }

    /// `-filter_complex` graph for blurred-fill fitting, labelled output `[v]`.
    /// `tail` is appended after the overlay (frame-rate and pixel-format steps).
    #[must_use]
    pub fn blur_graph(&self, tail: &[String]) -> String {
        let (tw, th) = (self.output_width, self.output_height);
        let (sw, sh, x, y) = match self.transform {
            Transform::Pad {
                scaled_width,
                scaled_height,
                x,
                y,
            } => (scaled_width, scaled_height, x, y),
            _ => (tw, th, 0, 0),
        };

        let mut head = String::from("[0:v]");
        if self.rotate_clockwise {
            head.push_str("transpose=1,");
        }
        head.push_str("setsar=1,split=2[bg_src][fg_src]");

        let background = format!(
            "[bg_src]scale={tw}:{th}:force_original_aspect_ratio=increase,crop={tw}:{th},gblur=sigma={BLUR_SIGMA}[bg]"
        );
        let foreground = format!("[fg_src]{}[fg]", lanczos_scale(sw, sh));

        let mut overlay = format!("[bg][fg]overlay={x}:{y}");
        for step in tail {
            overlay.push(',');
            overlay.push_str(step);
        }
        overlay.push_str(",setsar=1[v]");

        [head, background, foreground, overlay].join(";")
    }
}

fn lanczos_scale(width: u32, height: u32) -> String {
    format!("scale={width}:{height}:flags=lanczos")
}
