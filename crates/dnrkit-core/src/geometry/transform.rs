//! CSS transform parsing and 2D affine decomposition.
//!
//! Transforms are parsed from their computed-style strings into an immutable
//! [`Affine`] each time they are needed, so no platform matrix object is
//! required.

use kurbo::{Affine, Vec2};

/// Translation, scale and rotation recovered from an affine transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposed {
    pub translate: Vec2,
    pub scale: Vec2,
    /// Rotation in radians.
    pub rotation: f64,
}

/// Parse a CSS `transform` value. `none` and empty strings yield the identity.
///
/// Supports `matrix`, `matrix3d` (2D part only), `translate`, `translateX`,
/// `translateY`, `translate3d`, `scale`, `scaleX`, `scaleY` and `rotate`.
/// Functions compose left to right as in CSS.
pub fn parse_transform(value: &str) -> Option<Affine> {
    let value = value.trim();
    if value.is_empty() || value == "none" {
        return Some(Affine::IDENTITY);
    }

    let mut result = Affine::IDENTITY;
    let mut rest = value;
    while !rest.trim_start().is_empty() {
        let trimmed = rest.trim_start();
        let open = trimmed.find('(')?;
        let close = trimmed.find(')')?;
        if close < open {
            return None;
        }
        let name = trimmed[..open].trim();
        let args = parse_args(&trimmed[open + 1..close])?;
        result *= function_to_affine(name, &args)?;
        rest = &trimmed[close + 1..];
    }
    Some(result)
}

fn parse_args(args: &str) -> Option<Vec<f64>> {
    args.split(',')
        .map(|a| {
            let a = a.trim();
            let a = a
                .strip_suffix("px")
                .or_else(|| a.strip_suffix("deg"))
                .unwrap_or(a);
            a.trim().parse::<f64>().ok()
        })
        .collect()
}

fn function_to_affine(name: &str, args: &[f64]) -> Option<Affine> {
    let arg = |i: usize| args.get(i).copied();
    match name {
        "matrix" if args.len() == 6 => Some(Affine::new([args[0], args[1], args[2], args[3], args[4], args[5]])),
        "matrix3d" if args.len() == 16 => Some(Affine::new([args[0], args[1], args[4], args[5], args[12], args[13]])),
        "translate" => Some(Affine::translate((arg(0)?, arg(1).unwrap_or(0.0)))),
        "translate3d" => Some(Affine::translate((arg(0)?, arg(1)?))),
        "translateX" => Some(Affine::translate((arg(0)?, 0.0))),
        "translateY" => Some(Affine::translate((0.0, arg(0)?))),
        "scale" => {
            let sx = arg(0)?;
            Some(Affine::scale_non_uniform(sx, arg(1).unwrap_or(sx)))
        }
        "scaleX" => Some(Affine::scale_non_uniform(arg(0)?, 1.0)),
        "scaleY" => Some(Affine::scale_non_uniform(1.0, arg(0)?)),
        "rotate" => Some(Affine::rotate(arg(0)?.to_radians())),
        _ => None,
    }
}

/// Per-axis scale factors of an affine transform.
pub fn scale_of(affine: Affine) -> Vec2 {
    let [a, b, c, d, _, _] = affine.as_coeffs();
    Vec2::new(a.hypot(b), c.hypot(d))
}

/// Scale factors of a CSS transform string, `(1, 1)` when it cannot be parsed.
pub fn scale_of_css(value: Option<&str>) -> Vec2 {
    value
        .and_then(parse_transform)
        .map(scale_of)
        .filter(|s| s.x > 0.0 && s.y > 0.0)
        .unwrap_or(Vec2::new(1.0, 1.0))
}

/// Translation part of a CSS transform string, zero when absent or unparsable.
pub fn translation_of_css(value: Option<&str>) -> Vec2 {
    value
        .and_then(parse_transform)
        .map(|a| a.translation())
        .unwrap_or(Vec2::ZERO)
}

/// Split an affine into translation, scale and rotation (no skew).
pub fn decompose(affine: Affine) -> Decomposed {
    let [a, b, _, _, e, f] = affine.as_coeffs();
    let scale = scale_of(affine);
    let det = affine.determinant();
    let sy = if det < 0.0 { -scale.y } else { scale.y };
    Decomposed {
        translate: Vec2::new(e, f),
        scale: Vec2::new(scale.x, sy),
        rotation: b.atan2(a),
    }
}

/// Format an affine as a CSS `matrix()` value.
pub fn to_css_matrix(affine: Affine) -> String {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    format!("matrix({a}, {b}, {c}, {d}, {e}, {f})")
}

/// Format a translation as a CSS `translate3d()` value.
pub fn to_css_translate(offset: Vec2) -> String {
    format!("translate3d({}px, {}px, 0)", offset.x, offset.y)
}
