//! WGSL source of the filter.
//!
//! The module is assembled from three parts: the uniform/binding block, the
//! weight function supplied by a [`crate::WeightFunction`], and the fixed
//! vertex and fragment stages. Both passes compile the same module; they
//! differ only in the texel step written to their uniform buffer.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::FilterError;
use crate::weight::WGSL_WEIGHT_FN;

pub(crate) const VERTEX_ENTRY: &str = "vs_main";
pub(crate) const FRAGMENT_ENTRY: &str = "fs_main";

/// Uniform members the filter writes every draw.
pub(crate) const REQUIRED_UNIFORMS: [&str; 5] = [
    "texel_width_offset",
    "texel_height_offset",
    "screen_ratio",
    "debug_log",
    "focus_location",
];

/// Bindings: source texture and sampler in group 0, per-pass uniforms in group 1.
/// Field order must match [`crate::BlurUniforms`].
pub(crate) const BINDINGS_WGSL: &str = r#"
struct BlurUniforms {
    texel_width_offset: f32,
    texel_height_offset: f32,
    screen_ratio: f32,
    debug_log: f32,
    focus_location: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0) var t_input: texture_2d<f32>;
@group(0) @binding(1) var s_input: sampler;
@group(1) @binding(0) var<uniform> uniforms: BlurUniforms;

const LOG_SENTINEL: f32 = -10.0;
const NEAR_TAP: f32 = 1.5;
const FAR_TAP: f32 = 3.5;
const TAP_COEFFICIENT: f32 = 0.2;
"#;

/// Fullscreen triangle producing the five tap coordinates of the pass, the
/// fragment's position in focus space and the debug varying.
pub(crate) const VERTEX_WGSL: &str = r#"
struct BlurVaryings {
    @builtin(position) position: vec4<f32>,
    @location(0) center: vec2<f32>,
    @location(1) one_step_left: vec2<f32>,
    @location(2) two_steps_left: vec2<f32>,
    @location(3) one_step_right: vec2<f32>,
    @location(4) two_steps_right: vec2<f32>,
    @location(5) screen_coord: vec2<f32>,
    @location(6) @interpolate(flat) log_value: f32,
};

@vertex
fn vs_main(@builtin(vertex_index) vi: u32) -> BlurVaryings {
    // 3 vertices cover the whole target
    let corner = vec2<f32>(f32((vi << 1u) & 2u), f32(vi & 2u));
    let clip = corner * 2.0 - 1.0;
    let uv = vec2<f32>(corner.x, 1.0 - corner.y);

    let step = vec2<f32>(uniforms.texel_width_offset, uniforms.texel_height_offset);
    let first_offset = NEAR_TAP * step;
    let second_offset = FAR_TAP * step;

    var out: BlurVaryings;
    out.position = vec4<f32>(clip, 0.0, 1.0);
    out.center = uv;
    out.one_step_left = uv - first_offset;
    out.two_steps_left = uv - second_offset;
    out.one_step_right = uv + first_offset;
    out.two_steps_right = uv + second_offset;
    out.screen_coord = clip;
    out.log_value = uniforms.debug_log;
    return out;
}
"#;

/// Five tap weighted box blur. Taps are pushed out from the center by the
/// weight; `textureSampleLevel` keeps sampling legal after the early returns.
pub(crate) const FRAGMENT_WGSL: &str = r#"
@fragment
fn fs_main(in: BlurVaryings) -> @location(0) vec4<f32> {
    if (in.log_value != LOG_SENTINEL) {
        return vec4<f32>(in.log_value, 0.0, 0.0, 1.0);
    }

    let weight = blur_weight(in.screen_coord, uniforms.focus_location, uniforms.screen_ratio);
    if (weight <= 0.0) {
        return textureSampleLevel(t_input, s_input, in.center, 0.0);
    }

    let one_step_left = mix(in.center, in.one_step_left, weight);
    let two_steps_left = mix(in.center, in.two_steps_left, weight);
    let one_step_right = mix(in.center, in.one_step_right, weight);
    let two_steps_right = mix(in.center, in.two_steps_right, weight);

    var color = textureSampleLevel(t_input, s_input, in.center, 0.0) * TAP_COEFFICIENT;
    color += textureSampleLevel(t_input, s_input, one_step_left, 0.0) * TAP_COEFFICIENT;
    color += textureSampleLevel(t_input, s_input, one_step_right, 0.0) * TAP_COEFFICIENT;
    color += textureSampleLevel(t_input, s_input, two_steps_left, 0.0) * TAP_COEFFICIENT;
    color += textureSampleLevel(t_input, s_input, two_steps_right, 0.0) * TAP_COEFFICIENT;
    return color;
}
"#;

/// Concatenates bindings, weight function and both stages into one module.
pub(crate) fn build_filter_wgsl(weight_source: &str) -> String {
    format!("{BINDINGS_WGSL}\n{weight_source}\n{VERTEX_WGSL}\n{FRAGMENT_WGSL}")
}

fn block_comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"))
}

fn line_comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"//[^\n]*").expect("valid regex"))
}

fn weight_fn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"\bfn\s+{WGSL_WEIGHT_FN}\s*\(")).expect("valid regex")
    })
}

fn uniform_member_regexes() -> &'static [(&'static str, Regex)] {
    static RES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    RES.get_or_init(|| {
        REQUIRED_UNIFORMS
            .iter()
            .map(|&name| {
                let member = Regex::new(&format!(r"\b{name}\s*:")).expect("valid regex");
                (name, member)
            })
            .collect()
    })
}

/// Removes `/* */` and `//` comments so commented-out code does not count.
pub(crate) fn strip_comments(source: &str) -> String {
    let no_block = block_comment_regex().replace_all(source, "");
    line_comment_regex().replace_all(&no_block, "").into_owned()
}

/// Checks a composed module before it reaches the GPU.
///
/// The weight function comes from the [`crate::WeightFunction`] and is the
/// part callers control. The uniform members come from [`BINDINGS_WGSL`];
/// checking them keeps that block in step with [`crate::BlurUniforms`] and
/// [`REQUIRED_UNIFORMS`].
pub(crate) fn validate_filter_wgsl(source: &str) -> Result<(), FilterError> {
    let stripped = strip_comments(source);

    if !weight_fn_regex().is_match(&stripped) {
        return Err(FilterError::MissingWeightFunction);
    }

    for (name, member) in uniform_member_regexes() {
        if !member.is_match(&stripped) {
            return Err(FilterError::MissingUniform(*name));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weight::{RadialWeight, UniformWeight, WeightFunction};

    #[test]
    fn composed_radial_module_is_valid() {
        let source = build_filter_wgsl(&RadialWeight::default().wgsl());
        assert_eq!(validate_filter_wgsl(&source), Ok(()));
        assert!(source.contains("fn vs_main("));
        assert!(source.contains("fn fs_main("));
    }

    #[test]
    fn composed_uniform_module_is_valid() {
        let source = build_filter_wgsl(&UniformWeight::default().wgsl());
        assert_eq!(validate_filter_wgsl(&source), Ok(()));
    }

    #[test]
    fn missing_weight_fn_is_reported() {
        let source = build_filter_wgsl("fn other_weight() -> f32 { return 1.0; }");
        assert_eq!(
            validate_filter_wgsl(&source),
            Err(FilterError::MissingWeightFunction)
        );
    }

    #[test]
    fn commented_out_weight_fn_does_not_count() {
        let source = build_filter_wgsl("// fn blur_weight(coord: vec2<f32>) -> f32 {}");
        assert_eq!(
            validate_filter_wgsl(&source),
            Err(FilterError::MissingWeightFunction)
        );
    }

    #[test]
    fn bindings_declare_every_required_uniform() {
        let stripped = strip_comments(BINDINGS_WGSL);
        assert_eq!(uniform_member_regexes().len(), REQUIRED_UNIFORMS.len());
        for (name, member) in uniform_member_regexes() {
            assert!(member.is_match(&stripped), "`{name}` missing from bindings");
        }
    }

    #[test]
    fn commented_out_uniform_is_reported() {
        let source = build_filter_wgsl(&UniformWeight::default().wgsl())
            .replace("debug_log: f32,", "// debug_log: f32,");
        assert_eq!(
            validate_filter_wgsl(&source),
            Err(FilterError::MissingUniform("debug_log"))
        );
    }

    #[test]
    fn missing_uniform_is_reported() {
        let weight = RadialWeight::default().wgsl();
        let source = build_filter_wgsl(&weight).replace("screen_ratio: f32,", "");
        assert_eq!(
            validate_filter_wgsl(&source),
            Err(FilterError::MissingUniform("screen_ratio"))
        );
    }
}
