//! GLSL sources of the built-in shader used by the buffer-object pipeline.
//!
//! Three dialects are provided: GLSL 1.40 for desktop OpenGL 3.1+, GLSL 1.10
//! for older desktop contexts, and GLSL ES 1.00 for OpenGL ES 2 / WebGL.
//!
//! # Interface
//!
//! | Name               | Kind      | Type        | Description                        |
//! |--------------------|-----------|-------------|------------------------------------|
//! | `a_position`       | attribute | `vec3`      | Vertex position, location 0        |
//! | `a_color`          | attribute | `vec4`      | Normalized vertex color, location 1|
//! | `a_tex_coord`      | attribute | `vec2`      | Texel coordinates, location 2      |
//! | `a_normal`         | attribute | `vec3`      | Vertex normal, location 3          |
//! | `u_model_view`     | uniform   | `mat4`      | Per-draw transform                 |
//! | `u_projection`     | uniform   | `mat4`      | View transform                     |
//! | `u_texture_matrix` | uniform   | `mat4`      | Texel to normalized coordinates    |
//! | `u_texture`        | uniform   | `sampler2D` | Texture unit                       |

use crate::device::Capabilities;

/// Vertex attribute names, in location order.
/// `a_normal` is only declared by user shaders.
pub const ATTRIBUTES: [&str; 4] = ["a_position", "a_color", "a_tex_coord", "a_normal"];

/// Per-draw transform uniform.
pub const MODEL_VIEW: &str = "u_model_view";
/// View transform uniform.
pub const PROJECTION: &str = "u_projection";
/// Texture matrix uniform.
pub const TEXTURE_MATRIX: &str = "u_texture_matrix";
/// Sampler uniform.
pub const TEXTURE: &str = "u_texture";

const VERTEX_140: &str = r"#version 140

in vec3 a_position;
in vec4 a_color;
in vec2 a_tex_coord;

uniform mat4 u_model_view;
uniform mat4 u_projection;
uniform mat4 u_texture_matrix;

out vec4 v_color;
out vec2 v_tex_coord;

void main() {
    gl_Position = u_projection * u_model_view * vec4(a_position, 1.0);
    v_tex_coord = (u_texture_matrix * vec4(a_tex_coord, 0.0, 1.0)).xy;
    v_color = a_color;
}
";

const FRAGMENT_140: &str = r"#version 140

in vec4 v_color;
in vec2 v_tex_coord;

uniform sampler2D u_texture;

out vec4 frag_color;

void main() {
    frag_color = v_color * texture(u_texture, v_tex_coord);
}
";

const VERTEX_110: &str = r"#version 110

attribute vec3 a_position;
attribute vec4 a_color;
attribute vec2 a_tex_coord;

uniform mat4 u_model_view;
uniform mat4 u_projection;
uniform mat4 u_texture_matrix;

varying vec4 v_color;
varying vec2 v_tex_coord;

void main() {
    gl_Position = u_projection * u_model_view * vec4(a_position, 1.0);
    v_tex_coord = (u_texture_matrix * vec4(a_tex_coord, 0.0, 1.0)).xy;
    v_color = a_color;
}
";

const FRAGMENT_110: &str = r"#version 110

varying vec4 v_color;
varying vec2 v_tex_coord;

uniform sampler2D u_texture;

void main() {
    gl_FragColor = v_color * texture2D(u_texture, v_tex_coord);
}
";

const VERTEX_ES_100: &str = r"#version 100

attribute vec3 a_position;
attribute vec4 a_color;
attribute vec2 a_tex_coord;

uniform mat4 u_model_view;
uniform mat4 u_projection;
uniform mat4 u_texture_matrix;

varying vec4 v_color;
varying vec2 v_tex_coord;

void main() {
    gl_Position = u_projection * u_model_view * vec4(a_position, 1.0);
    v_tex_coord = (u_texture_matrix * vec4(a_tex_coord, 0.0, 1.0)).xy;
    v_color = a_color;
}
";

const FRAGMENT_ES_100: &str = r"#version 100

precision mediump float;

varying vec4 v_color;
varying vec2 v_tex_coord;

uniform sampler2D u_texture;

void main() {
    gl_FragColor = v_color * texture2D(u_texture, v_tex_coord);
}
";

/// Parse a GLSL version string such as `"1.40"` into `140`.
#[must_use]
pub fn glsl_version(version: &str) -> u32 {
    let mut parts = version.split('.');
    let major = parts.next().and_then(|p| p.trim().parse::<u32>().ok()).unwrap_or(0);
    let minor = parts
        .next()
        .map(|p| p.chars().take_while(char::is_ascii_digit).collect::<String>())
        .and_then(|p| p.parse::<u32>().ok())
        .unwrap_or(0);
    major * 100 + minor
}

/// `(vertex, fragment)` sources of the built-in shader for this context.
#[must_use]
pub fn default_sources(caps: &Capabilities) -> (&'static str, &'static str) {
    if caps.embedded {
        (VERTEX_ES_100, FRAGMENT_ES_100)
    } else if glsl_version(&caps.shading_language_version) >= 140 {
        (VERTEX_140, FRAGMENT_140)
    } else {
        (VERTEX_110, FRAGMENT_110)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_versions() {
        assert_eq!(glsl_version("1.40"), 140);
        assert_eq!(glsl_version("4.60 NVIDIA"), 460);
        assert_eq!(glsl_version("1.00"), 100);
        assert_eq!(glsl_version(""), 0);
    }

    #[test]
    fn picks_dialect_per_context() {
        let mut caps = Capabilities {
            shading_language_version: "3.30".to_owned(),
            ..Capabilities::default()
        };
        assert!(default_sources(&caps).0.starts_with("#version 140"));
        caps.shading_language_version = "1.20".to_owned();
        assert!(default_sources(&caps).0.starts_with("#version 110"));
        caps.embedded = true;
        assert!(default_sources(&caps).1.contains("precision mediump float"));
    }

    #[test]
    fn sources_declare_the_builtin_interface() {
        for (vertex, fragment) in [
            (VERTEX_140, FRAGMENT_140),
            (VERTEX_110, FRAGMENT_110),
            (VERTEX_ES_100, FRAGMENT_ES_100),
        ] {
            for name in ATTRIBUTES[..3].iter().chain(&[MODEL_VIEW, PROJECTION, TEXTURE_MATRIX]) {
                assert!(vertex.contains(name), "{name}");
            }
            assert!(fragment.contains(TEXTURE));
        }
    }
}
