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

//! The single GLSL program emulating the fixed-function pipeline.

use anyhow::{anyhow, Result};
use glow::HasContext;

const VERTEX_SHADER: &str = r#"#version 330 core
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec2 a_uv;
layout(location = 2) in vec4 a_colour;

uniform mat4 u_projection;
uniform mat4 u_modelview;
uniform mat4 u_tex_matrix;

out vec2 v_uv;
out vec4 v_colour;
out float v_eye_distance;

void main() {
    vec4 eye = u_modelview * vec4(a_position, 1.0);
    gl_Position = u_projection * eye;
    v_eye_distance = abs(eye.z);
    v_uv = (u_tex_matrix * vec4(a_uv, 0.0, 1.0)).xy;
    v_colour = a_colour;
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 v_uv;
in vec4 v_colour;
in float v_eye_distance;

uniform sampler2D u_texture;
uniform bool u_texturing;
uniform int u_alpha_func;
uniform float u_alpha_ref;
uniform int u_fog_mode;
uniform vec4 u_fog_colour;
uniform vec3 u_fog_params;

out vec4 frag_colour;

bool alpha_passes(float a) {
    switch (u_alpha_func) {
        case 2: return a != u_alpha_ref;
        case 3: return false;
        case 4: return a < u_alpha_ref;
        case 5: return a <= u_alpha_ref;
        case 6: return a == u_alpha_ref;
        case 7: return a >= u_alpha_ref;
        case 8: return a > u_alpha_ref;
        default: return true;
    }
}

void main() {
    vec4 colour = v_colour;
    if (u_texturing) {
        colour *= texture(u_texture, v_uv);
    }
    if (u_alpha_func != 0 && !alpha_passes(colour.a)) {
        discard;
    }
    if (u_fog_mode != 0) {
        float density = u_fog_params.x;
        float start = u_fog_params.y;
        float end = u_fog_params.z;
        float f;
        if (u_fog_mode == 1) {
            f = (end - v_eye_distance) / max(end - start, 1e-5);
        } else if (u_fog_mode == 2) {
            f = exp(-density * v_eye_distance);
        } else {
            float d = density * v_eye_distance;
            f = exp(-d * d);
        }
        colour.rgb = mix(u_fog_colour.rgb, colour.rgb, clamp(f, 0.0, 1.0));
    }
    frag_colour = colour;
}
"#;

/// Uniform locations of the linked program.
#[derive(Debug)]
pub struct Uniforms {
    pub projection: Option<glow::UniformLocation>,
    pub modelview: Option<glow::UniformLocation>,
    pub tex_matrix: Option<glow::UniformLocation>,
    pub texture: Option<glow::UniformLocation>,
    pub texturing: Option<glow::UniformLocation>,
    pub alpha_func: Option<glow::UniformLocation>,
    pub alpha_ref: Option<glow::UniformLocation>,
    pub fog_mode: Option<glow::UniformLocation>,
    pub fog_colour: Option<glow::UniformLocation>,
    pub fog_params: Option<glow::UniformLocation>,
}

#[derive(Debug)]
pub struct GlProgram {
    pub program: glow::Program,
    pub uniforms: Uniforms,
}

impl GlProgram {
    /// Compiles and links the program.
    ///
    /// # Safety
    ///
    /// `gl` must be current on the calling thread.
    pub unsafe fn new(gl: &glow::Context) -> Result<Self> {
        let program = gl.create_program().map_err(|e| anyhow!(e))?;
        let mut shaders = Vec::with_capacity(2);
        for (kind, source) in [
            (glow::VERTEX_SHADER, VERTEX_SHADER),
            (glow::FRAGMENT_SHADER, FRAGMENT_SHADER),
        ] {
            let shader = gl.create_shader(kind).map_err(|e| anyhow!(e))?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                gl.delete_program(program);
                return Err(anyhow!("Failed to compile shader: {log}"));
            }
            gl.attach_shader(program, shader);
            shaders.push(shader);
        }

        gl.link_program(program);
        let linked = gl.get_program_link_status(program);
        for shader in shaders {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }
        if !linked {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            return Err(anyhow!("Failed to link program: {log}"));
        }

        let location = |name: &str| gl.get_uniform_location(program, name);
        let uniforms = Uniforms {
            projection: location("u_projection"),
            modelview: location("u_modelview"),
            tex_matrix: location("u_tex_matrix"),
            texture: location("u_texture"),
            texturing: location("u_texturing"),
            alpha_func: location("u_alpha_func"),
            alpha_ref: location("u_alpha_ref"),
            fog_mode: location("u_fog_mode"),
            fog_colour: location("u_fog_colour"),
            fog_params: location("u_fog_params"),
        };
        log::debug!("GL fixed-function program linked");
        Ok(Self { program, uniforms })
    }

    /// # Safety
    ///
    /// `gl` must be the context the program was created on, current on this thread.
    pub unsafe fn destroy(&self, gl: &glow::Context) {
        gl.delete_program(self.program);
    }
}
