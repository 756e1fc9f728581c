/// WebGL 1 implementation of the render backend
use turntable_core::config::{PipelineState, Winding};
use turntable_core::error::ShaderStage;
use turntable_core::shaders::{
    ATTR_NORMAL, ATTR_POSITION, ATTR_TEX_COORD, UNIFORM_AMBIENT, UNIFORM_COLOR, UNIFORM_SAMPLER,
    UNIFORM_SUN_COLOR, UNIFORM_SUN_DIRECTION, UNIFORM_USE_TEXTURE,
};
use turntable_core::{
    Lighting, Material, MatrixUniform, MeshData, PipelineError, RenderBackend, Result, Rgba,
    ShaderSources,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, HtmlImageElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext as Gl,
    WebGlShader, WebGlTexture, WebGlUniformLocation,
};

fn unavailable(msg: impl Into<String>) -> PipelineError {
    PipelineError::ResourceUnavailable(msg.into())
}

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// Attribute locations, resolved once at link time. `None` when the
/// compiler optimized the attribute away.
#[derive(Debug, Clone, Copy)]
struct Attributes {
    position: Option<u32>,
    normal: Option<u32>,
    tex_coord: Option<u32>,
}

#[derive(Debug, Clone)]
struct Uniforms {
    world: Option<WebGlUniformLocation>,
    view: Option<WebGlUniformLocation>,
    projection: Option<WebGlUniformLocation>,
    ambient: Option<WebGlUniformLocation>,
    sun_direction: Option<WebGlUniformLocation>,
    sun_color: Option<WebGlUniformLocation>,
    color: Option<WebGlUniformLocation>,
    use_texture: Option<WebGlUniformLocation>,
    sampler: Option<WebGlUniformLocation>,
}

/// Linked program plus its cached binding layout
pub struct GlProgram {
    program: WebGlProgram,
    attributes: Attributes,
    uniforms: Uniforms,
}

pub struct GlMesh {
    positions: WebGlBuffer,
    normals: WebGlBuffer,
    tex_coords: WebGlBuffer,
    indices: WebGlBuffer,
    index_count: i32,
}

pub struct GlTexture(WebGlTexture);

pub struct WebGlBackend {
    gl: Gl,
    canvas: HtmlCanvasElement,
}

impl WebGlBackend {
    /// Find the canvas by element id and create a WebGL context on it,
    /// falling back to `experimental-webgl` for older browsers.
    pub fn from_canvas_id(id: &str) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| unavailable("no document"))?;
        let canvas = document
            .get_element_by_id(id)
            .ok_or_else(|| unavailable(format!("no element with id '{}'", id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| unavailable(format!("element '{}' is not a canvas", id)))?;
        Self::from_canvas(canvas)
    }

    pub fn from_canvas(canvas: HtmlCanvasElement) -> Result<Self> {
        let mut context = None;
        for name in ["webgl", "experimental-webgl"] {
            context = canvas
                .get_context(name)
                .map_err(|e| unavailable(js_message(&e)))?;
            if context.is_some() {
                break;
            }
            log::warn!("'{}' context unavailable", name);
        }

        let gl = context
            .ok_or_else(|| unavailable("WebGL is not supported in this browser"))?
            .dyn_into::<Gl>()
            .map_err(|_| unavailable("context is not a WebGL rendering context"))?;
        Ok(Self { gl, canvas })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn compile(&self, stage: ShaderStage, source: &str) -> Result<WebGlShader> {
        let kind = match stage {
            ShaderStage::Vertex => Gl::VERTEX_SHADER,
            ShaderStage::Fragment => Gl::FRAGMENT_SHADER,
        };
        let shader = self
            .gl
            .create_shader(kind)
            .ok_or_else(|| unavailable("could not create shader"))?;
        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);

        let ok = self
            .gl
            .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false);
        if ok {
            return Ok(shader);
        }

        let log = self.gl.get_shader_info_log(&shader).unwrap_or_default();
        self.gl.delete_shader(Some(&shader));
        Err(PipelineError::CompileFailure { stage, log })
    }

    fn program_status(&self, program: &WebGlProgram, pname: u32) -> bool {
        self.gl
            .get_program_parameter(program, pname)
            .as_bool()
            .unwrap_or(false)
    }

    fn attribute(&self, program: &WebGlProgram, name: &str) -> Option<u32> {
        u32::try_from(self.gl.get_attrib_location(program, name)).ok()
    }

    fn static_buffer(&self, target: u32, bytes: &[u8]) -> Result<WebGlBuffer> {
        let buffer = self
            .gl
            .create_buffer()
            .ok_or_else(|| unavailable("could not create buffer"))?;
        self.gl.bind_buffer(target, Some(&buffer));
        self.gl.buffer_data_with_u8_array(target, bytes, Gl::STATIC_DRAW);
        self.gl.bind_buffer(target, None);
        Ok(buffer)
    }

    fn bind_attribute(&self, location: Option<u32>, buffer: &WebGlBuffer, size: i32) {
        if let Some(location) = location {
            self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(buffer));
            self.gl
                .vertex_attrib_pointer_with_i32(location, size, Gl::FLOAT, false, 0, 0);
            self.gl.enable_vertex_attrib_array(location);
        }
    }
}

impl RenderBackend for WebGlBackend {
    type Program = GlProgram;
    type Mesh = GlMesh;
    type Texture = GlTexture;

    fn is_context_lost(&self) -> bool {
        self.gl.is_context_lost()
    }

    fn build_program(&mut self, sources: &ShaderSources<'_>) -> Result<GlProgram> {
        let vertex = self.compile(ShaderStage::Vertex, sources.vertex)?;
        let fragment = match self.compile(ShaderStage::Fragment, sources.fragment) {
            Ok(shader) => shader,
            Err(e) => {
                self.gl.delete_shader(Some(&vertex));
                return Err(e);
            }
        };

        let program = self
            .gl
            .create_program()
            .ok_or_else(|| unavailable("could not create program"))?;
        self.gl.attach_shader(&program, &vertex);
        self.gl.attach_shader(&program, &fragment);
        self.gl.link_program(&program);

        // Shaders are owned by the program from here on
        self.gl.delete_shader(Some(&vertex));
        self.gl.delete_shader(Some(&fragment));

        if !self.program_status(&program, Gl::LINK_STATUS) {
            let log = self.gl.get_program_info_log(&program).unwrap_or_default();
            self.gl.delete_program(Some(&program));
            return Err(PipelineError::LinkFailure(log));
        }

        self.gl.validate_program(&program);
        if !self.program_status(&program, Gl::VALIDATE_STATUS) {
            let log = self.gl.get_program_info_log(&program).unwrap_or_default();
            self.gl.delete_program(Some(&program));
            return Err(PipelineError::LinkFailure(format!("validation: {}", log)));
        }

        let attributes = Attributes {
            position: self.attribute(&program, ATTR_POSITION),
            normal: self.attribute(&program, ATTR_NORMAL),
            tex_coord: self.attribute(&program, ATTR_TEX_COORD),
        };
        let uniform = |name: &str| self.gl.get_uniform_location(&program, name);
        let uniforms = Uniforms {
            world: uniform(MatrixUniform::World.name()),
            view: uniform(MatrixUniform::View.name()),
            projection: uniform(MatrixUniform::Projection.name()),
            ambient: uniform(UNIFORM_AMBIENT),
            sun_direction: uniform(UNIFORM_SUN_DIRECTION),
            sun_color: uniform(UNIFORM_SUN_COLOR),
            color: uniform(UNIFORM_COLOR),
            use_texture: uniform(UNIFORM_USE_TEXTURE),
            sampler: uniform(UNIFORM_SAMPLER),
        };

        if attributes.position.is_none() {
            log::warn!("program has no active '{}' attribute", ATTR_POSITION);
        }
        log::debug!("program linked: {:?}", attributes);

        Ok(GlProgram {
            program,
            attributes,
            uniforms,
        })
    }

    fn configure(&mut self, state: &PipelineState, clear_color: Rgba) {
        let gl = &self.gl;
        if state.depth_test {
            gl.enable(Gl::DEPTH_TEST);
        } else {
            gl.disable(Gl::DEPTH_TEST);
        }
        if state.cull_back_faces {
            gl.enable(Gl::CULL_FACE);
            gl.cull_face(Gl::BACK);
        } else {
            gl.disable(Gl::CULL_FACE);
        }
        gl.front_face(match state.front_face {
            Winding::CounterClockwise => Gl::CCW,
            Winding::Clockwise => Gl::CW,
        });
        gl.clear_color(clear_color.r(), clear_color.g(), clear_color.b(), clear_color.a());
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<GlMesh> {
        mesh.check()?;

        // WebGL 1 without extensions only has 16-bit index buffers
        if mesh.vertex_count() > u16::MAX as usize + 1 {
            return Err(unavailable(format!(
                "mesh has {} vertices, more than a 16-bit index buffer can address",
                mesh.vertex_count()
            )));
        }
        let indices: Vec<u16> = mesh.indices.iter().map(|&i| i as u16).collect();

        Ok(GlMesh {
            positions: self.static_buffer(Gl::ARRAY_BUFFER, bytemuck::cast_slice(&mesh.positions))?,
            normals: self.static_buffer(Gl::ARRAY_BUFFER, bytemuck::cast_slice(&mesh.normals))?,
            tex_coords: self
                .static_buffer(Gl::ARRAY_BUFFER, bytemuck::cast_slice(&mesh.tex_coords))?,
            indices: self
                .static_buffer(Gl::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(&indices))?,
            index_count: mesh.index_count() as i32,
        })
    }

    /// `name` is the id of an already loaded `<img>` element.
    fn load_texture(&mut self, name: &str) -> Result<GlTexture> {
        let image = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(name))
            .ok_or_else(|| unavailable(format!("no image with id '{}'", name)))?
            .dyn_into::<HtmlImageElement>()
            .map_err(|_| unavailable(format!("element '{}' is not an image", name)))?;
        if !image.complete() {
            return Err(unavailable(format!("image '{}' has not finished loading", name)));
        }

        let texture = self
            .gl
            .create_texture()
            .ok_or_else(|| unavailable("could not create texture"))?;
        let gl = &self.gl;
        gl.bind_texture(Gl::TEXTURE_2D, Some(&texture));
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_S, Gl::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_T, Gl::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MAG_FILTER, Gl::LINEAR as i32);
        let uploaded = gl.tex_image_2d_with_u32_and_u32_and_image(
            Gl::TEXTURE_2D,
            0,
            Gl::RGBA as i32,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            &image,
        );
        gl.bind_texture(Gl::TEXTURE_2D, None);
        uploaded.map_err(|e| unavailable(format!("texture '{}': {}", name, js_message(&e))))?;

        Ok(GlTexture(texture))
    }

    fn use_program(&mut self, program: &GlProgram) {
        self.gl.use_program(Some(&program.program));
    }

    fn set_matrix(&mut self, program: &GlProgram, uniform: MatrixUniform, value: &[f32; 16]) {
        let location = match uniform {
            MatrixUniform::World => &program.uniforms.world,
            MatrixUniform::View => &program.uniforms.view,
            MatrixUniform::Projection => &program.uniforms.projection,
        };
        self.gl
            .uniform_matrix4fv_with_f32_array(location.as_ref(), false, value);
    }

    fn set_lighting(&mut self, program: &GlProgram, lighting: &Lighting) {
        let u = &program.uniforms;
        let [ar, ag, ab] = lighting.ambient;
        let [dx, dy, dz] = lighting.sun_direction;
        let [sr, sg, sb] = lighting.sun_intensity;
        self.gl.uniform3f(u.ambient.as_ref(), ar, ag, ab);
        self.gl.uniform3f(u.sun_direction.as_ref(), dx, dy, dz);
        self.gl.uniform3f(u.sun_color.as_ref(), sr, sg, sb);
    }

    fn clear(&mut self) {
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }

    fn draw(
        &mut self,
        program: &GlProgram,
        mesh: &GlMesh,
        material: &Material,
        texture: Option<&GlTexture>,
    ) -> Result<()> {
        let attributes = program.attributes;
        self.bind_attribute(attributes.position, &mesh.positions, 3);
        self.bind_attribute(attributes.normal, &mesh.normals, 3);
        self.bind_attribute(attributes.tex_coord, &mesh.tex_coords, 2);

        let u = &program.uniforms;
        let c = material.color;
        self.gl.uniform4f(u.color.as_ref(), c.r(), c.g(), c.b(), c.a());
        match texture {
            Some(GlTexture(texture)) => {
                self.gl.active_texture(Gl::TEXTURE0);
                self.gl.bind_texture(Gl::TEXTURE_2D, Some(texture));
                self.gl.uniform1i(u.sampler.as_ref(), 0);
                self.gl.uniform1i(u.use_texture.as_ref(), 1);
            }
            None => self.gl.uniform1i(u.use_texture.as_ref(), 0),
        }

        self.gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&mesh.indices));
        self.gl
            .draw_elements_with_i32(Gl::TRIANGLES, mesh.index_count, Gl::UNSIGNED_SHORT, 0);

        match self.gl.get_error() {
            Gl::NO_ERROR => Ok(()),
            code => Err(PipelineError::DrawFailure(format!("GL error 0x{:04x}", code))),
        }
    }
}
