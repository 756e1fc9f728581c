/// ASCII rasterizer implementing the render backend for terminals
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Vector3, Vector4};
use std::io::Write;
use turntable_core::config::{PipelineState, Winding};
use turntable_core::error::ShaderStage;
use turntable_core::math;
use turntable_core::{
    Lighting, Material, MatrixUniform, MeshData, PipelineError, RenderBackend, Result, Rgba,
    ShaderSources,
};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Squares per texture edge when a textured surface is drawn as a checkerboard
const CHECKER_SQUARES: f32 = 4.0;

/// The terminal has no shader compiler; a program only records that
/// sources were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiProgram;

/// Index of an uploaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiMesh(usize);

/// Textures have no pixels here; they render as a checkerboard over the UVs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsciiTexture {
    pub name: String,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    depth: f32,
    glyph: char,
    color: Color,
}

const EMPTY: Cell = Cell {
    depth: f32::INFINITY,
    glyph: ' ',
    color: Color::Reset,
};

/// Vertex after the vertex stage: screen position, NDC depth, uv
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
    uv: [f32; 2],
}

/// Software backend that rasterizes into a character grid.
///
/// The viewport is measured in square "pixels": one per column and two per
/// row, since a terminal cell is roughly twice as tall as it is wide.
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    meshes: Vec<MeshData>,
    world: Matrix4<f32>,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    lighting: Lighting,
    pipeline: PipelineState,
}

impl AsciiRenderer {
    /// `width` and `height` in pixels (columns, rows * 2)
    pub fn new(width: u32, height: u32) -> Self {
        let mut renderer = Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
            meshes: Vec::new(),
            world: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            lighting: Lighting::default(),
            pipeline: PipelineState::default(),
        };
        renderer.set_viewport(width, height);
        renderer
    }

    pub fn columns(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.cells.len() / self.width.max(1)
    }

    /// Current frame as plain text, one line per row
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.rows());
        for row in self.cells.chunks(self.width.max(1)) {
            out.extend(row.iter().map(|c| c.glyph));
            out.push('\n');
        }
        out
    }

    /// Number of cells covered by geometry in the current frame
    pub fn covered(&self) -> usize {
        self.cells.iter().filter(|c| c.depth.is_finite()).count()
    }

    /// Queue the frame as colored glyphs; the caller flushes
    pub fn write_frame<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.cells.chunks(self.width.max(1)) {
            for cell in row {
                writer.queue(SetForegroundColor(cell.color))?;
                writer.queue(Print(cell.glyph))?;
            }
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }

    fn vertex_stage(&self, mesh: &MeshData, mvp: &Matrix4<f32>, index: usize) -> Option<ScreenVertex> {
        let p = mesh.position(index);
        let clip = mvp * Vector4::new(p.x, p.y, p.z, 1.0);

        // Behind or on the eye plane: no sensible projection
        if clip.w <= 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        Some(ScreenVertex {
            x: (ndc.x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc.y) * 0.5 * self.height as f32,
            z: ndc.z,
            uv: mesh.tex_coord(index),
        })
    }

    fn is_front_facing(&self, v: &[ScreenVertex; 3]) -> bool {
        // Screen y points down, so counter-clockwise in NDC is negative here
        let area = (v[1].x - v[0].x) * (v[2].y - v[0].y) - (v[2].x - v[0].x) * (v[1].y - v[0].y);
        match self.pipeline.front_face {
            Winding::CounterClockwise => area < 0.0,
            Winding::Clockwise => area > 0.0,
        }
    }

    fn face_brightness(&self, mesh: &MeshData, tri: [usize; 3]) -> f32 {
        let mut normal: Vector3<f32> = tri.iter().map(|&i| mesh.normal(i)).sum();
        if normal.norm() < 1e-6 {
            let (a, b, c) = (mesh.position(tri[0]), mesh.position(tri[1]), mesh.position(tri[2]));
            normal = (b - a).cross(&(c - a));
        }
        let world_normal = (self.world * normal.push(0.0)).xyz();
        self.lighting.brightness(&world_normal)
    }

    fn rasterize_triangle(
        &mut self,
        v: &[ScreenVertex; 3],
        brightness: f32,
        color: Rgba,
        textured: bool,
    ) {
        if self.cells.is_empty() {
            return;
        }

        // Bounding box, clipped to the viewport
        let min_x = v.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
        let max_x = v.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil();
        let min_y = v.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
        let max_y = v.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil();
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let max_x = (max_x as usize).min(self.width.saturating_sub(1));
        let max_row = ((max_y as usize) / 2).min(self.rows().saturating_sub(1));

        for row in (min_y / 2)..=max_row {
            // Sample at the centre of the cell, i.e. between its two pixels
            let py = row as f32 * 2.0 + 1.0;
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let Some((w0, w1, w2)) = barycentric(v, (px, py)) else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v[0].z + w1 * v[1].z + w2 * v[2].z;
                if !(-1.0..=1.0).contains(&depth) {
                    continue;
                }
                let idx = row * self.width + x;
                if self.pipeline.depth_test && depth >= self.cells[idx].depth {
                    continue;
                }

                let mut shade = brightness;
                if textured {
                    let u = w0 * v[0].uv[0] + w1 * v[1].uv[0] + w2 * v[2].uv[0];
                    let t = w0 * v[0].uv[1] + w1 * v[1].uv[1] + w2 * v[2].uv[1];
                    let square = (u * CHECKER_SQUARES).floor() + (t * CHECKER_SQUARES).floor();
                    if square.rem_euclid(2.0) >= 1.0 {
                        shade *= 0.55;
                    }
                }

                self.cells[idx] = Cell {
                    depth,
                    glyph: glyph_for(shade),
                    color: terminal_color(color, shade),
                };
            }
        }
    }
}

impl RenderBackend for AsciiRenderer {
    type Program = AsciiProgram;
    type Mesh = AsciiMesh;
    type Texture = AsciiTexture;

    fn is_context_lost(&self) -> bool {
        false
    }

    fn build_program(&mut self, sources: &ShaderSources<'_>) -> Result<AsciiProgram> {
        if sources.vertex.trim().is_empty() {
            return Err(PipelineError::CompileFailure {
                stage: ShaderStage::Vertex,
                log: "empty shader source".to_string(),
            });
        }
        if sources.fragment.trim().is_empty() {
            return Err(PipelineError::CompileFailure {
                stage: ShaderStage::Fragment,
                log: "empty shader source".to_string(),
            });
        }
        Ok(AsciiProgram)
    }

    fn configure(&mut self, state: &PipelineState, _clear_color: Rgba) {
        // The terminal background stays as the user configured it
        self.pipeline = *state;
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width as usize;
        self.height = height as usize;
        let rows = (self.height + 1) / 2;
        self.cells = vec![EMPTY; self.width * rows];
    }

    fn upload_mesh(&mut self, mesh: &MeshData) -> Result<AsciiMesh> {
        mesh.check()?;
        self.meshes.push(mesh.clone());
        Ok(AsciiMesh(self.meshes.len() - 1))
    }

    fn load_texture(&mut self, name: &str) -> Result<AsciiTexture> {
        Ok(AsciiTexture {
            name: name.to_string(),
        })
    }

    fn use_program(&mut self, _program: &AsciiProgram) {}

    fn set_matrix(&mut self, _program: &AsciiProgram, uniform: MatrixUniform, value: &[f32; 16]) {
        let m = Matrix4::from_column_slice(value);
        match uniform {
            MatrixUniform::World => self.world = m,
            MatrixUniform::View => self.view = m,
            MatrixUniform::Projection => self.projection = m,
        }
    }

    fn set_lighting(&mut self, _program: &AsciiProgram, lighting: &Lighting) {
        self.lighting = *lighting;
    }

    fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }

    fn draw(
        &mut self,
        _program: &AsciiProgram,
        mesh: &AsciiMesh,
        material: &Material,
        texture: Option<&AsciiTexture>,
    ) -> Result<()> {
        // Take the mesh out so rasterizing can borrow self mutably
        let data = match self.meshes.get_mut(mesh.0) {
            Some(slot) => std::mem::take(slot),
            None => {
                return Err(PipelineError::DrawFailure(format!(
                    "unknown mesh handle {}",
                    mesh.0
                )))
            }
        };

        let mvp = math::multiply(&math::multiply(&self.projection, &self.view), &self.world);
        for tri in data.triangles() {
            let corners = [
                self.vertex_stage(&data, &mvp, tri[0]),
                self.vertex_stage(&data, &mvp, tri[1]),
                self.vertex_stage(&data, &mvp, tri[2]),
            ];
            let [Some(a), Some(b), Some(c)] = corners else {
                continue;
            };
            let screen = [a, b, c];
            if self.pipeline.cull_back_faces && !self.is_front_facing(&screen) {
                continue;
            }
            let brightness = self.face_brightness(&data, tri);
            self.rasterize_triangle(&screen, brightness, material.color, texture.is_some());
        }

        self.meshes[mesh.0] = data;
        Ok(())
    }
}

fn glyph_for(brightness: f32) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    // Never pick the blank glyph for covered cells
    let index = (brightness.clamp(0.0, 1.0) * last as f32).round() as usize;
    LUMINOSITY_RAMP[index.clamp(1, last)]
}

fn terminal_color(color: Rgba, brightness: f32) -> Color {
    let lit = color.scaled(brightness.clamp(0.0, 1.0));
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb {
        r: channel(lit.r()),
        g: channel(lit.g()),
        b: channel(lit.b()),
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v: &[ScreenVertex; 3], p: (f32, f32)) -> Option<(f32, f32, f32)> {
    let denom = (v[1].y - v[2].y) * (v[0].x - v[2].x) + (v[2].x - v[1].x) * (v[0].y - v[2].y);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v[1].y - v[2].y) * (p.0 - v[2].x) + (v[2].x - v[1].x) * (p.1 - v[2].y)) / denom;
    let w1 = ((v[2].y - v[0].y) * (p.0 - v[2].x) + (v[0].x - v[2].x) * (p.1 - v[2].y)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use turntable_core::{shaders, FrameOutcome, FrameUpdater, SceneConfig};

    fn spinning_cube(config: SceneConfig) -> (FrameUpdater<AsciiRenderer>, AsciiRenderer) {
        let mut renderer = AsciiRenderer::new(80, 48);
        let mut updater = FrameUpdater::new(config).unwrap();
        updater
            .initialize(&mut renderer, &shaders::lambert(), &[MeshData::cube(2.0)], (80, 48))
            .unwrap();
        (updater, renderer)
    }

    #[test]
    fn test_renders_cube() {
        let (mut updater, mut renderer) = spinning_cube(SceneConfig::default());
        assert_eq!(
            updater.tick(&mut renderer, 0.0).unwrap(),
            FrameOutcome::Drawn { objects: 1 }
        );

        assert_eq!(renderer.rows(), 24);
        let text = renderer.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 24);

        // Centre is covered, corner is not
        assert_ne!(lines[12].chars().nth(40), Some(' '));
        assert_eq!(lines[0].chars().next(), Some(' '));
        assert!(renderer.covered() > 0);
    }

    #[test]
    fn test_clear_empties_grid() {
        let (mut updater, mut renderer) = spinning_cube(SceneConfig::default());
        updater.tick(&mut renderer, 0.0).unwrap();
        renderer.clear();
        assert_eq!(renderer.covered(), 0);
        assert!(renderer.text().chars().all(|c| c == ' ' || c == '\n'));
    }

    #[test]
    fn test_culling_hides_back_faces() {
        let (mut updater, mut renderer) = spinning_cube(SceneConfig::default());
        updater.tick(&mut renderer, 0.0).unwrap();
        let culled = renderer.covered();

        let mut config = SceneConfig::default();
        config.pipeline.cull_back_faces = false;
        let (mut updater, mut unculled) = spinning_cube(config);
        updater.tick(&mut unculled, 0.0).unwrap();

        // Facing the camera head-on, culling drops nothing visible
        assert_eq!(culled, unculled.covered());

        // Flipping the winding culls the visible face instead
        let mut config = SceneConfig::default();
        config.pipeline.front_face = Winding::Clockwise;
        let (mut updater, mut flipped) = spinning_cube(config);
        updater.tick(&mut flipped, 0.0).unwrap();
        assert!(flipped.covered() > 0);
        assert_ne!(flipped.text(), renderer.text());
    }

    #[test]
    fn test_viewport_resize_reallocates() {
        let mut renderer = AsciiRenderer::new(10, 10);
        assert_eq!((renderer.columns(), renderer.rows()), (10, 5));
        renderer.set_viewport(30, 7);
        assert_eq!((renderer.columns(), renderer.rows()), (30, 4));
    }

    #[test]
    fn test_empty_source_fails_to_compile() {
        let mut renderer = AsciiRenderer::new(4, 4);
        let sources = ShaderSources {
            vertex: shaders::VERTEX_SHADER,
            fragment: "  ",
        };
        assert!(matches!(
            renderer.build_program(&sources),
            Err(PipelineError::CompileFailure {
                stage: ShaderStage::Fragment,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_mesh_is_a_draw_failure() {
        let mut renderer = AsciiRenderer::new(4, 4);
        let material = Material::solid(Rgba::rgb(1.0, 0.0, 0.0));
        assert!(matches!(
            renderer.draw(&AsciiProgram, &AsciiMesh(3), &material, None),
            Err(PipelineError::DrawFailure(_))
        ));
    }

    #[test]
    fn test_write_frame_emits_every_row() {
        let renderer = AsciiRenderer::new(3, 4);
        let mut out: Vec<u8> = Vec::new();
        renderer.write_frame(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\r\n").count(), renderer.rows());
    }

    #[test]
    fn test_glyph_ramp() {
        assert_eq!(glyph_for(0.0), '.');
        assert_eq!(glyph_for(1.0), '@');
        assert_eq!(glyph_for(7.5), '@');
    }
}
