/// Terminal front-end: drives the frame updater with the ASCII rasterizer
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use std::io::{stdout, Write};
use std::time::{Duration, Instant};
use turntable_core::{shaders, FrameOutcome, FrameUpdater, MeshData, SceneConfig};

pub mod logging;
pub mod renderer;

pub use renderer::AsciiRenderer;

/// Frame budget for the 30 fps host loop
const FRAME_TIME: Duration = Duration::from_millis(1000 / 30);

/// Viewport in square pixels for a terminal of `columns` x `rows` cells
pub fn viewport_for(columns: u16, rows: u16) -> (u32, u32) {
    (columns as u32, rows as u32 * 2)
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    updater: FrameUpdater<AsciiRenderer>,
    renderer: AsciiRenderer,
    started: Instant,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Validate the scene and upload `meshes`; mesh `i` is styled by
    /// material table entry `i`.
    pub fn new(config: SceneConfig, meshes: &[MeshData]) -> Result<Self> {
        let (columns, rows) = terminal::size().context("querying terminal size")?;
        let viewport = viewport_for(columns, rows);

        let mut renderer = AsciiRenderer::new(viewport.0, viewport.1);
        let mut updater = FrameUpdater::new(config).context("invalid scene configuration")?;
        updater
            .initialize(&mut renderer, &shaders::lambert(), meshes, viewport)
            .context("setting up the renderer")?;

        let now = Instant::now();
        Ok(Self {
            updater,
            renderer,
            started: now,
            last_fps_sample: now,
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> Result<()> {
        loop {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            let now = self.started.elapsed().as_secs_f64();
            match self.updater.tick(&mut self.renderer, now)? {
                FrameOutcome::Stopped => break,
                FrameOutcome::Drawn { .. } | FrameOutcome::Skipped => {}
            }

            self.present()?;

            let elapsed = frame_start.elapsed();
            if elapsed < FRAME_TIME {
                std::thread::sleep(FRAME_TIME - elapsed);
            }
            self.count_frame();
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code: KeyCode::Char('q') | KeyCode::Esc,
                kind: KeyEventKind::Press,
                ..
            }) => self.updater.stop(),
            Event::Resize(columns, rows) => {
                let (width, height) = viewport_for(columns, rows);
                if let Err(e) = self.updater.resize(&mut self.renderer, width, height) {
                    log::warn!("ignoring resize to {}x{}: {}", columns, rows, e);
                }
            }
            _ => {}
        }
    }

    fn count_frame(&mut self) {
        self.frame_count += 1;
        let now = Instant::now();
        let window = now - self.last_fps_sample;
        if window.as_secs() >= 1 {
            self.fps = self.frame_count as f32 / window.as_secs_f32();
            self.frame_count = 0;
            self.last_fps_sample = now;
        }
    }

    fn present(&mut self) -> Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.write_frame(&mut stdout)?;

        // Status line over the first row
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Turntable | FPS: {:.1} | angle: {:5.1} deg | Q=Quit",
                self.fps,
                self.updater.animation().angle().to_degrees()
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_doubles_rows() {
        assert_eq!(viewport_for(80, 24), (80, 48));
        assert_eq!(viewport_for(0, 0), (0, 0));
    }
}
