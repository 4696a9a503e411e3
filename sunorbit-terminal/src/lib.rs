/// Terminal front end: drives the scene through the ASCII software device
use crossterm::{
    cursor,
    event::{self, Event},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use sunorbit_core::{FrameLoop, FrameRenderer, RenderError, SceneConfig, SceneState, TextureImage};

pub mod input;
pub mod renderer;

pub use input::{map_key, Action};
pub use renderer::{AsciiDevice, Framebuffer, CELL_ASPECT};

/// Rows reserved at the top for the status line.
const STATUS_ROWS: u16 = 1;

/// Silences logging while the alternate screen is up, unless records go to a
/// file. Restores the previous level on drop.
pub struct QuietStderr {
    previous: log::LevelFilter,
}

impl QuietStderr {
    pub fn new(logs_to_file: bool) -> Self {
        let previous = log::max_level();
        if !logs_to_file {
            log::set_max_level(log::LevelFilter::Off);
        }
        Self { previous }
    }
}

impl Drop for QuietStderr {
    fn drop(&mut self) {
        log::set_max_level(self.previous);
    }
}

/// Main application struct for the terminal demo
pub struct TerminalApp {
    frame_loop: FrameLoop<AsciiDevice>,
    running: bool,
    target_frame_time: Duration,
    last_sample: Instant,
    frames_since_sample: u32,
    fps: f32,
    logs_to_file: bool,
}

impl TerminalApp {
    /// `size` is the terminal size in cells (columns, rows).
    pub fn new(
        config: SceneConfig,
        sun: Option<&TextureImage>,
        size: (u16, u16),
        fps: u32,
    ) -> Result<Self, RenderError> {
        let (cols, rows) = size;
        let device = AsciiDevice::new(cols as usize, rows.saturating_sub(STATUS_ROWS) as usize);
        let renderer = FrameRenderer::new(device, config, sun)?;

        Ok(Self {
            frame_loop: FrameLoop::new(renderer),
            running: true,
            target_frame_time: Duration::from_secs_f64(1.0 / f64::from(fps.max(1))),
            last_sample: Instant::now(),
            frames_since_sample: 0,
            fps: 0.0,
            logs_to_file: false,
        })
    }

    /// Keep logging enabled during `run`. Only set this when the logger
    /// writes somewhere other than the terminal.
    pub fn set_logs_to_file(&mut self, logs_to_file: bool) {
        self.logs_to_file = logs_to_file;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn scene(&self) -> &SceneState {
        self.frame_loop.scene()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_loop.frame_count()
    }

    pub fn device(&self) -> &AsciiDevice {
        self.frame_loop.renderer().device()
    }

    /// Enter raw mode on the alternate screen, run until quit, and restore
    /// the terminal whether or not the loop failed.
    pub fn run(&mut self) -> io::Result<()> {
        let _quiet = QuietStderr::new(self.logs_to_file);
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let mut out = stdout();

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::ZERO)? {
                self.handle_event(event::read()?);
            }
            if !self.running {
                break;
            }

            self.frame_loop.step();
            self.present(&mut out)?;

            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }

            self.frames_since_sample += 1;
            let now = Instant::now();
            if (now - self.last_sample).as_secs() >= 1 {
                self.fps = self.frames_since_sample as f32 / (now - self.last_sample).as_secs_f32();
                self.frames_since_sample = 0;
                self.last_sample = now;
            }
        }

        Ok(())
    }

    /// Apply one terminal event to the scene or the device.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => match map_key(key) {
                Some(Action::Scene(scene_event)) => self.frame_loop.handle_event(scene_event),
                Some(Action::Quit) => {
                    log::info!("Quit requested");
                    self.running = false;
                }
                None => {}
            },
            Event::Resize(cols, rows) => {
                let rows = rows.saturating_sub(STATUS_ROWS);
                self.frame_loop
                    .renderer_mut()
                    .device_mut()
                    .resize(cols as usize, rows as usize);
            }
            _ => {}
        }
    }

    fn status_line(&self) -> String {
        let scene = self.frame_loop.scene();
        format!(
            "Sunorbit | FPS: {:.1} | light: {} | material: {} | Left/Right=Orbit L=Light M=Material Q=Quit",
            self.fps,
            if scene.light_enabled() { "on" } else { "off" },
            if scene.use_alternate_material() { "alternate" } else { "base" },
        )
    }

    fn present<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.device().framebuffer().present(out, STATUS_ROWS)?;

        queue!(
            out,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(self.status_line()),
            ResetColor
        )?;

        out.flush()
    }
}
