use std::collections::HashSet;
use std::time::Instant;
use winit::keyboard::NamedKey;
use winit::window::Window;

use folio::config::{MAX_SCALE, MIN_SCALE, ViewMode};
use folio::resample::Interpolation;
use folio::view::{ViewController, ViewEvent};

use crate::ui::render::{BG_COLOR, blit_argb, rgb};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const SCALE_STEP: f64 = 1.25;

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

pub struct ViewerState {
    pub view: ViewController,

    pub offset_x: f32,
    pub offset_y: f32,
    pub dragging: bool,
    pub drag_start: (f64, f64),
    pub drag_offset_start: (f32, f32),
    pub mouse_pos: (f64, f64),

    /// When the next slideshow tick is due.
    pub next_tick: Option<Instant>,

    // Track keys that were just pressed this frame
    pub keys_pressed: HashSet<NamedKey>,
    pub chars_pressed: HashSet<char>,
}

impl ViewerState {
    pub fn new(view: ViewController) -> Self {
        let next_tick = view
            .is_playing_slideshow()
            .then(|| Instant::now() + view.slideshow_interval());
        Self {
            view,
            offset_x: 0.0,
            offset_y: 0.0,
            dragging: false,
            drag_start: (0.0, 0.0),
            drag_offset_start: (0.0, 0.0),
            mouse_pos: (0.0, 0.0),
            next_tick,
            keys_pressed: HashSet::new(),
            chars_pressed: HashSet::new(),
        }
    }

    pub fn is_key_pressed_named(&self, k: NamedKey) -> bool {
        self.keys_pressed.contains(&k)
    }

    pub fn is_char_pressed(&self, c: char) -> bool {
        self.chars_pressed.contains(&c)
    }

    /// Panning only makes sense when the page is not fitted to the window.
    pub fn can_pan(&self) -> bool {
        matches!(
            self.view.state().view_mode,
            ViewMode::FullSize | ViewMode::CustomScale
        )
    }

    /// Run the slideshow timer. Returns true when the page changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_tick else {
            return false;
        };
        if now < due {
            return false;
        }
        self.view.slideshow_tick();
        self.next_tick = self
            .view
            .is_playing_slideshow()
            .then(|| now + self.view.slideshow_interval());
        self.reset_pan();
        true
    }

    fn reset_pan(&mut self) {
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }

    /// Apply the keys pressed since the last frame.
    /// Returns true if the app should quit.
    pub fn update(&mut self, window: &Window) -> bool {
        // ------------------------------------------------------------------
        // Quit
        // ------------------------------------------------------------------
        if self.is_key_pressed_named(NamedKey::Escape) || self.is_char_pressed('q') {
            return true;
        }

        // ------------------------------------------------------------------
        // Navigation
        // ------------------------------------------------------------------
        let fwd = self.is_key_pressed_named(NamedKey::ArrowRight)
            || self.is_key_pressed_named(NamedKey::Space)
            || self.is_char_pressed('l');
        let bwd = self.is_key_pressed_named(NamedKey::ArrowLeft) || self.is_char_pressed('h');
        if fwd {
            self.view.next();
            self.reset_pan();
        } else if bwd {
            self.view.previous();
            self.reset_pan();
        }

        // ------------------------------------------------------------------
        // Layout
        // ------------------------------------------------------------------
        if self.is_char_pressed('s') {
            let spread = !self.view.state().spread;
            self.view.set_spread(spread);
            self.reset_pan();
        }
        if self.is_char_pressed('b') {
            let right = !self.view.state().right_binding;
            self.view.set_right_binding(right);
        }

        // ------------------------------------------------------------------
        // View mode and custom scale
        // ------------------------------------------------------------------
        let mode = [
            ('1', ViewMode::FullSize),
            ('2', ViewMode::FitWindow),
            ('3', ViewMode::FitImage),
            ('4', ViewMode::CustomScale),
        ]
        .into_iter()
        .find(|(c, _)| self.is_char_pressed(*c))
        .map(|(_, m)| m);
        if let Some(mode) = mode {
            self.set_view_mode(mode, None);
        }

        let step = if self.is_char_pressed('+') || self.is_char_pressed('=') {
            Some(SCALE_STEP)
        } else if self.is_char_pressed('-') {
            Some(1.0 / SCALE_STEP)
        } else {
            None
        };
        if let Some(step) = step {
            let scale = (self.view.effective_scale() * step).clamp(MIN_SCALE, MAX_SCALE);
            self.set_view_mode(ViewMode::CustomScale, Some(scale));
        }

        // ------------------------------------------------------------------
        // Interpolation
        // ------------------------------------------------------------------
        for (c, mode) in [
            ('n', Interpolation::Nearest),
            ('i', Interpolation::Bilinear),
            ('c', Interpolation::Bicubic),
        ] {
            if self.is_char_pressed(c) {
                self.view.set_interpolation(mode);
            }
        }

        // ------------------------------------------------------------------
        // Slideshow
        // ------------------------------------------------------------------
        if self.is_char_pressed('p') {
            if self.view.is_playing_slideshow() {
                self.view.stop_slideshow();
            } else {
                self.view.start_slideshow();
            }
        }

        // ------------------------------------------------------------------
        // Playlist edits
        // ------------------------------------------------------------------
        if self.is_key_pressed_named(NamedKey::Delete) {
            let rows: Vec<usize> = (0..self.view.display_count())
                .filter_map(|i| self.view.current_index(i))
                .collect();
            self.view.remove(&rows);
            self.reset_pan();
        }
        if self.is_char_pressed('x') {
            self.view.clear();
        }

        // Clear per-frame input state
        self.keys_pressed.clear();
        self.chars_pressed.clear();

        self.drain_events(window);
        false
    }

    fn set_view_mode(&mut self, mode: ViewMode, scale: Option<f64>) {
        if let Err(e) = self.view.set_view_mode(mode, scale) {
            log::warn!("{}", e);
        }
        self.reset_pan();
    }

    /// Handle controller notifications: keep the slideshow timer in step
    /// and refresh the title.
    pub fn drain_events(&mut self, window: &Window) {
        let events: Vec<ViewEvent> = self.view.events().try_iter().collect();
        if events.contains(&ViewEvent::SlideshowStopped) {
            self.next_tick = None;
        }
        if self.view.is_playing_slideshow() && self.next_tick.is_none() {
            self.next_tick = Some(Instant::now() + self.view.slideshow_interval());
        }
        if events.contains(&ViewEvent::Changed) {
            window.set_title(&self.title());
        }
    }

    pub fn title(&self) -> String {
        let len = self.view.playlist().len();
        let Some(first) = self.view.current_index(0) else {
            return "folio".to_string();
        };
        let names = self.view.current_file_names().join(" | ");
        let slideshow = if self.view.is_playing_slideshow() {
            " [slideshow]"
        } else {
            ""
        };
        format!(
            "folio [{}/{}] {} ({:.0}%){}",
            first + 1,
            len,
            names,
            self.view.effective_scale() * 100.0,
            slideshow
        )
    }

    pub fn drag_to(&mut self, x: f64, y: f64) {
        self.mouse_pos = (x, y);
        if self.dragging && self.can_pan() {
            self.offset_x = self.drag_offset_start.0 + (x - self.drag_start.0) as f32;
            self.offset_y = self.drag_offset_start.1 + (y - self.drag_start.1) as f32;
        }
    }

    /// Render into the softbuffer framebuffer (u32 per pixel, 0x00RRGGBB).
    pub fn render(&self, frame: &mut [u32], fb_w: u32, fb_h: u32) {
        let bg = rgb(BG_COLOR[0], BG_COLOR[1], BG_COLOR[2]);
        frame.fill(bg);

        let img = self.view.scaled_image();
        if img.is_empty() {
            return;
        }

        // Centre pages smaller than the window; anchor larger ones top-left
        // so the first page is visible, then apply the pan offset.
        let x0 = if img.width < fb_w {
            (fb_w - img.width) as f32 / 2.0
        } else {
            self.offset_x.min(0.0).max(fb_w as f32 - img.width as f32)
        };
        let y0 = if img.height < fb_h {
            (fb_h - img.height) as f32 / 2.0
        } else {
            self.offset_y.min(0.0).max(fb_h as f32 - img.height as f32)
        };

        blit_argb(frame, fb_w, fb_h, img, x0 as i32, y0 as i32);
    }
}
