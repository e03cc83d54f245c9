use std::time::Duration;

use crate::error::{Result, ViewerError};
use crate::resample::Interpolation;

/// Smallest accepted custom scale factor.
pub const MIN_SCALE: f64 = 0.01;
/// Largest accepted custom scale factor.
pub const MAX_SCALE: f64 = 32.0;

/// Checks that `scale` is a usable custom scale factor.
pub fn check_scale(scale: f64) -> Result<()> {
    if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
        return Err(ViewerError::InvalidConfig(format!(
            "scale must be between {MIN_SCALE} and {MAX_SCALE}, got {scale}"
        )));
    }
    Ok(())
}

/// How the composite is scaled to the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// 1:1 pixels.
    #[default]
    FullSize,
    /// Shrink to fit both width and height; never enlarge.
    FitWindow,
    /// Shrink to fit the width only; never enlarge.
    FitImage,
    /// Use the user-provided factor.
    CustomScale,
}

/// Every recognized viewer option, with the viewer's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub view_mode: ViewMode,
    pub custom_scale: f64,
    pub interpolation: Interpolation,
    pub spread: bool,
    pub right_binding: bool,
    pub open_dir_depth: u32,
    pub cache_capacity: usize,
    pub slideshow_interval_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::FullSize,
            custom_scale: 1.0,
            interpolation: Interpolation::Bilinear,
            spread: false,
            right_binding: false,
            open_dir_depth: 30,
            cache_capacity: 20,
            slideshow_interval_ms: 3000,
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        check_scale(self.custom_scale)?;
        if self.slideshow_interval_ms == 0 {
            return Err(ViewerError::InvalidConfig(
                "slideshow_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn slideshow_interval(&self) -> Duration {
        Duration::from_millis(self.slideshow_interval_ms)
    }
}
