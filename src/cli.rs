use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use folio::config::{ViewMode, ViewerConfig};
use folio::resample::Interpolation;

pub const HELP_KEYS: &str = "\
Key Bindings:
  Esc / q       : Quit
  Left / h      : Previous page
  Right / l     : Next page
  Space         : Next page
  s             : Toggle spread (two pages)
  b             : Toggle right binding
  1 / 2 / 3 / 4 : Full size / Fit window / Fit width / Custom scale
  n / i / c     : Nearest / Bilinear / Bicubic interpolation
  + / -         : Custom scale up / down
  p             : Start / stop slideshow
  Delete        : Remove shown images from the playlist
  x             : Clear the playlist
  Drag          : Pan (full size and custom scale)
";

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Full,
    FitWindow,
    FitWidth,
    Custom,
}

impl From<ModeArg> for ViewMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Full => ViewMode::FullSize,
            ModeArg::FitWindow => ViewMode::FitWindow,
            ModeArg::FitWidth => ViewMode::FitImage,
            ModeArg::Custom => ViewMode::CustomScale,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum InterpolationArg {
    Nearest,
    Bilinear,
    Bicubic,
}

impl From<InterpolationArg> for Interpolation {
    fn from(i: InterpolationArg) -> Self {
        match i {
            InterpolationArg::Nearest => Interpolation::Nearest,
            InterpolationArg::Bilinear => Interpolation::Bilinear,
            InterpolationArg::Bicubic => Interpolation::Bicubic,
        }
    }
}

#[derive(Parser)]
#[command(name = "folio", about = "An image and archive viewer", after_help = HELP_KEYS)]
pub struct Cli {
    /// Image files, archives (zip, tar, tar.gz) or directories to open
    pub paths: Vec<PathBuf>,

    /// How the page is scaled to the window
    #[arg(long, value_enum, default_value = "full")]
    pub view_mode: ModeArg,

    /// Scale factor for the custom view mode
    #[arg(long, default_value = "1.0")]
    pub scale: f64,

    /// Resampling kernel
    #[arg(long, value_enum, default_value = "bilinear")]
    pub interpolation: InterpolationArg,

    /// Show two pages side by side
    #[arg(short, long)]
    pub spread: bool,

    /// Put the first page of a spread on the right
    #[arg(short = 'b', long)]
    pub right_binding: bool,

    /// Directory recursion depth when opening folders (default: 30)
    #[arg(short, long, default_value = "30")]
    pub depth: u32,

    /// Number of encoded images kept in memory; 0 disables caching (default: 20)
    #[arg(short, long, default_value = "20")]
    pub cache: usize,

    /// Slideshow interval in milliseconds (default: 3000)
    #[arg(long, default_value = "3000")]
    pub interval: u64,

    /// Start the slideshow right away
    #[arg(long)]
    pub slideshow: bool,
}

impl Cli {
    pub fn to_config(&self) -> ViewerConfig {
        ViewerConfig {
            view_mode: self.view_mode.into(),
            custom_scale: self.scale,
            interpolation: self.interpolation.into(),
            spread: self.spread,
            right_binding: self.right_binding,
            open_dir_depth: self.depth,
            cache_capacity: self.cache,
            slideshow_interval_ms: self.interval,
        }
    }
}
