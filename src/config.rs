//! Configuration types for image export.

use crate::error::{Error, Result};

/// Configuration for rasterizing a figure.
///
/// The defaults are the fixed export settings used for every chart:
/// 1200 x 800 logical pixels at scale 2, on a white background.
///
/// ```rust
/// use chart2png::Config;
///
/// let config = Config::new()
///     .width(1200)
///     .height(800)
///     .scale(2.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Width of the figure in logical pixels.
    pub width: u32,

    /// Height of the figure in logical pixels.
    pub height: u32,

    /// Scale factor applied when rasterizing; the PNG is
    /// `width * scale` by `height * scale` pixels.
    pub scale: f32,

    /// Page background color as RGBA (default: white).
    pub background: [u8; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            scale: 2.0,
            background: [255, 255, 255, 255], // White
        }
    }
}

impl Config {
    /// Smallest accepted width or height.
    pub const MIN_DIMENSION: u32 = 1;

    /// Largest accepted width or height, before scaling.
    pub const MAX_DIMENSION: u32 = 16384;

    /// Create a new configuration with default values.
    ///
    /// Defaults:
    /// - Width: 1200px
    /// - Height: 800px
    /// - Scale: 2.0
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the figure width in pixels.
    ///
    /// ```rust
    /// use chart2png::Config;
    ///
    /// let config = Config::new().width(1920);
    /// assert_eq!(config.width, 1920);
    /// ```
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Set the figure height in pixels.
    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Set both width and height at once.
    ///
    /// ```rust
    /// use chart2png::Config;
    ///
    /// let config = Config::new().size(640, 480);
    /// assert_eq!(config.width, 640);
    /// assert_eq!(config.height, 480);
    /// ```
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the scale factor for rasterizing.
    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the background color as RGBA values.
    pub fn background(mut self, rgba: [u8; 4]) -> Self {
        self.background = rgba;
        self
    }

    /// Set a transparent background.
    ///
    /// Shorthand for `.background([0, 0, 0, 0])`.
    pub fn transparent(self) -> Self {
        self.background([0, 0, 0, 0])
    }

    /// Pixel dimensions of the encoded image.
    pub fn pixel_size(&self) -> (u32, u32) {
        let scale = self.scale as f64;
        (
            (self.width as f64 * scale) as u32,
            (self.height as f64 * scale) as u32,
        )
    }

    /// Check that the configuration can be rendered.
    pub fn validate(&self) -> Result<()> {
        if self.width < Self::MIN_DIMENSION || self.width > Self::MAX_DIMENSION {
            return Err(Error::InvalidConfig(format!(
                "width must be between {} and {}, got {}",
                Self::MIN_DIMENSION,
                Self::MAX_DIMENSION,
                self.width
            )));
        }
        if self.height < Self::MIN_DIMENSION || self.height > Self::MAX_DIMENSION {
            return Err(Error::InvalidConfig(format!(
                "height must be between {} and {}, got {}",
                Self::MIN_DIMENSION,
                Self::MAX_DIMENSION,
                self.height
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "scale must be a positive finite number, got {}",
                self.scale
            )));
        }
        let (w, h) = self.pixel_size();
        if w == 0 || h == 0 {
            return Err(Error::InvalidConfig(format!(
                "scale {} shrinks the image to nothing",
                self.scale
            )));
        }
        Ok(())
    }

    /// CSS color for the page background.
    pub(crate) fn background_css(&self) -> String {
        let [r, g, b, a] = self.background;
        format!("rgba({r}, {g}, {b}, {:.3})", a as f32 / 255.0)
    }
}
