//! Styled rendering of a finished symbol.
//!
//! The matrix is first traced into a list of vector primitives, one per dark module,
//! and the raster image is painted from that same list. An optional logo is resized
//! once and composited over the centre of the raster; the vector output carries the
//! same bitmap and placement so an SVG export lines up with the PNG.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::Deserialize;

use crate::error::{EncodeError, Result};
use crate::matrix::{Module, Role};
use crate::qrcode::QrCode;

/// Light modules around the symbol on every side.
pub const QUIET_ZONE: i32 = 4;

/// Smallest logo edge, as a fraction of the image edge. Smaller requests are raised.
pub const MIN_LOGO_FRACTION: f32 = 0.10;

/// Largest logo edge, as a fraction of the image edge.
pub const MAX_LOGO_FRACTION: f32 = 0.40;

/// Largest accepted pixels per module. A version 40 symbol is then 5920 px wide.
pub const MAX_MODULE_SIZE: u32 = 32;

/// Foregrounds at or above this luma are hard to tell apart from the white background.
const MAX_FOREGROUND_LUMA: u32 = 200;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// How a single dark module is drawn.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Deserialize)]
#[serde(from = "String")]
pub enum Shape {
    #[default]
    Square,
    /// A circle inscribed in the module cell.
    Circle,
    /// A square with corners rounded to a quarter of the module edge.
    Rounded,
}

impl Shape {
    /// Parses a shape name. Unknown names fall back to [`Shape::Square`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "circle" => Shape::Circle,
            "rounded" => Shape::Rounded,
            _ => Shape::Square,
        }
    }
}

impl From<String> for Shape {
    fn from(name: String) -> Self {
        Shape::parse(&name)
    }
}

/// An opaque RGB foreground color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Deserialize)]
#[serde(try_from = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);

    /// Parses `#rgb` or `#rrggbb`, with or without the leading `#`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || EncodeError::InvalidColor(hex.to_string());
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match digits.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (i, c) in rgb.iter_mut().enumerate() {
                    *c = channel(&digits[i..i + 1])? * 0x11;
                }
                Ok(Color(rgb))
            }
            6 => Ok(Color([
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            ])),
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// Perceived brightness, 0 (black) to 255 (white).
    pub fn luma(self) -> u8 {
        let [r, g, b] = self.0.map(u32::from);
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }

    /// Whether the color is dark enough to read against the white background.
    pub fn contrasts(self) -> bool {
        u32::from(self.luma()) < MAX_FOREGROUND_LUMA
    }

    fn rgba(self) -> Rgba<u8> {
        let [r, g, b] = self.0;
        Rgba([r, g, b, 255])
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl TryFrom<String> for Color {
    type Error = EncodeError;

    fn try_from(hex: String) -> Result<Self> {
        Color::from_hex(&hex)
    }
}

/// Visual options for [`render`].
///
/// Deserializes from a request body with every field optional:
///
/// ```rust
/// use vcardqr::render::{RenderStyle, Shape};
///
/// let style: RenderStyle = serde_json::from_str(r##"{"dot_shape": "circle", "foreground_color": "#1a237e"}"##).unwrap();
/// assert_eq!(style.dot_shape, Shape::Circle);
/// assert_eq!(style.marker_shape, Shape::Square);
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    /// Shape of the modules in the three finder patterns.
    pub marker_shape: Shape,
    /// Shape of every other dark module.
    pub dot_shape: Shape,
    /// Any color is accepted; light ones that barely contrast with the white
    /// background are logged as a warning.
    pub foreground_color: Color,
    /// Decoded logo, composited over the centre after the modules are drawn.
    #[serde(skip)]
    pub logo_bitmap: Option<RgbaImage>,
    /// Logo edge as a fraction of the image edge, within
    /// [`MIN_LOGO_FRACTION`]..=[`MAX_LOGO_FRACTION`].
    pub logo_size_fraction: f32,
    /// Pixels per module, at most [`MAX_MODULE_SIZE`]. Zero is treated as one.
    pub module_size: u32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            marker_shape: Shape::Square,
            dot_shape: Shape::Square,
            foreground_color: Color::BLACK,
            logo_bitmap: None,
            logo_size_fraction: 0.30,
            module_size: 10,
        }
    }
}

impl RenderStyle {
    pub fn with_marker_shape(mut self, shape: Shape) -> Self {
        self.marker_shape = shape;
        self
    }

    pub fn with_dot_shape(mut self, shape: Shape) -> Self {
        self.dot_shape = shape;
        self
    }

    pub fn with_foreground_color(mut self, color: Color) -> Self {
        self.foreground_color = color;
        self
    }

    /// Sets the logo bitmap.
    ///
    /// The logo hides the modules underneath it. Decoding then relies on error
    /// correction, so pair a logo with [`QrCodeEcc::High`](crate::version::QrCodeEcc::High)
    /// or at least `Quartile`.
    pub fn with_logo(mut self, logo: RgbaImage) -> Self {
        self.logo_bitmap = Some(logo);
        self
    }

    pub fn with_logo_size_fraction(mut self, fraction: f32) -> Self {
        self.logo_size_fraction = fraction;
        self
    }

    pub fn with_module_size(mut self, pixels: u32) -> Self {
        self.module_size = pixels;
        self
    }

    /// Checks the module size and the logo fraction. Runs before any matrix work.
    pub fn validate(&self) -> Result<()> {
        if self.module_size > MAX_MODULE_SIZE {
            return Err(EncodeError::ModuleSizeTooLarge {
                size: self.module_size,
                max: MAX_MODULE_SIZE,
            });
        }
        if !self.foreground_color.contrasts() {
            log::warn!(
                "foreground {} may not contrast with the background",
                self.foreground_color.to_hex()
            );
        }
        if self.logo_size_fraction.is_nan() || self.logo_size_fraction > MAX_LOGO_FRACTION {
            return Err(EncodeError::LogoOversized {
                fraction: self.logo_size_fraction,
            });
        }
        Ok(())
    }

    /// The logo fraction actually used, raised to the minimum when below it.
    pub fn effective_logo_fraction(&self) -> f32 {
        if self.logo_size_fraction < MIN_LOGO_FRACTION {
            log::warn!(
                "logo fraction {} is below {}, using the minimum",
                self.logo_size_fraction,
                MIN_LOGO_FRACTION
            );
            MIN_LOGO_FRACTION
        } else {
            self.logo_size_fraction
        }
    }

    fn pixels_per_module(&self) -> u32 {
        self.module_size.max(1)
    }
}

/// Drawing class of a module.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ModuleClass {
    /// Part of one of the three finder patterns.
    Finder,
    /// Alignment, timing, format, version or the dark module.
    Pattern,
    Data,
}

impl ModuleClass {
    pub fn of(module: Module) -> Self {
        match module.role() {
            Some(Role::Finder) => ModuleClass::Finder,
            Some(_) => ModuleClass::Pattern,
            None => ModuleClass::Data,
        }
    }
}

/// A filled shape in image pixel coordinates.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Primitive {
    Rect { x: u32, y: u32, size: u32 },
    Circle { cx: f32, cy: f32, r: f32 },
    RoundedRect { x: u32, y: u32, size: u32, radius: f32 },
}

impl Primitive {
    /// The primitive for one module whose top-left pixel is `(x, y)`.
    pub fn module(shape: Shape, x: u32, y: u32, size: u32) -> Self {
        match shape {
            Shape::Square => Primitive::Rect { x, y, size },
            Shape::Circle => {
                let r = size as f32 / 2.0;
                Primitive::Circle {
                    cx: x as f32 + r,
                    cy: y as f32 + r,
                    r,
                }
            }
            Shape::Rounded => Primitive::RoundedRect {
                x,
                y,
                size,
                radius: size as f32 / 4.0,
            },
        }
    }

    /// Pixel box `[x0, x1) x [y0, y1)` that covers the primitive.
    fn bounds(&self) -> (u32, u32, u32, u32) {
        match *self {
            Primitive::Rect { x, y, size } | Primitive::RoundedRect { x, y, size, .. } => {
                (x, y, x + size, y + size)
            }
            Primitive::Circle { cx, cy, r } => (
                (cx - r).floor().max(0.0) as u32,
                (cy - r).floor().max(0.0) as u32,
                (cx + r).ceil() as u32,
                (cy + r).ceil() as u32,
            ),
        }
    }

    /// Whether the point `(px, py)` lies inside the shape.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        match *self {
            Primitive::Rect { x, y, size } => {
                let (x, y, size) = (x as f32, y as f32, size as f32);
                px >= x && px < x + size && py >= y && py < y + size
            }
            Primitive::Circle { cx, cy, r } => {
                let (dx, dy) = (px - cx, py - cy);
                dx * dx + dy * dy <= r * r
            }
            Primitive::RoundedRect { x, y, size, radius } => {
                let (x, y, size) = (x as f32, y as f32, size as f32);
                if px < x || px >= x + size || py < y || py >= y + size {
                    return false;
                }
                // Distance to the inner rectangle shrunk by the radius
                let dx = (px - px.clamp(x + radius, x + size - radius)).abs();
                let dy = (py - py.clamp(y + radius, y + size - radius)).abs();
                dx * dx + dy * dy <= radius * radius
            }
        }
    }
}

/// Where the logo sits in the image, with the bitmap already resized to `size`.
#[derive(Clone, Debug)]
pub struct LogoPlacement {
    pub x: u32,
    pub y: u32,
    pub size: u32,
    pub bitmap: RgbaImage,
}

/// Vector form of a rendered symbol, on a white background.
#[derive(Clone, Debug)]
pub struct VectorImage {
    /// Edge length in pixels, quiet zone included.
    pub dimension: u32,
    pub module_size: u32,
    pub color: Color,
    pub primitives: Vec<Primitive>,
    pub logo: Option<LogoPlacement>,
}

/// Renders `qr` with the given style into a raster image and the matching vector
/// primitives.
pub fn render(qr: &QrCode, style: &RenderStyle) -> Result<(RgbaImage, VectorImage)> {
    style.validate()?;
    let vector = trace(qr, style)?;
    let raster = rasterize(&vector);
    Ok((raster, vector))
}

/// Builds the primitive list for every dark module, plus the logo placement.
fn trace(qr: &QrCode, style: &RenderStyle) -> Result<VectorImage> {
    let ms = style.pixels_per_module();
    let dimension = ((qr.size() + QUIET_ZONE * 2) as u32)
        .checked_mul(ms)
        .filter(|_| ms <= MAX_MODULE_SIZE)
        .ok_or(EncodeError::ModuleSizeTooLarge {
            size: ms,
            max: MAX_MODULE_SIZE,
        })?;

    let mut primitives = Vec::new();
    for y in 0..qr.size() {
        for x in 0..qr.size() {
            let module = match qr.module(x, y) {
                Some(m) if m.is_dark() => m,
                _ => continue,
            };
            let shape = match ModuleClass::of(module) {
                ModuleClass::Finder => style.marker_shape,
                ModuleClass::Pattern | ModuleClass::Data => style.dot_shape,
            };
            let px = (x + QUIET_ZONE) as u32 * ms;
            let py = (y + QUIET_ZONE) as u32 * ms;
            primitives.push(Primitive::module(shape, px, py, ms));
        }
    }

    let logo = style
        .logo_bitmap
        .as_ref()
        .and_then(|bitmap| place_logo(bitmap, dimension, style.effective_logo_fraction()));

    Ok(VectorImage {
        dimension,
        module_size: ms,
        color: style.foreground_color,
        primitives,
        logo,
    })
}

/// Centres the logo, never larger than [`MAX_LOGO_FRACTION`] of the image edge and
/// never smaller than one pixel.
fn place_logo(bitmap: &RgbaImage, dimension: u32, fraction: f32) -> Option<LogoPlacement> {
    if bitmap.width() == 0 || bitmap.height() == 0 {
        log::warn!("ignoring empty logo bitmap");
        return None;
    }
    let ceiling = ((dimension as f32 * MAX_LOGO_FRACTION).floor() as u32).max(1);
    let size = ((dimension as f32 * fraction).round() as u32).clamp(1, ceiling);
    let offset = (dimension - size) / 2;
    log::debug!("logo {}px at ({}, {}) in a {}px image", size, offset, offset, dimension);
    Some(LogoPlacement {
        x: offset,
        y: offset,
        size,
        bitmap: imageops::resize(bitmap, size, size, FilterType::Lanczos3),
    })
}

/// Paints the vector image into pixels: a pixel is dark when its centre lies inside
/// a primitive. The logo is alpha-composited last.
fn rasterize(vector: &VectorImage) -> RgbaImage {
    let dim = vector.dimension;
    let fg = vector.color.rgba();
    let mut img = RgbaImage::from_pixel(dim, dim, BACKGROUND);

    for prim in &vector.primitives {
        let (x0, y0, x1, y1) = prim.bounds();
        for py in y0..y1.min(dim) {
            for px in x0..x1.min(dim) {
                if prim.contains(px as f32 + 0.5, py as f32 + 0.5) {
                    img.put_pixel(px, py, fg);
                }
            }
        }
    }

    if let Some(logo) = &vector.logo {
        imageops::overlay(&mut img, &logo.bitmap, i64::from(logo.x), i64::from(logo.y));
    }
    img
}
