use crate::error::Result;
use crate::qrcode::QrCode;
use crate::render::{Primitive, VectorImage};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/*---- Utilities ----*/

// Returns a string of SVG code for the given vector image, with
// the logo (if any) embedded as a base64 PNG data URI.
// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(vector: &VectorImage) -> Result<String> {
	let mut result = String::new();
	result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
	result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
	result += &format!(
		"<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" width=\"{0}\" height=\"{0}\" stroke=\"none\">\n",
		vector.dimension);
	result += "\t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n";

	let fill = vector.color.to_hex();
	let mut path = String::new();
	for prim in &vector.primitives {
		match *prim {
			Primitive::Rect { x, y, size } => {
				if !path.is_empty() {
					path += " ";
				}
				path += &format!("M{},{}h{2}v{2}h-{2}z", x, y, size);
			}
			Primitive::Circle { cx, cy, r } => {
				result += &format!("\t<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>\n", cx, cy, r, fill);
			}
			Primitive::RoundedRect { x, y, size, radius } => {
				result += &format!(
					"\t<rect x=\"{}\" y=\"{}\" width=\"{2}\" height=\"{2}\" rx=\"{3}\" ry=\"{3}\" fill=\"{4}\"/>\n",
					x, y, size, radius, fill);
			}
		}
	}
	if !path.is_empty() {
		result += &format!("\t<path d=\"{}\" fill=\"{}\"/>\n", path, fill);
	}

	if let Some(logo) = &vector.logo {
		let png = to_png_bytes(&logo.bitmap)?;
		result += &format!(
			"\t<image x=\"{}\" y=\"{}\" width=\"{2}\" height=\"{2}\" href=\"data:image/png;base64,{3}\"/>\n",
			logo.x, logo.y, logo.size, STANDARD.encode(png));
	}
	result += "</svg>\n";
	Ok(result)
}

/// Encodes an image as PNG into memory.
pub fn to_png_bytes(img: &RgbaImage) -> Result<Vec<u8>> {
	let mut buf = Cursor::new(Vec::new());
	img.write_to(&mut buf, ImageFormat::Png)?;
	Ok(buf.into_inner())
}

/// Returns the symbol as text, two characters per module, for a console preview.
pub fn to_ascii_string(qr: &QrCode, border: i32) -> String {
	assert!(border >= 0, "Border must be non-negative");
	let mut result = String::new();
	for y in -border .. qr.size() + border {
		for x in -border .. qr.size() + border {
			let c: char = if qr.get_module(x, y) { '█' } else { ' ' };
			result.push(c);
			result.push(c);
		}
		result.push('\n');
	}
	result
}

/// Saves a rendered image as a PNG file.
///
/// # Arguments
///
/// * `img` - The rendered image.
/// * `directory_path` - Optional. The directory path where the image will be saved. If not provided, the default directory is "generated".
/// * `filename` - Optional. The name of the image file. If not provided, a timestamp-based filename will be used.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the image cannot be written.
///
/// # Example
///
/// ```rust,no_run
/// use vcardqr::{encode, helper::save_png, render::RenderStyle, version::QrCodeEcc};
///
/// let card = b"BEGIN:VCARD\nVERSION:3.0\nN:Doe;Jane\nEND:VCARD\n";
/// let encoded = encode(card, QrCodeEcc::Medium, &RenderStyle::default()).unwrap();
/// let path = save_png(&encoded.raster, Some("images"), Some("contact")).unwrap();
/// assert!(path.ends_with("contact.png"));
/// ```
pub fn save_png(img: &RgbaImage, directory_path: Option<&str>, filename: Option<&str>) -> Result<PathBuf> {
	let directory_path = directory_path.unwrap_or("generated");
	let filename = match filename {
		Some(name) => name.trim_end_matches(".png").to_string(),
		None => {
			let millis = SystemTime::now()
				.duration_since(UNIX_EPOCH)
				.map(|d| d.as_millis())
				.unwrap_or_default();
			format!("qr_{}", millis)
		}
	};

	// Check if the directory exists, create it if it doesn't
	if !Path::new(directory_path).exists() {
		fs::create_dir_all(directory_path)?;
	}

	let file_path = Path::new(directory_path).join(format!("{}.png", filename));
	img.save_with_format(&file_path, ImageFormat::Png)?;
	log::debug!("saved {}x{} image to {}", img.width(), img.height(), file_path.display());
	Ok(file_path)
}
