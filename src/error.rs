/// Errors returned by the encoding and rendering pipeline.
///
/// Ways to handle the user-recoverable variants:
///
/// - `CapacityExceeded`: shorten the contact card or lower the error correction level.
/// - `InvalidColor`: reject the style before encoding and ask for another color.
/// - `LogoOversized`: shrink the logo fraction to at most 0.40.
/// - `ModuleSizeTooLarge`: ask for fewer pixels per module.
///
/// The remaining variants (see [`EncodeError::is_internal`]) mean the library itself
/// is broken. They abort the single request and never produce partial output.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The data does not fit into a version 40 symbol at the requested level.
    #[error("data length = {len} bytes, max capacity = {max} bytes")]
    CapacityExceeded { len: usize, max: usize },

    /// The foreground color is not a well-formed hex color.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A matrix write targeted a coordinate outside `[0, side)`.
    #[error("module ({x}, {y}) lies outside a {side}x{side} matrix")]
    OutOfBoundsPlacement { x: i32, y: i32, side: i32 },

    /// The requested logo edge exceeds the decodable ceiling.
    #[error("logo fraction {fraction} exceeds the maximum of 0.40")]
    LogoOversized { fraction: f32 },

    /// The requested pixels per module would make an unreasonably large image.
    #[error("module size {size} px exceeds the maximum of {max} px")]
    ModuleSizeTooLarge { size: u32, max: u32 },

    /// An arithmetic operation outside its domain, such as dividing by zero in GF(256).
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// The interleaved codeword stream does not fill the symbol exactly.
    #[error("codeword stream has {actual} codewords, symbol holds {expected}")]
    CodewordMismatch { expected: usize, actual: usize },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EncodeError {
    /// Returns `true` for invariant violations that indicate a defect in this crate
    /// rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::OutOfBoundsPlacement { .. }
                | Self::InvalidOperation(_)
                | Self::CodewordMismatch { .. }
        )
    }
}

pub type Result<T, E = EncodeError> = std::result::Result<T, E>;
