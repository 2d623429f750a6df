mod pixel_buffer;
#[cfg(feature = "viewer")]
mod window;

pub use pixel_buffer::PixelBuffer;
#[cfg(feature = "viewer")]
pub use window::{Display, InputEvent, RenderTarget};

/// Default surface size
pub const DEFAULT_WIDTH: u32 = 550;
pub const DEFAULT_HEIGHT: u32 = 400;
