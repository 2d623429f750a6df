use crate::gradient::Rgb;

// ============================================================================
// Utility Functions
// ============================================================================

/// Alpha blend a single color channel
/// Uses fast approximation: (x + 1 + (x >> 8)) >> 8 instead of x / 255
#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u16) -> u8 {
    let result = src as u16 * alpha + dst as u16 * (255 - alpha);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

/// Write an opaque RGBA pixel to slice
#[inline]
fn write_pixel(dest: &mut [u8], color: Rgb) {
    dest[0] = color[0];
    dest[1] = color[1];
    dest[2] = color[2];
    dest[3] = 255;
}

/// Segments used to flatten one quadratic Bezier
const BEZIER_STEPS: u32 = 8;

// ============================================================================
// PixelBuffer
// ============================================================================

/// Row-major RGBA pixel buffer, 4 bytes per pixel, alpha always 255
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create an opaque black pixel buffer with custom resolution
    pub fn with_size(width: u32, height: u32) -> Self {
        let mut buffer = Self {
            pixels: vec![0; width as usize * height as usize * 4],
            width,
            height,
        };
        buffer.clear([0, 0, 0]);
        buffer
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Calculate byte offset for pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Clear to a solid opaque color
    pub fn clear(&mut self, color: Rgb) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            write_pixel(chunk, color);
        }
    }

    /// Set a single pixel (bounds checked)
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            write_pixel(&mut self.pixels[idx..idx + 4], color);
        }
    }

    /// Set pixel with alpha blending; the result stays opaque
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgb, a: u8) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            let alpha = a as u16;
            self.pixels[idx] = blend_channel(color[0], self.pixels[idx], alpha);
            self.pixels[idx + 1] = blend_channel(color[1], self.pixels[idx + 1], alpha);
            self.pixels[idx + 2] = blend_channel(color[2], self.pixels[idx + 2], alpha);
            self.pixels[idx + 3] = 255;
        }
    }

    /// Read a pixel from the buffer (bounds checked)
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some([self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]])
        } else {
            None
        }
    }

    /// Anti-aliased line using Xiaolin Wu's algorithm.
    /// Accepts f32 endpoints for subpixel precision.
    pub fn line_aa(&mut self, mut x0: f32, mut y0: f32, mut x1: f32, mut y1: f32, color: Rgb) {
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let dy = y1 - y0;
        let gradient = if dx.abs() < 0.001 { 1.0 } else { dy / dx };

        // Plot with axes swapped back for steep lines
        let plot = |buf: &mut Self, x: i32, y: i32, coverage: f32| {
            let a = (coverage.clamp(0.0, 1.0) * 255.0) as u8;
            if steep {
                buf.blend_pixel(y, x, color, a);
            } else {
                buf.blend_pixel(x, y, color, a);
            }
        };

        // First endpoint
        let xend = x0.round();
        let yend = y0 + gradient * (xend - x0);
        let xgap = 1.0 - (x0 + 0.5).fract();
        let xpxl1 = xend as i32;
        let ypxl1 = yend.floor() as i32;
        let fpart = yend.fract();
        plot(self, xpxl1, ypxl1, (1.0 - fpart) * xgap);
        plot(self, xpxl1, ypxl1 + 1, fpart * xgap);
        let mut intery = yend + gradient;

        // Second endpoint
        let xend = x1.round();
        let yend = y1 + gradient * (xend - x1);
        let xgap = (x1 + 0.5).fract();
        let xpxl2 = xend as i32;
        let ypxl2 = yend.floor() as i32;
        let fpart = yend.fract();
        plot(self, xpxl2, ypxl2, (1.0 - fpart) * xgap);
        plot(self, xpxl2, ypxl2 + 1, fpart * xgap);

        // Main line body
        for x in (xpxl1 + 1)..xpxl2 {
            let fpart = intery.fract();
            let ipart = intery.floor() as i32;
            plot(self, x, ipart, 1.0 - fpart);
            plot(self, x, ipart + 1, fpart);
            intery += gradient;
        }
    }

    /// Anti-aliased quadratic Bezier from `p0` through control `c` to `p1`,
    /// flattened into short Wu lines
    pub fn quad_bezier_aa(&mut self, p0: (f32, f32), c: (f32, f32), p1: (f32, f32), color: Rgb) {
        let mut prev = p0;
        for i in 1..=BEZIER_STEPS {
            let t = i as f32 / BEZIER_STEPS as f32;
            let u = 1.0 - t;
            let next = (
                u * u * p0.0 + 2.0 * u * t * c.0 + t * t * p1.0,
                u * u * p0.1 + 2.0 * u * t * c.1 + t * t * p1.1,
            );
            self.line_aa(prev.0, prev.1, next.0, next.1, color);
            prev = next;
        }
    }

    /// Copy contents from another buffer (must be same size)
    pub fn copy_from(&mut self, src: &PixelBuffer) {
        if self.pixels.len() == src.pixels.len() {
            self.pixels.copy_from_slice(&src.pixels);
        }
    }

    /// Raw RGBA bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_opaque_black() {
        let buf = PixelBuffer::with_size(3, 2);
        assert_eq!(buf.as_bytes().len(), 3 * 2 * 4);
        for px in buf.as_bytes().chunks_exact(4) {
            assert_eq!(px, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn test_rgba_byte_order() {
        let mut buf = PixelBuffer::with_size(4, 4);
        buf.set_pixel(2, 1, [10, 20, 30]);
        let idx = (4 + 2) * 4;
        assert_eq!(&buf.as_bytes()[idx..idx + 4], &[10, 20, 30, 255]);
        assert_eq!(buf.get_pixel(2, 1), Some([10, 20, 30]));
        assert_eq!(buf.get_pixel(4, 1), None);
    }

    #[test]
    fn test_out_of_bounds_writes_ignored() {
        let mut buf = PixelBuffer::with_size(4, 4);
        let before = buf.clone();
        buf.set_pixel(-1, 0, [255, 255, 255]);
        buf.set_pixel(0, 4, [255, 255, 255]);
        buf.blend_pixel(9, 9, [255, 255, 255], 128);
        assert_eq!(buf, before);
    }

    #[test]
    fn test_blend_keeps_alpha_opaque() {
        let mut buf = PixelBuffer::with_size(1, 1);
        buf.blend_pixel(0, 0, [200, 200, 200], 128);
        let px = buf.as_bytes();
        assert!(px[0] > 90 && px[0] < 110);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn test_quad_bezier_touches_endpoints() {
        let mut buf = PixelBuffer::with_size(20, 20);
        buf.quad_bezier_aa((2.0, 10.0), (10.0, 2.0), (18.0, 10.0), [255, 255, 255]);
        assert_ne!(buf.get_pixel(2, 10), Some([0, 0, 0]));
        assert_ne!(buf.get_pixel(18, 10), Some([0, 0, 0]));
    }

    #[test]
    fn test_copy_from_restores() {
        let base = PixelBuffer::with_size(5, 5);
        let mut buf = base.clone();
        buf.set_pixel(1, 3, [1, 2, 3]);
        buf.quad_bezier_aa((0.0, 0.0), (2.0, 4.0), (4.0, 4.0), [250, 250, 250]);
        assert_ne!(buf, base);
        buf.copy_from(&base);
        assert_eq!(buf, base);
    }
}
