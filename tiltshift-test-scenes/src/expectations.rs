/// Expected RGBA value of one output pixel.
pub struct PixelExpectation {
    pub x: u32,
    pub y: u32,
    pub rgba: [u8; 4],
    /// Allowed absolute difference per channel.
    pub tolerance: u8,
    pub label: &'static str,
}

impl PixelExpectation {
    pub fn rgba(x: u32, y: u32, rgba: [u8; 4], label: &'static str) -> Self {
        Self {
            x,
            y,
            rgba,
            tolerance: 2,
            label,
        }
    }

    /// Opaque gray, the only color the stripe and checker scenes produce.
    pub fn gray(x: u32, y: u32, level: u8, label: &'static str) -> Self {
        Self::rgba(x, y, [level, level, level, 255], label)
    }

    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn matches(&self, actual: [u8; 4]) -> bool {
        self.rgba
            .iter()
            .zip(actual)
            .all(|(&expected, actual)| expected.abs_diff(actual) <= self.tolerance)
    }
}

fn pixel_at(pixels: &[u8], width: u32, height: u32, x: u32, y: u32) -> Option<[u8; 4]> {
    if x >= width || y >= height {
        return None;
    }
    let offset = (y as usize * width as usize + x as usize) * 4;
    let bytes = pixels.get(offset..offset + 4)?;
    Some([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Checks `expectations` against tightly packed RGBA8 rows, as returned by
/// `Renderer::render_to_buffer` with an `Rgba8Unorm` output. Returns one
/// message per failed expectation.
pub fn check_pixels(
    pixels: &[u8],
    width: u32,
    height: u32,
    expectations: &[PixelExpectation],
) -> Vec<String> {
    expectations
        .iter()
        .filter_map(|expectation| {
            let (x, y, label) = (expectation.x, expectation.y, expectation.label);
            match pixel_at(pixels, width, height, x, y) {
                None => Some(format!(
                    "[{label}] ({x},{y}) lies outside the {width}x{height} buffer of {} bytes",
                    pixels.len()
                )),
                Some(actual) if !expectation.matches(actual) => Some(format!(
                    "[{label}] ({x},{y}) expected {:?} ±{} but got {actual:?}",
                    expectation.rgba, expectation.tolerance
                )),
                Some(_) => None,
            }
        })
        .collect()
}
