use tiltshift::{FilterError, Renderer, WeightFunction};

use crate::expectations::PixelExpectation;

pub const CANVAS_WIDTH: u32 = 160;
pub const CANVAS_HEIGHT: u32 = 120;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

/// One pixel wide columns, white on even x and black on odd x. Any horizontal
/// blur turns them gray, so sharp and blurred regions are easy to tell apart.
pub fn vertical_stripes(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for _y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(if x % 2 == 0 { &WHITE } else { &BLACK });
        }
    }
    pixels
}

pub fn checkerboard(width: u32, height: u32, cell: u32) -> Vec<u8> {
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let white = (x / cell + y / cell) % 2 == 0;
            pixels.extend_from_slice(if white { &WHITE } else { &BLACK });
        }
    }
    pixels
}

/// Loads stripes at canvas size, focuses on the canvas center and returns the
/// expectations for the rendered output: untouched stripes around the focus,
/// gray in the corners.
pub fn build_focus_scene<W: WeightFunction>(
    renderer: &mut Renderer<W>,
) -> Result<Vec<PixelExpectation>, FilterError> {
    renderer.resize(CANVAS_WIDTH, CANVAS_HEIGHT)?;
    renderer.load_source_rgba(
        (CANVAS_WIDTH, CANVAS_HEIGHT),
        &vertical_stripes(CANVAS_WIDTH, CANVAS_HEIGHT),
    )?;

    let handle = renderer.handle();
    handle.set_blur_size(1.0)?;
    handle.focus(CANVAS_WIDTH as f32 / 2.0, CANVAS_HEIGHT as f32 / 2.0)?;

    let center_x = CANVAS_WIDTH / 2;
    let center_y = CANVAS_HEIGHT / 2;

    Ok(vec![
        PixelExpectation::gray(center_x, center_y, 255, "focus_white_column"),
        PixelExpectation::gray(center_x + 1, center_y, 0, "focus_black_column"),
        PixelExpectation::gray(center_x - 4, center_y + 3, 255, "focus_zone_white"),
        PixelExpectation::gray(center_x + 5, center_y - 3, 0, "focus_zone_black"),
        PixelExpectation::gray(2, 2, 128, "top_left_blurred").with_tolerance(90),
        PixelExpectation::gray(CANVAS_WIDTH - 3, 2, 128, "top_right_blurred").with_tolerance(90),
        PixelExpectation::gray(2, CANVAS_HEIGHT - 3, 128, "bottom_left_blurred")
            .with_tolerance(90),
        PixelExpectation::gray(CANVAS_WIDTH - 3, CANVAS_HEIGHT - 3, 128, "bottom_right_blurred")
            .with_tolerance(90),
    ])
}
