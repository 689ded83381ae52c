//! Blurs an image without a window and writes the result as a PNG.
//!
//! Usage: cargo run --example headless_png -- [input.png] [output.png]
//!
//! Without an input a checkerboard is generated. The focus sits a third of
//! the way down the image, like a tilt-shift photo of a street.

use futures::executor::block_on;
use image::{ImageReader, RgbaImage};
use tiltshift::{Renderer, RendererConfig};

const DEFAULT_SIZE: (u32, u32) = (640, 480);

fn checkerboard(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let level = if (x / 16 + y / 16) % 2 == 0 { 230 } else { 30 };
            pixels.extend_from_slice(&[level, level, level, 255]);
        }
    }
    pixels
}

pub fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = args.next();
    let output = args.next().unwrap_or_else(|| "tiltshift.png".to_owned());

    let (dimensions, pixels) = match input {
        Some(path) => {
            let decoded = ImageReader::open(&path)
                .expect("To open the input image")
                .with_guessed_format()
                .unwrap()
                .decode()
                .expect("To decode the input image")
                .to_rgba8();
            (decoded.dimensions(), decoded.into_raw())
        }
        None => (
            DEFAULT_SIZE,
            checkerboard(DEFAULT_SIZE.0, DEFAULT_SIZE.1),
        ),
    };

    let mut renderer: Renderer =
        block_on(Renderer::new_headless(dimensions, RendererConfig::default()));
    renderer.load_source_rgba(dimensions, &pixels).unwrap();

    let handle = renderer.handle();
    handle.set_blur_size(2.0).unwrap();
    handle
        .focus(dimensions.0 as f32 / 2.0, dimensions.1 as f32 / 3.0)
        .unwrap();

    let mut blurred = Vec::new();
    renderer.render_to_buffer(&mut blurred).unwrap();

    let image = RgbaImage::from_raw(dimensions.0, dimensions.1, blurred)
        .expect("Readback matches the output size");
    image.save(&output).expect("To write the output image");
    println!("Wrote {output}");
}
