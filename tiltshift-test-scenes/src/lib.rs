pub mod expectations;
pub mod scene;

pub use expectations::{check_pixels, PixelExpectation};
pub use scene::{
    build_focus_scene, checkerboard, vertical_stripes, CANVAS_HEIGHT, CANVAS_WIDTH,
};
