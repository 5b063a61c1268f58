use image::{GrayImage, Rgb, RgbImage};

/// Maps an intensity in [0, 255] to the JET palette (blue, cyan, yellow, red)
pub fn jet_color(value: u8) -> Rgb<u8> {
    let t = value as f64 / 255.0;
    let channel = |offset: f64| {
        let v = (1.5 - (4.0 * t - offset).abs()).clamp(0.0, 1.0);
        (v * 255.0).round() as u8
    };
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Pseudo-colours a difference map
pub fn jet(map: &GrayImage) -> RgbImage {
    let (width, height) = map.dimensions();
    RgbImage::from_fn(width, height, |x, y| jet_color(map.get_pixel(x, y)[0]))
}
