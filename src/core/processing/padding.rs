use image::{Rgb, RgbImage};
use tracing::debug;

/// Offsets that centre `content` inside `canvas`; odd slack goes to the right/bottom.
pub fn centre_offset(content: (u32, u32), canvas: (u32, u32)) -> (u32, u32) {
    (
        canvas.0.saturating_sub(content.0) / 2,
        canvas.1.saturating_sub(content.1) / 2,
    )
}

/// Paste `image` centred on a `canvas_w x canvas_h` canvas filled with `background`.
/// Content larger than the canvas is cropped at the right/bottom edge.
pub fn pad_onto_canvas(
    image: &RgbImage,
    canvas_w: u32,
    canvas_h: u32,
    background: [u8; 3],
) -> (RgbImage, (u32, u32)) {
    let (cols, rows) = image.dimensions();
    let (pad_left, pad_top) = centre_offset((cols, rows), (canvas_w, canvas_h));
    debug!(
        "Padding {}x{} onto {}x{} canvas at ({}, {})",
        cols, rows, canvas_w, canvas_h, pad_left, pad_top
    );

    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, Rgb(background));
    let copy_cols = cols.min(canvas_w - pad_left) as usize;
    let copy_rows = rows.min(canvas_h - pad_top) as usize;
    let src = image.as_raw();
    let dst_stride = canvas_w as usize * 3;
    let src_stride = cols as usize * 3;
    let dst: &mut [u8] = &mut canvas;

    // Copy per row using slice copies to minimize per-pixel indexing
    for row in 0..copy_rows {
        let src_offset = row * src_stride;
        let dst_offset = (row + pad_top as usize) * dst_stride + pad_left as usize * 3;
        dst[dst_offset..dst_offset + copy_cols * 3]
            .copy_from_slice(&src[src_offset..src_offset + copy_cols * 3]);
    }

    (canvas, (pad_left, pad_top))
}
