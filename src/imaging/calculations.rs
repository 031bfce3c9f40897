//! Pure calculation functions for preview dimensions.
//!
//! No I/O here; everything is testable without images.

/// Calculate preview dimensions for a fixed target width.
///
/// The height follows the source aspect ratio. Every preview has the target
/// width, so sources narrower than the target are enlarged.
/// Degenerate sources (zero on either edge) are returned unchanged.
///
/// ```
/// # use folio::imaging::preview_dimensions;
/// // 4000x3000 landscape at 300px → 300x225
/// assert_eq!(preview_dimensions((4000, 3000), 300), (300, 225));
///
/// // narrow portrait is enlarged to the same width
/// assert_eq!(preview_dimensions((200, 400), 300), (300, 600));
/// ```
pub fn preview_dimensions(source: (u32, u32), target_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return source;
    }

    let ratio = target_width as f64 / src_w as f64;
    let height = ((src_h as f64 * ratio).round() as u32).max(1);
    (target_width, height)
}
