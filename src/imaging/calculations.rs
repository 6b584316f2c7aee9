//! Pure calculation functions for responsive image sets.
//!
//! All functions here are pure and testable without any I/O or images.

/// Breakpoint widths every imported image is rendered at.
pub const STANDARD_WIDTHS: [u32; 6] = [640, 960, 1280, 1920, 2560, 3840];

/// Pixel densities listed in each `srcset`, in table column order.
pub const DENSITIES: [&str; 5] = ["1x", "1.5x", "2x", "2.5x", "3x"];

/// Breakpoint width → source widths for 1x, 1.5x, 2x, 2.5x and 3x displays.
///
/// Each entry is the smallest standard width that covers `breakpoint × density`,
/// capped at the largest one.
pub const IMAGE_SCALES: [(u32, [u32; 5]); 6] = [
    (640, [640, 960, 1280, 1920, 1920]),
    (960, [960, 1920, 1920, 2560, 3840]),
    (1280, [1280, 1920, 2560, 3840, 3840]),
    (1920, [1920, 2560, 3840, 3840, 3840]),
    (2560, [2560, 3840, 3840, 3840, 3840]),
    (3840, [3840, 3840, 3840, 3840, 3840]),
];

/// Source widths for a breakpoint, or `None` for a non-standard width.
pub fn scales_for(breakpoint: u32) -> Option<[u32; 5]> {
    IMAGE_SCALES
        .iter()
        .find(|(bp, _)| *bp == breakpoint)
        .map(|(_, scales)| *scales)
}

/// Fill in the missing half of a width/height ratio pair.
///
/// # Arguments
/// * `width_ratio` - Fraction of the breakpoint width the image occupies
/// * `height_ratio` - Same, vertically
/// * `aspect` - Source aspect ratio (width / height)
///
/// # Returns
/// * Both absent → `(1, 1)`
/// * Only height → width follows from the aspect ratio
/// * Only width → height follows from the aspect ratio
pub fn resolve_ratios(width_ratio: Option<f64>, height_ratio: Option<f64>, aspect: f64) -> (f64, f64) {
    match (width_ratio, height_ratio) {
        (None, None) => (1.0, 1.0),
        (None, Some(h)) => (aspect * h, h),
        (Some(w), None) => (w, w / aspect),
        (Some(w), Some(h)) => (w, h),
    }
}

/// Output box for a target width at a given aspect ratio.
///
/// # Examples
/// ```
/// # use static_page_utils::imaging::calculate_target_dimensions;
/// // The SEO card: 1200 wide at 1.905:1 → 1200x630
/// assert_eq!(calculate_target_dimensions(1200.0, 1.905), (1200, 630));
/// ```
pub fn calculate_target_dimensions(width: f64, aspect: f64) -> (u32, u32) {
    let w = width.round().max(1.0);
    let h = (width / aspect).round().max(1.0);
    (w as u32, h as u32)
}

/// Calculate dimensions that fit inside a box without enlarging the source.
///
/// Mirrors ImageMagick's `WxH>` geometry: images already inside the box keep
/// their size, larger ones shrink preserving the aspect ratio.
pub fn calculate_fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = (src_w as f64 * scale).round().max(1.0) as u32;
    let h = (src_h as f64 * scale).round().max(1.0) as u32;
    (w, h)
}

/// Format a ratio the way it appears in output file names (`1`, `0.5`).
pub fn format_ratio(ratio: f64) -> String {
    format!("{ratio}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Responsive table
    // =========================================================================

    #[test]
    fn table_covers_every_standard_width() {
        for width in STANDARD_WIDTHS {
            assert!(scales_for(width).is_some(), "missing {width}");
        }
    }

    #[test]
    fn table_first_column_is_the_breakpoint() {
        for (bp, scales) in IMAGE_SCALES {
            assert_eq!(scales[0], bp);
        }
    }

    #[test]
    fn table_columns_are_non_decreasing() {
        for (_, scales) in IMAGE_SCALES {
            assert!(scales.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn table_only_references_standard_widths() {
        for (_, scales) in IMAGE_SCALES {
            assert!(scales.iter().all(|s| STANDARD_WIDTHS.contains(s)));
        }
    }

    #[test]
    fn scales_for_960() {
        assert_eq!(scales_for(960), Some([960, 1920, 1920, 2560, 3840]));
    }

    #[test]
    fn scales_for_unknown_breakpoint() {
        assert_eq!(scales_for(800), None);
    }

    // =========================================================================
    // resolve_ratios
    // =========================================================================

    #[test]
    fn ratios_default_to_one() {
        assert_eq!(resolve_ratios(None, None, 1.5), (1.0, 1.0));
    }

    #[test]
    fn width_from_height_ratio() {
        // 3:2 image occupying half the height → 0.75 of the width
        assert_eq!(resolve_ratios(None, Some(0.5), 1.5), (0.75, 0.5));
    }

    #[test]
    fn height_from_width_ratio() {
        assert_eq!(resolve_ratios(Some(0.75), None, 1.5), (0.75, 0.5));
    }

    #[test]
    fn explicit_ratios_pass_through() {
        assert_eq!(resolve_ratios(Some(0.3), Some(0.9), 1.5), (0.3, 0.9));
    }

    // =========================================================================
    // Dimensions
    // =========================================================================

    #[test]
    fn target_dimensions_landscape() {
        // 1920 wide at 16:9 → 1080 tall
        assert_eq!(calculate_target_dimensions(1920.0, 16.0 / 9.0), (1920, 1080));
    }

    #[test]
    fn target_dimensions_seo_card() {
        assert_eq!(calculate_target_dimensions(1200.0, 1.905), (1200, 630));
    }

    #[test]
    fn target_dimensions_fractional_width() {
        // 640 * 0.5 = 320, square
        assert_eq!(calculate_target_dimensions(320.0, 1.0), (320, 320));
    }

    #[test]
    fn fit_smaller_source_is_untouched() {
        assert_eq!(calculate_fit_dimensions((500, 400), (640, 512)), (500, 400));
    }

    #[test]
    fn fit_shrinks_landscape() {
        // 2000x1000 into 640x640 → width bound wins
        assert_eq!(calculate_fit_dimensions((2000, 1000), (640, 640)), (640, 320));
    }

    #[test]
    fn fit_shrinks_portrait() {
        // 1000x2000 into 640x640 → height bound wins
        assert_eq!(calculate_fit_dimensions((1000, 2000), (640, 640)), (320, 640));
    }

    #[test]
    fn format_ratio_drops_trailing_zero() {
        assert_eq!(format_ratio(1.0), "1");
        assert_eq!(format_ratio(0.5), "0.5");
    }
}
