//! Color utility functions shared across the application.
//!
//! Label classes carry `#rrggbb` colors from the backend; classes without a
//! usable color get a stable generated hue instead.

/// Parse a `#rrggbb` (or `rrggbb`, or `#rgb`) hex color.
pub fn parse_hex_color(raw: &str) -> Option<[u8; 3]> {
    let hex = raw.trim().trim_start_matches('#');
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 if hex.is_ascii() => Some([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?]),
        3 if hex.is_ascii() => {
            let expand = |s: &str| channel(s).map(|v| v * 17);
            Some([expand(&hex[0..1])?, expand(&hex[1..2])?, expand(&hex[2..3])?])
        }
        _ => None,
    }
}

/// Stable distinct color for an id, spreading hues by the golden angle.
pub fn generated_color(id: i64) -> [u8; 3] {
    let hue = (id.rem_euclid(360) as f32 * 137.508) % 360.0;
    let (r, g, b) = hsv_to_rgb(hue, 0.65, 0.95);
    [
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ]
}

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_long() {
        assert_eq!(parse_hex_color("#ff8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_color("00FF00"), Some([0, 255, 0]));
    }

    #[test]
    fn test_parse_hex_short() {
        assert_eq!(parse_hex_color("#f0a"), Some([255, 0, 170]));
    }

    #[test]
    fn test_parse_hex_invalid() {
        assert_eq!(parse_hex_color(""), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
    }

    #[test]
    fn test_generated_color_is_stable() {
        assert_eq!(generated_color(5), generated_color(5));
        assert_ne!(generated_color(1), generated_color(2));
    }

    #[test]
    fn test_hsv_to_rgb_red() {
        let (r, g, b) = hsv_to_rgb(0.0, 1.0, 1.0);
        assert!((r - 1.0).abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!(b.abs() < 0.01);
    }

    #[test]
    fn test_hsv_to_rgb_blue() {
        let (r, g, b) = hsv_to_rgb(240.0, 1.0, 1.0);
        assert!(r.abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!((b - 1.0).abs() < 0.01);
    }
}
