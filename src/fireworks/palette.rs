use crate::render::Rgb;

pub const WHITE: Rgb = (0xFF, 0xFF, 0xFF);
pub const GOLD: Rgb = (0xFF, 0xD7, 0x00);

/// Shell colours, picked uniformly.
pub const SHELL: [Rgb; 8] = [
    GOLD,
    (0xFF, 0x69, 0xB4), // hot pink
    (0x00, 0xCE, 0xD1), // dark turquoise
    (0xFF, 0x63, 0x47), // tomato
    (0x98, 0xFB, 0x98), // pale green
    (0xDD, 0xA0, 0xDD), // plum
    WHITE,
    (0x87, 0xCE, 0xEB), // sky blue
];

/// HSL to RGB. `hue` in degrees, `saturation` and `lightness` in 0.0..=1.0.
pub fn hsl(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);
    let h = hue.rem_euclid(360.0) / 60.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r), to_u8(g), to_u8(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl(120.0, 1.0, 0.5), (0, 255, 0));
        assert_eq!(hsl(240.0, 1.0, 0.5), (0, 0, 255));
    }

    #[test]
    fn test_warm_trail_range() {
        assert_eq!(hsl(60.0, 1.0, 0.5), (255, 255, 0));
        assert_eq!(hsl(60.0, 1.0, 1.0), (255, 255, 255));
        let (r, g, b) = hsl(60.0, 1.0, 0.75);
        assert_eq!((r, g), (255, 255));
        assert!(b > 100 && b < 150);
    }
}
