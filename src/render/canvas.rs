use crossterm::style::Color;

/// 8-bit RGB colour.
pub type Rgb = (u8, u8, u8);

/// How to render sub-cell pixels to terminal characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderMode {
    /// Unicode braille characters (2x4 per cell = highest resolution)
    Braille,
    /// Half-block characters ▀▄█ (1x2 per cell)
    HalfBlock,
    /// Plain ASCII characters with density mapping
    Ascii,
}

impl RenderMode {
    /// Parse the kebab-case name used by the config file and remote commands.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "braille" => Some(RenderMode::Braille),
            "half-block" | "halfblock" => Some(RenderMode::HalfBlock),
            "ascii" => Some(RenderMode::Ascii),
            _ => None,
        }
    }
}

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// No color — monochrome
    Mono,
    /// ANSI 16 colors
    Ansi16,
    /// 256-color palette
    Ansi256,
    /// 24-bit true color (RGB)
    TrueColor,
}

impl ColorMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mono" => Some(ColorMode::Mono),
            "ansi16" => Some(ColorMode::Ansi16),
            "ansi256" => Some(ColorMode::Ansi256),
            "true-color" | "truecolor" => Some(ColorMode::TrueColor),
            _ => None,
        }
    }
}

/// A pixel-level light buffer that gets rendered to terminal characters.
/// Coordinates are in "sub-cell" pixel space.
pub struct Canvas {
    /// Width in pixels (sub-cell)
    pub width: usize,
    /// Height in pixels (sub-cell)
    pub height: usize,
    /// Emitted light per pixel, one 0.0..=1.0 value per RGB channel.
    /// Black (all zero) is the night sky.
    pub light: Vec<[f64; 3]>,
    pub render_mode: RenderMode,
    pub color_mode: ColorMode,
    /// Color quantization step (0 = off, 4/8/16 = round RGB to nearest N).
    /// Higher values = fewer unique colors = better dedup = less output.
    pub color_quant: u8,
}

impl Canvas {
    pub fn new(
        term_cols: usize,
        term_rows: usize,
        render_mode: RenderMode,
        color_mode: ColorMode,
    ) -> Self {
        let (px_w, px_h) = match render_mode {
            RenderMode::Braille => (term_cols * 2, term_rows * 4),
            RenderMode::HalfBlock => (term_cols, term_rows * 2),
            RenderMode::Ascii => (term_cols, term_rows),
        };
        Canvas {
            width: px_w,
            height: px_h,
            light: vec![[0.0; 3]; px_w * px_h],
            render_mode,
            color_mode,
            color_quant: 0,
        }
    }

    pub fn clear(&mut self) {
        self.light.fill([0.0; 3]);
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Composite `color` over the pixel with the given opacity (source-over).
    #[inline]
    pub fn blend(&mut self, x: i64, y: i64, color: Rgb, alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        if let Some(idx) = self.index(x, y) {
            let src = unit(color);
            let px = &mut self.light[idx];
            for c in 0..3 {
                px[c] = src[c] * alpha + px[c] * (1.0 - alpha);
            }
        }
    }

    /// Keep the brighter of the current pixel and `color * alpha`, per channel.
    /// Overlapping stroke samples use this so they don't stack up.
    #[inline]
    pub fn lighten(&mut self, x: i64, y: i64, color: Rgb, alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        if let Some(idx) = self.index(x, y) {
            let src = unit(color);
            let px = &mut self.light[idx];
            for c in 0..3 {
                px[c] = px[c].max(src[c] * alpha);
            }
        }
    }

    /// Additive light, saturating at full intensity.
    #[inline]
    pub fn add_light(&mut self, x: i64, y: i64, color: Rgb, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        if let Some(idx) = self.index(x, y) {
            let src = unit(color);
            let px = &mut self.light[idx];
            for c in 0..3 {
                px[c] = (px[c] + src[c] * amount).min(1.0);
            }
        }
    }

    /// Filled disc in pixel coordinates. Sub-pixel discs still light the
    /// pixel under their centre.
    pub fn fill_disc(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb, alpha: f64) {
        if !(cx.is_finite() && cy.is_finite()) || alpha <= 0.0 {
            return;
        }
        let r = radius.max(0.0);
        let x0 = (cx - r).floor() as i64;
        let x1 = (cx + r).floor() as i64;
        let y0 = (cy - r).floor() as i64;
        let y1 = (cy + r).floor() as i64;
        let (ccx, ccy) = (cx.floor() as i64, cy.floor() as i64);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if (x == ccx && y == ccy) || dx * dx + dy * dy <= r * r {
                    self.blend(x, y, color, alpha);
                }
            }
        }
    }

    /// Soft halo around a point: additive light with quadratic falloff.
    pub fn glow(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb, intensity: f64) {
        if !(cx.is_finite() && cy.is_finite()) || radius < 1.0 || intensity <= 0.0 {
            return;
        }
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                let d = (dx * dx + dy * dy).sqrt() / radius;
                if d < 1.0 {
                    let falloff = (1.0 - d) * (1.0 - d);
                    self.add_light(x, y, color, intensity * falloff);
                }
            }
        }
    }

    /// Thick line between two pixel positions.
    pub fn stroke_line(
        &mut self,
        (x0, y0): (f64, f64),
        (x1, y1): (f64, f64),
        width: f64,
        color: Rgb,
        alpha: f64,
    ) {
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return;
        }
        let half = (width * 0.5).max(0.0);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            if half < 0.5 {
                self.lighten(x.floor() as i64, y.floor() as i64, color, alpha);
                continue;
            }
            let r = half.ceil() as i64;
            for oy in -r..=r {
                for ox in -r..=r {
                    if ((ox * ox + oy * oy) as f64) <= half * half {
                        self.lighten(x.floor() as i64 + ox, y.floor() as i64 + oy, color, alpha);
                    }
                }
            }
        }
    }

    /// Brightness of a pixel: its strongest channel.
    #[inline]
    pub fn value(&self, idx: usize) -> f64 {
        let [r, g, b] = self.light[idx];
        r.max(g).max(b)
    }

    /// Pixel light as 8-bit RGB.
    #[inline]
    pub fn rgb(&self, idx: usize) -> Rgb {
        let [r, g, b] = self.light[idx];
        let to_u8 = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        (to_u8(r), to_u8(g), to_u8(b))
    }

    /// Terminal dimensions needed for this canvas
    pub fn term_size(&self) -> (usize, usize) {
        match self.render_mode {
            RenderMode::Braille => (self.width / 2, self.height / 4),
            RenderMode::HalfBlock => (self.width, self.height / 2),
            RenderMode::Ascii => (self.width, self.height),
        }
    }

    /// Render the canvas to a string buffer for output
    pub fn render(&self) -> String {
        match self.render_mode {
            RenderMode::Braille => super::braille::render(self),
            RenderMode::HalfBlock => super::halfblock::render(self),
            RenderMode::Ascii => self.render_ascii(),
        }
    }

    fn render_ascii(&self) -> String {
        const CHARS: &[u8] = b" .:-=+*#%@";
        let (cols, rows) = self.term_size();
        let mut out = String::with_capacity(cols * rows * 10);
        let use_color = self.color_mode != ColorMode::Mono;
        let mut last_fg = String::new();

        for row in 0..rows {
            for col in 0..cols {
                let idx = row * self.width + col;
                let v = self.value(idx).clamp(0.0, 1.0);
                let ch = CHARS[(v * (CHARS.len() - 1) as f64) as usize] as char;

                if use_color && ch != ' ' {
                    // Density already carries brightness, so show the hue at full strength
                    let (r, g, b) = normalize(self.rgb(idx));
                    let fg = color_to_fg(self.map_color(r, g, b));
                    if fg != last_fg {
                        out.push_str("\x1b[");
                        out.push_str(&fg);
                        out.push('m');
                        last_fg = fg;
                    }
                }
                out.push(ch);
            }
            out.push_str("\x1b[0m\x1b[");
            out.push_str(&(row + 2).to_string());
            out.push_str(";1H");
            last_fg.clear();
        }
        out
    }

    pub fn map_color(&self, r: u8, g: u8, b: u8) -> Color {
        let (r, g, b) = if self.color_quant > 1 {
            let q = self.color_quant as u16;
            (
                ((r as u16 + q / 2) / q * q).min(255) as u8,
                ((g as u16 + q / 2) / q * q).min(255) as u8,
                ((b as u16 + q / 2) / q * q).min(255) as u8,
            )
        } else {
            (r, g, b)
        };
        match self.color_mode {
            ColorMode::Mono => Color::White,
            ColorMode::TrueColor => Color::Rgb { r, g, b },
            ColorMode::Ansi256 => {
                let idx = 16 + (36 * (r as u16 / 51)) + (6 * (g as u16 / 51)) + (b as u16 / 51);
                Color::AnsiValue(idx as u8)
            }
            ColorMode::Ansi16 => {
                let brightness = (r as u16 + g as u16 + b as u16) / 3;
                if brightness < 48 {
                    Color::DarkGrey
                } else if r > 150 && g > 150 && b < 100 {
                    // gold and yellow sparks
                    Color::Yellow
                } else if r > g && r > b {
                    if brightness > 140 { Color::Red } else { Color::DarkRed }
                } else if g > r && g > b {
                    if brightness > 140 { Color::Green } else { Color::DarkGreen }
                } else if b > r && b > g {
                    if brightness > 140 { Color::Cyan } else { Color::DarkBlue }
                } else if brightness > 180 {
                    Color::White
                } else {
                    Color::Grey
                }
            }
        }
    }
}

#[inline]
fn unit((r, g, b): Rgb) -> [f64; 3] {
    [r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0]
}

/// Scale a colour so its strongest channel is 255.
fn normalize((r, g, b): Rgb) -> Rgb {
    let max = r.max(g).max(b);
    if max == 0 {
        return (0, 0, 0);
    }
    let k = 255.0 / max as f64;
    (
        (r as f64 * k) as u8,
        (g as f64 * k) as u8,
        (b as f64 * k) as u8,
    )
}

pub fn color_to_fg(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("38;2;{};{};{}", r, g, b),
        Color::AnsiValue(v) => format!("38;5;{}", v),
        Color::Black => "30".into(),
        Color::DarkRed => "31".into(),
        Color::DarkGreen => "32".into(),
        Color::DarkYellow => "33".into(),
        Color::DarkBlue => "34".into(),
        Color::DarkMagenta => "35".into(),
        Color::DarkCyan => "36".into(),
        Color::Grey => "37".into(),
        Color::DarkGrey => "90".into(),
        Color::Red => "91".into(),
        Color::Green => "92".into(),
        Color::Yellow => "93".into(),
        Color::Blue => "94".into(),
        Color::Magenta => "95".into(),
        Color::Cyan => "96".into(),
        Color::White => "97".into(),
        _ => "37".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(10, 5, RenderMode::HalfBlock, ColorMode::TrueColor)
    }

    #[test]
    fn test_blend_is_source_over() {
        let mut c = canvas();
        c.blend(1, 1, (255, 255, 255), 0.5);
        let idx = c.width + 1;
        assert!((c.value(idx) - 0.5).abs() < 1e-9);
        c.blend(1, 1, (255, 255, 255), 0.5);
        assert!((c.value(idx) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_bounds_writes_are_ignored() {
        let mut c = canvas();
        c.blend(-1, 0, (255, 0, 0), 1.0);
        c.add_light(0, 100, (255, 0, 0), 1.0);
        c.fill_disc(f64::NAN, 2.0, 3.0, (255, 0, 0), 1.0);
        c.stroke_line((0.0, 0.0), (f64::INFINITY, 1.0), 3.0, (255, 0, 0), 1.0);
        assert!(c.light.iter().all(|px| *px == [0.0; 3]));
    }

    #[test]
    fn test_tiny_disc_lights_centre_pixel() {
        let mut c = canvas();
        c.fill_disc(3.2, 4.7, 0.1, (255, 215, 0), 1.0);
        assert_eq!(c.rgb(4 * c.width + 3), (255, 215, 0));
    }

    #[test]
    fn test_glow_adds_and_saturates() {
        let mut c = canvas();
        for _ in 0..20 {
            c.glow(5.0, 5.0, 3.0, (255, 255, 255), 0.5);
        }
        let centre = 5 * c.width + 5;
        assert!(c.value(centre) <= 1.0);
        assert!(c.value(centre) > 0.9);
        assert_eq!(c.value(0), 0.0);
    }

    #[test]
    fn test_stroke_does_not_stack() {
        let mut c = canvas();
        c.stroke_line((0.0, 2.0), (9.0, 2.0), 3.0, (255, 255, 255), 0.4);
        c.stroke_line((0.0, 2.0), (9.0, 2.0), 3.0, (255, 255, 255), 0.4);
        let idx = 2 * c.width + 4;
        assert!((c.value(idx) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(RenderMode::from_name("half-block"), Some(RenderMode::HalfBlock));
        assert_eq!(ColorMode::from_name("true-color"), Some(ColorMode::TrueColor));
        assert_eq!(ColorMode::from_name("sepia"), None);
    }
}
