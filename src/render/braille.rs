use super::canvas::{Canvas, ColorMode, color_to_fg};

/// Braille dot positions within a 2x4 cell:
/// (0,0) (1,0)    dot1 dot4
/// (0,1) (1,1)    dot2 dot5
/// (0,2) (1,2)    dot3 dot6
/// (0,3) (1,3)    dot7 dot8
///
/// Unicode braille: U+2800 + dot_bits
const BRAILLE_OFFSET: u32 = 0x2800;
const DOT_MAP: [(usize, usize, u32); 8] = [
    (0, 0, 0x01),
    (0, 1, 0x02),
    (0, 2, 0x04),
    (1, 0, 0x08),
    (1, 1, 0x10),
    (1, 2, 0x20),
    (0, 3, 0x40),
    (1, 3, 0x80),
];

/// Light level at which a dot is raised. Low enough that fading sparks
/// stay visible for most of their life.
const THRESHOLD: f64 = 0.12;

pub fn render(canvas: &Canvas) -> String {
    let term_cols = canvas.width / 2;
    let term_rows = canvas.height / 4;
    let mut out = String::with_capacity(term_cols * term_rows * 20);
    let use_color = canvas.color_mode != ColorMode::Mono;
    let mut last_fg = String::new();

    for row in 0..term_rows {
        for col in 0..term_cols {
            let px = col * 2;
            let py = row * 4;

            let mut bits: u32 = 0;
            let mut total = [0u32; 3];
            let mut lit_count: u32 = 0;

            for &(dx, dy, bit) in &DOT_MAP {
                let idx = (py + dy) * canvas.width + px + dx;
                if canvas.value(idx) > THRESHOLD {
                    bits |= bit;
                    let (r, g, b) = canvas.rgb(idx);
                    total[0] += r as u32;
                    total[1] += g as u32;
                    total[2] += b as u32;
                    lit_count += 1;
                }
            }

            let ch = char::from_u32(BRAILLE_OFFSET + bits).unwrap_or(' ');

            if use_color && lit_count > 0 {
                let color = canvas.map_color(
                    (total[0] / lit_count) as u8,
                    (total[1] / lit_count) as u8,
                    (total[2] / lit_count) as u8,
                );
                let fg = color_to_fg(color);
                if fg != last_fg {
                    out.push_str("\x1b[");
                    out.push_str(&fg);
                    out.push('m');
                    last_fg = fg;
                }
            }
            out.push(ch);
        }
        if use_color {
            out.push_str("\x1b[0m");
            last_fg.clear();
        }
        // Use cursor movement instead of \n to avoid blank line issues
        out.push_str(&format!("\x1b[{};1H", row + 2));
    }
    out
}
