pub mod braille;
pub mod canvas;
pub mod halfblock;
pub mod surface;

pub use canvas::{Canvas, ColorMode, RenderMode, Rgb};
pub use surface::{Surface, Viewport};
