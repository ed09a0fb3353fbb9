//! Frames substituted for [`Symbol::Spinner`], advanced once per UI tick.

use crate::status::Symbol;

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub const FRAME_COUNT: usize = FRAMES.len();

pub fn frame(idx: usize) -> &'static str {
    FRAMES[idx % FRAME_COUNT]
}

/// Text for a resolved status symbol at the given spinner frame.
pub fn symbol_text(symbol: Symbol, spinner_frame: usize) -> &'static str {
    match symbol {
        Symbol::Glyph(g) => g,
        Symbol::Spinner => frame(spinner_frame),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_single_braille_cells() {
        for f in FRAMES {
            let mut chars = f.chars();
            let ch = chars.next().unwrap();
            assert!(chars.next().is_none(), "frame {f:?} is more than one char");
            assert!(('\u{2800}'..='\u{28FF}').contains(&ch), "{ch:?} not Braille");
        }
    }

    #[test]
    fn frame_wraps_at_count() {
        assert_eq!(frame(0), frame(FRAME_COUNT));
        let _ = frame(usize::MAX);
    }

    #[test]
    fn spinner_symbol_advances_with_frame() {
        assert_ne!(symbol_text(Symbol::Spinner, 0), symbol_text(Symbol::Spinner, 1));
    }

    #[test]
    fn glyph_ignores_frame() {
        assert_eq!(symbol_text(Symbol::Glyph("✗"), 3), "✗");
    }
}
