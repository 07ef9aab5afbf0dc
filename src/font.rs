//! Glyph tables mapping characters and digits to segment masks.

use serde::{Deserialize, Serialize};

use crate::segment::SegmentMask;

// ============================================================================
// Glyph Constants
// ============================================================================

/// Segment patterns for the characters the engine understands.
struct Glyphs;

impl Glyphs {
    /// Segments for digits 0-9. Nine is drawn without its bottom tail;
    /// [`digit_mask`] adds segment D when the alternate nine is selected.
    const DIGITS: [u8; 10] = [
        0b_0011_1111, // Digit 0
        0b_0000_0110, // Digit 1
        0b_0101_1011, // Digit 2
        0b_0100_1111, // Digit 3
        0b_0110_0110, // Digit 4
        0b_0110_1101, // Digit 5
        0b_0111_1101, // Digit 6
        0b_0000_0111, // Digit 7
        0b_0111_1111, // Digit 8
        0b_0110_0111, // Digit 9 (no tail)
    ];

    /// The lowercase-leaning alphabet.
    const LOWERCASE: [u8; 26] = [
        0b_0101_1111, // a
        0b_0111_1100, // b
        0b_0101_1000, // c
        0b_0101_1110, // d
        0b_0111_1011, // e
        0b_0111_0001, // f
        0b_0110_1111, // g
        0b_0111_0100, // h
        0b_0000_0100, // i
        0b_0000_1110, // j
        0b_0111_0101, // k
        0b_0011_0000, // l
        0b_0101_0101, // m
        0b_0101_0100, // n
        0b_0101_1100, // o
        0b_0111_0011, // p
        0b_0110_0111, // q
        0b_0101_0000, // r
        0b_0110_1101, // s
        0b_0111_1000, // t
        0b_0001_1100, // u
        0b_0001_1100, // v (same as u; seven segments offer nothing better)
        0b_0110_1010, // w
        0b_0111_0110, // x
        0b_0110_1110, // y
        0b_0101_1011, // z
    ];

    /// The uppercase-leaning alphabet.
    const UPPERCASE: [u8; 26] = [
        0b_0111_0111, // A
        0b_0111_1100, // B
        0b_0011_1001, // C
        0b_0101_1110, // D
        0b_0111_1001, // E
        0b_0111_0001, // F
        0b_0011_1101, // G
        0b_0111_0110, // H
        0b_0000_0110, // I
        0b_0001_1110, // J
        0b_0111_0110, // K
        0b_0011_1000, // L
        0b_0001_0101, // M
        0b_0101_0100, // N
        0b_0011_1111, // O
        0b_0111_0011, // P
        0b_0110_0111, // Q
        0b_0101_0000, // R
        0b_0110_1101, // S
        0b_0111_1000, // T
        0b_0011_1110, // U
        0b_0010_1010, // V
        0b_0001_1101, // W
        0b_0111_0110, // X
        0b_0110_1110, // Y
        0b_0101_1011, // Z
    ];

    /// A minus sign: the middle bar alone.
    const DASH: u8 = 0b_0100_0000;

    /// A slash drawn as the B-G-E diagonal.
    const SLASH: u8 = 0b_0101_0010;

    /// The stand-in for every character with no table entry: three
    /// horizontal bars, unmistakably "no such glyph" rather than garbage.
    const WILDCARD: u8 = 0b_0100_1001;
}

// ============================================================================
// GlyphSet and encoding
// ============================================================================

/// Which of the two letter renderings to use.
///
/// Seven segments cannot draw every letter unambiguously, so two alphabets
/// ship: a lowercase-leaning one and an uppercase-leaning one. The choice
/// applies to letters of either input case.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GlyphSet {
    #[default]
    Lowercase,
    Uppercase,
}

/// What a character turns into on the display.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    /// An ordinary segment pattern for one cell.
    Mask(SegmentMask),
    /// The character claims the cell as a colon-overlay position instead
    /// of drawing anything itself.
    Colon,
}

/// Encodes one character. Total: unknown characters yield the wildcard
/// pattern, never an error.
#[must_use]
pub fn encode(ch: char, set: GlyphSet) -> Glyph {
    let bits = match ch {
        ':' => return Glyph::Colon,
        ' ' => 0,
        '-' => Glyphs::DASH,
        '/' => Glyphs::SLASH,
        '0'..='9' => {
            let n = ch.to_digit(10).and_then(|d| u8::try_from(d).ok()).unwrap_or(0);
            return Glyph::Mask(digit_mask(n, false));
        }
        'a'..='z' | 'A'..='Z' => {
            let index = (ch.to_ascii_lowercase() as usize).wrapping_sub('a' as usize);
            let table = match set {
                GlyphSet::Lowercase => &Glyphs::LOWERCASE,
                GlyphSet::Uppercase => &Glyphs::UPPERCASE,
            };
            table.get(index).copied().unwrap_or(Glyphs::WILDCARD)
        }
        _ => Glyphs::WILDCARD,
    };
    Glyph::Mask(SegmentMask::new(bits))
}

/// Segments for `n % 10`, with the bottom tail added to nine when
/// `alt_nine` is selected.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "Modulo is required for digit extraction"
)]
#[must_use]
pub fn digit_mask(n: u8, alt_nine: bool) -> SegmentMask {
    let index = usize::from(n % 10);
    let mut mask = SegmentMask::new(Glyphs::DIGITS.get(index).copied().unwrap_or(0));
    if alt_nine && index == 9 {
        mask |= SegmentMask::D;
    }
    mask
}
