//! Single-stroke caption font.
//!
//! Captions are drawn, not typeset: every glyph is a handful of open
//! polylines, so the plotter draws them with one pen pass and the laser
//! engraves them as thin buffered strokes. Neither machine needs a font
//! installed.
//!
//! Glyphs are stored in the Hershey JHF text format. Each record is a
//! 5-column glyph number, a 3-column count of coordinate pairs, then the
//! pairs themselves, each coordinate offset from `'R'`. The first pair is
//! the glyph's left and right bound, and `" R"` lifts the pen. Long records
//! wrap onto continuation lines. Glyphs are assigned to characters in file
//! order starting at the space character.

use std::borrow::Cow;
use std::collections::HashMap;

use geo::{Coord, LineString};

use crate::geometry::round_to;

/// The built-in font: printable ASCII.
const BUILTIN: &str = include_str!("../fonts/caption.jhf");

const FIRST_CHAR: u32 = ' ' as u32;

/// Baseline in glyph units (y grows downward).
const BASELINE: i32 = 9;
/// Top of lowercase letters without ascenders.
const X_HEIGHT: i32 = -5;
/// Cap height is 21 units, 0.7 of the em like common sans faces.
const UNITS_PER_EM: f64 = 30.0;

/// One glyph in font units, relative to its own center line.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub left: i32,
    pub right: i32,
    /// Pen-down polylines
    pub strokes: Vec<Vec<(i32, i32)>>,
}

impl Glyph {
    pub fn advance(&self) -> i32 {
        self.right - self.left
    }

    /// Highest point of the glyph, or the x-height for an empty glyph.
    fn top(&self) -> i32 {
        self.strokes
            .iter()
            .flatten()
            .map(|&(_, y)| y)
            .min()
            .unwrap_or(X_HEIGHT)
    }
}

#[derive(Debug, Clone)]
pub struct StrokeFont {
    glyphs: HashMap<char, Glyph>,
}

impl StrokeFont {
    pub fn builtin() -> Self {
        Self::parse(BUILTIN)
    }

    /// Parse JHF content. Lines that are not records are skipped, and a
    /// malformed record still takes its character slot.
    pub fn parse(content: &str) -> Self {
        let mut glyphs = HashMap::new();
        let mut code = FIRST_CHAR;
        let mut record = String::new();
        let mut needed = 0;

        for line in content.lines() {
            if record.is_empty() {
                if line.trim().is_empty() {
                    continue;
                }
                match line.get(5..8).and_then(|n| n.trim().parse::<usize>().ok()) {
                    Some(pairs) if pairs > 0 => needed = 8 + 2 * pairs,
                    _ => continue,
                }
            }
            record.push_str(line);
            if record.len() < needed {
                continue;
            }

            if let (Some(glyph), Some(c)) = (record.get(8..needed).and_then(parse_glyph), char::from_u32(code)) {
                glyphs.insert(c, glyph);
            }
            code += 1;
            record.clear();
        }

        Self { glyphs }
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c)
    }

    /// Glyph for `c`, composing accented Latin letters from their base
    /// letter. Characters the font cannot draw take the space glyph.
    ///
    /// ## Rust Lesson #22: `Cow` (clone on write)
    ///
    /// Almost every character maps straight to a stored glyph, so handing
    /// back `&Glyph` is free. An accented letter needs a freshly built
    /// glyph. `Cow<Glyph>` is either a borrow or an owned value, and the
    /// caller reads both the same way through `Deref`. Only the rare
    /// accented case pays for an allocation.
    fn resolve(&self, c: char) -> Option<Cow<'_, Glyph>> {
        if let Some(glyph) = self.glyphs.get(&c) {
            return Some(Cow::Borrowed(glyph));
        }
        if let Some((base, accent)) = decompose(c) {
            if let Some(glyph) = self.glyphs.get(&base) {
                return Some(Cow::Owned(accent.apply(base, glyph)));
            }
        }
        self.glyphs.get(&' ').map(Cow::Borrowed)
    }

    /// Advance width of `text` in millimeters.
    pub fn text_width(&self, text: &str, size_mm: f64) -> f64 {
        let units: i32 = text
            .chars()
            .filter_map(|c| self.resolve(c))
            .map(|g| g.advance())
            .sum();
        f64::from(units) * size_mm / UNITS_PER_EM
    }

    /// Polylines for `text` starting at `x_mm` with its baseline on
    /// `baseline_mm`. Page y grows downward, same as the glyph units.
    pub fn layout(&self, text: &str, x_mm: f64, baseline_mm: f64, size_mm: f64) -> Vec<LineString<f64>> {
        let scale = size_mm / UNITS_PER_EM;
        let mut cursor = x_mm;
        let mut lines = Vec::new();

        for glyph in text.chars().filter_map(|c| self.resolve(c)) {
            for stroke in glyph.strokes.iter().filter(|s| s.len() >= 2) {
                let coords: Vec<Coord<f64>> = stroke
                    .iter()
                    .map(|&(x, y)| Coord {
                        x: round_to(cursor + f64::from(x - glyph.left) * scale, 4),
                        y: round_to(baseline_mm + f64::from(y - BASELINE) * scale, 4),
                    })
                    .collect();
                lines.push(LineString::new(coords));
            }
            cursor += f64::from(glyph.advance()) * scale;
        }

        lines
    }

    /// Like [`StrokeFont::layout`] with the advance box ending at `right_mm`.
    pub fn layout_right(&self, text: &str, right_mm: f64, baseline_mm: f64, size_mm: f64) -> Vec<LineString<f64>> {
        let width = self.text_width(text, size_mm);
        self.layout(text, right_mm - width, baseline_mm, size_mm)
    }
}

/// Bounds and strokes of one record's data (everything after the count).
fn parse_glyph(data: &str) -> Option<Glyph> {
    let bytes = data.as_bytes();
    let (left, right) = (unit(*bytes.first()?), unit(*bytes.get(1)?));

    let mut strokes = Vec::new();
    let mut current = Vec::new();
    for pair in bytes[2..].chunks_exact(2) {
        if pair == b" R" {
            if !current.is_empty() {
                strokes.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push((unit(pair[0]), unit(pair[1])));
    }
    if !current.is_empty() {
        strokes.push(current);
    }

    Some(Glyph { left, right, strokes })
}

fn unit(b: u8) -> i32 {
    i32::from(b) - i32::from(b'R')
}

// ============================================================================
// ACCENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accent {
    Acute,
    Grave,
    DoubleAcute,
    Diaeresis,
    Circumflex,
    Caron,
}

/// Accented letters and their base letters, position by position.
const ACCENTED: &[(&str, &str, Accent)] = &[
    ("áéíóúýÁÉÍÓÚÝćńśźĆŃŚŹ", "aeiouyAEIOUYcnszCNSZ", Accent::Acute),
    ("àèìòùÀÈÌÒÙ", "aeiouAEIOU", Accent::Grave),
    ("őűŐŰ", "ouOU", Accent::DoubleAcute),
    ("äëïöüÿÄËÏÖÜ", "aeiouyAEIOU", Accent::Diaeresis),
    ("âêîôûÂÊÎÔÛ", "aeiouAEIOU", Accent::Circumflex),
    ("čďěňřšťžČĎĚŇŘŠŤŽ", "cdenrstzCDENRSTZ", Accent::Caron),
];

fn decompose(c: char) -> Option<(char, Accent)> {
    ACCENTED.iter().find_map(|&(marked, plain, accent)| {
        let i = marked.chars().position(|m| m == c)?;
        plain.chars().nth(i).map(|base| (base, accent))
    })
}

impl Accent {
    /// Mark strokes relative to the glyph center and its top.
    fn strokes(self) -> &'static [&'static [(i32, i32)]] {
        match self {
            Accent::Acute => &[&[(-1, -2), (2, -6)]],
            Accent::Grave => &[&[(1, -2), (-2, -6)]],
            Accent::DoubleAcute => &[&[(-3, -2), (-1, -6)], &[(1, -2), (3, -6)]],
            Accent::Diaeresis => &[&[(-3, -3), (-3, -4)], &[(3, -3), (3, -4)]],
            Accent::Circumflex => &[&[(-3, -3), (0, -6), (3, -3)]],
            Accent::Caron => &[&[(-3, -6), (0, -3), (3, -6)]],
        }
    }

    /// `glyph` with this mark placed above it. The dot of `i` and `j`
    /// gives way to the mark.
    fn apply(self, base: char, glyph: &Glyph) -> Glyph {
        let mut marked = glyph.clone();
        if matches!(base, 'i' | 'j') {
            marked.strokes.retain(|s| s.iter().any(|&(_, y)| y >= X_HEIGHT));
        }
        let top = marked.top();
        for stroke in self.strokes() {
            marked.strokes.push(stroke.iter().map(|&(x, y)| (x, top + y)).collect());
        }
        marked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(lines: &[LineString<f64>]) -> (f64, f64, f64, f64) {
        let coords = lines.iter().flat_map(|l| l.0.iter());
        coords.fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(x0, y0, x1, y1), c| (x0.min(c.x), y0.min(c.y), x1.max(c.x), y1.max(c.y)),
        )
    }

    #[test]
    fn builtin_covers_printable_ascii() {
        let font = StrokeFont::builtin();
        for c in ' '..='~' {
            assert!(font.glyph(c).is_some(), "missing glyph for {:?}", c);
        }
        assert!(font.glyph(' ').map(|g| g.strokes.is_empty()).unwrap_or(false));
    }

    #[test]
    fn pen_up_splits_strokes() {
        let font = StrokeFont::parse("   32  1NV\n   33  7I[L[RFX[ RNTVT\n");
        let glyph = font.glyph('!').unwrap();
        assert_eq!((glyph.left, glyph.right), (-9, 9));
        assert_eq!(glyph.strokes, vec![vec![(-6, 9), (0, -12), (6, 9)], vec![(-4, 2), (4, 2)]]);
    }

    #[test]
    fn wrapped_record_matches_single_line() {
        let single = StrokeFont::parse("   32  7I[L[RFX[ RNTVT\n   33  1NV\n");
        let wrapped = StrokeFont::parse("   32  7I[L[RF\nX[ RNTVT\n   33  1NV\n");
        assert_eq!(wrapped.glyph(' '), single.glyph(' '));
        assert_eq!(wrapped.glyph('!'), single.glyph('!'));
    }

    #[test]
    fn layout_sits_on_the_baseline() {
        let font = StrokeFont::builtin();
        let lines = font.layout("H", 10.0, 50.0, UNITS_PER_EM);
        assert_eq!(lines.len(), 3);
        let (_, top, _, bottom) = bounds(&lines);
        assert_eq!(bottom, 50.0);
        assert_eq!(bottom - top, 21.0, "cap height in glyph units at scale 1");
    }

    #[test]
    fn right_aligned_text_ends_at_the_edge() {
        let font = StrokeFont::builtin();
        let size = 5.0;
        let lines = font.layout_right("Blue Trail", 190.0, 139.0, size);
        let (left, _, right, _) = bounds(&lines);
        let width = font.text_width("Blue Trail", size);
        assert!(right < 190.0 && right > 189.0, "ink stops one sidebearing short: {}", right);
        assert!(left >= 190.0 - width, "{} vs {}", left, 190.0 - width);
    }

    #[test]
    fn accented_letters_get_a_mark() {
        let font = StrokeFont::builtin();
        let plain = font.layout("e", 0.0, 0.0, UNITS_PER_EM);
        let marked = font.layout("é", 0.0, 0.0, UNITS_PER_EM);
        assert_eq!(marked.len(), plain.len() + 1);
        let (_, mark_top, _, _) = bounds(&marked[plain.len()..]);
        assert!(mark_top < f64::from(X_HEIGHT - BASELINE), "mark above the x-height");

        let i = font.layout("í", 0.0, 0.0, UNITS_PER_EM);
        assert_eq!(i.len(), 2, "stem and mark, no dot");
        assert_eq!(font.layout("ő", 0.0, 0.0, UNITS_PER_EM).len(), 3);
    }

    #[test]
    fn unknown_characters_take_a_space() {
        let font = StrokeFont::builtin();
        assert_eq!(font.text_width("a\u{2603}b", 5.0), font.text_width("a b", 5.0));
        assert_eq!(font.layout("a\u{2603}b", 0.0, 0.0, 5.0), font.layout("a b", 0.0, 0.0, 5.0));
    }
}
