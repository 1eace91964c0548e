//! Static font-metric tables for the two page font families.
//!
//! Widths are the Adobe standard-14 AFM advance widths divided by 1000, i.e. em units
//! relative to the font size. The exporter writes the same base fonts into the PDF, so
//! regular-face line widths match the exported page exactly.
//!
//! Bold and italic faces are approximated from the regular table with a width factor,
//! while the PDF draws the real bold and italic fonts. Their exported widths can differ
//! from the measured ones by a few percent.
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Font family and face
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    /// Classic serif page; the default look.
    Times,
    /// Sans-serif page.
    Helvetica,
}

impl FontFamily {
    /// PostScript base font name for the given face.
    pub fn base_font(&self, face: FontFace) -> &'static str {
        match (self, face) {
            (FontFamily::Times, FontFace::Regular) => "Times-Roman",
            (FontFamily::Times, FontFace::Bold) => "Times-Bold",
            (FontFamily::Times, FontFace::Italic) => "Times-Italic",
            (FontFamily::Helvetica, FontFace::Regular) => "Helvetica",
            (FontFamily::Helvetica, FontFace::Bold) => "Helvetica-Bold",
            (FontFamily::Helvetica, FontFace::Italic) => "Helvetica-Oblique",
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontFamily::Times => f.write_str("times"),
            FontFamily::Helvetica => f.write_str("helvetica"),
        }
    }
}

impl FromStr for FontFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "times" => Ok(FontFamily::Times),
            "helvetica" => Ok(FontFamily::Helvetica),
            other => Err(format!("unknown font family '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFace {
    Regular,
    Bold,
    Italic,
}

impl FontFace {
    fn width_factor(&self) -> f32 {
        match self {
            FontFace::Regular => 1.0,
            FontFace::Bold => 1.06,
            FontFace::Italic => 0.98,
        }
    }
}

/// Width of the ◊ separator glyph, drawn from the Symbol font.
pub const SEPARATOR_WIDTH_EM: f32 = 0.494;

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font family.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    pub font: FontFamily,
    widths: [f32; 95],
    /// Fallback width for non-ASCII characters.
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    /// Measures a string in em units for the given face.
    pub fn measure_str(&self, s: &str, face: FontFace) -> f32 {
        let raw: f32 = s
            .chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum();
        raw * face.width_factor()
    }

    /// Greedy word-wrap of `text` into lines no wider than `max_width_em`.
    ///
    /// A single word wider than the line gets a line of its own. Whitespace runs
    /// collapse to one space. Empty input yields no lines.
    pub fn wrap(&self, text: &str, face: FontFace, max_width_em: f32) -> Vec<String> {
        self.wrap_hanging(text, face, max_width_em, max_width_em)
    }

    /// Greedy word-wrap where the first line is `first_width_em` wide and every later
    /// line `width_em` wide (text following an inline label).
    pub fn wrap_hanging(
        &self,
        text: &str,
        face: FontFace,
        first_width_em: f32,
        width_em: f32,
    ) -> Vec<String> {
        let space_w = self.space_width * face.width_factor();
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in text.split_whitespace() {
            let word_w = self.measure_str(word, face);
            let max_width_em = if lines.is_empty() {
                first_width_em
            } else {
                width_em
            };
            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + space_w + word_w > max_width_em {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space_w + word_w;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

/// Times-Roman.
static TIMES_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::Times,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.250, 0.333, 0.408, 0.500, 0.500, 0.833, 0.778, 0.333, 0.333, 0.333, 0.500, 0.564, 0.250, 0.333, 0.250, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.564, 0.564, 0.564, 0.444, 0.921,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.667, 0.667, 0.722, 0.611, 0.556, 0.722, 0.722, 0.333, 0.389, 0.722, 0.611, 0.889,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.722, 0.556, 0.722, 0.667, 0.556, 0.611, 0.722, 0.722, 0.944, 0.722, 0.722, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.469, 0.500, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.444, 0.500, 0.444, 0.500, 0.444, 0.333, 0.500, 0.500, 0.278, 0.278, 0.500, 0.278, 0.778,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.500, 0.500, 0.500, 0.500, 0.333, 0.389, 0.278, 0.500, 0.500, 0.722, 0.500, 0.500, 0.444,
        // {      |      }      ~
        0.480, 0.200, 0.480, 0.541,
    ],
    average_char_width: 0.47,
    space_width: 0.250,
};

/// Helvetica.
static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::Helvetica,
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.222, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.222,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.53,
    space_width: 0.278,
};

/// Returns the static metric table for a given font family.
pub fn get_metrics(font: FontFamily) -> &'static FontMetricTable {
    match font {
        FontFamily::Times => &TIMES_TABLE,
        FontFamily::Helvetica => &HELVETICA_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        let metrics = get_metrics(FontFamily::Times);
        assert_eq!(metrics.measure_str("", FontFace::Regular), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        let metrics = get_metrics(FontFamily::Times);
        // "Rust" = R(0.667) + u(0.500) + s(0.389) + t(0.278) = 1.834
        let width = metrics.measure_str("Rust", FontFace::Regular);
        assert!((width - 1.834).abs() < 1e-3, "got {width}");
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let metrics = get_metrics(FontFamily::Helvetica);
        assert!(
            metrics.measure_str("Projects", FontFace::Bold)
                > metrics.measure_str("Projects", FontFace::Regular)
        );
    }

    #[test]
    fn test_measure_str_non_ascii_falls_back() {
        let metrics = get_metrics(FontFamily::Times);
        let width = metrics.measure_str("é", FontFace::Regular);
        assert!((width - metrics.average_char_width).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_empty_yields_no_lines() {
        let metrics = get_metrics(FontFamily::Times);
        assert!(metrics.wrap("   ", FontFace::Regular, 40.0).is_empty());
    }

    #[test]
    fn test_wrap_respects_width() {
        let metrics = get_metrics(FontFamily::Times);
        let text = "word ".repeat(40);
        let lines = metrics.wrap(&text, FontFace::Regular, 20.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(metrics.measure_str(line, FontFace::Regular) <= 20.0 + 1e-3);
        }
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text.trim_end());
    }

    #[test]
    fn test_wrap_overlong_word_gets_own_line() {
        let metrics = get_metrics(FontFamily::Times);
        let lines = metrics.wrap("a supercalifragilistic b", FontFace::Regular, 3.0);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_wider_line_never_needs_more_lines() {
        let metrics = get_metrics(FontFamily::Helvetica);
        let text = "Architected a distributed caching layer using Redis and consistent hashing \
                    reducing p99 latency by forty percent under peak load across services";
        let mut previous = usize::MAX;
        for width in [10.0, 15.0, 20.0, 30.0, 45.0, 80.0] {
            let count = metrics.wrap(text, FontFace::Regular, width).len();
            assert!(count <= previous, "width {width} produced more lines");
            previous = count;
        }
    }

    #[test]
    fn test_font_family_parse() {
        assert_eq!("Times".parse::<FontFamily>().unwrap(), FontFamily::Times);
        assert_eq!("helvetica".parse::<FontFamily>().unwrap(), FontFamily::Helvetica);
        assert!("comic".parse::<FontFamily>().is_err());
    }
}
