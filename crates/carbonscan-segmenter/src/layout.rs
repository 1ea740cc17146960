//! Line reconstruction from positioned words

/// A word with its position on the page
///
/// `y` grows downward (top of page is 0), `x` grows rightward.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedWord {
    /// Word text
    pub text: String,
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
}

impl PositionedWord {
    /// Create a positioned word
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// Rebuild text lines from positioned words
///
/// Words whose top edge lies within `tolerance` of a line's first word join
/// that line. Lines are emitted top to bottom, words left to right.
///
/// ```
/// use carbonscan_segmenter::{reconstruct_lines, PositionedWord};
///
/// let words = vec![
///     PositionedWord::new("12,345", 200.0, 101.5),
///     PositionedWord::new("Scope", 10.0, 100.0),
///     PositionedWord::new("1", 50.0, 99.0),
///     PositionedWord::new("Total", 10.0, 130.0),
/// ];
/// assert_eq!(reconstruct_lines(&words, 3.0), "Scope 1 12,345\nTotal");
/// ```
pub fn reconstruct_lines(words: &[PositionedWord], tolerance: f32) -> String {
    let mut sorted: Vec<&PositionedWord> = words
        .iter()
        .filter(|word| !word.text.trim().is_empty())
        .collect();
    sorted.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<(f32, Vec<&PositionedWord>)> = Vec::new();
    for word in sorted {
        match lines.last_mut() {
            Some((anchor, line)) if (word.y - *anchor).abs() <= tolerance => line.push(word),
            _ => lines.push((word.y, vec![word])),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut line)| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            line.iter()
                .map(|word| word.text.trim())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
