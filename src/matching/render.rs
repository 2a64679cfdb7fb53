//! Pure projection of session state onto per-word visual states.

use std::collections::BTreeSet;

use serde::Serialize;

/// Visual state of one expected word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WordState {
    Plain,
    Highlighted,
    Current,
}

/// One rendered word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordView {
    pub index: usize,
    pub text: String,
    pub state: WordState,
}

/// Project words onto visual states.
///
/// The word at `current` is `Current` even if it is also highlighted; other
/// words in `highlighted` are `Highlighted`; everything else is `Plain`.
pub fn render_state(words: &[String], current: Option<usize>, highlighted: &BTreeSet<usize>) -> Vec<WordView> {
    words
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let state = if current == Some(index) {
                WordState::Current
            } else if highlighted.contains(&index) {
                WordState::Highlighted
            } else {
                WordState::Plain
            };
            WordView { index, text: text.clone(), state }
        })
        .collect()
}

/// Completion percentage, rounded to the nearest integer.
pub fn progress_percent(cursor: usize, len: usize) -> u8 {
    if len == 0 {
        return 0;
    }
    let cursor = cursor.min(len);
    ((cursor as f64 / len as f64) * 100.0).round() as u8
}

/// Render a projection as one line of text: `[read]` words are highlighted,
/// `>next<` marks the current word.
pub fn to_text_line(views: &[WordView]) -> String {
    views
        .iter()
        .map(|view| match view.state {
            WordState::Plain => view.text.clone(),
            WordState::Highlighted => format!("[{}]", view.text),
            WordState::Current => format!(">{}<", view.text),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
