// ============================================================
// Layer 3 — Emotion Categories
// ============================================================
// FER2013 labels every face with one of seven emotions.
// The integer label in the CSV is the index into this list.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    /// All categories in label order
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    /// Map a class index back to its emotion.
    /// Returns None for indices outside the FER label set,
    /// which can happen when a model is trained with a custom class count.
    pub fn from_label(label: usize) -> Option<Self> {
        Self::ALL.get(label).copied()
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Emotion::Angry    => "Angry",
            Emotion::Disgust  => "Disgust",
            Emotion::Fear     => "Fear",
            Emotion::Happy    => "Happy",
            Emotion::Sad      => "Sad",
            Emotion::Surprise => "Surprise",
            Emotion::Neutral  => "Neutral",
        };
        f.write_str(name)
    }
}
