use crate::range::{HighlightBand, StepIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Major,
    Minor,
}

impl Emphasis {
    pub fn for_index(index: StepIndex, major_every: usize) -> Self {
        if major_every > 0 && *index % major_every == 0 {
            Self::Major
        } else {
            Self::Minor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Selected,
    InRange,
    Neutral,
}

impl Tone {
    /// Colour class of a tick, by priority:
    /// 1. Selected (current value)
    /// 2. InRange (inside the highlight band)
    /// 3. Neutral
    pub fn resolve(
        index: StepIndex,
        value: f64,
        selected: StepIndex,
        band: Option<&HighlightBand>,
    ) -> Self {
        if index == selected {
            Self::Selected
        } else if band.is_some_and(|b| b.contains(value)) {
            Self::InRange
        } else {
            Self::Neutral
        }
    }
}

/// One tick of the dial as it should be drawn right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: StepIndex,
    pub value: f64,
    /// Clockwise offset from the indicator, degrees in `[-180, 180)`.
    pub offset: f64,
    pub emphasis: Emphasis,
    pub tone: Tone,
    /// Inside the unmasked arc around the indicator.
    pub visible: bool,
}

impl Tick {
    pub fn is_major(&self) -> bool {
        self.emphasis == Emphasis::Major
    }
}
