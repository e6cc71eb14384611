/// One time-bounded, text-bearing unit of the aligned transcript.
///
/// `index` mirrors the segment's position in its [`SegmentList`] and is
/// rewritten after every structural edit.
///
/// [`SegmentList`]: super::segment_list::SegmentList
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub translated_text: Option<String>,
    pub locked: bool,
    /// Alignment provenance score in `[0, 1]`. Display only.
    pub accuracy: Option<f32>,
}

/// Which transcript of a segment a text edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Text,
    TranslatedText,
}

impl Segment {
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
            translated_text: None,
            locked: false,
            accuracy: None,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Half-open containment: `start <= time < end`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    /// True when the range is empty, inverted, or not a finite number.
    pub fn is_degenerate(&self) -> bool {
        !self.start.is_finite() || !self.end.is_finite() || self.end <= self.start
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn set_text(&mut self, field: TextField, value: String) {
        match field {
            TextField::Text => self.text = value,
            TextField::TranslatedText => {
                self.translated_text = if value.is_empty() { None } else { Some(value) };
            }
        }
    }
}
