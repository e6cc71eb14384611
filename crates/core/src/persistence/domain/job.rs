use serde::{Deserialize, Serialize};

use crate::timeline::domain::segment::Segment;

/// A transcription job as returned by the job service.
///
/// Only the fields the editor needs are modelled; unknown fields are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub sentences: Option<Vec<Sentence>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Wire form of one segment.
///
/// `index` is optional on ingest (some producers rely on array order) and
/// always written on save. Translation and accuracy are read when present
/// but never written back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing)]
    pub translated_text: Option<String>,
    #[serde(default, skip_serializing)]
    pub accuracy: Option<f32>,
}

/// Body of the "update sentences" request.
#[derive(Debug, Serialize)]
pub struct SentencesUpdate<'a> {
    pub sentences: &'a [Sentence],
}

/// Body of the "refine" response. Absent and empty both mean "no change".
#[derive(Debug, Default, Deserialize)]
pub struct RefineResponse {
    #[serde(default)]
    pub sentences: Option<Vec<Sentence>>,
}

impl Sentence {
    pub fn from_segment(segment: &Segment) -> Self {
        Self {
            index: Some(segment.index),
            start: segment.start,
            end: segment.end,
            text: segment.text.clone(),
            translated_text: None,
            accuracy: None,
        }
    }
}

/// Converts ingested sentences into segments, ordered by explicit index
/// when every sentence carries one, otherwise by array order.
///
/// The caller still sorts by start and re-indexes (see
/// [`SegmentList::from_segments`](crate::timeline::domain::segment_list::SegmentList::from_segments)).
pub fn segments_from_sentences(mut sentences: Vec<Sentence>) -> Vec<Segment> {
    if !sentences.is_empty() && sentences.iter().all(|s| s.index.is_some()) {
        sentences.sort_by_key(|s| s.index);
    }

    sentences
        .into_iter()
        .enumerate()
        .map(|(position, s)| Segment {
            index: position,
            start: s.start,
            end: s.end,
            text: s.text,
            translated_text: s.translated_text.filter(|t| !t.is_empty()),
            locked: false,
            accuracy: s.accuracy.map(|a| a.clamp(0.0, 1.0)),
        })
        .collect()
}

pub fn sentences_from_segments(segments: &[Segment]) -> Vec<Sentence> {
    segments.iter().map(Sentence::from_segment).collect()
}
