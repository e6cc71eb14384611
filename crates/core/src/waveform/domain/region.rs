use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCKED_COLOR: &str = "rgba(239, 68, 68, 0.25)";
pub const DEFAULT_ACTIVE_COLOR: &str = "rgba(34, 197, 94, 0.30)";
pub const DEFAULT_REGION_COLOR: &str = "rgba(59, 130, 246, 0.20)";

/// Fill colors handed to the waveform renderer, one per region state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionPalette {
    pub locked: String,
    pub active: String,
    pub default: String,
}

impl Default for RegionPalette {
    fn default() -> Self {
        Self {
            locked: DEFAULT_LOCKED_COLOR.to_string(),
            active: DEFAULT_ACTIVE_COLOR.to_string(),
            default: DEFAULT_REGION_COLOR.to_string(),
        }
    }
}

/// Visual state of a region. Lock wins over active highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Locked,
    Active,
    Idle,
}

impl RegionPalette {
    pub fn color_for(&self, state: RegionState) -> &str {
        match state {
            RegionState::Locked => &self.locked,
            RegionState::Active => &self.active,
            RegionState::Idle => &self.default,
        }
    }
}

/// A drawable time range in the waveform, derived from one segment.
///
/// The id is the segment index rendered as a string; the renderer echoes it
/// back in drag events.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveRegion {
    pub id: String,
    pub start: f64,
    pub end: f64,
    pub color: String,
    pub draggable: bool,
    pub resizable: bool,
}

impl WaveRegion {
    pub fn id_for(index: usize) -> String {
        index.to_string()
    }

    /// Parses a region id back into a segment index.
    ///
    /// Only ids in the exact form produced by [`WaveRegion::id_for`] map
    /// back to an index; anything else belongs to someone else.
    pub fn parse_id(id: &str) -> Option<usize> {
        id.parse::<usize>()
            .ok()
            .filter(|index| Self::id_for(*index) == id)
    }
}
