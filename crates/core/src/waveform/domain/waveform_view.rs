use super::region::WaveRegion;

/// Domain interface for the external waveform renderer.
///
/// Implementations draw whatever regions they are given and report drags
/// back as [`RegionDragEnd`] events. They never own segment state, so a
/// renderer can be torn down and recreated (e.g. on resize) at any time.
pub trait WaveformView {
    /// Replace every drawn region with `regions`.
    fn render_regions(&mut self, regions: &[WaveRegion]);

    /// Enable or disable drag/resize handles on all regions.
    fn set_interactive(&mut self, interactive: bool);
}

/// A finished drag or resize gesture on one region.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionDragEnd {
    pub region_id: String,
    pub start: f64,
    pub end: f64,
}

impl RegionDragEnd {
    pub fn new(region_id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            region_id: region_id.into(),
            start,
            end,
        }
    }
}
