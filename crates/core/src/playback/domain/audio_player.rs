/// Domain interface for the external audio element.
///
/// Implementations forward to whatever actually produces sound. Time-update
/// ticks are delivered separately to
/// [`BoundedPlayback::on_time_update`](super::bounded_playback::BoundedPlayback::on_time_update).
pub trait AudioPlayer: Send {
    fn seek(&mut self, seconds: f64);
    fn play(&mut self);
    fn pause(&mut self);
    fn current_time(&self) -> f64;
}
