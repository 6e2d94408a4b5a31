//! Deterministic extraction progress.
//!
//! Progress is a pure function of (phase, page index, page count): the
//! rasterization phase owns a fixed share of the total and the recognition
//! phase owns the rest, each linear in page index. No timers, no simulated
//! increments. Because the two phases interleave per page, the raw values
//! alternate between the phase tracks; [`ProgressReporter`] forwards only
//! strictly increasing values, so observers see a monotonic sequence with
//! at least one report per page boundary.

/// Share of total progress owned by the rasterization phase.
///
/// Recognition dominates wall-clock on every corpus that matters, so it
/// gets the larger share.
pub(crate) const RASTER_WEIGHT: f64 = 0.4;

/// Progress on entering rasterization of `page`.
pub(crate) fn raster_entry(page: u32, pages: u32) -> f64 {
    RASTER_WEIGHT * f64::from(page) / f64::from(pages) * 100.0
}

/// Progress within recognition of `page`, at an engine-reported fraction.
pub(crate) fn recognition_within(page: u32, pages: u32, fraction: f32) -> f64 {
    let f = f64::from(fraction.clamp(0.0, 1.0));
    (RASTER_WEIGHT + (1.0 - RASTER_WEIGHT) * (f64::from(page - 1) + f) / f64::from(pages)) * 100.0
}

/// Progress after recognition of `page` completes.
pub(crate) fn recognition_done(page: u32, pages: u32) -> f64 {
    (RASTER_WEIGHT + (1.0 - RASTER_WEIGHT) * f64::from(page) / f64::from(pages)) * 100.0
}

/// Monotonic guard in front of the caller's progress callback.
///
/// Values are clamped to `[0, 100]` and forwarded only when strictly
/// greater than the last forwarded value, so a caller observing only the
/// latest value still sees monotonic advance and 100 is delivered at most
/// once.
pub(crate) struct ProgressReporter<F> {
    sink: F,
    last: f64,
}

impl<F: FnMut(f64)> ProgressReporter<F> {
    pub(crate) fn new(sink: F) -> Self {
        Self { sink, last: -1.0 }
    }

    pub(crate) fn report(&mut self, pct: f64) {
        let pct = pct.clamp(0.0, 100.0);
        if pct > self.last {
            self.last = pct;
            (self.sink)(pct);
        }
    }

    /// Engine-driven intermediate signal, held just under completion so the
    /// terminal 100 can only come from a finished call.
    pub(crate) fn report_partial(&mut self, pct: f64) {
        self.report(pct.min(99.5));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_weighting() {
        assert!((raster_entry(1, 5) - 8.0).abs() < 1e-9);
        assert!((raster_entry(5, 5) - 40.0).abs() < 1e-9);
        assert!((recognition_done(1, 5) - 52.0).abs() < 1e-9);
        assert!((recognition_done(5, 5) - 100.0).abs() < 1e-9);
        assert!((recognition_within(1, 5, 0.5) - 46.0).abs() < 1e-9);
    }

    #[test]
    fn test_recognition_fraction_stays_within_page_slice() {
        let start = recognition_within(3, 5, 0.0);
        let end = recognition_within(3, 5, 1.0);
        assert!((start - recognition_done(2, 5)).abs() < 1e-9);
        assert!((end - recognition_done(3, 5)).abs() < 1e-9);
        // Out-of-range engine fractions clamp.
        assert!((recognition_within(3, 5, 7.0) - end).abs() < 1e-9);
    }

    #[test]
    fn test_reporter_drops_regressions() {
        let mut seen = Vec::new();
        let mut reporter = ProgressReporter::new(|pct| seen.push(pct));
        reporter.report(8.0);
        reporter.report(52.0);
        reporter.report(16.0); // interleaved phase track, must not surface
        reporter.report(64.0);
        reporter.report(100.0);
        reporter.report(100.0);
        drop(reporter);
        assert_eq!(seen, vec![8.0, 52.0, 64.0, 100.0]);
    }

    #[test]
    fn test_reporter_clamps_bounds() {
        let mut seen = Vec::new();
        let mut reporter = ProgressReporter::new(|pct| seen.push(pct));
        reporter.report(-3.0);
        reporter.report(250.0);
        drop(reporter);
        assert_eq!(seen, vec![0.0, 100.0]);
    }

    #[test]
    fn test_partial_reports_never_reach_completion() {
        let mut seen = Vec::new();
        let mut reporter = ProgressReporter::new(|pct| seen.push(pct));
        reporter.report_partial(100.0);
        assert_eq!(seen, vec![99.5]);
    }
}
