//! Bellows dot display boundary.
//!
//! A row of dots that fills up with pressure. The view only consumes a
//! pressure value; it never feeds anything back into the engine.

/// Display model for the bellows dots.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BellowsView {
    /// Bellows pressure in [0, 1]
    pub pressure: f32,
    /// Number of dots
    pub count: usize,
    /// Sketchy, hand-drawn rendering style
    pub hand_drawn: bool,
}

impl BellowsView {
    pub const DEFAULT_COUNT: usize = 8;

    pub fn new(pressure: f32, count: usize) -> Self {
        let pressure = if pressure.is_nan() { 0.0 } else { pressure.clamp(0.0, 1.0) };
        Self {
            pressure,
            count,
            hand_drawn: true,
        }
    }

    pub fn with_hand_drawn(mut self, hand_drawn: bool) -> Self {
        self.hand_drawn = hand_drawn;
        self
    }

    /// Fill level of each dot, left to right. Only the boundary dot is partial.
    pub fn dot_levels(&self) -> impl Iterator<Item = f32> + '_ {
        let filled = self.pressure * self.count as f32;
        (0..self.count).map(move |i| (filled - i as f32).clamp(0.0, 1.0))
    }

    /// Number of dots at least half full.
    pub fn lit_dots(&self) -> usize {
        self.dot_levels().filter(|&level| level >= 0.5).count()
    }
}

impl Default for BellowsView {
    fn default() -> Self {
        Self::new(0.0, Self::DEFAULT_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_full() {
        assert_eq!(BellowsView::new(0.0, 8).lit_dots(), 0);
        assert_eq!(BellowsView::new(1.0, 8).lit_dots(), 8);
    }

    #[test]
    fn boundary_dot_is_partial() {
        let view = BellowsView::new(0.3, 10);
        let levels: Vec<f32> = view.dot_levels().collect();
        assert_eq!(levels[0], 1.0);
        assert_eq!(levels[2], 1.0);
        assert!(levels[3] < 0.01);
        assert_eq!(view.lit_dots(), 3);
    }

    #[test]
    fn pressure_is_clamped() {
        assert_eq!(BellowsView::new(3.0, 4).pressure, 1.0);
        assert_eq!(BellowsView::new(f32::NAN, 4).pressure, 0.0);
    }
}
