//! Series color assignment.
//!
//! Within one dashboard every series of the same region/zone gets the same
//! color, whichever configuration it belongs to. Colors are handed out in
//! palette order on first sight of a key.

use std::collections::HashMap;

use tracing::warn;

/// Ordered series palette.
pub const COLOR_PALETTE: [&str; 20] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf", "#aec7e8", "#ffbb78", "#98df8a", "#ff9896", "#c5b0d5", "#c49c94",
    "#f7b6d2", "#c7c7c7", "#dbdb8d", "#9edae5",
];

/// Per-pass `(region, zone)` → color table.
///
/// Once all palette entries are taken, assignment wraps around to the
/// start of the palette.
#[derive(Debug, Default)]
pub struct ColorAssigner {
    assigned: HashMap<(String, String), &'static str>,
    next: usize,
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for a region, or for a zone within it.
    pub fn assign(&mut self, region: &str, zone: Option<&str>) -> &'static str {
        let key = (region.to_string(), zone.unwrap_or_default().to_string());
        if let Some(color) = self.assigned.get(&key) {
            return *color;
        }

        if self.next == COLOR_PALETTE.len() {
            warn!(
                keys = self.next + 1,
                palette = COLOR_PALETTE.len(),
                "series palette exhausted, reusing colors"
            );
        }
        let color = COLOR_PALETTE[self.next % COLOR_PALETTE.len()];
        self.next += 1;
        self.assigned.insert(key, color);
        color
    }

    /// Number of distinct keys seen in this pass.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_wins() {
        let mut colors = ColorAssigner::new();
        let keys = ["a", "b", "a", "c", "b"];
        let assigned: Vec<&str> = keys.iter().map(|k| colors.assign(k, None)).collect();

        assert_eq!(
            assigned,
            vec![
                COLOR_PALETTE[0],
                COLOR_PALETTE[1],
                COLOR_PALETTE[0],
                COLOR_PALETTE[2],
                COLOR_PALETTE[1]
            ]
        );
        assert_eq!(colors.len(), 3);
    }

    #[test]
    fn zone_keys_differ_from_region_keys() {
        let mut colors = ColorAssigner::new();
        let region = colors.assign("us-east-1", None);
        let zone = colors.assign("us-east-1", Some("use1-az1"));
        let again = colors.assign("us-east-1", Some("use1-az1"));

        assert_ne!(region, zone);
        assert_eq!(zone, again);
    }

    #[test]
    fn region_and_zone_strings_do_not_collide() {
        let mut colors = ColorAssigner::new();
        let a = colors.assign("us-east-1", Some("a"));
        let b = colors.assign("us-east-1a", None);
        assert_ne!(a, b);
    }

    #[test]
    fn palette_wraps_after_twenty_keys() {
        let mut colors = ColorAssigner::new();
        for i in 0..COLOR_PALETTE.len() {
            assert_eq!(colors.assign(&format!("region-{i}"), None), COLOR_PALETTE[i]);
        }
        assert_eq!(colors.assign("region-20", None), COLOR_PALETTE[0]);
        assert_eq!(colors.assign("region-21", None), COLOR_PALETTE[1]);
        // Earlier keys keep their colors.
        assert_eq!(colors.assign("region-5", None), COLOR_PALETTE[5]);
    }

    #[test]
    fn new_pass_starts_from_the_first_color() {
        let mut first = ColorAssigner::new();
        first.assign("eu-west-1", None);
        first.assign("us-east-1", None);

        let mut second = ColorAssigner::new();
        assert_eq!(second.assign("us-east-1", None), COLOR_PALETTE[0]);
    }
}
