use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Dedup,
    Triangulate,
    Connectivity,
    CenterMesh,
    MaskFilter,
    Fraction,
    PoleFix,
}

/// Error metrics of a remapped field against its analytical reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MisfitMetrics {
    pub mean_misfit: f64,
    pub max_misfit: f64,
    pub rms_misfit: f64,
    pub l_min: f64,
    pub l_max: f64,
    pub glob_cons_src: f64,
    pub glob_cons_tgt: f64,
}

impl MisfitMetrics {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Counters of the center-mesh heuristic. Candidates that lose against the
/// edge budget are silently dropped by the algorithm, so they are tallied here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangulationReport {
    pub quads: usize,
    pub exclusive_accepted: usize,
    pub exclusive_rejected: usize,
    pub optional_accepted: usize,
    pub optional_rejected: usize,
    pub fallback_cells: usize,
    pub fallback_accepted: usize,
    pub uncovered_cells: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractionReport {
    pub computed: usize,
    pub degenerate: usize,
    pub invalid_hull: usize,
    pub no_candidates: usize,
    pub zero_area: usize,
}

impl FractionReport {
    pub fn skipped(&self) -> usize {
        self.degenerate + self.invalid_hull + self.no_candidates + self.zero_area
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.computed += other.computed;
        self.degenerate += other.degenerate;
        self.invalid_hull += other.invalid_hull;
        self.no_candidates += other.no_candidates;
        self.zero_area += other.zero_area;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterReport {
    pub cells: usize,
    pub valid: usize,
    pub degenerate: usize,
    pub failed_triangulation: usize,
    pub duplicate_centers: usize,
    pub triangulation: Option<TriangulationReport>,
    pub fraction: Option<FractionReport>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoleFixReport {
    pub pole_added: bool,
    pub cap_points: usize,
    pub cap_triangles: usize,
    pub discarded_triangles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_json_uses_field_names() {
        let metrics = MisfitMetrics {
            mean_misfit: 0.1,
            max_misfit: 0.5,
            rms_misfit: 0.2,
            l_min: 0.0,
            l_max: 0.01,
            glob_cons_src: 1e-3,
            glob_cons_tgt: 2e-3,
        };
        let json = metrics.to_json().unwrap();
        for key in [
            "mean_misfit",
            "max_misfit",
            "rms_misfit",
            "l_min",
            "l_max",
            "glob_cons_src",
            "glob_cons_tgt",
        ] {
            assert!(json.contains(key), "missing {key}");
        }
        let back: MisfitMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metrics);
    }

    #[test]
    fn fraction_report_merge_and_skipped() {
        let a = FractionReport { computed: 3, degenerate: 1, ..Default::default() };
        let b = FractionReport { computed: 2, no_candidates: 2, zero_area: 1, ..Default::default() };
        let merged = a.merge(b);
        assert_eq!(merged.computed, 5);
        assert_eq!(merged.skipped(), 4);
    }
}
