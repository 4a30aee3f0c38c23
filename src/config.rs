//! Tunables for analysis and reporting, filled in from the command line.

pub const DEFAULT_WARNING_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Subtrees whose max depth meets or exceeds this are flagged.
    pub warning_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub full_paths: bool,
    /// Segments kept at the front/back of a truncated path.
    pub path_head: usize,
    pub path_tail: usize,
    pub deepest_samples: usize,
    pub warning_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { warning_depth: DEFAULT_WARNING_DEPTH }
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            full_paths: false,
            path_head: 2,
            path_tail: 2,
            deepest_samples: 3,
            warning_samples: 5,
        }
    }
}

impl ReportOptions {
    pub fn render_path(&self, path: &crate::path::TagPath) -> String {
        if self.full_paths {
            path.to_string()
        } else {
            path.truncated(self.path_head, self.path_tail)
        }
    }
}
