// Diff report types - the wire contract for comparison results
//
// A successful comparison serializes to
// `{success, summary, details: {additions, removals, modifications, diffs}}`;
// a failed one to `{success: false, error}`.

use serde::Serialize;

// ─────────────────────────────────────────────────────────────────────────────
// Change lines
// ─────────────────────────────────────────────────────────────────────────────

/// Classification of a single diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Addition,
    Removal,
    Modification,
}

impl ChangeKind {
    /// Leading marker used when rendering the line
    pub fn marker(self) -> char {
        match self {
            ChangeKind::Addition => '+',
            ChangeKind::Removal => '-',
            ChangeKind::Modification => '~',
        }
    }
}

/// One emitted change description
///
/// Nested lines are indented detail under a parent entry (per-node changes
/// under a modified graph) and are excluded from the summary counts.
#[derive(Debug, Clone)]
pub struct DiffLine {
    pub kind: ChangeKind,
    pub text: String,
    pub nested: bool,
}

impl DiffLine {
    pub fn top(kind: ChangeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            nested: false,
        }
    }

    pub fn nested(kind: ChangeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            nested: true,
        }
    }

    /// Render with the classification marker, indenting nested detail
    pub fn render(&self) -> String {
        let indent = if self.nested { "    " } else { "" };
        format!("{}{} {}", indent, self.kind.marker(), self.text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────────────────────────

/// Counts plus the ordered list of rendered change lines
#[derive(Debug, Clone, Serialize)]
pub struct DiffDetails {
    pub additions: usize,
    pub removals: usize,
    pub modifications: usize,
    pub diffs: Vec<String>,
}

/// A completed comparison
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub success: bool,
    pub summary: String,
    pub details: DiffDetails,
}

impl DiffReport {
    /// Build a report from emitted lines plus the two blueprint names.
    ///
    /// Counts cover top-level lines only; nested node detail is rendered but
    /// not counted.
    pub fn from_lines(name_a: &str, name_b: &str, lines: Vec<DiffLine>) -> Self {
        let count = |kind: ChangeKind| {
            lines
                .iter()
                .filter(|l| !l.nested && l.kind == kind)
                .count()
        };
        let additions = count(ChangeKind::Addition);
        let removals = count(ChangeKind::Removal);
        let modifications = count(ChangeKind::Modification);

        let rendered: Vec<String> = lines.iter().map(DiffLine::render).collect();

        let mut summary = format!("Comparing {} vs {}\n", name_a, name_b);
        summary.push_str(&format!(
            "Changes: +{} added, -{} removed, ~{} modified\n",
            additions, removals, modifications
        ));
        summary.push_str(&"-".repeat(60));
        summary.push('\n');
        if rendered.is_empty() {
            summary.push_str("No differences found.");
        } else {
            summary.push_str(&rendered.join("\n"));
        }

        Self {
            success: true,
            summary,
            details: DiffDetails {
                additions,
                removals,
                modifications,
                diffs: rendered,
            },
        }
    }

    /// True when no changes at all were detected
    pub fn is_empty(&self) -> bool {
        self.details.diffs.is_empty()
    }
}

/// A comparison that could not run (unreadable input), with no partial diff
#[derive(Debug, Clone, Serialize)]
pub struct DiffFailure {
    pub success: bool,
    pub error: String,
}

/// Outcome of comparing two documents supplied as raw JSON text
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DiffOutcome {
    Report(DiffReport),
    Failure(DiffFailure),
}

impl DiffOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        DiffOutcome::Failure(DiffFailure {
            success: false,
            error: error.into(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
