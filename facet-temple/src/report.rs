//! Turning a [`Comparison`] into text.

use core::fmt::Write;

use owo_colors::OwoColorize;

use crate::Comparison;

/// Renders a comparison for humans.
pub trait Reporter {
    /// Render `comparison`. Called only for comparisons that do not match,
    /// but must not panic on matching ones.
    fn report(&self, comparison: &Comparison) -> String;
}

/// Single-line report: `extra fields [a, b] missing fields [c]`.
///
/// Either part is left out when its list is empty; with both present they are
/// separated by one space. This is the message of a validation
/// [`Mismatch`](crate::TempleErrorKind::Mismatch).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainReporter;

impl Reporter for PlainReporter {
    fn report(&self, comparison: &Comparison) -> String {
        let mut parts = Vec::with_capacity(2);
        if !comparison.extra.is_empty() {
            parts.push(format!("extra fields [{}]", comparison.extra.join(", ")));
        }
        if !comparison.missing.is_empty() {
            parts.push(format!("missing fields [{}]", comparison.missing.join(", ")));
        }
        parts.join(" ")
    }
}

/// Multi-line report, one label per line, colored with ANSI escapes.
///
/// ```text
/// missing fields (1):
///   - Address->Zip
/// extra fields (1):
///   + Root->Nickname
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AnsiReporter {
    colors: bool,
}

impl Default for AnsiReporter {
    fn default() -> Self {
        AnsiReporter { colors: true }
    }
}

impl AnsiReporter {
    /// A reporter that emits colors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the escapes off, keeping the layout.
    pub fn colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    fn section(&self, out: &mut String, title: &str, marker: char, labels: &[String]) {
        if labels.is_empty() {
            return;
        }
        let header = format!("{title} ({}):", labels.len());
        if self.colors {
            let _ = writeln!(out, "{}", header.bold());
        } else {
            let _ = writeln!(out, "{header}");
        }
        for label in labels {
            let line = format!("{marker} {label}");
            match (self.colors, marker) {
                (false, _) => {
                    let _ = writeln!(out, "  {line}");
                }
                (true, '-') => {
                    let _ = writeln!(out, "  {}", line.red());
                }
                (true, _) => {
                    let _ = writeln!(out, "  {}", line.yellow());
                }
            }
        }
    }
}

impl Reporter for AnsiReporter {
    fn report(&self, comparison: &Comparison) -> String {
        if comparison.is_match() {
            return if self.colors {
                format!("{}", "template and data fields match".green())
            } else {
                "template and data fields match".to_string()
            };
        }
        let mut out = String::new();
        self.section(&mut out, "missing fields", '-', &comparison.missing);
        self.section(&mut out, "extra fields", '+', &comparison.extra);
        out.truncate(out.trim_end().len());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(missing: &[&str], extra: &[&str]) -> Comparison {
        Comparison {
            missing: missing.iter().map(|s| s.to_string()).collect(),
            extra: extra.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn plain_joins_parts_with_one_space() {
        let both = comparison(&["A->B", "A->C"], &["Root->X"]);
        assert_eq!(
            PlainReporter.report(&both),
            "extra fields [Root->X] missing fields [A->B, A->C]"
        );
        assert_eq!(
            PlainReporter.report(&comparison(&[], &["Root->X", "Root->Y"])),
            "extra fields [Root->X, Root->Y]"
        );
        assert_eq!(
            PlainReporter.report(&comparison(&["Address->Zip"], &[])),
            "missing fields [Address->Zip]"
        );
        assert_eq!(PlainReporter.report(&comparison(&[], &[])), "");
    }

    #[test]
    fn ansi_colors_can_be_turned_off() {
        let report = AnsiReporter::new()
            .colors(false)
            .report(&comparison(&["Address->Zip"], &["Root->Nickname"]));
        assert_eq!(
            report,
            "missing fields (1):\n  - Address->Zip\nextra fields (1):\n  + Root->Nickname"
        );
        assert!(!report.contains('\u{1b}'));
    }

    #[test]
    fn ansi_emits_escapes() {
        let report = AnsiReporter::new().report(&comparison(&["A->B"], &[]));
        assert!(report.contains('\u{1b}'));
        assert!(report.contains("A->B"));
    }
}
