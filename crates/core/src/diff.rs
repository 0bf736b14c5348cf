// Positional (index-aligned) line differencer. Deliberately not a
// minimal edit-distance diff: a single inserted line shows every
// subsequent line as a remove/add pair. Output order is display order.

/// Records emitted past this cap are collapsed into one summary row.
pub const MAX_DIFF_LINES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Unchanged,
    Removed,
    Added,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: DiffKind,
    /// Old-side number for Unchanged/Removed, new-side number for Added.
    /// Counters start at 1 and advance independently per side.
    pub line_number: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffRow {
    Line(DiffLine),
    Truncated { omitted: usize },
}

pub fn diff_lines(old: &str, new: &str) -> Vec<DiffRow> {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();
    let total = old_lines.len().max(new_lines.len());

    let mut rows = Vec::new();
    let mut old_num = 1usize;
    let mut new_num = 1usize;
    for i in 0..total.min(MAX_DIFF_LINES) {
        let old_line = old_lines.get(i);
        let new_line = new_lines.get(i);
        match (old_line, new_line) {
            (Some(o), Some(n)) if o == n => {
                rows.push(DiffRow::Line(DiffLine {
                    kind: DiffKind::Unchanged,
                    line_number: old_num,
                    text: (*n).to_string(),
                }));
                old_num += 1;
                new_num += 1;
            }
            _ => {
                if let Some(o) = old_line {
                    rows.push(DiffRow::Line(DiffLine {
                        kind: DiffKind::Removed,
                        line_number: old_num,
                        text: (*o).to_string(),
                    }));
                    old_num += 1;
                }
                if let Some(n) = new_line {
                    rows.push(DiffRow::Line(DiffLine {
                        kind: DiffKind::Added,
                        line_number: new_num,
                        text: (*n).to_string(),
                    }));
                    new_num += 1;
                }
            }
        }
    }
    if total > MAX_DIFF_LINES {
        rows.push(DiffRow::Truncated {
            omitted: total - MAX_DIFF_LINES,
        });
    }
    rows
}

/// Plain-text rendering: gutter char, right-aligned line number, content.
pub fn render_diff(rows: &[DiffRow]) -> String {
    let mut out = String::new();
    for row in rows {
        match row {
            DiffRow::Line(line) => {
                let gutter = match line.kind {
                    DiffKind::Unchanged => ' ',
                    DiffKind::Removed => '-',
                    DiffKind::Added => '+',
                };
                out.push_str(&format!("{gutter}{:>4} {}\n", line.line_number, line.text));
            }
            DiffRow::Truncated { omitted } => {
                out.push_str(&format!("  ... ({omitted} more lines)\n"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(kind: DiffKind, number: usize, text: &str) -> DiffRow {
        DiffRow::Line(DiffLine {
            kind,
            line_number: number,
            text: text.to_string(),
        })
    }

    #[test]
    fn substituted_middle_line() {
        let rows = diff_lines("a\nb\nc", "a\nX\nc");
        assert_eq!(
            rows,
            vec![
                line(DiffKind::Unchanged, 1, "a"),
                line(DiffKind::Removed, 2, "b"),
                line(DiffKind::Added, 2, "X"),
                line(DiffKind::Unchanged, 3, "c"),
            ]
        );
    }

    #[test]
    fn counters_match_lines_consumed() {
        let rows = diff_lines("a\nb\nc\nd", "a\nq");
        let old_consumed = rows
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    DiffRow::Line(DiffLine {
                        kind: DiffKind::Unchanged | DiffKind::Removed,
                        ..
                    })
                )
            })
            .count();
        let new_consumed = rows
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    DiffRow::Line(DiffLine {
                        kind: DiffKind::Unchanged | DiffKind::Added,
                        ..
                    })
                )
            })
            .count();
        assert_eq!(old_consumed, 4);
        assert_eq!(new_consumed, 2);
    }

    #[test]
    fn record_count_is_max_side_when_under_cap() {
        let old = "a\nb\nc";
        let new = "a\nb";
        assert_eq!(diff_lines(old, new).len(), 3);
        assert_eq!(diff_lines(old, old).len(), 3);
    }

    #[test]
    fn truncates_past_one_hundred_lines() {
        let old: String = (0..150).map(|i| format!("line {i}\n")).collect();
        let old = old.trim_end().to_string();
        let new = old.clone();
        let rows = diff_lines(&old, &new);
        assert_eq!(rows.len(), 101);
        assert_eq!(rows[100], DiffRow::Truncated { omitted: 50 });
        assert!(render_diff(&rows).contains("(50 more lines)"));
    }

    #[test]
    fn empty_line_still_emits_a_record() {
        let rows = diff_lines("", "");
        assert_eq!(rows, vec![line(DiffKind::Unchanged, 1, "")]);
    }

    #[test]
    fn trailing_insertion_only_adds() {
        let rows = diff_lines("a", "a\nb");
        assert_eq!(
            rows,
            vec![line(DiffKind::Unchanged, 1, "a"), line(DiffKind::Added, 2, "b")]
        );
    }

    #[test]
    fn render_gutters() {
        let rendered = render_diff(&diff_lines("a\nb", "a\nc"));
        assert!(rendered.contains("   1 a"));
        assert!(rendered.contains("-   2 b"));
        assert!(rendered.contains("+   2 c"));
    }
}
