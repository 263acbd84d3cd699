//! Source excerpts for diagnostics
//!
//! Renders a few numbered lines around a failure with the failing column
//! emphasized, the way compilers show a caret under the offending token.

use stylekit_core::config::ContextConfig;

use crate::style::{HIGHLIGHT, RESET, UNDERLINE};

/// Render the lines around `line`:`column` (both 1-based).
///
/// Each row reads `"<line>: <content>"`. On the target row exactly one
/// character is wrapped in underline and highlight escapes. Windows that run
/// off either end of the source are clamped; a line outside the source
/// yields whatever part of the window still exists.
pub fn extract_context(
    source: &str,
    line: usize,
    column: usize,
    window: ContextConfig,
) -> Vec<String> {
    let lines: Vec<&str> = source.lines().collect();
    let start = line.saturating_sub(window.before.saturating_add(1));
    let end = lines.len().min(line.saturating_add(window.after));

    (start..end)
        .map(|index| {
            let number = index + 1;
            if number == line {
                format!("{}: {}", number, mark_column(lines[index], column))
            } else {
                format!("{}: {}", number, lines[index])
            }
        })
        .collect()
}

fn mark_column(content: &str, column: usize) -> String {
    let index = column.max(1) - 1;
    let mut before = String::new();
    let mut target = None;
    let mut after = String::new();

    for (i, ch) in content.chars().enumerate() {
        match i.cmp(&index) {
            std::cmp::Ordering::Less => before.push(ch),
            std::cmp::Ordering::Equal => target = Some(ch),
            std::cmp::Ordering::Greater => after.push(ch),
        }
    }

    // Past the end of the line: mark a space so the position stays visible.
    let target = target.unwrap_or(' ');
    format!("{before}{UNDERLINE}{HIGHLIGHT}{target}{RESET}{after}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::strip_ansi;
    use rstest::rstest;

    #[test]
    fn test_three_lines_around_middle() {
        let rows = extract_context("a\nb\nc", 2, 1, ContextConfig::default());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], "1: a");
        assert_eq!(rows[1], format!("2: {UNDERLINE}{HIGHLIGHT}b{RESET}"));
        assert_eq!(rows[2], "3: c");
    }

    #[test]
    fn test_clamps_at_first_line() {
        let rows = extract_context("a\nb\nc", 1, 1, ContextConfig::default());
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("1: "));
        assert_eq!(rows[1], "2: b");
    }

    #[test]
    fn test_clamps_at_last_line() {
        let rows = extract_context("a\nb\nc", 3, 1, ContextConfig::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "2: b");
    }

    #[rstest]
    #[case(1, "color: red;")]
    #[case(8, "color: red;")]
    #[case(11, "color: red;")]
    fn test_marks_single_character(#[case] column: usize, #[case] content: &str) {
        let rows = extract_context(content, 1, column, ContextConfig::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(strip_ansi(&rows[0]), format!("1: {}", content));

        let expected = content.chars().nth(column - 1).unwrap();
        let marked = format!("{UNDERLINE}{HIGHLIGHT}{expected}{RESET}");
        assert!(rows[0].contains(&marked));
    }

    #[test]
    fn test_column_past_end_marks_space() {
        let rows = extract_context("ab", 1, 5, ContextConfig::default());
        assert_eq!(rows[0], format!("1: ab{UNDERLINE}{HIGHLIGHT} {RESET}"));
    }

    #[test]
    fn test_wider_window() {
        let source = "1\n2\n3\n4\n5\n6\n7";
        let rows = extract_context(source, 4, 1, ContextConfig { before: 2, after: 3 });
        assert_eq!(rows.len(), 6);
        assert!(rows[0].starts_with("2: "));
        assert!(rows[5].starts_with("7: "));
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let window = ContextConfig {
            before: usize::MAX,
            after: usize::MAX,
        };
        let rows = extract_context("a\nb\nc", 2, 1, window);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], "1: a");
        assert_eq!(rows[2], "3: c");
    }

    #[test]
    fn test_window_from_config() {
        let config = stylekit_core::CompilerConfig::from_yaml(
            "context:\n  before: 18446744073709551615\n  after: 0\n",
        )
        .unwrap();
        let rows = extract_context("a\nb\nc", 3, 1, config.context);
        assert_eq!(rows.len(), 3);
        assert!(rows[2].starts_with("3: "));
    }

    #[test]
    fn test_line_beyond_source_is_clamped() {
        let rows = extract_context("a\nb", 10, 1, ContextConfig::default());
        assert!(rows.is_empty());
    }
}
