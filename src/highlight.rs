use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::model::{CasePolicy, MatchMode, Query};

/// A run of a rendered line, flagged when it is part of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

enum Marker {
    None,
    Prefix { prefix: String, case: CasePolicy },
    Patterns(Vec<Regex>),
}

/// Marks the parts of a line that the current query matched.
///
/// Built once per frame and reused for every visible row. Highlighting is a
/// visual aid only: whatever goes wrong here, the line is still rendered.
pub struct Highlighter {
    marker: Marker,
}

impl Highlighter {
    pub fn new(query: &Query) -> Self {
        if query.is_blank() {
            return Self {
                marker: Marker::None,
            };
        }

        let marker = match query.mode {
            MatchMode::ExactPrefix => Marker::Prefix {
                prefix: query.text.trim().to_string(),
                case: query.case,
            },
            MatchMode::Keywords => Marker::Patterns(
                query
                    .text
                    .split_whitespace()
                    .filter_map(|word| insensitive_regex(&regex::escape(word)))
                    .collect(),
            ),
            MatchMode::Regex => match insensitive_regex(&query.text) {
                Some(regex) => Marker::Patterns(vec![regex]),
                None => Marker::None,
            },
        };

        Self { marker }
    }

    pub fn highlight<'a>(&self, line: &'a str) -> Vec<Segment<'a>> {
        let ranges = match &self.marker {
            Marker::None => Vec::new(),
            Marker::Prefix { prefix, case } => folded_prefix_end(line, prefix, *case)
                .map(|end| vec![0..end])
                .unwrap_or_default(),
            Marker::Patterns(patterns) => {
                let found = patterns
                    .iter()
                    .flat_map(|regex| regex.find_iter(line))
                    .filter(|hit| !hit.is_empty())
                    .map(|hit| hit.range())
                    .collect();
                coalesce(found)
            }
        };

        split_segments(line, &ranges)
    }
}

fn insensitive_regex(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Byte offset in `line` where a case-folded `prefix` ends, if `line` starts with it.
fn folded_prefix_end(line: &str, prefix: &str, case: CasePolicy) -> Option<usize> {
    if prefix.is_empty() {
        return None;
    }
    if case == CasePolicy::Sensitive {
        return line.starts_with(prefix).then_some(prefix.len());
    }

    let target = prefix.to_lowercase();
    let mut folded = String::new();
    for (index, ch) in line.char_indices() {
        folded.extend(ch.to_lowercase());
        if folded.len() >= target.len() {
            return folded.starts_with(&target).then_some(index + ch.len_utf8());
        }
        if !target.starts_with(&folded) {
            return None;
        }
    }
    None
}

fn coalesce(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|range| range.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

fn split_segments<'a>(line: &'a str, ranges: &[Range<usize>]) -> Vec<Segment<'a>> {
    let mut segments = Vec::with_capacity(ranges.len() * 2 + 1);
    let mut cursor = 0;
    for range in ranges {
        if range.start > cursor {
            segments.push(Segment {
                text: &line[cursor..range.start],
                matched: false,
            });
        }
        segments.push(Segment {
            text: &line[range.clone()],
            matched: true,
        });
        cursor = range.end;
    }
    if cursor < line.len() || segments.is_empty() {
        segments.push(Segment {
            text: &line[cursor..],
            matched: false,
        });
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(query: &Query, line: &str) -> Vec<(String, bool)> {
        Highlighter::new(query)
            .highlight(line)
            .into_iter()
            .map(|segment| (segment.text.to_string(), segment.matched))
            .collect()
    }

    fn plain(line: &str) -> Vec<(String, bool)> {
        vec![(line.to_string(), false)]
    }

    #[test]
    fn prefix_marks_matched_length_only() {
        let query = Query::new("GIT ", MatchMode::ExactPrefix, CasePolicy::Insensitive);
        assert_eq!(
            marked(&query, "git push"),
            vec![("git".to_string(), true), (" push".to_string(), false)]
        );
    }

    #[test]
    fn prefix_miss_leaves_line_unmarked() {
        let query = Query::new("GIT", MatchMode::ExactPrefix, CasePolicy::Sensitive);
        assert_eq!(marked(&query, "git push"), plain("git push"));

        let query = Query::new("cd", MatchMode::ExactPrefix, CasePolicy::Insensitive);
        assert_eq!(marked(&query, "git push"), plain("git push"));
    }

    #[test]
    fn prefix_handles_multibyte_case_folding() {
        let query = Query::new("ÉCHO", MatchMode::ExactPrefix, CasePolicy::Insensitive);
        assert_eq!(
            marked(&query, "écho hi"),
            vec![("écho".to_string(), true), (" hi".to_string(), false)]
        );
    }

    #[test]
    fn keywords_mark_every_occurrence_case_insensitively() {
        let query = Query::new("o", MatchMode::Keywords, CasePolicy::Sensitive);
        assert_eq!(
            marked(&query, "Foo bOx"),
            vec![
                ("F".to_string(), false),
                ("oo".to_string(), true),
                (" b".to_string(), false),
                ("O".to_string(), true),
                ("x".to_string(), false),
            ]
        );
    }

    #[test]
    fn overlapping_keywords_coalesce() {
        let query = Query::new("pus  ush", MatchMode::Keywords, CasePolicy::Insensitive);
        assert_eq!(
            marked(&query, "git push"),
            vec![("git ".to_string(), false), ("push".to_string(), true)]
        );
    }

    #[test]
    fn keyword_metacharacters_are_literal() {
        let query = Query::new("a.c", MatchMode::Keywords, CasePolicy::Insensitive);
        assert_eq!(
            marked(&query, "abc a.c"),
            vec![("abc ".to_string(), false), ("a.c".to_string(), true)]
        );
    }

    #[test]
    fn regex_marks_all_matches() {
        let query = Query::new("[0-9]+", MatchMode::Regex, CasePolicy::Sensitive);
        assert_eq!(
            marked(&query, "sleep 10 && echo 2"),
            vec![
                ("sleep ".to_string(), false),
                ("10".to_string(), true),
                (" && echo ".to_string(), false),
                ("2".to_string(), true),
            ]
        );
    }

    #[test]
    fn invalid_regex_renders_unmodified() {
        let query = Query::new("(", MatchMode::Regex, CasePolicy::Insensitive);
        assert_eq!(marked(&query, "echo ("), plain("echo ("));
    }

    #[test]
    fn blank_query_marks_nothing() {
        for mode in [
            MatchMode::ExactPrefix,
            MatchMode::Keywords,
            MatchMode::Regex,
        ] {
            let query = Query::new("  ", mode, CasePolicy::Insensitive);
            assert_eq!(marked(&query, "ls -la"), plain("ls -la"));
        }
    }

    #[test]
    fn empty_line_yields_single_segment() {
        let query = Query::new("x", MatchMode::Keywords, CasePolicy::Insensitive);
        assert_eq!(marked(&query, ""), plain(""));
    }
}
