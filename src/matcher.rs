use regex::{Regex, RegexBuilder};

use crate::model::{CasePolicy, MatchMode, Query};

/// A query prepared once per refilter so each candidate test is cheap.
enum CompiledQuery {
    All,
    Nothing,
    Prefix { prefix: String, case: CasePolicy },
    Keywords {
        words: Vec<String>,
        case: CasePolicy,
    },
    Pattern(Regex),
}

impl CompiledQuery {
    fn new(query: &Query) -> Self {
        if query.is_blank() {
            return CompiledQuery::All;
        }

        match query.mode {
            MatchMode::ExactPrefix => CompiledQuery::Prefix {
                prefix: query.case.fold(&query.text),
                case: query.case,
            },
            MatchMode::Keywords => CompiledQuery::Keywords {
                words: query
                    .keywords()
                    .map(|word| query.case.fold(word))
                    .collect(),
                case: query.case,
            },
            MatchMode::Regex => match RegexBuilder::new(&query.text)
                .case_insensitive(query.case == CasePolicy::Insensitive)
                .build()
            {
                Ok(regex) => CompiledQuery::Pattern(regex),
                Err(err) => {
                    tracing::debug!(pattern = %query.text, error = %err, "invalid regex");
                    CompiledQuery::Nothing
                }
            },
        }
    }

    fn matches(&self, candidate: &str) -> bool {
        match self {
            CompiledQuery::All => true,
            CompiledQuery::Nothing => false,
            CompiledQuery::Prefix { prefix, case } => case.fold(candidate).starts_with(prefix),
            CompiledQuery::Keywords { words, case } => {
                let haystack = case.fold(candidate);
                words.iter().all(|word| haystack.contains(word.as_str()))
            }
            CompiledQuery::Pattern(regex) => regex.is_match(candidate),
        }
    }
}

/// Returns the indices of `candidates` that satisfy `query`, in their
/// original order. A blank query keeps everything.
pub fn filter(candidates: &[String], query: &Query) -> Vec<usize> {
    let compiled = CompiledQuery::new(query);
    if matches!(compiled, CompiledQuery::All) {
        return (0..candidates.len()).collect();
    }

    candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| compiled.matches(candidate))
        .map(|(index, _)| index)
        .collect()
}
