use std::fmt;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MatchMode {
    #[default]
    #[value(name = "exact")]
    ExactPrefix,
    Keywords,
    Regex,
}

impl MatchMode {
    pub fn next(self) -> Self {
        match self {
            MatchMode::ExactPrefix => MatchMode::Keywords,
            MatchMode::Keywords => MatchMode::Regex,
            MatchMode::Regex => MatchMode::ExactPrefix,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchMode::ExactPrefix => "exact",
            MatchMode::Keywords => "keywords",
            MatchMode::Regex => "regex",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CasePolicy {
    #[default]
    Insensitive,
    Sensitive,
}

impl CasePolicy {
    pub fn next(self) -> Self {
        match self {
            CasePolicy::Insensitive => CasePolicy::Sensitive,
            CasePolicy::Sensitive => CasePolicy::Insensitive,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CasePolicy::Insensitive => "insensitive",
            CasePolicy::Sensitive => "sensitive",
        }
    }

    /// Applies the policy to a piece of text before comparison.
    pub fn fold(self, text: &str) -> String {
        match self {
            CasePolicy::Insensitive => text.to_lowercase(),
            CasePolicy::Sensitive => text.to_string(),
        }
    }
}

impl fmt::Display for CasePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The user's filter text together with the active mode and case policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub mode: MatchMode,
    pub case: CasePolicy,
}

impl Query {
    pub fn new(text: impl Into<String>, mode: MatchMode, case: CasePolicy) -> Self {
        Self {
            text: text.into(),
            mode,
            case,
        }
    }

    /// Whitespace-only text counts as no query at all.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Non-empty words separated by single spaces.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.text.split(' ').filter(|word| !word.is_empty())
    }
}
