//! Lazily compiled pattern regexes.

use std::sync::OnceLock;

use regex::Regex;

use crate::spec::PatternSpecification;

/// One compile-once cell per pattern, addressed by table position.
#[derive(Debug, Clone, Default)]
pub(crate) struct PatternCache {
    cells: Vec<OnceLock<Option<Regex>>>,
}

impl PatternCache {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            cells: std::iter::repeat_with(OnceLock::new).take(len).collect(),
        }
    }

    /// Compiled regex for the pattern named `name` in `patterns`.
    ///
    /// The cache must have been built for the same table. Sources that fail to
    /// compile yield `None`; a validated specification never contains one.
    pub(crate) fn regex<'a>(
        &'a self,
        patterns: &[PatternSpecification],
        name: &str,
    ) -> Option<&'a Regex> {
        let position = patterns.iter().position(|it| it.name == name)?;
        let pattern = &patterns[position];
        self.cells
            .get(position)?
            .get_or_init(|| Regex::new(&pattern.pattern).ok())
            .as_ref()
    }
}
