use regex::Regex;

use crate::error::SchemaError;
use crate::pattern::Pattern;
use crate::schema::named_groups;

/// Extracts the named capture groups of a line.
///
/// The group indices are resolved once and the capture span buffer is reused
/// across lines.
pub struct LineMatcher<P>
where
    P: Pattern,
{
    pattern: P,
    groups: Vec<usize>,
    locs: P::Locations,
}

impl<P> LineMatcher<P>
where
    P: Pattern,
{
    pub fn new(pattern: P) -> Result<Self, SchemaError> {
        let groups: Vec<usize> = named_groups(&pattern)
            .into_iter()
            .map(|(ix, _)| ix)
            .collect();
        if groups.is_empty() {
            return Err(SchemaError::NoNamedGroups);
        }
        let locs = pattern.locations();
        Ok(Self {
            pattern,
            groups,
            locs,
        })
    }

    pub fn pattern(&self) -> &P {
        &self.pattern
    }

    pub fn field_count(&self) -> usize {
        self.groups.len()
    }

    /// Returns one value per named group, in pattern order, or `None` when the
    /// line does not match. A group that did not take part in the match
    /// yields an empty value.
    pub fn match_line<'h>(&mut self, line: &'h P::Haystack) -> Option<Vec<&'h P::Haystack>> {
        if !self.pattern.read_into(&mut self.locs, line) {
            return None;
        }
        let vals = self
            .groups
            .iter()
            .map(|&ix| match P::span(&self.locs, ix) {
                Some((start, end)) => P::slice(line, start, end),
                None => P::empty(),
            })
            .collect();
        Some(vals)
    }
}

pub fn parse_line<'h>(line: &'h str, re: &Regex) -> Option<Vec<&'h str>> {
    let caps = re.captures(line)?;
    let vals = re
        .capture_names()
        .enumerate()
        .filter(|(_, name)| name.is_some())
        .map(|(ix, _)| caps.get(ix).map_or("", |m| m.as_str()))
        .collect();
    Some(vals)
}
