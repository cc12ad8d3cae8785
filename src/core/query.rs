//! Named-placeholder SQL templates
//!
//! A [`SqlQuery`] owns SQL text with placeholders written as `{name}`, where `name` is two or
//! more of `[A-Za-z0-9_]`. Placeholders are matched case-insensitively and the braces act as
//! delimiters, so substituting `id` never touches `{id2}`.
//!
//! Line (`-- ...`) and block (`/* ... */`) comments are stripped whenever text enters a query,
//! so a placeholder inside a comment is never seen. Single-quoted literals written in the SQL
//! are opaque: neither comment markers nor `{name}` tokens inside them are recognized.
//!
//! Substituted values are opaque too. The query remembers where each rendered value sits, so
//! a value whose text happens to contain `{name}` is never reported or substituted again.
//!
//! # Example
//!
//! ```rust
//! use sql_data_mapper::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let base = SqlQuery::new("select * from test where name like {term}");
//!
//! // `add` leaves `base` untouched, so one base query can branch into many variants
//! let mut variant = base.add("order by name");
//! variant.set_parameter("term", "A%")?.check(true)?;
//!
//! assert_eq!(variant.text(), "select * from test where name like 'A%' order by name");
//! assert_eq!(base.unresolved_parameters(), vec!["term".to_string()]);
//! # Ok(())
//! # }
//! ```

use super::binding::SqlEntity;
use super::error::{MapperError, Result};
use super::formatter::{SqlFormatter, DEFAULT_FORMATTER};
use super::parameters::SqlParameters;
use super::value::SqlValue;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::fmt;
use std::ops::{Add, AddAssign, Range};
use std::sync::OnceLock;

/// How a single substitution treats a name with no matching placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterMode {
    /// Zero matches is a [`MapperError::ParameterNotFound`] error
    #[default]
    Strict,
    /// Zero matches is silently accepted
    Lenient,
}

/// Quoted literals or placeholders, leftmost first; only placeholders capture a name
fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"'[^']*'|\{([A-Za-z0-9_]{2,})\}").expect("placeholder pattern is valid")
    })
}

/// Quoted literals or comments, leftmost first
fn comment_regex() -> &'static Regex {
    static COMMENTS: OnceLock<Regex> = OnceLock::new();
    COMMENTS.get_or_init(|| {
        Regex::new(r"(?s)'[^']*'|--[^\n]*|/\*.*?\*/").expect("comment pattern is valid")
    })
}

/// Replace line and block comments with a single space, leaving quoted literals alone
fn strip_comments(text: &str) -> String {
    if !text.contains("--") && !text.contains("/*") {
        return text.to_string();
    }
    comment_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            let token = &caps[0];
            if token.starts_with('\'') {
                token.to_string()
            } else {
                " ".to_string()
            }
        })
        .into_owned()
}

/// A mutable SQL template with named placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SqlQuery {
    text: String,
    /// Byte ranges of substituted values, sorted and disjoint
    rendered: Vec<Range<usize>>,
}

impl SqlQuery {
    /// Create a query from SQL text, stripping comments
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            text: strip_comments(text.as_ref()),
            rendered: Vec::new(),
        }
    }

    /// Current SQL text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the query and return its text
    pub fn into_text(self) -> String {
        self.text
    }

    /// Replace the whole text, stripping comments
    pub fn set_text(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.text = strip_comments(text.as_ref());
        self.rendered.clear();
        self
    }

    /// Substitute every `{name}` with the default rendering of `value`
    ///
    /// Fails with [`MapperError::ParameterNotFound`] if the text has no such placeholder.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<SqlValue>) -> Result<&mut Self> {
        self.substitute(name, &value.into(), ParameterMode::Strict, &DEFAULT_FORMATTER)?;
        Ok(self)
    }

    /// Substitute every `{name}` using the given mode and formatter
    pub fn set_parameter_with(
        &mut self,
        name: &str,
        value: impl Into<SqlValue>,
        mode: ParameterMode,
        formatter: &dyn SqlFormatter,
    ) -> Result<&mut Self> {
        self.substitute(name, &value.into(), mode, formatter)?;
        Ok(self)
    }

    /// Apply every parameter of the bag; names without a placeholder are skipped
    pub fn set_parameters(&mut self, parameters: &SqlParameters) -> Result<&mut Self> {
        self.set_parameters_with(parameters, &DEFAULT_FORMATTER)
    }

    /// Apply every parameter of the bag with a custom formatter
    ///
    /// All placeholders are filled in a single pass over the current text. A placeholder
    /// takes the first bag entry, in insertion order, whose key matches its name.
    pub fn set_parameters_with(
        &mut self,
        parameters: &SqlParameters,
        formatter: &dyn SqlFormatter,
    ) -> Result<&mut Self> {
        let replacements: Vec<(Range<usize>, String)> = self
            .placeholders()
            .into_iter()
            .filter_map(|(range, name)| {
                parameters
                    .get_ignore_case(name)
                    .map(|value| (range, formatter.format(value)))
            })
            .collect();

        tracing::trace!(
            parameters = parameters.len(),
            occurrences = replacements.len(),
            "parameter bag applied"
        );
        self.replace(replacements);
        Ok(self)
    }

    /// Apply the bound, non-ignored properties of an entity as parameters (lenient)
    pub fn set_entity<T: SqlEntity>(&mut self, entity: &T) -> Result<&mut Self> {
        let parameters = SqlParameters::from_entity(entity)?;
        self.set_parameters(&parameters)
    }

    /// Return a new query with `fragment` appended after a space; `self` is unchanged
    pub fn add(&self, fragment: impl Into<SqlQuery>) -> SqlQuery {
        let mut combined = self.clone();
        combined.append(fragment);
        combined
    }

    /// Append `fragment` after a space, in place
    pub fn append(&mut self, fragment: impl Into<SqlQuery>) -> &mut Self {
        let fragment = fragment.into();
        self.text.push(' ');
        let offset = self.text.len();
        self.text.push_str(&fragment.text);
        self.rendered.extend(
            fragment
                .rendered
                .into_iter()
                .map(|span| span.start + offset..span.end + offset),
        );
        self
    }

    /// Names of the placeholders still present, deduplicated case-insensitively in
    /// first-seen order
    pub fn unresolved_parameters(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.placeholders()
            .into_iter()
            .map(|(_, name)| name)
            .filter(|name| seen.insert(name.to_ascii_lowercase()))
            .map(str::to_string)
            .collect()
    }

    /// A bag with one entry per unresolved placeholder, all set to `value`
    pub fn unresolved_as_parameters(&self, value: impl Into<SqlValue>) -> SqlParameters {
        let value = value.into();
        self.unresolved_parameters()
            .into_iter()
            .map(|name| (name, value.clone()))
            .collect()
    }

    /// Fail with [`MapperError::UnresolvedParameters`] if `strict` and placeholders remain
    pub fn check(&self, strict: bool) -> Result<&Self> {
        if strict {
            let names = self.unresolved_parameters();
            if !names.is_empty() {
                return Err(MapperError::unresolved(names));
            }
        }
        Ok(self)
    }

    /// Placeholder tokens and their names, in text order
    ///
    /// Each stretch of text between substituted values is scanned on its own, skipping
    /// quoted literals.
    fn placeholders(&self) -> Vec<(Range<usize>, &str)> {
        let mut found = Vec::new();
        let mut start = 0;
        let boundaries = self
            .rendered
            .iter()
            .map(|span| (span.start, span.end))
            .chain(std::iter::once((self.text.len(), self.text.len())));

        for (gap_end, next_start) in boundaries {
            for caps in placeholder_regex().captures_iter(&self.text[start..gap_end]) {
                if let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) {
                    found.push((start + token.start()..start + token.end(), name.as_str()));
                }
            }
            start = next_start;
        }
        found
    }

    /// Splice rendered values over placeholder ranges (sorted, outside existing values)
    fn replace(&mut self, replacements: Vec<(Range<usize>, String)>) {
        if replacements.is_empty() {
            return;
        }

        let mut text = String::with_capacity(self.text.len());
        let mut rendered = Vec::with_capacity(self.rendered.len() + replacements.len());
        let mut previous = std::mem::take(&mut self.rendered).into_iter().peekable();
        let mut cursor = 0;

        for (range, value) in replacements {
            // `text.len()` in the new text corresponds to `cursor` in the old one
            while let Some(span) = previous.next_if(|span| span.start < range.start) {
                let start = text.len() + (span.start - cursor);
                rendered.push(start..start + span.len());
            }
            text.push_str(&self.text[cursor..range.start]);
            rendered.push(text.len()..text.len() + value.len());
            text.push_str(&value);
            cursor = range.end;
        }
        for span in previous {
            let start = text.len() + (span.start - cursor);
            rendered.push(start..start + span.len());
        }
        text.push_str(&self.text[cursor..]);

        self.text = text;
        self.rendered = rendered;
    }

    fn substitute(
        &mut self,
        name: &str,
        value: &SqlValue,
        mode: ParameterMode,
        formatter: &dyn SqlFormatter,
    ) -> Result<usize> {
        if name.is_empty() {
            return Err(MapperError::empty_argument("name"));
        }

        let matches: Vec<Range<usize>> = self
            .placeholders()
            .into_iter()
            .filter(|(_, found)| found.eq_ignore_ascii_case(name))
            .map(|(range, _)| range)
            .collect();

        let count = matches.len();
        if count == 0 {
            return match mode {
                ParameterMode::Strict => Err(MapperError::ParameterNotFound(name.to_string())),
                ParameterMode::Lenient => Ok(0),
            };
        }

        let rendered = formatter.format(value);
        self.replace(
            matches
                .into_iter()
                .map(|range| (range, rendered.clone()))
                .collect(),
        );

        tracing::trace!(parameter = name, occurrences = count, "placeholder substituted");
        Ok(count)
    }
}

impl fmt::Display for SqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for SqlQuery {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl From<&str> for SqlQuery {
    fn from(text: &str) -> Self {
        SqlQuery::new(text)
    }
}

impl From<String> for SqlQuery {
    fn from(text: String) -> Self {
        SqlQuery::new(text)
    }
}

impl From<&SqlQuery> for SqlQuery {
    fn from(query: &SqlQuery) -> Self {
        query.clone()
    }
}

impl<Q: Into<SqlQuery>> Add<Q> for &SqlQuery {
    type Output = SqlQuery;

    fn add(self, fragment: Q) -> SqlQuery {
        SqlQuery::add(self, fragment)
    }
}

impl<Q: Into<SqlQuery>> AddAssign<Q> for SqlQuery {
    fn add_assign(&mut self, fragment: Q) {
        self.append(fragment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_create_query() {
        assert_eq!(SqlQuery::default().text(), "");
        assert_eq!(SqlQuery::new("select * from test").text(), "select * from test");
        assert_eq!(SqlQuery::from("select 1").to_string(), "select 1");
    }

    #[test]
    fn test_add_does_not_mutate() {
        let query1 = SqlQuery::new("select * from test");
        let query2 = SqlQuery::new("where t = 1");

        let result1 = &query1 + &query2;
        let result2 = query1.clone().add(&query2);
        let result3 = query1.add("where t = 1");

        assert_eq!(result1.text(), "select * from test where t = 1");
        assert_eq!(result2.text(), "select * from test where t = 1");
        assert_eq!(result3.text(), "select * from test where t = 1");
        assert_eq!(query1.text(), "select * from test");
        assert_eq!(query2.text(), "where t = 1");
    }

    #[test]
    fn test_append_mutates() {
        let mut query1 = SqlQuery::new("select * from test");
        let query2 = SqlQuery::new("where t = 1");

        let result = query1.append(&query2).text().to_string();
        assert_eq!(result, "select * from test where t = 1");
        assert_eq!(query1.text(), "select * from test where t = 1");

        let mut query3 = SqlQuery::new("select 1");
        query3 += "union select 2";
        assert_eq!(query3.text(), "select 1 union select 2");
    }

    #[test]
    fn test_empty_fragment_keeps_separator() {
        let query = SqlQuery::new("select 1");
        assert_eq!(query.add("").text(), "select 1 ");
    }

    #[test]
    fn test_set_text() {
        let mut query = SqlQuery::new("select * from test");
        query.set_text("select * from values -- trailing");
        assert_eq!(query.text(), "select * from values  ");
    }

    #[test]
    fn test_parameter_substitution() {
        let base = SqlQuery::new("select * from test where t = {name}");
        let in_clause = SqlQuery::new("select * from test where t in ({name})");

        let mut query1 = base.clone();
        query1.set_parameter("name", "1").unwrap();
        assert_eq!(query1.text(), "select * from test where t = '1'");

        let mut query2 = base.clone();
        query2.set_parameter("name", 1).unwrap();
        assert_eq!(query2.text(), "select * from test where t = 1");

        let mut query3 = in_clause.clone();
        query3
            .set_parameter("name", vec!["Test1", "Test2", "Test3"])
            .unwrap();
        assert_eq!(
            query3.text(),
            "select * from test where t in ('Test1', 'Test2', 'Test3')"
        );

        let mut query4 = in_clause.clone();
        query4.set_parameter("name", vec![1, 2, 3]).unwrap();
        assert_eq!(query4.text(), "select * from test where t in (1, 2, 3)");

        let mut query5 = base.clone();
        query5.set_parameter("name", SqlValue::Null).unwrap();
        assert_eq!(query5.text(), "select * from test where t = null");
    }

    #[test]
    fn test_special_values() {
        let base = SqlQuery::new("select * from test where t = {name}");

        let mut query1 = base.clone();
        query1
            .set_parameter("name", NaiveDate::from_ymd_opt(2012, 12, 12).unwrap())
            .unwrap();
        assert_eq!(query1.text(), "select * from test where t = '2012-12-12 00:00:00'");

        let mut query2 = base.clone();
        query2
            .set_parameter("name", vec![0xDEu8, 0xAD, 0xBE, 0xEF])
            .unwrap();
        assert_eq!(query2.text(), "select * from test where t = 0xDEADBEEF");
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let mut query = SqlQuery::new("select {id} from t where a = {id} or b = {ID}");
        query.set_parameter("Id", 7).unwrap();
        assert_eq!(query.text(), "select 7 from t where a = 7 or b = 7");
    }

    #[test]
    fn test_prefix_names_do_not_cross_match() {
        let mut query = SqlQuery::new("where a = {id} and b = {id2}");
        query.set_parameter("id2", 2).unwrap();
        assert_eq!(query.text(), "where a = {id} and b = 2");

        query.set_parameter("id", 1).unwrap();
        assert_eq!(query.text(), "where a = 1 and b = 2");
    }

    #[test]
    fn test_missing_parameter_strict() {
        let mut query = SqlQuery::new("select * from test where t = {name}");
        let err = query.set_parameter("nmae", "Test").unwrap_err();
        assert!(matches!(err, MapperError::ParameterNotFound(ref n) if n == "nmae"));
        assert_eq!(query.text(), "select * from test where t = {name}");

        assert!(matches!(
            query.set_parameter("", "Test"),
            Err(MapperError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_missing_parameter_lenient() {
        let mut query = SqlQuery::new("select * from test where t = {name}");
        query
            .set_parameter_with("value", 1, ParameterMode::Lenient, &DEFAULT_FORMATTER)
            .unwrap();
        assert_eq!(query.text(), "select * from test where t = {name}");
    }

    #[test]
    fn test_parameter_bag_is_lenient() {
        let mut params = SqlParameters::new();
        params.add("name", "Test").unwrap();
        params.add("value", "Test").unwrap();

        let mut query = SqlQuery::new("select * from test where t = {name}");
        query.set_parameters(&params).unwrap();
        assert_eq!(query.text(), "select * from test where t = 'Test'");
    }

    #[test]
    fn test_custom_formatter() {
        let quote_double = |value: &SqlValue| format!("\"{}\"", value.as_string());
        let mut query = SqlQuery::new("select {aa}, {bb}");
        query
            .set_parameter_with("aa", "x", ParameterMode::Strict, &quote_double)
            .unwrap()
            .set_parameter("bb", "y")
            .unwrap();
        assert_eq!(query.text(), "select \"x\", 'y'");
    }

    #[test]
    fn test_replacement_text_is_literal() {
        let mut query = SqlQuery::new("select {price}");
        query.set_parameter("price", "$1 and ${name}").unwrap();
        assert_eq!(query.text(), "select '$1 and ${name}'");
    }

    #[test]
    fn test_unresolved_parameters() {
        let query = SqlQuery::new("select * from t where a = {first} and b = {second} or c = {FIRST}");
        assert_eq!(
            query.unresolved_parameters(),
            vec!["first".to_string(), "second".to_string()]
        );

        let bag = query.unresolved_as_parameters("");
        assert_eq!(bag.len(), 2);
        assert!(bag.contains("first"));
        assert!(bag.contains("second"));

        let single_char = SqlQuery::new("select {a}");
        assert!(single_char.unresolved_parameters().is_empty());
    }

    #[test]
    fn test_check() {
        let query1 = SqlQuery::new("select * from test where t = {name}");
        let query2 = query1.add("and x = {value}");

        let err = query2.check(true).unwrap_err();
        match err {
            MapperError::UnresolvedParameters { names } => {
                assert_eq!(names, vec!["name".to_string(), "value".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(query2.check(false).is_ok());
        assert!(SqlQuery::new("select 1").check(true).is_ok());
    }

    #[test]
    fn test_comments_are_stripped() {
        let query = SqlQuery::new(
            "select * from test -- where t = {hidden}\nwhere v = /* {also_hidden}\n */ {shown}",
        );
        assert_eq!(query.unresolved_parameters(), vec!["shown".to_string()]);
        assert_eq!(query.text(), "select * from test  \nwhere v =   {shown}");
    }

    #[test]
    fn test_quoted_literals_are_opaque() {
        let query = SqlQuery::new("select '{shown}', '--not a comment' from t -- {hidden}\nwhere a = {real}");
        assert_eq!(query.unresolved_parameters(), vec!["real".to_string()]);
        assert_eq!(
            query.text(),
            "select '{shown}', '--not a comment' from t  \nwhere a = {real}"
        );

        let mut query = query;
        assert!(matches!(
            query.set_parameter("shown", 1),
            Err(MapperError::ParameterNotFound(_))
        ));
    }

    #[test]
    fn test_substituted_value_is_never_rescanned() {
        let mut query = SqlQuery::new("where a = {name}");
        query.set_parameter("name", "{name}").unwrap();
        assert_eq!(query.text(), "where a = '{name}'");
        assert!(query.unresolved_parameters().is_empty());
        assert!(query.check(true).is_ok());

        let unquoted = |value: &SqlValue| value.as_string();
        let mut query = SqlQuery::new("select {first}, {second}");
        query
            .set_parameter_with("first", "{second}", ParameterMode::Strict, &unquoted)
            .unwrap();
        assert_eq!(query.unresolved_parameters(), vec!["second".to_string()]);

        query.set_parameter("second", 2).unwrap();
        assert_eq!(query.text(), "select {second}, 2");
        assert!(query.unresolved_parameters().is_empty());
    }

    #[test]
    fn test_value_with_stray_quote_does_not_hide_placeholders() {
        let mut query = SqlQuery::new("select {first}, 'x {kept}', {second}");
        query.set_parameter("first", "it's").unwrap();
        assert_eq!(query.unresolved_parameters(), vec!["second".to_string()]);

        query.set_parameter("second", 2).unwrap();
        assert_eq!(query.text(), "select 'it's', 'x {kept}', 2");
    }

    #[test]
    fn test_substituted_values_survive_concatenation() {
        let mut head = SqlQuery::new("select {cols}");
        head.set_parameter("cols", "{tail}").unwrap();

        let mut tail = SqlQuery::new("from t where id = {id}");
        tail.set_parameter("id", "{head}").unwrap();

        let combined = head.add(&tail).add("and {tail}");
        assert_eq!(
            combined.text(),
            "select '{tail}' from t where id = '{head}' and {tail}"
        );
        assert_eq!(combined.unresolved_parameters(), vec!["tail".to_string()]);

        let mut combined = combined;
        combined.set_parameter("tail", 3).unwrap();
        assert_eq!(combined.text(), "select '{tail}' from t where id = '{head}' and 3");

        combined.set_text("select {tail}");
        assert_eq!(combined.unresolved_parameters(), vec!["tail".to_string()]);
    }

    #[test]
    fn test_parameter_bag_is_deterministic() {
        let mut params = SqlParameters::new();
        params.add("Name", 1).unwrap().add("name", 2).unwrap();
        for _ in 0..50 {
            let mut query = SqlQuery::new("select {name}, {NAME}");
            query.set_parameters(&params).unwrap();
            assert_eq!(query.text(), "select 1, 1");
        }

        let mut params = SqlParameters::new();
        params.add("aa", "{bb}").unwrap().add("bb", 5).unwrap();
        for _ in 0..50 {
            let mut query = SqlQuery::new("select {aa}, {bb}");
            query.set_parameters(&params).unwrap();
            assert_eq!(query.text(), "select '{bb}', 5");
            assert!(query.unresolved_parameters().is_empty());
        }
    }
}
