//! Field queries over the track catalog.
//!
//! A [`Query`] is a validated conjunction of `(field, values)` criteria. Every
//! listed field must match and, within one field, every listed value must
//! match. Validation runs once at construction so that filtering itself can
//! never fail.

use crate::error::{LibraryError, Result};
use crate::models::Track;
use std::fmt;
use std::str::FromStr;

/// Track attribute a query criterion looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryField {
    /// Track name
    Track,
    /// Album name
    Album,
    /// Any artist name
    Artist,
    /// Track URI
    Uri,
    /// Any of the above
    Any,
}

impl FromStr for QueryField {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "track" => Ok(QueryField::Track),
            "album" => Ok(QueryField::Album),
            "artist" => Ok(QueryField::Artist),
            "uri" => Ok(QueryField::Uri),
            "any" => Ok(QueryField::Any),
            other => Err(LibraryError::InvalidQuery(format!(
                "Unknown query field \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryField::Track => "track",
            QueryField::Album => "album",
            QueryField::Artist => "artist",
            QueryField::Uri => "uri",
            QueryField::Any => "any",
        };
        f.write_str(name)
    }
}

/// How a criterion value is compared against a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Whole-field equality, case-sensitive, with the value trimmed.
    Exact,
    /// Case-insensitive substring containment.
    Search,
}

/// Validated conjunctive query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    criteria: Vec<(QueryField, Vec<String>)>,
}

impl Query {
    /// Query with no criteria; matches every track.
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a query from raw field names and values.
    ///
    /// # Errors
    ///
    /// `LibraryError::InvalidQuery` if a field name is unknown, a value list
    /// is empty, or any value is blank.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Vec<V>)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (field, values) in pairs {
            let values: Vec<String> = values.into_iter().map(Into::into).collect();
            query = query.and(field.as_ref(), values)?;
        }
        Ok(query)
    }

    /// Adds one criterion.
    pub fn and(mut self, field: &str, values: Vec<String>) -> Result<Self> {
        let field = field.parse::<QueryField>()?;
        if values.is_empty() || values.iter().any(|v| v.trim().is_empty()) {
            return Err(LibraryError::InvalidQuery("Missing query".to_string()));
        }
        self.criteria.push((field, values));
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn criteria(&self) -> &[(QueryField, Vec<String>)] {
        &self.criteria
    }

    /// Whether `track` satisfies every criterion.
    pub fn matches(&self, track: &Track, mode: MatchMode) -> bool {
        self.criteria.iter().all(|(field, values)| {
            values
                .iter()
                .all(|value| field_matches(track, *field, value, mode))
        })
    }
}

fn field_matches(track: &Track, field: QueryField, value: &str, mode: MatchMode) -> bool {
    let needle = match mode {
        MatchMode::Exact => value.trim().to_string(),
        MatchMode::Search => value.trim().to_lowercase(),
    };
    let hit = |candidate: &str| match mode {
        MatchMode::Exact => candidate == needle,
        MatchMode::Search => candidate.to_lowercase().contains(&needle),
    };

    match field {
        QueryField::Track => hit(&track.name),
        QueryField::Album => track.album_name().is_some_and(hit),
        QueryField::Artist => track.artist_names().any(hit),
        QueryField::Uri => hit(&track.uri),
        QueryField::Any => {
            hit(&track.name)
                || hit(&track.uri)
                || track.album_name().is_some_and(hit)
                || track.artist_names().any(hit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Album, Artist};

    fn track() -> Track {
        Track {
            artists: vec![Artist::named("The Beatles")],
            album: Some(Album::named("Abbey Road")),
            ..Track::new("file:///music/come_together.mp3", "Come Together")
        }
    }

    #[test]
    fn blank_values_are_invalid() {
        let err = Query::from_pairs([("artist", vec![""])]).unwrap_err();
        assert!(matches!(err, LibraryError::InvalidQuery(ref m) if m == "Missing query"));

        assert!(Query::from_pairs([("track", vec!["  "])]).is_err());
        assert!(Query::from_pairs([("track", Vec::<String>::new())]).is_err());
        assert!(Query::from_pairs([("album", vec!["ok", ""])]).is_err());
    }

    #[test]
    fn unknown_field_is_invalid() {
        let err = Query::from_pairs([("composer", vec!["Bach"])]).unwrap_err();
        assert!(matches!(err, LibraryError::InvalidQuery(ref m) if m.contains("composer")));
    }

    #[test]
    fn exact_match_trims_and_is_case_sensitive() {
        let t = track();
        let q = Query::from_pairs([("track", vec!["  Come Together "])]).unwrap();
        assert!(q.matches(&t, MatchMode::Exact));

        let q = Query::from_pairs([("track", vec!["come together"])]).unwrap();
        assert!(!q.matches(&t, MatchMode::Exact));

        let q = Query::from_pairs([("artist", vec!["Beatles"])]).unwrap();
        assert!(!q.matches(&t, MatchMode::Exact));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let t = track();
        let q = Query::from_pairs([("artist", vec!["beat"]), ("album", vec!["ROAD"])]).unwrap();
        assert!(q.matches(&t, MatchMode::Search));

        let q = Query::from_pairs([("any", vec!["come_together.mp3"])]).unwrap();
        assert!(q.matches(&t, MatchMode::Search));
    }

    #[test]
    fn values_for_one_field_are_conjunctive() {
        let t = track();
        let q = Query::from_pairs([("any", vec!["abbey", "beatles"])]).unwrap();
        assert!(q.matches(&t, MatchMode::Search));

        let q = Query::from_pairs([("any", vec!["abbey", "stones"])]).unwrap();
        assert!(!q.matches(&t, MatchMode::Search));
    }

    #[test]
    fn missing_album_never_matches_album_field() {
        let t = Track::new("dummy:x", "X");
        let q = Query::from_pairs([("album", vec!["x"])]).unwrap();
        assert!(!q.matches(&t, MatchMode::Search));
        assert!(Query::all().matches(&t, MatchMode::Exact));
    }
}
