//! Query-string filters for the recipe list
//!
//! `?tags=1,2&ingredients=3` keeps recipes carrying at least one of the
//! listed tags and at least one of the listed ingredients.

use serde::Deserialize;

use crate::error::{ApiResult, FieldErrors};

/// Raw query parameters accepted by the recipe list
#[derive(Debug, Default, Deserialize)]
pub struct RecipeQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

/// Parsed recipe filter. `None` means no constraint on that dimension.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Option<Vec<i64>>,
    pub ingredients: Option<Vec<i64>>,
}

impl RecipeFilter {
    /// Whether a recipe with these related ids passes the filter.
    ///
    /// This is the reference rule for `RecipeRepository::list`; the SQL
    /// `EXISTS` filter in the PostgreSQL repository encodes the same test.
    pub fn matches(&self, tag_ids: &[i64], ingredient_ids: &[i64]) -> bool {
        any_of(self.tags.as_deref(), tag_ids) && any_of(self.ingredients.as_deref(), ingredient_ids)
    }
}

fn any_of(wanted: Option<&[i64]>, present: &[i64]) -> bool {
    match wanted {
        Some(wanted) => present.iter().any(|id| wanted.contains(id)),
        None => true,
    }
}

/// Parse a comma separated list of ids.
///
/// Whitespace around tokens and empty tokens are ignored; the result is
/// sorted and free of duplicates. Any other non-integer token is an error.
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>, String> {
    let mut ids = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let id = token
            .parse::<i64>()
            .map_err(|_| format!("\"{}\" is not a valid id", token))?;
        ids.push(id);
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

impl RecipeQuery {
    /// Validate both parameters, reporting bad tokens keyed by parameter name
    pub fn into_filter(self) -> ApiResult<RecipeFilter> {
        let mut errors = FieldErrors::new();
        let tags = parse_param("tags", self.tags.as_deref(), &mut errors);
        let ingredients = parse_param("ingredients", self.ingredients.as_deref(), &mut errors);
        errors.into_result()?;

        Ok(RecipeFilter { tags, ingredients })
    }
}

fn parse_param(name: &str, raw: Option<&str>, errors: &mut FieldErrors) -> Option<Vec<i64>> {
    match parse_id_list(raw?) {
        Ok(ids) if ids.is_empty() => None,
        Ok(ids) => Some(ids),
        Err(message) => {
            errors.add(name, message);
            None
        }
    }
}
