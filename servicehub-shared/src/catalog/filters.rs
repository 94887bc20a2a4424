/// Listing query parameters
///
/// Raw strings from the query string are parsed here into typed filters.
/// An absent parameter never restricts a listing.

use serde::{Deserialize, Serialize};

use super::{CatalogError, CatalogResult};

/// Filter for tag and component listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFilter {
    /// Only labels linked to at least one service
    pub assigned_only: bool,
}

impl LabelFilter {
    pub fn from_params(assigned_only: Option<&str>) -> CatalogResult<Self> {
        Ok(Self {
            assigned_only: parse_flag("assigned_only", assigned_only)?,
        })
    }
}

/// Filter for service listings
///
/// Within one list ids are OR-ed; `tags` and `components` together must both match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFilter {
    pub tags: Option<Vec<i64>>,
    pub components: Option<Vec<i64>>,
}

impl ServiceFilter {
    /// Parses both id lists, reporting every malformed parameter at once
    pub fn from_params(tags: Option<&str>, components: Option<&str>) -> CatalogResult<Self> {
        let tags = parse_id_list("tags", tags);
        let components = parse_id_list("components", components);

        match (tags, components) {
            (Ok(tags), Ok(components)) => Ok(Self { tags, components }),
            (tags, components) => {
                let errors = [tags.err(), components.err()]
                    .into_iter()
                    .flatten()
                    .flat_map(|e| match e {
                        CatalogError::Validation(errors) => errors,
                        _ => Vec::new(),
                    })
                    .collect();
                Err(CatalogError::Validation(errors))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.components.is_none()
    }
}

/// Parses a comma-separated id list such as `"1,2,3"`
///
/// Whitespace and empty tokens are ignored; a parameter with no ids at all is
/// treated as absent. Any other non-integer token fails the whole list.
pub fn parse_id_list(param: &str, raw: Option<&str>) -> CatalogResult<Option<Vec<i64>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let mut ids = Vec::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let id = token.parse::<i64>().map_err(|_| {
            CatalogError::invalid(param, format!("\"{}\" is not a valid id", token))
        })?;
        ids.push(id);
    }

    if ids.is_empty() {
        return Ok(None);
    }

    ids.sort_unstable();
    ids.dedup();
    Ok(Some(ids))
}

/// Parses a boolean flag: `1/0`, `true/false`, `yes/no` (case-insensitive)
pub fn parse_flag(param: &str, raw: Option<&str>) -> CatalogResult<bool> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(false);
    };

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(CatalogError::invalid(
            param,
            format!("\"{}\" is not a valid boolean", raw),
        )),
    }
}
