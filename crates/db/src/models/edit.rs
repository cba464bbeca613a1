//! Hash layout of a stored edit (`<prefix>edit:<id>`).

use std::collections::HashMap;

use suggestor_core::edit::{EditRecord, EditState, NewEdit, FLAG_PENDING};
use suggestor_core::types::EditId;

use crate::error::StoreError;

pub const FIELD_API: &str = "api";
pub const FIELD_WIKITEXT: &str = "wikitext";
pub const FIELD_SUMMARY: &str = "summary";
pub const FIELD_REVID: &str = "revid";
pub const FIELD_PAGEID: &str = "pageid";
pub const FIELD_PAGENAME: &str = "pagename";
pub const FIELD_APPROVED: &str = "approved";

/// Every field of a stored edit, in [`from_values`] order.
pub const ALL_FIELDS: [&str; 7] = [
    FIELD_API,
    FIELD_WIKITEXT,
    FIELD_SUMMARY,
    FIELD_REVID,
    FIELD_PAGEID,
    FIELD_PAGENAME,
    FIELD_APPROVED,
];

/// Fields written on submission. A new edit is always pending.
pub fn to_fields(edit: &NewEdit) -> Vec<(String, String)> {
    let optional_int = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();
    vec![
        (FIELD_API.into(), edit.endpoint.clone()),
        (FIELD_WIKITEXT.into(), edit.content.clone()),
        (FIELD_SUMMARY.into(), edit.summary.clone()),
        (FIELD_REVID.into(), optional_int(edit.base_revision)),
        (FIELD_PAGEID.into(), optional_int(edit.page_id)),
        (
            FIELD_PAGENAME.into(),
            edit.page_name.clone().unwrap_or_default(),
        ),
        (FIELD_APPROVED.into(), FLAG_PENDING.into()),
    ]
}

/// Rebuild a record from `HGETALL` output.
pub fn from_map(id: EditId, map: &HashMap<String, String>) -> Result<EditRecord, StoreError> {
    let values: Vec<Option<String>> = ALL_FIELDS.iter().map(|f| map.get(*f).cloned()).collect();
    from_values(&id.to_string(), &values)
}

/// Rebuild a record from values ordered as [`ALL_FIELDS`].
pub fn from_values(id: &str, values: &[Option<String>]) -> Result<EditRecord, StoreError> {
    let get = |i: usize| values.get(i).cloned().flatten();

    let parsed_id: EditId = id.parse().map_err(|_| StoreError::Malformed {
        id: id.to_string(),
        field: "id",
        value: id.to_string(),
    })?;
    let endpoint = get(0).ok_or_else(|| missing(id, FIELD_API))?;
    let content = get(1).ok_or_else(|| missing(id, FIELD_WIKITEXT))?;
    let summary = get(2).unwrap_or_default();
    let base_revision = parse_optional_int(id, FIELD_REVID, get(3))?;
    let page_id = parse_optional_int(id, FIELD_PAGEID, get(4))?;
    let page_name = get(5).filter(|n| !n.is_empty());
    let state = EditState::from_flag(&get(6).ok_or_else(|| missing(id, FIELD_APPROVED))?);

    Ok(EditRecord {
        id: parsed_id,
        endpoint,
        content,
        summary,
        base_revision,
        page_id,
        page_name,
        state,
    })
}

fn missing(id: &str, field: &'static str) -> StoreError {
    StoreError::Malformed {
        id: id.to_string(),
        field,
        value: String::new(),
    }
}

/// Empty and `0` both mean "not given"; older records stored `0`.
fn parse_optional_int(
    id: &str,
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<i64>, StoreError> {
    match raw.as_deref() {
        None | Some("") | Some("0") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| StoreError::Malformed {
            id: id.to_string(),
            field,
            value: s.to_string(),
        }),
    }
}
