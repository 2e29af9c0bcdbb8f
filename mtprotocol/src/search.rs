use crate::content::MemoAndComments;

/// Client-side list query.  Every field is optional; absent fields fall
/// back to the visibility base rule and default paging.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemoSearch {
  pub page: Option<i64>,
  pub size: Option<i64>,
  pub start: Option<String>,
  pub end: Option<String>,
  pub content_contains: Option<String>,
  pub show_type: Option<i64>,
  pub tag: Option<String>,
  pub username: Option<String>,
  pub user_id: Option<i64>,
}

/// One predicate term.  A search compiles to a list of these, combined
/// with AND; each term becomes a sql fragment with bound parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum MemoFilter {
  /// showType public and already published.
  VisibleAnonymous { now: String },
  /// own memos, or public ones already published.
  VisibleToUser { uid: i64, now: String },
  CreatedAtOrAfter(String),
  CreatedAtOrBefore(String),
  ContentContains(String),
  ShowType(i64),
  Tag(String),
  Owner(i64),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MemoSearchResult {
  pub list: Vec<MemoAndComments>,
  pub total: i64,
  pub has_next: bool,
}
