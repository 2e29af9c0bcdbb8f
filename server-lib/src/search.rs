use crate::access::Requester;
use crate::error as mterr;
use crate::sqldata;
use crate::util::now_iso;
use mtprotocol::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SHOWTYPE_PUBLIC};
use mtprotocol::content::MemoAndComments;
use mtprotocol::search::{MemoFilter, MemoSearch, MemoSearchResult};
use rusqlite::Connection;

// comments shown inline with each listed memo.
const COMMENT_PREVIEW_LIMIT: i64 = 5;

/// Compile a search into typed predicate terms.  The visibility base rule
/// always contributes a term; the optional filters stack on top with AND.
pub fn filter_terms(
  conn: &Connection,
  requester: &Requester,
  search: &MemoSearch,
) -> Result<Vec<MemoFilter>, mterr::Error> {
  let now = now_iso();

  let mut terms = Vec::new();

  match requester {
    Requester::Anonymous => terms.push(MemoFilter::VisibleAnonymous { now }),
    Requester::User(uid) => terms.push(MemoFilter::VisibleToUser { uid: *uid, now }),
  }

  if let Some(start) = &search.start {
    terms.push(MemoFilter::CreatedAtOrAfter(start.clone()));
  }
  if let Some(end) = &search.end {
    terms.push(MemoFilter::CreatedAtOrBefore(end.clone()));
  }
  if let Some(cc) = &search.content_contains {
    if !cc.is_empty() {
      terms.push(MemoFilter::ContentContains(cc.clone()));
    }
  }
  if let Some(st) = search.show_type {
    if st >= 0 {
      terms.push(MemoFilter::ShowType(st));
    }
  }
  if let Some(tag) = &search.tag {
    if !tag.is_empty() {
      terms.push(MemoFilter::Tag(tag.clone()));
    }
  }
  if let Some(username) = &search.username {
    match sqldata::user_id_by_name(&conn, username.as_str())? {
      Some(uid) => terms.push(MemoFilter::Owner(uid)),
      // an unresolvable username drops the filter rather than failing
      // the search.
      None => tracing::warn!("memo search: unknown username filter dropped: {}", username),
    }
  }
  if let Some(uid) = search.user_id {
    terms.push(MemoFilter::Owner(uid));
  }

  Ok(terms)
}

// one sql fragment plus its bound args per term.  values always travel as
// parameters, never inside the sql text.
fn term_clause(term: &MemoFilter) -> (String, Vec<String>) {
  match term {
    MemoFilter::VisibleAnonymous { now } => (
      "(M.showType = ? and datetime(M.createdAt) <= datetime(?))".to_string(),
      vec![SHOWTYPE_PUBLIC.to_string(), now.clone()],
    ),
    MemoFilter::VisibleToUser { uid, now } => (
      "((M.userId = ? or (M.userId <> ? and M.showType = ?))
        and (M.userId = ? or datetime(M.createdAt) <= datetime(?)))"
        .to_string(),
      vec![
        uid.to_string(),
        uid.to_string(),
        SHOWTYPE_PUBLIC.to_string(),
        uid.to_string(),
        now.clone(),
      ],
    ),
    MemoFilter::CreatedAtOrAfter(start) => {
      ("M.createdAt >= ?".to_string(), vec![start.clone()])
    }
    MemoFilter::CreatedAtOrBefore(end) => ("M.createdAt <= ?".to_string(), vec![end.clone()]),
    MemoFilter::ContentContains(cc) => (
      "M.content like ?".to_string(),
      vec![format!("%{}%", cc)],
    ),
    MemoFilter::ShowType(st) => ("M.showType = ?".to_string(), vec![st.to_string()]),
    // tags are stored "a,b," - prepending a comma makes ",tag," matchable
    // for every position, so tag "a" can't hit "ab," or "ba,".
    MemoFilter::Tag(tag) => (
      "(',' || M.tags) like ?".to_string(),
      vec![format!("%,{},%", tag)],
    ),
    MemoFilter::Owner(uid) => ("M.userId = ?".to_string(), vec![uid.to_string()]),
  }
}

/// AND-reduce terms into a where clause.  Empty terms means no clause.
pub fn build_where_clause(terms: &Vec<MemoFilter>) -> (String, Vec<String>) {
  let mut clauses = Vec::new();
  let mut args = Vec::new();

  for t in terms {
    let (cls, mut clsargs) = term_clause(t);
    clauses.push(cls);
    args.append(&mut clsargs);
  }

  if clauses.is_empty() {
    ("".to_string(), args)
  } else {
    (format!("where {}", clauses.join("\n  and ")), args)
  }
}

/// The list query: predicate, count, page, hydrate.
pub fn search_memos(
  conn: &Connection,
  requester: &Requester,
  search: &MemoSearch,
) -> Result<MemoSearchResult, mterr::Error> {
  let page = search.page.unwrap_or(1).max(1);
  // oversized page requests get clamped.
  let size = search
    .size
    .unwrap_or(DEFAULT_PAGE_SIZE)
    .max(1)
    .min(MAX_PAGE_SIZE);
  let offset = (page - 1) * size;

  let terms = filter_terms(&conn, requester, search)?;
  let (where_clause, args) = build_where_clause(&terms);

  let total: i64 = conn.query_row(
    format!("select count(*) from memo M {}", where_clause).as_str(),
    rusqlite::params_from_iter(args.iter()),
    |row| Ok(row.get(0)?),
  )?;

  // pinned memo first, then newest; datetime() so oddly formatted
  // timestamps still sort as times, not strings.
  let sql = format!(
    "select {} from memo M {}
      order by M.pinned desc, datetime(M.createdAt) desc
      limit {} offset {}",
    sqldata::MEMO_FIELDS,
    where_clause,
    size,
    offset
  );

  let mut pstmt = conn.prepare(sql.as_str())?;
  let rec_iter = pstmt.query_map(
    rusqlite::params_from_iter(args.iter()),
    sqldata::memo_from_row,
  )?;

  let mut list = Vec::new();
  for rsrec in rec_iter {
    let memo = rsrec?;
    // per-memo hydration; one user read and one comment read each.
    let user = sqldata::read_profile_opt(&conn, memo.user_id)?;
    let comments = sqldata::read_memo_comments(&conn, memo.id, Some(COMMENT_PREVIEW_LIMIT))?;
    let img_configs = sqldata::img_configs(memo.imgs.as_str());
    list.push(MemoAndComments {
      memo,
      user,
      comments,
      img_configs,
    });
  }

  Ok(MemoSearchResult {
    list,
    total,
    has_next: page * size < total,
  })
}
