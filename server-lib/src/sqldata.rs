use crate::access::{self, Action, Requester};
use crate::error as mterr;
use crate::migrations as mtm;
use crate::notify::CommentNotification;
use crate::util::{iso_ms_ago, now_iso};
use barrel::backend::Sqlite;
use log::{info, warn};
use mtprotocol::constants::SHOWTYPE_PUBLIC;
use mtprotocol::content::{
  AddComment, Comment, ImgConfig, Login, LoginData, Memo, MemoAndComments, Registration, SaveMemo,
  SaveProfile, SavedMemo, TagCount, UserProfile,
};
use rand::{distributions::Alphanumeric, Rng};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

pub fn connection_open(dbfile: &Path) -> Result<Connection, mterr::Error> {
  let conn = Connection::open(dbfile)?;

  conn.busy_handler(Some(|count| {
    info!("busy_handler: {}", count);
    let d = Duration::from_millis(500);
    std::thread::sleep(d);
    true
  }))?;

  conn.execute("PRAGMA foreign_keys = true;", params![])?;

  Ok(conn)
}

pub fn get_single_value(conn: &Connection, name: &str) -> Result<Option<String>, mterr::Error> {
  match conn.query_row(
    "select value from singlevalue where name = ?1",
    params![name],
    |row| Ok(row.get(0)?),
  ) {
    Ok(v) => Ok(Some(v)),
    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
    Err(x) => Err(x.into()),
  }
}

pub fn set_single_value(conn: &Connection, name: &str, value: &str) -> Result<(), mterr::Error> {
  conn.execute(
    "insert into singlevalue (name, value) values (?1, ?2)
        on conflict (name) do update set value = ?2 where name = ?1",
    params![name, value],
  )?;
  Ok(())
}

pub fn dbinit(dbfile: &Path, token_expiration_ms: Option<i64>) -> Result<(), mterr::Error> {
  let exists = dbfile.exists();

  let conn = connection_open(dbfile)?;

  if !exists {
    info!("initialdb");
    conn.execute_batch(mtm::initialdb().make::<Sqlite>().as_str())?;
  }

  let nlevel = match get_single_value(&conn, "migration_level") {
    Err(_) => 0,
    Ok(None) => 0,
    Ok(Some(level)) => {
      let l = match level.parse::<i32>() {
        Ok(l) => l,
        Err(e) => return Err(format!("{}", e).into()),
      };
      l
    }
  };

  if nlevel < 1 {
    info!("udpate1");
    mtm::udpate1(&dbfile)?;
    set_single_value(&conn, "migration_level", "1")?;
  }
  if nlevel < 2 {
    info!("udpate2");
    mtm::udpate2(&dbfile)?;
    set_single_value(&conn, "migration_level", "2")?;
  }

  info!("db up to date.");

  if let Some(expms) = token_expiration_ms {
    purge_login_tokens(&conn, Some(expms))?;
  }

  Ok(())
}

// user CRUD

pub fn new_user(conn: &Connection, rd: &Registration) -> Result<i64, mterr::Error> {
  if rd.username.trim().is_empty() || rd.pwd.is_empty() {
    return Err(mterr::Error::ParamError(
      "username and password are required".to_string(),
    ));
  }

  if user_id_by_name(&conn, rd.username.as_str())?.is_some() {
    return Err(mterr::Error::ParamError(
      "username already taken".to_string(),
    ));
  }

  let now = now_iso();
  let salt: String = rand::thread_rng()
    .sample_iter(&Alphanumeric)
    .take(24)
    .map(char::from)
    .collect();
  let hashwd = sha256::digest(format!("{}{}", rd.pwd, salt));
  let nickname = match &rd.nickname {
    Some(n) if !n.trim().is_empty() => n.clone(),
    _ => rd.username.clone(),
  };

  conn.execute(
    "insert into user (username, hashwd, salt, nickname, createdAt, updatedAt)
      values (?1, ?2, ?3, ?4, ?5, ?6)",
    params![rd.username, hashwd, salt, nickname, now, now],
  )?;

  Ok(conn.last_insert_rowid())
}

pub fn user_id_by_name(conn: &Connection, username: &str) -> Result<Option<i64>, mterr::Error> {
  match conn.query_row(
    "select id from user where username = ?1",
    params![username],
    |row| Ok(row.get(0)?),
  ) {
    Ok(id) => Ok(Some(id)),
    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
    Err(x) => Err(x.into()),
  }
}

pub fn read_profile_opt(conn: &Connection, uid: i64) -> Result<Option<UserProfile>, mterr::Error> {
  match conn.query_row(
    "select id, username, nickname, slogan, avatarUrl, coverUrl
      from user where id = ?1",
    params![uid],
    |row| {
      Ok(UserProfile {
        id: row.get(0)?,
        username: row.get(1)?,
        nickname: row.get(2)?,
        slogan: row.get(3)?,
        avatar_url: row.get(4)?,
        cover_url: row.get(5)?,
      })
    },
  ) {
    Ok(p) => Ok(Some(p)),
    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
    Err(x) => Err(x.into()),
  }
}

pub fn read_profile(conn: &Connection, uid: i64) -> Result<UserProfile, mterr::Error> {
  read_profile_opt(&conn, uid)?.ok_or(mterr::Error::UserNotFound(uid.to_string()))
}

pub fn read_profile_by_name(
  conn: &Connection,
  username: &str,
) -> Result<Option<UserProfile>, mterr::Error> {
  match user_id_by_name(&conn, username)? {
    Some(uid) => read_profile_opt(&conn, uid),
    None => Ok(None),
  }
}

pub fn update_profile(
  conn: &Connection,
  requester: &Requester,
  sp: &SaveProfile,
) -> Result<UserProfile, mterr::Error> {
  let uid = match requester {
    Requester::Anonymous => return Err(mterr::Error::NotLoggedIn),
    Requester::User(uid) => *uid,
  };

  let cur = read_profile(&conn, uid)?;
  let cur_email: Option<String> = conn.query_row(
    "select email from user where id = ?1",
    params![uid],
    |row| Ok(row.get(0)?),
  )?;

  let now = now_iso();
  conn.execute(
    "update user set nickname = ?1, slogan = ?2, avatarUrl = ?3, coverUrl = ?4, email = ?5, updatedAt = ?6
      where id = ?7",
    params![
      sp.nickname.clone().unwrap_or(cur.nickname),
      sp.slogan.clone().or(cur.slogan),
      sp.avatar_url.clone().or(cur.avatar_url),
      sp.cover_url.clone().or(cur.cover_url),
      sp.email.clone().or(cur_email),
      now,
      uid
    ],
  )?;

  read_profile(&conn, uid)
}

// login tokens.  token issuance stands in for jwt signing, which lives
// outside this server; clients hold the token and send it back in the
// X-API-TOKEN header.

pub fn make_login_token(conn: &Connection, uid: i64) -> Result<String, mterr::Error> {
  let token = Uuid::new_v4().to_string();
  conn.execute(
    "insert into token (token, user, createdAt) values (?1, ?2, ?3)",
    params![token, uid, now_iso()],
  )?;
  Ok(token)
}

pub fn login_data(conn: &Connection, uid: i64) -> Result<LoginData, mterr::Error> {
  Ok(LoginData {
    token: make_login_token(&conn, uid)?,
    profile: read_profile(&conn, uid)?,
  })
}

pub fn login(conn: &Connection, l: &Login) -> Result<LoginData, mterr::Error> {
  let (uid, hashwd, salt) = match conn.query_row(
    "select id, hashwd, salt from user where username = ?1",
    params![l.username],
    |row| {
      Ok((
        row.get::<usize, i64>(0)?,
        row.get::<usize, String>(1)?,
        row.get::<usize, String>(2)?,
      ))
    },
  ) {
    Ok(r) => r,
    Err(rusqlite::Error::QueryReturnedNoRows) => return Err(mterr::Error::LoginFailed),
    Err(x) => return Err(x.into()),
  };

  if sha256::digest(format!("{}{}", l.pwd, salt)) != hashwd {
    return Err(mterr::Error::LoginFailed);
  }

  login_data(&conn, uid)
}

pub fn register(conn: &Connection, rd: &Registration) -> Result<LoginData, mterr::Error> {
  let uid = new_user(&conn, rd)?;
  info!("new user: {} ({})", rd.username, uid);
  login_data(&conn, uid)
}

pub fn read_user_by_token(
  conn: &Connection,
  token: &str,
  expiration_ms: Option<i64>,
) -> Result<Option<i64>, mterr::Error> {
  let (uid, created) = match conn.query_row(
    "select user, createdAt from token where token = ?1",
    params![token],
    |row| {
      Ok((
        row.get::<usize, i64>(0)?,
        row.get::<usize, String>(1)?,
      ))
    },
  ) {
    Ok(r) => r,
    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
    Err(x) => return Err(x.into()),
  };

  if let Some(ms) = expiration_ms {
    // both sides are fixed-width utc stamps written by now_iso, so a
    // string compare is a valid ordering here.
    if created < iso_ms_ago(ms) {
      conn.execute("delete from token where token = ?1", params![token])?;
      return Ok(None);
    }
  }

  Ok(Some(uid))
}

pub fn delete_login_token(conn: &Connection, token: &str) -> Result<(), mterr::Error> {
  conn.execute("delete from token where token = ?1", params![token])?;
  Ok(())
}

pub fn purge_login_tokens(
  conn: &Connection,
  expiration_ms: Option<i64>,
) -> Result<(), mterr::Error> {
  if let Some(ms) = expiration_ms {
    let n = conn.execute(
      "delete from token where datetime(createdAt) < datetime(?1)",
      params![iso_ms_ago(ms)],
    )?;
    if n > 0 {
      info!("purged {} expired login tokens", n);
    }
  }
  Ok(())
}

// memo CRUD

pub const MEMO_FIELDS: &str = "M.id, M.content, M.imgs, M.tags, M.location, M.externalUrl, \
  M.externalTitle, M.externalFavicon, M.pinned, M.showType, M.ext, M.favCount, M.commentCount, \
  M.userId, M.createdAt, M.updatedAt";

pub fn memo_from_row(row: &rusqlite::Row) -> Result<Memo, rusqlite::Error> {
  Ok(Memo {
    id: row.get(0)?,
    content: row.get(1)?,
    imgs: row.get(2)?,
    tags: row.get(3)?,
    location: row.get(4)?,
    external_url: row.get(5)?,
    external_title: row.get(6)?,
    external_favicon: row.get(7)?,
    pinned: row.get(8)?,
    show_type: row.get(9)?,
    ext: row.get(10)?,
    fav_count: row.get(11)?,
    comment_count: row.get(12)?,
    user_id: row.get(13)?,
    created_at: row.get(14)?,
    updated_at: row.get(15)?,
  })
}

pub fn save_memo(
  conn: &Connection,
  requester: &Requester,
  admin_id: i64,
  sm: &SaveMemo,
) -> Result<SavedMemo, mterr::Error> {
  let now = now_iso();

  // tags are stored comma-joined with a trailing delimiter, so tag
  // membership can match ",tag," without prefix collisions.
  let tags: Option<String> = match &sm.tags {
    Some(ts) if !ts.is_empty() => Some(format!("{},", ts.join(","))),
    _ => None,
  };
  let imgs = sm.imgs.join(",");
  let ext = match &sm.ext {
    Some(v) => serde_json::to_string(v)?,
    None => "{}".to_string(),
  };
  let show_type = sm.show_type.unwrap_or(SHOWTYPE_PUBLIC);
  let pinned = sm.pinned.unwrap_or(false);
  let favicon = sm
    .external_favicon
    .clone()
    .unwrap_or("/favicon.png".to_string());

  match sm.id {
    Some(id) if id > 0 => {
      let tx = conn.unchecked_transaction()?;

      let owner: i64 = match tx.query_row(
        "select userId from memo where id = ?1",
        params![id],
        |row| Ok(row.get(0)?),
      ) {
        Ok(o) => o,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Err(mterr::Error::MemoNotFound(id)),
        Err(x) => return Err(x.into()),
      };
      access::check(requester, Some(owner), Action::SaveMemo, admin_id)?;

      // a save may carry pinned; pinning through this path still keeps
      // the at-most-one-pinned invariant.
      if pinned {
        tx.execute("update memo set pinned = 0", params![])?;
      }

      tx.execute(
        "update memo set content = ?1, imgs = ?2, location = ?3, externalUrl = ?4,
          externalTitle = ?5, externalFavicon = ?6, pinned = ?7, ext = ?8, showType = ?9,
          tags = ?10, updatedAt = ?11
         where id = ?12",
        params![
          sm.content,
          imgs,
          sm.location,
          sm.external_url,
          sm.external_title,
          favicon,
          pinned,
          ext,
          show_type,
          tags,
          now,
          id
        ],
      )?;

      tx.commit()?;

      Ok(SavedMemo {
        id,
        updated_at: now,
      })
    }
    _ => {
      let uid = access::check(requester, None, Action::SaveMemo, admin_id)?;

      // createdAt may be client-supplied, to allow backdating imports.
      let created_at = sm.created_at.clone().unwrap_or(now.clone());

      let tx = conn.unchecked_transaction()?;
      if pinned {
        tx.execute("update memo set pinned = 0", params![])?;
      }
      tx.execute(
        "insert into memo (content, imgs, userId, location, externalUrl, externalTitle,
          externalFavicon, pinned, ext, showType, tags, createdAt, updatedAt,
          favCount, commentCount)
         values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0, 0)",
        params![
          sm.content,
          imgs,
          uid,
          sm.location,
          sm.external_url,
          sm.external_title,
          favicon,
          pinned,
          ext,
          show_type,
          tags,
          created_at,
          now
        ],
      )?;
      let id = tx.last_insert_rowid();
      tx.commit()?;

      Ok(SavedMemo {
        id,
        updated_at: now,
      })
    }
  }
}

pub fn read_memo(conn: &Connection, id: i64) -> Result<Option<Memo>, mterr::Error> {
  match conn.query_row(
    format!("select {} from memo M where M.id = ?1", MEMO_FIELDS).as_str(),
    params![id],
    memo_from_row,
  ) {
    Ok(m) => Ok(Some(m)),
    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
    Err(x) => Err(x.into()),
  }
}

// the memo as clients see it: owner profile, comments, image configs.
pub fn read_memo_and_comments(
  conn: &Connection,
  requester: &Requester,
  id: i64,
) -> Result<MemoAndComments, mterr::Error> {
  let memo = read_memo(&conn, id)?.ok_or(mterr::Error::MemoNotFound(id))?;

  if memo.show_type != SHOWTYPE_PUBLIC && requester.uid() != Some(memo.user_id) {
    return Err(mterr::Error::MemoIsPrivate(id));
  }

  let user = read_profile_opt(&conn, memo.user_id)?;
  let comments = read_memo_comments(&conn, id, None)?;
  let img_configs = img_configs(memo.imgs.as_str());

  Ok(MemoAndComments {
    memo,
    user,
    comments,
    img_configs,
  })
}

pub fn img_configs(imgs: &str) -> Vec<ImgConfig> {
  imgs
    .split(',')
    .filter(|s| !s.is_empty())
    .map(|img| ImgConfig {
      url: img.to_string(),
      // thumbnail derivation doesn't exist yet; clients expect the shape.
      thumb_url: img.to_string(),
    })
    .collect()
}

pub fn delete_memo(
  conn: &Connection,
  requester: &Requester,
  admin_id: i64,
  media_dir: &Path,
  media_prefix: &str,
  id: i64,
) -> Result<(), mterr::Error> {
  let memo = read_memo(&conn, id)?.ok_or(mterr::Error::MemoNotFound(id))?;

  access::check(requester, Some(memo.user_id), Action::RemoveMemo, admin_id)?;

  // comments go with the memo, so commentCount bookkeeping stays honest.
  let tx = conn.unchecked_transaction()?;
  tx.execute("delete from comment where memoId = ?1", params![id])?;
  tx.execute("delete from memo where id = ?1", params![id])?;
  tx.commit()?;

  // stored images are cleaned up best-effort after the row is gone.
  for img in memo.imgs.split(',').filter(|s| !s.is_empty()) {
    if let Some(name) = img.strip_prefix(media_prefix) {
      let p = media_dir.join(name);
      match std::fs::remove_file(&p) {
        Ok(_) => info!("removed media file: {:?}", p),
        Err(e) => warn!("couldn't remove media file {:?}: {}", p, e),
      }
    }
  }

  Ok(())
}

pub fn like_memo(conn: &Connection, id: i64) -> Result<(), mterr::Error> {
  let n = conn.execute(
    "update memo set favCount = favCount + 1 where id = ?1",
    params![id],
  )?;
  if n == 0 {
    return Err(mterr::Error::MemoNotFound(id));
  }
  Ok(())
}

/// Clear every pin, then set the target to the opposite of its previous
/// value, all in one transaction.  Toggling a pinned memo leaves nothing
/// pinned; pinning another memo moves the pin.
pub fn set_pinned(
  conn: &Connection,
  requester: &Requester,
  admin_id: i64,
  id: i64,
) -> Result<bool, mterr::Error> {
  access::check(requester, None, Action::SetPinned, admin_id)?;

  let tx = conn.unchecked_transaction()?;

  let pinned: bool = match tx.query_row(
    "select pinned from memo where id = ?1",
    params![id],
    |row| Ok(row.get(0)?),
  ) {
    Ok(p) => p,
    Err(rusqlite::Error::QueryReturnedNoRows) => return Err(mterr::Error::MemoNotFound(id)),
    Err(x) => return Err(x.into()),
  };

  tx.execute("update memo set pinned = 0", params![])?;
  tx.execute(
    "update memo set pinned = ?1 where id = ?2",
    params![!pinned, id],
  )?;

  tx.commit()?;

  Ok(!pinned)
}

// comment CRUD

const COMMENT_FIELDS: &str =
  "C.id, C.content, C.replyTo, C.username, C.email, C.website, C.author, C.memoId, \
   C.createdAt, C.updatedAt";

fn comment_from_row(row: &rusqlite::Row) -> Result<Comment, rusqlite::Error> {
  Ok(Comment {
    id: row.get(0)?,
    content: row.get(1)?,
    reply_to: row.get(2)?,
    username: row.get(3)?,
    email: row.get(4)?,
    website: row.get(5)?,
    author: row.get(6)?,
    memo_id: row.get(7)?,
    created_at: row.get(8)?,
    updated_at: row.get(9)?,
  })
}

pub fn read_comment(conn: &Connection, id: i64) -> Result<Option<Comment>, mterr::Error> {
  match conn.query_row(
    format!("select {} from comment C where C.id = ?1", COMMENT_FIELDS).as_str(),
    params![id],
    comment_from_row,
  ) {
    Ok(c) => Ok(Some(c)),
    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
    Err(x) => Err(x.into()),
  }
}

pub fn read_memo_comments(
  conn: &Connection,
  memo_id: i64,
  limit: Option<i64>,
) -> Result<Vec<Comment>, mterr::Error> {
  let limclause = match limit {
    Some(lm) => format!(" limit {}", lm),
    None => "".to_string(),
  };

  let mut pstmt = conn.prepare(
    format!(
      "select {} from comment C where C.memoId = ?1
        order by datetime(C.createdAt) desc{}",
      COMMENT_FIELDS, limclause
    )
    .as_str(),
  )?;

  let r = pstmt.query_map(params![memo_id], comment_from_row)?;
  Ok(r.collect::<Result<Vec<Comment>, rusqlite::Error>>()?)
}

pub fn add_comment(
  conn: &Connection,
  requester: &Requester,
  ac: &AddComment,
) -> Result<Comment, mterr::Error> {
  if ac.memo_id <= 0 || ac.content.trim().is_empty() {
    return Err(mterr::Error::ParamError(
      "memoId and content are required".to_string(),
    ));
  }

  let now = now_iso();

  let tx = conn.unchecked_transaction()?;

  let memo_exists: bool = match tx.query_row(
    "select id from memo where id = ?1",
    params![ac.memo_id],
    |row| Ok(row.get::<usize, i64>(0)?),
  ) {
    Ok(_) => true,
    Err(rusqlite::Error::QueryReturnedNoRows) => false,
    Err(x) => return Err(x.into()),
  };
  if !memo_exists {
    return Err(mterr::Error::MemoNotFound(ac.memo_id));
  }

  // a logged-in requester overrides the free-text attribution.
  let (username, author) = match requester.uid() {
    Some(uid) => {
      let p = read_profile(&tx, uid)?;
      let name = if p.nickname.trim().is_empty() {
        p.username
      } else {
        p.nickname
      };
      (Some(name), Some(uid))
    }
    None => (ac.username.clone(), None),
  };

  tx.execute(
    "insert into comment (content, replyTo, username, email, website, memoId, author, createdAt, updatedAt)
      values (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    params![
      ac.content,
      ac.reply_to,
      username,
      ac.email,
      ac.website,
      ac.memo_id,
      author,
      now,
      now
    ],
  )?;
  let cid = tx.last_insert_rowid();

  // counter rides in the same transaction as the insert.
  tx.execute(
    "update memo set commentCount = commentCount + 1 where id = ?1",
    params![ac.memo_id],
  )?;

  tx.commit()?;

  read_comment(&conn, cid)?.ok_or(mterr::Error::CommentNotFound(cid))
}

pub fn delete_comment(
  conn: &Connection,
  requester: &Requester,
  admin_id: i64,
  id: i64,
) -> Result<i64, mterr::Error> {
  let comment = read_comment(&conn, id)?.ok_or(mterr::Error::CommentNotFound(id))?;

  access::check(requester, comment.author, Action::RemoveComment, admin_id)?;

  let tx = conn.unchecked_transaction()?;
  tx.execute("delete from comment where id = ?1", params![id])?;
  tx.execute(
    "update memo set commentCount = max(commentCount - 1, 0) where id = ?1",
    params![comment.memo_id],
  )?;
  tx.commit()?;

  Ok(comment.memo_id)
}

// tag listing, for the tag cloud.  only public memos contribute.

pub fn list_tags(conn: &Connection) -> Result<Vec<TagCount>, mterr::Error> {
  let mut pstmt = conn.prepare(
    "select tags from memo where tags is not null and showType = ?1",
  )?;

  let rows = pstmt.query_map(params![SHOWTYPE_PUBLIC], |row| {
    Ok(row.get::<usize, String>(0)?)
  })?;

  let mut counts: HashMap<String, i64> = HashMap::new();
  for r in rows {
    let tags = r?;
    for t in tags.split(',').filter(|s| !s.is_empty()) {
      *counts.entry(t.to_string()).or_insert(0) += 1;
    }
  }

  let mut v: Vec<TagCount> = counts
    .into_iter()
    .map(|(tag, count)| TagCount { tag, count })
    .collect();
  v.sort_by(|a, b| b.count.cmp(&a.count).then(a.tag.cmp(&b.tag)));
  Ok(v)
}

// data for the owner-notification side effect; None when no mail should go out.
pub fn comment_notification(
  conn: &Connection,
  comment: &Comment,
) -> Result<Option<CommentNotification>, mterr::Error> {
  let (owner, memo_content) = match conn.query_row(
    "select userId, content from memo where id = ?1",
    params![comment.memo_id],
    |row| {
      Ok((
        row.get::<usize, i64>(0)?,
        row.get::<usize, String>(1)?,
      ))
    },
  ) {
    Ok(r) => r,
    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
    Err(x) => return Err(x.into()),
  };

  // owners don't get notified about their own comments.
  if comment.author == Some(owner) {
    return Ok(None);
  }

  let owner_email: Option<String> = conn.query_row(
    "select email from user where id = ?1",
    params![owner],
    |row| Ok(row.get(0)?),
  )?;

  match owner_email {
    Some(email) if !email.is_empty() => Ok(Some(CommentNotification {
      memo_id: comment.memo_id,
      memo_content,
      owner_email: email,
      commenter: comment
        .username
        .clone()
        .unwrap_or("anonymous".to_string()),
      comment_content: comment.content.clone(),
    })),
    _ => Ok(None),
  }
}
