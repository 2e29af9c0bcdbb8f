use crate::error as mterr;
use barrel::{types, Migration};
use rusqlite::Connection;
use std::path::Path;

pub fn initialdb() -> Migration {
  let mut m = Migration::new();

  m.create_table("user", |t| {
    t.add_column(
      "id",
      types::integer()
        .primary(true)
        .increments(true)
        .nullable(false),
    );
    t.add_column("username", types::text().nullable(false).unique(true));
    t.add_column("hashwd", types::text().nullable(false));
    t.add_column("salt", types::text().nullable(false));
    t.add_column("nickname", types::text().nullable(false));
    t.add_column("email", types::text().nullable(true));
    t.add_column("slogan", types::text().nullable(true));
    t.add_column("avatarUrl", types::text().nullable(true));
    t.add_column("coverUrl", types::text().nullable(true));
    t.add_column("createdAt", types::text().nullable(false));
    t.add_column("updatedAt", types::text().nullable(false));
  });

  m.create_table("memo", |t| {
    t.add_column(
      "id",
      types::integer()
        .primary(true)
        .increments(true)
        .nullable(false),
    );
    t.add_column("content", types::text().nullable(false));
    // comma-joined image urls; empty string when the memo has none.
    t.add_column("imgs", types::text().nullable(false));
    // comma-joined with a trailing delimiter ("go,rust,"), or null.
    t.add_column("tags", types::text().nullable(true));
    t.add_column("externalUrl", types::text().nullable(true));
    t.add_column("externalTitle", types::text().nullable(true));
    t.add_column("externalFavicon", types::text().nullable(true));
    t.add_column("pinned", types::boolean().nullable(false));
    t.add_column("showType", types::integer().nullable(false));
    t.add_column("ext", types::text().nullable(false));
    t.add_column("favCount", types::integer().nullable(false));
    t.add_column("commentCount", types::integer().nullable(false));
    t.add_column(
      "userId",
      types::foreign(
        "user",
        "id",
        types::ReferentialAction::Restrict,
        types::ReferentialAction::Restrict,
      )
      .nullable(false),
    );
    t.add_column("createdAt", types::text().nullable(false));
    t.add_column("updatedAt", types::text().nullable(false));
  });

  m.create_table("comment", |t| {
    t.add_column(
      "id",
      types::integer()
        .primary(true)
        .increments(true)
        .nullable(false),
    );
    t.add_column("content", types::text().nullable(false));
    // weak reference to another comment; no fk on purpose.
    t.add_column("replyTo", types::integer().nullable(true));
    t.add_column("username", types::text().nullable(true));
    t.add_column("email", types::text().nullable(true));
    t.add_column("website", types::text().nullable(true));
    t.add_column(
      "author",
      types::foreign(
        "user",
        "id",
        types::ReferentialAction::Restrict,
        types::ReferentialAction::Restrict,
      )
      .nullable(true),
    );
    t.add_column(
      "memoId",
      types::foreign(
        "memo",
        "id",
        types::ReferentialAction::Restrict,
        types::ReferentialAction::Restrict,
      )
      .nullable(false),
    );
    t.add_column("createdAt", types::text().nullable(false));
    t.add_column("updatedAt", types::text().nullable(false));
  });

  m.create_table("token", |t| {
    t.add_column("token", types::text().nullable(false).unique(true));
    t.add_column(
      "user",
      types::foreign(
        "user",
        "id",
        types::ReferentialAction::Restrict,
        types::ReferentialAction::Restrict,
      )
      .nullable(false),
    );
    t.add_column("createdAt", types::text().nullable(false));
  });

  m.create_table("singlevalue", |t| {
    t.add_column("name", types::text().nullable(false).unique(true));
    t.add_column("value", types::text().nullable(false));
  });

  m
}

pub fn udpate1(dbfile: &Path) -> Result<(), mterr::Error> {
  let conn = Connection::open(dbfile)?;
  conn.execute_batch(
    "create index if not exists memo_userid_idx on memo (userId);
     create index if not exists memo_createdat_idx on memo (createdAt);
     create index if not exists comment_memoid_idx on comment (memoId);
     create index if not exists token_user_idx on token (user);",
  )?;
  Ok(())
}

pub fn udpate2(dbfile: &Path) -> Result<(), mterr::Error> {
  let conn = Connection::open(dbfile)?;
  conn.execute_batch("alter table memo add column location text;")?;
  Ok(())
}
