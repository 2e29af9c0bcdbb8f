#[cfg(test)]
mod tests {
  use crate::access::Requester;
  use crate::config::Config;
  use crate::error::Error;
  use crate::interfaces;
  use crate::search::search_memos;
  use crate::sqldata::*;
  use mtprotocol::content::{AddComment, Login, Registration, SaveMemo, SaveProfile};
  use mtprotocol::messages::{PrivateReply, PrivateRequest, PublicReply, PublicRequest};
  use mtprotocol::search::MemoSearch;
  use rusqlite::{params, Connection};
  use std::fs;
  use std::path::{Path, PathBuf};

  fn setup(dbname: &str) -> Connection {
    let dbp = Path::new(dbname);
    match fs::remove_file(dbp) {
      Ok(_) => (),
      Err(_) => (),
    }
    dbinit(dbp, None).unwrap();
    connection_open(dbp).unwrap()
  }

  fn testconfig(dbname: &str, admin_id: i64) -> Config {
    Config {
      ip: "127.0.0.1".to_string(),
      port: 0,
      db: PathBuf::from(dbname),
      static_path: None,
      media_path: PathBuf::from("./test-media"),
      media_url_prefix: "/media/".to_string(),
      admin_id,
      login_token_expiration_ms: None,
      open_registration: true,
      smtp: None,
    }
  }

  fn mkuser(conn: &Connection, name: &str) -> i64 {
    new_user(
      &conn,
      &Registration {
        username: name.to_string(),
        pwd: "wat".to_string(),
        nickname: None,
      },
    )
    .unwrap()
  }

  fn mkmemo(
    conn: &Connection,
    uid: i64,
    content: &str,
    show_type: i64,
    tags: Option<Vec<&str>>,
    created_at: Option<&str>,
  ) -> i64 {
    save_memo(
      &conn,
      &Requester::User(uid),
      0,
      &SaveMemo {
        id: None,
        content: content.to_string(),
        imgs: Vec::new(),
        location: None,
        external_url: None,
        external_title: None,
        external_favicon: None,
        pinned: None,
        ext: None,
        show_type: Some(show_type),
        tags: tags.map(|ts| ts.iter().map(|s| s.to_string()).collect()),
        created_at: created_at.map(|s| s.to_string()),
      },
    )
    .unwrap()
    .id
  }

  fn anoncomment(conn: &Connection, memo_id: i64, content: &str) -> i64 {
    add_comment(
      &conn,
      &Requester::Anonymous,
      &AddComment {
        memo_id,
        content: content.to_string(),
        reply_to: None,
        username: Some("passerby".to_string()),
        email: None,
        website: None,
      },
    )
    .unwrap()
    .id
  }

  fn comment_count(conn: &Connection, memo_id: i64) -> i64 {
    conn
      .query_row(
        "select commentCount from memo where id = ?1",
        params![memo_id],
        |row| Ok(row.get(0)?),
      )
      .unwrap()
  }

  fn pinned_count(conn: &Connection) -> i64 {
    conn
      .query_row("select count(*) from memo where pinned = 1", params![], |row| {
        Ok(row.get(0)?)
      })
      .unwrap()
  }

  #[test]
  fn test_anonymous_visibility() {
    let conn = setup("test-anon-visibility.db");
    let u1 = mkuser(&conn, "user1");

    let pubm = mkmemo(&conn, u1, "hello public", 1, None, None);
    let _privm = mkmemo(&conn, u1, "my diary", 0, None, None);
    let _futm = mkmemo(
      &conn,
      u1,
      "scheduled",
      1,
      None,
      Some("2030-01-01T00:00:00.000Z"),
    );

    let r = search_memos(&conn, &Requester::Anonymous, &MemoSearch::default()).unwrap();
    assert_eq!(r.total, 1);
    assert_eq!(r.list.len(), 1);
    assert_eq!(r.list[0].memo.id, pubm);
    for m in &r.list {
      assert_eq!(m.memo.show_type, 1);
    }
  }

  #[test]
  fn test_authenticated_visibility() {
    let conn = setup("test-auth-visibility.db");
    let u1 = mkuser(&conn, "user1");
    let u2 = mkuser(&conn, "user2");

    let u1pub = mkmemo(&conn, u1, "u1 public", 1, None, None);
    let _u1priv = mkmemo(&conn, u1, "u1 private", 0, None, None);
    let _u1fut = mkmemo(
      &conn,
      u1,
      "u1 future",
      1,
      None,
      Some("2030-01-01T00:00:00.000Z"),
    );
    let u2priv = mkmemo(&conn, u2, "u2 private", 0, None, None);
    let u2fut = mkmemo(
      &conn,
      u2,
      "u2 future",
      1,
      None,
      Some("2030-01-01T00:00:00.000Z"),
    );

    // u2 sees u1's published public memo, plus everything of their own,
    // including private and future-dated ones.
    let r = search_memos(&conn, &Requester::User(u2), &MemoSearch::default()).unwrap();
    let ids: Vec<i64> = r.list.iter().map(|m| m.memo.id).collect();
    assert_eq!(r.total, 3);
    assert!(ids.contains(&u1pub));
    assert!(ids.contains(&u2priv));
    assert!(ids.contains(&u2fut));
    for m in &r.list {
      assert!(m.memo.user_id == u2 || (m.memo.show_type == 1 && m.memo.created_at <= crate::util::now_iso()));
    }
  }

  #[test]
  fn test_pagination() {
    let conn = setup("test-pagination.db");
    let u1 = mkuser(&conn, "user1");

    for i in 0..25 {
      mkmemo(
        &conn,
        u1,
        format!("memo {}", i).as_str(),
        1,
        None,
        Some(format!("2026-01-01T00:00:{:02}.000Z", i).as_str()),
      );
    }

    let p1 = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        page: Some(1),
        size: Some(10),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(p1.total, 25);
    assert_eq!(p1.list.len(), 10);
    assert!(p1.has_next);
    // newest first.
    assert_eq!(p1.list[0].memo.content, "memo 24");

    let p3 = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        page: Some(3),
        size: Some(10),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(p3.list.len(), 5);
    assert!(!p3.has_next);

    // a page past the end comes back empty, not an error.
    let p4 = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        page: Some(4),
        size: Some(10),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(p4.total, 25);
    assert_eq!(p4.list.len(), 0);
    assert!(!p4.has_next);
  }

  #[test]
  fn test_size_bounds() {
    let conn = setup("test-size-bounds.db");
    let u1 = mkuser(&conn, "user1");

    for i in 0..105 {
      mkmemo(
        &conn,
        u1,
        format!("memo {}", i).as_str(),
        1,
        None,
        Some(format!("2026-01-01T00:{:02}:{:02}.000Z", i / 60, i % 60).as_str()),
      );
    }

    // requested size above the cap comes back clamped to 100.
    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        size: Some(100000),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 105);
    assert_eq!(r.list.len(), 100);
    assert!(r.has_next);

    // zero or negative size gets floored to one result per page.
    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        size: Some(0),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.list.len(), 1);
    assert!(r.has_next);
  }

  #[test]
  fn test_tag_filter() {
    let conn = setup("test-tag-filter.db");
    let u1 = mkuser(&conn, "user1");

    let _mab = mkmemo(&conn, u1, "tagged ab", 1, Some(vec!["ab"]), None);
    let mgood = mkmemo(&conn, u1, "tagged a and b", 1, Some(vec!["a", "b"]), None);
    let _mba = mkmemo(&conn, u1, "tagged ba", 1, Some(vec!["ba"]), None);

    // "a" must not match "ab" or "ba".
    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        tag: Some("a".to_string()),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 1);
    assert_eq!(r.list[0].memo.id, mgood);

    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        tag: Some("b".to_string()),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 1);
    assert_eq!(r.list[0].memo.id, mgood);

    // untagged memos never match a tag filter.
    let _plain = mkmemo(&conn, u1, "untagged", 1, None, None);
    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        tag: Some("a".to_string()),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 1);
  }

  #[test]
  fn test_time_and_content_filters() {
    let conn = setup("test-time-content.db");
    let u1 = mkuser(&conn, "user1");

    let m1 = mkmemo(
      &conn,
      u1,
      "january note",
      1,
      None,
      Some("2026-01-15T00:00:00.000Z"),
    );
    let m2 = mkmemo(
      &conn,
      u1,
      "march note",
      1,
      None,
      Some("2026-03-15T00:00:00.000Z"),
    );

    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        start: Some("2026-02-01T00:00:00.000Z".to_string()),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 1);
    assert_eq!(r.list[0].memo.id, m2);

    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        end: Some("2026-02-01T00:00:00.000Z".to_string()),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 1);
    assert_eq!(r.list[0].memo.id, m1);

    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        content_contains: Some("march".to_string()),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 1);
    assert_eq!(r.list[0].memo.id, m2);
  }

  #[test]
  fn test_username_filter() {
    let conn = setup("test-username-filter.db");
    let u1 = mkuser(&conn, "user1");
    let u2 = mkuser(&conn, "user2");

    mkmemo(&conn, u1, "u1 memo", 1, None, None);
    mkmemo(&conn, u2, "u2 memo", 1, None, None);

    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        username: Some("user1".to_string()),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 1);
    assert_eq!(r.list[0].memo.user_id, u1);

    // an unknown username drops the filter instead of failing or
    // returning nothing.
    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        username: Some("nobody".to_string()),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 2);
  }

  #[test]
  fn test_show_type_filter() {
    let conn = setup("test-showtype-filter.db");
    let u1 = mkuser(&conn, "user1");

    mkmemo(&conn, u1, "draft one", 0, None, None);
    mkmemo(&conn, u1, "draft two", 0, None, None);
    mkmemo(&conn, u1, "published", 1, None, None);

    // the owner can narrow their own list down to drafts.
    let r = search_memos(
      &conn,
      &Requester::User(u1),
      &MemoSearch {
        show_type: Some(0),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 2);

    // the filter stacks on visibility; it can't open up private memos
    // to anonymous requesters.
    let r = search_memos(
      &conn,
      &Requester::Anonymous,
      &MemoSearch {
        show_type: Some(0),
        ..Default::default()
      },
    )
    .unwrap();
    assert_eq!(r.total, 0);
  }

  #[test]
  fn test_ownership() {
    let conn = setup("test-ownership.db");
    let admin = mkuser(&conn, "admin");
    let u1 = mkuser(&conn, "user1");
    let u2 = mkuser(&conn, "user2");

    let m = mkmemo(&conn, u1, "u1 memo", 1, None, None);

    let update = SaveMemo {
      id: Some(m),
      content: "changed".to_string(),
      imgs: Vec::new(),
      location: None,
      external_url: None,
      external_title: None,
      external_favicon: None,
      pinned: None,
      ext: None,
      show_type: Some(1),
      tags: None,
      created_at: None,
    };

    // another user can't touch it.
    match save_memo(&conn, &Requester::User(u2), admin, &update) {
      Err(Error::Forbidden(_)) => (),
      _ => panic!("expected forbidden"),
    }
    match delete_memo(
      &conn,
      &Requester::User(u2),
      admin,
      Path::new(""),
      "/media/",
      m,
    ) {
      Err(Error::Forbidden(_)) => (),
      _ => panic!("expected forbidden"),
    }

    // anonymous can't save at all.
    match save_memo(&conn, &Requester::Anonymous, admin, &update) {
      Err(Error::NotLoggedIn) => (),
      _ => panic!("expected not logged in"),
    }

    // the owner can.
    save_memo(&conn, &Requester::User(u1), admin, &update).unwrap();
    assert_eq!(read_memo(&conn, m).unwrap().unwrap().content, "changed");

    // so can the admin.
    save_memo(&conn, &Requester::User(admin), admin, &update).unwrap();
    delete_memo(
      &conn,
      &Requester::User(admin),
      admin,
      Path::new(""),
      "/media/",
      m,
    )
    .unwrap();
    assert!(read_memo(&conn, m).unwrap().is_none());
  }

  #[test]
  fn test_pin_exclusivity() {
    let conn = setup("test-pin.db");
    let admin = mkuser(&conn, "admin");
    let u1 = mkuser(&conn, "user1");

    let m1 = mkmemo(&conn, u1, "first", 1, None, Some("2026-01-01T00:00:00.000Z"));
    let m2 = mkmemo(&conn, u1, "second", 1, None, Some("2026-01-02T00:00:00.000Z"));
    let _m3 = mkmemo(&conn, u1, "third", 1, None, Some("2026-01-03T00:00:00.000Z"));

    // owners don't get to pin, only the admin does.
    match set_pinned(&conn, &Requester::User(u1), admin, m1) {
      Err(Error::Forbidden(_)) => (),
      _ => panic!("expected forbidden"),
    }
    match set_pinned(&conn, &Requester::Anonymous, admin, m1) {
      Err(Error::NotLoggedIn) => (),
      _ => panic!("expected not logged in"),
    }

    assert_eq!(set_pinned(&conn, &Requester::User(admin), admin, m1).unwrap(), true);
    assert_eq!(pinned_count(&conn), 1);

    // a pinned memo lists first even when older.
    let r = search_memos(&conn, &Requester::Anonymous, &MemoSearch::default()).unwrap();
    assert_eq!(r.list[0].memo.id, m1);
    assert!(r.list[0].memo.pinned);

    // pinning another memo moves the pin.
    assert_eq!(set_pinned(&conn, &Requester::User(admin), admin, m2).unwrap(), true);
    assert_eq!(pinned_count(&conn), 1);
    let r = search_memos(&conn, &Requester::Anonymous, &MemoSearch::default()).unwrap();
    assert_eq!(r.list[0].memo.id, m2);

    // toggling the pinned memo unpins everything.
    assert_eq!(set_pinned(&conn, &Requester::User(admin), admin, m2).unwrap(), false);
    assert_eq!(pinned_count(&conn), 0);

    match set_pinned(&conn, &Requester::User(admin), admin, 9999) {
      Err(Error::MemoNotFound(_)) => (),
      _ => panic!("expected memo not found"),
    }
  }

  #[test]
  fn test_save_path_keeps_pin_exclusive() {
    let conn = setup("test-save-pin.db");
    let u1 = mkuser(&conn, "user1");

    let mut sm = SaveMemo {
      id: None,
      content: "pin me".to_string(),
      imgs: Vec::new(),
      location: None,
      external_url: None,
      external_title: None,
      external_favicon: None,
      pinned: Some(true),
      ext: None,
      show_type: Some(1),
      tags: None,
      created_at: None,
    };

    let first = save_memo(&conn, &Requester::User(u1), 0, &sm).unwrap().id;
    assert_eq!(pinned_count(&conn), 1);

    sm.content = "pin me instead".to_string();
    let second = save_memo(&conn, &Requester::User(u1), 0, &sm).unwrap().id;
    assert_eq!(pinned_count(&conn), 1);
    assert!(read_memo(&conn, second).unwrap().unwrap().pinned);
    assert!(!read_memo(&conn, first).unwrap().unwrap().pinned);
  }

  #[test]
  fn test_comment_counters() {
    let conn = setup("test-comment-counters.db");
    let admin = mkuser(&conn, "admin");
    let u1 = mkuser(&conn, "user1");

    let m = mkmemo(&conn, u1, "talk to me", 1, None, None);
    assert_eq!(comment_count(&conn, m), 0);

    let c1 = anoncomment(&conn, m, "first");
    let _c2 = anoncomment(&conn, m, "second");
    add_comment(
      &conn,
      &Requester::User(u1),
      &AddComment {
        memo_id: m,
        content: "thanks!".to_string(),
        reply_to: Some(c1),
        username: None,
        email: None,
        website: None,
      },
    )
    .unwrap();
    assert_eq!(comment_count(&conn, m), 3);

    delete_comment(&conn, &Requester::User(admin), admin, c1).unwrap();
    assert_eq!(comment_count(&conn, m), 2);

    // deleting a comment that's already gone doesn't touch the counter.
    match delete_comment(&conn, &Requester::User(admin), admin, c1) {
      Err(Error::CommentNotFound(_)) => (),
      _ => panic!("expected comment not found"),
    }
    assert_eq!(comment_count(&conn, m), 2);

    // likes only ever go up.
    for _ in 0..4 {
      like_memo(&conn, m).unwrap();
    }
    let memo = read_memo(&conn, m).unwrap().unwrap();
    assert_eq!(memo.fav_count, 4);

    match like_memo(&conn, 9999) {
      Err(Error::MemoNotFound(_)) => (),
      _ => panic!("expected memo not found"),
    }
  }

  #[test]
  fn test_comment_attribution() {
    let conn = setup("test-comment-attribution.db");
    let u1 = mkuser(&conn, "user1");
    let u2 = new_user(
      &conn,
      &Registration {
        username: "user2".to_string(),
        pwd: "wat".to_string(),
        nickname: Some("Deux".to_string()),
      },
    )
    .unwrap();

    let m = mkmemo(&conn, u1, "hello", 1, None, None);

    // anonymous attribution keeps the free-form fields.
    let ac = add_comment(
      &conn,
      &Requester::Anonymous,
      &AddComment {
        memo_id: m,
        content: "hi from the street".to_string(),
        reply_to: None,
        username: Some("a stranger".to_string()),
        email: Some("s@example.com".to_string()),
        website: Some("https://example.com".to_string()),
      },
    )
    .unwrap();
    assert_eq!(ac.username, Some("a stranger".to_string()));
    assert_eq!(ac.author, None);

    // a logged-in commenter overrides the free-form name with their
    // nickname and records authorship.
    let uc = add_comment(
      &conn,
      &Requester::User(u2),
      &AddComment {
        memo_id: m,
        content: "hi from deux".to_string(),
        reply_to: None,
        username: Some("impostor".to_string()),
        email: None,
        website: None,
      },
    )
    .unwrap();
    assert_eq!(uc.username, Some("Deux".to_string()));
    assert_eq!(uc.author, Some(u2));

    // both parameters are required.
    match add_comment(
      &conn,
      &Requester::Anonymous,
      &AddComment {
        memo_id: m,
        content: "   ".to_string(),
        reply_to: None,
        username: None,
        email: None,
        website: None,
      },
    ) {
      Err(Error::ParamError(_)) => (),
      _ => panic!("expected param error"),
    }

    // and the memo has to exist.
    match add_comment(
      &conn,
      &Requester::Anonymous,
      &AddComment {
        memo_id: 9999,
        content: "shouting into the void".to_string(),
        reply_to: None,
        username: None,
        email: None,
        website: None,
      },
    ) {
      Err(Error::MemoNotFound(_)) => (),
      _ => panic!("expected memo not found"),
    }
    assert_eq!(comment_count(&conn, m), 2);
  }

  #[test]
  fn test_get_memo() {
    let conn = setup("test-get-memo.db");
    let u1 = mkuser(&conn, "user1");
    let u2 = mkuser(&conn, "user2");

    let privm = mkmemo(&conn, u1, "private thoughts", 0, None, None);

    match read_memo_and_comments(&conn, &Requester::Anonymous, privm) {
      Err(Error::MemoIsPrivate(_)) => (),
      _ => panic!("expected memo is private"),
    }
    match read_memo_and_comments(&conn, &Requester::User(u2), privm) {
      Err(Error::MemoIsPrivate(_)) => (),
      _ => panic!("expected memo is private"),
    }
    let mc = read_memo_and_comments(&conn, &Requester::User(u1), privm).unwrap();
    assert_eq!(mc.memo.id, privm);

    match read_memo_and_comments(&conn, &Requester::Anonymous, 9999) {
      Err(Error::MemoNotFound(_)) => (),
      _ => panic!("expected memo not found"),
    }

    // hydration: owner profile, image configs from the joined string,
    // empty segments dropped.
    let m = save_memo(
      &conn,
      &Requester::User(u1),
      0,
      &SaveMemo {
        id: None,
        content: "with pictures".to_string(),
        imgs: vec![
          "/media/a.png".to_string(),
          "".to_string(),
          "/media/b.png".to_string(),
        ],
        location: None,
        external_url: None,
        external_title: None,
        external_favicon: None,
        pinned: None,
        ext: None,
        show_type: Some(1),
        tags: None,
        created_at: None,
      },
    )
    .unwrap()
    .id;

    let mc = read_memo_and_comments(&conn, &Requester::Anonymous, m).unwrap();
    assert_eq!(mc.user.as_ref().unwrap().username, "user1");
    assert_eq!(mc.img_configs.len(), 2);
    assert_eq!(mc.img_configs[0].url, "/media/a.png");
    assert_eq!(mc.img_configs[0].thumb_url, "/media/a.png");
  }

  #[test]
  fn test_memo_update_fields() {
    let conn = setup("test-memo-update.db");
    let u1 = mkuser(&conn, "user1");

    let m = mkmemo(
      &conn,
      u1,
      "original",
      1,
      Some(vec!["go"]),
      Some("2026-01-01T00:00:00.000Z"),
    );

    save_memo(
      &conn,
      &Requester::User(u1),
      0,
      &SaveMemo {
        id: Some(m),
        content: "edited".to_string(),
        imgs: Vec::new(),
        location: Some("home".to_string()),
        external_url: None,
        external_title: None,
        external_favicon: None,
        pinned: None,
        ext: None,
        show_type: Some(0),
        tags: Some(vec!["rust".to_string()]),
        created_at: None,
      },
    )
    .unwrap();

    let memo = read_memo(&conn, m).unwrap().unwrap();
    assert_eq!(memo.content, "edited");
    assert_eq!(memo.tags, Some("rust,".to_string()));
    assert_eq!(memo.location, Some("home".to_string()));
    assert_eq!(memo.show_type, 0);
    // creation time survives edits; only updatedAt moves.
    assert_eq!(memo.created_at, "2026-01-01T00:00:00.000Z");
    assert!(memo.updated_at > memo.created_at);
  }

  #[test]
  fn test_delete_memo_cascades_comments() {
    let conn = setup("test-delete-cascade.db");
    let u1 = mkuser(&conn, "user1");

    let m = mkmemo(&conn, u1, "doomed", 1, None, None);
    anoncomment(&conn, m, "one");
    anoncomment(&conn, m, "two");

    delete_memo(&conn, &Requester::User(u1), 0, Path::new(""), "/media/", m).unwrap();
    assert!(read_memo(&conn, m).unwrap().is_none());

    let orphans: i64 = conn
      .query_row(
        "select count(*) from comment where memoId = ?1",
        params![m],
        |row| Ok(row.get(0)?),
      )
      .unwrap();
    assert_eq!(orphans, 0);
  }

  #[test]
  fn test_reads_are_idempotent() {
    let conn = setup("test-idempotent.db");
    let u1 = mkuser(&conn, "user1");

    let m = mkmemo(&conn, u1, "steady", 1, None, None);
    anoncomment(&conn, m, "hi");
    like_memo(&conn, m).unwrap();

    let a = read_memo(&conn, m).unwrap().unwrap();
    let b = read_memo(&conn, m).unwrap().unwrap();
    assert_eq!(a.fav_count, b.fav_count);
    assert_eq!(a.comment_count, b.comment_count);
    assert_eq!(a.pinned, b.pinned);
  }

  #[test]
  fn test_comment_preview_limit() {
    let conn = setup("test-comment-preview.db");
    let u1 = mkuser(&conn, "user1");

    let m = mkmemo(&conn, u1, "chatty", 1, None, None);
    for i in 0..7 {
      anoncomment(&conn, m, format!("comment {}", i).as_str());
    }

    // listing previews the 5 most recent comments; the full read has all.
    let r = search_memos(&conn, &Requester::Anonymous, &MemoSearch::default()).unwrap();
    assert_eq!(r.list[0].comments.len(), 5);
    assert_eq!(r.list[0].memo.comment_count, 7);

    let mc = read_memo_and_comments(&conn, &Requester::Anonymous, m).unwrap();
    assert_eq!(mc.comments.len(), 7);
  }

  #[test]
  fn test_login_and_tokens() {
    let conn = setup("test-login.db");

    let ld = register(
      &conn,
      &Registration {
        username: "user1".to_string(),
        pwd: "secret".to_string(),
        nickname: None,
      },
    )
    .unwrap();
    let uid = ld.profile.id;

    assert_eq!(
      read_user_by_token(&conn, ld.token.as_str(), None).unwrap(),
      Some(uid)
    );

    // a second registration under the same name is rejected.
    match register(
      &conn,
      &Registration {
        username: "user1".to_string(),
        pwd: "other".to_string(),
        nickname: None,
      },
    ) {
      Err(Error::ParamError(_)) => (),
      _ => panic!("expected param error"),
    }

    match login(
      &conn,
      &Login {
        username: "user1".to_string(),
        pwd: "wrong".to_string(),
      },
    ) {
      Err(Error::LoginFailed) => (),
      _ => panic!("expected login failed"),
    }

    let ld2 = login(
      &conn,
      &Login {
        username: "user1".to_string(),
        pwd: "secret".to_string(),
      },
    )
    .unwrap();
    assert_eq!(ld2.profile.id, uid);

    // logout kills the token.
    delete_login_token(&conn, ld2.token.as_str()).unwrap();
    assert_eq!(read_user_by_token(&conn, ld2.token.as_str(), None).unwrap(), None);

    // a zero expiration window makes every token stale.
    std::thread::sleep(std::time::Duration::from_millis(5));
    assert_eq!(
      read_user_by_token(&conn, ld.token.as_str(), Some(0)).unwrap(),
      None
    );
  }

  #[test]
  fn test_profiles() {
    let conn = setup("test-profiles.db");
    let u1 = mkuser(&conn, "user1");

    assert!(read_profile_by_name(&conn, "nobody").unwrap().is_none());

    let p = read_profile_by_name(&conn, "user1").unwrap().unwrap();
    assert_eq!(p.id, u1);
    assert_eq!(p.nickname, "user1");

    let p = update_profile(
      &conn,
      &Requester::User(u1),
      &SaveProfile {
        nickname: Some("Numero Uno".to_string()),
        slogan: Some("first!".to_string()),
        avatar_url: None,
        cover_url: None,
        email: Some("uno@example.com".to_string()),
      },
    )
    .unwrap();
    assert_eq!(p.nickname, "Numero Uno");
    assert_eq!(p.slogan, Some("first!".to_string()));

    match update_profile(&conn, &Requester::Anonymous, &SaveProfile {
      nickname: None,
      slogan: None,
      avatar_url: None,
      cover_url: None,
      email: None,
    }) {
      Err(Error::NotLoggedIn) => (),
      _ => panic!("expected not logged in"),
    }
  }

  #[test]
  fn test_list_tags() {
    let conn = setup("test-list-tags.db");
    let u1 = mkuser(&conn, "user1");

    mkmemo(&conn, u1, "one", 1, Some(vec!["go", "rust"]), None);
    mkmemo(&conn, u1, "two", 1, Some(vec!["rust"]), None);
    // private memos don't leak their tags into the cloud.
    mkmemo(&conn, u1, "secret", 0, Some(vec!["hidden"]), None);

    let tags = list_tags(&conn).unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].tag, "rust");
    assert_eq!(tags[0].count, 2);
    assert_eq!(tags[1].tag, "go");
    assert_eq!(tags[1].count, 1);
  }

  #[test]
  fn test_end_to_end() {
    let dbname = "test-end-to-end.db";
    let conn = setup(dbname);

    let admin = mkuser(&conn, "admin");
    let u2 = mkuser(&conn, "user2");
    let config = testconfig(dbname, admin);

    // user 2 posts a public memo tagged go and rust.
    let saved = match interfaces::private_interface(
      &config,
      &conn,
      &Requester::User(u2),
      &PrivateRequest::PvqSaveMemo(SaveMemo {
        id: None,
        content: "systems languages".to_string(),
        imgs: Vec::new(),
        location: None,
        external_url: None,
        external_title: None,
        external_favicon: None,
        pinned: None,
        ext: None,
        show_type: Some(1),
        tags: Some(vec!["go".to_string(), "rust".to_string()]),
        created_at: None,
      }),
    )
    .unwrap()
    {
      PrivateReply::PvySavedMemo(sm) => sm,
      _ => panic!("unexpected reply"),
    };

    // anonymous tag search finds exactly that memo, comment-free.
    let r = match interfaces::public_interface(
      &config,
      &conn,
      &Requester::Anonymous,
      &PublicRequest::PbqListMemos(MemoSearch {
        tag: Some("go".to_string()),
        ..Default::default()
      }),
    )
    .unwrap()
    {
      PublicReply::PbyMemoSearchResult(r) => r,
      _ => panic!("unexpected reply"),
    };
    assert_eq!(r.total, 1);
    assert_eq!(r.list[0].memo.id, saved.id);
    assert_eq!(r.list[0].memo.comment_count, 0);
    assert_eq!(r.list[0].user.as_ref().unwrap().username, "user2");

    // an anonymous comment bumps the counter.
    let comment = match interfaces::public_interface(
      &config,
      &conn,
      &Requester::Anonymous,
      &PublicRequest::PbqAddComment(AddComment {
        memo_id: saved.id,
        content: "nice pair".to_string(),
        reply_to: None,
        username: Some("drive-by".to_string()),
        email: None,
        website: None,
      }),
    )
    .unwrap()
    {
      PublicReply::PbyCommentAdded(c) => c,
      _ => panic!("unexpected reply"),
    };
    assert_eq!(comment_count(&conn, saved.id), 1);

    // the memo's own author may not remove the comment; the admin may.
    match interfaces::private_interface(
      &config,
      &conn,
      &Requester::User(u2),
      &PrivateRequest::PvqRemoveComment(comment.id),
    ) {
      Err(Error::Forbidden(_)) => (),
      _ => panic!("expected forbidden"),
    }
    interfaces::private_interface(
      &config,
      &conn,
      &Requester::User(admin),
      &PrivateRequest::PvqRemoveComment(comment.id),
    )
    .unwrap();
    assert_eq!(comment_count(&conn, saved.id), 0);
  }
}
