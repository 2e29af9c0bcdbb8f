use crate::error as mterr;

/// Resolved requester identity.  Token verification happens upstream;
/// everything below only branches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
  Anonymous,
  User(i64),
}

impl Requester {
  pub fn uid(&self) -> Option<i64> {
    match self {
      Requester::Anonymous => None,
      Requester::User(uid) => Some(*uid),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  SaveMemo,
  RemoveMemo,
  SetPinned,
  RemoveComment,
}

/// The one ownership rule, checked before every mutation.  `owner` is the
/// resource owner when the resource already exists, None on creation.
/// Returns the acting user id, or NotLoggedIn / Forbidden.
pub fn check(
  requester: &Requester,
  owner: Option<i64>,
  action: Action,
  admin_id: i64,
) -> Result<i64, mterr::Error> {
  let uid = match requester {
    Requester::Anonymous => return Err(mterr::Error::NotLoggedIn),
    Requester::User(uid) => *uid,
  };

  let allowed = match action {
    // creating is open to any logged-in user; editing takes the owner or the admin.
    Action::SaveMemo => match owner {
      None => true,
      Some(o) => uid == o || uid == admin_id,
    },
    Action::RemoveMemo => match owner {
      None => false,
      Some(o) => uid == o || uid == admin_id,
    },
    // pinning is admin-only; owners can't feature their own memos.
    Action::SetPinned => uid == admin_id,
    // note the asymmetry: a memo's owner may not delete comments on it.
    Action::RemoveComment => uid == admin_id,
  };

  if allowed {
    Ok(uid)
  } else {
    match action {
      Action::SaveMemo => Err(mterr::Error::Forbidden("not the memo owner".to_string())),
      Action::RemoveMemo => Err(mterr::Error::Forbidden("not the memo owner".to_string())),
      Action::SetPinned => Err(mterr::Error::Forbidden("pinning is admin only".to_string())),
      Action::RemoveComment => Err(mterr::Error::Forbidden(
        "comment removal is admin only".to_string(),
      )),
    }
  }
}
