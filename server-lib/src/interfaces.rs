use crate::access::Requester;
use crate::config::Config;
use crate::error as mterr;
use crate::notify;
use crate::search;
use crate::sqldata;
use log::{error, info};
use mtprotocol::messages::{
  PrivateReply, PrivateRequest, PublicReply, PublicRequest, UserReply, UserRequest,
};
use rusqlite::Connection;

// requests that work with or without identity; the requester only
// changes what the predicate lets through.
pub fn public_interface(
  config: &Config,
  conn: &Connection,
  requester: &Requester,
  msg: &PublicRequest,
) -> Result<PublicReply, mterr::Error> {
  match msg {
    PublicRequest::PbqListMemos(s) => Ok(PublicReply::PbyMemoSearchResult(
      search::search_memos(&conn, requester, s)?,
    )),
    PublicRequest::PbqGetMemo(id) => Ok(PublicReply::PbyMemo(
      sqldata::read_memo_and_comments(&conn, requester, *id)?,
    )),
    PublicRequest::PbqLikeMemo(id) => {
      sqldata::like_memo(&conn, *id)?;
      Ok(PublicReply::PbyLiked(*id))
    }
    PublicRequest::PbqAddComment(ac) => {
      let comment = sqldata::add_comment(&conn, requester, ac)?;
      info!("comment {} added to memo {}", comment.id, comment.memo_id);

      if let Some(smtp) = &config.smtp {
        match sqldata::comment_notification(&conn, &comment) {
          Ok(Some(cn)) => notify::spawn_comment_notification(smtp.clone(), cn),
          Ok(None) => (),
          // the notification must never fail the comment itself.
          Err(e) => error!("comment notification lookup failed: {:?}", e),
        }
      }

      Ok(PublicReply::PbyCommentAdded(comment))
    }
    PublicRequest::PbqGetProfile(username) => {
      match sqldata::read_profile_by_name(&conn, username.as_str())? {
        Some(p) => Ok(PublicReply::PbyProfile(p)),
        None => Err(mterr::Error::UserNotFound(username.clone())),
      }
    }
    PublicRequest::PbqListTags => Ok(PublicReply::PbyTags(sqldata::list_tags(&conn)?)),
  }
}

// requests that require a logged-in requester; ownership checks happen
// below in sqldata against the admin id from config.
pub fn private_interface(
  config: &Config,
  conn: &Connection,
  requester: &Requester,
  msg: &PrivateRequest,
) -> Result<PrivateReply, mterr::Error> {
  info!("private_interface msg: {:?}", msg);
  match msg {
    PrivateRequest::PvqSaveMemo(sm) => Ok(PrivateReply::PvySavedMemo(sqldata::save_memo(
      &conn,
      requester,
      config.admin_id,
      sm,
    )?)),
    PrivateRequest::PvqRemoveMemo(id) => {
      sqldata::delete_memo(
        &conn,
        requester,
        config.admin_id,
        config.media_path.as_path(),
        config.media_url_prefix.as_str(),
        *id,
      )?;
      info!("memo {} removed", id);
      Ok(PrivateReply::PvyRemovedMemo(*id))
    }
    PrivateRequest::PvqSetPinned(id) => {
      let pinned = sqldata::set_pinned(&conn, requester, config.admin_id, *id)?;
      info!("memo {} pinned: {}", id, pinned);
      Ok(PrivateReply::PvyPinnedSet { id: *id, pinned })
    }
    PrivateRequest::PvqRemoveComment(id) => {
      let memo_id = sqldata::delete_comment(&conn, requester, config.admin_id, *id)?;
      info!("comment {} removed from memo {}", id, memo_id);
      Ok(PrivateReply::PvyRemovedComment(*id))
    }
    PrivateRequest::PvqSaveProfile(sp) => Ok(PrivateReply::PvySavedProfile(
      sqldata::update_profile(&conn, requester, sp)?,
    )),
  }
}

pub fn user_interface(
  config: &Config,
  conn: &Connection,
  requester: &Requester,
  token: Option<&str>,
  msg: &UserRequest,
) -> Result<UserReply, mterr::Error> {
  match msg {
    UserRequest::UrqRegister(rd) => {
      if !config.open_registration {
        return Err(mterr::Error::Forbidden("registration is closed".to_string()));
      }
      Ok(UserReply::UryRegistered(sqldata::register(&conn, rd)?))
    }
    UserRequest::UrqLogin(l) => Ok(UserReply::UryLoggedIn(sqldata::login(&conn, l)?)),
    UserRequest::UrqLogout => {
      if let Some(t) = token {
        sqldata::delete_login_token(&conn, t)?;
      }
      Ok(UserReply::UryLoggedOut)
    }
    UserRequest::UrqGetProfile => match requester.uid() {
      Some(uid) => Ok(UserReply::UryProfile(sqldata::read_profile(&conn, uid)?)),
      None => Err(mterr::Error::NotLoggedIn),
    },
  }
}
