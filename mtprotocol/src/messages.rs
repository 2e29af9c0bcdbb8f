use crate::content::{
  AddComment, Comment, Login, LoginData, MemoAndComments, Registration, SaveMemo, SaveProfile,
  SavedMemo, TagCount, UserProfile,
};
use crate::search::{MemoSearch, MemoSearchResult};
use serde_json::Value;

// Requests that work with or without a requester identity.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum PublicRequest {
  PbqListMemos(MemoSearch),
  PbqGetMemo(i64),
  PbqLikeMemo(i64),
  PbqAddComment(AddComment),
  PbqGetProfile(String),
  PbqListTags,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum PublicReply {
  PbyMemoSearchResult(MemoSearchResult),
  PbyMemo(MemoAndComments),
  PbyLiked(i64),
  PbyCommentAdded(Comment),
  PbyProfile(UserProfile),
  PbyTags(Vec<TagCount>),
}

// Requests that require a logged-in requester.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum PrivateRequest {
  PvqSaveMemo(SaveMemo),
  PvqRemoveMemo(i64),
  PvqSetPinned(i64),
  PvqRemoveComment(i64),
  PvqSaveProfile(SaveProfile),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum PrivateReply {
  PvySavedMemo(SavedMemo),
  PvyRemovedMemo(i64),
  PvyPinnedSet { id: i64, pinned: bool },
  PvyRemovedComment(i64),
  PvySavedProfile(UserProfile),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum UserRequest {
  UrqRegister(Registration),
  UrqLogin(Login),
  UrqLogout,
  UrqGetProfile,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum UserReply {
  UryRegistered(LoginData),
  UryLoggedIn(LoginData),
  UryLoggedOut,
  UryProfile(UserProfile),
}

/// Uniform response wrapper.  code 0 is success with `data` set;
/// non-zero codes carry a message instead.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ResultEnvelope {
  pub code: i32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub msg: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
}
