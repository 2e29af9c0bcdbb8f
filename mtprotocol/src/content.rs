// Wire records.  Field names cross the wire in camelCase.

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
  pub id: i64,
  pub content: String,
  pub imgs: String,
  pub tags: Option<String>,
  pub location: Option<String>,
  pub external_url: Option<String>,
  pub external_title: Option<String>,
  pub external_favicon: Option<String>,
  pub pinned: bool,
  pub show_type: i64,
  pub ext: String,
  pub fav_count: i64,
  pub comment_count: i64,
  pub user_id: i64,
  pub created_at: String,
  pub updated_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id: i64,
  pub content: String,
  pub reply_to: Option<i64>,
  pub username: Option<String>,
  pub email: Option<String>,
  pub website: Option<String>,
  pub author: Option<i64>,
  pub memo_id: i64,
  pub created_at: String,
  pub updated_at: String,
}

/// Public profile fields only; hash, salt and email never leave the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: i64,
  pub username: String,
  pub nickname: String,
  pub slogan: Option<String>,
  pub avatar_url: Option<String>,
  pub cover_url: Option<String>,
}

/// Display config for one image: full url plus thumbnail url.  The
/// thumbnail currently equals the full-size url; the shape is kept for
/// client compatibility.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImgConfig {
  pub url: String,
  pub thumb_url: String,
}

/// A memo hydrated for display: owner profile, latest comments, image
/// configs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemoAndComments {
  #[serde(flatten)]
  pub memo: Memo,
  pub user: Option<UserProfile>,
  pub comments: Vec<Comment>,
  pub img_configs: Vec<ImgConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SaveMemo {
  pub id: Option<i64>,
  pub content: String,
  pub imgs: Vec<String>,
  pub location: Option<String>,
  pub external_url: Option<String>,
  pub external_title: Option<String>,
  pub external_favicon: Option<String>,
  pub pinned: Option<bool>,
  pub ext: Option<serde_json::Value>,
  pub show_type: Option<i64>,
  pub tags: Option<Vec<String>>,
  pub created_at: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SavedMemo {
  pub id: i64,
  pub updated_at: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddComment {
  pub memo_id: i64,
  pub content: String,
  pub reply_to: Option<i64>,
  pub username: Option<String>,
  pub email: Option<String>,
  pub website: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfile {
  pub nickname: Option<String>,
  pub slogan: Option<String>,
  pub avatar_url: Option<String>,
  pub cover_url: Option<String>,
  pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Registration {
  pub username: String,
  pub pwd: String,
  pub nickname: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Login {
  pub username: String,
  pub pwd: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
  pub token: String,
  pub profile: UserProfile,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
  pub tag: String,
  pub count: i64,
}
