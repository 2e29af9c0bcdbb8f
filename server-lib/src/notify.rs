use crate::config::SmtpConfig;
use crate::error as mterr;
use lettre::{Message, SmtpTransport, Transport};
use log::{error, info};

#[derive(Debug, Clone)]
pub struct CommentNotification {
  pub memo_id: i64,
  pub memo_content: String,
  pub owner_email: String,
  pub commenter: String,
  pub comment_content: String,
}

/// Send from a detached thread.  The triggering request never observes
/// the outcome; failures only show up in the log.
pub fn spawn_comment_notification(smtp: SmtpConfig, cn: CommentNotification) {
  std::thread::spawn(move || match send_comment_notification(&smtp, &cn) {
    Ok(_) => info!("comment notification sent for memo {}", cn.memo_id),
    Err(e) => error!(
      "comment notification failed for memo {}: {:?}",
      cn.memo_id, e
    ),
  });
}

pub fn send_comment_notification(
  smtp: &SmtpConfig,
  cn: &CommentNotification,
) -> Result<(), mterr::Error> {
  let email = Message::builder()
    .from(smtp.from.parse()?)
    .to(cn.owner_email.parse()?)
    .subject(format!("new comment from {}", cn.commenter))
    .body(format!(
      "{} commented on your memo \"{}\":\n\n{}\n\n{}/memo/{}",
      cn.commenter,
      preview(cn.memo_content.as_str(), 60),
      cn.comment_content,
      smtp.mainsite,
      cn.memo_id
    ))?;

  let mailer = SmtpTransport::relay(smtp.relay.as_str())?.build();
  mailer.send(&email)?;
  Ok(())
}

fn preview(content: &str, max_chars: usize) -> String {
  if content.len() <= max_chars {
    content.to_string()
  } else {
    let end = content
      .char_indices()
      .take_while(|(i, _)| *i < max_chars)
      .last()
      .map(|(i, c)| i + c.len_utf8())
      .unwrap_or(max_chars);
    format!("{}...", &content[..end])
  }
}
