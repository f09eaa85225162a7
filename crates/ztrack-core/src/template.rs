//! HTML rendering of the email sent when a message is answered.

use crate::{
  message::{ContactMessage, Response},
  notify::OutboundEmail,
};

pub const DEFAULT_COMPANY_NAME: &str = "Contact System";

const STYLE: &str = "
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
    .container { max-width: 600px; margin: 0 auto; padding: 20px; }
    .header { background: #667eea; color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0; }
    .content { background: #f8f9fa; padding: 30px; border-radius: 0 0 10px 10px; }
    .original { background: #e9ecef; padding: 20px; border-left: 4px solid #6c757d; margin: 20px 0; }
    .response { background: white; padding: 20px; border-left: 4px solid #28a745; margin: 20px 0; }
    .footer { text-align: center; margin-top: 30px; padding-top: 20px; border-top: 1px solid #dee2e6; color: #6c757d; font-size: 14px; }
";

/// Render the notification for `message`, which must carry a response.
/// Returns `None` for an unanswered message.
pub fn render_response(
  company: &str,
  message: &ContactMessage,
) -> Option<OutboundEmail> {
  let Response { text, responded_by, .. } = message.response.as_ref()?;

  let html = format!(
    r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>{STYLE}</style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>A reply to your message</h1>
    </div>
    <div class="content">
      <p>Hello <strong>{name}</strong>,</p>
      <p>Thank you for getting in touch. We have read your message and would like to reply:</p>
      <div class="original">
        <h3>Your original message:</h3>
        <p><em>"{body}"</em></p>
      </div>
      <div class="response">
        <h3>Our reply:</h3>
        <p>{text}</p>
        <p><small>- {responded_by}</small></p>
      </div>
      <p>If you have any further questions, feel free to contact us again.</p>
      <div class="footer">
        <p>This email was sent from our contact management system.</p>
        <p>{company}</p>
      </div>
    </div>
  </div>
</body>
</html>
"#,
    name = escape_html(&message.name),
    body = escape_html(&message.body),
    text = escape_html(text),
    responded_by = escape_html(responded_by),
    company = escape_html(company),
  );

  Some(OutboundEmail {
    to: message.email.clone(),
    subject: format!("Response to your message - {company}"),
    html,
  })
}

/// Fixed email used to check the transport configuration.
pub fn render_test(company: &str, to: &str) -> OutboundEmail {
  OutboundEmail {
    to:      to.to_owned(),
    subject: format!("Email configuration test - {company}"),
    html:    "<h1>Email is configured correctly!</h1>\
              <p>The notification system is working.</p>"
      .to_owned(),
  }
}

/// Escape the characters that are significant in HTML text and attributes.
pub fn escape_html(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::message::Status;

  fn answered(name: &str, body: &str, text: &str) -> ContactMessage {
    let now = Utc::now();
    ContactMessage {
      id:         Uuid::new_v4(),
      name:       name.into(),
      email:      "a@x.com".into(),
      body:       body.into(),
      status:     Status::Answered,
      response:   Some(Response {
        text:         text.into(),
        responded_by: "Bea".into(),
        responded_at: now,
      }),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn renders_subject_recipient_and_content() {
    let email =
      render_response("ZTRACK", &answered("Ana", "hi", "Thanks!")).unwrap();
    assert_eq!(email.to, "a@x.com");
    assert_eq!(email.subject, "Response to your message - ZTRACK");
    assert!(email.html.contains("<strong>Ana</strong>"));
    assert!(email.html.contains("Thanks!"));
    assert!(email.html.contains("- Bea"));
  }

  #[test]
  fn escapes_submitter_content() {
    let email = render_response(
      "ZTRACK",
      &answered("<script>", "a & b", "\"quoted\""),
    )
    .unwrap();
    assert!(!email.html.contains("<script>"));
    assert!(email.html.contains("&lt;script&gt;"));
    assert!(email.html.contains("a &amp; b"));
    assert!(email.html.contains("&quot;quoted&quot;"));
  }

  #[test]
  fn unanswered_message_has_no_email() {
    let mut message = answered("Ana", "hi", "x");
    message.response = None;
    assert!(render_response("ZTRACK", &message).is_none());
  }
}
