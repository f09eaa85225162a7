//! Input checks applied before anything is written.

use crate::{Error, Result, message::NewMessage};

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_EMAIL_CHARS: usize = 254;
pub const MAX_BODY_CHARS: usize = 10_000;
pub const MAX_ACTOR_CHARS: usize = 100;

/// Trim and check a contact-form submission.
pub fn new_message(input: NewMessage) -> Result<NewMessage> {
  let name = required("name", &input.name, MAX_NAME_CHARS)?;
  let email = required("email", &input.email, MAX_EMAIL_CHARS)?;
  let body = required("body", &input.body, MAX_BODY_CHARS)?;

  if !is_plausible_email(&email) {
    return Err(Error::Validation(format!("invalid email address: {email:?}")));
  }

  Ok(NewMessage { name, email, body })
}

/// A trimmed, non-blank value of at most `max_chars` characters.
pub fn required(field: &str, value: &str, max_chars: usize) -> Result<String> {
  let value = value.trim();
  if value.is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  if value.chars().count() > max_chars {
    return Err(Error::Validation(format!(
      "{field} exceeds {max_chars} characters"
    )));
  }
  Ok(value.to_owned())
}

/// An optional free-text value: blank counts as absent.
pub fn optional(
  field: &str,
  value: Option<&str>,
  max_chars: Option<usize>,
) -> Result<Option<String>> {
  match value.map(str::trim).filter(|v| !v.is_empty()) {
    None => Ok(None),
    Some(v) => match max_chars {
      Some(max) => required(field, v, max).map(Some),
      None => Ok(Some(v.to_owned())),
    },
  }
}

/// Syntactic check only: one `@`, a non-empty local part, and a domain with
/// an interior dot. Deliverability is the notifier's problem.
pub fn is_plausible_email(address: &str) -> bool {
  if address.chars().any(char::is_whitespace) {
    return false;
  }
  let Some((local, domain)) = address.split_once('@') else {
    return false;
  };
  if local.is_empty() || domain.contains('@') {
    return false;
  }
  match domain.split_once('.') {
    Some((head, _)) => {
      !head.is_empty() && !domain.ends_with('.') && !domain.contains("..")
    }
    None => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input(name: &str, email: &str, body: &str) -> NewMessage {
    NewMessage { name: name.into(), email: email.into(), body: body.into() }
  }

  #[test]
  fn accepts_and_trims_well_formed_submission() {
    let ok = new_message(input("  Ana ", " a@x.com", "hi\n")).unwrap();
    assert_eq!(ok, input("Ana", "a@x.com", "hi"));
  }

  #[test]
  fn rejects_blank_fields() {
    for bad in [
      input("", "a@x.com", "hi"),
      input("Ana", "   ", "hi"),
      input("Ana", "a@x.com", " \t "),
    ] {
      assert!(matches!(new_message(bad), Err(Error::Validation(_))));
    }
  }

  #[test]
  fn rejects_overlong_name() {
    let name = "n".repeat(MAX_NAME_CHARS + 1);
    assert!(new_message(input(&name, "a@x.com", "hi")).is_err());
  }

  #[test]
  fn email_shapes() {
    for good in ["a@x.com", "first.last+tag@mail.example.org"] {
      assert!(is_plausible_email(good), "{good}");
    }
    for bad in [
      "plain",
      "@x.com",
      "a@",
      "a@localhost",
      "a@.com",
      "a@x.com.",
      "a@x..com",
      "a@b@x.com",
      "a b@x.com",
    ] {
      assert!(!is_plausible_email(bad), "{bad}");
    }
  }

  #[test]
  fn optional_treats_blank_as_absent() {
    assert_eq!(optional("note", Some("  "), None).unwrap(), None);
    assert_eq!(optional("note", None, None).unwrap(), None);
    assert_eq!(
      optional("actor", Some(" Bea "), Some(MAX_ACTOR_CHARS)).unwrap(),
      Some("Bea".into()),
    );
    let long = "x".repeat(MAX_ACTOR_CHARS + 1);
    assert!(optional("actor", Some(&long), Some(MAX_ACTOR_CHARS)).is_err());
  }
}
