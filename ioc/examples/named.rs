use fibre_weave::{
  resolve_from, ClassInfo, Container, InvocationError, Managed, ObjectDescriptor, PropertyKind,
  Value,
};
use parking_lot::Mutex;
use std::sync::Arc;

// --- Two implementations of the same capability ---

#[derive(Default)]
struct EmailSender {
  from: Mutex<String>,
}

impl Managed for EmailSender {
  fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError> {
    match (method, args) {
      ("send", [to, message]) => Ok(
        format!(
          "Sending email from {} to {}: '{}'",
          self.from.lock(),
          to.as_str().unwrap_or_default(),
          message.as_str().unwrap_or_default()
        )
        .into(),
      ),
      _ => Err(InvocationError::BadArguments {
        method: method.into(),
        reason: "expected send(to, message)".into(),
      }),
    }
  }

  fn set_property(&self, name: &str, value: Value) -> Result<(), InvocationError> {
    match name {
      "from" => *self.from.lock() = value.into_string()?,
      _ => {
        return Err(InvocationError::NoSuchProperty {
          class: "EmailSender".into(),
          property: name.into(),
        })
      }
    }
    Ok(())
  }
}

struct SmsSender;

impl Managed for SmsSender {
  fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvocationError> {
    match (method, args) {
      ("send", [to, message]) => Ok(
        format!(
          "Sending SMS to {}: '{}'",
          to.as_str().unwrap_or_default(),
          message.as_str().unwrap_or_default()
        )
        .into(),
      ),
      _ => Err(InvocationError::BadArguments {
        method: method.into(),
        reason: "expected send(to, message)".into(),
      }),
    }
  }
}

fn sender_classes() -> (Arc<ClassInfo>, Arc<ClassInfo>) {
  let email = ClassInfo::builder("EmailSender", EmailSender::default)
    .property("from", PropertyKind::Str)
    .interface("MessageSender", ["send"])
    .build();
  let sms = ClassInfo::builder("SmsSender", || SmsSender)
    .interface("MessageSender", ["send"])
    .build();
  (email, sms)
}

fn main() -> fibre_weave::Result<()> {
  let container = Container::new();
  let (email, sms) = sender_classes();

  // --- Registration ---
  // Both implement `MessageSender`; the names tell them apart.
  container.register(ObjectDescriptor::new("email", email).value("from", "noreply@example.com"))?;
  container.register(ObjectDescriptor::new("sms", sms))?;

  // --- Resolution ---
  let email_notifier = resolve_from!(&container, "email");
  let sms_notifier = resolve_from!(&container, "sms");

  let result1 = email_notifier.invoke("send", &["test@example.com".into(), "Hello from Fibre!".into()])?;
  let result2 = sms_notifier.invoke("send", &["+123456789".into(), "Hello from Fibre!".into()])?;

  println!("{}", result1.as_str().unwrap_or_default());
  println!("{}", result2.as_str().unwrap_or_default());

  // Looking up by capability is ambiguous with two candidates.
  match container.get_by_capability("MessageSender") {
    Err(err) => println!("Lookup by capability: {err}"),
    Ok(_) => unreachable!("two objects declare MessageSender"),
  }
  Ok(())
}
