/* src/server/tags/rust/src/attrs.rs */

//! HTML attribute values and their serialization.
//!
//! Values are emitted verbatim: no escaping is applied, callers supply
//! safe values.

use serde_json::Value;

/// One attribute value. `Absent` and `Bool(false)` suppress the attribute,
/// `Bool(true)` renders the bare name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
  Absent,
  Bool(bool),
  Text(String),
}

impl AttrValue {
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }

  fn is_rendered(&self) -> bool {
    !matches!(self, Self::Absent | Self::Bool(false))
  }
}

impl From<&str> for AttrValue {
  fn from(value: &str) -> Self {
    Self::Text(value.to_string())
  }
}

impl From<String> for AttrValue {
  fn from(value: String) -> Self {
    Self::Text(value)
  }
}

impl From<&String> for AttrValue {
  fn from(value: &String) -> Self {
    Self::Text(value.clone())
  }
}

impl From<bool> for AttrValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
  fn from(value: Option<T>) -> Self {
    value.map_or(Self::Absent, Into::into)
  }
}

macro_rules! impl_attr_value_display {
  ($($ty:ty),*) => {
    $(
      impl From<$ty> for AttrValue {
        fn from(value: $ty) -> Self {
          Self::Text(value.to_string())
        }
      }
    )*
  };
}

impl_attr_value_display!(i32, i64, u16, u32, u64, usize, f64);

impl From<&Value> for AttrValue {
  fn from(value: &Value) -> Self {
    match value {
      Value::Null => Self::Absent,
      Value::Bool(b) => Self::Bool(*b),
      Value::String(s) => Self::Text(s.clone()),
      other => Self::Text(other.to_string()),
    }
  }
}

/// Attribute mapping with stable insertion order. Setting an existing name
/// replaces its value in place, so later writers win without reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
  entries: Vec<(String, AttrValue)>,
}

impl Attributes {
  pub fn new() -> Self {
    Self::default()
  }

  /// Chaining form of [`Attributes::set`].
  pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
    self.set(name, value);
    self
  }

  pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
    let name = name.into();
    let value = value.into();
    match self.entries.iter_mut().find(|(k, _)| *k == name) {
      Some(slot) => slot.1 = value,
      None => self.entries.push((name, value)),
    }
  }

  pub fn get(&self, name: &str) -> Option<&AttrValue> {
    self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
  }

  /// Text value of `name`, if it is set to text.
  pub fn text(&self, name: &str) -> Option<&str> {
    self.get(name).and_then(AttrValue::as_text)
  }

  pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
    let idx = self.entries.iter().position(|(k, _)| k == name)?;
    Some(self.entries.remove(idx).1)
  }

  /// Overlay `other` onto `self`; keys in `other` win.
  pub fn merge(&mut self, other: Attributes) {
    for (name, value) in other.entries {
      self.set(name, value);
    }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }

  /// Serialize to the inside of a tag: `defer data-value="123"`.
  pub fn render(&self) -> String {
    let mut parts = Vec::with_capacity(self.entries.len());
    for (name, value) in &self.entries {
      match value {
        AttrValue::Bool(true) => parts.push(name.clone()),
        AttrValue::Text(text) => parts.push(format!(r#"{name}="{text}""#)),
        _ => {}
      }
    }
    parts.join(" ")
  }

  /// Number of attributes `render` would emit.
  pub fn rendered_len(&self) -> usize {
    self.entries.iter().filter(|(_, v)| v.is_rendered()).count()
  }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut attrs = Self::new();
    for (k, v) in iter {
      attrs.set(k, v);
    }
    attrs
  }
}

impl IntoIterator for Attributes {
  type Item = (String, AttrValue);
  type IntoIter = std::vec::IntoIter<(String, AttrValue)>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.into_iter()
  }
}
