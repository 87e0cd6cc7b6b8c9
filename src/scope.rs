use crate::attr::{Attr, Value};

/// Attributes and groups accumulated on an encoding destination through
/// `with_attrs` / `with_group`.
///
/// Frame 0 is the root; every `with_group` opens a new named frame.
/// Attributes always go into the innermost frame, record attributes
/// included.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    frames: Vec<Frame>,
}

#[derive(Debug, Clone, Default)]
struct Frame {
    name: Option<String>,
    attrs: Vec<Attr>,
}

impl Scope {
    pub(crate) fn with_attrs(&self, attrs: &[Attr]) -> Scope {
        let mut next = self.clone();
        if next.frames.is_empty() {
            next.frames.push(Frame::default());
        }
        if let Some(frame) = next.frames.last_mut() {
            frame.attrs.extend(attrs.iter().cloned());
        }
        next
    }

    pub(crate) fn with_group(&self, name: &str) -> Scope {
        let mut next = self.clone();
        if next.frames.is_empty() {
            next.frames.push(Frame::default());
        }
        next.frames.push(Frame { name: Some(name.to_string()), attrs: Vec::new() });
        next
    }

    /// Fold the accumulated frames around `record_attrs` into the flat
    /// root-level attribute list an encoder writes out.
    ///
    /// Groups left empty are dropped, as are non-group attrs with an empty
    /// key. A group with an empty key is inlined into its parent.
    pub(crate) fn resolve(&self, record_attrs: &[Attr]) -> Vec<Attr> {
        let mut tail = normalize(record_attrs);
        for frame in self.frames.iter().rev() {
            let mut attrs = normalize(&frame.attrs);
            attrs.append(&mut tail);
            tail = match &frame.name {
                Some(_) if attrs.is_empty() => Vec::new(),
                Some(name) => vec![Attr::new(name.clone(), Value::Group(attrs))],
                None => attrs,
            };
        }
        tail
    }
}

fn normalize(attrs: &[Attr]) -> Vec<Attr> {
    let mut out = Vec::with_capacity(attrs.len());
    for attr in attrs {
        if attr.is_empty() {
            continue;
        }
        match &attr.value {
            Value::Group(members) if attr.key.is_empty() => out.extend(normalize(members)),
            Value::Group(members) => {
                out.push(Attr::new(attr.key.clone(), Value::Group(normalize(members))))
            }
            _ => out.push(attr.clone()),
        }
    }
    out
}
