use std::collections::HashSet;

use thiserror::Error;

use super::data::FormData;

/// Name that can never be used as a form key
const IGNORE_MARKER: &str = "-";

/// A submitted value that could not be converted to the field's type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid value {value:?} for field {key:?}: expected {expected}")]
pub struct ConversionError {
    pub key: String,
    pub value: String,
    pub expected: &'static str,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// The form's mapping table itself is wrong
    #[error("Malformed form mapping for {key:?}: {reason}")]
    MalformedMapping { key: String, reason: String },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

enum Setter<F> {
    Text(fn(&mut F, String)),
    Int(fn(&mut F, i64)),
    Bool(fn(&mut F, bool)),
}

impl<F> Setter<F> {
    fn apply(&self, form: &mut F, key: &str, raw: &str) -> Result<(), ConversionError> {
        let conversion_error = |expected| ConversionError {
            key: key.to_string(),
            value: raw.to_string(),
            expected,
        };

        match self {
            Setter::Text(set) => set(form, raw.to_string()),
            Setter::Int(_) | Setter::Bool(_) if raw.is_empty() => {}
            Setter::Int(set) => {
                let value = raw.trim().parse().map_err(|_| conversion_error("integer"))?;
                set(form, value);
            }
            Setter::Bool(set) => {
                let value = match raw {
                    "true" | "on" | "1" => true,
                    "false" | "off" | "0" => false,
                    _ => return Err(conversion_error("boolean")),
                };
                set(form, value);
            }
        }
        Ok(())
    }
}

/// Validated mapping from submitted keys to the fields of `F`
pub struct FormBinder<F> {
    fields: Vec<(String, Setter<F>)>,
    ignored: Vec<String>,
}

impl<F> std::fmt::Debug for FormBinder<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormBinder")
            .field(
                "fields",
                &self.fields.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .field("ignored", &self.ignored)
            .finish()
    }
}

impl<F> FormBinder<F> {
    pub fn builder() -> FormBinderBuilder<F> {
        FormBinderBuilder {
            fields: Vec::new(),
            ignored: Vec::new(),
        }
    }

    /// Copies submitted values into `form`.
    ///
    /// Keys the mapping does not know are ignored, absent keys leave fields untouched
    /// and only the first of repeated values is used. No validation happens here.
    pub fn bind(&self, data: &FormData, form: &mut F) -> Result<(), BindingError> {
        for (key, setter) in &self.fields {
            if let Some(raw) = data.first(key) {
                setter.apply(form, key, raw)?;
            }
        }
        Ok(())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }
}

pub struct FormBinderBuilder<F> {
    fields: Vec<(String, Setter<F>)>,
    ignored: Vec<String>,
}

impl<F> FormBinderBuilder<F> {
    pub fn text(mut self, key: &str, set: fn(&mut F, String)) -> Self {
        self.fields.push((key.to_string(), Setter::Text(set)));
        self
    }

    pub fn int(mut self, key: &str, set: fn(&mut F, i64)) -> Self {
        self.fields.push((key.to_string(), Setter::Int(set)));
        self
    }

    pub fn boolean(mut self, key: &str, set: fn(&mut F, bool)) -> Self {
        self.fields.push((key.to_string(), Setter::Bool(set)));
        self
    }

    /// Marks a struct member as deliberately not bound from the submission
    pub fn ignore(mut self, name: &str) -> Self {
        self.ignored.push(name.to_string());
        self
    }

    pub fn build(self) -> Result<FormBinder<F>, BindingError> {
        let malformed = |key: &str, reason: &str| BindingError::MalformedMapping {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        let mut seen = HashSet::new();
        for (key, _) in &self.fields {
            if key.is_empty() {
                return Err(malformed(key, "empty key"));
            }
            if key == IGNORE_MARKER {
                return Err(malformed(key, "the ignore marker cannot be used as a key"));
            }
            if !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            {
                return Err(malformed(key, "key contains invalid characters"));
            }
            if !seen.insert(key.as_str()) {
                return Err(malformed(key, "duplicate key"));
            }
        }

        let mut ignored = HashSet::new();
        for name in &self.ignored {
            if seen.contains(name.as_str()) {
                return Err(malformed(name, "name is both bound and ignored"));
            }
            if !ignored.insert(name.as_str()) {
                return Err(malformed(name, "name ignored twice"));
            }
        }

        Ok(FormBinder {
            fields: self.fields,
            ignored: self.ignored,
        })
    }
}

/// A form type with a fixed mapping table.
///
/// Implementors keep the built binder in a `static` so the table is validated once;
/// [`validate_form_bindings`](super::validate_form_bindings) forces that at startup.
pub trait BindForm: Sized + 'static {
    /// Builds the mapping table for this form
    fn mapping() -> Result<FormBinder<Self>, BindingError>;

    /// The shared, already validated binder
    fn binder() -> &'static FormBinder<Self>;

    fn bind(&mut self, data: &FormData) -> Result<(), BindingError> {
        Self::binder().bind(data, self)
    }
}
