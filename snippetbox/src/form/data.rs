use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormDataError {
    #[error("Invalid percent-encoding in form body")]
    InvalidEncoding,

    #[error("Form body is not valid UTF-8")]
    InvalidUtf8,
}

/// Decoded `application/x-www-form-urlencoded` submission: key → values in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    values: HashMap<String, Vec<String>>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a form body.
    ///
    /// Unlike lenient decoders, malformed `%` escapes and invalid UTF-8 are
    /// rejected instead of being replaced.
    pub fn parse_urlencoded(body: &[u8]) -> Result<Self, FormDataError> {
        for component in body.split(|&b| b == b'&' || b == b'=') {
            if String::from_utf8(percent_decode(component)?).is_err() {
                return Err(FormDataError::InvalidUtf8);
            }
        }

        let mut data = Self::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            data.append(key.into_owned(), value.into_owned());
        }
        Ok(data)
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// First submitted value for `key`
    pub fn first(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (key, value) in iter {
            data.append(key, value);
        }
        data
    }
}

/// Decodes `%XX` escapes of one key or value, rejecting truncated or non-hex escapes
fn percent_decode(component: &[u8]) -> Result<Vec<u8>, FormDataError> {
    let mut out = Vec::with_capacity(component.len());
    let mut i = 0;
    while i < component.len() {
        match component[i] {
            b'%' => {
                let hex = component
                    .get(i + 1..i + 3)
                    .filter(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or(FormDataError::InvalidEncoding)?;
                out.push(hex);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    Ok(out)
}
