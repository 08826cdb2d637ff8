//! Typed form decoding and validation

mod binder;
mod data;
mod forms;
mod rules;
mod validation;

pub use binder::{BindForm, BindingError, ConversionError, FormBinder, FormBinderBuilder};
pub use data::{FormData, FormDataError};
pub use forms::{SnippetCreateForm, UserLoginForm, UserSignupForm, validate_form_bindings};
pub use rules::{EMAIL_RX, matches, max_chars, min_chars, not_blank, permitted_value};
pub use validation::ValidationResult;
