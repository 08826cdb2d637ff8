//! The application's form types and their mapping tables

use std::sync::LazyLock;

use super::binder::{BindForm, BindingError, FormBinder};
use super::rules::{EMAIL_RX, matches, max_chars, min_chars, not_blank, permitted_value};
use super::validation::ValidationResult;

const BLANK: &str = "This field cannot be blank";
const INVALID_EMAIL: &str = "This field must be a valid email address";

const PERMITTED_EXPIRY_DAYS: [i64; 3] = [1, 7, 365];
const DEFAULT_EXPIRY_DAYS: i64 = 365;

macro_rules! form_binder {
    ($form:ty) => {
        fn binder() -> &'static FormBinder<$form> {
            static BINDER: LazyLock<FormBinder<$form>> = LazyLock::new(|| {
                <$form>::mapping().unwrap_or_else(|e| {
                    panic!("invalid form mapping for {}: {e}", stringify!($form))
                })
            });
            &BINDER
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub expires: i64,
    pub validation: ValidationResult,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: DEFAULT_EXPIRY_DAYS,
            validation: ValidationResult::default(),
        }
    }
}

impl BindForm for SnippetCreateForm {
    fn mapping() -> Result<FormBinder<Self>, BindingError> {
        FormBinder::<Self>::builder()
            .text("title", |f, v| f.title = v)
            .text("content", |f, v| f.content = v)
            .int("expires", |f, v| f.expires = v)
            .ignore("validation")
            .build()
    }

    form_binder!(SnippetCreateForm);
}

impl SnippetCreateForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validation;
        v.check_field(not_blank(&self.title), "title", BLANK);
        v.check_field(
            max_chars(&self.title, 100),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(not_blank(&self.content), "content", BLANK);
        v.check_field(
            permitted_value(self.expires, &PERMITTED_EXPIRY_DAYS),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        v.valid()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub validation: ValidationResult,
}

impl BindForm for UserSignupForm {
    fn mapping() -> Result<FormBinder<Self>, BindingError> {
        FormBinder::<Self>::builder()
            .text("name", |f, v| f.name = v)
            .text("email", |f, v| f.email = v)
            .text("password", |f, v| f.password = v)
            .ignore("validation")
            .build()
    }

    form_binder!(UserSignupForm);
}

impl UserSignupForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validation;
        v.check_field(not_blank(&self.name), "name", BLANK);
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(matches(&self.email, &EMAIL_RX), "email", INVALID_EMAIL);
        v.check_field(not_blank(&self.password), "password", BLANK);
        v.check_field(
            min_chars(&self.password, 8),
            "password",
            "This field must be at least 8 characters long",
        );
        v.valid()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserLoginForm {
    pub email: String,
    pub password: String,
    pub validation: ValidationResult,
}

impl BindForm for UserLoginForm {
    fn mapping() -> Result<FormBinder<Self>, BindingError> {
        FormBinder::<Self>::builder()
            .text("email", |f, v| f.email = v)
            .text("password", |f, v| f.password = v)
            .ignore("validation")
            .build()
    }

    form_binder!(UserLoginForm);
}

impl UserLoginForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validation;
        v.check_field(not_blank(&self.email), "email", BLANK);
        v.check_field(matches(&self.email, &EMAIL_RX), "email", INVALID_EMAIL);
        v.check_field(not_blank(&self.password), "password", BLANK);
        v.valid()
    }
}

/// Builds every form mapping table, failing on the first malformed one.
///
/// Call once at startup so a broken table stops the process instead of a request.
pub fn validate_form_bindings() -> Result<(), BindingError> {
    SnippetCreateForm::mapping()?;
    UserSignupForm::mapping()?;
    UserLoginForm::mapping()?;
    tracing::debug!("Form mappings validated");
    Ok(())
}
