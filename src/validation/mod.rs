//! Request field validation.
//!
//! Handlers collect the raw request fields into an [`Input`] (from a JSON
//! object or from multipart text parts) and pull typed values out of it with a
//! [`Validator`]. Every failed rule is recorded against its field so the client
//! receives all problems at once, then [`Validator::finish`] either yields the
//! assembled command or a 422 with the collected [`FieldErrors`].

use crate::error::{FieldErrors, ServiceError};
use crate::storage::PendingUpload;

use serde_json::{Map, Value};

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Input {
    fields: HashMap<String, Value>,
}

impl Input {
    pub fn new() -> Input {
        Input::default()
    }

    pub fn from_json(object: Map<String, Value>) -> Input {
        Input {
            fields: object.into_iter().collect(),
        }
    }

    /// Form fields are plain text, like multipart text parts.
    pub fn from_form(form: HashMap<String, String>) -> Input {
        Input {
            fields: form
                .into_iter()
                .map(|(field, value)| (field, Value::String(value)))
                .collect(),
        }
    }

    pub fn insert(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_owned(), value);
    }

    pub fn insert_text(&mut self, field: &str, value: Option<String>) {
        if let Some(value) = value {
            self.insert(field, Value::String(value));
        }
    }

    /// Missing, `null` and blank strings all count as absent.
    fn present(&self, field: &str) -> Option<&Value> {
        match self.fields.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(value) => Some(value),
        }
    }
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub struct Validator<'a> {
    input: &'a Input,
    errors: FieldErrors,
}

impl<'a> Validator<'a> {
    pub fn new(input: &'a Input) -> Validator<'a> {
        Validator {
            input,
            errors: FieldErrors::new(),
        }
    }

    fn required(&mut self, field: &str) -> Option<&'a Value> {
        let value = self.input.present(field);
        if value.is_none() {
            self.errors
                .add(field, format!("The {} field is required.", label(field)));
        }
        value
    }

    fn string(&mut self, field: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.errors
                    .add(field, format!("The {} field must be a string.", label(field)));
                None
            }
        }
    }

    pub fn required_string(&mut self, field: &str) -> Option<String> {
        let value = self.required(field)?;
        self.string(field, value)
    }

    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        let value = self.input.present(field)?;
        self.string(field, value)
    }

    /// Emails are compared case-insensitively, so they come back lowercased.
    pub fn required_email(&mut self, field: &str) -> Option<String> {
        let email = self.required_string(field)?.trim().to_lowercase();
        if !is_valid_email(&email) {
            self.errors.add(field, "Please enter a valid email address.");
            return None;
        }
        Some(email)
    }

    /// Records a failed rule that needs more than the input to decide, such as
    /// a value that is already taken.
    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn required_integer(&mut self, field: &str, min: i64) -> Option<i64> {
        let value = self.required(field)?;
        let number = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        match number {
            None => {
                self.errors
                    .add(field, format!("The {} field must be an integer.", label(field)));
                None
            }
            Some(n) if n < min => {
                self.errors.add(
                    field,
                    format!("The {} field must be at least {}.", label(field), min),
                );
                None
            }
            Some(n) => Some(n),
        }
    }

    pub fn required_boolean(&mut self, field: &str) -> Option<bool> {
        let value = self.required(field)?;
        let flag = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(s) => match s.trim() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        };

        if flag.is_none() {
            self.errors
                .add(field, format!("The {} field must be true or false.", label(field)));
        }
        flag
    }

    pub fn required_image(&mut self, field: &str, upload: Option<&PendingUpload>) {
        match upload {
            None => self
                .errors
                .add(field, format!("The {} field is required.", label(field))),
            Some(upload) if !upload.is_image() => self
                .errors
                .add(field, format!("The {} field must be an image.", label(field))),
            Some(_) => {}
        }
    }

    /// `value` is the command assembled from the rule results; it is only
    /// `None` when some rule failed.
    pub fn finish<T>(self, value: Option<T>) -> Result<T, ServiceError> {
        if !self.errors.is_empty() {
            return Err(ServiceError::Validation(self.errors));
        }
        value.ok_or(ServiceError::Validation(self.errors))
    }
}
