//! Field validation for sign-up and profile forms.
//!
//! Every rule runs, and all failures are reported together so a form can
//! show each message next to its field.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[0-9]{10,15}$").expect("valid phone regex"));

static DOB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("valid date regex"));

/// Special characters a password may (and must) contain.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Accepted avatar file extensions.
pub const AVATAR_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// A form field that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    FullName,
    Email,
    Phone,
    DateOfBirth,
    Password,
    Avatar,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FullName => "fullName",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::DateOfBirth => "dob",
            Field::Password => "password",
            Field::Avatar => "profilePicture",
        }
    }
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

/// All failures for one form, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn single(field: Field, message: &'static str) -> Self {
        Self(vec![FieldError { field, message }])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for a field, if it failed.
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn check(&mut self, ok: bool, field: Field, message: &'static str) {
        if !ok {
            self.0.push(FieldError { field, message });
        }
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field.as_str(), e.message)?;
        }
        Ok(())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// `+` followed by 10 to 15 digits.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// `DD/MM/YYYY`. Only the shape is checked.
pub fn is_valid_dob(dob: &str) -> bool {
    DOB_RE.is_match(dob)
}

pub fn is_valid_password(password: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);

    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

pub fn is_valid_avatar(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    AVATAR_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Sign-up form input.
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub password: String,
}

impl SignUpForm {
    /// Run every rule and collect the failures.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(
            !self.full_name.trim().is_empty(),
            Field::FullName,
            "Full name is required",
        );
        errors.check(
            is_valid_email(self.email.trim()),
            Field::Email,
            "Invalid email format",
        );
        errors.check(
            is_valid_phone(self.phone.trim()),
            Field::Phone,
            "Phone must be in +1234567890 format",
        );
        errors.check(
            is_valid_dob(self.date_of_birth.trim()),
            Field::DateOfBirth,
            "Date of birth must be in DD/MM/YYYY format",
        );
        errors.check(
            is_valid_password(&self.password),
            Field::Password,
            "Password must be 8+ chars, 1 uppercase, 1 number, 1 special character",
        );
        errors.into_result()
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: String,
    pub bio: String,
    /// New avatar location; `None` keeps the current one
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check(
            !self.display_name.trim().is_empty(),
            Field::FullName,
            "Full name is required",
        );
        if let Some(url) = &self.avatar_url {
            errors.check(
                is_valid_avatar(url),
                Field::Avatar,
                "Please select a PNG or JPG image",
            );
        }
        errors.into_result()
    }
}
