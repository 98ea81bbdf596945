//! Client-side form validation.
//!
//! Errors use the same field-to-messages shape as backend validation
//! failures so both can be reported the same way.

use crate::response::FieldErrors;
use crate::types::{Credentials, NewVisitor, Sex, Visitor};

const NAME_MAX: usize = 255;
const PURPOSE_MAX: usize = 500;
const AGE_MIN: u32 = 1;
const AGE_MAX: u32 = 150;

/// A visitor form as filled in by the user, possibly incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorDraft {
    pub firstname: String,
    pub middlename: Option<String>,
    pub lastname: String,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub contact_number: String,
    pub purpose_of_visit: String,
}

impl From<&Visitor> for VisitorDraft {
    fn from(visitor: &Visitor) -> Self {
        Self {
            firstname: visitor.firstname.clone(),
            middlename: visitor.middlename.clone(),
            lastname: visitor.lastname.clone(),
            age: Some(visitor.age),
            sex: visitor.sex(),
            contact_number: visitor.contact_number.clone(),
            purpose_of_visit: visitor.purpose_of_visit.clone(),
        }
    }
}

impl VisitorDraft {
    pub fn validate(&self) -> Result<NewVisitor, FieldErrors> {
        let mut errors = Errors::default();

        errors.required("firstname", &self.firstname, "First name is required");
        errors.max_len("firstname", &self.firstname, NAME_MAX, "First name too long");
        if let Some(middle) = &self.middlename {
            errors.max_len("middlename", middle, NAME_MAX, "Middle name too long");
        }
        errors.required("lastname", &self.lastname, "Last name is required");
        errors.max_len("lastname", &self.lastname, NAME_MAX, "Last name too long");

        match self.age {
            None => errors.push("age", "Age is required"),
            Some(age) if age < AGE_MIN => errors.push("age", "Age must be at least 1"),
            Some(age) if age > AGE_MAX => errors.push("age", "Age must be realistic"),
            Some(_) => {}
        }
        if self.sex.is_none() {
            errors.push("sex", "Please select a gender");
        }

        errors.required("contact_number", &self.contact_number, "Contact number is required");
        errors.required("purpose_of_visit", &self.purpose_of_visit, "Purpose of visit is required");
        errors.max_len("purpose_of_visit", &self.purpose_of_visit, PURPOSE_MAX, "Purpose too long");

        let (Some(age), Some(sex)) = (self.age, self.sex) else {
            return Err(errors.0);
        };
        if !errors.0.is_empty() {
            return Err(errors.0);
        }

        Ok(NewVisitor {
            firstname: self.firstname.clone(),
            middlename: self.middlename.clone().filter(|m| !m.is_empty()),
            lastname: self.lastname.clone(),
            age,
            sex,
            contact_number: self.contact_number.clone(),
            purpose_of_visit: self.purpose_of_visit.clone(),
        })
    }
}

pub fn validate_credentials(credentials: &Credentials) -> Result<(), FieldErrors> {
    let mut errors = Errors::default();
    errors.required("email", &credentials.email, "Email or username is required");
    errors.required("password", &credentials.password, "Password is required");
    if errors.0.is_empty() {
        Ok(())
    } else {
        Err(errors.0)
    }
}

#[derive(Default)]
struct Errors(FieldErrors);

impl Errors {
    fn push(&mut self, field: &str, message: &str) {
        self.0.entry(field.to_string()).or_default().push(message.to_string());
    }

    fn required(&mut self, field: &str, value: &str, message: &str) {
        if value.is_empty() {
            self.push(field, message);
        }
    }

    fn max_len(&mut self, field: &str, value: &str, max: usize, message: &str) {
        if value.chars().count() > max {
            self.push(field, message);
        }
    }
}
