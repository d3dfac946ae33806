use testcraft_core::model::SectionId;

use crate::error::StartFormError;

/// Raw start-screen input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartForm {
    pub email: String,
    pub access_code: String,
    pub starting_section: Option<SectionId>,
}

impl StartForm {
    #[must_use]
    pub fn new(email: impl Into<String>, access_code: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            access_code: access_code.into(),
            starting_section: None,
        }
    }

    #[must_use]
    pub fn with_starting_section(mut self, section: SectionId) -> Self {
        self.starting_section = Some(section);
        self
    }

    /// Trims and checks the form before any collaborator is contacted.
    ///
    /// # Errors
    ///
    /// Returns `StartFormError::Missing` when email or access code is blank,
    /// and `StartFormError::InvalidEmail` when the email has no `local@domain` shape.
    pub fn validate(&self) -> Result<StartRequest, StartFormError> {
        let email = self.email.trim();
        let access_code = self.access_code.trim();
        if email.is_empty() || access_code.is_empty() {
            return Err(StartFormError::Missing);
        }
        if !looks_like_email(email) {
            return Err(StartFormError::InvalidEmail);
        }
        Ok(StartRequest {
            email: email.to_string(),
            access_code: access_code.to_string(),
            starting_section: self.starting_section.clone(),
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// A start form that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    email: String,
    access_code: String,
    starting_section: Option<SectionId>,
}

impl StartRequest {
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn access_code(&self) -> &str {
        &self.access_code
    }

    #[must_use]
    pub fn starting_section(&self) -> Option<&SectionId> {
        self.starting_section.as_ref()
    }
}
