//! Interactive prompts for fields not given on the command line.

use anyhow::Result;
use dialoguer::{Confirm, Input, Password, Select};
use logbook_core::{Credentials, Sex, VisitorDraft};

const SEXES: [Sex; 2] = [Sex::Male, Sex::Female];

fn text(label: &str, current: &str, optional: bool) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(label).allow_empty(optional);
    if !current.is_empty() {
        input = input.default(current.to_string());
    }
    Ok(input.interact_text()?.trim().to_string())
}

fn age(current: Option<u32>) -> Result<u32> {
    let mut input = Input::<u32>::new().with_prompt("Age");
    if let Some(age) = current {
        input = input.default(age);
    }
    Ok(input.interact_text()?)
}

fn sex(current: Option<Sex>) -> Result<Sex> {
    let default = current
        .and_then(|s| SEXES.iter().position(|c| *c == s))
        .unwrap_or(0);
    let index = Select::new()
        .with_prompt("Sex")
        .items(&["Male", "Female"])
        .default(default)
        .interact()?;
    Ok(SEXES[index])
}

/// Ask only for the fields that are still empty.
pub fn fill_missing(draft: &mut VisitorDraft) -> Result<()> {
    if draft.firstname.is_empty() {
        draft.firstname = text("First name", "", false)?;
    }
    if draft.middlename.is_none() {
        let middle = text("Middle name (optional)", "", true)?;
        draft.middlename = Some(middle).filter(|m| !m.is_empty());
    }
    if draft.lastname.is_empty() {
        draft.lastname = text("Last name", "", false)?;
    }
    if draft.age.is_none() {
        draft.age = Some(age(None)?);
    }
    if draft.sex.is_none() {
        draft.sex = Some(sex(None)?);
    }
    if draft.contact_number.is_empty() {
        draft.contact_number = text("Contact number", "", false)?;
    }
    if draft.purpose_of_visit.is_empty() {
        draft.purpose_of_visit = text("Purpose of visit", "", false)?;
    }
    Ok(())
}

/// Walk through every field with the current value as the default.
pub fn review(draft: &mut VisitorDraft) -> Result<()> {
    draft.firstname = text("First name", &draft.firstname, false)?;
    let middle = text(
        "Middle name (optional)",
        draft.middlename.as_deref().unwrap_or_default(),
        true,
    )?;
    draft.middlename = Some(middle).filter(|m| !m.is_empty());
    draft.lastname = text("Last name", &draft.lastname, false)?;
    draft.age = Some(age(draft.age)?);
    draft.sex = Some(sex(draft.sex)?);
    draft.contact_number = text("Contact number", &draft.contact_number, false)?;
    draft.purpose_of_visit = text("Purpose of visit", &draft.purpose_of_visit, false)?;
    Ok(())
}

pub fn fill_credentials(credentials: &mut Credentials) -> Result<()> {
    if credentials.email.is_empty() {
        credentials.email = text("Email or username", "", false)?;
    }
    if credentials.password.is_empty() {
        credentials.password = Password::new().with_prompt("Password").interact()?;
    }
    Ok(())
}

pub fn confirm(question: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(question).default(false).interact()?)
}
