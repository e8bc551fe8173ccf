//! Line-oriented user input events.
//!
//! ```text
//! set personal <field> <value...>
//! set experience <index> <field> <value...>
//! set education <index> <field> <value...>
//! set skill <index> <value...>
//! add experience|education|skill
//! remove experience|education|skill <index>
//! show
//! export
//! ```
//!
//! Values are the rest of the line after a single separating space and may
//! be empty.

use crate::form::{
    Collection, EducationField, ExperienceField, FormError, FormStore, PersonalField,
};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid index '{0}'")]
    InvalidIndex(String),

    #[error("unexpected trailing input '{0}'")]
    Trailing(String),

    #[error(transparent)]
    Form(#[from] FormError),
}

/// A store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    SetPersonal {
        field: PersonalField,
        value: String,
    },
    SetExperience {
        index: usize,
        field: ExperienceField,
        value: String,
    },
    SetEducation {
        index: usize,
        field: EducationField,
        value: String,
    },
    SetSkill {
        index: usize,
        value: String,
    },
    Add(Collection),
    Remove(Collection, usize),
}

impl FormEvent {
    pub fn apply(self, store: &mut FormStore) -> Result<(), FormError> {
        match self {
            FormEvent::SetPersonal { field, value } => {
                store.update_personal(field, value);
                Ok(())
            }
            FormEvent::SetExperience {
                index,
                field,
                value,
            } => store.update_experience(index, field, value),
            FormEvent::SetEducation {
                index,
                field,
                value,
            } => store.update_education(index, field, value),
            FormEvent::SetSkill { index, value } => store.update_skill(index, value),
            FormEvent::Add(collection) => {
                store.add(collection);
                Ok(())
            }
            FormEvent::Remove(collection, index) => store.remove(collection, index),
        }
    }
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Edit(FormEvent),
    Show,
    Export,
}

impl FromStr for Command {
    type Err = EventError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (verb, rest) = split_token(line);
        match verb {
            "" => Err(EventError::Empty),
            "show" => no_trailing(rest).map(|_| Command::Show),
            "export" => no_trailing(rest).map(|_| Command::Export),
            "add" => {
                let (target, rest) = split_token(rest);
                let collection = required(target, "collection")?.parse::<Collection>()?;
                no_trailing(rest)?;
                Ok(Command::Edit(FormEvent::Add(collection)))
            }
            "remove" => {
                let (target, rest) = split_token(rest);
                let collection = required(target, "collection")?.parse::<Collection>()?;
                let (index, rest) = split_token(rest);
                let index = parse_index(index)?;
                no_trailing(rest)?;
                Ok(Command::Edit(FormEvent::Remove(collection, index)))
            }
            "set" => parse_set(rest).map(Command::Edit),
            other => Err(EventError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_set(input: &str) -> Result<FormEvent, EventError> {
    let (target, rest) = split_token(input);
    match required(target, "target")? {
        "personal" => {
            let (field, value) = split_token(rest);
            Ok(FormEvent::SetPersonal {
                field: required(field, "field")?.parse()?,
                value: value.to_string(),
            })
        }
        target => {
            let collection = target.parse::<Collection>()?;
            let (index, rest) = split_token(rest);
            let index = parse_index(index)?;
            match collection {
                Collection::Skill => Ok(FormEvent::SetSkill {
                    index,
                    value: rest.to_string(),
                }),
                Collection::Experience => {
                    let (field, value) = split_token(rest);
                    Ok(FormEvent::SetExperience {
                        index,
                        field: required(field, "field")?.parse()?,
                        value: value.to_string(),
                    })
                }
                Collection::Education => {
                    let (field, value) = split_token(rest);
                    Ok(FormEvent::SetEducation {
                        index,
                        field: required(field, "field")?.parse()?,
                        value: value.to_string(),
                    })
                }
            }
        }
    }
}

/// Splits off the first whitespace-delimited token. The remainder starts
/// right after the single separating character.
fn split_token(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    input.split_once(char::is_whitespace).unwrap_or((input, ""))
}

fn required<'a>(token: &'a str, what: &'static str) -> Result<&'a str, EventError> {
    if token.is_empty() {
        Err(EventError::Missing(what))
    } else {
        Ok(token)
    }
}

fn parse_index(token: &str) -> Result<usize, EventError> {
    required(token, "index")?
        .parse()
        .map_err(|_| EventError::InvalidIndex(token.to_string()))
}

fn no_trailing(rest: &str) -> Result<(), EventError> {
    let rest = rest.trim();
    if rest.is_empty() {
        Ok(())
    } else {
        Err(EventError::Trailing(rest.to_string()))
    }
}
