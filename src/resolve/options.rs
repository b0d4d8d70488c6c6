//! Keyword options mixed into positional argument lists.
//!
//! An option table names the keywords a constructor understands. Parsing
//! pulls those keywords (and the value following a [`OptionDef::Number`])
//! out of the list and hands back everything else, in order.

use std::collections::HashMap;

use crate::error::{Result, RigidError};
use crate::resolve::Arg;

/// One recognized option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionDef {
    /// Present or absent.
    Flag { name: &'static str },
    /// One of a fixed set of keywords; the keyword itself selects it.
    Choice {
        name: &'static str,
        choices: &'static [&'static str],
        default: String,
    },
    /// `name` followed by a scalar.
    Number { name: &'static str, default: f64 },
}

impl OptionDef {
    pub fn name(&self) -> &'static str {
        match *self {
            OptionDef::Flag { name }
            | OptionDef::Choice { name, .. }
            | OptionDef::Number { name, .. } => name,
        }
    }

    fn default_value(&self) -> OptionValue {
        match self {
            OptionDef::Flag { .. } => OptionValue::Flag(false),
            OptionDef::Choice { default, .. } => OptionValue::Choice(default.clone()),
            OptionDef::Number { default, .. } => OptionValue::Number(*default),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Flag(bool),
    Choice(String),
    Number(f64),
}

/// Resolved values for every option in a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOptions {
    values: HashMap<&'static str, OptionValue>,
}

impl ParsedOptions {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// `false` for unset or unknown flags.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(OptionValue::Flag(true)))
    }

    pub fn choice(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptionValue::Choice(c)) => Some(c),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(OptionValue::Number(x)) => Some(*x),
            _ => None,
        }
    }
}

/// Splits `args` into option values and positional residue.
///
/// Every option starts at its default. A later keyword overrides an earlier
/// one for the same option.
pub fn parse(defs: &[OptionDef], args: Vec<Arg>) -> Result<(ParsedOptions, Vec<Arg>)> {
    let mut values: HashMap<&'static str, OptionValue> =
        defs.iter().map(|d| (d.name(), d.default_value())).collect();
    let mut residue = Vec::with_capacity(args.len());
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let Arg::Text(word) = &arg else {
            residue.push(arg);
            continue;
        };
        match match_keyword(defs, word) {
            Some(OptionDef::Flag { name }) => {
                values.insert(*name, OptionValue::Flag(true));
            }
            Some(OptionDef::Choice { name, .. }) => {
                values.insert(*name, OptionValue::Choice(word.clone()));
            }
            Some(OptionDef::Number { name, .. }) => {
                let value = match args.next() {
                    Some(Arg::Num(b)) if b.is_scalar() => b.as_slice()[0],
                    _ => {
                        return Err(RigidError::UnrecognizedArgument(format!(
                            "option '{name}' expects a numeric value"
                        )));
                    }
                };
                values.insert(*name, OptionValue::Number(value));
            }
            None => residue.push(arg),
        }
    }

    let parsed = ParsedOptions { values };
    tracing::debug!(options = ?parsed.values, residue = residue.len(), "parsed options");
    Ok((parsed, residue))
}

fn match_keyword<'a>(defs: &'a [OptionDef], word: &str) -> Option<&'a OptionDef> {
    defs.iter().find(|d| match d {
        OptionDef::Flag { name } | OptionDef::Number { name, .. } => *name == word,
        OptionDef::Choice { choices, .. } => choices.iter().any(|c| *c == word),
    })
}
