// src/domain/model.rs
// Model identity derived from payload input file names

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{errors::NamingError, payload::Payload};

/// Compiled geometry files (`basin.c01`) or plain geometry files (`basin.g01`)
pub const GEOMETRY_PATTERN: &str = r"\.[cg](\d{2})$";

/// Unsteady flow files (`basin.b02`)
pub const UNSTEADY_PATTERN: &str = r"\.b(\d{2})$";

static GEOMETRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(GEOMETRY_PATTERN).expect("geometry pattern is valid"));

static UNSTEADY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(UNSTEADY_PATTERN).expect("unsteady pattern is valid"));

/// Name and run IDs handed to the model wrapper script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIdentity {
    pub name: String,
    pub geometry_id: Option<String>,
    pub unsteady_id: Option<String>,
}

impl ModelIdentity {
    /// Derive the identity of the model a payload describes.
    ///
    /// The geometry and unsteady IDs must either both be present or both be
    /// absent; the short invocation form carries neither.
    pub fn from_payload(payload: &Payload) -> Result<Self, NamingError> {
        let keys: Vec<&str> = payload.inputs.iter().map(|link| link.key.as_str()).collect();

        let name = match &payload.model_name {
            Some(name) => name.clone(),
            None => model_name(&keys)?,
        };

        let geometry_id = two_digit_id(&keys, &GEOMETRY_RE)?;
        let unsteady_id = two_digit_id(&keys, &UNSTEADY_RE)?;

        match (&geometry_id, &unsteady_id) {
            (Some(_), None) => Err(NamingError::MissingCounterpart {
                present: "geometry".to_string(),
                pattern: UNSTEADY_PATTERN.to_string(),
            }),
            (None, Some(_)) => Err(NamingError::MissingCounterpart {
                present: "unsteady flow".to_string(),
                pattern: GEOMETRY_PATTERN.to_string(),
            }),
            _ => Ok(Self {
                name,
                geometry_id,
                unsteady_id,
            }),
        }
    }

    /// Positional arguments for the wrapper script, after the working directory
    pub fn script_args(&self) -> Vec<String> {
        let mut args = vec![self.name.clone()];
        if let (Some(geometry), Some(unsteady)) = (&self.geometry_id, &self.unsteady_id) {
            args.push(geometry.clone());
            args.push(unsteady.clone());
        }
        args
    }
}

/// Base name of a key or path (`models/basin.g01` -> `basin.g01`)
pub fn base_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Ignoring extensions, every input must share the same stem up to the first period
pub fn model_name(keys: &[&str]) -> Result<String, NamingError> {
    let mut stems = keys.iter().map(|key| {
        let base = base_name(key);
        base.split('.').next().unwrap_or(base)
    });

    let first = stems.next().ok_or(NamingError::NoInputs)?;
    for candidate in stems {
        if candidate != first {
            return Err(NamingError::Mismatch {
                first: first.to_string(),
                other: candidate.to_string(),
            });
        }
    }

    Ok(first.to_string())
}

fn two_digit_id(keys: &[&str], rgx: &Regex) -> Result<Option<String>, NamingError> {
    let mut found: Option<String> = None;
    for key in keys {
        let Some(caps) = rgx.captures(key) else {
            continue;
        };
        let id = caps[1].to_string();
        match &found {
            None => found = Some(id),
            Some(first) if *first == id => {}
            Some(first) => {
                return Err(NamingError::MultipleMatches {
                    pattern: rgx.as_str().to_string(),
                    first: first.clone(),
                    other: id,
                })
            }
        }
    }

    Ok(found)
}
