//! Construction parameters handed to capability factories.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::ConstructionError;

/// Raw audio bytes of the upload (required by every capability).
pub const PARAM_AUDIO_CONTENTS: &str = "audio_contents";
/// Container format of the upload (`mp3` / `wav`), derived from its file name.
pub const PARAM_AUDIO_FORMAT: &str = "audio_format";
/// Spoken language hint for transcription.
pub const PARAM_LANGUAGE: &str = "language";

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bytes(Arc<[u8]>),
    Text(String),
}

/// Named parameters supplied with a submission.
///
/// Callers may send anything; [`CapabilityParams::retain_allowed`] narrows
/// the set to a descriptor's allow-list before a factory sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityParams {
    values: BTreeMap<String, ParamValue>,
}

impl CapabilityParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, ParamValue::Text(value.into()))
    }

    pub fn with_bytes(self, name: impl Into<String>, value: impl Into<Arc<[u8]>>) -> Self {
        self.with(name, ParamValue::Bytes(value.into()))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every parameter whose name is not in `allowed`.
    ///
    /// Returns the kept parameters and the names that were dropped.
    pub fn retain_allowed(mut self, allowed: &[String]) -> (Self, Vec<String>) {
        let mut dropped = Vec::new();
        self.values.retain(|name, _| {
            let keep = allowed.iter().any(|a| a == name);
            if !keep {
                dropped.push(name.clone());
            }
            keep
        });
        (self, dropped)
    }

    /// Remove and return a required bytes parameter.
    pub fn take_bytes(&mut self, name: &'static str) -> Result<Arc<[u8]>, ConstructionError> {
        match self.values.remove(name) {
            Some(ParamValue::Bytes(bytes)) => Ok(bytes),
            Some(ParamValue::Text(_)) => Err(ConstructionError::InvalidParameter {
                name,
                reason: "expected binary data, got text".into(),
            }),
            None => Err(ConstructionError::MissingParameter(name)),
        }
    }

    /// Remove and return an optional text parameter.
    pub fn take_text(&mut self, name: &'static str) -> Result<Option<String>, ConstructionError> {
        match self.values.remove(name) {
            Some(ParamValue::Text(text)) => Ok(Some(text)),
            Some(ParamValue::Bytes(_)) => Err(ConstructionError::InvalidParameter {
                name,
                reason: "expected text, got binary data".into(),
            }),
            None => Ok(None),
        }
    }
}
