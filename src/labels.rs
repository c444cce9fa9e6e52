//! Sequential label identifiers and the URLs encoded into them.

use crate::error::LabelError;

/// Minimum number of digits in the numeric part of an identifier.
pub const NUMBER_WIDTH: usize = 4;

pub const DEFAULT_PREFIX: &str = "ITEM-";

/// What to generate: `count` labels numbered from `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRequest {
    pub base_url: String,
    pub prefix: String,
    pub start: i64,
    pub count: i64,
}

/// One identifier and the URL its QR code encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    pub number: u64,
    pub identifier: String,
    pub url: String,
}

/// Format a label identifier: the prefix followed by the zero-padded number.
///
/// Numbers wider than [`NUMBER_WIDTH`] digits are printed in full.
pub fn format_identifier(prefix: &str, number: u64) -> String {
    format!("{}{:0width$}", prefix, number, width = NUMBER_WIDTH)
}

impl LabelRequest {
    pub fn new(base_url: impl Into<String>, count: i64) -> Self {
        Self {
            base_url: base_url.into(),
            prefix: DEFAULT_PREFIX.to_string(),
            start: 1,
            count,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    pub fn validate(&self) -> Result<(), LabelError> {
        if self.count < 1 {
            return Err(LabelError::InvalidCount(self.count));
        }
        if self.start < 1 {
            return Err(LabelError::InvalidStart(self.start));
        }
        if self.start.checked_add(self.count - 1).is_none() {
            return Err(LabelError::NumberOverflow {
                start: self.start,
                count: self.count,
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(LabelError::EmptyBaseUrl);
        }
        // Identifier text is set in a Type1 standard font
        if !self.prefix.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
            return Err(LabelError::UnprintablePrefix(self.prefix.clone()));
        }
        Ok(())
    }

    pub fn first_identifier(&self) -> Result<String, LabelError> {
        self.validate()?;
        Ok(format_identifier(&self.prefix, self.start as u64))
    }

    pub fn last_identifier(&self) -> Result<String, LabelError> {
        self.validate()?;
        Ok(format_identifier(&self.prefix, (self.start + self.count - 1) as u64))
    }

    /// Validate the request and produce its entries in ascending order.
    pub fn entries(&self) -> Result<Vec<LabelEntry>, LabelError> {
        self.validate()?;

        let start = self.start as u64;
        let entries = (0..self.count as u64)
            .map(|offset| {
                let number = start + offset;
                let identifier = format_identifier(&self.prefix, number);
                let url = format!("{}{}", self.base_url, identifier);
                LabelEntry {
                    number,
                    identifier,
                    url,
                }
            })
            .collect();
        Ok(entries)
    }
}
