//! Filter configuration consumed as already-resolved option values.
//!
//! The probe does not parse configuration sources itself; a host layer
//! resolves the option keys (under its own prefix) and hands the values
//! over as a [`FilterOptions`]. `build` turns them into the immutable
//! [`StackFilter`], rejecting contradictory combinations instead of
//! silently ignoring them.

use log::warn;

use crate::domain::errors::ConfigError;
use crate::filter::StackFilter;

/// Resolved filter option values.
///
/// Field defaults mirror the documented option defaults: platform frames
/// are excluded and an emptied stack is allowed as the catch-all bucket
/// unless configured otherwise.
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Disable filtering entirely; exclusive with every other option.
    pub none: bool,

    /// When `false`, a stack the pipeline emptied is replaced by the raw
    /// capture instead of aggregating under the empty bucket.
    pub allow_empty_stack: bool,

    /// Drop frames from the built-in platform namespaces.
    pub exclude_platform: bool,

    /// Module patterns to keep (allow-list); empty keeps everything.
    pub include: Vec<String>,

    /// Module patterns to drop; wins over `include`.
    pub exclude: Vec<String>,

    /// Frames to retain from the top of the filtered stack (0 = no limit).
    pub top: usize,

    /// Frames to retain from the bottom of the filtered stack (0 = no limit).
    pub bottom: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            none: false,
            allow_empty_stack: true,
            exclude_platform: true,
            include: Vec::new(),
            exclude: Vec::new(),
            top: 0,
            bottom: 0,
        }
    }
}

impl FilterOptions {
    /// Options describing a disabled filter (raw stacks used as-is).
    #[must_use]
    pub fn none() -> Self {
        Self { none: true, exclude_platform: false, ..Self::default() }
    }

    /// Build the immutable filter these options describe.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoneIsExclusive`] when `none` is set together with
    /// any other rule.
    pub fn build(&self) -> Result<StackFilter, ConfigError> {
        let mut builder = StackFilter::builder();
        if self.none {
            builder = builder.with_none();
        }
        if !self.allow_empty_stack {
            builder = builder.with_original_if_blank();
        }
        if self.exclude_platform {
            builder = builder.with_exclude_platform();
        }
        for pattern in &self.include {
            builder = builder.with_only_module(pattern);
        }
        for pattern in &self.exclude {
            builder = builder.with_exclude_module(pattern);
        }
        if self.top > 0 || self.bottom > 0 {
            builder = builder.with_ends_only(self.top, self.bottom);
        }
        builder.build()
    }
}

/// Split a comma-separated option value into trimmed, non-empty elements.
/// Blank or absent input yields an empty list.
#[must_use]
pub fn parse_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|element| {
            if element.is_empty() && !csv.trim().is_empty() {
                warn!("ignoring empty element in list option {csv:?}");
            }
            !element.is_empty()
        })
        .map(str::to_string)
        .collect()
}
