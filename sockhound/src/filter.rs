//! Stack-filtering pipeline for reducing raw captures to aggregation keys.
//!
//! Raw stacks captured at an I/O call site are dominated by runtime and
//! library frames that carry no attribution value. This module reduces a
//! captured stack to a compact "signature" by running it through a fixed
//! rule chain; the signature then keys the statistics registry, so two I/O
//! operations from the same application code path land in the same bucket.
//!
//! # Pipeline Order
//!
//! The rules always run in the same order, regardless of the order the
//! builder methods were called:
//!
//! 1. Platform exclusion - drop frames from the built-in runtime namespaces
//! 2. Include patterns - if any are set, keep only matching frames
//! 3. Exclude patterns - drop matching frames (exclude wins over include)
//! 4. Ends-only trimming - retain only the first `top` / last `bottom`
//!    frames of what remains
//! 5. Blank policy - an emptied stack either stays empty (the default
//!    catch-all bucket) or is replaced by the original input
//!
//! A filter holds only immutable configuration, so one instance is safely
//! shared by every thread reporting I/O.

use log::debug;
use sockhound_common::StackFrame;

use crate::domain::errors::ConfigError;

/// Module namespaces treated as platform/runtime code by the
/// platform-exclusion rule.
///
/// Covers the standard library, the async runtimes most I/O flows through,
/// and this probe's own frames. Each entry matches as a module-subtree
/// pattern, same as user-supplied patterns.
pub const PLATFORM_PREFIXES: &[&str] = &["std", "core", "alloc", "tokio", "mio", "sockhound"];

/// An immutable, composed stack filter.
///
/// Construct with [`StackFilter::builder`], or use [`StackFilter::none`]
/// for the identity transform when filtering is disabled. `apply` is pure
/// and callable concurrently from any number of threads.
#[derive(Debug, Clone)]
pub struct StackFilter {
    identity: bool,
    exclude_platform: bool,
    include: Vec<String>,
    exclude: Vec<String>,
    top: usize,
    bottom: usize,
    original_if_blank: bool,
}

impl StackFilter {
    /// The identity filter: returns every input stack unchanged.
    ///
    /// Selected when filtering is explicitly disabled. No other rule may be
    /// combined with it - the builder rejects that at build time.
    #[must_use]
    pub fn none() -> Self {
        Self {
            identity: true,
            exclude_platform: false,
            include: Vec::new(),
            exclude: Vec::new(),
            top: 0,
            bottom: 0,
            original_if_blank: false,
        }
    }

    /// Start building a rule-based filter.
    #[must_use]
    pub fn builder() -> FilterBuilder {
        FilterBuilder::default()
    }

    /// Whether this is the identity (`none`) filter.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Run the pipeline over a captured stack and return the surviving
    /// frames in their original relative order.
    ///
    /// An empty input always yields an empty output: the blank-stack
    /// substitution only fires when filtering emptied a non-empty input.
    #[must_use]
    pub fn apply(&self, stack: &[StackFrame]) -> Vec<StackFrame> {
        if self.identity {
            return stack.to_vec();
        }
        if stack.is_empty() {
            return Vec::new();
        }

        let mut kept: Vec<&StackFrame> = stack.iter().collect();

        if self.exclude_platform {
            kept.retain(|frame| {
                !PLATFORM_PREFIXES.iter().any(|prefix| pattern_matches(prefix, &frame.module))
            });
        }

        if !self.include.is_empty() {
            kept.retain(|frame| {
                self.include.iter().any(|pattern| pattern_matches(pattern, &frame.module))
            });
        }

        // Exclude runs after include and can drop frames include just kept.
        if !self.exclude.is_empty() {
            kept.retain(|frame| {
                !self.exclude.iter().any(|pattern| pattern_matches(pattern, &frame.module))
            });
        }

        if (self.top > 0 || self.bottom > 0) && self.top + self.bottom < kept.len() {
            kept.drain(self.top..kept.len() - self.bottom);
        }

        if kept.is_empty() && self.original_if_blank {
            return stack.to_vec();
        }

        kept.into_iter().cloned().collect()
    }
}

/// A configured pattern matches a frame when it equals the frame's module
/// path, or the module path starts with `pattern + "::"` - patterns denote
/// either an exact module or an entire module subtree.
fn pattern_matches(pattern: &str, module: &str) -> bool {
    module
        .strip_prefix(pattern)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Accumulates filter rules in call order and produces an immutable
/// [`StackFilter`].
#[derive(Debug, Default)]
pub struct FilterBuilder {
    none: bool,
    exclude_platform: bool,
    include: Vec<String>,
    exclude: Vec<String>,
    top: usize,
    bottom: usize,
    original_if_blank: bool,
}

impl FilterBuilder {
    /// Disable filtering entirely; `build` fails if any other rule is set.
    #[must_use]
    pub fn with_none(mut self) -> Self {
        self.none = true;
        self
    }

    /// Drop frames belonging to the built-in platform namespaces
    /// ([`PLATFORM_PREFIXES`]).
    #[must_use]
    pub fn with_exclude_platform(mut self) -> Self {
        self.exclude_platform = true;
        self
    }

    /// Keep only frames matching this module pattern (additive allow-list).
    #[must_use]
    pub fn with_only_module(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    /// Drop frames matching this module pattern, even if an include pattern
    /// also matches them.
    #[must_use]
    pub fn with_exclude_module(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Retain only the first `top` and last `bottom` frames of the filtered
    /// stack. When `top + bottom` covers the whole remainder, everything is
    /// kept.
    #[must_use]
    pub fn with_ends_only(mut self, top: usize, bottom: usize) -> Self {
        self.top = top;
        self.bottom = bottom;
        self
    }

    /// Substitute the original unfiltered stack when the pipeline would
    /// otherwise empty a non-empty input.
    #[must_use]
    pub fn with_original_if_blank(mut self) -> Self {
        self.original_if_blank = true;
        self
    }

    /// Produce the immutable filter.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoneIsExclusive`] when `with_none` was combined with
    /// any other rule.
    pub fn build(self) -> Result<StackFilter, ConfigError> {
        if self.none {
            if self.exclude_platform
                || !self.include.is_empty()
                || !self.exclude.is_empty()
                || self.top > 0
                || self.bottom > 0
                || self.original_if_blank
            {
                return Err(ConfigError::NoneIsExclusive);
            }
            return Ok(StackFilter::none());
        }

        debug!(
            "built stack filter: exclude_platform={} include={} exclude={} top={} bottom={} original_if_blank={}",
            self.exclude_platform,
            self.include.len(),
            self.exclude.len(),
            self.top,
            self.bottom,
            self.original_if_blank
        );

        Ok(StackFilter {
            identity: false,
            exclude_platform: self.exclude_platform,
            include: self.include,
            exclude: self.exclude,
            top: self.top,
            bottom: self.bottom,
            original_if_blank: self.original_if_blank,
        })
    }
}
