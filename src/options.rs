//! Configuration options for parsing and stringifying.
//!
//! - [`ParseOptions`]: error policy and nesting limit for [`parse_with_options`](crate::parse_with_options)
//! - [`StringifyOptions`]: what [`stringify`](crate::stringify) emits
//!
//! ## Examples
//!
//! ```rust
//! use internet_object::{parse_with_options, ParseOptions};
//!
//! // Fail on the first bad collection item instead of collecting errors
//! let options = ParseOptions::new().with_strict(true);
//! assert!(parse_with_options("~ {a\n~ b", &options).is_err());
//! ```

/// Default nesting limit for objects and arrays.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Options controlling a parse/validate run.
///
/// # Examples
///
/// ```rust
/// use internet_object::ParseOptions;
///
/// let options = ParseOptions::new().with_max_depth(16);
/// assert_eq!(options.max_depth, 16);
/// assert!(!options.strict);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Turn the first recovered error (syntax or validation) into a fatal one.
    pub strict: bool,
    /// Maximum nesting of objects and arrays before `maxDepthExceeded`.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Options for turning a validated document back into text.
///
/// # Examples
///
/// ```rust
/// use internet_object::StringifyOptions;
///
/// let options = StringifyOptions::new().with_section_names(false);
/// assert!(!options.section_names);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringifyOptions {
    /// Emit the header (definitions) before the first `---`.
    pub include_header: bool,
    /// Emit `--- name: $schema` section headers.
    pub section_names: bool,
}

impl Default for StringifyOptions {
    fn default() -> Self {
        StringifyOptions {
            include_header: true,
            section_names: true,
        }
    }
}

impl StringifyOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_header(mut self, include_header: bool) -> Self {
        self.include_header = include_header;
        self
    }

    #[must_use]
    pub fn with_section_names(mut self, section_names: bool) -> Self {
        self.section_names = section_names;
        self
    }
}
