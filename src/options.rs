//! Configuration options for encoding and decoding.
//!
//! [`ToonOptions`] is shared by the encoder, the decoder and the serde value
//! serializer, so one value configures a whole round trip:
//!
//! ```rust
//! use toon_codec::{to_string_with_options, ToonOptions};
//!
//! let options = ToonOptions::new().with_indent(4);
//! let text = to_string_with_options(&vec![vec![1, 2], vec![3, 4]], &options).unwrap();
//! assert_eq!(text, "- 1, 2\n- 3, 4\n");
//!
//! // Without compact lists every element gets its own line.
//! let options = ToonOptions::expanded();
//! let text = to_string_with_options(&vec![1, 2], &options).unwrap();
//! assert_eq!(text, "- 1\n- 2\n");
//! ```

/// Default nesting limit applied by the encoder and the decoder.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Configuration options for the codec.
///
/// # Examples
///
/// ```rust
/// use toon_codec::ToonOptions;
///
/// // Default options: 2-space indent, compact scalar lists
/// let options = ToonOptions::new();
///
/// // One element per line for every sequence
/// let options = ToonOptions::expanded();
///
/// // Custom configuration
/// let options = ToonOptions::new()
///     .with_indent(4)
///     .with_max_depth(32);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToonOptions {
    pub indent: usize,
    pub compact_lists: bool,
    pub max_depth: usize,
}

impl Default for ToonOptions {
    fn default() -> Self {
        ToonOptions {
            indent: 2,
            compact_lists: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ToonOptions {
    /// Creates default options (2-space indent, compact lists, depth limit 128).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use toon_codec::ToonOptions;
    ///
    /// let options = ToonOptions::new();
    /// assert_eq!(options.indent, 2);
    /// assert!(options.compact_lists);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that write every sequence element on its own line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use toon_codec::ToonOptions;
    ///
    /// let options = ToonOptions::expanded();
    /// assert!(!options.compact_lists);
    /// ```
    #[must_use]
    pub fn expanded() -> Self {
        ToonOptions {
            compact_lists: false,
            ..Default::default()
        }
    }

    /// Sets the indentation size (number of spaces per level).
    ///
    /// Values below 1 are raised to 1, since indentation is the only nesting
    /// signal in the format.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use toon_codec::ToonOptions;
    ///
    /// assert_eq!(ToonOptions::new().with_indent(4).indent, 4);
    /// assert_eq!(ToonOptions::new().with_indent(0).indent, 1);
    /// ```
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent.max(1);
        self
    }

    /// Enables or disables the single-line `a, b, c` form for scalar sequences.
    #[must_use]
    pub fn with_compact_lists(mut self, compact_lists: bool) -> Self {
        self.compact_lists = compact_lists;
        self
    }

    /// Sets the maximum container nesting depth accepted when encoding or decoding.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub(crate) fn indent_width(&self) -> usize {
        self.indent.max(1)
    }
}
