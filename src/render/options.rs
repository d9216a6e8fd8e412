//! Rendering options.

/// Options for rendering a flat document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Hide running headers, footers and page numbers
    pub suppress_running_elements: bool,

    /// Mark the end of every page in the output
    pub include_page_markers: bool,

    /// Escape special Markdown characters
    pub escape_special_chars: bool,

    /// Maximum heading level (1-6)
    pub max_heading_level: u8,

    /// Include YAML frontmatter with metadata
    pub include_frontmatter: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable running-element suppression.
    pub fn with_running_elements(mut self, suppress: bool) -> Self {
        self.suppress_running_elements = suppress;
        self
    }

    /// Enable or disable page markers.
    pub fn with_page_markers(mut self, include: bool) -> Self {
        self.include_page_markers = include;
        self
    }

    /// Enable or disable Markdown escaping.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Set the maximum heading level.
    pub fn with_max_heading(mut self, level: u8) -> Self {
        self.max_heading_level = level.clamp(1, 6);
        self
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            suppress_running_elements: true,
            include_page_markers: false,
            escape_special_chars: true,
            max_heading_level: 6,
            include_frontmatter: false,
        }
    }
}
