/// Options for customizing a comparison.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use facet_temple::CompareOptions;
///
/// let options = CompareOptions::new()
///     .root_name("Page")
///     .hide_sensitive(false)
///     .follow_expressions(true);
/// ```
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Name of the root node of both trees, and the prefix of top-level labels.
    pub(crate) root_name: String,
    /// Whether `#[facet(sensitive)]` fields are left out of the data side.
    pub(crate) hide_sensitive: bool,
    /// Whether fields inside nested pipelines and `$` paths are registered.
    pub(crate) follow_expressions: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            root_name: "Root".to_string(),
            hide_sensitive: true,
            follow_expressions: false,
        }
    }
}

impl CompareOptions {
    /// Create a new `CompareOptions` with default settings: the root is called
    /// `Root` and sensitive fields are hidden.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root node name, which prefixes top-level labels such as
    /// `Root->Name`.
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Choose whether `#[facet(sensitive)]` fields count as part of the
    /// data's visible fields. Defaults to `true`.
    pub fn hide_sensitive(mut self, hide: bool) -> Self {
        self.hide_sensitive = hide;
        self
    }

    /// Also look for fields beyond plain field arguments. Defaults to `false`.
    ///
    /// When on, the template walker additionally registers:
    ///
    /// - fields used inside parenthesised pipelines, such as `.Tags` in
    ///   `{{ len (.Tags) }}` or `.Rows` in `{{ (index .Rows 0).Cell }}`;
    /// - `$`-rooted paths such as `{{ $.Site.Name }}`, resolved against the
    ///   scope the current template was entered with;
    /// - a `$` argument to `{{template}}`, which walks the included body
    ///   against that scope.
    ///
    /// When off, those arguments are ignored, as are any other non-field
    /// arguments.
    pub fn follow_expressions(mut self, follow: bool) -> Self {
        self.follow_expressions = follow;
        self
    }
}
