//! Cache entry file naming
//!
//! A template is a relative path with two placeholders: `{digest}` for the
//! fingerprint and `{model_name}` for the logical model name. Literal braces
//! are written `{{` and `}}`.

use crate::compiler::DEFAULT_MODEL_NAME;
use crate::error::{StanCacheError, StanCacheResult};
use crate::fingerprint::Fingerprint;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Template used when the caller does not supply one
pub const DEFAULT_TEMPLATE: &str = "model-{digest}.bin";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Digest,
    ModelName,
}

/// A validated cache file name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl NamingTemplate {
    /// Parse and validate a template
    pub fn parse(template: &str) -> StanCacheResult<Self> {
        if template.trim().is_empty() {
            return Err(StanCacheError::template(template, "template is empty"));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(StanCacheError::template(
                                    template,
                                    "unbalanced '{'",
                                ))
                            }
                            Some(ch) => name.push(ch),
                        }
                    }
                    let segment = match name.as_str() {
                        "digest" => Segment::Digest,
                        "model_name" => Segment::ModelName,
                        other => {
                            return Err(StanCacheError::template(
                                template,
                                format!("unknown placeholder {{{}}}", other),
                            ))
                        }
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' => {
                    return Err(StanCacheError::template(template, "unbalanced '}'"));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let parsed = Self {
            source: template.to_string(),
            segments,
        };

        // Literal parts alone must already form a safe relative path
        check_relative(template, &parsed.render_with("x", "x"))?;

        Ok(parsed)
    }

    /// Whether the template distinguishes entries by fingerprint
    pub fn uses_digest(&self) -> bool {
        self.segments.contains(&Segment::Digest)
    }

    /// Whether the template references the model name
    pub fn uses_model_name(&self) -> bool {
        self.segments.contains(&Segment::ModelName)
    }

    /// The template text as given
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render the entry path, relative to the cache directory
    ///
    /// An absent model name renders as the compiler's default name.
    pub fn render(
        &self,
        fingerprint: &Fingerprint,
        model_name: Option<&str>,
    ) -> StanCacheResult<PathBuf> {
        let model_name = model_name.unwrap_or(DEFAULT_MODEL_NAME);
        if self.uses_model_name()
            && (model_name.is_empty()
                || model_name.contains(['/', '\\'])
                || model_name == "."
                || model_name == "..")
        {
            return Err(StanCacheError::template(
                &self.source,
                format!("model name {:?} cannot be used in a file name", model_name),
            ));
        }

        let rendered = self.render_with(fingerprint.as_str(), model_name);
        check_relative(&self.source, &rendered)?;
        Ok(rendered)
    }

    fn render_with(&self, digest: &str, model_name: &str) -> PathBuf {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Digest => out.push_str(digest),
                Segment::ModelName => out.push_str(model_name),
            }
        }
        PathBuf::from(out)
    }
}

impl Default for NamingTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
            segments: vec![
                Segment::Literal("model-".to_string()),
                Segment::Digest,
                Segment::Literal(".bin".to_string()),
            ],
        }
    }
}

impl fmt::Display for NamingTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn check_relative(template: &str, path: &Path) -> StanCacheResult<()> {
    let mut has_file = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => has_file = true,
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(StanCacheError::template(
                    template,
                    "'..' would escape the cache directory",
                ))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(StanCacheError::template(
                    template,
                    "path must be relative to the cache directory",
                ))
            }
        }
    }
    if !has_file || path.as_os_str().to_string_lossy().ends_with(['/', '\\']) {
        return Err(StanCacheError::template(template, "template names no file"));
    }
    Ok(())
}
