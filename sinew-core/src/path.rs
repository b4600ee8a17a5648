use std::{fmt, str::FromStr};

use thiserror::Error;

/// Errors produced when parsing component paths, labels, or element names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path `{path}` is not absolute")]
    NotAbsolute { path: String },

    #[error("path `{path}` contains an empty segment")]
    EmptySegment { path: String },

    #[error("path `{path}` contains a relative segment `{segment}`")]
    RelativeSegment { path: String, segment: String },

    #[error("invalid element name `{name}`: names must be non-empty and contain no `/`")]
    InvalidName { name: String },
}

/// An absolute location in a model's component tree, such as `/forceset/knee_actuator`.
///
/// Paths always start at the root, have at least one segment, and never
/// contain empty, `.`, or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentPath {
    segments: Vec<String>,
}

impl ComponentPath {
    /// Parses an absolute path string.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the string is empty, relative, or contains an
    /// empty or relative segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use sinew_core::ComponentPath;
    ///
    /// let path = ComponentPath::parse("/forceset/knee_actuator").unwrap();
    /// assert_eq!(path.name(), "knee_actuator");
    /// assert_eq!(path.to_string(), "/forceset/knee_actuator");
    ///
    /// assert!(ComponentPath::parse("forceset/knee_actuator").is_err());
    /// assert!(ComponentPath::parse("/forceset//knee").is_err());
    /// ```
    pub fn parse(path: &str) -> Result<Self, PathError> {
        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let Some(rest) = path.strip_prefix('/') else {
            return Err(PathError::NotAbsolute {
                path: path.to_owned(),
            });
        };

        let mut segments = Vec::new();
        for segment in rest.split('/') {
            match segment {
                "" => {
                    return Err(PathError::EmptySegment {
                        path: path.to_owned(),
                    });
                }
                "." | ".." => {
                    return Err(PathError::RelativeSegment {
                        path: path.to_owned(),
                        segment: segment.to_owned(),
                    });
                }
                _ => segments.push(segment.to_owned()),
            }
        }

        Ok(Self { segments })
    }

    /// Returns the path of a child named `name` under this path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidName`] if `name` is not a valid element name.
    pub fn join(&self, name: &str) -> Result<Self, PathError> {
        validate_name(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Ok(Self { segments })
    }

    /// Returns the last segment, which is the name of the element at this path.
    #[must_use]
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Returns the path segments from the root down.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the parent path, or `None` for a top-level element.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        (self.segments.len() > 1).then(|| Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns `true` if `label` is this path's string form.
    pub(crate) fn matches(&self, label: &str) -> bool {
        let mut remaining = label;
        for segment in &self.segments {
            let Some(rest) = remaining.strip_prefix('/') else {
                return false;
            };
            let Some(rest) = rest.strip_prefix(segment.as_str()) else {
                return false;
            };
            remaining = rest;
        }
        remaining.is_empty()
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for ComponentPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A reference to a model element, either by bare name or by absolute path.
///
/// Strings starting with `/` parse as paths; anything else must be a valid
/// element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Name(String),
    Path(ComponentPath),
}

impl Label {
    /// Parses a label.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the label is neither a valid name nor a valid
    /// absolute path.
    ///
    /// # Examples
    ///
    /// ```
    /// use sinew_core::{ComponentPath, Label};
    ///
    /// assert_eq!(
    ///     Label::parse("soleus_r").unwrap(),
    ///     Label::Name("soleus_r".into()),
    /// );
    /// assert_eq!(
    ///     Label::parse("/forceset/soleus_r").unwrap(),
    ///     Label::Path(ComponentPath::parse("/forceset/soleus_r").unwrap()),
    /// );
    /// assert!(Label::parse("forceset/soleus_r").is_err());
    /// ```
    pub fn parse(label: &str) -> Result<Self, PathError> {
        if label.starts_with('/') {
            ComponentPath::parse(label).map(Self::Path)
        } else if label.contains('/') {
            Err(PathError::NotAbsolute {
                path: label.to_owned(),
            })
        } else {
            validate_name(label)?;
            Ok(Self::Name(label.to_owned()))
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Path(path) => path.fmt(f),
        }
    }
}

/// Checks that `name` can be used as an element name.
///
/// # Errors
///
/// Returns [`PathError::InvalidName`] if `name` is empty or contains `/`.
pub fn validate_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        Err(PathError::InvalidName {
            name: name.to_owned(),
        })
    } else {
        Ok(())
    }
}
