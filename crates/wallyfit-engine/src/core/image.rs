use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of an image, unique within a level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::From)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Identifier of the `index`-th training image of a level.
    #[must_use]
    pub fn training(index: usize) -> Self {
        Self(format!("image-{index}"))
    }

    /// Identifier of the `index`-th held-out test image of a level.
    #[must_use]
    pub fn test(index: usize) -> Self {
        Self(format!("test-{index}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Where an image is loaded from (a bundled asset path or a URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::From)]
#[serde(transparent)]
pub struct ImageSource(String);

impl ImageSource {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageSource {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Borrowed view of what an image shows.
///
/// `contains_object` stands in for the pixel data: a real feature extractor
/// would load `source` and find out for itself, the simulated collaborators
/// read the flag directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageContent<'a> {
    pub source: &'a ImageSource,
    pub contains_object: bool,
}

/// Held-out image the trained model is evaluated on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestImage {
    id: ImageId,
    source: ImageSource,
    has_object: bool,
}

impl TestImage {
    #[must_use]
    pub fn new(id: ImageId, source: ImageSource, has_object: bool) -> Self {
        Self {
            id,
            source,
            has_object,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ImageId {
        &self.id
    }

    #[must_use]
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    #[must_use]
    pub fn has_object(&self) -> bool {
        self.has_object
    }

    #[must_use]
    pub fn content(&self) -> ImageContent<'_> {
        ImageContent {
            source: &self.source,
            contains_object: self.has_object,
        }
    }
}
