/// Caches the author list until it is explicitly invalidated
#[derive(Debug, Default)]
pub struct AuthorCache {
    authors: Option<Vec<String>>,
}

impl AuthorCache {
    /// Create a new, empty author cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the author list
    pub fn store(&mut self, authors: Vec<String>) {
        self.authors = Some(authors);
    }

    /// Retrieve the cached author list
    pub fn get(&self) -> Option<&[String]> {
        self.authors.as_deref()
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.authors = None;
    }
}
