//! Tag frequency index across the pages of a project.
//!
//! Tags are free text, comma separated. The index is a sorted list of
//! `(tag, count)` pairs used for tag clouds; it plays no part in traversal.

/// Sorted, deduplicated tag counts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagIndex {
    entries: Vec<(String, usize)>,
}

impl TagIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from decoded pairs.
    ///
    /// Pairs with a zero count or blank tag are dropped and the result is
    /// sorted. Duplicates are merged, saturating at `usize::MAX`.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, usize)>) -> Self {
        let mut index = Self::new();
        for (tag, count) in entries {
            if count > 0 && !tag.trim().is_empty() {
                index.add_count(tag.trim(), count);
            }
        }
        index
    }

    /// Count one occurrence of every tag in a comma-separated list.
    pub fn add_list(&mut self, tags: &str) {
        for tag in tags.split(',') {
            self.add(tag);
        }
    }

    /// Count one occurrence of `tag`. Blank tags are ignored.
    pub fn add(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() {
            self.add_count(tag, 1);
        }
    }

    fn add_count(&mut self, tag: &str, count: usize) {
        match self
            .entries
            .binary_search_by(|(existing, _)| existing.as_str().cmp(tag))
        {
            Ok(i) => {
                let total = &mut self.entries[i].1;
                *total = total.saturating_add(count);
            }
            Err(i) => self.entries.insert(i, (tag.to_owned(), count)),
        }
    }

    /// How many pages carry `tag`.
    #[must_use]
    pub fn count(&self, tag: &str) -> usize {
        self.entries
            .binary_search_by(|(existing, _)| existing.as_str().cmp(tag))
            .map_or(0, |i| self.entries[i].1)
    }

    /// Entries sorted by tag.
    #[must_use]
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aggregate comma-separated tag strings into an index.
pub fn aggregate<'a>(tag_lists: impl IntoIterator<Item = &'a str>) -> TagIndex {
    let mut index = TagIndex::new();
    for list in tag_lists {
        index.add_list(list);
    }
    index
}
