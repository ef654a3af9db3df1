//! Ordered formatter registry

use crate::formatter::MediaTypeFormatter;
use crate::media_type::MediaType;
use crate::types::TypeDescriptor;
use std::fmt;
use std::sync::Arc;

/// Formatters in priority order; the first match wins
#[derive(Clone, Default)]
pub struct MediaTypeFormatterCollection {
    formatters: Vec<Arc<dyn MediaTypeFormatter>>,
}

impl MediaTypeFormatterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, formatter: Arc<dyn MediaTypeFormatter>) {
        self.formatters.push(formatter);
    }

    /// Insert at `index`, shifting lower-priority formatters back
    pub fn insert(&mut self, index: usize, formatter: Arc<dyn MediaTypeFormatter>) {
        let index = index.min(self.formatters.len());
        self.formatters.insert(index, formatter);
    }

    pub fn remove(&mut self, index: usize) -> Option<Arc<dyn MediaTypeFormatter>> {
        (index < self.formatters.len()).then(|| self.formatters.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Arc<dyn MediaTypeFormatter>> {
        self.formatters.get(index)
    }

    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MediaTypeFormatter>> {
        self.formatters.iter()
    }

    /// First formatter able to read `ty` whose supported media types fall
    /// within `media_type`
    pub fn find_reader(
        &self,
        ty: &TypeDescriptor,
        media_type: &MediaType,
    ) -> Option<&Arc<dyn MediaTypeFormatter>> {
        let found = self.find(media_type, |formatter| formatter.can_read_type(ty));
        match found {
            Some(formatter) => tracing::debug!(
                formatter = %formatter.name(),
                ty = %ty,
                media_type = %media_type,
                "Selected reader"
            ),
            None => tracing::debug!(ty = %ty, media_type = %media_type, "No reader matched"),
        }
        found
    }

    /// First formatter able to write `ty` whose supported media types fall
    /// within `media_type`
    pub fn find_writer(
        &self,
        ty: &TypeDescriptor,
        media_type: &MediaType,
    ) -> Option<&Arc<dyn MediaTypeFormatter>> {
        let found = self.find(media_type, |formatter| formatter.can_write_type(ty));
        match found {
            Some(formatter) => tracing::debug!(
                formatter = %formatter.name(),
                ty = %ty,
                media_type = %media_type,
                "Selected writer"
            ),
            None => tracing::debug!(ty = %ty, media_type = %media_type, "No writer matched"),
        }
        found
    }

    fn find(
        &self,
        media_type: &MediaType,
        capable: impl Fn(&dyn MediaTypeFormatter) -> bool,
    ) -> Option<&Arc<dyn MediaTypeFormatter>> {
        self.formatters.iter().find(|&formatter| {
            capable(&**formatter)
                && formatter
                    .supported_media_types()
                    .iter()
                    .any(|supported| supported.is_subset_of(media_type))
        })
    }
}

impl fmt::Debug for MediaTypeFormatterCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.formatters.iter().map(|formatter| formatter.name()))
            .finish()
    }
}

impl FromIterator<Arc<dyn MediaTypeFormatter>> for MediaTypeFormatterCollection {
    fn from_iter<I: IntoIterator<Item = Arc<dyn MediaTypeFormatter>>>(iter: I) -> Self {
        Self {
            formatters: iter.into_iter().collect(),
        }
    }
}

impl Extend<Arc<dyn MediaTypeFormatter>> for MediaTypeFormatterCollection {
    fn extend<I: IntoIterator<Item = Arc<dyn MediaTypeFormatter>>>(&mut self, iter: I) {
        self.formatters.extend(iter);
    }
}

impl<'a> IntoIterator for &'a MediaTypeFormatterCollection {
    type Item = &'a Arc<dyn MediaTypeFormatter>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn MediaTypeFormatter>>;

    fn into_iter(self) -> Self::IntoIter {
        self.formatters.iter()
    }
}
