// Paginated list result: items plus zero-based page metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn empty(size: u64) -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            size,
            total_elements: 0,
            total_pages: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }

    // Checks the container invariants. A zero size or zero page count means
    // the backend left the metadata out, so those bounds are not enforced.
    pub fn check_invariants(&self) -> Result<(), String> {
        let len = self.items.len() as u64;
        if self.size > 0 && len > self.size {
            return Err(format!(
                "page holds {len} items but declares size {}",
                self.size
            ));
        }
        if len > 0 && self.total_pages > 0 && self.page >= self.total_pages {
            return Err(format!(
                "page index {} is outside {} total pages",
                self.page, self.total_pages
            ));
        }
        Ok(())
    }
}
