/// One page of a listing, pages are numbered from 1
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Matching rows before paging
    pub total_count: u64,
    pub page_no: u64,
    pub page_size: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        self.total_count.div_ceil(self.page_size)
    }

    pub fn has_previous(&self) -> bool {
        self.page_no > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_no < self.total_pages()
    }

    pub fn map<R, F: FnMut(T) -> R>(self, f: F) -> Page<R> {
        Page {
            total_count: self.total_count,
            page_no: self.page_no,
            page_size: self.page_size,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
