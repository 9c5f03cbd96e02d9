//! Page - the fundamental unit of storage.
//!
//! A [`Page`] is a raw byte buffer that serves as the unit of I/O between
//! disk and memory. Its length is fixed at pool-construction time (the
//! database's page size), not at compile time: a database opened with an
//! 8 KiB page size and one opened with a 64 KiB page size both use this
//! same type, just with a different `len()`.

/// A page of data, sized to whatever page size the owning database was
/// created with.
///
/// # Clone
/// `Page` does not implement `Clone` outside tests, to match production
/// database behavior: copying a page is expensive and should be explicit.
///
/// # Example
/// ```
/// use bufpool::storage::page::Page;
///
/// let mut page = Page::new(4096);
/// page.as_mut_slice()[0] = 0xFF;
/// assert_eq!(page.as_slice()[0], 0xFF);
/// ```
pub struct Page {
    data: Box<[u8]>,
}

impl Page {
    /// Create a new zeroed page of the given size in bytes.
    #[inline]
    pub fn new(page_size: usize) -> Self {
        Self {
            data: vec![0u8; page_size].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero out the entire page, preserving its size.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_new() {
        let page = Page::new(4096);
        assert_eq!(page.size(), 4096);
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[4095], 0);
    }

    #[test]
    fn test_page_read_write() {
        let mut page = Page::new(4096);
        page.as_mut_slice()[0] = 0xFF;
        page.as_mut_slice()[100] = 0xAB;
        page.as_mut_slice()[4095] = 0xCD;

        assert_eq!(page.as_slice()[0], 0xFF);
        assert_eq!(page.as_slice()[100], 0xAB);
        assert_eq!(page.as_slice()[4095], 0xCD);
    }

    #[test]
    fn test_page_reset() {
        let mut page = Page::new(4096);
        page.as_mut_slice()[0] = 0xFF;
        page.reset();
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.size(), 4096);
    }

    #[test]
    fn test_page_clone_in_tests() {
        let mut page = Page::new(256);
        page.as_mut_slice()[0] = 0xAB;
        let cloned = page.clone();
        assert_eq!(cloned.as_slice()[0], 0xAB);
    }

    #[test]
    fn test_page_arbitrary_size() {
        let page = Page::new(65536);
        assert_eq!(page.size(), 65536);
    }
}
