//! Page slicing for post listings.
//!
//! Pages are 1-based. Out-of-range numbers clamp to the nearest valid page
//! and an empty listing still has one (empty) page.

use serde::Serialize;

/// Used when `AMOUNT` is not configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub num_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    /// A zero page size is bumped to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn paginate<T>(&self, items: Vec<T>, page_number: usize) -> Page<T> {
        paginate(items, self.page_size, page_number)
    }

    /// Resolve a raw `?page=` value: missing or non-numeric means page 1.
    pub fn get_page<T>(&self, items: Vec<T>, raw: Option<&str>) -> Page<T> {
        self.paginate(items, parse_page_number(raw))
    }
}

pub fn parse_page_number(raw: Option<&str>) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(1)
}

/// Total item count, independent of page size.
pub fn count<T>(items: &[T]) -> usize {
    items.len()
}

pub fn paginate<T>(items: Vec<T>, page_size: usize, page_number: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_count = items.len();
    let num_pages = total_count.div_ceil(page_size).max(1);
    let number = page_number.clamp(1, num_pages);

    let start = (number - 1) * page_size;
    let items: Vec<T> = items.into_iter().skip(start).take(page_size).collect();

    Page {
        items,
        number,
        page_size,
        total_count,
        num_pages,
        has_next: number < num_pages,
        has_previous: number > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thirteen() -> Vec<u32> {
        (1..=13).collect()
    }

    #[test]
    fn test_first_page_holds_page_size_items() {
        let page = paginate(thirteen(), 10, 1);
        assert_eq!(page.len(), 10);
        assert_eq!(page.items[0], 1);
        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_second_page_holds_remainder() {
        let page = paginate(thirteen(), 10, 2);
        assert_eq!(page.items, vec![11, 12, 13]);
        assert_eq!(page.num_pages, 2);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }

    #[test]
    fn test_count_is_independent_of_page_size() {
        let items = thirteen();
        assert_eq!(count(&items), 13);
        for size in [1, 3, 10, 50] {
            assert_eq!(paginate(items.clone(), size, 1).total_count, 13);
        }
    }

    #[test]
    fn test_out_of_range_clamps_to_last_page() {
        let page = paginate(thirteen(), 10, 99);
        assert_eq!(page.number, 2);
        assert_eq!(page.len(), 3);

        let page = paginate(thirteen(), 10, 0);
        assert_eq!(page.number, 1);
    }

    #[test]
    fn test_empty_collection_has_one_empty_page() {
        let page = paginate(Vec::<u32>::new(), 10, 3);
        assert!(page.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn test_get_page_parses_raw_value() {
        let paginator = Paginator::new(10);
        assert_eq!(paginator.get_page(thirteen(), Some("2")).number, 2);
        assert_eq!(paginator.get_page(thirteen(), Some("abc")).number, 1);
        assert_eq!(paginator.get_page(thirteen(), None).number, 1);
        assert_eq!(paginator.get_page(thirteen(), Some("-3")).number, 1);
    }

    #[test]
    fn test_zero_page_size_is_bumped() {
        assert_eq!(Paginator::new(0).page_size(), 1);
    }
}
