use std::cmp::Ordering;

use crate::types::Assignment;

/// Compare by raw due-date text, then title.
///
/// Lexical, not chronological: "2025-1-2" sorts before "2025-10-1" and
/// weekday names sort alphabetically.
pub fn compare_assignments(a: &Assignment, b: &Assignment) -> Ordering {
    a.due_date
        .cmp(&b.due_date)
        .then_with(|| a.title.cmp(&b.title))
}

/// Stable sort by `(due_date, title)`.
pub fn sort_assignments(assignments: &mut [Assignment]) {
    assignments.sort_by(compare_assignments);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(title: &str, due: &str) -> Assignment {
        let at = Utc.with_ymd_and_hms(2025, 3, 5, 10, 30, 0).unwrap();
        Assignment::new(title, "Art", "Pending", due, at)
    }

    #[test]
    fn test_sort_is_lexical_on_due_text() {
        let mut items = vec![
            item("B", "2025-10-1"),
            item("A", "2025-1-2"),
            item("C", "Friday"),
            item("A", "Friday"),
        ];
        sort_assignments(&mut items);

        let order: Vec<_> = items.iter().map(|a| (a.due_date.as_str(), a.title.as_str())).collect();
        assert_eq!(
            order,
            vec![("2025-1-2", "A"), ("2025-10-1", "B"), ("Friday", "A"), ("Friday", "C")]
        );
    }
}
