//! Manual ranking of siblings by `sort_order`. Moving an item swaps its
//! `sort_order` with the adjacent sibling.

/// Move direction relative to the displayed order (up = smaller `sort_order`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct ReorderPayload {
    pub direction: Direction,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SortOrderUpdate {
    pub id: i32,
    pub sort_order: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReorderResult {
    pub changed: bool,
    pub items: Vec<SortOrderUpdate>,
}

impl ReorderResult {
    pub fn new(items: Vec<SortOrderUpdate>) -> Self {
        Self {
            changed: !items.is_empty(),
            items,
        }
    }
}

/// Computes the row updates for moving `target` one step in `direction`.
///
/// `siblings` holds `(id, sort_order)` pairs of the whole sort scope, in any order.
/// Returns `None` when `target` is not among them and an empty list when the
/// move is a no-op (first item up, last item down). When the current values are
/// not strictly increasing the scope is renumbered densely from 1 before the swap.
pub fn plan_reorder(siblings: &[(i32, i32)], target: i32, direction: Direction) -> Option<Vec<SortOrderUpdate>> {
    let mut ordered = siblings.to_vec();
    ordered.sort_by_key(|&(id, sort_order)| (sort_order, id));

    let index = ordered.iter().position(|&(id, _)| id == target)?;
    let neighbour = match direction {
        Direction::Up if index > 0 => index - 1,
        Direction::Down if index + 1 < ordered.len() => index + 1,
        _ => return Some(vec![]),
    };

    let strictly_increasing = ordered.windows(2).all(|pair| pair[0].1 < pair[1].1);
    let mut values = if strictly_increasing {
        ordered.iter().map(|&(_, sort_order)| sort_order).collect::<Vec<_>>()
    } else {
        (1..=ordered.len() as i32).collect::<Vec<_>>()
    };
    values.swap(index, neighbour);

    Some(
        ordered
            .iter()
            .zip(values)
            .filter(|&(&(_, old), new)| old != new)
            .map(|(&(id, _), sort_order)| SortOrderUpdate { id, sort_order })
            .collect(),
    )
}

/// `sort_order` for an item appended to the end of a scope
pub fn next_sort_order(max: Option<i32>) -> i32 {
    max.map(|max| max + 1).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: i32, sort_order: i32) -> SortOrderUpdate {
        SortOrderUpdate { id, sort_order }
    }

    #[test]
    fn swaps_with_previous_sibling() {
        let siblings = [(10, 1), (11, 2), (12, 3)];
        let updates = plan_reorder(&siblings, 11, Direction::Up).unwrap();
        assert_eq!(updates, vec![update(10, 2), update(11, 1)]);
    }

    #[test]
    fn swaps_with_next_sibling_keeping_gaps() {
        let siblings = [(3, 30), (1, 10), (2, 20)];
        let updates = plan_reorder(&siblings, 1, Direction::Down).unwrap();
        assert_eq!(updates, vec![update(1, 20), update(2, 10)]);
    }

    #[test]
    fn boundaries_are_no_ops() {
        let siblings = [(1, 1), (2, 2)];
        assert_eq!(plan_reorder(&siblings, 1, Direction::Up), Some(vec![]));
        assert_eq!(plan_reorder(&siblings, 2, Direction::Down), Some(vec![]));
        assert_eq!(plan_reorder(&[(5, 1)], 5, Direction::Down), Some(vec![]));
    }

    #[test]
    fn unknown_target() {
        assert_eq!(plan_reorder(&[(1, 1)], 7, Direction::Up), None);
    }

    #[test]
    fn ties_are_renumbered_before_swap() {
        let siblings = [(1, 5), (2, 5), (3, 5)];
        let updates = plan_reorder(&siblings, 3, Direction::Up).unwrap();
        assert_eq!(updates, vec![update(1, 1), update(2, 3), update(3, 2)]);
    }

    #[test]
    fn next_sort_order_appends() {
        assert_eq!(next_sort_order(None), 1);
        assert_eq!(next_sort_order(Some(7)), 8);
    }

    #[test]
    fn result_reports_change() {
        assert!(!ReorderResult::new(vec![]).changed);
        assert!(ReorderResult::new(vec![update(1, 2)]).changed);
    }
}
