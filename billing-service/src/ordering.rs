use chrono::{DateTime, Utc};

/// Reorder `items` newest first by `key`.
///
/// Only the slots already held by dated items are rearranged; an item whose
/// key is `None` stays exactly where it was. Ties keep their relative order.
pub fn sort_newest_first<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    let mut dated: Vec<(DateTime<Utc>, usize)> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| key(item).map(|date| (date, index)))
        .collect();
    let slots: Vec<usize> = dated.iter().map(|(_, index)| *index).collect();

    // Stable, so equal dates keep their order
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    let mut order: Vec<usize> = (0..items.len()).collect();
    for (slot, (_, source)) in slots.into_iter().zip(dated) {
        if let Some(target) = order.get_mut(slot) {
            *target = source;
        }
    }

    let mut items: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| items.get_mut(index).and_then(Option::take))
        .collect()
}
