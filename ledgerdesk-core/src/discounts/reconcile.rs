use crate::discounts::types::ReconcileAction;
use crate::months::MonthKey;

/// Applies a reconcile toggle to a stored month list.
///
/// Adding a month that is already present, or removing one that is absent,
/// leaves the list untouched. The returned list is sorted and free of
/// duplicates; the flag reports whether anything changed.
pub fn apply_action(
    months: &[String],
    month: MonthKey,
    action: ReconcileAction,
) -> (Vec<String>, bool) {
    let key = month.to_string();
    let mut updated: Vec<String> = months
        .iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    updated.sort();
    updated.dedup();

    let position = updated.binary_search(&key);
    let changed = match (action, position) {
        (ReconcileAction::Reconcile, Err(idx)) => {
            updated.insert(idx, key);
            true
        }
        (ReconcileAction::Unreconcile, Ok(idx)) => {
            updated.remove(idx);
            true
        }
        _ => false,
    };

    (updated, changed)
}

/// Whether `action` may be applied to `month` when the calendar is at
/// `current_month`. Months in the future can only be unreconciled.
pub fn is_allowed(month: MonthKey, action: ReconcileAction, current_month: MonthKey) -> bool {
    action == ReconcileAction::Unreconcile || month <= current_month
}
