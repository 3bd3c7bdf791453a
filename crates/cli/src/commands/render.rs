//! Output formatting for cart state.

use std::fmt::Write;

use go_marketplace_cart::CartState;
use go_marketplace_core::Price;

/// Render the cart as a plain-text table with a subtotal line.
#[must_use]
pub fn table(state: &CartState) -> String {
    if state.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:<28} {:>5} {:>10} {:>10}",
        "ID", "TITLE", "QTY", "PRICE", "TOTAL"
    );
    for item in state {
        let _ = writeln!(
            out,
            "{:<16} {:<28} {:>5} {:>10} {:>10}",
            item.id.as_str(),
            truncate(&item.title, 28),
            item.quantity,
            item.price.to_string(),
            Price::new(item.line_total()).to_string(),
        );
    }
    let _ = writeln!(
        out,
        "{} units in {} lines, subtotal {}",
        state.item_count(),
        state.len(),
        Price::new(state.subtotal())
    );
    out
}

/// Render the cart lines as pretty-printed JSON.
///
/// # Errors
///
/// Returns `serde_json::Error` if a line cannot be serialized.
pub fn json(state: &CartState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(state.items())
}

/// Shorten `text` to at most `max` characters, marking the cut with `~`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
    short.push('~');
    short
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use go_marketplace_cart::DuplicatePolicy;
    use go_marketplace_core::NewCartItem;

    use super::*;

    fn sample() -> CartState {
        CartState::empty()
            .with_added(NewCartItem::new("p1", "Shirt", "u", 10), DuplicatePolicy::Append)
            .with_incremented("p1")
            .with_added(
                NewCartItem::new("p2", "Mug", "m", "4.50".parse::<Price>().unwrap()),
                DuplicatePolicy::Append,
            )
    }

    #[test]
    fn test_table_empty() {
        assert_eq!(table(&CartState::empty()), "Cart is empty\n");
    }

    #[test]
    fn test_table_rows_and_summary() {
        let out = table(&sample());
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("p1"));
        assert!(lines[1].contains("$20.00"));
        assert!(lines[2].starts_with("p2"));
        assert!(lines[2].contains("$4.50"));
        assert_eq!(lines[3], "3 units in 2 lines, subtotal $24.50");
    }

    #[test]
    fn test_json_lists_items() {
        let out = json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["id"], "p1");
        assert_eq!(value[0]["quantity"], 2);
        assert_eq!(value[1]["price"], 4.5);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Shirt", 28), "Shirt");
        assert_eq!(truncate("abcdef", 4), "abc~");
    }
}
