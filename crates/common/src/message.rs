//! Plain-text rendering of an order for the WhatsApp notification

use crate::order::{FieldLookup, ORDER_FIELDS};

pub const MESSAGE_HEADER: &str = "--- New Cake Order ---";
pub const MESSAGE_FOOTER: &str = "----------------------";

/// Human label for a field name: `cake_flavour` becomes `Cake Flavour`
pub fn field_label(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Build the notification text for an order
///
/// One `Label: value` line per declared field, in declared order, between a
/// fixed header and footer. Missing fields render as empty.
pub fn format_order_message<F: FieldLookup + ?Sized>(fields: &F) -> String {
    let mut lines = Vec::with_capacity(ORDER_FIELDS.len() + 2);
    lines.push(MESSAGE_HEADER.to_string());

    for name in ORDER_FIELDS {
        let value = fields.field(name).unwrap_or("");
        lines.push(format!("{}: {}", field_label(name), value));
    }

    lines.push(MESSAGE_FOOTER.to_string());
    lines.join("\n")
}
