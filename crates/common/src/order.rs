use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Error, Result};

/// Every field captured by the order form, in display and storage order.
pub const ORDER_FIELDS: [&str; 14] = [
    "client",
    "phone",
    "cake_flavour",
    "size",
    "colour",
    "details",
    "icing",
    "delivery",
    "date",
    "time",
    "location",
    "writings",
    "amount",
    "deposit",
];

/// Fields the store refuses to accept empty
pub const REQUIRED_FIELDS: [&str; 6] = ["client", "phone", "cake_flavour", "size", "date", "time"];

/// Name-to-value lookup over a set of order fields
pub trait FieldLookup {
    fn field(&self, name: &str) -> Option<&str>;
}

impl FieldLookup for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Raw order form as submitted by the browser
///
/// Fields missing from the submission default to an empty string. No value
/// is checked or coerced here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderForm {
    pub client: String,
    pub phone: String,
    pub cake_flavour: String,
    pub size: String,
    pub colour: String,
    pub details: String,
    pub icing: String,
    pub delivery: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub writings: String,
    pub amount: String,
    pub deposit: String,
}

impl FieldLookup for OrderForm {
    fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "client" => &self.client,
            "phone" => &self.phone,
            "cake_flavour" => &self.cake_flavour,
            "size" => &self.size,
            "colour" => &self.colour,
            "details" => &self.details,
            "icing" => &self.icing,
            "delivery" => &self.delivery,
            "date" => &self.date,
            "time" => &self.time,
            "location" => &self.location,
            "writings" => &self.writings,
            "amount" => &self.amount,
            "deposit" => &self.deposit,
            _ => return None,
        };

        Some(value.as_str())
    }
}

/// Validated order ready to be appended to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub client: String,
    pub phone: String,
    pub cake_flavour: String,
    pub size: String,
    pub colour: String,
    pub details: String,
    pub icing: String,
    /// Delivery method (pickup, courier, ...)
    pub delivery: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub writings: String,
    pub amount: Option<f64>,
    pub deposit: Option<f64>,
}

impl TryFrom<&OrderForm> for NewOrder {
    type Error = Error;

    fn try_from(form: &OrderForm) -> Result<Self> {
        Ok(Self {
            client: form.client.clone(),
            phone: form.phone.clone(),
            cake_flavour: form.cake_flavour.clone(),
            size: form.size.clone(),
            colour: form.colour.clone(),
            details: form.details.clone(),
            icing: form.icing.clone(),
            delivery: form.delivery.clone(),
            date: form.date.clone(),
            time: form.time.clone(),
            location: form.location.clone(),
            writings: form.writings.clone(),
            amount: parse_money("amount", &form.amount)?,
            deposit: parse_money("deposit", &form.deposit)?,
        })
    }
}

/// Blank means "not given"; anything else must be a plain decimal number
///
/// Only ASCII digits with at most one decimal point are accepted. Signs,
/// exponents and spellings such as `inf` are rejected.
fn parse_money(field: &'static str, raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let invalid = || Error::InvalidNumber {
        field,
        value: raw.to_string(),
    };

    let mut parts = trimmed.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    let plain = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    if !plain(whole) || !plain(fraction) || (whole.is_empty() && fraction.is_empty()) {
        return Err(invalid());
    }

    trimmed.parse::<f64>().map(Some).map_err(|_| invalid())
}

/// A stored order row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(flatten)]
    pub fields: NewOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> OrderForm {
        OrderForm {
            client: "Jane".to_string(),
            phone: "+1555".to_string(),
            cake_flavour: "Vanilla".to_string(),
            size: "Medium".to_string(),
            date: "2024-01-01".to_string(),
            time: "10:00".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_form_lookup_covers_every_declared_field() {
        let form = OrderForm::default();
        for name in ORDER_FIELDS {
            assert_eq!(form.field(name), Some(""), "field {name}");
        }
        assert_eq!(form.field("favourite_colour"), None);
    }

    #[test]
    fn test_required_fields_are_declared() {
        for name in REQUIRED_FIELDS {
            assert!(ORDER_FIELDS.contains(&name));
        }
    }

    #[test]
    fn test_new_order_copies_text_fields_verbatim() {
        let mut form = jane();
        form.writings = "  Happy Birthday  ".to_string();

        let order = NewOrder::try_from(&form).unwrap();

        assert_eq!(order.client, "Jane");
        assert_eq!(order.phone, "+1555");
        assert_eq!(order.writings, "  Happy Birthday  ");
        assert_eq!(order.colour, "");
        assert_eq!(order.amount, None);
        assert_eq!(order.deposit, None);
    }

    #[test]
    fn test_new_order_parses_money() {
        let mut form = jane();
        form.amount = "2500".to_string();
        form.deposit = " 1000.50 ".to_string();

        let order = NewOrder::try_from(&form).unwrap();

        assert_eq!(order.amount, Some(2500.0));
        assert_eq!(order.deposit, Some(1000.5));

        form.amount = "0.75".to_string();
        form.deposit = String::new();
        let order = NewOrder::try_from(&form).unwrap();
        assert_eq!(order.amount, Some(0.75));
        assert_eq!(order.deposit, None);
    }

    #[test]
    fn test_new_order_rejects_signed_and_exponent_money() {
        for raw in ["1e3", "-5", "+5", "inf", "1.2.3", ".", "0x10", "1 000"] {
            let mut form = jane();
            form.deposit = raw.to_string();

            let err = NewOrder::try_from(&form).unwrap_err();
            assert!(
                matches!(err, Error::InvalidNumber { field: "deposit", .. }),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_new_order_rejects_non_numeric_amount() {
        let mut form = jane();
        form.amount = "two thousand".to_string();

        let err = NewOrder::try_from(&form).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { field: "amount", .. }));

        form.amount = String::new();
        form.deposit = "NaN".to_string();
        let err = NewOrder::try_from(&form).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { field: "deposit", .. }));
    }

    #[test]
    fn test_order_serializes_flat() {
        let order = Order {
            id: 7,
            fields: NewOrder::try_from(&jane()).unwrap(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["client"], "Jane");
        assert!(json["amount"].is_null());
    }
}
