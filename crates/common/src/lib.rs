pub mod error;
pub mod message;
pub mod order;

pub use error::{Error, Result};
pub use message::{field_label, format_order_message};
pub use order::{FieldLookup, NewOrder, Order, OrderForm, ORDER_FIELDS, REQUIRED_FIELDS};
