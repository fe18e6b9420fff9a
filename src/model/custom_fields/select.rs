//! Select lists and radio buttons: fields holding one option.

use serde_json::{json, Value};

use super::{format_items, option_string, CustomField};
use crate::error::{Error, Result};
use crate::model::Issue;

/// Fields with one value picked from a fixed option list.
macro_rules! option_field {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            field: CustomField,
            items: Vec<String>,
        }

        impl $name {
            /// `items` are the selectable options. An empty list disables
            /// validation.
            pub fn new(field: CustomField, items: Vec<String>) -> Self {
                Self { field, items }
            }

            pub fn field(&self) -> &CustomField {
                &self.field
            }

            pub fn items(&self) -> &[String] {
                &self.items
            }

            /// Selected option, empty when nothing is selected.
            pub async fn value(&self, issue: &mut Issue) -> Result<String> {
                Ok(self
                    .field
                    .raw_value(issue)
                    .await?
                    .and_then(|v| option_string(&v, "value"))
                    .unwrap_or_default())
            }

            pub fn generate_setter(value: Option<&str>) -> Value {
                match value {
                    Some(value) => json!([{"set": {"value": value}}]),
                    None => json!([{"set": null}]),
                }
            }

            /// Select an option, `None` clears the field.
            pub fn set_value(&self, issue: &mut Issue, value: Option<&str>) -> Result<()> {
                if let Some(value) = value {
                    if !self.items.is_empty() && !self.items.iter().any(|item| item == value) {
                        return Err(Error::custom_field(format!(
                            "Can't select '{}' item. Available items for field '{}' are: {}",
                            value,
                            self.field.name(),
                            format_items(&self.items)
                        )));
                    }
                }
                self.field.edit(issue, Self::generate_setter(value));
                Ok(())
            }
        }
    };
}

option_field!(
    /// Drop-down list.
    SingleSelectField
);
option_field!(
    /// Radio buttons.
    RadioField
);
