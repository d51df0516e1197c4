use serde::{Deserialize, Serialize};

/// A guest room and the phone number reachable for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub number: String,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Room {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            guest_name: None,
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_guest(mut self, name: impl Into<String>) -> Self {
        self.guest_name = Some(name.into());
        self
    }

    /// Whether `key` is this room's number or its guest phone.
    ///
    /// Phones compare on digits only, so "+1 (555) 010-0412" matches
    /// "+15550100412".
    pub fn matches(&self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return false;
        }
        if self.number.eq_ignore_ascii_case(key) {
            return true;
        }
        let key_digits = phone_digits(key);
        self.phone
            .as_deref()
            .map(phone_digits)
            .is_some_and(|phone| phone.len() >= 7 && phone == key_digits)
    }
}

fn phone_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
