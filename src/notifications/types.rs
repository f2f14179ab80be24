//! Notification payload definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The record a notification is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub doctype: String,
    pub name: String,
}

impl DocumentRef {
    pub fn new(doctype: &str, name: &str) -> Self {
        Self {
            doctype: doctype.to_string(),
            name: name.to_string(),
        }
    }
}

/// A message to a set of users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipients: BTreeSet<String>,
    pub subject: String,
    pub body: String,
    pub reference: DocumentRef,
}
