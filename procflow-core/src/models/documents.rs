//! The polymorphic "documents required" field of a step.
//!
//! Stored documents come in several shapes: a single label, a list of
//! labels, a list of `{label, url}` records, or (from older editors) a
//! mix of labels and records. All of them deserialize losslessly into
//! [`Documents`]; editing always works on the normalized
//! `Vec<DocItem>` form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A required document, optionally linked to a form or page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DocItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl DocItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: None,
        }
    }

    pub fn linked(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: Some(url.into()),
        }
    }

    /// Returns the link, treating a blank URL as no link.
    pub fn link(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Parses `LABEL` or `LABEL|URL`.
    pub fn parse(input: &str) -> Self {
        match input.split_once('|') {
            Some((label, url)) if !url.trim().is_empty() => {
                Self::linked(label.trim(), url.trim())
            }
            Some((label, _)) => Self::new(label.trim()),
            None => Self::new(input.trim()),
        }
    }
}

impl fmt::Display for DocItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.link() {
            Some(url) => write!(f, "{} <{}>", self.label, url),
            None => write!(f, "{}", self.label),
        }
    }
}

/// One element of a document list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DocEntry {
    Label(String),
    Link(DocItem),
}

impl DocEntry {
    fn to_item(&self) -> DocItem {
        match self {
            DocEntry::Label(label) => DocItem::new(label.clone()),
            DocEntry::Link(item) => item.clone(),
        }
    }
}

/// The documents field in any of its accepted shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Documents {
    Text(String),
    List(Vec<DocEntry>),
}

impl Default for Documents {
    fn default() -> Self {
        Documents::List(Vec::new())
    }
}

impl Documents {
    pub fn text(label: impl Into<String>) -> Self {
        Documents::Text(label.into())
    }

    pub fn labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Documents::List(
            labels
                .into_iter()
                .map(|label| DocEntry::Label(label.into()))
                .collect(),
        )
    }

    /// Normalizes every shape into the richest representation.
    pub fn to_items(&self) -> Vec<DocItem> {
        match self {
            Documents::Text(label) => vec![DocItem::new(label.clone())],
            Documents::List(entries) => entries.iter().map(DocEntry::to_item).collect(),
        }
    }

    /// Compacts edited items into the simplest shape that keeps every link.
    ///
    /// A blank URL is dropped; if any item still has a link, every item is
    /// stored as a record.
    pub fn from_items(items: Vec<DocItem>) -> Self {
        let items: Vec<DocItem> = items
            .into_iter()
            .map(|item| {
                let url = item.link().map(str::to_string);
                DocItem {
                    label: item.label,
                    url,
                }
            })
            .collect();

        if items.iter().any(|item| item.url.is_some()) {
            return Documents::List(items.into_iter().map(DocEntry::Link).collect());
        }

        match items.len() {
            1 => Documents::Text(items.into_iter().map(|item| item.label).collect()),
            _ => Documents::labels(items.into_iter().map(|item| item.label)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Documents::Text(_) => 1,
            Documents::List(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_links(&self) -> bool {
        self.to_items().iter().any(|item| item.link().is_some())
    }
}
