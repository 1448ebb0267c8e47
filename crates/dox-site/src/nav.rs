//! Navigation tree construction.
//!
//! Builds the sidebar tree from the flat document set in two passes:
//! materialize a node per path prefix, then link children to parents.
//! Sorting happens per level: explicitly ordered nodes ascending first,
//! unordered nodes after, ties broken by case-insensitive title.

use std::collections::HashMap;

use serde::Serialize;

use dox_content::{CategoryConfig, Document};

/// One node of the navigation tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavItem {
    /// Display title.
    pub title: String,
    /// Link target. Category nodes without a page use the `#` placeholder.
    pub href: String,
    /// Ordering weight, lower sorts first. Unordered nodes sort last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Whether the node renders collapsed by default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    /// Child navigation items.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

/// A flattened navigation entry, used for prev/next lookups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavLink {
    /// Display title.
    pub title: String,
    /// Link target.
    pub href: String,
}

/// Neighbouring pages of a document in reading order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PrevNext {
    /// Preceding page, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<NavLink>,
    /// Following page, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<NavLink>,
}

/// Build the navigation tree for a document set.
///
/// Documents are processed in input order; a node is materialized for
/// every unseen path prefix. Category sidecar metadata wins over
/// document metadata when both describe the same path.
#[must_use]
pub fn build_navigation(
    docs: &[Document],
    categories: &HashMap<String, CategoryConfig>,
    base_url: &str,
) -> Vec<NavItem> {
    let mut nodes: HashMap<String, NavItem> = HashMap::new();
    let mut seen_order: Vec<String> = Vec::new();

    // Pass 1: materialize a node per path prefix and per document.
    for doc in docs {
        let segments: Vec<&str> = doc.slug.split('/').collect();

        for depth in 1..segments.len() {
            let prefix = segments[..depth].join("/");
            ensure_category_node(
                &mut nodes,
                &mut seen_order,
                prefix,
                segments[depth - 1],
                categories,
            );
        }

        let href = format!("{base_url}/{}", doc.slug);
        if let Some(existing) = nodes.get_mut(&doc.slug) {
            // A directory index page gives its category node a real link.
            existing.href = href;
            if !categories.contains_key(&doc.slug) {
                existing.title.clone_from(&doc.meta.title);
                existing.order = doc.meta.order;
            }
        } else {
            nodes.insert(
                doc.slug.clone(),
                NavItem {
                    title: doc.meta.title.clone(),
                    href,
                    order: doc.meta.order,
                    collapsed: None,
                    children: Vec::new(),
                },
            );
            seen_order.push(doc.slug.clone());
        }
    }

    // Pass 2: link children to parents, deepest paths first so every
    // child is fully assembled before it moves into its parent.
    let mut by_depth: Vec<(usize, String)> = seen_order
        .iter()
        .enumerate()
        .map(|(idx, path)| (idx, path.clone()))
        .collect();
    by_depth.sort_by_key(|(idx, path)| (std::cmp::Reverse(path.matches('/').count()), *idx));

    for (_, path) in by_depth {
        let Some(parent) = parent_path(&path) else {
            continue;
        };
        if nodes.contains_key(parent) {
            if let Some(node) = nodes.remove(&path) {
                if let Some(parent_node) = nodes.get_mut(parent) {
                    parent_node.children.push(node);
                }
            }
        }
    }

    // Remaining nodes are roots, in first-seen order.
    let mut roots: Vec<NavItem> = seen_order
        .iter()
        .filter_map(|path| nodes.remove(path))
        .collect();

    sort_items(&mut roots);
    roots
}

/// Materialize a category node for an unseen prefix, or apply sidecar
/// metadata to a node that a document created first.
fn ensure_category_node(
    nodes: &mut HashMap<String, NavItem>,
    seen_order: &mut Vec<String>,
    prefix: String,
    segment: &str,
    categories: &HashMap<String, CategoryConfig>,
) {
    let config = categories.get(&prefix);

    if let Some(existing) = nodes.get_mut(&prefix) {
        if let Some(config) = config {
            existing.title.clone_from(&config.name);
            if config.order.is_some() {
                existing.order = config.order;
            }
            if existing.collapsed.is_none() {
                existing.collapsed = config.collapsed;
            }
        }
        return;
    }

    let item = match config {
        Some(config) => NavItem {
            title: config.name.clone(),
            href: "#".to_owned(),
            order: config.order,
            collapsed: config.collapsed,
            children: Vec::new(),
        },
        None => NavItem {
            title: dox_content::title_from_filename(segment),
            href: "#".to_owned(),
            order: None,
            collapsed: None,
            children: Vec::new(),
        },
    };
    nodes.insert(prefix.clone(), item);
    seen_order.push(prefix);
}

/// Parent prefix of a slug path, when it has one.
fn parent_path(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

/// Sort a navigation level in place, recursively.
fn sort_items(items: &mut [NavItem]) {
    items.sort_by(|a, b| {
        let a_key = (a.order.is_none(), a.order.unwrap_or(0));
        let b_key = (b.order.is_none(), b.order.unwrap_or(0));
        a_key
            .cmp(&b_key)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });
    for item in items {
        sort_items(&mut item.children);
    }
}

/// Flatten the tree depth-first into linkable entries.
///
/// Category placeholders (`#` targets) are skipped; a linked category
/// node appears before its children.
#[must_use]
pub fn flatten_navigation(items: &[NavItem]) -> Vec<NavLink> {
    let mut links = Vec::new();
    flatten_into(items, &mut links);
    links
}

fn flatten_into(items: &[NavItem], out: &mut Vec<NavLink>) {
    for item in items {
        if item.href != "#" {
            out.push(NavLink {
                title: item.title.clone(),
                href: item.href.clone(),
            });
        }
        flatten_into(&item.children, out);
    }
}

/// Previous and next pages around `href` in reading order.
#[must_use]
pub fn prev_next(href: &str, items: &[NavItem]) -> PrevNext {
    let links = flatten_navigation(items);
    let Some(idx) = links.iter().position(|l| l.href == href) else {
        return PrevNext::default();
    };
    PrevNext {
        prev: idx.checked_sub(1).map(|i| links[i].clone()),
        next: links.get(idx + 1).cloned(),
    }
}
