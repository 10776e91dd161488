//! Fetching a page's block tree from the store

use tracing::{debug, warn};

use crate::content::block::{BlockKind, BlockNode, Blocks};
use crate::store::WorkspaceStore;

/// Default nesting depth resolved below a page
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default cap on blocks kept per fetched tree
pub const DEFAULT_MAX_NODES: usize = 5000;

/// Bounds on how much of a content tree one fetch resolves
///
/// Content is client-authored, so nesting depth and block counts are not
/// under the portal's control. A fetch stops descending once `max_depth`
/// child levels are resolved and stops collecting once `max_nodes` blocks
/// have been kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl FetchLimits {
    #[must_use]
    pub const fn new(max_depth: usize, max_nodes: usize) -> Self {
        Self {
            max_depth,
            max_nodes,
        }
    }
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES)
    }
}

/// Fetch and type the full content tree of a page
///
/// Children are resolved recursively, in reading order, following the
/// listing cursor until each level is exhausted. Records whose kind falls
/// outside [`BlockKind`] are dropped. A level that fails mid-fetch is
/// rendered empty instead of failing the page: the error is logged and an
/// empty vector stands in, so one broken branch never takes down the rest
/// of the document.
pub async fn fetch_content_tree(
    store: &dyn WorkspaceStore,
    page_id: &str,
    limits: FetchLimits,
) -> Blocks {
    let mut budget = NodeBudget::new(limits.max_nodes);
    fetch_level(store, page_id, 0, limits, &mut budget).await
}

async fn fetch_level(
    store: &dyn WorkspaceStore,
    block_id: &str,
    depth: usize,
    limits: FetchLimits,
    budget: &mut NodeBudget,
) -> Blocks {
    let mut nodes = Blocks::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = match store.list_children(block_id, cursor.as_deref()).await {
            Ok(page) => page,
            Err(err) => {
                warn!(
                    block = block_id,
                    error = %err,
                    "children fetch failed, level rendered empty"
                );
                return Blocks::new();
            }
        };

        for record in page.results {
            let Some(kind) = BlockKind::from_raw(&record.kind, record.type_payload()) else {
                debug!(block = %record.id, kind = %record.kind, "dropping unsupported block");
                continue;
            };
            if !budget.consume() {
                return nodes;
            }
            let children = if record.has_children {
                if depth < limits.max_depth {
                    Box::pin(fetch_level(store, &record.id, depth + 1, limits, budget)).await
                } else {
                    warn!(block = %record.id, depth, "nesting limit reached, children omitted");
                    Blocks::new()
                }
            } else {
                Blocks::new()
            };
            nodes.push(BlockNode::with_children(record.id, kind, children));
        }

        match page.next_cursor {
            Some(next) if page.has_more => cursor = Some(next),
            _ => break,
        }
    }

    nodes
}

struct NodeBudget {
    remaining: usize,
    warned: bool,
}

impl NodeBudget {
    const fn new(remaining: usize) -> Self {
        Self {
            remaining,
            warned: false,
        }
    }

    fn consume(&mut self) -> bool {
        if self.remaining == 0 {
            if !self.warned {
                self.warned = true;
                warn!("node budget exhausted, content tree truncated");
            }
            return false;
        }
        self.remaining -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::memory::MemoryStore;

    fn paragraph(text: &str) -> serde_json::Value {
        json!({ "rich_text": [{ "plain_text": text }] })
    }

    #[tokio::test]
    async fn keeps_reading_order_and_drops_unknown_kinds() {
        let store = MemoryStore::new();
        store.seed_block("page-1", "paragraph", paragraph("premier"));
        store.seed_block("page-1", "child_database", json!({ "title": "ignorée" }));
        store.seed_block("page-1", "heading_2", paragraph("second"));

        let tree = fetch_content_tree(&store, "page-1", FetchLimits::default()).await;
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].plain_text(), "premier");
        assert!(tree[1].kind.is_heading());
    }

    #[tokio::test]
    async fn childless_blocks_trigger_no_extra_calls() {
        let store = MemoryStore::new();
        store.seed_block("page-1", "paragraph", paragraph("a"));
        store.seed_block("page-1", "paragraph", paragraph("b"));

        let tree = fetch_content_tree(&store, "page-1", FetchLimits::default()).await;
        assert_eq!(tree.len(), 2);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn pagination_is_transparent() {
        let store = MemoryStore::with_page_size(40);
        for n in 0..100 {
            store.seed_block("page-1", "paragraph", paragraph(&format!("bloc {n}")));
        }

        let tree = fetch_content_tree(&store, "page-1", FetchLimits::default()).await;
        assert_eq!(tree.len(), 100);
        assert_eq!(tree[0].plain_text(), "bloc 0");
        assert_eq!(tree[99].plain_text(), "bloc 99");
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test]
    async fn resolves_nested_children_in_place() {
        let store = MemoryStore::new();
        store.seed_block("page-1", "paragraph", paragraph("avant"));
        let toggle = store.seed_block("page-1", "toggle", paragraph("détails"));
        store.seed_block(&toggle, "paragraph", paragraph("caché 1"));
        let nested = store.seed_block(&toggle, "toggle", paragraph("plus loin"));
        store.seed_block(&nested, "paragraph", paragraph("caché 2"));
        store.seed_block("page-1", "paragraph", paragraph("après"));

        let tree = fetch_content_tree(&store, "page-1", FetchLimits::default()).await;
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[1].children.len(), 2);
        assert_eq!(tree[1].children[1].children[0].plain_text(), "caché 2");
        assert_eq!(tree[2].plain_text(), "après");
        assert_eq!(store.list_calls(), 3);
    }

    #[tokio::test]
    async fn failed_branch_renders_empty_but_spares_siblings() {
        let store = MemoryStore::new();
        let toggle = store.seed_block("page-1", "toggle", paragraph("cassé"));
        store.seed_block(&toggle, "paragraph", paragraph("jamais vu"));
        store.seed_block("page-1", "paragraph", paragraph("intact"));
        store.fail_children_of(&toggle);

        let tree = fetch_content_tree(&store, "page-1", FetchLimits::default()).await;
        assert_eq!(tree.len(), 2);
        assert!(tree[0].children.is_empty());
        assert_eq!(tree[1].plain_text(), "intact");
    }

    #[tokio::test]
    async fn root_failure_yields_empty_tree() {
        let store = MemoryStore::new();
        store.seed_block("page-1", "paragraph", paragraph("x"));
        store.fail_children_of("page-1");

        let tree = fetch_content_tree(&store, "page-1", FetchLimits::default()).await;
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn mid_pagination_failure_discards_partial_level() {
        let store = MemoryStore::with_page_size(2);
        for n in 0..4 {
            store.seed_block("page-1", "paragraph", paragraph(&format!("bloc {n}")));
        }
        store.fail_children_after("page-1", 1);

        let tree = fetch_content_tree(&store, "page-1", FetchLimits::default()).await;
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn depth_limit_stops_descent() {
        let store = MemoryStore::new();
        let level1 = store.seed_block("page-1", "toggle", paragraph("niveau 1"));
        let level2 = store.seed_block(&level1, "toggle", paragraph("niveau 2"));
        store.seed_block(&level2, "paragraph", paragraph("niveau 3"));

        let tree = fetch_content_tree(&store, "page-1", FetchLimits::new(1, 5000)).await;
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 1);
        assert!(tree[0].children[0].children.is_empty());
    }

    #[tokio::test]
    async fn node_budget_truncates_collection() {
        let store = MemoryStore::new();
        for n in 0..5 {
            store.seed_block("page-1", "paragraph", paragraph(&format!("bloc {n}")));
        }

        let tree = fetch_content_tree(&store, "page-1", FetchLimits::new(10, 3)).await;
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[2].plain_text(), "bloc 2");
    }

    #[test]
    fn default_limits() {
        let limits = FetchLimits::default();
        assert_eq!(limits.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(limits.max_nodes, DEFAULT_MAX_NODES);
    }
}
