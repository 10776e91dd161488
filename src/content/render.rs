//! Render-side helpers shared by the portal's page views
//!
//! These keep presentation decisions out of the fetch path: anchor slugs
//! for headings, grouping of consecutive list items, the table of contents
//! outline and table header resolution all work on an already fetched tree.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::content::block::{BlockKind, BlockNode, RichTextRun};

static NON_ALNUM_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Derive the anchor slug of a heading
///
/// Accents are folded to their base letters, the rest is lowercased and
/// every run of non-alphanumeric characters collapses into a single
/// hyphen: `"Étape 1 : Cadrage"` becomes `"etape-1-cadrage"`.
#[must_use]
pub fn heading_anchor(text: &str) -> String {
    let folded: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let folded = folded.to_lowercase();
    NON_ALNUM_RUNS
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// A run of blocks as the page view renders them
#[derive(Debug, PartialEq, Eq)]
pub enum BlockGroup<'a> {
    /// Consecutive list items of the same kind, rendered as one list
    List {
        ordered: bool,
        items: Vec<&'a BlockNode>,
    },
    /// Any other block, rendered on its own
    Single(&'a BlockNode),
}

/// Group consecutive list items of the same kind
///
/// The store returns list items as free-standing siblings; a run of them
/// only closes when the item kind changes or a non-list block follows, so
/// interleaving bulleted and numbered items yields separate lists.
#[must_use]
pub fn group_blocks(blocks: &[BlockNode]) -> Vec<BlockGroup<'_>> {
    let mut groups = Vec::new();
    let mut run: Vec<&BlockNode> = Vec::new();
    let mut run_ordered = false;

    for block in blocks {
        if block.kind.is_list_item() {
            let ordered = block.kind.is_numbered_list_item();
            if !run.is_empty() && ordered != run_ordered {
                groups.push(BlockGroup::List {
                    ordered: run_ordered,
                    items: std::mem::take(&mut run),
                });
            }
            run_ordered = ordered;
            run.push(block);
        } else {
            if !run.is_empty() {
                groups.push(BlockGroup::List {
                    ordered: run_ordered,
                    items: std::mem::take(&mut run),
                });
            }
            groups.push(BlockGroup::Single(block));
        }
    }
    if !run.is_empty() {
        groups.push(BlockGroup::List {
            ordered: run_ordered,
            items: run,
        });
    }
    groups
}

/// One heading of the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

/// Collect the heading outline of a tree, depth first
#[must_use]
pub fn outline(blocks: &[BlockNode]) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();
    collect_headings(blocks, &mut entries);
    entries
}

fn collect_headings(blocks: &[BlockNode], entries: &mut Vec<OutlineEntry>) {
    for block in blocks {
        if let BlockKind::Heading { level, .. } = &block.kind {
            let text = block.plain_text();
            entries.push(OutlineEntry {
                level: level.depth(),
                anchor: heading_anchor(&text),
                text,
            });
        }
        collect_headings(&block.children, entries);
    }
}

/// A table cell with its header flag resolved
#[derive(Debug, PartialEq, Eq)]
pub struct TableCell<'a> {
    pub rich_text: &'a [RichTextRun],
    pub header: bool,
}

/// A table with header flags applied to its cells
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedTable<'a> {
    pub rows: Vec<Vec<TableCell<'a>>>,
}

/// Resolve a table node into rows of cells with header flags
///
/// The table's `header_row` flag marks every cell of the first row as a
/// header, `header_column` every first cell of a row. Children that are
/// not table rows are skipped. Returns `None` for non-table nodes.
#[must_use]
pub fn resolve_table(table: &BlockNode) -> Option<ResolvedTable<'_>> {
    let &BlockKind::Table {
        header_row,
        header_column,
    } = &table.kind
    else {
        return None;
    };
    let rows = table
        .children
        .iter()
        .filter_map(|child| match &child.kind {
            BlockKind::TableRow { cells } => Some(cells),
            _ => None,
        })
        .enumerate()
        .map(|(row_index, cells)| {
            cells
                .iter()
                .enumerate()
                .map(|(column_index, runs)| TableCell {
                    rich_text: runs.as_slice(),
                    header: (header_row && row_index == 0)
                        || (header_column && column_index == 0),
                })
                .collect()
        })
        .collect();
    Some(ResolvedTable { rows })
}
