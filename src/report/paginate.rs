//! Cursor-based page-break decisions.
//!
//! [`PageCursor`] tracks how much of the current page is left. Before each
//! block it is asked whether the block's reservation still fits; if not,
//! and the page is not already empty, a [`Block::PageBreakHint`] goes in
//! front of the block. Oversized blocks start a fresh page and are never
//! split here.

use super::layout::PageMetrics;
use super::model::Block;

/// Vertical position on the simulated current page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    page_height: f32,
    remaining: f32,
    current_page: usize,
}

impl PageCursor {
    pub fn new(page_height: f32) -> Self {
        let page_height = page_height.max(1.0);
        Self {
            page_height,
            remaining: page_height,
            current_page: 1,
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// 1-based page number within the section.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn at_page_top(&self) -> bool {
        self.remaining >= self.page_height
    }

    /// Whether a block needing `reservation` must move to a new page.
    pub fn needs_break(&self, reservation: f32) -> bool {
        reservation > self.remaining && !self.at_page_top()
    }

    pub fn break_page(&mut self) {
        self.current_page += 1;
        self.remaining = self.page_height;
    }

    /// Consume `height`, flowing onto following pages as needed.
    pub fn advance(&mut self, height: f32) {
        let mut height = height.max(0.0);
        while height > self.remaining {
            height -= self.remaining;
            self.break_page();
        }
        self.remaining -= height;
    }

    /// Place one block; returns whether a page break goes before it.
    pub fn place(&mut self, reservation: f32, height: f32) -> bool {
        let broke = self.needs_break(reservation);
        if broke {
            self.break_page();
        }
        self.advance(height);
        broke
    }
}

/// Insert page-break hints into one section's blocks. Existing hints are
/// honoured and reset the cursor.
pub fn paginate(blocks: Vec<Block>, metrics: &PageMetrics) -> Vec<Block> {
    let mut cursor = PageCursor::new(metrics.body_height());
    let mut out = Vec::with_capacity(blocks.len());

    for block in blocks {
        if matches!(block, Block::PageBreakHint) {
            if !cursor.at_page_top() {
                cursor.break_page();
                out.push(block);
            }
            continue;
        }
        if cursor.place(metrics.reservation(&block), metrics.block_height(&block)) {
            out.push(Block::PageBreakHint);
        }
        out.push(block);
    }

    out
}
