//! Rendering surface consumed by the engine.
//!
//! The engine never draws anything itself. Every visible effect goes through
//! a [`RenderSink`], which a front end implements over whatever display it
//! owns.

use linkstore_core::{Direction, FreeSpaceRow, IndexRow, MessageRef, PassThroughAction};
use serde_json::Value;
use std::fmt;

/// Display operations the engine issues.
pub trait RenderSink {
    /// Replace the current entry's text.
    fn show_current_message(&mut self, text: &str);

    /// Replace the forward pane. The second-hop forward pane is emptied too.
    fn show_forward_links(&mut self, links: &[MessageRef]);

    /// Replace the backward pane. The second-hop backward pane is emptied too.
    fn show_backward_links(&mut self, links: &[MessageRef]);

    /// Append entries to the second-hop forward pane under `parent_slot`.
    fn show_forward2_links(&mut self, parent_slot: u32, links: &[MessageRef]);

    /// Append entries to the second-hop backward pane under `parent_slot`.
    fn show_backward2_links(&mut self, parent_slot: u32, links: &[MessageRef]);

    /// Empty all four link panes.
    fn clear_link_panes(&mut self);

    fn show_index_position(&mut self, current: u32, max: u32);

    /// Append a line to the output log.
    fn append_log(&mut self, text: &str);

    fn show_index_table(&mut self, rows: &[IndexRow]);

    fn show_free_space_table(&mut self, rows: &[FreeSpaceRow]);

    /// Replace the status line.
    fn show_status(&mut self, message: &str);

    /// Frames for features outside the engine (file browser, build output).
    ///
    /// Logs the payload's `content` if it has one, otherwise the whole payload.
    fn pass_through(&mut self, _action: PassThroughAction, payload: &Value) {
        match payload.get("content").and_then(Value::as_str) {
            Some(content) => self.append_log(content),
            None => self.append_log(&payload.to_string()),
        }
    }
}

/// Label shown next to a link: `3`, `-3` or `2.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLabel {
    /// 1-based position in the forward pane.
    Forward(u32),
    /// 1-based position in the backward pane, shown negated.
    Backward(u32),
    /// Position within a second-hop list, keyed by the parent's slot.
    SecondHop { parent_slot: u32, position: u32 },
}

impl LinkLabel {
    pub fn first_hop(direction: Direction, position: u32) -> Self {
        match direction {
            Direction::Forward => LinkLabel::Forward(position),
            Direction::Backward => LinkLabel::Backward(position),
        }
    }
}

impl fmt::Display for LinkLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkLabel::Forward(p) => write!(f, "{p}"),
            LinkLabel::Backward(p) => write!(f, "-{p}"),
            LinkLabel::SecondHop {
                parent_slot,
                position,
            } => write!(f, "{parent_slot}.{position}"),
        }
    }
}
