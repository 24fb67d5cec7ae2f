//! Line-oriented rendering to stdout.

use linkstore_client::{LinkLabel, RenderSink};
use linkstore_core::{Direction, FreeSpaceRow, IndexRow, MessageRef};
use std::collections::BTreeMap;
use std::io::Write;

/// Prints every render call as plain lines.
///
/// Second-hop entries arrive in batches per parent slot, so the next position
/// in each slot is tracked until the pane is emptied.
#[derive(Debug)]
pub struct TerminalSink<W = std::io::Stdout> {
    out: W,
    forward2: BTreeMap<u32, u32>,
    backward2: BTreeMap<u32, u32>,
}

impl TerminalSink {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            forward2: BTreeMap::new(),
            backward2: BTreeMap::new(),
        }
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }

    fn first_hop(&mut self, direction: Direction, links: &[MessageRef]) {
        let title = match direction {
            Direction::Forward => "forward",
            Direction::Backward => "backward",
        };
        self.line(&format!("[{title}]"));
        for (link, position) in links.iter().zip(1u32..) {
            let label = LinkLabel::first_hop(direction, position).to_string();
            self.line(&format!("  {label:>4}  #{} {}", link.index, link.content));
        }
    }

    fn second_hop(&mut self, direction: Direction, parent_slot: u32, links: &[MessageRef]) {
        let counts = match direction {
            Direction::Forward => &mut self.forward2,
            Direction::Backward => &mut self.backward2,
        };
        let next = counts.entry(parent_slot).or_insert(0);
        let first = *next + 1;
        *next += links.len() as u32;

        for (link, position) in links.iter().zip(first..) {
            let label = LinkLabel::SecondHop {
                parent_slot,
                position,
            }
            .to_string();
            self.line(&format!("  {label:>6}  #{} {}", link.index, link.content));
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn show_current_message(&mut self, text: &str) {
        self.line("----");
        self.line(text);
        self.line("----");
    }

    fn show_forward_links(&mut self, links: &[MessageRef]) {
        self.forward2.clear();
        self.first_hop(Direction::Forward, links);
    }

    fn show_backward_links(&mut self, links: &[MessageRef]) {
        self.backward2.clear();
        self.first_hop(Direction::Backward, links);
    }

    fn show_forward2_links(&mut self, parent_slot: u32, links: &[MessageRef]) {
        self.second_hop(Direction::Forward, parent_slot, links);
    }

    fn show_backward2_links(&mut self, parent_slot: u32, links: &[MessageRef]) {
        self.second_hop(Direction::Backward, parent_slot, links);
    }

    fn clear_link_panes(&mut self) {
        self.forward2.clear();
        self.backward2.clear();
    }

    fn show_index_position(&mut self, current: u32, max: u32) {
        self.line(&format!("[{current}/{max}]"));
    }

    fn append_log(&mut self, text: &str) {
        self.line(&format!("> {text}"));
    }

    fn show_index_table(&mut self, rows: &[IndexRow]) {
        self.line("index   offset  length  links");
        for row in rows {
            let links = row.forward_links.len() + row.backward_links.len();
            self.line(&format!(
                "{:>5} {:>8} {:>7} {:>6}",
                row.index, row.offset, row.length, links
            ));
        }
    }

    fn show_free_space_table(&mut self, rows: &[FreeSpaceRow]) {
        self.line("  offset  length");
        for row in rows {
            self.line(&format!("{:>8} {:>7}", row.offset, row.length));
        }
    }

    fn show_status(&mut self, message: &str) {
        self.line(&format!("* {message}"));
    }
}
