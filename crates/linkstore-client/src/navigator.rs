//! User intents and the fetch/prefetch orchestration around them.
//!
//! A [`Navigator`] is the whole client-side state of a session. It never does
//! I/O: every operation mutates state, issues render calls, and returns the
//! envelopes that should go on the wire, in order.

use crate::config::ClientConfig;
use crate::render::RenderSink;
use crate::state::NavigationState;
use linkstore_core::{
    sort_free_space_rows, sort_index_rows, ClientEnvelope, Command, Direction, FreeSpaceColumn,
    FreeSpaceRow, Format, IndexColumn, IndexRow, MessageRef,
};

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Step through indices (up/down buttons).
    ChangeIndex(i64),
    /// Show a specific entry (link click).
    JumpTo(u32),
    /// Show a specific entry in a given format.
    Get { index: u32, format: Format },
    Modify { index: u32, text: String },
    Link {
        direction: Direction,
        source: u32,
        target: u32,
    },
    Unlink {
        direction: Direction,
        source: u32,
        target: u32,
    },
    GetLinks { index: u32, direction: Direction },
    /// Store a new entry linked to the current one.
    Append(String),
    IndexTableInfo,
    FreeSpaceTableInfo,
    SortIndexTable(IndexColumn),
    SortFreeSpaceTable(FreeSpaceColumn),
    ListFiles(String),
}

#[derive(Debug, Clone)]
pub struct Navigator {
    pub(crate) state: NavigationState,
    pub(crate) format: Format,
    pub(crate) index_table: Vec<IndexRow>,
    pub(crate) free_space_table: Vec<FreeSpaceRow>,
}

impl Navigator {
    pub fn new(start_index: u32, format: Format) -> Self {
        Self {
            state: NavigationState::new(start_index),
            format,
            index_table: Vec::new(),
            free_space_table: Vec::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.start_index, config.format)
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Startup sequence for a freshly opened connection.
    ///
    /// Only the max index is requested here; the entry fetch follows when the
    /// reply arrives.
    pub fn on_open(&mut self, sink: &mut dyn RenderSink) -> Vec<ClientEnvelope> {
        sink.show_status("Connected");
        vec![Command::GetMaxIndex.into()]
    }

    /// Clear the link panes and fetch the current entry with both link lists.
    pub fn refetch(&mut self, sink: &mut dyn RenderSink) -> Vec<ClientEnvelope> {
        let index = self.state.current_index();
        self.state.links.clear();
        sink.clear_link_panes();
        sink.show_index_position(index, self.state.max_index());
        sink.append_log(&format!("Requesting message and links with index: {index}"));
        Command::fetch_entry(index, self.format)
            .into_iter()
            .map(ClientEnvelope::from)
            .collect()
    }

    pub fn change_index(&mut self, delta: i64, sink: &mut dyn RenderSink) -> Vec<ClientEnvelope> {
        self.state.change_index(delta);
        self.refetch(sink)
    }

    pub fn jump_to(&mut self, index: u32, sink: &mut dyn RenderSink) -> Vec<ClientEnvelope> {
        self.state.jump_to(index);
        self.refetch(sink)
    }

    /// One second-hop request per link in the current first-hop list.
    pub(crate) fn second_hop_requests(&self, direction: Direction) -> Vec<ClientEnvelope> {
        prefetch(self.state.links.first_hop(direction), direction, self.format)
    }

    pub fn handle_intent(&mut self, intent: Intent, sink: &mut dyn RenderSink) -> Vec<ClientEnvelope> {
        match intent {
            Intent::ChangeIndex(delta) => self.change_index(delta, sink),
            Intent::JumpTo(index) => self.jump_to(index, sink),
            Intent::Get { index, format } => {
                self.format = format;
                self.jump_to(index, sink)
            }
            Intent::Modify { index, text } => {
                sink.append_log(&format!("Modifying message with index: {index}"));
                vec![Command::Modify { index, text }.into()]
            }
            Intent::Link {
                direction,
                source,
                target,
            } => {
                sink.append_log(&format!(
                    "Adding {direction} link from message {source} to {target}"
                ));
                vec![Command::Link {
                    direction,
                    source,
                    target,
                }
                .into()]
            }
            Intent::Unlink {
                direction,
                source,
                target,
            } => {
                sink.append_log(&format!(
                    "Removing {direction} link from message {source} to {target}"
                ));
                vec![Command::Unlink {
                    direction,
                    source,
                    target,
                }
                .into()]
            }
            Intent::GetLinks { index, direction } => {
                sink.append_log(&format!("Getting {direction} links for message {index}"));
                vec![Command::GetLinks { index, direction }.into()]
            }
            Intent::Append(text) => {
                sink.append_log(&format!("Sent: {text}"));
                let mut out = vec![ClientEnvelope::from(Command::Append {
                    text,
                    linked_to: self.state.current_index(),
                })];
                out.extend(self.refetch(sink));
                out
            }
            Intent::IndexTableInfo => vec![Command::GetIndexTableInfo.into()],
            Intent::FreeSpaceTableInfo => vec![Command::GetFreeSpaceTableInfo.into()],
            Intent::SortIndexTable(column) => {
                sort_index_rows(&mut self.index_table, column);
                sink.show_index_table(&self.index_table);
                Vec::new()
            }
            Intent::SortFreeSpaceTable(column) => {
                sort_free_space_rows(&mut self.free_space_table, column);
                sink.show_free_space_table(&self.free_space_table);
                Vec::new()
            }
            Intent::ListFiles(path) => vec![ClientEnvelope::ListFiles { path }],
        }
    }
}

fn prefetch(links: &[MessageRef], direction: Direction, format: Format) -> Vec<ClientEnvelope> {
    links
        .iter()
        .zip(1u32..)
        .map(|(link, parent_slot)| {
            Command::GetSecondHop {
                index: link.index,
                format,
                direction,
                parent_slot,
            }
            .into()
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::render::recording::{Event, RecordingSink};

    pub(crate) fn contents(out: &[ClientEnvelope]) -> Vec<String> {
        out.iter()
            .map(|env| match env {
                ClientEnvelope::Message { content } => content.clone(),
                ClientEnvelope::ListFiles { path } => format!("list_files {path}"),
            })
            .collect()
    }

    #[test]
    fn startup_asks_for_max_index_only() {
        let mut nav = Navigator::new(1, Format::Text);
        let mut sink = RecordingSink::default();
        assert_eq!(contents(&nav.on_open(&mut sink)), ["get_max_index"]);
        assert_eq!(sink.statuses(), ["Connected"]);
    }

    #[test]
    fn change_index_clears_then_refetches() {
        let mut nav = Navigator::new(1, Format::Hex);
        nav.state.set_max_index(5);
        let mut sink = RecordingSink::default();

        let out = nav.handle_intent(Intent::ChangeIndex(3), &mut sink);
        assert_eq!(nav.state().current_index(), 4);
        assert_eq!(
            contents(&out),
            ["get:4:hex", "get:4:hex:forward", "get:4:hex:backward"]
        );
        let events = sink.take();
        assert_eq!(events[0], Event::Cleared);
        assert_eq!(events[1], Event::Position(4, 5));

        let out = nav.handle_intent(Intent::ChangeIndex(10), &mut sink);
        assert_eq!(nav.state().current_index(), 5);
        assert_eq!(contents(&out)[0], "get:5:hex");
    }

    #[test]
    fn get_switches_format() {
        let mut nav = Navigator::new(1, Format::Text);
        nav.state.set_max_index(9);
        let mut sink = RecordingSink::default();
        let out = nav.handle_intent(
            Intent::Get {
                index: 6,
                format: Format::Binary,
            },
            &mut sink,
        );
        assert_eq!(nav.format(), Format::Binary);
        assert_eq!(contents(&out)[0], "get:6:binary");
    }

    #[test]
    fn append_links_to_current_and_refreshes() {
        let mut nav = Navigator::new(3, Format::Text);
        let mut sink = RecordingSink::default();
        let out = nav.handle_intent(Intent::Append("new idea".into()), &mut sink);
        assert_eq!(
            contents(&out),
            [
                "new idea|3",
                "get:3:text",
                "get:3:text:forward",
                "get:3:text:backward"
            ]
        );
        assert_eq!(sink.events()[0], Event::Log("Sent: new idea".into()));
    }

    #[test]
    fn editing_intents() {
        let mut nav = Navigator::new(1, Format::Text);
        let mut sink = RecordingSink::default();
        let out = [
            Intent::Modify {
                index: 2,
                text: "x:y".into(),
            },
            Intent::Link {
                direction: Direction::Forward,
                source: 1,
                target: 2,
            },
            Intent::Unlink {
                direction: Direction::Backward,
                source: 2,
                target: 1,
            },
            Intent::GetLinks {
                index: 4,
                direction: Direction::Forward,
            },
            Intent::IndexTableInfo,
            Intent::FreeSpaceTableInfo,
            Intent::ListFiles("docs".into()),
        ]
        .into_iter()
        .flat_map(|intent| nav.handle_intent(intent, &mut sink))
        .collect::<Vec<_>>();
        assert_eq!(
            contents(&out),
            [
                "modify:2:x:y",
                "link:forward:1:2",
                "unlink:backward:2:1",
                "getlinks:4:forward",
                "get_index_table_info",
                "get_free_space_table_info",
                "list_files docs"
            ]
        );
        assert_eq!(
            sink.events()[1],
            Event::Log("Adding forward link from message 1 to 2".into())
        );
    }

    #[test]
    fn sorting_is_local() {
        let mut nav = Navigator::new(1, Format::Text);
        nav.free_space_table = vec![
            FreeSpaceRow {
                offset: 30,
                length: 2,
            },
            FreeSpaceRow {
                offset: 10,
                length: 4,
            },
        ];
        let before = nav.state().clone();
        let mut sink = RecordingSink::default();
        let out = nav.handle_intent(Intent::SortFreeSpaceTable(FreeSpaceColumn::Offset), &mut sink);
        assert!(out.is_empty());
        assert_eq!(sink.events(), [Event::FreeSpaceTable(vec![10, 30])]);
        assert_eq!(nav.state(), &before);
    }

    #[test]
    fn prefetch_tags_parent_slots() {
        let links = [MessageRef::new(7, "a"), MessageRef::new(3, "b")];
        assert_eq!(
            contents(&prefetch(&links, Direction::Backward, Format::Text)),
            ["get:7:text:backward2:1", "get:3:text:backward2:2"]
        );
    }
}
