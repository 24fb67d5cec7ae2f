//! Inbound frame routing.
//!
//! Replies carry no request id, and `message_response` answers reads, writes
//! and link queries alike. The kind of a reply is recovered from its shape, in
//! a fixed order:
//!
//! 1. a `links` object: link panes,
//! 2. `saved_index` together with `max_index`: write acknowledgement,
//! 3. anything else: content of the current entry.
//!
//! Replies are applied in arrival order and never checked for staleness. A
//! second-hop reply for a list the user has already navigated away from is
//! appended to whatever pane now holds that slot.

use crate::navigator::Navigator;
use crate::render::RenderSink;
use linkstore_core::{ClientEnvelope, Direction, LinkLists, MessageRef, MessageResponse, ServerEnvelope};

/// Content of the acknowledgement for a freshly appended entry.
const SAVED_SUCCESSFULLY: &str = "Message saved successfully";

impl Navigator {
    /// Dispatch one inbound text frame. Unreadable frames are reported to the
    /// sink and otherwise ignored.
    pub fn handle_frame(&mut self, frame: &str, sink: &mut dyn RenderSink) -> Vec<ClientEnvelope> {
        match ServerEnvelope::decode(frame) {
            Ok(envelope) => self.route(envelope, frame.trim(), sink),
            Err(e) => {
                tracing::warn!(error = %e, frame, "dropping unreadable frame");
                sink.show_status(&format!("Failed to parse server response: {e}"));
                Vec::new()
            }
        }
    }

    /// Apply a classified envelope. `raw` is logged for message responses.
    pub fn route(
        &mut self,
        envelope: ServerEnvelope,
        raw: &str,
        sink: &mut dyn RenderSink,
    ) -> Vec<ClientEnvelope> {
        match envelope {
            ServerEnvelope::MessageResponse(resp) => {
                let out = self.route_message_response(resp, sink);
                sink.append_log(raw);
                out
            }
            ServerEnvelope::MaxIndex(value) => {
                if self.state.set_max_index(value) {
                    tracing::debug!(max_index = self.state.max_index(), "max index changed");
                }
                self.refetch(sink)
            }
            ServerEnvelope::IndexTableInfo(rows) => {
                self.index_table = rows;
                sink.show_index_table(&self.index_table);
                Vec::new()
            }
            ServerEnvelope::FreeSpaceTableInfo(rows) => {
                self.free_space_table = rows;
                sink.show_free_space_table(&self.free_space_table);
                Vec::new()
            }
            ServerEnvelope::PassThrough { action, payload } => {
                sink.pass_through(action, &payload);
                Vec::new()
            }
            ServerEnvelope::Unknown(action) => {
                tracing::info!(action = %action, "ignoring unknown action");
                Vec::new()
            }
        }
    }

    fn route_message_response(
        &mut self,
        resp: MessageResponse,
        sink: &mut dyn RenderSink,
    ) -> Vec<ClientEnvelope> {
        if let Some(links) = resp.links {
            return self.apply_links(links, resp.parent_number, sink);
        }

        if let (Some(saved_index), Some(max_index)) = (resp.saved_index, resp.max_index) {
            if self.state.set_max_index(max_index) {
                tracing::debug!(max_index = self.state.max_index(), "max index changed");
            }
            let is_new_entry = resp.content.as_deref() == Some(SAVED_SUCCESSFULLY);
            if let (true, Some(linked_index)) = (is_new_entry, resp.linked_index) {
                sink.append_log(&format!(
                    "New message (index {saved_index}) linked to message {linked_index}"
                ));
                return self.refetch(sink);
            }
            self.state.jump_to(saved_index);
            sink.show_index_position(self.state.current_index(), self.state.max_index());
            return Vec::new();
        }

        if let Some(content) = resp.content {
            let format = resp.format.unwrap_or(self.format);
            let text = format.render(&content);
            self.state.set_current_message(MessageRef {
                index: self.state.current_index(),
                content,
                format,
            });
            sink.show_current_message(&text);
        }
        Vec::new()
    }

    fn apply_links(
        &mut self,
        links: LinkLists,
        parent_slot: Option<u32>,
        sink: &mut dyn RenderSink,
    ) -> Vec<ClientEnvelope> {
        let mut out = Vec::new();

        if let Some(forward) = links.forward {
            self.state.links.replace_first_hop(Direction::Forward, forward);
            sink.show_forward_links(self.state.links.first_hop(Direction::Forward));
            out.extend(self.second_hop_requests(Direction::Forward));
        }
        if let Some(backward) = links.backward {
            self.state.links.replace_first_hop(Direction::Backward, backward);
            sink.show_backward_links(self.state.links.first_hop(Direction::Backward));
            out.extend(self.second_hop_requests(Direction::Backward));
        }
        if let Some(forward2) = links.forward2 {
            self.apply_second_hop(Direction::Forward, parent_slot, &forward2, sink);
        }
        if let Some(backward2) = links.backward2 {
            self.apply_second_hop(Direction::Backward, parent_slot, &backward2, sink);
        }

        out
    }

    fn apply_second_hop(
        &mut self,
        direction: Direction,
        parent_slot: Option<u32>,
        links: &[MessageRef],
        sink: &mut dyn RenderSink,
    ) {
        let Some(slot) = parent_slot.filter(|slot| *slot >= 1) else {
            tracing::warn!(%direction, "second-hop reply without a parent slot, dropping");
            return;
        };
        self.state.links.append_second_hop(direction, slot, links);
        match direction {
            Direction::Forward => sink.show_forward2_links(slot, links),
            Direction::Backward => sink.show_backward2_links(slot, links),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::tests::contents;
    use crate::render::recording::{Event, RecordingSink};
    use linkstore_core::Format;

    fn navigator_at(current: u32, max: u32) -> Navigator {
        let mut nav = Navigator::new(1, Format::Text);
        nav.state.set_max_index(max);
        nav.state.jump_to(current);
        nav
    }

    #[test]
    fn max_index_triggers_entry_fetch() {
        let mut nav = Navigator::new(3, Format::Text);
        let mut sink = RecordingSink::default();
        let out = nav.handle_frame(r#"{"action":"max_index","value":10}"#, &mut sink);
        assert_eq!(nav.state().max_index(), 10);
        assert_eq!(
            contents(&out),
            ["get:3:text", "get:3:text:forward", "get:3:text:backward"]
        );
        assert_eq!(sink.events()[0], Event::Cleared);
    }

    #[test]
    fn forward_links_prefetch_second_hop() {
        let mut nav = navigator_at(1, 10);
        let mut sink = RecordingSink::default();
        let out = nav.handle_frame(
            r#"{"action":"message_response","links":{"forward":[{"index":4,"content":"four"},{"index":9,"content":"nine"}]}}"#,
            &mut sink,
        );
        assert_eq!(
            contents(&out),
            ["get:4:text:forward2:1", "get:9:text:forward2:2"]
        );
        assert_eq!(sink.events()[0], Event::Forward(vec![4, 9]));
        assert_eq!(nav.state().links.forward.len(), 2);
    }

    #[test]
    fn second_hop_lands_in_its_own_slot_regardless_of_order() {
        let mut nav = navigator_at(1, 10);
        let mut sink = RecordingSink::default();
        nav.handle_frame(
            r#"{"action":"message_response","links":{"forward":[{"index":4},{"index":9}]}}"#,
            &mut sink,
        );
        sink.take();

        nav.handle_frame(
            r#"{"action":"message_response","links":{"forward2":[{"index":20},{"index":21}]},"parentNumber":2}"#,
            &mut sink,
        );
        nav.handle_frame(
            r#"{"action":"message_response","links":{"forward2":[{"index":10}]},"parentNumber":1}"#,
            &mut sink,
        );

        let links = &nav.state().links;
        let slot1: Vec<u32> = links.second_hop(Direction::Forward, 1).iter().map(|m| m.index).collect();
        let slot2: Vec<u32> = links.second_hop(Direction::Forward, 2).iter().map(|m| m.index).collect();
        assert_eq!(slot1, vec![10]);
        assert_eq!(slot2, vec![20, 21]);

        let rendered: Vec<Event> = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Forward2(..)))
            .collect();
        assert_eq!(
            rendered,
            [Event::Forward2(2, vec![20, 21]), Event::Forward2(1, vec![10])]
        );
    }

    #[test]
    fn stale_second_hop_is_still_applied() {
        let mut nav = navigator_at(1, 10);
        let mut sink = RecordingSink::default();
        nav.handle_frame(
            r#"{"action":"message_response","links":{"backward":[{"index":2}]}}"#,
            &mut sink,
        );
        nav.handle_intent(crate::Intent::ChangeIndex(1), &mut sink);
        nav.handle_frame(
            r#"{"action":"message_response","links":{"backward2":[{"index":7}]},"parentNumber":1}"#,
            &mut sink,
        );
        assert_eq!(nav.state().links.second_hop(Direction::Backward, 1)[0].index, 7);
        assert!(nav.state().links.backward.is_empty());
    }

    #[test]
    fn second_hop_without_slot_is_dropped() {
        let mut nav = navigator_at(1, 10);
        let mut sink = RecordingSink::default();
        nav.handle_frame(
            r#"{"action":"message_response","links":{"forward2":[{"index":7}]}}"#,
            &mut sink,
        );
        assert!(nav.state().links.forward2.is_empty());
    }

    #[test]
    fn saved_and_linked_refreshes_current_without_moving() {
        let mut nav = navigator_at(3, 6);
        let mut sink = RecordingSink::default();
        let out = nav.handle_frame(
            r#"{"action":"message_response","content":"Message saved successfully","saved_index":7,"max_index":7,"linked_index":3}"#,
            &mut sink,
        );
        assert_eq!(nav.state().current_index(), 3);
        assert_eq!(nav.state().max_index(), 7);
        assert_eq!(
            contents(&out),
            ["get:3:text", "get:3:text:forward", "get:3:text:backward"]
        );
        assert!(sink
            .events()
            .contains(&Event::Log("New message (index 7) linked to message 3".into())));
    }

    #[test]
    fn other_write_ack_adopts_saved_index() {
        let mut nav = navigator_at(3, 6);
        let mut sink = RecordingSink::default();
        let out = nav.handle_frame(
            r#"{"action":"message_response","content":"Link added","saved_index":5,"max_index":6}"#,
            &mut sink,
        );
        assert!(out.is_empty());
        assert_eq!(nav.state().current_index(), 5);
        assert_eq!(sink.events()[0], Event::Position(5, 6));
    }

    #[test]
    fn saved_without_link_adopts_saved_index() {
        let mut nav = navigator_at(3, 6);
        let mut sink = RecordingSink::default();
        nav.handle_frame(
            r#"{"action":"message_response","content":"Message saved successfully","saved_index":7,"max_index":7}"#,
            &mut sink,
        );
        assert_eq!(nav.state().current_index(), 7);
    }

    #[test]
    fn plain_content_sets_current_message() {
        let mut nav = navigator_at(2, 4);
        let mut sink = RecordingSink::default();
        let raw = r#"{"action":"message_response","content":"hello"}"#;
        let out = nav.handle_frame(raw, &mut sink);
        assert!(out.is_empty());
        assert_eq!(nav.state().max_index(), 4);
        assert_eq!(nav.state().current_message().unwrap().content, "hello");
        assert_eq!(
            sink.events(),
            [Event::Current("hello".into()), Event::Log(raw.into())]
        );
    }

    #[test]
    fn binary_content_is_expanded() {
        let mut nav = navigator_at(1, 1);
        let mut sink = RecordingSink::default();
        nav.handle_frame(
            r#"{"action":"message_response","content":"41ff","format":"binary"}"#,
            &mut sink,
        );
        assert_eq!(sink.events()[0], Event::Current("01000001 11111111".into()));
    }

    #[test]
    fn unknown_reply_format_still_shows_content() {
        let mut nav = navigator_at(1, 2);
        let mut sink = RecordingSink::default();
        let raw = r#"{"action":"message_response","content":"hello","format":"utf8"}"#;
        nav.handle_frame(raw, &mut sink);
        assert_eq!(
            sink.events(),
            [Event::Current("hello".into()), Event::Log(raw.into())]
        );
        assert_eq!(nav.state().current_message().unwrap().format, Format::Text);
    }

    #[test]
    fn pass_through_frames_reach_the_sink() {
        let mut nav = navigator_at(2, 3);
        let mut sink = RecordingSink::default();
        let out = nav.handle_frame(
            r#"{"action":"build_result","content":"build ok"}"#,
            &mut sink,
        );
        assert!(out.is_empty());
        let out = nav.handle_frame(r#"{"action":"file_list","path":"docs","items":[]}"#, &mut sink);
        assert!(out.is_empty());

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Event::Log("build ok".into()));
        let Event::Log(listing) = &events[1] else {
            panic!("expected a log line, got {:?}", events[1]);
        };
        assert!(listing.contains(r#""action":"file_list""#));
        assert!(listing.contains(r#""path":"docs""#));
        assert_eq!(nav.state().current_index(), 2);
    }

    #[test]
    fn links_take_precedence_over_write_ack() {
        let mut nav = navigator_at(2, 4);
        let mut sink = RecordingSink::default();
        nav.handle_frame(
            r#"{"action":"message_response","content":"x","saved_index":4,"max_index":9,"links":{"forward":[]}}"#,
            &mut sink,
        );
        assert_eq!(nav.state().current_index(), 2);
        assert_eq!(nav.state().max_index(), 4);
        assert!(nav.state().current_message().is_none());
    }

    #[test]
    fn malformed_frame_does_not_stop_dispatch() {
        let mut nav = navigator_at(1, 3);
        let mut sink = RecordingSink::default();
        assert!(nav.handle_frame("{not json", &mut sink).is_empty());
        assert!(nav.handle_frame("", &mut sink).is_empty());
        let statuses = sink.statuses();
        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].starts_with("Failed to parse server response"));

        nav.handle_frame(r#"{"action":"message_response","content":"next"}"#, &mut sink);
        assert_eq!(nav.state().current_message().unwrap().content, "next");
    }

    #[test]
    fn tables_and_unknown_actions() {
        let mut nav = navigator_at(1, 3);
        let mut sink = RecordingSink::default();
        nav.handle_frame(
            r#"{"action":"index_table_info","data":[{"index":2,"offset":9,"length":1},{"index":1,"offset":0,"length":9}]}"#,
            &mut sink,
        );
        nav.handle_frame(r#"{"action":"presence","who":"x"}"#, &mut sink);
        nav.handle_intent(
            crate::Intent::SortIndexTable(linkstore_core::IndexColumn::Index),
            &mut sink,
        );
        assert_eq!(
            sink.events(),
            [Event::IndexTable(vec![2, 1]), Event::IndexTable(vec![1, 2])]
        );
    }
}
