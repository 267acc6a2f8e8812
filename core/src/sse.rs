//! Incremental decoder for `text/event-stream` bodies.

/// One dispatched event. `event` defaults to `"message"` when the block has no
/// `event:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw body bytes and returns every event completed by them. Partial
    /// blocks stay buffered until the blank line that ends them arrives.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_block(&block) {
                events.push(event);
            }
        }
        events
    }
}

fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();
    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }
    if event.is_none() && data.is_empty() {
        return None;
    }
    Some(SseEvent {
        event: event.unwrap_or_else(|| "message".to_string()),
        data: data.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_complete_events() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"event: put\ndata: {\"path\":\"/\",\"data\":null}\n\nevent: keep-alive\ndata: null\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "put");
        assert_eq!(events[0].data, r#"{"path":"/","data":null}"#);
        assert_eq!(events[1].event, "keep-alive");
    }

    #[test]
    fn holds_partial_blocks_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: patch\nda").is_empty());
        assert!(decoder.push(b"ta: {}\n").is_empty());
        let events = decoder.push(b"\nevent: put");
        assert_eq!(
            events,
            vec![SseEvent {
                event: "patch".into(),
                data: "{}".into()
            }]
        );
    }

    #[test]
    fn accepts_crlf_and_multi_line_data() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": comment\r\ndata: one\r\ndata: two\r\n\r\n");
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "one\ntwo");
    }
}
