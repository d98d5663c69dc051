//! Cursor-based slicing over in-memory sequences.
//!
//! Cursors are base64 of `arrayconnection:{offset}`, the format Relay clients
//! already see from JavaScript servers, and the window arithmetic follows
//! `connectionFromArray`.

use async_graphql::connection::{query, Connection, CursorType, Edge};
use async_graphql::{OutputType, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

const CURSOR_PREFIX: &str = "arrayconnection:";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor is not valid base64")]
    Encoding,
    #[error("cursor does not encode an array offset")]
    Format,
}

/// Positional cursor into a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayCursor(pub usize);

impl CursorType for ArrayCursor {
    type Error = CursorError;

    fn decode_cursor(s: &str) -> Result<Self, Self::Error> {
        let bytes = STANDARD.decode(s).map_err(|_| CursorError::Encoding)?;
        let raw = String::from_utf8(bytes).map_err(|_| CursorError::Encoding)?;
        raw.strip_prefix(CURSOR_PREFIX)
            .and_then(|n| n.parse::<usize>().ok())
            .map(ArrayCursor)
            .ok_or(CursorError::Format)
    }

    fn encode_cursor(&self) -> String {
        STANDARD.encode(format!("{CURSOR_PREFIX}{}", self.0))
    }
}

/// Half-open range `[start, end)` selected by the connection arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl Window {
    pub fn compute(
        len: usize,
        after: Option<usize>,
        before: Option<usize>,
        first: Option<usize>,
        last: Option<usize>,
    ) -> Self {
        // Offsets decoded from cursors can exceed i64; saturate instead of wrapping.
        let wide = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        let len = wide(len);
        let after_offset = after.map_or(-1, wide);
        let before_offset = before.map_or(len, wide);

        let mut start = after_offset.max(-1).saturating_add(1);
        let mut end = before_offset.min(len);
        if let Some(first) = first {
            end = end.min(start.saturating_add(wide(first)));
        }
        if let Some(last) = last {
            start = start.max(end.saturating_sub(wide(last)));
        }

        let lower_bound = if after.is_some() { after_offset.saturating_add(1) } else { 0 };
        let upper_bound = if before.is_some() { before_offset } else { len };
        let has_previous_page = last.is_some() && start > lower_bound;
        let has_next_page = first.is_some() && end < upper_bound;

        let start = start.clamp(0, len) as usize;
        let end = (end.clamp(0, len) as usize).max(start);
        Self {
            start,
            end,
            has_previous_page,
            has_next_page,
        }
    }
}

/// Build a connection over `items`, mapping each selected element with `node`.
pub async fn connection_from_slice<T, N, F>(
    items: &[T],
    after: Option<String>,
    before: Option<String>,
    first: Option<i32>,
    last: Option<i32>,
    node: F,
) -> Result<Connection<ArrayCursor, N>>
where
    T: Sync,
    N: OutputType,
    F: Fn(&T) -> N + Send,
{
    query(
        after,
        before,
        first,
        last,
        |after: Option<ArrayCursor>, before: Option<ArrayCursor>, first, last| async move {
            let window = Window::compute(
                items.len(),
                after.map(|c| c.0),
                before.map(|c| c.0),
                first,
                last,
            );
            let mut connection = Connection::new(window.has_previous_page, window.has_next_page);
            connection.edges.extend(
                items[window.start..window.end]
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Edge::new(ArrayCursor(window.start + i), node(item))),
            );
            Ok::<_, async_graphql::Error>(connection)
        },
    )
    .await
}
