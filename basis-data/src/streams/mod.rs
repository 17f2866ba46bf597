/// Initialisation of [`reconnecting`](reconnect::stream::ReconnectingStream) market streams and
/// their consumer-facing event types.
pub mod consumer;

/// [`ReconnectingStream`](reconnect::stream::ReconnectingStream) utilities and the
/// [`Event`](reconnect::Event) type communicating mid-stream reconnections to consumers.
pub mod reconnect;
