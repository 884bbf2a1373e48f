use crate::protocol::GpsdRequest;

use super::types::Watch;

/// Commands a watching client sends to GPSD
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Set (or query, with `None`) the watch policy for this connection
    Watch(Option<Watch>),
}

impl GpsdRequest for Message {
    /// Converts a request message into a GPSD command string
    ///
    /// Commands with parameters take the form `?COMMAND={"json":"params"};`.
    fn to_command(&self) -> String {
        match self {
            Message::Watch(Some(watch)) => {
                format!("?WATCH={};", serde_json::to_string(watch).unwrap())
            }
            Message::Watch(None) => "?WATCH;".into(),
        }
    }
}
