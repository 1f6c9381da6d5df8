use std::borrow::Cow;
use std::fmt;

use crate::errors::*;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AckMode {
    Auto,
    Client,
    ClientIndividual,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Command {
    // Client Commands
    Connect,
    Stomp,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    Disconnect,

    // Server commands
    Connected,
    Message,
    Receipt,
    Error,
}

// Commands and headers are encoded in UTF-8.
// See https://stomp.github.io/stomp-specification-1.2.html#Value_Encoding
//
// Order is kept as inserted and repeated keys are passed through untouched.
#[derive(Clone, Default, Eq, PartialEq, Debug, Hash)]
pub struct Headers(Vec<(String, String)>);

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Frame {
    command: Command,
    headers: Headers,
    body: Option<Vec<u8>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum FrameOrKeepAlive {
    Frame(Frame),
    KeepAlive,
}

impl AckMode {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            AckMode::Auto => "auto",
            AckMode::Client => "client",
            AckMode::ClientIndividual => "client-individual",
        }
    }
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Stomp => "STOMP",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Ack => "ACK",
            Command::Nack => "NACK",
            Command::Begin => "BEGIN",
            Command::Commit => "COMMIT",
            Command::Abort => "ABORT",
            Command::Disconnect => "DISCONNECT",
            Command::Connected => "CONNECTED",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
        }
    }

    /// Header values of CONNECT and CONNECTED frames are never escaped.
    pub(crate) fn escapes_headers(&self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

impl std::str::FromStr for Command {
    type Err = StompError;
    fn from_str(input: &str) -> Result<Self> {
        match input {
            "CONNECT" => Ok(Command::Connect),
            "STOMP" => Ok(Command::Stomp),
            "SEND" => Ok(Command::Send),
            "SUBSCRIBE" => Ok(Command::Subscribe),
            "UNSUBSCRIBE" => Ok(Command::Unsubscribe),
            "ACK" => Ok(Command::Ack),
            "NACK" => Ok(Command::Nack),
            "BEGIN" => Ok(Command::Begin),
            "COMMIT" => Ok(Command::Commit),
            "ABORT" => Ok(Command::Abort),
            "DISCONNECT" => Ok(Command::Disconnect),
            "CONNECTED" => Ok(Command::Connected),
            "MESSAGE" => Ok(Command::Message),
            "RECEIPT" => Ok(Command::Receipt),
            "ERROR" => Ok(Command::Error),
            other => Err(StompError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Headers {
    pub fn new() -> Self {
        Headers(Vec::new())
    }

    pub fn push<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.0.push((key.into(), value.into()));
    }

    /// First value for `key`; later repeats are ignored, as STOMP 1.2 asks.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Headers(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Frame {
            command,
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.push(key, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers.0.extend(headers.0);
        self
    }

    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn connect(host: &str, login: &str, passcode: &str) -> Self {
        Frame::new(Command::Connect)
            .with_header("accept-version", "1.2")
            .with_header("host", host)
            .with_header("login", login)
            .with_header("passcode", passcode)
    }

    pub fn subscribe(destination: &str, id: &str, receipt: Option<&str>) -> Self {
        let frame = Frame::new(Command::Subscribe)
            .with_header("destination", destination)
            .with_header("id", id);
        match receipt {
            Some(receipt) => frame.with_header("receipt", receipt),
            None => frame,
        }
    }

    pub fn subscribe_with_ack(destination: &str, id: &str, mode: AckMode) -> Self {
        Frame::subscribe(destination, id, None).with_header("ack", mode.as_str())
    }

    pub fn unsubscribe(id: &str, receipt: Option<&str>) -> Self {
        let frame = Frame::new(Command::Unsubscribe).with_header("id", id);
        match receipt {
            Some(receipt) => frame.with_header("receipt", receipt),
            None => frame,
        }
    }

    pub fn send<B: Into<Vec<u8>>>(destination: &str, body: B) -> Self {
        Frame::new(Command::Send)
            .with_header("destination", destination)
            .with_body(body)
    }

    pub fn disconnect(receipt: &str) -> Self {
        Frame::new(Command::Disconnect).with_header("receipt", receipt)
    }

    pub(crate) fn from_parts(command: Command, headers: Headers, body: Option<Vec<u8>>) -> Self {
        Frame {
            command,
            headers,
            body,
        }
    }

    pub fn body_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.body.as_deref().unwrap_or_default())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for (k, v) in self.headers.iter() {
            write!(f, " {}={}", k, v)?;
        }
        if let Some(body) = self.body.as_ref() {
            write!(f, " ({} byte body)", body.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_keep_insertion_order_and_repeats() {
        let frame = Frame::new(Command::Send)
            .with_header("b", "1")
            .with_header("a", "2")
            .with_header("b", "3");

        let seen = frame.headers().iter().collect::<Vec<_>>();
        assert_eq!(seen, vec![("b", "1"), ("a", "2"), ("b", "3")]);
        assert_eq!(frame.headers().get("b"), Some("1"));
    }

    #[test]
    fn commands_round_trip_through_their_names() {
        for cmd in [Command::Connect, Command::Nack, Command::Receipt] {
            assert_eq!(cmd.as_str().parse::<Command>().expect("parse"), cmd);
        }
        assert!(matches!(
            "HELLO".parse::<Command>(),
            Err(StompError::UnknownCommand(name)) if name == "HELLO"
        ));
    }

    #[test]
    fn connect_frame_has_no_body() {
        let frame = Frame::connect("example", "u", "p");
        assert_eq!(frame.body(), None);
        assert_eq!(frame.headers().get("accept-version"), Some("1.2"));
    }

    #[test]
    fn unsubscribe_carries_optional_receipt() {
        let frame = Frame::unsubscribe("17", Some("78"));
        assert_eq!(
            frame.headers().iter().collect::<Vec<_>>(),
            vec![("id", "17"), ("receipt", "78")]
        );
        assert!(Frame::unsubscribe("17", None).headers().get("receipt").is_none());
    }

    #[test]
    fn subscribe_with_ack_sets_mode() {
        let frame = Frame::subscribe_with_ack("/topic/a", "0", AckMode::ClientIndividual);
        assert_eq!(frame.headers().get("ack"), Some("client-individual"));
    }
}
