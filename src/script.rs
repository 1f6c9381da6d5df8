//! Frame sequences described as data, and the loop that plays them.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, info};

use crate::connection::Connection;
use crate::errors::*;
use crate::protocol::{Command, Frame, Headers};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Step {
    pub command: Command,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Script {
    pub steps: Vec<Step>,
}

/// Values substituted into the built-in scenario.
#[derive(Clone, Debug)]
pub struct ScenarioParams {
    pub vhost: String,
    pub login: String,
    pub passcode: String,
    pub destination: String,
    pub subscription_id: String,
    pub receipt: String,
    pub file: String,
    pub body: String,
}

/// One played step: the frame that went out and whatever came back.
#[derive(Clone, Debug)]
pub struct Exchange {
    pub index: usize,
    pub sent: Frame,
    pub received: Bytes,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    command: String,
    #[serde(default)]
    headers: Vec<(String, String)>,
    #[serde(default)]
    body: Option<String>,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        ScenarioParams {
            vhost: "stomp.cs.bgu.ac.il".into(),
            login: "meni".into(),
            passcode: "films".into(),
            destination: "/topic/a".into(),
            subscription_id: "17".into(),
            receipt: "77".into(),
            file: "games.txt".into(),
            body: "Hello World".into(),
        }
    }
}

impl Step {
    pub fn new(command: Command) -> Self {
        Step {
            command,
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push(key, value);
        self
    }

    pub fn body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn to_frame(&self) -> Frame {
        let frame = Frame::new(self.command).with_headers(self.headers.clone());
        match self.body.as_ref() {
            Some(body) => frame.with_body(body.clone()),
            None => frame,
        }
    }
}

impl TryFrom<RawStep> for Step {
    type Error = StompError;
    fn try_from(raw: RawStep) -> Result<Self> {
        Ok(Step {
            command: raw.command.parse()?,
            headers: raw.headers.into_iter().collect(),
            body: raw.body.map(String::into_bytes),
        })
    }
}

impl Script {
    /// CONNECT, SUBSCRIBE with a receipt, then a SEND carrying a file name.
    pub fn default_scenario(params: &ScenarioParams) -> Self {
        let steps = vec![
            Step::new(Command::Connect)
                .header("accept-version", "1.2")
                .header("host", &params.vhost)
                .header("login", &params.login)
                .header("passcode", &params.passcode),
            Step::new(Command::Subscribe)
                .header("destination", &params.destination)
                .header("id", &params.subscription_id)
                .header("receipt", &params.receipt),
            Step::new(Command::Send)
                .header("destination", &params.destination)
                .header("file", &params.file)
                .body(params.body.as_str()),
        ];
        Script { steps }
    }

    /// Parse a JSON array of `{"command", "headers", "body"}` objects.
    /// Headers are `[key, value]` pairs so their order survives.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: Vec<RawStep> = serde_json::from_str(text)?;
        if raw.is_empty() {
            return Err(StompError::Script("no steps".into()));
        }
        let steps = raw
            .into_iter()
            .map(Step::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Script { steps })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StompError::Script(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded script from {}", path.display());
        Script::from_json(&text)
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Send every step in order, reading for up to `wait` after each one.
///
/// The first failure stops the run and is returned; the caller still owns
/// the connection and releases it.
pub async fn run<F>(
    conn: &mut Connection,
    script: &Script,
    wait: Duration,
    mut observer: F,
) -> Result<Vec<Exchange>>
where
    F: FnMut(&Exchange),
{
    let mut exchanges = Vec::with_capacity(script.len());
    for (index, step) in script.steps.iter().enumerate() {
        let frame = step.to_frame();
        conn.send_frame(frame.clone()).await?;
        let received = match conn.receive_response(wait).await {
            Err(StompError::PeerClosed) if step.command == Command::Disconnect => {
                debug!("Peer closed after DISCONNECT");
                Bytes::new()
            }
            other => other?,
        };
        info!(
            "Step {} ({}): {} bytes back",
            index,
            step.command,
            received.len()
        );

        let exchange = Exchange {
            index,
            sent: frame,
            received,
        };
        observer(&exchange);
        exchanges.push(exchange);
    }
    Ok(exchanges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::encode;

    #[test]
    fn default_scenario_matches_hand_built_frames() {
        let script = Script::default_scenario(&ScenarioParams::default());
        let wire = script
            .steps
            .iter()
            .map(|s| encode(s.to_frame()).expect("encode"))
            .collect::<Vec<_>>();

        assert_eq!(
            &wire[0][..],
            &b"CONNECT\naccept-version:1.2\nhost:stomp.cs.bgu.ac.il\nlogin:meni\npasscode:films\n\n\0"[..]
        );
        assert_eq!(
            &wire[1][..],
            &b"SUBSCRIBE\ndestination:/topic/a\nid:17\nreceipt:77\n\n\0"[..]
        );
        assert_eq!(
            &wire[2][..],
            &b"SEND\ndestination:/topic/a\nfile:games.txt\n\nHello World\0"[..]
        );
    }

    #[test]
    fn json_steps_keep_header_order() {
        let script = Script::from_json(
            r#"[
                {"command": "CONNECT", "headers": [["login", "u"], ["accept-version", "1.2"]]},
                {"command": "SEND", "headers": [["destination", "/q"]], "body": "hi"}
            ]"#,
        )
        .expect("parse script");

        assert_eq!(script.len(), 2);
        assert_eq!(
            script.steps[0].headers.iter().collect::<Vec<_>>(),
            vec![("login", "u"), ("accept-version", "1.2")]
        );
        assert_eq!(script.steps[0].body, None);
        assert_eq!(script.steps[1].body.as_deref(), Some(&b"hi"[..]));
    }

    #[test]
    fn json_with_unknown_command_is_rejected() {
        let err = Script::from_json(r#"[{"command": "SHOUT"}]"#).expect_err("should fail");
        assert!(matches!(err, StompError::UnknownCommand(_)), "{:?}", err);
    }

    #[test]
    fn empty_or_malformed_json_is_rejected() {
        assert!(matches!(
            Script::from_json("[]"),
            Err(StompError::Script(_))
        ));
        assert!(matches!(
            Script::from_json(r#"{"command": "SEND"}"#),
            Err(StompError::Json(_))
        ));
    }

    #[test]
    fn missing_script_file_is_reported() {
        let err = Script::load("/nonexistent/stomp-probe/script.json").expect_err("should fail");
        assert!(matches!(err, StompError::Script(_)), "{:?}", err);
    }
}
