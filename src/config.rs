use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::errors::*;
use crate::script::{ScenarioParams, Script};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "stomp-probe",
    about = "Send a scripted sequence of STOMP frames and print what comes back"
)]
pub struct ProbeConfig {
    /// Broker host.
    #[arg(long, env = "STOMP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Broker port.
    #[arg(long, env = "STOMP_PORT", default_value_t = 7777)]
    pub port: u16,

    /// How long to wait for a reply after each frame.
    #[arg(long = "timeout-ms", default_value_t = 500)]
    pub timeout_ms: u64,

    /// JSON scenario to play instead of the built-in one.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Value of the CONNECT `host` header.
    #[arg(long, default_value = "stomp.cs.bgu.ac.il")]
    pub vhost: String,

    #[arg(long, env = "STOMP_LOGIN", default_value = "meni")]
    pub login: String,

    #[arg(long, env = "STOMP_PASSCODE", default_value = "films")]
    pub passcode: String,

    #[arg(long, default_value = "/topic/a")]
    pub destination: String,

    /// Finish with a DISCONNECT carrying this receipt id.
    #[arg(long, value_name = "RECEIPT")]
    pub disconnect: Option<String>,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn scenario_params(&self) -> ScenarioParams {
        ScenarioParams {
            vhost: self.vhost.clone(),
            login: self.login.clone(),
            passcode: self.passcode.clone(),
            destination: self.destination.clone(),
            ..ScenarioParams::default()
        }
    }

    pub fn load_script(&self) -> Result<Script> {
        match self.script.as_ref() {
            Some(path) => Script::load(path),
            None => Ok(Script::default_scenario(&self.scenario_params())),
        }
    }
}
