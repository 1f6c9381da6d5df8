#![cfg(feature = "end-to-end")]

use std::time::Duration;

use stomp_probe::script::{self, ScenarioParams, Script};
use stomp_probe::*;

// Needs a broker listening on 127.0.0.1:7777.
#[tokio::test]
async fn default_scenario_gets_answers() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut conn = connect("127.0.0.1", 7777).await?;
    let plan = Script::default_scenario(&ScenarioParams::default());
    let exchanges = script::run(&mut conn, &plan, Duration::from_secs(2), |_| ()).await?;

    let (items, _) = decode_frames(&exchanges[0].received)?;
    match items.first() {
        Some(FrameOrKeepAlive::Frame(frame)) => assert_eq!(frame.command(), Command::Connected),
        other => panic!("Expected CONNECTED, got {:?}", other),
    }

    conn.disconnect("e2e").await?;
    Ok(())
}
