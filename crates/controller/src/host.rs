//! Single-task event loop driving a [`ForceController`].
//!
//! One tokio task owns the controller; channel commands and timer ticks are
//! serialized through a `select!`, so the controller itself needs no locking.

use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::command::ForceCommand;
use crate::controller::ForceController;
use classicwheel_hid_common::OutputReportSink;

/// Run the control loop until the command channel closes.
///
/// Initializes the hardware baseline, then alternates between applying
/// inbound commands and periodic ticks. Ticks missed under load are skipped
/// rather than bursted; the keep-alive logic tolerates late ticks. On exit
/// the controller sends its final stop.
pub async fn run<S: OutputReportSink>(
    mut controller: ForceController<S>,
    mut commands: mpsc::Receiver<ForceCommand>,
    tick_interval: Duration,
) {
    controller.initialize();
    info!(tick_ms = tick_interval.as_millis() as u64, "control loop started");

    let mut ticker = time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                controller.tick(Instant::now());
            }
            command = commands.recv() => {
                match command {
                    Some(command) => controller.handle_command(command, Instant::now()),
                    None => {
                        debug!("command channel closed");
                        break;
                    }
                }
            }
        }
    }

    controller.shutdown();
    info!("control loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use classicwheel_hid_common::mock::MockOutputSink;

    const STOP_ALL: [u8; 7] = [0xF3, 0, 0, 0, 0, 0, 0];

    fn test_config() -> HostConfig {
        HostConfig {
            rate_hz: 200,
            ..Default::default()
        }
        .normalized()
    }

    #[tokio::test]
    async fn loop_applies_commands_and_stops_on_close() {
        let sink = MockOutputSink::new();
        let observer = sink.clone();
        let cfg = test_config();
        let controller = ForceController::new(sink, &cfg);

        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(run(controller, rx, cfg.tick_interval()));

        tx.send(ForceCommand::SetConstant(64)).await.expect("send");
        tokio::time::sleep(Duration::from_millis(30)).await;

        let payloads = observer.sent_payloads();
        assert!(
            payloads
                .iter()
                .any(|p| p[0] == 0x11 && p[2] == 64 + 0x80),
            "constant force reached the sink: {payloads:?}"
        );

        drop(tx);
        task.await.expect("loop task");
        assert_eq!(
            observer.sent_payloads().last(),
            Some(&STOP_ALL.to_vec()),
            "final stop on shutdown"
        );
    }

    #[tokio::test]
    async fn keep_alive_resends_while_idle() {
        let sink = MockOutputSink::new();
        let observer = sink.clone();
        let cfg = test_config();
        let controller = ForceController::new(sink, &cfg);

        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(run(controller, rx, cfg.tick_interval()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        // Baseline (3 reports) plus several keep-alive stops over 50 ms.
        assert!(observer.sent().len() >= 5, "got {}", observer.sent().len());

        drop(tx);
        task.await.expect("loop task");
    }
}
