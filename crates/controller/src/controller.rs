//! The real-time force state machine.

use std::time::{Duration, Instant};

use classicwheel_hid_classic_protocol::{
    build_constant_force_f0, build_default_spring_off, build_fixed_time_loop, build_stop_force,
    force_level, slots,
};
use classicwheel_hid_common::OutputReportSink;
use tracing::{debug, warn};

use crate::command::ForceCommand;
use crate::config::HostConfig;

/// Controller owning the mutable force state for one wheel session.
///
/// Conceptually two states: *Idle* (`active_force == 0`) and *Active*
/// (`active_force != 0`); a watchdog trip is the transition back to Idle
/// triggered by command silence rather than by request.
///
/// All methods take `now` explicitly so tests can fabricate time.
pub struct ForceController<S: OutputReportSink> {
    sink: S,
    report_id: u8,
    max_force: i8,
    watchdog: Duration,
    keep_alive: Duration,

    desired_force: i8,
    active_force: i8,
    last_update: Option<Instant>,
    last_send: Option<Instant>,
    loop_enabled: bool,
}

impl<S: OutputReportSink> ForceController<S> {
    /// Build a controller for an already-normalized configuration.
    pub fn new(sink: S, config: &HostConfig) -> Self {
        Self {
            sink,
            report_id: config.report_id,
            max_force: config.max_force_i8(),
            watchdog: config.watchdog(),
            keep_alive: config.keep_alive_interval(),
            desired_force: 0,
            active_force: 0,
            last_update: None,
            last_send: None,
            loop_enabled: false,
        }
    }

    /// Establish the hardware baseline: stop every slot, disable the default
    /// centering spring, enable the fixed update loop. Run once before the
    /// tick loop starts.
    pub fn initialize(&mut self) {
        self.send_payload(build_stop_force(slots::ALL), "stop-all");
        self.send_payload(build_default_spring_off(slots::ALL), "spring-off");
        self.send_payload(build_fixed_time_loop(true), "fixed-loop-on");
        self.loop_enabled = true;
    }

    /// Apply one parsed channel command.
    pub fn handle_command(&mut self, command: ForceCommand, now: Instant) {
        match command {
            ForceCommand::Stop => {
                self.desired_force = 0;
                self.last_update = Some(now);
                debug!("desired force cleared");
            }
            ForceCommand::SetConstant(value) => {
                self.desired_force = self.clamp_force(value);
                self.last_update = Some(now);
                debug!(force = self.desired_force, "desired force set");
            }
        }
    }

    /// One periodic evaluation.
    ///
    /// Watchdog staleness takes precedence over any pending desired force:
    /// once the last command is older than the budget, the wheel is stopped
    /// (if active) and nothing else happens this tick. Otherwise a send
    /// happens when the desired force changed or the keep-alive interval
    /// elapsed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(updated) = self.last_update
            && now.saturating_duration_since(updated) > self.watchdog
        {
            if self.active_force != 0 {
                warn!(stale_force = self.active_force, "watchdog expired, stopping force");
                self.send_payload(build_stop_force(slots::ALL), "watchdog-stop");
                self.active_force = 0;
                self.last_send = Some(now);
            }
            return;
        }

        let keep_alive_due = self
            .last_send
            .is_none_or(|sent| now.saturating_duration_since(sent) >= self.keep_alive);

        if self.desired_force != self.active_force || keep_alive_due {
            if self.desired_force == 0 {
                self.send_payload(build_stop_force(slots::ALL), "stop-all");
            } else {
                self.send_constant(self.desired_force);
            }
            self.active_force = self.desired_force;
            self.last_send = Some(now);
        }
    }

    /// Final stop on the way out so the wheel is never left applying force.
    pub fn shutdown(&mut self) {
        self.send_payload(build_stop_force(slots::ALL), "shutdown-stop");
        self.active_force = 0;
        self.desired_force = 0;
    }

    /// Last force actually transmitted.
    pub fn active_force(&self) -> i8 {
        self.active_force
    }

    /// Force currently requested upstream.
    pub fn desired_force(&self) -> i8 {
        self.desired_force
    }

    fn clamp_force(&self, value: i32) -> i8 {
        let bound = i32::from(self.max_force);
        value.clamp(-bound, bound) as i8
    }

    fn send_constant(&mut self, force: i8) {
        if !self.loop_enabled {
            self.send_payload(build_fixed_time_loop(true), "fixed-loop-on");
            self.loop_enabled = true;
        }
        self.send_payload(
            build_constant_force_f0(slots::F0, force_level(force)),
            "constant-force",
        );
    }

    /// Deliver a payload, absorbing failure. A failed send is logged and
    /// superseded by the next tick's re-evaluation; it never interrupts the
    /// control loop.
    fn send_payload(&mut self, payload: [u8; 7], label: &'static str) {
        if let Err(error) = self.sink.send_report(self.report_id, &payload) {
            warn!(error = %error, command = label, "output report send failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classicwheel_hid_common::mock::MockOutputSink;
    use proptest::prelude::*;

    const STOP_ALL: [u8; 7] = [0xF3, 0, 0, 0, 0, 0, 0];
    const SPRING_OFF: [u8; 7] = [0xF5, 0, 0, 0, 0, 0, 0];
    const LOOP_ON: [u8; 7] = [0x0D, 0x01, 0, 0, 0, 0, 0];

    fn controller_with(cfg: HostConfig) -> (ForceController<MockOutputSink>, MockOutputSink) {
        let sink = MockOutputSink::new();
        let observer = sink.clone();
        (ForceController::new(sink, &cfg.normalized()), observer)
    }

    fn default_controller() -> (ForceController<MockOutputSink>, MockOutputSink) {
        controller_with(HostConfig::default())
    }

    fn constant_payload(level: u8) -> Vec<u8> {
        vec![0x11, 0x00, level, 0x80, 0x80, 0x80, 0x00]
    }

    #[test]
    fn startup_baseline_sequence() {
        let (mut ctl, observer) = default_controller();
        ctl.initialize();
        assert_eq!(
            observer.sent_payloads(),
            vec![STOP_ALL.to_vec(), SPRING_OFF.to_vec(), LOOP_ON.to_vec()]
        );
    }

    #[test]
    fn first_tick_sends_stop_as_keep_alive() {
        let (mut ctl, observer) = default_controller();
        ctl.tick(Instant::now());
        assert_eq!(observer.sent_payloads(), vec![STOP_ALL.to_vec()]);
        assert_eq!(ctl.active_force(), 0);
    }

    #[test]
    fn constant_force_is_offset_binary_on_the_wire() {
        let (mut ctl, observer) = default_controller();
        ctl.initialize();
        observer.clear();

        let t0 = Instant::now();
        ctl.handle_command(ForceCommand::SetConstant(100), t0);
        ctl.tick(t0);
        assert_eq!(observer.sent_payloads(), vec![constant_payload(0xE4)]);
        assert_eq!(ctl.active_force(), 100);
    }

    #[test]
    fn requests_clamp_to_configured_bound() {
        let (mut ctl, _observer) = default_controller();
        let t0 = Instant::now();
        ctl.handle_command(ForceCommand::SetConstant(150), t0);
        assert_eq!(ctl.desired_force(), 100);
        ctl.handle_command(ForceCommand::SetConstant(-9999), t0);
        assert_eq!(ctl.desired_force(), -100);
    }

    #[test]
    fn no_resend_inside_keep_alive_window() {
        let (mut ctl, observer) = default_controller();
        ctl.initialize();
        observer.clear();

        let t0 = Instant::now();
        ctl.handle_command(ForceCommand::SetConstant(50), t0);
        ctl.tick(t0);
        assert_eq!(observer.sent().len(), 1);

        // 5 ms later: unchanged force, keep-alive (10 ms) not yet due.
        ctl.tick(t0 + Duration::from_millis(5));
        assert_eq!(observer.sent().len(), 1, "no redundant send inside the window");

        // 10 ms later: keep-alive resend.
        ctl.tick(t0 + Duration::from_millis(10));
        assert_eq!(observer.sent().len(), 2);
        assert_eq!(observer.sent_payloads()[1], constant_payload(50 + 0x80));
    }

    #[test]
    fn watchdog_stops_active_force_and_overrides_desired() {
        let (mut ctl, observer) = default_controller();
        ctl.initialize();
        observer.clear();

        let t0 = Instant::now();
        ctl.handle_command(ForceCommand::SetConstant(80), t0);
        ctl.tick(t0);
        assert_eq!(ctl.active_force(), 80);
        observer.clear();

        // Silence past the 250 ms budget: stop, regardless of desired force.
        ctl.tick(t0 + Duration::from_millis(300));
        assert_eq!(observer.sent_payloads(), vec![STOP_ALL.to_vec()]);
        assert_eq!(ctl.active_force(), 0);
        assert_eq!(ctl.desired_force(), 80, "desired force is untouched by the trip");

        // Still stale: nothing further, keep-alive suppressed.
        ctl.tick(t0 + Duration::from_millis(400));
        assert_eq!(observer.sent().len(), 1);
    }

    #[test]
    fn watchdog_never_fires_before_any_command() {
        let (mut ctl, observer) = default_controller();
        ctl.initialize();
        observer.clear();

        // No command was ever received; ticks just keep-alive-stop.
        let t0 = Instant::now();
        ctl.tick(t0 + Duration::from_secs(10));
        assert_eq!(observer.sent_payloads(), vec![STOP_ALL.to_vec()]);
    }

    #[test]
    fn fresh_command_rearms_the_watchdog() {
        let (mut ctl, observer) = default_controller();
        ctl.initialize();
        observer.clear();

        let t0 = Instant::now();
        ctl.handle_command(ForceCommand::SetConstant(60), t0);
        ctl.tick(t0);

        // Re-request just inside the budget; the trip must not happen.
        let t1 = t0 + Duration::from_millis(200);
        ctl.handle_command(ForceCommand::SetConstant(60), t1);
        ctl.tick(t0 + Duration::from_millis(300));
        assert_eq!(ctl.active_force(), 60);
    }

    #[test]
    fn end_to_end_scenario_clamp_then_watchdog() {
        // rate 200 Hz, watchdog 250 ms, max force 100.
        let (mut ctl, observer) = default_controller();
        ctl.initialize();
        observer.clear();

        let t0 = Instant::now();
        ctl.handle_command(ForceCommand::SetConstant(150), t0);
        assert_eq!(ctl.desired_force(), 100);

        ctl.tick(t0 + Duration::from_millis(5));
        assert_eq!(observer.sent_payloads(), vec![constant_payload(0xE4)]);

        // 300 ms of silence: the next tick stops the wheel.
        ctl.tick(t0 + Duration::from_millis(300));
        let sent = observer.sent_payloads();
        assert_eq!(sent.last(), Some(&STOP_ALL.to_vec()));
        assert_eq!(ctl.active_force(), 0);
    }

    #[test]
    fn stop_command_sends_stop_payload() {
        let (mut ctl, observer) = default_controller();
        ctl.initialize();

        let t0 = Instant::now();
        ctl.handle_command(ForceCommand::SetConstant(40), t0);
        ctl.tick(t0);
        observer.clear();

        ctl.handle_command(ForceCommand::Stop, t0 + Duration::from_millis(2));
        ctl.tick(t0 + Duration::from_millis(3));
        assert_eq!(observer.sent_payloads(), vec![STOP_ALL.to_vec()]);
        assert_eq!(ctl.active_force(), 0);
    }

    #[test]
    fn send_failure_still_advances_active_force() {
        let (mut ctl, observer) = default_controller();
        ctl.initialize();
        observer.clear();

        let t0 = Instant::now();
        observer.set_failing(true);
        ctl.handle_command(ForceCommand::SetConstant(30), t0);
        ctl.tick(t0);
        assert_eq!(ctl.active_force(), 30, "failure is absorbed, state advances");
        assert!(observer.sent().is_empty());

        // The next keep-alive naturally retries.
        observer.set_failing(false);
        ctl.tick(t0 + Duration::from_millis(10));
        assert_eq!(observer.sent_payloads(), vec![constant_payload(30 + 0x80)]);
    }

    #[test]
    fn shutdown_sends_final_stop() {
        let (mut ctl, observer) = default_controller();
        ctl.initialize();
        observer.clear();
        ctl.shutdown();
        assert_eq!(observer.sent_payloads(), vec![STOP_ALL.to_vec()]);
        assert_eq!(ctl.active_force(), 0);
    }

    #[test]
    fn reports_use_the_configured_report_id() {
        let (mut ctl, observer) = controller_with(HostConfig {
            report_id: 0x12,
            ..Default::default()
        });
        ctl.initialize();
        assert!(observer.sent().iter().all(|r| r.report_id == 0x12));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        /// Clamp law: any request lands in [-max_force, max_force] and the
        /// transmitted level is desired + 0x80.
        #[test]
        fn prop_clamp_law(value in any::<i32>(), max_force in 1i16..=127) {
            let (mut ctl, observer) = controller_with(HostConfig {
                max_force,
                ..Default::default()
            });
            ctl.initialize();
            observer.clear();

            let t0 = Instant::now();
            ctl.handle_command(ForceCommand::SetConstant(value), t0);
            let desired = ctl.desired_force();
            prop_assert!(i16::from(desired) >= -max_force);
            prop_assert!(i16::from(desired) <= max_force);

            ctl.tick(t0);
            let sent = observer.sent_payloads();
            prop_assert_eq!(sent.len(), 1);
            if desired == 0 {
                prop_assert_eq!(&sent[0], &STOP_ALL.to_vec());
            } else {
                let expected = (i16::from(desired) + 0x80) as u8;
                prop_assert_eq!(sent[0][2], expected);
            }
        }

        /// Repeated identical requests only ever resend on the keep-alive
        /// cadence; active force behavior is idempotent.
        #[test]
        fn prop_repeated_const_is_idempotent(value in 1i32..=100, repeats in 1usize..10) {
            let (mut ctl, observer) = default_controller();
            ctl.initialize();
            observer.clear();

            let t0 = Instant::now();
            for i in 0..repeats {
                ctl.handle_command(
                    ForceCommand::SetConstant(value),
                    t0 + Duration::from_millis(i as u64),
                );
                ctl.tick(t0 + Duration::from_millis(i as u64));
            }
            // One initial send; repeats within the 10 ms keep-alive window
            // must not add traffic.
            prop_assert_eq!(observer.sent().len(), 1);
            prop_assert_eq!(ctl.active_force(), value as i8);
        }
    }
}
