//! Host-testable core logic for motionlog.
//!
//! This library holds everything with a correctness contract: the mode
//! state machine, the debounced edge source, the capture session
//! manager, the sample converter, the console parser and the supervisor
//! that ties them together. None of it touches hardware; the embedded
//! binary (`main.rs`, behind the `embedded` feature) binds these pieces
//! to the RP2040 through the collaborator traits in [`storage`].
//!
//! Usage: `cargo test` (host, no cross toolchain needed).

#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod config;
pub mod console;
pub mod debounce;
pub mod error;
pub mod mode;
pub mod sample;
pub mod session;
pub mod storage;

#[cfg(feature = "embedded")]
pub mod sdfs;
#[cfg(feature = "embedded")]
pub mod sensor;
#[cfg(feature = "embedded")]
pub mod ui;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::config::{BUTTON_DEBOUNCE_US, CSV_HEADER, SAMPLE_PERIOD_MS};
    use crate::console::{self, ClockSetting, Command, LineAssembler, ParseError};
    use crate::debounce::{Debouncer, EdgeFlags};
    use crate::error::Error;
    use crate::sample::{MotionSample, RawSample};
    use crate::session::{Recorder, Tick};
    use crate::storage::OutputFile;

    // ════════════════════════════════════════════════════════════════════════
    // Debounced Edge Source Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn debouncer_accepts_first_edge() {
        let mut d = Debouncer::new(BUTTON_DEBOUNCE_US);
        assert!(d.accept(0));
    }

    #[test]
    fn debouncer_drops_edges_inside_window() {
        let mut d = Debouncer::new(BUTTON_DEBOUNCE_US);
        assert!(d.accept(1_000_000));
        assert!(!d.accept(1_000_001));
        assert!(!d.accept(1_200_000));
        // Exactly at the window boundary is still rejected (strictly
        // greater required).
        assert!(!d.accept(1_300_000));
        assert!(d.accept(1_300_001));
    }

    #[test]
    fn debouncer_rejection_has_no_side_effect() {
        let mut d = Debouncer::new(BUTTON_DEBOUNCE_US);
        assert!(d.accept(0));
        // A burst of rejected bounces must not push the window forward.
        assert!(!d.accept(100_000));
        assert!(!d.accept(200_000));
        assert!(!d.accept(299_999));
        assert!(d.accept(300_001));
    }

    #[test]
    fn debouncer_accepted_count_matches_spacing() {
        let mut d = Debouncer::new(BUTTON_DEBOUNCE_US);
        let edges = [0u64, 100_000, 400_001, 500_000, 800_002, 2_000_000];
        let accepted = edges.iter().filter(|&&t| d.accept(t)).count();
        // 0, 400_001, 800_002 and 2_000_000 are each >300 ms after the
        // previously accepted edge.
        assert_eq!(accepted, 4);
    }

    #[test]
    fn edge_flags_toggle_independently() {
        let flags = EdgeFlags::new();
        assert!(!flags.capture());
        assert!(!flags.mount());

        assert!(flags.toggle_capture());
        assert!(flags.capture());
        assert!(!flags.mount());

        assert!(flags.toggle_mount());
        assert!(!flags.toggle_capture());
        assert!(!flags.capture());
        assert!(flags.mount());
    }

    #[test]
    fn edge_flags_resync_overwrites() {
        let flags = EdgeFlags::new();
        flags.set_capture(true);
        assert!(flags.capture());
        // Next toggle observes the synced value.
        assert!(!flags.toggle_capture());
        assert!(!flags.capture());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Sample Converter Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn converter_flat_board_is_level() {
        let raw = RawSample {
            accel: [0, 0, 16384],
            gyro: [0, 0, 0],
            temp: 0,
        };
        let s = MotionSample::from_raw(&raw);
        assert!((s.roll_deg).abs() < 1e-4);
        assert!((s.pitch_deg).abs() < 1e-4);
        assert!((s.accel_g[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn converter_nose_down_is_minus_ninety_pitch() {
        let raw = RawSample {
            accel: [16384, 0, 0],
            gyro: [0, 0, 0],
            temp: 0,
        };
        let s = MotionSample::from_raw(&raw);
        assert!((s.pitch_deg + 90.0).abs() < 1e-3);
        assert!((s.roll_deg).abs() < 1e-4);
    }

    #[test]
    fn converter_scales_accel_and_gyro() {
        let raw = RawSample {
            accel: [8192, -16384, 16384],
            gyro: [131, -262, 1310],
            temp: 0,
        };
        let s = MotionSample::from_raw(&raw);
        assert!((s.accel_g[0] - 0.5).abs() < 1e-6);
        assert!((s.accel_g[1] + 1.0).abs() < 1e-6);
        assert!((s.gyro_dps[0] - 1.0).abs() < 1e-5);
        assert!((s.gyro_dps[1] + 2.0).abs() < 1e-5);
        assert!((s.gyro_dps[2] - 10.0).abs() < 1e-4);
    }

    #[test]
    fn converter_is_deterministic() {
        let raw = RawSample {
            accel: [123, -456, 15000],
            gyro: [7, 8, 9],
            temp: 0,
        };
        assert_eq!(MotionSample::from_raw(&raw), MotionSample::from_raw(&raw));
    }

    #[test]
    fn converter_roll_quarter_turn() {
        // Gravity fully along +Y: roll = atan2(1, 0) = 90 deg.
        let raw = RawSample {
            accel: [0, 16384, 0],
            gyro: [0, 0, 0],
            temp: 0,
        };
        let s = MotionSample::from_raw(&raw);
        assert!((s.roll_deg - 90.0).abs() < 1e-3);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Capture Session Tests
    // ════════════════════════════════════════════════════════════════════════

    #[derive(Default)]
    struct SinkState {
        data: Vec<u8>,
        flushes: usize,
        writes: usize,
        fail_after_writes: Option<usize>,
    }

    /// Shared-handle mock sink so tests can inspect bytes after the
    /// recorder consumed the sink.
    #[derive(Clone, Default)]
    struct MockSink(Rc<RefCell<SinkState>>);

    impl MockSink {
        fn failing_after(writes: usize) -> Self {
            let sink = Self::default();
            sink.0.borrow_mut().fail_after_writes = Some(writes);
            sink
        }

        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().data.clone()).unwrap()
        }

        fn flushes(&self) -> usize {
            self.0.borrow().flushes
        }
    }

    impl OutputFile for MockSink {
        fn write_all(&mut self, data: &[u8]) -> Result<(), Error> {
            let mut s = self.0.borrow_mut();
            s.writes += 1;
            if let Some(limit) = s.fail_after_writes {
                if s.writes > limit {
                    return Err(Error::WriteFailure);
                }
            }
            s.data.extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Error> {
            self.0.borrow_mut().flushes += 1;
            Ok(())
        }
    }

    fn level_sample() -> MotionSample {
        MotionSample::from_raw(&RawSample {
            accel: [0, 0, 16384],
            gyro: [0, 0, 0],
            temp: 0,
        })
    }

    #[test]
    fn start_writes_exact_header() {
        let sink = MockSink::default();
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        rec.start(sink.clone(), 0).unwrap();
        assert_eq!(sink.contents().as_bytes(), CSV_HEADER.as_bytes());
        assert_eq!(rec.sample_count(), 0);
    }

    #[test]
    fn start_twice_fails_already_active() {
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        rec.start(MockSink::default(), 0).unwrap();
        assert_eq!(
            rec.start(MockSink::default(), 0),
            Err(Error::AlreadyActive)
        );
    }

    #[test]
    fn stop_without_start_fails_not_active() {
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        assert_eq!(rec.stop(), Err(Error::NotActive));
    }

    #[test]
    fn tick_before_deadline_is_a_noop() {
        let sink = MockSink::default();
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        rec.start(sink.clone(), 1000).unwrap();
        let header_len = sink.contents().len();

        let out = rec.tick(&level_sample(), 1000 + SAMPLE_PERIOD_MS - 1).unwrap();
        assert_eq!(out, Tick::Idle);
        assert_eq!(rec.sample_count(), 0);
        assert_eq!(sink.contents().len(), header_len);
    }

    #[test]
    fn tick_when_inactive_is_a_noop() {
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        assert_eq!(rec.tick(&level_sample(), u64::MAX).unwrap(), Tick::Idle);
    }

    #[test]
    fn tick_logs_and_rearms_deadline() {
        let sink = MockSink::default();
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        rec.start(sink.clone(), 0).unwrap();

        assert_eq!(rec.tick(&level_sample(), 100).unwrap(), Tick::Logged);
        assert_eq!(rec.sample_count(), 1);
        // Deadline re-armed at now + period, not deadline + period.
        assert_eq!(rec.tick(&level_sample(), 150).unwrap(), Tick::Idle);
        assert_eq!(rec.tick(&level_sample(), 200).unwrap(), Tick::Logged);
        assert_eq!(rec.sample_count(), 2);
    }

    #[test]
    fn row_format_has_fixed_precision() {
        let sink = MockSink::default();
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        rec.start(sink.clone(), 0).unwrap();
        rec.tick(&level_sample(), 100).unwrap();

        let contents = sink.contents();
        let row = contents.lines().nth(1).unwrap();
        // pitch is atan2(-0.0, 1.0) here, and IEEE negative zero keeps
        // its sign through formatting.
        assert_eq!(
            row,
            "0,0.000,0.000,1.000,0.000,0.000,0.000,0.00,-0.00"
        );
    }

    #[test]
    fn one_hundred_fifty_samples_three_flushes_and_151_lines() {
        let sink = MockSink::default();
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        rec.start(sink.clone(), 0).unwrap();

        let mut flushes_seen = 0;
        let mut now = 0u64;
        for _ in 0..150 {
            now += SAMPLE_PERIOD_MS;
            match rec.tick(&level_sample(), now).unwrap() {
                Tick::LoggedAndFlushed => flushes_seen += 1,
                Tick::Logged => {}
                Tick::Idle => panic!("deadline should have elapsed"),
            }
        }

        assert_eq!(flushes_seen, 3); // at samples 50, 100 and 150
        assert_eq!(sink.flushes(), 3);
        assert_eq!(sink.contents().lines().count(), 151); // header + 150 rows
        assert_eq!(rec.sample_count(), 150);
    }

    #[test]
    fn counter_is_monotonic_and_resets_on_new_session() {
        let sink = MockSink::default();
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        rec.start(sink.clone(), 0).unwrap();
        rec.tick(&level_sample(), 100).unwrap();
        rec.tick(&level_sample(), 200).unwrap();
        assert_eq!(rec.stop().unwrap(), 2);

        let second = MockSink::default();
        rec.start(second.clone(), 0).unwrap();
        assert_eq!(rec.sample_count(), 0);
        rec.tick(&level_sample(), 100).unwrap();
        let contents = second.contents();
        let row = contents.lines().nth(1).unwrap();
        assert!(row.starts_with("0,"));
    }

    #[test]
    fn write_failure_stops_session_implicitly() {
        // Header write (1) succeeds, first row write (2) fails.
        let sink = MockSink::failing_after(1);
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        rec.start(sink, 0).unwrap();

        assert_eq!(
            rec.tick(&level_sample(), 100),
            Err(Error::WriteFailure)
        );
        assert!(!rec.is_active());
        // The broken handle is gone; further ticks are no-ops.
        assert_eq!(rec.tick(&level_sample(), 200).unwrap(), Tick::Idle);
    }

    #[test]
    fn stop_reports_final_count() {
        let sink = MockSink::default();
        let mut rec: Recorder<MockSink> = Recorder::new(SAMPLE_PERIOD_MS);
        rec.start(sink.clone(), 0).unwrap();
        for i in 1..=7u64 {
            rec.tick(&level_sample(), i * SAMPLE_PERIOD_MS).unwrap();
        }
        assert_eq!(rec.stop().unwrap(), 7);
        assert_eq!(sink.flushes(), 1); // the closing flush
    }

    // ════════════════════════════════════════════════════════════════════════
    // Console Tests
    // ════════════════════════════════════════════════════════════════════════

    fn feed(assembler: &mut LineAssembler, text: &str) -> Option<console::Line> {
        let mut last = None;
        for &b in text.as_bytes() {
            last = assembler.push(b);
        }
        last
    }

    #[test]
    fn assembler_completes_line_on_cr() {
        let mut asm = LineAssembler::new();
        let line = feed(&mut asm, "mount\r").unwrap();
        assert_eq!(line.as_str(), "mount");
    }

    #[test]
    fn assembler_swallows_empty_lines() {
        let mut asm = LineAssembler::new();
        assert!(asm.push(b'\r').is_none());
    }

    #[test]
    fn assembler_handles_backspace() {
        let mut asm = LineAssembler::new();
        let line = feed(&mut asm, "catx\x08 mpu_data.csv\r").unwrap();
        assert_eq!(line.as_str(), "cat mpu_data.csv");

        // DEL works the same way.
        let line = feed(&mut asm, "lsq\x7f\r").unwrap();
        assert_eq!(line.as_str(), "ls");
    }

    #[test]
    fn assembler_ignores_control_bytes() {
        let mut asm = LineAssembler::new();
        let line = feed(&mut asm, "h\x00\x1belp\r").unwrap();
        assert_eq!(line.as_str(), "help");
    }

    #[test]
    fn parse_named_commands() {
        assert_eq!(console::parse("mount"), Ok(Command::Mount));
        assert_eq!(console::parse("unmount"), Ok(Command::Unmount));
        assert_eq!(console::parse("format"), Ok(Command::Format));
        assert_eq!(console::parse("help"), Ok(Command::Help));
        assert_eq!(console::parse("ls"), Ok(Command::List(None)));
        assert_eq!(console::parse("getfree"), Ok(Command::Free));
        // Long-form aliases.
        assert_eq!(console::parse("list"), Ok(Command::List(None)));
        assert_eq!(console::parse("free"), Ok(Command::Free));
    }

    #[test]
    fn parse_cat_requires_argument() {
        match console::parse("cat mpu_data.csv") {
            Ok(Command::Cat(name)) => assert_eq!(name.as_str(), "mpu_data.csv"),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(console::parse("cat"), Err(ParseError::MissingArgument));
    }

    #[test]
    fn parse_ls_with_path() {
        match console::parse("ls logs") {
            Ok(Command::List(Some(path))) => assert_eq!(path.as_str(), "logs"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn parse_unknown_command() {
        assert_eq!(console::parse("reboot"), Err(ParseError::UnknownCommand));
        assert_eq!(console::parse("z"), Err(ParseError::UnknownCommand));
    }

    #[test]
    fn parse_setrtc() {
        assert_eq!(
            console::parse("setrtc 17 3 25 14 30 00"),
            Ok(Command::SetClock(ClockSetting {
                year: 2025,
                month: 3,
                day: 17,
                hour: 14,
                minute: 30,
                second: 0,
            }))
        );
        assert_eq!(
            console::parse("setrtc 17 3 25"),
            Err(ParseError::MissingArgument)
        );
        assert_eq!(
            console::parse("setrtc 17 13 25 14 30 00"),
            Err(ParseError::BadArgument)
        );
        assert_eq!(
            console::parse("setrtc xx 3 25 14 30 00"),
            Err(ParseError::BadArgument)
        );
    }

    #[test]
    fn shortcuts_map_one_to_one() {
        assert_eq!(console::parse("a"), Ok(Command::Mount));
        assert_eq!(console::parse("b"), Ok(Command::Unmount));
        assert_eq!(console::parse("c"), Ok(Command::List(None)));
        match console::parse("d") {
            Ok(Command::Cat(name)) => assert_eq!(name.as_str(), "mpu_data.csv"),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(console::parse("e"), Ok(Command::Free));
        assert_eq!(console::parse("f"), Ok(Command::Format));
        assert_eq!(console::parse("g"), Ok(Command::Help));
        assert_eq!(console::parse("h"), Ok(Command::StartCapture));
        assert_eq!(console::parse("i"), Ok(Command::StopCapture));
    }

    #[test]
    fn multi_letter_line_is_not_a_shortcut() {
        // "cat" starts with the 'c' shortcut letter but must parse as
        // the named command, not as List.
        assert_eq!(console::parse("cat x").unwrap(), {
            let mut name = heapless::String::new();
            let _ = name.push_str("x");
            Command::Cat(name)
        });
    }
}
