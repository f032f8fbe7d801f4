#[cfg(test)]
mod telemetry_snapshot_tests {
    use std::time::Duration;

    use ctrstream_core::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};

    fn make_counters() -> TelemetryCounters {
        TelemetryCounters {
            headers: 1,
            chunks: 4,
            hashes: 4,
            bytes_plaintext: 1000,
            bytes_ciphertext: 1000,
            bytes_overhead: 16 + 4 * 32,
        }
    }

    fn make_timer() -> TelemetryTimer {
        let mut timer = TelemetryTimer::new();
        std::thread::sleep(Duration::from_millis(20)); // ensure elapsed > stage times
        timer.stage_times.add(Stage::Encrypt, Duration::from_millis(5));
        timer.stage_times.add(Stage::Write, Duration::from_millis(10));
        timer.finish();
        timer
    }

    #[test]
    fn snapshot_copies_counters() {
        let snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer(), 3);
        assert_eq!(snapshot.workers, 3);
        assert_eq!(snapshot.hashes, 4);
        assert_eq!(snapshot.physical_bytes(), 1000 + 144);
        assert!(snapshot.sanity_check());
    }

    #[test]
    fn throughput_is_positive_after_elapsed_time() {
        let snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer(), 1);
        assert!(snapshot.elapsed >= Duration::from_millis(20));
        assert!(snapshot.throughput_plaintext_bytes_per_sec > 0.0);
    }

    #[test]
    fn stage_times_accumulate_and_merge() {
        let mut a = StageTimes::default();
        a.add(Stage::Hash, Duration::from_millis(2));
        a.add(Stage::Hash, Duration::from_millis(3));
        let mut b = StageTimes::default();
        b.add(Stage::Hash, Duration::from_millis(1));
        b.add(Stage::Verify, Duration::from_millis(4));
        a.merge(&b);

        assert_eq!(a.get(Stage::Hash), Duration::from_millis(6));
        assert_eq!(a.total(), Duration::from_millis(10));
        assert!(a.has_all(&[Stage::Hash, Stage::Verify]));
        assert!(!a.has_all(&[Stage::Read]));
        assert!((a.get_ms(Stage::Verify) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn timed_closure_records_its_stage() {
        let mut t = StageTimes::default();
        let v = t.time(Stage::Read, || 7);
        assert_eq!(v, 7);
        assert!(t.has_all(&[Stage::Read]));
    }

    #[test]
    fn counters_merge_with_add_assign() {
        let mut total = TelemetryCounters::default();
        total += make_counters();
        total += make_counters();
        assert_eq!(total.headers, 2);
        assert_eq!(total.bytes_plaintext, 2000);
        assert_eq!(total.physical_bytes(), 2 * 1144);
    }

    #[test]
    fn sanity_check_flags_mismatched_bytes() {
        let mut c = make_counters();
        c.bytes_ciphertext += 1;
        let snapshot = TelemetrySnapshot::from(&c, &make_timer(), 1);
        assert!(!snapshot.sanity_check());
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let snapshot = TelemetrySnapshot::from(&make_counters(), &make_timer(), 2);
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"workers\":2"));
        let back: TelemetrySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bytes_overhead, snapshot.bytes_overhead);
    }

    #[test]
    fn stage_display_names() {
        assert_eq!(Stage::Verify.to_string(), "verify");
        assert_eq!(Stage::Encrypt.to_string(), "encrypt");
    }
}
