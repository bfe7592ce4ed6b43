//! # Configuration Flows
//!
//! A TOML file on disk driving a bootstrapped engine, with metrics observed
//! through the telemetry crate.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use ledger_telemetry::{encode_metrics, register_metrics, TelemetryConfig};
    use shared_bus::LedgerEvent;
    use shared_types::{Identity, PartitionId, Role, StatusCode};
    use token_engine::{
        AtomicLogicalClock, ConfigError, EventSink, RecordingEventSink, TokenApi, TokenConfig,
        TokenEngine,
    };

    const ADMIN_HEX: &str = "0x00000000000000000000000000000000000000ad";
    const CONTROLLER_HEX: &str = "0x00000000000000000000000000000000000000c0";

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(body.as_bytes()).expect("write config");
        file
    }

    fn engine_from(config: &TokenConfig) -> (TokenEngine, Arc<RecordingEventSink>) {
        let events = Arc::new(RecordingEventSink::new());
        let sink: Arc<dyn EventSink> = events.clone();
        match TokenEngine::bootstrap(config, Arc::new(AtomicLogicalClock::new()), sink) {
            Ok(engine) => (engine, events),
            Err(e) => panic!("bootstrap failed: {e}"),
        }
    }

    #[test]
    fn test_toml_file_bootstraps_engine() {
        let file = write_config(&format!(
            r#"
            name = "Acme Shares"
            symbol = "ACS"
            decimals = 0
            granularity = 10
            global_cap = 100000
            admins = ["{ADMIN_HEX}"]
            controllers = ["{CONTROLLER_HEX}"]

            [[partitions]]
            label = "class-a"
            cap = 60000

            [[partitions]]
            label = "class-b"
            "#
        ));
        let config = TokenConfig::load(file.path()).unwrap();
        let (engine, events) = engine_from(&config);

        let admin: Identity = ADMIN_HEX.parse().unwrap();
        let controller: Identity = CONTROLLER_HEX.parse().unwrap();
        let (a, b) = (
            PartitionId::from_label("class-a"),
            PartitionId::from_label("class-b"),
        );

        assert_eq!(engine.name(), "Acme Shares");
        assert_eq!(engine.symbol(), "ACS");
        assert_eq!(engine.decimals(), 0);
        assert_eq!(engine.granularity(), 10);
        assert_eq!(engine.cap(), 100_000);
        assert!(engine.has_role(Role::Admin, admin));
        assert!(engine.has_role(Role::Controller, controller));

        // class-b took the remaining budget
        let caps: Vec<_> = engine.partitions().iter().map(|p| (p.id, p.cap)).collect();
        assert_eq!(caps, vec![(a, 60_000), (b, 40_000)]);

        let genesis = events
            .events()
            .iter()
            .filter(|e| matches!(e, LedgerEvent::RoleGranted { granted_by: None, .. }))
            .count();
        assert_eq!(genesis, 2);

        engine.add_role(admin, Role::Issuer, admin).unwrap();
        engine.issue_by_partition(admin, a, admin, 1_000, &[]).unwrap();
        assert_eq!(
            engine.can_transfer_by_partition(admin, a, controller, 15, &[]).status,
            StatusCode::InvalidGranularity
        );
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = TokenConfig::load("/nonexistent/ledger.toml").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert_eq!(path, "/nonexistent/ledger.toml"),
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_without_admin_is_rejected() {
        let file = write_config("name = \"Orphan\"\n");
        assert!(matches!(
            TokenConfig::load(file.path()),
            Err(ConfigError::Invalid { field: "admins", .. })
        ));
    }

    #[test]
    fn test_operations_show_up_in_metrics() {
        register_metrics().unwrap();

        let admin: Identity = ADMIN_HEX.parse().unwrap();
        let config = TokenConfig {
            partitions: vec![token_engine::PartitionSeed {
                id: PartitionId::from_label("metered"),
                cap: Some(1_000),
            }],
            ..TokenConfig::with_admin(admin)
        };
        let (engine, _) = engine_from(&config);
        let p = PartitionId::from_label("metered");

        engine.add_role(admin, Role::Minter, admin).unwrap();
        engine.issue_by_partition(admin, p, admin, 100, &[]).unwrap();
        engine
            .transfer_by_partition(admin, p, Identity::new([7u8; 20]), 10, &[])
            .unwrap();
        let _ = engine.transfer_by_partition(admin, p, Identity::new([7u8; 20]), 10_000, &[]);

        let text = encode_metrics().unwrap();
        assert!(text.contains("ledger_operations_total"));
        assert!(text.contains("ledger_transfer_rejections_total"));
        assert!(text.contains("ledger_transfer_duration_seconds"));
        assert!(text.contains("ledger_total_supply"));
    }

    #[test]
    fn test_telemetry_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "token-ledger");
        assert_eq!(config.log_level, "info");
    }
}
