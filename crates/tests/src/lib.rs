//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - Mock 相机 + HeadlessSurface 的端到端会话（无需硬件）

#[cfg(test)]
mod contract_tests {
    use contracts::{UiEvent, CameraSide};

    #[test]
    fn test_ui_event_wire_format() {
        // 事件按 "event" 字段打标签，脚本与 GUI 共用同一格式
        let event: UiEvent = config_loader::ConfigLoader::parse_document(
            r#"{"event": "find_and_init", "side": "secondary", "config_ref": "18285622"}"#,
            config_loader::ConfigFormat::Json,
        )
        .unwrap();
        assert_eq!(
            event,
            UiEvent::FindAndInit {
                side: CameraSide::Secondary,
                config_ref: "18285622".into(),
            }
        );

        let unknown: Result<UiEvent, _> = config_loader::ConfigLoader::parse_document(
            r#"{"event": "reboot_cameras"}"#,
            config_loader::ConfigFormat::Json,
        );
        assert!(unknown.is_err());
    }

    #[test]
    fn test_default_blueprint_round_trips_through_loader() {
        let blueprint = contracts::PanelBlueprint::default();
        let toml = config_loader::ConfigLoader::to_toml(&blueprint).unwrap();
        let loaded =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(
            loaded.cameras.secondary.mock.serial,
            blueprint.cameras.secondary.mock.serial
        );
        assert_eq!(loaded.capture.name_format, blueprint.capture.name_format);
    }

    #[test]
    fn test_event_labels_are_unique() {
        let events = [
            UiEvent::FindAndInit {
                side: CameraSide::Primary,
                config_ref: String::new(),
            },
            UiEvent::StartStream,
            UiEvent::StopStream,
            UiEvent::SaveImages,
        ];
        let mut labels: Vec<_> = events.iter().map(UiEvent::label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), events.len());
    }
}

#[cfg(test)]
mod e2e_tests {
    use camera_backend::{CallLog, MockCamera, MockOp};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        CameraParameter, CameraSide, CaptureField, ControlSurface, PanelBlueprint, SinkKind,
        StreamFailurePolicy, UiEvent, WidgetId, WidgetValue,
    };
    use panel_core::{
        FailureDisposition, HeadlessSurface, PanelContext, PanelError, Scheduler, StreamState,
    };
    use persistence::{create_sink, LogSink};

    fn small_blueprint() -> PanelBlueprint {
        let mut blueprint = PanelBlueprint::default();
        for camera in [
            &mut blueprint.cameras.primary,
            &mut blueprint.cameras.secondary,
        ] {
            camera.mock.width = 32;
            camera.mock.height = 16;
            camera.mock.bits_per_pixel = 10;
        }
        blueprint
    }

    fn log_context(blueprint: PanelBlueprint) -> (PanelContext<MockCamera>, CallLog) {
        let log = CallLog::new();
        let ctx = PanelContext::with_mock_cameras(blueprint, &log, Box::new(LogSink::new("log")));
        (ctx, log)
    }

    fn init_both(ctx: &mut PanelContext<MockCamera>) {
        for side in CameraSide::BOTH {
            let config_ref = ctx.blueprint.camera(side).config_ref.clone();
            ctx.submit_event(UiEvent::FindAndInit { side, config_ref });
        }
    }

    fn tick_n(
        scheduler: &Scheduler,
        ctx: &mut PanelContext<MockCamera>,
        surface: &mut HeadlessSurface,
        n: usize,
    ) {
        for _ in 0..n {
            scheduler.tick(ctx, surface).unwrap();
        }
    }

    /// start, 3 pairs, save 2: 4 PNG files, counter 1 -> 3
    #[test]
    fn test_e2e_capture_to_png() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = small_blueprint();
        let sink = create_sink(SinkKind::Png, dir.path()).unwrap();
        let log = CallLog::new();
        let mut ctx = PanelContext::with_mock_cameras(blueprint, &log, sink);
        let mut surface = HeadlessSurface::new();
        let scheduler = Scheduler::new(&ctx.blueprint.scheduler);

        init_both(&mut ctx);
        ctx.submit_event(UiEvent::CaptureFieldSubmitted {
            field: CaptureField::Count,
            text: "2".into(),
        });
        ctx.submit_event(UiEvent::StartStream);
        tick_n(&scheduler, &mut ctx, &mut surface, 4);
        assert_eq!(ctx.metrics.complete_pairs, 3);

        ctx.submit_event(UiEvent::SaveImages);
        tick_n(&scheduler, &mut ctx, &mut surface, 1);

        let mut files: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files.len(), 4, "{files:?}");
        assert!(files.iter().all(|f| f.ends_with(".png")));
        assert_eq!(files.iter().filter(|f| f.starts_with("18285621_")).count(), 2);
        assert!(files.iter().any(|f| f.ends_with("_1_L.png")));
        assert!(files.iter().any(|f| f.ends_with("_2_R.png")));
        assert!(files.iter().all(|f| !f.contains(' ')));

        assert_eq!(ctx.capture.counter, "3");
        assert_eq!(
            surface.widget(WidgetId::Capture(CaptureField::Counter)),
            Some(&WidgetValue::Text("3".into()))
        );
        assert_eq!(ctx.metrics.images_saved, 4);
        assert!(surface.reported_errors().is_empty());
    }

    #[test]
    fn test_e2e_save_before_start_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sink = create_sink(SinkKind::Png, dir.path()).unwrap();
        let log = CallLog::new();
        let mut ctx = PanelContext::with_mock_cameras(small_blueprint(), &log, sink);
        let mut surface = HeadlessSurface::new();
        let scheduler = Scheduler::default();

        init_both(&mut ctx);
        ctx.submit_event(UiEvent::SaveImages);
        tick_n(&scheduler, &mut ctx, &mut surface, 1);

        assert_eq!(surface.reported_errors().len(), 1);
        assert!(surface.reported_errors()[0].contains("start acquisition"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(ctx.capture.counter, "1");
        assert_eq!(log.count("primary", MockOp::GetFrame), 0);
    }

    /// same failure: swallowed when a stop is drained in the same tick, escalated otherwise
    #[test]
    fn test_e2e_stream_failure_swallow_vs_escalate() {
        let scheduler = Scheduler::default();

        let (mut stopped, _log) = log_context(small_blueprint());
        let mut surface = HeadlessSurface::new();
        init_both(&mut stopped);
        stopped.submit_event(UiEvent::StartStream);
        tick_n(&scheduler, &mut stopped, &mut surface, 2);
        stopped
            .sequencer
            .rig()
            .camera(CameraSide::Primary)
            .handle()
            .fail_next(MockOp::GetFrame);
        stopped.submit_event(UiEvent::StopStream);
        let report = scheduler.tick(&mut stopped, &mut surface).unwrap();
        assert_eq!(report.stream_failure, Some(FailureDisposition::Swallowed));
        assert!(surface.reported_errors().is_empty());

        let (mut running, _log) = log_context(small_blueprint());
        let mut surface = HeadlessSurface::new();
        init_both(&mut running);
        running.submit_event(UiEvent::StartStream);
        tick_n(&scheduler, &mut running, &mut surface, 2);
        running
            .sequencer
            .rig()
            .camera(CameraSide::Primary)
            .handle()
            .fail_next(MockOp::GetFrame);
        let err = scheduler.tick(&mut running, &mut surface).unwrap_err();
        assert!(matches!(err, PanelError::StreamStep { .. }));
    }

    #[test]
    fn test_e2e_report_policy_from_config() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[scheduler]
stream_failure = "report"

[cameras.primary]
config_ref = "primary.toml"

[cameras.primary.mock]
serial = "100"
width = 8
height = 8
incomplete_every = 4
"#,
            ConfigFormat::Toml,
        )
        .unwrap();
        let (mut ctx, _log) = log_context(blueprint);
        let mut surface = HeadlessSurface::new();
        let scheduler = Scheduler::new(&ctx.blueprint.scheduler);
        assert_eq!(scheduler.policy(), StreamFailurePolicy::Report);

        init_both(&mut ctx);
        ctx.submit_event(UiEvent::StartStream);
        tick_n(&scheduler, &mut ctx, &mut surface, 9);
        // every 4th primary frame is incomplete: 8 pairs, 2 dropped
        assert_eq!(ctx.metrics.complete_pairs, 6);
        assert_eq!(ctx.metrics.incomplete_pairs, 2);

        ctx.sequencer
            .rig()
            .camera(CameraSide::Secondary)
            .handle()
            .fail_times(MockOp::GetFrame, 2);
        let report = scheduler.tick(&mut ctx, &mut surface).unwrap();
        assert_eq!(report.stream_failure, Some(FailureDisposition::Reported));
        tick_n(&scheduler, &mut ctx, &mut surface, 2);
        assert_eq!(surface.reported_errors().len(), 2);
        assert_eq!(ctx.stream_state(), StreamState::Running);
    }

    #[test]
    fn test_e2e_camera_call_ordering() {
        let (mut ctx, log) = log_context(small_blueprint());
        let mut surface = HeadlessSurface::new();
        let scheduler = Scheduler::default();
        init_both(&mut ctx);
        tick_n(&scheduler, &mut ctx, &mut surface, 1);
        log.clear();

        ctx.submit_event(UiEvent::StartStream);
        tick_n(&scheduler, &mut ctx, &mut surface, 3);

        let p = |op| ("primary".to_string(), op);
        let s = |op| ("secondary".to_string(), op);
        assert_eq!(
            log.sequence_of(&[MockOp::StartAcquisition, MockOp::GetFrame]),
            vec![
                s(MockOp::StartAcquisition),
                p(MockOp::StartAcquisition),
                p(MockOp::GetFrame),
                s(MockOp::GetFrame),
                p(MockOp::GetFrame),
                s(MockOp::GetFrame),
            ]
        );
    }

    #[test]
    fn test_e2e_parameter_sync() {
        let (mut ctx, _log) = log_context(small_blueprint());
        let mut surface = HeadlessSurface::new();
        let scheduler = Scheduler::default();
        init_both(&mut ctx);
        surface.push_event(UiEvent::SliderChanged {
            parameter: CameraParameter::Exposure,
            value: 12000.0,
        });
        surface.push_event(UiEvent::TextSubmitted {
            parameter: CameraParameter::Fps,
            text: "abc".into(),
        });
        // tick 1 drains init and polls the surface, tick 2 runs the parameter events
        tick_n(&scheduler, &mut ctx, &mut surface, 3);

        assert_eq!(
            surface.widget(WidgetId::Text(CameraParameter::Exposure)),
            Some(&WidgetValue::Text("12000".into()))
        );
        assert!(ctx.params.pair(CameraParameter::Exposure).is_settled());
        assert!(surface.pending_events().is_empty());
        assert!(ctx.queue.is_empty());
        for side in CameraSide::BOTH {
            assert_eq!(
                ctx.sequencer
                    .rig()
                    .camera(side)
                    .handle()
                    .node_value("ExposureTime"),
                Some(contracts::NodeValue::Float(12000.0))
            );
        }
        // bad text reported, slider untouched
        assert_eq!(surface.reported_errors().len(), 1);
        assert_eq!(ctx.params.pair(CameraParameter::Fps).last_sent, None);
    }

    #[test]
    fn test_e2e_render_cache_reuse() {
        let (mut ctx, _log) = log_context(small_blueprint());
        let mut surface = HeadlessSurface::new();
        let scheduler = Scheduler::default();
        init_both(&mut ctx);
        ctx.submit_event(UiEvent::StartStream);
        tick_n(&scheduler, &mut ctx, &mut surface, 11);

        let stats = ctx.render.stats();
        assert_eq!(stats.image_recreations, 2);
        assert_eq!(stats.image_updates, 18);
        assert_eq!(stats.histogram_recreations, 2);
        assert_eq!(stats.histogram_updates, 18);
        for side in CameraSide::BOTH {
            let display = surface.display_state(contracts::DisplayTarget::image(side));
            assert_eq!(display.image_count(), 1);
        }
    }

    #[test]
    fn test_e2e_init_script_and_rearm_capture() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("secondary.toml");
        std::fs::write(
            &script,
            r#"
[[commands]]
node = "TriggerSource"
value = "Line3"

[[commands]]
node = "TriggerMode"
value = "On"
"#,
        )
        .unwrap();

        let mut blueprint = small_blueprint();
        blueprint.cameras.secondary.init_script = Some(script);
        blueprint.capture.strategy = contracts::CaptureStrategy::Rearm;
        blueprint.capture.count = 3;
        let (mut ctx, log) = log_context(blueprint);
        let mut surface = HeadlessSurface::new();
        let scheduler = Scheduler::default();

        init_both(&mut ctx);
        ctx.submit_event(UiEvent::StartStream);
        tick_n(&scheduler, &mut ctx, &mut surface, 2);
        let secondary = ctx.sequencer.rig().camera(CameraSide::Secondary).handle();
        assert_eq!(
            secondary.node_value("TriggerSource"),
            Some(contracts::NodeValue::enum_entry("Line3"))
        );

        ctx.submit_event(UiEvent::SaveImages);
        tick_n(&scheduler, &mut ctx, &mut surface, 2);
        assert!(surface.reported_errors().is_empty());
        assert_eq!(ctx.metrics.images_saved, 6);
        assert_eq!(ctx.capture.counter, "4");
        assert_eq!(ctx.stream_state(), StreamState::Running);
        // 1 start + 3 single-frame cycles + 1 resume
        assert_eq!(log.count("primary", MockOp::StartAcquisition), 5);
        assert!(secondary.is_acquiring());
    }

    #[tokio::test]
    async fn test_e2e_scheduler_run_and_cleanup() {
        let (mut ctx, log) = log_context(small_blueprint());
        let mut surface = HeadlessSurface::new();
        init_both(&mut ctx);
        ctx.submit_event(UiEvent::StartStream);
        surface.close_after(6);

        let ticks = Scheduler::default()
            .run(&mut ctx, &mut surface)
            .await
            .unwrap();
        assert_eq!(ticks, 6);
        assert!(!surface.is_open());
        assert_eq!(ctx.metrics.complete_pairs, 5);
        assert_eq!(ctx.stream_state(), StreamState::Stopped);
        for camera in ["primary", "secondary"] {
            assert_eq!(log.count(camera, MockOp::EndAcquisition), 1);
            assert_eq!(log.count(camera, MockOp::Deinit), 1);
        }
    }
}
