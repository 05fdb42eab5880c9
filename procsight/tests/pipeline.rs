//! End-to-end sampling against a fake proc tree.

use std::path::Path;
use std::time::Duration;

use procsight::config::MonitorConfig;
use procsight::render::{Frame, JsonRenderer, Renderer};
use procsight::sink::RecordingSink;
use procsight::{Reading, SamplingScheduler, SchedulerState, SourceRegistry};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn fake_proc() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "uptime", "90061.50 170000.00\n");
    write(root, "loadavg", "0.25 0.50 0.75 3/412 9001\n");
    write(
        root,
        "stat",
        "cpu  1000 0 1000 8000 0 0 0 0 0 0\ncpu0 500 0 500 4000 0 0 0 0 0 0\nintr 0\n",
    );
    write(
        root,
        "meminfo",
        "MemTotal:       16384000 kB\nMemFree:         2048000 kB\nMemAvailable:    8192000 kB\nBuffers:          512000 kB\nCached:          4096000 kB\nSwapTotal:             0 kB\n",
    );
    write(
        root,
        "diskstats",
        "   8       0 sda 100 0 800 0 50 0 400 0 0 0 0\n   8       1 sda1 90 0 700 0 40 0 300 0 0 0 0\n",
    );
    write(
        root,
        "net/dev",
        "Inter-| Receive | Transmit\n face |bytes packets|bytes packets\n    lo: 10 1 0 0 0 0 0 0 10 1 0 0 0 0 0 0\n  eth0: 123 4 0 0 0 0 0 0 456 7 0 0 0 0 0 0\n",
    );
    write(
        root,
        "1/stat",
        "1 (systemd) S 0 1 1 0 -1 4194560 0 0 0 0 0 0 0 0 20 0 1 0 1 170000000 3000 0\n",
    );
    write(
        root,
        "2/stat",
        "2 (Web Content) R 1 2 2 0 -1 4194560 0 0 0 0 0 0 0 0 20 0 1 0 1 900000000 50000 0\n",
    );

    dir
}

fn registry_for(root: &Path) -> SourceRegistry {
    let config = MonitorConfig {
        proc_root: root.to_path_buf(),
        ..Default::default()
    };
    SourceRegistry::from_config(&config)
}

fn reading<'a>(readings: &'a [Reading], source: &str) -> &'a Reading {
    readings
        .iter()
        .find(|r| {
            let tag = serde_json::to_value(r).unwrap()["source"].clone();
            tag == source
        })
        .unwrap()
}

#[test]
fn test_full_tick_over_fake_proc() {
    let proc = fake_proc();
    let mut scheduler = SamplingScheduler::new(registry_for(proc.path()), RecordingSink::default());

    let summary = scheduler.tick();
    assert_eq!(summary.failed_sources, 0);
    assert_eq!(summary.skipped_records, 0);
    assert!(scheduler.sink().failures().is_empty());

    let readings = scheduler.registry().readings();
    assert_eq!(readings.len(), 6);

    match reading(&readings, "system") {
        Reading::System(r) => {
            assert_eq!(r.uptime_secs, 90061.5);
            assert_eq!(r.total_tasks, 412);
        }
        other => panic!("unexpected reading {:?}", other),
    }
    match reading(&readings, "cpu") {
        Reading::Cpu(r) => assert_eq!(r.usage_percent, None),
        other => panic!("unexpected reading {:?}", other),
    }
    match reading(&readings, "memory") {
        Reading::Memory(r) => {
            assert_eq!(r.used_kb, 8192000);
            assert_eq!(r.usage_percent, 50.0);
        }
        other => panic!("unexpected reading {:?}", other),
    }
    match reading(&readings, "disk") {
        Reading::Disk(r) => {
            assert_eq!(r.devices.len(), 1);
            assert_eq!(r.devices[0].name, "sda");
        }
        other => panic!("unexpected reading {:?}", other),
    }
    match reading(&readings, "network") {
        Reading::Network(r) => assert_eq!(r.interfaces.len(), 2),
        other => panic!("unexpected reading {:?}", other),
    }
    match reading(&readings, "process") {
        Reading::Process(r) => {
            assert_eq!(r.total, 2);
            assert_eq!(r.running, 1);
            assert_eq!(r.processes[0].name, "Web Content");
        }
        other => panic!("unexpected reading {:?}", other),
    }
}

#[test]
fn test_cpu_usage_appears_on_second_tick() {
    let proc = fake_proc();
    let mut scheduler = SamplingScheduler::new(registry_for(proc.path()), RecordingSink::default());
    scheduler.tick();

    // 200 jiffies elapse, 50 of them busy.
    write(proc.path(), "stat", "cpu  1025 0 1025 8150 0 0 0 0 0 0\n");
    scheduler.tick();

    match reading(&scheduler.registry().readings(), "cpu") {
        Reading::Cpu(r) => assert_eq!(r.usage_percent, Some(25.0)),
        other => panic!("unexpected reading {:?}", other),
    }
}

#[test]
fn test_missing_file_only_stales_its_source() {
    let proc = fake_proc();
    let mut scheduler = SamplingScheduler::new(registry_for(proc.path()), RecordingSink::default());
    scheduler.tick();

    std::fs::remove_file(proc.path().join("meminfo")).unwrap();
    write(proc.path(), "loadavg", "1.00 2.00 3.00 5/500 9002\n");
    let summary = scheduler.tick();

    assert_eq!(summary.failed_sources, 1);
    let failures = scheduler.sink().failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("memory: "));

    let readings = scheduler.registry().readings();
    match reading(&readings, "memory") {
        Reading::Memory(r) => assert_eq!(r.total_kb, 16384000),
        other => panic!("unexpected reading {:?}", other),
    }
    match reading(&readings, "system") {
        Reading::System(r) => assert_eq!(r.total_tasks, 500),
        other => panic!("unexpected reading {:?}", other),
    }
}

#[test]
fn test_json_output_follows_registration_order() {
    let proc = fake_proc();
    let mut scheduler = SamplingScheduler::new(registry_for(proc.path()), RecordingSink::default());
    let mut renderer = JsonRenderer::new(Vec::new(), "fixture");

    let summary = scheduler.tick();
    let frame = Frame {
        summary: &summary,
        registry: scheduler.registry(),
        statuses: scheduler.statuses(),
    };
    renderer.render(&frame).unwrap();

    let output = String::from_utf8(renderer.into_inner()).unwrap();
    let record: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    let sources: Vec<&str> = record["readings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["source"].as_str().unwrap())
        .collect();

    assert_eq!(
        sources,
        vec!["system", "cpu", "memory", "disk", "network", "process"]
    );
    assert_eq!(record["host"], "fixture");
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_runs_until_shutdown() {
    let proc = fake_proc();
    let mut scheduler = SamplingScheduler::new(registry_for(proc.path()), RecordingSink::default());
    let mut renderer = JsonRenderer::new(Vec::new(), "fixture");

    scheduler
        .run_until(&mut renderer, tokio::time::sleep(Duration::from_millis(4500)))
        .await;

    assert_eq!(scheduler.state(), SchedulerState::Running { ticks: 5 });
    assert_eq!(scheduler.sink().ticks().len(), 5);

    let output = String::from_utf8(renderer.into_inner()).unwrap();
    assert_eq!(output.lines().count(), 5);
}
