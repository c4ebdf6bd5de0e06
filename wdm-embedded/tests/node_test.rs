mod common;

use common::*;
use wdm_api::frame::{self, Inbound, Outbound};
use wdm_api::{DayMask, DeviceConfig, DeviceKind, ScheduleEntry};
use wdm_embedded::transport::PubSubBinding;
use wdm_embedded::{
    Clock, MemoryStore, Node, NodeConfig, PubSubConfig, SoftClock, config_key,
};

type TestNode = Node<SoftClock, MemoryStore, RecordingHal, PubSubBinding<MockBroker, CountingDelay>>;

const INBOUND: &str = "wdm/dev/sub/18fe34d44c01";
const OUTBOUND: &str = "wdm/dev/pub/18fe34d44c01";

fn node(kinds: &[DeviceKind]) -> TestNode {
    let config = PubSubConfig {
        security: "s3cret".to_string(),
        ..PubSubConfig::default()
    };
    let binding = PubSubBinding::new(MockBroker::default(), CountingDelay::default(), NODE, config);
    let mut node = Node::new(
        &NODE,
        NodeConfig::with_devices(kinds),
        SoftClock::new(),
        MemoryStore::new(),
        RecordingHal::default(),
        binding,
    );
    node.init();
    node
}

fn broker(node: &TestNode) -> &MockBroker {
    node.binding().transport()
}

fn deliver(node: &mut TestNode, frame: &Inbound) {
    let bytes = frame::encode_inbound(&NODE, frame).unwrap();
    node.binding_mut().transport_mut().deliver(INBOUND, bytes);
}

#[test]
fn test_first_tick_connects_and_reports() {
    let mut node = node(&[DeviceKind::OnOff, DeviceKind::Temperature]);
    node.tick();

    let broker = broker(&node);
    assert_eq!(broker.connects, 1);
    assert_eq!(broker.subscriptions, [INBOUND]);
    assert_eq!(broker.last_username, "wdm-user-18fe34d44c01");
    assert_eq!(broker.last_password, "s3cret");
    assert!(broker.published.iter().all(|(topic, _)| topic == OUTBOUND));

    let frames = broker.frames();
    assert_eq!(frames.len(), 2);
    assert!(matches!(&frames[0], Outbound::Status(report) if report.len() == 2));
    assert_eq!(frames[1], Outbound::TimeRequest { now: 0 });
}

#[test]
fn test_time_set_applies_timezone() {
    let mut node = node(&[DeviceKind::OnOff]);
    deliver(&mut node, &Inbound::TimeSet { utc: 1_700_000_000 });
    node.tick();

    assert_eq!(node.clock().now_unix(), 1_700_000_000 + 420 * 60);

    node.tick();
    assert_eq!(node.clock().now_unix(), 1_700_000_000 + 420 * 60 + 1);
}

#[test]
fn test_command_emits_one_status_per_change() {
    let mut node = node(&[DeviceKind::OnOff, DeviceKind::OnOff]);
    node.tick();
    let before = broker(&node).published.len();

    deliver(&mut node, &Inbound::Command { offset: 2, command: 1 });
    deliver(&mut node, &Inbound::Command { offset: 2, command: 1 });
    node.tick();

    let reports = broker(&node).status_frames();
    assert_eq!(broker(&node).published.len(), before + 1);
    let last = reports.last().unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last.records()[0].offset, 2);
    assert_eq!(last.records()[0].value, 1);
    assert_eq!(node.registry().hal().writes.last(), Some(&(2, DeviceKind::OnOff, 1)));
}

#[test]
fn test_malformed_input_is_ignored() {
    let mut node = node(&[DeviceKind::OnOff]);
    node.tick();
    let before = node.status();
    let published = broker(&node).published.len();

    deliver(&mut node, &Inbound::Command { offset: 0, command: 1 });
    deliver(&mut node, &Inbound::Command { offset: 9, command: 1 });
    let foreign = frame::encode_inbound(
        &wdm_api::NodeId([1, 2, 3, 4, 5, 6]),
        &Inbound::Command { offset: 1, command: 1 },
    )
    .unwrap();
    node.binding_mut().transport_mut().deliver(INBOUND, foreign);
    let mut bad_marker = frame::encode_inbound(&NODE, &Inbound::Command { offset: 1, command: 1 }).unwrap();
    bad_marker[0] = 0x7f;
    node.binding_mut().transport_mut().deliver(INBOUND, bad_marker);
    let wrong_topic = frame::encode_inbound(&NODE, &Inbound::Command { offset: 1, command: 1 }).unwrap();
    node.binding_mut().transport_mut().deliver("wdm/dev/sub/other", wrong_topic);
    node.binding_mut().transport_mut().deliver(INBOUND, vec![0x01, 0x64]);
    node.tick();

    assert_eq!(node.status(), before);
    assert_eq!(broker(&node).published.len(), published);
}

#[test]
fn test_config_frame_is_applied_and_persisted() {
    let mut node = node(&[DeviceKind::OnOff]);
    let mut config = DeviceConfig::default();
    config.enabled = false;
    config
        .schedules
        .update(ScheduleEntry::new(7, 1, DayMask::WEEKDAYS, 1200, 0));

    deliver(&mut node, &Inbound::Config { offset: 1, config: config.clone() });
    node.tick();

    let device = node.registry().device(1).unwrap();
    assert!(!device.config.enabled);
    assert_eq!(device.config.schedules.get(7).unwrap().time_of_day, 1200);
    assert!(node.registry().store().contains(&config_key(1)));
}

#[test]
fn test_schedule_fires_once_at_second_zero() {
    let mut node = node(&[DeviceKind::OnOff]);
    node.registry_mut().schedule_update(
        1,
        ScheduleEntry::new(1, 1, DayMask::MONDAY | DayMask::WEDNESDAY | DayMask::FRIDAY, 450, 1),
    );
    node.clock_mut().set_local_unix(WEDNESDAY_0729_58);

    node.tick();
    assert_eq!(node.registry().device(1).unwrap().value, 0);

    node.tick();
    assert_eq!(node.clock().minute_of_day(), 450);
    assert_eq!(node.clock().weekday(), 2);
    let relay = node.registry().device(1).unwrap();
    assert_eq!(relay.value, 1);
    assert_eq!(relay.last_change_time, WEDNESDAY_0729_58 + 2);

    let last = broker(&node).status_frames().pop().unwrap();
    assert_eq!(last.records()[0].change_time, WEDNESDAY_0729_58 + 2);

    node.control(1, 0);
    for _ in 0..30 {
        node.tick();
    }
    assert_eq!(node.registry().device(1).unwrap().value, 0);
}

#[test]
fn test_schedule_does_not_fire_on_other_days() {
    let mut node = node(&[DeviceKind::OnOff]);
    node.registry_mut()
        .schedule_update(1, ScheduleEntry::new(1, 1, DayMask::MONDAY | DayMask::FRIDAY, 450, 1));
    node.clock_mut().set_local_unix(WEDNESDAY_0729_58);

    for _ in 0..120 {
        node.tick();
    }
    assert_eq!(node.registry().device(1).unwrap().value, 0);
}

#[test]
fn test_heartbeat_republishes_full_status() {
    let mut node = node(&[DeviceKind::OnOff, DeviceKind::Humidity, DeviceKind::Smoke]);
    for _ in 0..120 {
        node.tick();
    }

    let full = broker(&node)
        .status_frames()
        .iter()
        .filter(|report| report.len() == 3)
        .count();
    // connect + two heartbeats
    assert_eq!(full, 3);
}

#[test]
fn test_reconnect_after_session_loss() {
    let mut node = node(&[DeviceKind::OnOff]);
    node.tick();

    {
        let broker = node.binding_mut().transport_mut();
        broker.connected = false;
        broker.refuse = true;
    }
    node.tick();
    assert_eq!(broker(&node).connects, 2);
    assert_eq!(node.binding().delay().total_ms, 1000);

    node.binding_mut().transport_mut().refuse = false;
    let published = broker(&node).published.len();
    node.tick();

    let broker = broker(&node);
    assert_eq!(broker.connects, 3);
    assert_eq!(broker.subscriptions.len(), 2);
    assert!(matches!(
        &broker.frames()[published],
        Outbound::Status(report) if report.len() == 1
    ));
}

#[test]
fn test_toggle_round_trip() {
    let mut node = node(&[DeviceKind::OnOff, DeviceKind::Temperature]);
    let original = node.registry().device(1).unwrap().value;

    assert_eq!(node.toggle(1), Ok(true));
    assert_eq!(node.toggle(1), Ok(true));
    assert_eq!(node.registry().device(1).unwrap().value, original);
    assert!(node.toggle(2).is_err());
    assert_eq!(node.count(), 2);
}

#[test]
fn test_resubscribes_after_failed_subscribe() {
    let mut node = node(&[DeviceKind::OnOff]);
    node.binding_mut().transport_mut().failing_subscribes = 1;
    node.tick();

    {
        let broker = broker(&node);
        assert_eq!(broker.connects, 1);
        assert!(broker.subscriptions.is_empty());
        assert!(broker.published.is_empty());
    }
    assert_eq!(node.binding().delay().total_ms, 1000);

    deliver(&mut node, &Inbound::Command { offset: 1, command: 1 });
    node.tick();

    let broker = broker(&node);
    // the existing session is reused, only the subscription is retried
    assert_eq!(broker.connects, 1);
    assert_eq!(broker.subscriptions, [INBOUND]);

    let frames = broker.frames();
    assert!(matches!(&frames[0], Outbound::Status(report) if report.len() == 1));
    assert_eq!(frames[1], Outbound::TimeRequest { now: 0 });
    assert_eq!(node.registry().device(1).unwrap().value, 1);
}
