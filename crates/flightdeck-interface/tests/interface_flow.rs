//! End-to-end behaviour of `ExportInterface` over an in-memory transport.

use std::time::{Duration, Instant};

use flightdeck_functions::functions::{
    FlagValueConfig, SwitchConfig, SwitchPosition, TextConfig,
};
use flightdeck_functions::{
    ActionOutcome, BindingAddress, BindingEvent, BindingValue, ChangeOrigin, DataElement,
    FunctionConfig, FunctionIdentity, FunctionRegistry,
};
use flightdeck_interface::{
    ExportInterface, InterfaceConfig, InterfaceEvent, ManualScheduler, MemoryTransport,
    RequestKind, RetryState, TickOutcome, encode_alert,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn registry() -> Result<FunctionRegistry, Box<dyn std::error::Error>> {
    Ok(FunctionRegistry::from_configs(vec![
        FunctionConfig::Switch(SwitchConfig {
            identity: FunctionIdentity::new("Electrical", "Main Power"),
            device_id: "3".to_string(),
            element: DataElement::new("404").with_format("%0.1f"),
            action_id: Some("3001".to_string()),
            positions: vec![
                SwitchPosition::new("1.0", "On"),
                SwitchPosition::new("0.0", "Off"),
                SwitchPosition::new("-1.0", "Reset"),
            ],
            pulse: None,
        }),
        FunctionConfig::Flag(FlagValueConfig {
            identity: FunctionIdentity::new("Caution", "Master Caution"),
            element: DataElement::new("13").with_format("%d"),
        }),
        FunctionConfig::Text(TextConfig {
            identity: FunctionIdentity::new("UFC", "Scratchpad"),
            element: DataElement::new("2095").with_format("%s"),
        }),
    ])?)
}

struct Rig {
    interface: ExportInterface<MemoryTransport>,
    transport: MemoryTransport,
    scheduler: ManualScheduler,
    start: Instant,
}

fn rig(config: InterfaceConfig) -> Result<Rig, Box<dyn std::error::Error>> {
    let transport = MemoryTransport::new(true);
    let scheduler = ManualScheduler::new();
    let interface = ExportInterface::new(
        config,
        registry()?,
        transport.clone(),
        Box::new(scheduler.clone()),
    )?;
    Ok(Rig {
        interface,
        transport,
        scheduler,
        start: Instant::now(),
    })
}

fn value_of(interface: &ExportInterface<MemoryTransport>, address: &str) -> Option<BindingValue> {
    interface
        .values()
        .into_iter()
        .find(|snapshot| snapshot.descriptor.address.to_string() == address)
        .map(|snapshot| snapshot.value)
}

#[test]
fn test_switch_example_set_then_decode() -> TestResult {
    let mut rig = rig(InterfaceConfig::builder().request_module_on_start(false).build()?)?;

    let address: BindingAddress = "Electrical.Main Power.set".parse()?;
    let report = rig.interface.execute_action(&address, &BindingValue::Double(2.0))?;
    assert_eq!(report.outcome, ActionOutcome::Executed);
    assert_eq!(report.sent, vec!["C3,3001,0.0\n".to_string()]);
    assert_eq!(
        value_of(&rig.interface, "Electrical.Main Power"),
        Some(BindingValue::Double(2.0))
    );

    rig.transport.take();
    let events = rig.interface.receive_datagram(b"hdr:404=-1.0", None, rig.start);
    assert!(rig.transport.sent().is_empty());
    assert!(events.iter().any(|event| matches!(
        event,
        InterfaceEvent::Binding(BindingEvent::ValueChanged {
            value: BindingValue::Double(v),
            origin: ChangeOrigin::Network,
            ..
        }) if *v == 3.0
    )));
    Ok(())
}

#[test]
fn test_bad_parameter_is_ignored_without_sending() -> TestResult {
    let mut rig = rig(InterfaceConfig::default())?;
    rig.transport.take();
    let address: BindingAddress = "Electrical.Main Power.set".parse()?;
    let report = rig.interface.execute_action(&address, &BindingValue::Double(9.0))?;
    assert!(matches!(report.outcome, ActionOutcome::Ignored(_)));
    assert!(report.sent.is_empty());
    assert!(rig.transport.sent().is_empty());

    let unknown: BindingAddress = "Electrical.Generator.set".parse()?;
    assert!(rig.interface.execute_action(&unknown, &BindingValue::Empty).is_err());
    Ok(())
}

#[test]
fn test_commands_are_dropped_while_not_ready() -> TestResult {
    let mut rig = rig(InterfaceConfig::default())?;
    rig.transport.set_ready(false);
    let address: BindingAddress = "Electrical.Main Power.set".parse()?;
    let report = rig.interface.execute_action(&address, &"On".into())?;
    assert!(report.outcome.is_executed());
    assert_eq!(report.dropped, 1);
    assert!(report.sent.is_empty());
    Ok(())
}

#[test]
fn test_driver_handshake_and_sync() -> TestResult {
    let mut rig = rig(
        InterfaceConfig::builder()
            .expected_driver("F-16C")
            .retry_limit(3)
            .build()?,
    )?;
    rig.interface.start();
    assert_eq!(rig.transport.take(), vec!["DF-16C\n".to_string(), "M\n".to_string()]);
    assert!(rig.scheduler.is_armed(RequestKind::Driver));

    assert_eq!(rig.interface.retry_tick(RequestKind::Driver), TickOutcome::Resent);
    assert_eq!(rig.transport.take(), vec!["DF-16C\n".to_string()]);

    let events = rig.interface.receive_datagram(
        b"hdr:ACTIVE_DRIVER=A-10C:ACTIVE_VEHICLE=A-10C_2",
        None,
        rig.start,
    );
    assert!(events.contains(&InterfaceEvent::Connected));
    assert!(events.contains(&InterfaceEvent::DriverChanged("A-10C".to_string())));
    assert!(!rig.interface.is_synchronized());
    assert_eq!(rig.interface.status().module_request, RetryState::Idle);
    assert_eq!(rig.interface.status().driver_request, RetryState::Retrying);

    let events = rig
        .interface
        .receive_datagram(b"hdr:ACTIVE_DRIVER=F-16C", None, rig.start);
    assert!(events.contains(&InterfaceEvent::SynchronizedChanged(true)));
    assert!(rig.interface.is_synchronized());
    assert!(!rig.scheduler.is_armed(RequestKind::Driver));
    assert_eq!(rig.interface.status().driver_request, RetryState::Idle);
    Ok(())
}

#[test]
fn test_driver_switch_away_triggers_new_request() -> TestResult {
    let mut rig = rig(
        InterfaceConfig::builder()
            .expected_driver("F-16C")
            .request_module_on_start(false)
            .build()?,
    )?;
    rig.interface.start();
    rig.interface
        .receive_datagram(b"hdr:ACTIVE_DRIVER=F-16C", None, rig.start);
    rig.transport.take();

    let events = rig
        .interface
        .receive_datagram(b"hdr:ACTIVE_DRIVER=FA-18C", None, rig.start);
    assert!(events.contains(&InterfaceEvent::SynchronizedChanged(false)));
    assert_eq!(rig.transport.take(), vec!["DF-16C\n".to_string()]);
    assert!(rig.scheduler.is_armed(RequestKind::Driver));
    Ok(())
}

#[test]
fn test_disconnect_resets_every_function() -> TestResult {
    let mut rig = rig(
        InterfaceConfig::builder()
            .heartbeat_timeout_ms(200)
            .request_module_on_start(false)
            .build()?,
    )?;
    rig.interface.receive_datagram(
        b"hdr:ACTIVE_DRIVER=F-16C:404=1.0:13=1:2095=CH 7::GUARD",
        None,
        rig.start,
    );
    assert_eq!(value_of(&rig.interface, "Caution.Master Caution"), Some(true.into()));
    assert_eq!(
        value_of(&rig.interface, "UFC.Scratchpad"),
        Some(BindingValue::Text("CH 7\nGUARD".to_string()))
    );

    let quiet = rig.interface.check_connection(rig.start + Duration::from_millis(150));
    assert!(quiet.is_empty());

    let events = rig.interface.check_connection(rig.start + Duration::from_millis(300));
    assert_eq!(events.first(), Some(&InterfaceEvent::Disconnected));
    assert!(events.contains(&InterfaceEvent::SynchronizedChanged(false)));
    assert!(rig.interface.values().iter().all(|s| s.value.is_empty()));

    // A second timeout check changes nothing.
    assert!(rig
        .interface
        .check_connection(rig.start + Duration::from_secs(5))
        .is_empty());
    Ok(())
}

#[test]
fn test_reconnect_restarts_unacknowledged_requests() -> TestResult {
    let mut rig = rig(
        InterfaceConfig::builder()
            .expected_driver("F-16C")
            .retry_limit(1)
            .heartbeat_timeout_ms(100)
            .request_module_on_start(false)
            .build()?,
    )?;
    rig.interface.start();
    assert_eq!(rig.interface.retry_tick(RequestKind::Driver), TickOutcome::Resent);
    assert_eq!(rig.interface.retry_tick(RequestKind::Driver), TickOutcome::GaveUp);
    assert!(!rig.scheduler.is_armed(RequestKind::Driver));

    let events = rig.interface.receive_datagram(b"hdr:ALIVE=1", None, rig.start);
    assert!(events.contains(&InterfaceEvent::Connected));
    assert!(rig.scheduler.is_armed(RequestKind::Driver));
    assert_eq!(rig.interface.status().driver_request, RetryState::Retrying);
    Ok(())
}

#[test]
fn test_alert_message_is_decoded() -> TestResult {
    let mut rig = rig(InterfaceConfig::default())?;
    let packet = format!("hdr:ALERT_MESSAGE={}", encode_alert("module F-16C: bad argument"));
    let events = rig
        .interface
        .receive_datagram(packet.as_bytes(), None, rig.start);
    assert!(events.contains(&InterfaceEvent::Alert("module F-16C: bad argument".to_string())));
    Ok(())
}

#[test]
fn test_malformed_scalar_keeps_prior_value() -> TestResult {
    let mut rig = rig(InterfaceConfig::default())?;
    rig.interface.receive_datagram(b"hdr:13=1.0", None, rig.start);
    let events = rig.interface.receive_datagram(b"hdr:13=abc", None, rig.start);
    assert!(events.is_empty());
    assert_eq!(value_of(&rig.interface, "Caution.Master Caution"), Some(true.into()));
    Ok(())
}
