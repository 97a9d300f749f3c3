// Host command routing through the controller: ASCII dispatch, status
// reporting, and the panel button path.
mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use eslm_rs::io::Edge;
use eslm_rs::router::{self, Command, OperatingMode};
use eslm_rs::transport::Adu;

use common::{control_word_writes, harness, script_clean_status, script_enable, status_reply, write_echo};

#[tokio::test(start_paused = true)]
async fn version_line_is_reported() {
    let mut h = harness();
    h.controller.execute(router::parse("VERSION")).await;
    let lines = h.host.lines_out();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("magx-eslm-"));
}

#[tokio::test(start_paused = true)]
async fn unrecognized_line_answers_unknown_command() {
    let mut h = harness();
    script_clean_status(&h);
    h.host.push_line("HELLO");
    h.controller.cycle().await;
    assert_eq!(h.host.lines_out(), vec!["Unknown Command".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn current_gain_line_runs_the_set_sequence_end_to_end() {
    let mut h = harness();
    script_clean_status(&h);
    h.host.push_line("CURRENT_X:55");
    h.x.queue_response(write_echo(0xF002, 0x0006));
    h.x.queue_response(Adu::new(1, 0x10, vec![0x00, 0x18, 0x00, 0x02]));
    h.x.queue_response(write_echo(0x6000, 0x0001));
    h.x.queue_response(Adu::new(1, 0x03, vec![0x02, 0x00, 0x00]));
    script_enable(&h.x);

    h.controller.cycle().await;

    // disable, then the enable tail; the gain itself went out as FC 0x10.
    assert_eq!(
        control_word_writes(&h.x),
        vec![0x0006, 0x0006, 0x0080, 0x0006, 0x000F]
    );
    let gain_write = h
        .x
        .sent()
        .into_iter()
        .find(|adu| adu.function == 0x10)
        .unwrap();
    assert_eq!(
        gain_write.data,
        vec![0x00, 0x18, 0x00, 0x02, 0x04, 0x00, 0x00, 0x00, 0x37]
    );
    // The untouched axis only saw its status poll.
    assert_eq!(h.y.sent().len(), 1);
    // Both links are purged after dispatch.
    assert!(h.x.purge_count() >= 1);
    assert!(h.y.purge_count() >= 1);
}

#[tokio::test(start_paused = true)]
async fn malformed_set_value_parses_as_zero() {
    assert_eq!(
        router::parse("CURRENT_X:abc"),
        Command::SetCurrentGain(eslm_rs::motor::Axis::X, 0)
    );
}

#[tokio::test(start_paused = true)]
async fn getter_reports_value_or_comm_error() {
    let mut h = harness();
    h.y
        .queue_response(Adu::new(1, 0x03, vec![0x04, 0x00, 0x00, 0x00, 0x64]));
    h.controller.execute(router::parse("GET_CURRENT_Y")).await;
    // Second read times out (empty script).
    h.controller.execute(router::parse("GET_INERDIA_Y")).await;
    assert_eq!(
        h.host.lines_out(),
        vec!["100".to_string(), "Communication Error".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn raw_passthrough_echoes_the_response_payload() {
    let mut h = harness();
    h.x
        .queue_response(Adu::new(1, 0x03, vec![0x02, 0x00, 0x2A]));
    h.controller.execute(router::parse("##1,3,240,16,0,1")).await;
    assert_eq!(
        h.host.lines_out(),
        vec!["X axis value: 0x02,0x00,0x2A".to_string()]
    );
    assert_eq!(h.x.sent()[0].function, 0x03);

    h.controller.execute(router::parse("@@1,3,240,16,0,1")).await;
    assert_eq!(
        h.host.lines_out()[1],
        "Y axis error: Communication Error".to_string()
    );
}

#[tokio::test(start_paused = true)]
async fn enable_keyword_sequences_both_axes() {
    let mut h = harness();
    script_clean_status(&h);
    script_enable(&h.x);
    script_enable(&h.y);
    h.host.push_line("ENABLE");
    h.controller.cycle().await;
    assert_eq!(
        control_word_writes(&h.x),
        vec![0x0006, 0x0080, 0x0006, 0x000F]
    );
    assert_eq!(
        control_word_writes(&h.y),
        vec![0x0006, 0x0080, 0x0006, 0x000F]
    );
}

#[tokio::test(start_paused = true)]
async fn gateway_mode_stops_ascii_routing() {
    let mut h = harness();
    h.controller.execute(router::parse("RTU_GATEWAY")).await;
    assert_eq!(h.controller.mode(), OperatingMode::RtuGateway);

    script_clean_status(&h);
    h.host.push_line("VERSION");
    h.controller.cycle().await;
    // The line stays queued; nothing was answered.
    assert!(h.host.lines_out().is_empty());
}

#[tokio::test(start_paused = true)]
async fn comm_failure_reports_and_asserts_estop() {
    let mut h = harness();
    // X axis link dead, Y healthy.
    h.y.queue_response(status_reply(0));
    h.controller.cycle().await;
    assert_eq!(
        h.host.lines_out(),
        vec!["X axis error: Communication Error".to_string()]
    );
    assert!(h.controller.x_led().is_red());
    assert!(h.controller.y_led().is_green());
    assert!(h.estop.load(Ordering::Relaxed));

    // Recovery clears the LED and releases the e-stop.
    script_clean_status(&h);
    h.controller.cycle().await;
    assert!(h.controller.x_led().is_green());
    assert!(!h.estop.load(Ordering::Relaxed));
}

#[tokio::test(start_paused = true)]
async fn drive_error_code_is_reported_in_hex() {
    let mut h = harness();
    h.x.queue_response(status_reply(0x0011));
    h.y.queue_response(status_reply(0));
    h.controller.cycle().await;
    assert_eq!(
        h.host.lines_out(),
        vec!["X axis error: 0x00,0x11".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn debounced_disable_button_disables_both_axes() {
    let mut h = harness();
    h.disable_tx.send(Edge::Pressed).unwrap();

    // First cycle: press registered, debounce window still open.
    script_clean_status(&h);
    h.controller.cycle().await;
    assert!(control_word_writes(&h.x).is_empty());

    tokio::time::advance(Duration::from_millis(1100)).await;
    script_clean_status(&h);
    h.x.queue_response(write_echo(0xF002, 0x0006));
    h.y.queue_response(write_echo(0xF002, 0x0006));
    h.controller.cycle().await;
    assert_eq!(control_word_writes(&h.x), vec![0x0006]);
    assert_eq!(control_word_writes(&h.y), vec![0x0006]);

    // Held press does not refire.
    script_clean_status(&h);
    h.controller.cycle().await;
    assert_eq!(control_word_writes(&h.x), vec![0x0006]);
}
