// Gateway mode: register-map service on the controller's own unit id and
// frame forwarding to the subordinate drives.
mod common;

use eslm_rs::router::{self, OperatingMode};
use eslm_rs::transport::Adu;

use common::{harness, script_clean_status, status_reply, Harness};

async fn gateway_harness() -> Harness {
    let mut h = harness();
    h.controller.execute(router::parse("RTU_GATEWAY")).await;
    h
}

fn read_holding(unit: u8, addr: u16, count: u16) -> Adu {
    Adu::new(
        unit,
        0x03,
        vec![
            (addr >> 8) as u8,
            (addr & 0xFF) as u8,
            (count >> 8) as u8,
            (count & 0xFF) as u8,
        ],
    )
}

#[tokio::test(start_paused = true)]
async fn subordinate_frame_is_forwarded_with_unit_rewrite() {
    let mut h = gateway_harness().await;
    script_clean_status(&h);
    // Drive answers on its own link-local unit id.
    h.x.queue_response(Adu::new(1, 0x03, vec![0x02, 0x00, 0x2A]));
    h.host.push_frame(read_holding(2, 0xF00A, 1));

    h.controller.cycle().await;

    // The drive saw the frame on unit 1.
    let forwarded = h.x.sent().last().unwrap().clone();
    assert_eq!(forwarded.unit, 1);
    assert_eq!(forwarded.function, 0x03);
    // The host got the reply back under the subordinate id it asked for.
    let frames = h.host.frames_out();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].unit, 2);
    assert_eq!(frames[0].data, vec![0x02, 0x00, 0x2A]);
}

#[tokio::test(start_paused = true)]
async fn second_subordinate_routes_to_the_y_axis() {
    let mut h = gateway_harness().await;
    script_clean_status(&h);
    h.y.queue_response(Adu::new(1, 0x03, vec![0x02, 0x00, 0x07]));
    h.host.push_frame(read_holding(3, 0xF001, 1));

    h.controller.cycle().await;

    // Y got the forward, X only its status poll.
    assert_eq!(h.y.sent().len(), 2);
    assert_eq!(h.x.sent().len(), 1);
    assert_eq!(h.host.frames_out()[0].unit, 3);
}

#[tokio::test(start_paused = true)]
async fn unmapped_unit_gets_gateway_path_exception() {
    let mut h = gateway_harness().await;
    script_clean_status(&h);
    h.host.push_frame(read_holding(9, 0x0000, 1));

    h.controller.cycle().await;

    let frames = h.host.frames_out();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].unit, 9);
    assert_eq!(frames[0].function, 0x83);
    assert_eq!(frames[0].data, vec![0x0A]);
    // Nothing was forwarded; each drive saw only its status poll.
    assert_eq!(h.x.sent().len(), 1);
    assert_eq!(h.y.sent().len(), 1);
    // The misaddressed bus is flagged on the panel.
    assert!(h.controller.y_led().is_red());
}

#[tokio::test(start_paused = true)]
async fn silent_target_gets_target_failed_exception() {
    let mut h = gateway_harness().await;
    script_clean_status(&h);
    // No forward response scripted on Y.
    h.host.push_frame(read_holding(3, 0xF00A, 1));

    h.controller.cycle().await;

    let frames = h.host.frames_out();
    assert_eq!(frames[0].unit, 3);
    assert_eq!(frames[0].function, 0x83);
    assert_eq!(frames[0].data, vec![0x0B]);
}

#[tokio::test(start_paused = true)]
async fn own_unit_serves_the_register_map() {
    let mut h = gateway_harness().await;
    script_clean_status(&h);
    h.host.push_frame(read_holding(1, 0, 3));

    h.controller.cycle().await;

    // Mode = gateway, both LEDs green after the clean status poll.
    let frames = h.host.frames_out();
    assert_eq!(frames[0].unit, 1);
    assert_eq!(frames[0].function, 0x03);
    assert_eq!(frames[0].data, vec![6, 0, 1, 0, 2, 0, 2]);
    // Register reads never touch the drive links.
    assert_eq!(h.x.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn mode_register_write_leaves_gateway_mode()  {
    let mut h = gateway_harness().await;
    script_clean_status(&h);
    let write = Adu::new(1, 0x06, vec![0x00, 0x00, 0x00, 0x00]);
    h.host.push_frame(write.clone());

    h.controller.cycle().await;

    // Echo response, then the mode change takes effect.
    assert_eq!(h.host.frames_out(), vec![write]);
    assert_eq!(h.controller.mode(), OperatingMode::Ascii);

    // Next cycle the gateway poll no longer runs.
    script_clean_status(&h);
    h.host.push_frame(read_holding(1, 0, 1));
    h.controller.cycle().await;
    assert_eq!(h.host.frames_out().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn led_register_write_drives_the_panel() {
    let mut h = gateway_harness().await;
    script_clean_status(&h);
    // Holding register 2 = Y LED, value 1 = red.
    h.host.push_frame(Adu::new(1, 0x06, vec![0x00, 0x02, 0x00, 0x01]));

    h.controller.cycle().await;

    assert!(h.controller.y_led().is_red());
    assert!(!h.host.frames_out()[0].is_exception());
}

#[tokio::test(start_paused = true)]
async fn discrete_inputs_project_the_buttons() {
    let mut h = gateway_harness().await;

    // One clean cycle so the pending press edge gets consumed.
    h.enable_tx.send(eslm_rs::io::Edge::Pressed).unwrap();
    script_clean_status(&h);
    h.controller.cycle().await;

    script_clean_status(&h);
    h.host.push_frame(Adu::new(1, 0x02, vec![0x00, 0x00, 0x00, 0x02]));
    h.controller.cycle().await;

    let frames = h.host.frames_out();
    assert_eq!(frames[0].function, 0x02);
    // Bit 0 = disable button (released), bit 1 = enable button (held).
    assert_eq!(frames[0].data, vec![1, 0b10]);
}

#[tokio::test(start_paused = true)]
async fn mixed_mode_serves_both_protocols_in_one_cycle() {
    let mut h = harness();
    h.controller.execute(router::parse("RTU_MIXED")).await;
    assert_eq!(h.controller.mode(), OperatingMode::RtuMixed);

    script_clean_status(&h);
    h.host.push_line("VERSION");
    h.host.push_frame(read_holding(1, 0, 1));
    h.controller.cycle().await;

    assert_eq!(h.host.lines_out().len(), 1);
    let frames = h.host.frames_out();
    assert_eq!(frames.len(), 1);
    // Mode register reads back 2 (mixed).
    assert_eq!(frames[0].data, vec![2, 0, 2]);
}

#[tokio::test(start_paused = true)]
async fn status_fault_shows_in_the_led_registers() {
    let mut h = gateway_harness().await;
    // X link dead, Y clean.
    h.y.queue_response(status_reply(0));
    h.host.push_frame(read_holding(1, 1, 2));
    h.controller.cycle().await;

    let frames = h.host.frames_out();
    // X LED red (1), Y LED green (2).
    assert_eq!(frames[0].data, vec![4, 0, 1, 0, 2]);
}
