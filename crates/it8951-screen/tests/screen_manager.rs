//! End-to-end behavior of `ScreenManager` against the scripted transport.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::cast_possible_truncation)]

use it8951_scsi::mock::MockTransport;
use it8951_scsi::{from_wire, to_wire, Area, ImageLoadCommand, It8951, Opcode, SystemInfo, WaveMode};
use it8951_screen::{FileImageSource, GrayBuffer, Rotation, ScreenError, ScreenManager};

const IMAGE_BUF: u32 = 0x0012_36E0;

fn screen(width: u32, height: u32) -> ScreenManager<MockTransport> {
    let info = SystemInfo {
        width,
        height,
        image_buf_base: IMAGE_BUF,
        ..SystemInfo::default()
    };
    ScreenManager::new(It8951::new(MockTransport::it8951(info)))
}

fn mock(screen: &ScreenManager<MockTransport>) -> &MockTransport {
    screen.chip().transport()
}

/// Pixels of the single load transfer, header stripped.
fn loaded_pixels(screen: &ScreenManager<MockTransport>) -> (ImageLoadCommand, Vec<u8>) {
    let loads = mock(screen).payloads(Opcode::LoadImageArea);
    assert_eq!(loads.len(), 1, "expected one load transfer");
    let header: ImageLoadCommand = from_wire(&loads[0]).unwrap();
    (header, loads[0][20..].to_vec())
}

#[test]
fn zero_byte_system_info_gives_empty_panel() {
    // No chip model: the system-info query returns zero bytes.
    let mut screen = ScreenManager::new(It8951::new(MockTransport::new()));
    assert_eq!(screen.panel_size(), (0, 0));

    let err = screen
        .display(&GrayBuffer::new(2, 2, vec![0; 4]).unwrap())
        .unwrap_err();
    assert!(matches!(err, ScreenError::NoPanel));
}

#[test]
fn truncated_system_info_still_sizes_panel() {
    let info = SystemInfo {
        width: 1872,
        height: 1404,
        image_buf_base: IMAGE_BUF,
        ..SystemInfo::default()
    };
    let mut reply = to_wire(&info);
    reply.truncate(112);
    let transport = MockTransport::new();
    transport.push_reply(reply);

    let screen = ScreenManager::new(It8951::new(transport));
    assert_eq!(screen.panel_size(), (1872, 1404));
    assert_eq!(screen.system_info().image_buf_base, IMAGE_BUF);
}

#[test]
fn system_info_is_queried_once_at_construction() {
    let mut screen = screen(8, 8);
    let img = GrayBuffer::new(8, 8, vec![0; 64]).unwrap();
    screen.display(&img).unwrap();
    screen.display(&img).unwrap();
    assert_eq!(mock(&screen).count(Opcode::SystemInfo), 1);
}

#[test]
fn clear_then_display_refreshes_twice() {
    let mut screen = screen(16, 8);
    let img = GrayBuffer::new(16, 8, vec![0x7F; 128]).unwrap();

    screen.clear_screen().unwrap();
    let clears = mock(&screen).display_commands();
    assert_eq!(clears.len(), 1);
    assert_eq!(clears[0].wave_mode, WaveMode::Init);
    assert_eq!(clears[0].area, Area::full(16, 8));

    mock(&screen).clear_sent();
    screen.display(&img).unwrap();
    let cmds = mock(&screen).display_commands();
    assert_eq!(cmds.len(), 2, "cleared screen gets a second refresh");
    assert_eq!(cmds[0], cmds[1]);
    assert_eq!(cmds[0].wave_mode, WaveMode::GC16);
    assert_eq!(cmds[0].address, IMAGE_BUF);
    assert!(!cmds[0].wait_ready);

    mock(&screen).clear_sent();
    screen.display(&img).unwrap();
    assert_eq!(mock(&screen).display_commands().len(), 1);
}

#[test]
fn first_display_after_construction_refreshes_twice() {
    let mut screen = screen(4, 4);
    screen.display(&GrayBuffer::new(4, 4, vec![0; 16]).unwrap()).unwrap();
    assert_eq!(mock(&screen).display_commands().len(), 2);
}

#[test]
fn image_is_loaded_to_image_buffer_over_full_panel() {
    let mut screen = screen(8, 4);
    screen.set_rotation(Rotation::Degrees0);
    // 2×2 source stretched to 8×4
    screen
        .display(&GrayBuffer::new(2, 2, vec![0, 255, 0, 255]).unwrap())
        .unwrap();

    let (header, pixels) = loaded_pixels(&screen);
    assert_eq!(header.address, IMAGE_BUF);
    assert_eq!(header.area, Area::full(8, 4));
    assert_eq!(pixels.len(), 32);
    assert_eq!(mock(&screen).display_commands()[0].area, Area::full(8, 4));
}

#[test]
fn default_rotation_turns_image_upside_down() {
    let mut screen = screen(4, 2);
    assert_eq!(screen.rotation(), Rotation::Degrees180);
    screen
        .display(&GrayBuffer::new(4, 2, (1..=8).collect()).unwrap())
        .unwrap();
    let (_, pixels) = loaded_pixels(&screen);
    assert_eq!(pixels, vec![8, 7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn quarter_turn_fits_portrait_source_to_landscape_panel() {
    let mut screen = screen(4, 2);
    screen.set_rotation(Rotation::Degrees90);
    // 2 wide × 4 tall, values are y * 2 + x
    screen
        .display(&GrayBuffer::new(2, 4, (0..8).collect()).unwrap())
        .unwrap();
    let (header, pixels) = loaded_pixels(&screen);
    assert_eq!(header.area, Area::full(4, 2));
    assert_eq!(pixels, vec![6, 4, 2, 0, 7, 5, 3, 1]);
}

#[test]
fn rotation_change_applies_to_next_display_only() {
    let mut screen = screen(2, 1);
    let img = GrayBuffer::new(2, 1, vec![1, 2]).unwrap();
    screen.set_rotation(Rotation::Degrees0);
    screen.display(&img).unwrap();
    screen.set_rotation(Rotation::Degrees180);
    screen.display(&img).unwrap();

    let loads = mock(&screen).payloads(Opcode::LoadImageArea);
    assert_eq!(&loads[0][20..], &[1, 2]);
    assert_eq!(&loads[1][20..], &[2, 1]);
}

#[test]
fn unreadable_image_touches_nothing() {
    let mut screen = screen(8, 8);
    mock(&screen).clear_sent();

    let err = screen
        .display(&FileImageSource::new("/nonexistent/it8951.png"))
        .unwrap_err();
    assert!(matches!(err, ScreenError::Image(_)));
    assert!(mock(&screen).sent().is_empty());
}

#[test]
fn display_from_png_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradient.png");
    let img = image::GrayImage::from_fn(10, 6, |x, _| image::Luma([(x * 25) as u8]));
    img.save(&path).unwrap();

    let mut screen = screen(10, 6);
    screen.set_rotation(Rotation::Degrees0);
    screen.display(&FileImageSource::new(&path)).unwrap();

    let (header, pixels) = loaded_pixels(&screen);
    assert_eq!(header.area, Area::full(10, 6));
    assert_eq!(pixels, img.into_raw());
}

#[test]
fn device_failure_surfaces_as_device_error() {
    let mut screen = screen(4, 4);
    mock(&screen).fail_writes(true);
    let err = screen
        .display(&GrayBuffer::new(4, 4, vec![0; 16]).unwrap())
        .unwrap_err();
    assert!(matches!(err, ScreenError::Device(e) if e.is_transport()));
    assert_eq!(mock(&screen).count(Opcode::DisplayArea), 0);
}

#[test]
fn with_vcom_programs_bias_once() {
    let info = SystemInfo {
        width: 4,
        height: 4,
        ..SystemInfo::default()
    };
    let screen = ScreenManager::with_vcom(It8951::new(MockTransport::it8951(info)), -1.53);
    assert_eq!(mock(&screen).count(Opcode::Pmic), 1);
    let sent = mock(&screen).sent();
    let pmic = sent.iter().find(|c| c.is(Opcode::Pmic)).unwrap();
    assert_eq!(&pmic.cdb.as_bytes()[7..9], &1530u16.to_be_bytes());
}
