//! End-to-end tests for camera capture.
//!
//! Hardware-dependent cases are skipped when no camera is present, so the
//! suite stays green on headless machines.

use std::time::{Duration, Instant};

use pose_relay::camera::{list_devices, CameraSettings, Sample, StreamManager};

#[test]
fn test_list_devices_succeeds() {
    let result = list_devices();
    assert!(
        result.is_ok(),
        "list_devices should not error: {:?}",
        result.err()
    );

    let devices = result.unwrap();
    println!("Found {} camera device(s)", devices.len());
    for device in &devices {
        println!("  {}", device);
    }
}

#[tokio::test]
async fn test_acquire_sample_release() {
    let devices = list_devices().expect("Should be able to list devices");
    if devices.is_empty() {
        println!("SKIP: No cameras available for this test");
        return;
    }

    let mut manager = StreamManager::new(CameraSettings::default());
    let device_id = devices[0].index.to_string();

    manager
        .acquire(&device_id)
        .await
        .expect("Camera should acquire");

    let session = manager.session().expect("Session should be live");
    let resolution = session.resolution();
    assert!(resolution.width > 0 && resolution.height > 0);

    // The source may prime for a few ticks before the first frame lands
    let deadline = Instant::now() + Duration::from_secs(3);
    let frame = loop {
        match manager.session().unwrap().sample() {
            Sample::Frame(frame) => break Some(frame),
            Sample::Priming => {
                if Instant::now() > deadline {
                    break None;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    };

    if let Some(frame) = frame {
        assert_eq!(frame.data.len(), (frame.width * frame.height * 3) as usize);
    } else {
        println!("SKIP: camera produced no frame within the deadline");
    }

    // Re-acquiring the same device exercises release-before-acquire
    manager
        .acquire(&device_id)
        .await
        .expect("Re-acquire should succeed");

    manager.release();
    assert!(manager.session().is_none());
}
