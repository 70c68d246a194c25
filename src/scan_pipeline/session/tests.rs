#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use crate::scan_pipeline::common::{BackendConfig, ScanError};
    use crate::scan_pipeline::geometry::types::{ColorMode, ScanRequest, Source};
    use crate::scan_pipeline::session::session::ScanSession;
    use crate::scan_pipeline::transport::sim::{SimProfile, SimScanner};

    fn color_request(source: Source) -> ScanRequest {
        ScanRequest {
            xres: 300,
            yres: 300,
            top_left: (0, 0),
            bottom_right: (400, 240),
            mode: ColorMode::Color,
            source,
            brightness: 0.0,
            contrast: 0.0,
        }
    }

    fn flatbed_session(config: BackendConfig) -> ScanSession {
        let profile = SimProfile::flatbed_color();
        let caps = profile.caps.clone();
        ScanSession::new(caps, config, Box::new(SimScanner::new(profile)))
    }

    fn session_for(profile: SimProfile, config: BackendConfig) -> ScanSession {
        let caps = profile.caps.clone();
        ScanSession::new(caps, config, Box::new(SimScanner::new(profile)))
    }

    fn read_to_end(session: &mut ScanSession) -> Vec<u8> {
        let mut frame = Vec::new();
        let mut buf = vec![0u8; 1024];
        loop {
            let n = session.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            frame.extend_from_slice(&buf[..n]);
        }
        frame
    }

    #[test]
    fn test_flatbed_color_end_to_end() {
        let profile = SimProfile::flatbed_color();
        let caps = profile.caps.clone();
        let sim = SimScanner::new(profile);
        let counters = sim.counters();
        let mut session = ScanSession::new(caps, BackendConfig::default(), Box::new(sim));

        session.configure(color_request(Source::Flatbed)).unwrap();
        let params = session.get_parameters().unwrap();
        assert_eq!(params.pixels_per_line, 100);
        assert_eq!(params.lines, 60);
        assert_eq!(params.bytes_per_line, 300);

        session.start_scan().unwrap();
        let frame = read_to_end(&mut session);
        assert_eq!(frame.len(), params.bytes_per_line * params.lines);

        // The reassembled frame is the document, head offsets undone.
        for y in [0usize, 1, 7, 30, 59] {
            for x in [0usize, 1, 50, 99] {
                let at = y * params.bytes_per_line + 3 * x;
                assert_eq!(
                    &frame[at..at + 3],
                    &SimScanner::doc_rgb(x, y),
                    "pixel ({x},{y})"
                );
            }
        }

        assert_eq!(counters.windows_set.load(Ordering::SeqCst), 1);
        assert_eq!(counters.scans_started.load(Ordering::SeqCst), 1);
        assert_eq!(counters.shading_uploads.load(Ordering::SeqCst), 1);
        for ch in 0..3 {
            assert_eq!(counters.gamma_bytes[ch].load(Ordering::SeqCst), 2048);
        }
        assert_eq!(counters.ejects.load(Ordering::SeqCst), 0);

        // End of image stays sticky.
        let mut buf = [0u8; 16];
        assert_eq!(session.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_gray_scan_passthrough() {
        let mut profile = SimProfile::flatbed_color();
        profile.color = false;
        let mut session = session_for(profile, BackendConfig::default());

        let mut request = color_request(Source::Flatbed);
        request.mode = ColorMode::Gray;
        session.configure(request).unwrap();
        let params = session.get_parameters().unwrap();
        assert_eq!(params.bytes_per_line, 100);

        session.start_scan().unwrap();
        let frame = read_to_end(&mut session);
        assert_eq!(frame.len(), 100 * 60);
        for y in [0usize, 13, 59] {
            for x in [0usize, 42, 99] {
                assert_eq!(frame[y * 100 + x], SimScanner::doc_gray(x, y));
            }
        }
    }

    #[test]
    fn test_sheetfed_line_pack_end_to_end() {
        let mut session = session_for(SimProfile::sheetfed(), BackendConfig::default());
        session.configure(color_request(Source::Flatbed)).unwrap();
        let params = session.get_parameters().unwrap();
        // Pixel boundary 8 trims 100 to 96.
        assert_eq!(params.pixels_per_line, 96);

        session.start_scan().unwrap();
        let frame = read_to_end(&mut session);
        assert_eq!(frame.len(), params.bytes_per_line * params.lines);
        for y in [0usize, 11, 59] {
            for x in [0usize, 5, 95] {
                let at = y * params.bytes_per_line + 3 * x;
                assert_eq!(&frame[at..at + 3], &SimScanner::doc_rgb(x, y));
            }
        }
    }

    #[test]
    fn test_cancel_ejects_exactly_once() {
        let profile = SimProfile::sheetfed();
        let caps = profile.caps.clone();
        let sim = SimScanner::new(profile);
        let counters = sim.counters();
        let mut session = ScanSession::new(caps, BackendConfig::default(), Box::new(sim));

        session.configure(color_request(Source::Adf)).unwrap();
        session.start_scan().unwrap();
        session.cancel();
        assert_eq!(counters.ejects.load(Ordering::SeqCst), 1);

        // A second cancel is a no-op, and the aborted stream reports end
        // of image.
        session.cancel();
        assert_eq!(counters.ejects.load(Ordering::SeqCst), 1);
        let mut buf = [0u8; 16];
        assert_eq!(session.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_calibrate_once_reuses_shading() {
        let profile = SimProfile::sheetfed();
        let caps = profile.caps.clone();
        assert!(caps.calibrate_once);
        let sim = SimScanner::new(profile);
        let counters = sim.counters();
        let mut session = ScanSession::new(caps, BackendConfig::default(), Box::new(sim));

        session.configure(color_request(Source::Flatbed)).unwrap();
        session.start_scan().unwrap();
        let first = read_to_end(&mut session);

        session.start_scan().unwrap();
        let second = read_to_end(&mut session);
        assert_eq!(first, second);

        // Per-channel upload is three transfers, issued for the first scan
        // only.
        assert_eq!(counters.shading_uploads.load(Ordering::SeqCst), 3);
        assert_eq!(counters.scans_started.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reconfigure_invalidates_shading() {
        let profile = SimProfile::sheetfed();
        let caps = profile.caps.clone();
        let sim = SimScanner::new(profile);
        let counters = sim.counters();
        let mut session = ScanSession::new(caps, BackendConfig::default(), Box::new(sim));

        session.configure(color_request(Source::Flatbed)).unwrap();
        session.start_scan().unwrap();
        read_to_end(&mut session);

        // A narrower window measures new shading even on calibrate-once
        // hardware.
        let mut request = color_request(Source::Flatbed);
        request.bottom_right = (320, 240);
        session.configure(request).unwrap();
        session.start_scan().unwrap();
        read_to_end(&mut session);

        assert_eq!(counters.shading_uploads.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_configure_while_scanning_is_busy() {
        let mut session = flatbed_session(BackendConfig::default());
        session.configure(color_request(Source::Flatbed)).unwrap();
        session.start_scan().unwrap();

        let err = session.configure(color_request(Source::Flatbed)).unwrap_err();
        assert!(matches!(err, ScanError::Busy));
        let err = session.start_scan().unwrap_err();
        assert!(matches!(err, ScanError::Busy));

        session.cancel();
        // After cancellation the session accepts a new configuration.
        session.configure(color_request(Source::Flatbed)).unwrap();
    }

    #[test]
    fn test_unconfigured_session_is_not_active() {
        let mut session = flatbed_session(BackendConfig::default());
        assert!(matches!(session.get_parameters(), Err(ScanError::NotActive)));
        assert!(matches!(session.start_scan(), Err(ScanError::NotActive)));
        let mut buf = [0u8; 16];
        assert!(matches!(session.read(&mut buf), Err(ScanError::NotActive)));
    }

    #[test]
    fn test_lamp_warmup_is_polled_through() {
        let mut profile = SimProfile::flatbed_color();
        profile.busy_polls = 3;
        let config = BackendConfig::builder()
            .ready_poll_backoff(Duration::ZERO)
            .build();
        let mut session = session_for(profile, config);
        session.configure(color_request(Source::Flatbed)).unwrap();
        session.start_scan().unwrap();
        let frame = read_to_end(&mut session);
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_warmup_timeout_fails_and_recovers() {
        let mut profile = SimProfile::flatbed_color();
        profile.busy_polls = 6;
        let config = BackendConfig::builder()
            .ready_poll_attempts(4)
            .ready_poll_backoff(Duration::ZERO)
            .build();
        let mut session = session_for(profile, config);
        session.configure(color_request(Source::Flatbed)).unwrap();

        let err = session.start_scan().unwrap_err();
        assert!(matches!(err, ScanError::NotReady(4)));

        // The transport was reclaimed; once the lamp is warm the same
        // session scans.
        session.start_scan().unwrap();
        let frame = read_to_end(&mut session);
        assert!(!frame.is_empty());
    }

    #[test]
    fn test_empty_hopper_reports_no_documents() {
        let mut profile = SimProfile::sheetfed();
        profile.no_media = true;
        let mut session = session_for(profile, BackendConfig::default());
        session.configure(color_request(Source::Adf)).unwrap();
        let err = session.start_scan().unwrap_err();
        assert!(matches!(err, ScanError::NoDocuments));
    }

    #[test]
    fn test_force_a4_clamps_request() {
        let config = BackendConfig::builder().force_a4(true).build();
        let mut session = flatbed_session(config);
        let mut request = color_request(Source::Flatbed);
        request.bottom_right = (10200, 14028);
        session.configure(request).unwrap();
        let params = session.get_parameters().unwrap();
        // A4 width 9920 base units at 300 dpi.
        assert_eq!(params.pixels_per_line, 2480);
    }

    #[test]
    fn test_disabled_calibration_skips_uploads() {
        let profile = SimProfile::flatbed_color();
        let caps = profile.caps.clone();
        let sim = SimScanner::new(profile);
        let counters = sim.counters();
        let config = BackendConfig::builder()
            .disable_calibration(true)
            .disable_gamma(true)
            .build();
        let mut session = ScanSession::new(caps, config, Box::new(sim));

        session.configure(color_request(Source::Flatbed)).unwrap();
        session.start_scan().unwrap();
        read_to_end(&mut session);

        assert_eq!(counters.shading_uploads.load(Ordering::SeqCst), 0);
        assert_eq!(counters.gamma_bytes[0].load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_16bit_correction_skipped_on_calibration_width_mismatch() {
        // The device calibrates 256 pixels but the window is 100 wide; the
        // positional tables cannot line up, so the frame must match an
        // uncorrected scan instead of mixing in a neighbour's gains.
        let mut request = color_request(Source::Flatbed);
        request.mode = ColorMode::Color16;

        let config = BackendConfig::builder()
            .software_16bit_correction(true)
            .build();
        let mut corrected = flatbed_session(config);
        corrected.configure(request.clone()).unwrap();
        corrected.start_scan().unwrap();
        let with_flag = read_to_end(&mut corrected);

        let mut plain = flatbed_session(BackendConfig::default());
        plain.configure(request).unwrap();
        plain.start_scan().unwrap();
        let without_flag = read_to_end(&mut plain);

        assert_eq!(with_flag, without_flag);
    }

    #[test]
    fn test_16bit_correction_applies_at_matching_width() {
        // Calibration width equal to the window: the software correction
        // runs and changes the samples.
        let mut request = color_request(Source::Flatbed);
        request.mode = ColorMode::Color16;

        let matching_profile = || {
            let mut profile = SimProfile::flatbed_color();
            profile.cal_pixels = 100;
            profile
        };

        let config = BackendConfig::builder()
            .software_16bit_correction(true)
            .build();
        let mut corrected = session_for(matching_profile(), config);
        corrected.configure(request.clone()).unwrap();
        corrected.start_scan().unwrap();
        let with_flag = read_to_end(&mut corrected);

        let mut plain = session_for(matching_profile(), BackendConfig::default());
        plain.configure(request).unwrap();
        plain.start_scan().unwrap();
        let without_flag = read_to_end(&mut plain);

        assert_eq!(with_flag.len(), without_flag.len());
        assert_ne!(with_flag, without_flag);
    }

    #[test]
    fn test_scan_to_writes_whole_frame() {
        let mut session = flatbed_session(BackendConfig::default());
        session.configure(color_request(Source::Flatbed)).unwrap();

        let mut file = tempfile::tempfile().unwrap();
        let params = session.scan_to(&mut file).unwrap();

        file.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents.len(), params.bytes_per_line * params.lines);
        assert_eq!(&contents[0..3], &SimScanner::doc_rgb(0, 0));
    }

    #[test]
    fn test_drop_mid_scan_does_not_panic() {
        let mut session = flatbed_session(BackendConfig::default());
        session.configure(color_request(Source::Flatbed)).unwrap();
        session.start_scan().unwrap();
        drop(session);
    }
}
