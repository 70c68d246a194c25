#[cfg(test)]
mod tests {
    use crate::scan_pipeline::device::caps::{
        discover, AsicGeneration, DeviceCaps, DeviceProbe, InquiryRecord,
    };
    use crate::scan_pipeline::device::commands::{
        self, CMD_LEN, DATA_GAMMA, DATA_IMAGE, OP_MEDIA_EJECT, OP_READ, OP_SEND, OP_SET_WINDOW,
        OP_START_SCAN,
    };
    use crate::scan_pipeline::transport::sim::SimProbe;

    #[test]
    fn test_read_command_layout() {
        let cmd = commands::read_cmd(DATA_IMAGE, 0, 0x012345);
        assert_eq!(cmd.len(), CMD_LEN);
        assert_eq!(commands::opcode(&cmd), OP_READ);
        assert_eq!(commands::data_type(&cmd), DATA_IMAGE);
        assert_eq!(commands::qualifier(&cmd), 0);
        assert_eq!(commands::transfer_len(&cmd), 0x012345);
        // Big-endian length at the fixed offset.
        assert_eq!(&cmd[6..9], &[0x01, 0x23, 0x45]);
    }

    #[test]
    fn test_send_command_carries_qualifier() {
        let cmd = commands::send_cmd(DATA_GAMMA, 2, 2048);
        assert_eq!(commands::opcode(&cmd), OP_SEND);
        assert_eq!(commands::data_type(&cmd), DATA_GAMMA);
        assert_eq!(commands::qualifier(&cmd), 2);
        assert_eq!(commands::transfer_len(&cmd), 2048);
    }

    #[test]
    fn test_control_command_opcodes() {
        assert_eq!(commands::opcode(&commands::set_window_cmd(16)), OP_SET_WINDOW);
        assert_eq!(commands::transfer_len(&commands::set_window_cmd(16)), 16);
        assert_eq!(commands::opcode(&commands::start_scan_cmd()), OP_START_SCAN);
        assert_eq!(commands::opcode(&commands::eject_cmd()), OP_MEDIA_EJECT);
        assert_eq!(commands::transfer_len(&commands::start_scan_cmd()), 0);
    }

    #[test]
    fn test_u16_round_trips() {
        let mut buf = [0u8; 4];
        commands::put_u16_le(&mut buf, 1, 0xBEEF);
        assert_eq!(buf, [0, 0xEF, 0xBE, 0]);
        assert_eq!(commands::get_u16_le(&buf, 1), 0xBEEF);

        let mut buf = [0u8; 4];
        commands::put_u16_be(&mut buf, 1, 0xBEEF);
        assert_eq!(buf, [0, 0xBE, 0xEF, 0]);
        assert_eq!(commands::get_u16_be(&buf, 1), 0xBEEF);
    }

    #[test]
    fn test_u24_round_trip() {
        let mut buf = [0u8; 3];
        commands::put_u24_be(&mut buf, 0, 0xFF_FFFF);
        assert_eq!(commands::get_u24_be(&buf, 0), 0xFF_FFFF);
        commands::put_u24_be(&mut buf, 0, 0);
        assert_eq!(commands::get_u24_be(&buf, 0), 0);
    }

    #[test]
    fn test_gamma_sizing_per_generation() {
        assert_eq!(AsicGeneration::Gen1.gamma_raw_entries(), 256);
        assert_eq!(AsicGeneration::Gen2.gamma_raw_entries(), 512);
        assert_eq!(AsicGeneration::Gen3.gamma_raw_entries(), 2048);
        assert_eq!(AsicGeneration::Gen4.gamma_raw_entries(), 4096);

        // Gen2 pads instead of interpolating, so one value per input.
        assert_eq!(AsicGeneration::Gen2.gamma_values_per_input(), 1);
        assert_eq!(AsicGeneration::Gen3.gamma_values_per_input(), 8);
        assert_eq!(AsicGeneration::Gen4.gamma_values_per_input(), 16);

        assert!(AsicGeneration::Gen4.exempt_from_bilevel_invert());
        assert!(!AsicGeneration::Gen3.exempt_from_bilevel_invert());
    }

    #[test]
    fn test_discover_keeps_known_models() {
        let devices = discover(&SimProbe);
        assert_eq!(devices.len(), 2);
        assert!(devices[0].model.contains("FB1200"));
        assert!(devices[0].caps.needs_software_colorpack);
        assert!(!devices[0].caps.line_pack);
        assert!(devices[1].model.contains("SF600"));
        assert!(devices[1].caps.line_pack);
        assert!(devices[1].caps.calibrate_once);
    }

    #[test]
    fn test_discover_skips_unknown_models() {
        struct MixedProbe;
        impl DeviceProbe for MixedProbe {
            fn inquire(&self) -> Vec<InquiryRecord> {
                vec![
                    InquiryRecord {
                        id: "usb:0".into(),
                        vendor: "SimTek".into(),
                        model: "SimTek XJ9000".into(),
                    },
                    InquiryRecord {
                        id: "usb:1".into(),
                        vendor: "SimTek".into(),
                        model: "SimTek FB1200".into(),
                    },
                ]
            }
        }
        let devices = discover(&MixedProbe);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "usb:1");
    }

    #[test]
    fn test_discover_empty_bus() {
        struct EmptyProbe;
        impl DeviceProbe for EmptyProbe {
            fn inquire(&self) -> Vec<InquiryRecord> {
                Vec::new()
            }
        }
        assert!(discover(&EmptyProbe).is_empty());
    }

    #[test]
    fn test_capability_profiles_are_consistent() {
        let flatbed = DeviceCaps::flatbed_colorpack();
        // Head offsets only make sense on software color-pack devices.
        assert!(flatbed.needs_software_colorpack);
        assert!(flatbed.head_offset_lines > 0);
        assert_eq!(flatbed.head_offset_lines % 3, 0);

        let sheetfed = DeviceCaps::sheetfed_linepack();
        assert!(sheetfed.line_pack);
        assert_eq!(sheetfed.head_offset_lines, 0);
        assert!(sheetfed.adf_mirrors_image);
    }
}
