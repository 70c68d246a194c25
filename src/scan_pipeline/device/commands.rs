//! Wire command builders.
//!
//! Commands are fixed 10-byte blocks built through explicit encode
//! functions; every field is written at a named offset so the layout never
//! depends on struct padding. Layout:
//!
//! ```text
//! byte 0      opcode
//! byte 2      data-type code (READ/SEND only)
//! byte 5      qualifier (channel index or calibration kind)
//! bytes 6..9  transfer length, u24 big-endian
//! ```

pub const CMD_LEN: usize = 10;

pub const OP_READ: u8 = 0x28;
pub const OP_SEND: u8 = 0x2A;
pub const OP_SET_WINDOW: u8 = 0x24;
pub const OP_START_SCAN: u8 = 0x1B;
pub const OP_MEDIA_EJECT: u8 = 0x31;

pub const DATA_IMAGE: u8 = 0x00;
pub const DATA_CAL_FORMAT: u8 = 0x60;
pub const DATA_SHADING_DARK: u8 = 0x66;
pub const DATA_SHADING_WHITE: u8 = 0x67;
pub const DATA_GAMMA: u8 = 0x81;
pub const DATA_SHADING_TABLE: u8 = 0x82;

const OFFSET_OPCODE: usize = 0;
const OFFSET_DATA_TYPE: usize = 2;
const OFFSET_QUALIFIER: usize = 5;
const OFFSET_LENGTH: usize = 6;

pub fn put_u24_be(buf: &mut [u8], offset: usize, value: usize) {
    debug_assert!(value <= 0xFF_FFFF);
    buf[offset] = (value >> 16) as u8;
    buf[offset + 1] = (value >> 8) as u8;
    buf[offset + 2] = value as u8;
}

pub fn get_u24_be(buf: &[u8], offset: usize) -> usize {
    ((buf[offset] as usize) << 16) | ((buf[offset + 1] as usize) << 8) | buf[offset + 2] as usize
}

pub fn put_u16_le(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn get_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

pub fn put_u16_be(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

pub fn get_u16_be(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

pub fn read_cmd(data_type: u8, qualifier: u8, len: usize) -> [u8; CMD_LEN] {
    let mut cmd = [0u8; CMD_LEN];
    cmd[OFFSET_OPCODE] = OP_READ;
    cmd[OFFSET_DATA_TYPE] = data_type;
    cmd[OFFSET_QUALIFIER] = qualifier;
    put_u24_be(&mut cmd, OFFSET_LENGTH, len);
    cmd
}

pub fn send_cmd(data_type: u8, qualifier: u8, len: usize) -> [u8; CMD_LEN] {
    let mut cmd = [0u8; CMD_LEN];
    cmd[OFFSET_OPCODE] = OP_SEND;
    cmd[OFFSET_DATA_TYPE] = data_type;
    cmd[OFFSET_QUALIFIER] = qualifier;
    put_u24_be(&mut cmd, OFFSET_LENGTH, len);
    cmd
}

pub fn set_window_cmd(len: usize) -> [u8; CMD_LEN] {
    let mut cmd = [0u8; CMD_LEN];
    cmd[OFFSET_OPCODE] = OP_SET_WINDOW;
    put_u24_be(&mut cmd, OFFSET_LENGTH, len);
    cmd
}

pub fn start_scan_cmd() -> [u8; CMD_LEN] {
    let mut cmd = [0u8; CMD_LEN];
    cmd[OFFSET_OPCODE] = OP_START_SCAN;
    cmd
}

pub fn eject_cmd() -> [u8; CMD_LEN] {
    let mut cmd = [0u8; CMD_LEN];
    cmd[OFFSET_OPCODE] = OP_MEDIA_EJECT;
    cmd
}

pub fn opcode(cmd: &[u8]) -> u8 {
    cmd[OFFSET_OPCODE]
}

pub fn data_type(cmd: &[u8]) -> u8 {
    cmd[OFFSET_DATA_TYPE]
}

pub fn qualifier(cmd: &[u8]) -> u8 {
    cmd[OFFSET_QUALIFIER]
}

pub fn transfer_len(cmd: &[u8]) -> usize {
    get_u24_be(cmd, OFFSET_LENGTH)
}
