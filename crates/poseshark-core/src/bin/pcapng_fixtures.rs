use std::fs;
use std::path::{Path, PathBuf};

use poseshark_core::protocols::position::writer::{encode_message, header_for};
use poseshark_core::{JointSection, PoseSection, Section};

const ETHERTYPE_IPV4: u16 = 0x0800;
const UDP_PROTO: u8 = 17;
const POSITION_PORT: u16 = 60015;
const ROBOT_IP: &str = "10.0.0.10";
const CLIENT_IP: &str = "10.0.0.2";
const MOTION_GROUP: u16 = 1;

fn main() -> Result<(), String> {
    let root = PathBuf::from("tests/golden");
    write_capture(
        root.join("basic").join("input.pcapng"),
        vec![
            stream_message(1, false),
            stream_message(2, false),
            stream_message(4, true),
        ],
    )?;
    write_capture(
        root.join("issues").join("input.pcapng"),
        vec![pose_only_message(1), wrong_version_message(2), vec![0u8; 20]],
    )?;
    Ok(())
}

fn pose(index: u32) -> PoseSection {
    PoseSection {
        group: MOTION_GROUP,
        x: 100.0 + index as f32,
        y: -50.5,
        z: 300.25,
        w: 180.0,
        p: 0.0,
        r: -90.0,
        status: 1,
        io: 0,
    }
}

fn joints(index: u32) -> JointSection {
    let mut values = [0f32; 9];
    for (slot, value) in values.iter_mut().enumerate() {
        *value = slot as f32 * 10.0 + index as f32;
    }
    JointSection {
        group: MOTION_GROUP,
        joints: values,
        status: 0,
        io: 0x10,
    }
}

/// Actual TCP plus joints; `commanded` switches the joint section to the
/// commanded one.
fn stream_message(index: u32, commanded: bool) -> Vec<u8> {
    let joint = if commanded {
        Section::CommandedJoint(joints(index))
    } else {
        Section::ActualJoint(joints(index))
    };
    let sections = [Section::ActualTcp(pose(index)), joint];
    let header = header_for(index, index * 8, &sections, 0, 0);
    encode_message(&header, &sections, &[])
}

fn pose_only_message(index: u32) -> Vec<u8> {
    let sections = [Section::ActualTcp(pose(index))];
    let header = header_for(index, index * 8, &sections, 0, 0);
    encode_message(&header, &sections, &[])
}

fn wrong_version_message(index: u32) -> Vec<u8> {
    let sections = [Section::ActualTcp(pose(index))];
    let mut header = header_for(index, index * 8, &sections, 0, 0);
    header.version = 1;
    encode_message(&header, &sections, &[])
}

fn write_capture(path: PathBuf, payloads: Vec<Vec<u8>>) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }

    let mut packets = Vec::new();
    for (idx, payload) in payloads.iter().enumerate() {
        let frame =
            build_ipv4_udp_packet(ROBOT_IP, CLIENT_IP, POSITION_PORT, POSITION_PORT, payload);
        let ts_us = (idx as u64) * 1_000_000;
        packets.push((ts_us, frame));
    }

    write_pcapng(&path, &packets)?;
    Ok(())
}

fn build_ipv4_udp_packet(
    src_ip: &str,
    dst_ip: &str,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut packet = Vec::new();
    packet.extend_from_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    packet.extend_from_slice(&[0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f]);
    packet.extend_from_slice(&ETHERTYPE_IPV4.to_be_bytes());

    let total_len = 20u16 + 8u16 + (payload.len() as u16);
    let mut ip_header = [0u8; 20];
    ip_header[0] = 0x45;
    ip_header[2..4].copy_from_slice(&total_len.to_be_bytes());
    ip_header[8] = 64;
    ip_header[9] = UDP_PROTO;
    ip_header[12..16].copy_from_slice(&parse_ipv4(src_ip));
    ip_header[16..20].copy_from_slice(&parse_ipv4(dst_ip));
    let checksum = ipv4_checksum(&ip_header);
    ip_header[10..12].copy_from_slice(&checksum.to_be_bytes());
    packet.extend_from_slice(&ip_header);

    let udp_len = 8u16 + (payload.len() as u16);
    packet.extend_from_slice(&src_port.to_be_bytes());
    packet.extend_from_slice(&dst_port.to_be_bytes());
    packet.extend_from_slice(&udp_len.to_be_bytes());
    packet.extend_from_slice(&0u16.to_be_bytes());

    packet.extend_from_slice(payload);
    packet
}

fn parse_ipv4(ip: &str) -> [u8; 4] {
    let mut out = [0u8; 4];
    for (idx, part) in ip.split('.').enumerate() {
        out[idx] = part.parse::<u8>().unwrap_or(0);
    }
    out
}

fn ipv4_checksum(header: &[u8; 20]) -> u16 {
    let mut sum = 0u32;
    for chunk in header.chunks(2) {
        let part = u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
        sum = sum.wrapping_add(part);
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

fn write_pcapng(path: &Path, packets: &[(u64, Vec<u8>)]) -> Result<(), String> {
    let mut output = Vec::new();
    output.extend_from_slice(&pcapng_block(0x0A0D0D0A, &section_header_body()));
    output.extend_from_slice(&pcapng_block(1, &interface_desc_body()));

    for (ts_us, data) in packets {
        output.extend_from_slice(&pcapng_block(6, &enhanced_packet_body(*ts_us, data)));
    }

    fs::write(path, output)
        .map_err(|err| format!("failed to write {}: {}", path.display(), err))?;
    Ok(())
}

fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&total_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_be_bytes());
    block
}

fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x1A2B3C4Du32.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&(-1i64).to_be_bytes());
    body
}

fn interface_desc_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&65535u32.to_be_bytes());
    body
}

fn enhanced_packet_body(ts_us: u64, data: &[u8]) -> Vec<u8> {
    let ts_high = ((ts_us >> 32) & 0xFFFF_FFFF) as u32;
    let ts_low = (ts_us & 0xFFFF_FFFF) as u32;
    let cap_len = data.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&ts_high.to_be_bytes());
    body.extend_from_slice(&ts_low.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(data);
    let pad_len = (4 - (data.len() % 4)) % 4;
    body.extend(std::iter::repeat(0u8).take(pad_len));
    body
}
