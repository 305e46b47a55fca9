//! Codec Tests
//!
//! Tests for request, node command and response encoding/decoding.

use std::io::Cursor;

use bytes::Bytes;
use shardstore::protocol::{
    decode_node_command, decode_request, decode_response, decode_shard_body,
    encode_node_command, encode_request, encode_response, encode_shard_body,
    read_node_command, read_request, read_response, read_role, write_request,
    write_response, write_role, Distribution, NodeCommand, Request, Response, Role, Status,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use shardstore::registry::NodeDescriptor;
use shardstore::StoreError;

// =============================================================================
// Request Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_upload() {
    let request = Request::Upload {
        name: "a.txt".to_string(),
        declared_size: 10,
        data: Bytes::from_static(b"0123456789"),
    };

    let decoded = decode_request(&encode_request(&request)).unwrap();

    assert_eq!(decoded, request);
}

#[test]
fn test_encode_decode_upload_empty_data() {
    let request = Request::Upload {
        name: "empty".to_string(),
        declared_size: 0,
        data: Bytes::new(),
    };

    let decoded = decode_request(&encode_request(&request)).unwrap();

    assert_eq!(decoded, request);
}

#[test]
fn test_encode_decode_register() {
    let request = Request::Register(NodeDescriptor::new("10.0.0.7", 6007, "/srv/node7"));

    let decoded = decode_request(&encode_request(&request)).unwrap();

    assert_eq!(decoded, request);
    assert_eq!(decoded.role(), Role::Node);
}

#[test]
fn test_encode_decode_name_requests() {
    for request in [
        Request::Download { name: "ünï.bin".to_string() },
        Request::Delete { name: "a.txt".to_string() },
    ] {
        let decoded = decode_request(&encode_request(&request)).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.role(), Role::Client);
    }
}

#[test]
fn test_empty_requests_have_no_payload() {
    let encoded = encode_request(&Request::ListFiles);

    assert_eq!(encoded, vec![0x10, 0, 0, 0, 0]);
    assert_eq!(decode_request(&encode_request(&Request::Verify)).unwrap(), Request::Verify);
}

#[test]
fn test_decode_unknown_request_type() {
    let bytes = vec![0x7f, 0, 0, 0, 0];

    let result = decode_request(&bytes);

    assert!(matches!(result, Err(StoreError::Protocol(_))));
}

#[test]
fn test_decode_incomplete_header() {
    let result = decode_request(&[0x10, 0, 0]);

    assert!(matches!(result, Err(StoreError::Protocol(_))));
}

#[test]
fn test_decode_truncated_name() {
    // DOWNLOAD claiming a 10-byte name but carrying 3
    let mut bytes = vec![0x12];
    bytes.extend_from_slice(&7u32.to_be_bytes());
    bytes.extend_from_slice(&10u32.to_be_bytes());
    bytes.extend_from_slice(b"abc");

    let result = decode_request(&bytes);

    assert!(matches!(result, Err(StoreError::Protocol(_))));
}

#[test]
fn test_decode_trailing_bytes_rejected() {
    let mut bytes = encode_request(&Request::Delete { name: "a".to_string() });
    bytes.push(0xff);
    let len = (bytes.len() - HEADER_SIZE) as u32;
    bytes[1..5].copy_from_slice(&len.to_be_bytes());

    let result = decode_request(&bytes);

    assert!(matches!(result, Err(StoreError::Protocol(_))));
}

#[test]
fn test_decode_invalid_utf8_name() {
    let mut bytes = vec![0x13];
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&2u32.to_be_bytes());
    bytes.extend_from_slice(&[0xc3, 0x28]);

    let result = decode_request(&bytes);

    assert!(matches!(result, Err(StoreError::Protocol(_))));
}

#[test]
fn test_read_request_rejects_oversized_payload() {
    let mut bytes = vec![0x11];
    bytes.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());
    let mut cursor = Cursor::new(bytes);

    let result = read_request(&mut cursor);

    assert!(matches!(result, Err(StoreError::Protocol(_))));
}

// =============================================================================
// Role Tests
// =============================================================================

#[test]
fn test_role_round_trip_on_stream() {
    let mut buf = Vec::new();
    write_role(&mut buf, Role::Client).unwrap();
    write_request(&mut buf, &Request::ListFiles).unwrap();

    let mut cursor = Cursor::new(buf);
    assert_eq!(read_role(&mut cursor).unwrap(), Role::Client);
    assert_eq!(read_request(&mut cursor).unwrap(), Request::ListFiles);
}

#[test]
fn test_unknown_role() {
    let mut cursor = Cursor::new(vec![0x09]);

    let result = read_role(&mut cursor);

    assert!(matches!(result, Err(StoreError::Protocol(_))));
}

// =============================================================================
// Node Command Tests
// =============================================================================

#[test]
fn test_encode_decode_store() {
    let command = NodeCommand::Store {
        shard_name: "a.txt.part1".to_string(),
        data: Bytes::from_static(b"0123"),
    };

    let decoded = decode_node_command(&encode_node_command(&command)).unwrap();

    assert_eq!(decoded, command);
}

#[test]
fn test_store_with_damaged_data_is_rejected() {
    let command = NodeCommand::Store {
        shard_name: "a.txt.part1".to_string(),
        data: Bytes::from_static(b"0123"),
    };
    let mut bytes = encode_node_command(&command);
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;

    let result = decode_node_command(&bytes);

    assert!(matches!(result, Err(StoreError::ShardCorruption(_))));
}

#[test]
fn test_node_command_stream_round_trip() {
    let commands = [
        NodeCommand::Retrieve { path: "/srv/n1/a.part1".to_string() },
        NodeCommand::Remove { path: "/srv/n1/a.part1".to_string() },
    ];

    for command in commands {
        let mut cursor = Cursor::new(encode_node_command(&command));
        assert_eq!(read_node_command(&mut cursor).unwrap(), command);
    }
}

#[test]
fn test_shard_body_checksum() {
    let body = encode_shard_body(b"shard bytes");

    assert_eq!(decode_shard_body("p", &body).unwrap(), Bytes::from_static(b"shard bytes"));

    let mut damaged = body.clone();
    damaged[5] ^= 0x01;
    assert!(matches!(
        decode_shard_body("p", &damaged),
        Err(StoreError::ShardCorruption(_))
    ));
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_encode_decode_ok_response() {
    let response = Response::ok(Some(b"SUCCESS".to_vec()));

    let decoded = decode_response(&encode_response(&response)).unwrap();

    assert_eq!(decoded, response);
}

#[test]
fn test_empty_ok_response_has_no_payload() {
    let decoded = decode_response(&encode_response(&Response::ok(None))).unwrap();

    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.payload, None);
}

#[test]
fn test_decode_unknown_status() {
    let result = decode_response(&[0x42, 0, 0, 0, 0]);

    assert!(matches!(result, Err(StoreError::Protocol(_))));
}

#[test]
fn test_response_stream_round_trip() {
    let mut buf = Vec::new();
    write_response(&mut buf, &Response::not_found("a.txt")).unwrap();

    let response = read_response(&mut Cursor::new(buf)).unwrap();

    assert_eq!(response.status, Status::NotFound);
    assert_eq!(response.message(), "a.txt");
}

#[test]
fn test_error_mapping_round_trip() {
    let errors = vec![
        StoreError::NotFound("a.txt".to_string()),
        StoreError::NoNodesAvailable,
        StoreError::PartialUploadFailure { failed: vec![1, 3] },
        StoreError::AlreadyExists("a.txt".to_string()),
        StoreError::InvalidName("a;b".to_string()),
        StoreError::Protocol("bad tag".to_string()),
    ];

    for error in errors {
        let response = Response::from_error(&error);
        let decoded = decode_response(&encode_response(&response)).unwrap();
        let back = decoded.into_result().unwrap_err();
        assert_eq!(back.to_string(), error.to_string());
    }
}

#[test]
fn test_partial_failure_names_shards() {
    let response = Response::from_error(&StoreError::PartialUploadFailure { failed: vec![2] });

    assert_eq!(response.status, Status::PartialUploadFailure);
    match response.into_result() {
        Err(StoreError::PartialUploadFailure { failed }) => assert_eq!(failed, vec![2]),
        other => panic!("Expected PartialUploadFailure, got {:?}", other),
    }
}

#[test]
fn test_io_error_becomes_generic_error() {
    let error = StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));

    let response = Response::from_error(&error);

    assert_eq!(response.status, Status::Error);
    assert!(matches!(response.into_result(), Err(StoreError::Remote(_))));
}

#[test]
fn test_distribution_body() {
    let mut distribution = Distribution::new();
    distribution.insert(
        "a.txt".to_string(),
        vec!["/n1/a.txt.part1".to_string(), "/n2/a.txt.part2".to_string()],
    );

    let response = Response::ok_body(&distribution).unwrap();
    let decoded = decode_response(&encode_response(&response)).unwrap();

    let body: Distribution = decoded.into_body().unwrap();
    assert_eq!(body, distribution);
}
