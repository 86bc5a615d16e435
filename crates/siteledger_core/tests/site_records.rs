use siteledger_core::{
    AccessPoint, BlobSiteRepository, FileBlobStore, JsonCodec, Site, SiteCodec, SiteRepository,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn stored_file_uses_expected_wire_fields() {
    let temp = TempDir::new().unwrap();
    let repo = BlobSiteRepository::new(FileBlobStore::open(temp.path()).unwrap());
    let site = Site::new("acme", "edge", "https://acme.example")
        .with_access_point(AccessPoint::new("api", "http://a"));
    repo.create_site(&site).unwrap();

    let raw = fs::read(temp.path().join("acme")).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "acme",
            "role": "edge",
            "uri": "https://acme.example",
            "access_points": [{ "label": "api", "url": "http://a" }]
        })
    );
}

#[test]
fn legacy_records_load_and_upgrade_on_next_write() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("legacy"),
        br#"{"Name":"legacy","Role":"old","Uri":"u","Access_points":null}"#,
    )
    .unwrap();
    let repo = BlobSiteRepository::new(FileBlobStore::open(temp.path()).unwrap());

    assert_eq!(repo.get_site("legacy").unwrap(), Site::new("legacy", "old", "u"));

    repo.upsert_access_point("legacy", &AccessPoint::new("api", "http://a"))
        .unwrap();
    let raw = fs::read_to_string(temp.path().join("legacy")).unwrap();
    assert!(raw.contains("\"access_points\""));
    assert!(!raw.contains("Access_points"));
}

#[test]
fn pretty_codec_writes_indented_records() {
    let temp = TempDir::new().unwrap();
    let repo = BlobSiteRepository::with_codec(
        FileBlobStore::open(temp.path()).unwrap(),
        JsonCodec::pretty(),
    );
    repo.create_site(&Site::new("acme", "", "")).unwrap();

    let raw = fs::read(temp.path().join("acme")).unwrap();
    assert!(raw.contains(&b'\n'));
    assert_eq!(
        JsonCodec::new().decode_site(&raw).unwrap(),
        repo.get_site("acme").unwrap()
    );
}

#[test]
fn access_points_keep_wire_shape_inside_site_record() {
    let codec = JsonCodec::new();
    let site = Site::new("acme", "", "").with_access_point(AccessPoint::new("api", "http://a"));

    let value: serde_json::Value =
        serde_json::from_slice(&codec.encode_site(&site).unwrap()).unwrap();
    assert_eq!(
        value["access_points"],
        serde_json::json!([{"label": "api", "url": "http://a"}])
    );
}
