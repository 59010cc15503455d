mod test_support;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar, temp_dir};

#[test]
fn update_without_optional_fields_keeps_stored_values() {
    let workspace = temp_dir("sekolahd-partial-update");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "berita.create",
        json!({
            "record": {
                "judul": "Lomba Sains",
                "isi": "Pendaftaran lomba dibuka.",
                "penulis": "Humas",
                "image_url": "assets/berita-images/lomba.png"
            }
        }),
    );
    let id = created
        .get("id")
        .and_then(|v| v.as_str())
        .expect("id")
        .to_string();

    // The update record carries no image_url at all.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "berita.update",
        json!({
            "id": id,
            "record": {
                "judul": "Lomba Sains Nasional",
                "isi": "Pendaftaran lomba dibuka.",
                "penulis": "Humas"
            }
        }),
    );

    // Reload from the store so this checks the row, not just the cache.
    let _ = request_ok(&mut stdin, &mut reader, "4", "berita.load", json!({}));
    let view = request_ok(&mut stdin, &mut reader, "5", "berita.view", json!({}));
    let row = &view.get("items").and_then(|v| v.as_array()).unwrap()[0];
    assert_eq!(
        row.get("judul").and_then(|v| v.as_str()),
        Some("Lomba Sains Nasional")
    );
    assert_eq!(
        row.get("image_url").and_then(|v| v.as_str()),
        Some("assets/berita-images/lomba.png")
    );
}

#[test]
fn update_without_items_keeps_the_stored_list() {
    let workspace = temp_dir("sekolahd-partial-items");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "biaya.create",
        json!({
            "record": {
                "title": "Gelombang 1",
                "price": 2500000,
                "description": "SPP semester ganjil",
                "items": ["Seragam", "Buku paket"]
            }
        }),
    );
    let id = created
        .get("id")
        .and_then(|v| v.as_str())
        .expect("id")
        .to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "biaya.update",
        json!({
            "id": id,
            "record": {
                "title": "Gelombang 1",
                "price": 2750000,
                "description": "SPP semester ganjil"
            }
        }),
    );

    let _ = request_ok(&mut stdin, &mut reader, "4", "biaya.load", json!({}));
    let view = request_ok(&mut stdin, &mut reader, "5", "biaya.view", json!({}));
    let row = &view.get("items").and_then(|v| v.as_array()).unwrap()[0];
    assert_eq!(row.get("price").and_then(|v| v.as_i64()), Some(2750000));
    assert_eq!(
        row.get("items"),
        Some(&json!(["Seragam", "Buku paket"]))
    );
}
