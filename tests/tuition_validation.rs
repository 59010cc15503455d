mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn non_positive_prices_never_reach_the_store() {
    let workspace = temp_dir("sekolahd-tuition");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    for (i, price) in [0, -5].iter().enumerate() {
        let code = request_err(
            &mut stdin,
            &mut reader,
            &format!("bad{i}"),
            "biaya.create",
            json!({
                "record": {
                    "title": "Gelombang 1",
                    "price": price,
                    "description": "Biaya masuk"
                }
            }),
        );
        assert_eq!(code, "validation_failed");
    }

    let _ = request_ok(&mut stdin, &mut reader, "2", "biaya.load", json!({}));
    let view = request_ok(&mut stdin, &mut reader, "3", "biaya.view", json!({}));
    assert_eq!(view.get("totalFiltered").and_then(|v| v.as_u64()), Some(0));

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "biaya.create",
        json!({
            "record": {
                "title": "Gelombang 1",
                "price": 1,
                "description": "Biaya masuk",
                "items": ["Seragam", "Buku paket"]
            }
        }),
    );
    assert!(created.get("id").and_then(|v| v.as_str()).is_some());

    let view = request_ok(&mut stdin, &mut reader, "5", "biaya.view", json!({}));
    let row = &view.get("items").and_then(|v| v.as_array()).unwrap()[0];
    assert_eq!(row.get("price").and_then(|v| v.as_i64()), Some(1));
    // The itemized breakdown round-trips as an ordered list.
    assert_eq!(
        row.get("items").cloned(),
        Some(json!(["Seragam", "Buku paket"]))
    );
}

#[test]
fn missing_required_fields_fail_before_any_insert() {
    let workspace = temp_dir("sekolahd-tuition-missing");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "biaya.create",
        json!({ "record": { "title": "Tanpa harga" } }),
    );
    assert_eq!(code, "validation_failed");

    let _ = request_ok(&mut stdin, &mut reader, "3", "biaya.load", json!({}));
    let view = request_ok(&mut stdin, &mut reader, "4", "biaya.view", json!({}));
    assert_eq!(view.get("totalFiltered").and_then(|v| v.as_u64()), Some(0));
}
