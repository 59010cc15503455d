mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn testimonials_cannot_be_authored_from_the_dashboard() {
    let workspace = temp_dir("sekolahd-testimoni");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let record = json!({
        "record": {
            "name": "Orang Tua Siswa",
            "posisi": "Wali murid",
            "rating": 5,
            "pesan": "Sekolah yang luar biasa."
        }
    });
    let code = request_err(&mut stdin, &mut reader, "2", "testimoni.create", record.clone());
    assert_eq!(code, "read_only");

    let mut update = record;
    update["id"] = json!("any-id");
    let code = request_err(&mut stdin, &mut reader, "3", "testimoni.update", update);
    assert_eq!(code, "read_only");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "form.open",
        json!({ "resource": "testimoni", "mode": "create" }),
    );
    assert_eq!(code, "read_only");

    // Listing still works; the collection is just empty here.
    let _ = request_ok(&mut stdin, &mut reader, "5", "testimoni.load", json!({}));
    let view = request_ok(&mut stdin, &mut reader, "6", "testimoni.view", json!({}));
    assert_eq!(view.get("totalFiltered").and_then(|v| v.as_u64()), Some(0));
}
