mod test_support;

use rusqlite::Connection;
use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn rejected_writes_leave_the_cached_view_untouched() {
    let workspace = temp_dir("sekolahd-store-failure");
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
        "alumni.create",
        json!({
            "record": {
                "nama": "Budi",
                "jurusan": "IPA",
                "jalur": "SNBT",
                "universitas": "UI",
                "angkatan": "2023"
            }
        }),
    );
    let id = created
        .get("id")
        .and_then(|v| v.as_str())
        .expect("id")
        .to_string();

    let _ = request_ok(&mut stdin, &mut reader, "3", "alumni.load", json!({}));
    let before = request_ok(&mut stdin, &mut reader, "4", "alumni.view", json!({}));
    assert_eq!(before.get("totalFiltered").and_then(|v| v.as_u64()), Some(1));

    // Pull the table out from under the daemon.
    let conn = Connection::open(workspace.join("sekolah.sqlite3")).expect("open store");
    conn.execute("DROP TABLE alumni", []).expect("drop table");
    drop(conn);

    let code = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "alumni.create",
        json!({
            "record": {
                "nama": "Sari",
                "jurusan": "IPS",
                "jalur": "MANDIRI",
                "universitas": "UGM",
                "angkatan": "2022"
            }
        }),
    );
    assert_eq!(code, "db_insert_failed");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "alumni.update",
        json!({
            "id": id,
            "record": {
                "nama": "Budi",
                "jurusan": "IPA",
                "jalur": "SNBT",
                "universitas": "ITB",
                "angkatan": "2023"
            }
        }),
    );
    assert_eq!(code, "db_update_failed");

    // The cached view still answers exactly as before the failures.
    let after = request_ok(&mut stdin, &mut reader, "7", "alumni.view", json!({}));
    assert_eq!(after, before);
}
