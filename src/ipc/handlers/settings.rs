use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const KEY_MAINTENANCE: &str = "maintenance";

fn handle_maintenance_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match db::kv_get(conn, "pengaturan", KEY_MAINTENANCE) {
        Ok(value) => ok(
            &req.id,
            json!({ "enabled": value.map(|v| v == "true").unwrap_or(false) }),
        ),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_maintenance_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(enabled) = req.params.get("enabled").and_then(|v| v.as_bool()) else {
        return err(&req.id, "bad_params", "missing enabled", None);
    };
    let value = if enabled { "true" } else { "false" };
    match db::kv_set(conn, "pengaturan", KEY_MAINTENANCE, value) {
        Ok(()) => ok(&req.id, json!({ "enabled": enabled })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "maintenance.get" => Some(handle_maintenance_get(state, req)),
        "maintenance.set" => Some(handle_maintenance_set(state, req)),
        _ => None,
    }
}
