use crate::auth;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const KEY_LOGGED_IN: &str = "isLoggedIn";
const KEY_USERNAME: &str = "username";

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let username = req.params.get("username").and_then(|v| v.as_str());
    let password = req.params.get("password").and_then(|v| v.as_str());
    let (Some(username), Some(password)) = (username, password) else {
        return err(&req.id, "bad_params", "missing username or password", None);
    };

    let Some(principal) = auth::verify(username, password) else {
        return err(
            &req.id,
            "invalid_credentials",
            "invalid username or password",
            None,
        );
    };

    if let Err(e) = db::kv_set(conn, "session", KEY_LOGGED_IN, "true")
        .and_then(|_| db::kv_set(conn, "session", KEY_USERNAME, &principal.username))
    {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "username": principal.username }))
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match session_snapshot(conn) {
        Ok((authenticated, username)) => ok(
            &req.id,
            json!({ "authenticated": authenticated, "username": username }),
        ),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    if let Err(e) = db::kv_remove(conn, "session", KEY_LOGGED_IN)
        .and_then(|_| db::kv_remove(conn, "session", KEY_USERNAME))
    {
        return err(&req.id, "db_delete_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "ok": true }))
}

/// Re-evaluated from the store on every navigation; a logout between two
/// guard calls must be observed, so nothing is cached here.
fn handle_guard(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let view = req
        .params
        .get("view")
        .and_then(|v| v.as_str())
        .unwrap_or("dashboard");
    match session_snapshot(conn) {
        Ok((true, _)) => ok(&req.id, json!({ "allow": true, "view": view })),
        Ok((false, _)) => ok(&req.id, json!({ "allow": false, "redirect": "login" })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn session_snapshot(conn: &rusqlite::Connection) -> anyhow::Result<(bool, Option<String>)> {
    let logged_in = db::kv_get(conn, "session", KEY_LOGGED_IN)?
        .map(|v| v == "true")
        .unwrap_or(false);
    let username = db::kv_get(conn, "session", KEY_USERNAME)?;
    Ok((logged_in, username))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(handle_login(state, req)),
        "session.get" => Some(handle_get(state, req)),
        "session.logout" => Some(handle_logout(state, req)),
        "session.guard" => Some(handle_guard(state, req)),
        _ => None,
    }
}
