use crate::analytics::month_buckets;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::resource;
use serde_json::{json, Map, Value};

fn handle_monthly(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(spec) = req
        .params
        .get("resource")
        .and_then(|v| v.as_str())
        .and_then(resource::find)
    else {
        return err(&req.id, "bad_params", "missing or unknown resource", None);
    };

    let mut stmt = match conn.prepare(&format!("SELECT created_at FROM {}", spec.table)) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let stamps = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());
    let stamps = match stamps {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let buckets = month_buckets(stamps.iter().map(|s| s.as_str()));
    ok(
        &req.id,
        json!({ "resource": spec.name, "buckets": buckets }),
    )
}

/// Row counts per resource, for the dashboard cards.
fn handle_totals(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let mut totals = Map::new();
    for spec in resource::RESOURCES {
        let count: Result<i64, _> = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", spec.table),
            [],
            |row| row.get(0),
        );
        match count {
            Ok(n) => {
                totals.insert(spec.name.to_string(), Value::from(n));
            }
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        }
    }
    ok(&req.id, json!({ "totals": totals }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.monthly" => Some(handle_monthly(state, req)),
        "analytics.totals" => Some(handle_totals(state, req)),
        _ => None,
    }
}
