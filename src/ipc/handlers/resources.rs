use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::listview::ListView;
use crate::resource::{self, ResourceSpec};
use rusqlite::{params_from_iter, Connection};
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let (prefix, op) = req.method.split_once('.')?;
    let spec = resource::find(prefix)?;
    Some(match op {
        "load" => handle_load(state, req, spec),
        "view" => handle_view(state, req, spec),
        "setSearch" => handle_set_search(state, req, spec),
        "setCategory" => handle_set_category(state, req, spec),
        "setPage" => handle_set_page(state, req, spec),
        "create" => handle_create(state, req, spec),
        "update" => handle_update(state, req, spec),
        "delete" => handle_delete(state, req, spec),
        _ => return None,
    })
}

fn view_for<'a>(state: &'a mut AppState, spec: &ResourceSpec) -> &'a mut ListView {
    state
        .views
        .entry(spec.name)
        .or_insert_with(|| ListView::new(spec.page_size))
}

fn now_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Newest first; rowid breaks creation-stamp ties so a reload never
/// reshuffles rows inserted in the same second.
pub(crate) fn fetch_all(
    conn: &Connection,
    spec: &ResourceSpec,
) -> Result<Vec<Value>, HandlerErr> {
    let field_names: Vec<&str> = spec.fields.iter().map(|f| f.name).collect();
    let sql = format!(
        "SELECT id, {}, created_at FROM {} ORDER BY created_at DESC, rowid DESC",
        field_names.join(", "),
        spec.table
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))?;
    let created_at_idx = spec.fields.len() + 1;
    stmt.query_map([], |row| {
        let mut obj = Map::new();
        obj.insert("id".to_string(), Value::String(row.get(0)?));
        for (i, field) in spec.fields.iter().enumerate() {
            let value = match field.kind {
                resource::FieldKind::Integer { .. } => row
                    .get::<_, Option<i64>>(i + 1)?
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                resource::FieldKind::Items => row
                    .get::<_, Option<String>>(i + 1)?
                    .and_then(|s| serde_json::from_str(&s).ok())
                    .unwrap_or_else(|| json!([])),
                _ => Value::String(row.get::<_, Option<String>>(i + 1)?.unwrap_or_default()),
            };
            obj.insert(field.name.to_string(), value);
        }
        obj.insert(
            "created_at".to_string(),
            Value::String(row.get(created_at_idx)?),
        );
        Ok(Value::Object(obj))
    })
    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    .map_err(|e| HandlerErr::new("db_query_failed", e.to_string()))
}

pub(crate) fn fetch_one(
    conn: &Connection,
    spec: &ResourceSpec,
    id: &str,
) -> Result<Option<Value>, HandlerErr> {
    // Single-row lookups reuse the list shape so staged forms and cached
    // rows agree field for field.
    let rows = fetch_all(conn, spec)?;
    Ok(rows
        .into_iter()
        .find(|row| row.get("id").and_then(|v| v.as_str()) == Some(id)))
}

fn handle_load(state: &mut AppState, req: &Request, spec: &ResourceSpec) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let fetched = {
        let view = state
            .views
            .entry(spec.name)
            .or_insert_with(|| ListView::new(spec.page_size));
        view.loading = true;
        let fetched = fetch_all(conn, spec);
        // Cleared on every exit, success or failure.
        view.loading = false;
        fetched
    };
    match fetched {
        Ok(rows) => {
            let count = rows.len();
            let view = view_for(state, spec);
            view.items = rows;
            ok(&req.id, json!({ "count": count }))
        }
        // Cache left as it was.
        Err(e) => e.response(&req.id),
    }
}

fn handle_view(state: &mut AppState, req: &Request, spec: &ResourceSpec) -> serde_json::Value {
    let searchable = spec.searchable_fields();
    let view = view_for(state, spec);
    let visible = view.compute_visible(&searchable, spec.category_field);
    ok(
        &req.id,
        json!({
            "items": visible.page_items,
            "totalFiltered": visible.total_filtered,
            "totalPages": visible.total_pages,
            "page": view.current_page,
            "pageSize": view.page_size,
            "search": view.search_text,
            "category": view.category_filter,
        }),
    )
}

fn handle_set_search(
    state: &mut AppState,
    req: &Request,
    spec: &ResourceSpec,
) -> serde_json::Value {
    let Some(text) = req.params.get("text").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing text", None);
    };
    let view = view_for(state, spec);
    view.set_search_text(text);
    ok(&req.id, json!({ "page": view.current_page }))
}

fn handle_set_category(
    state: &mut AppState,
    req: &Request,
    spec: &ResourceSpec,
) -> serde_json::Value {
    let Some(value) = req.params.get("value").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing value", None);
    };
    let view = view_for(state, spec);
    view.set_category_filter(value);
    ok(&req.id, json!({ "page": view.current_page }))
}

fn handle_set_page(
    state: &mut AppState,
    req: &Request,
    spec: &ResourceSpec,
) -> serde_json::Value {
    let Some(page) = req.params.get("page").and_then(|v| v.as_u64()) else {
        return err(&req.id, "bad_params", "missing page", None);
    };
    let view = view_for(state, spec);
    view.set_page(page as usize);
    ok(&req.id, json!({ "page": view.current_page }))
}

fn handle_create(state: &mut AppState, req: &Request, spec: &ResourceSpec) -> serde_json::Value {
    if spec.read_only {
        return err(
            &req.id,
            "read_only",
            format!("{} records are submitted from the public site", spec.name),
            None,
        );
    }
    let Some(record) = req.params.get("record").cloned() else {
        return err(&req.id, "bad_params", "missing record", None);
    };
    if let Err(failure) = resource::validate(spec, &record, true, false) {
        return err(
            &req.id,
            "validation_failed",
            "record is incomplete or invalid",
            Some(failure.details()),
        );
    }
    match create_record(state, spec, &record) {
        Ok(id) => ok(&req.id, json!({ "id": id })),
        Err(e) => e.response(&req.id),
    }
}

fn handle_update(state: &mut AppState, req: &Request, spec: &ResourceSpec) -> serde_json::Value {
    if spec.read_only {
        return err(
            &req.id,
            "read_only",
            format!("{} records are submitted from the public site", spec.name),
            None,
        );
    }
    let Some(id) = req.params.get("id").and_then(|v| v.as_str()).map(String::from) else {
        return err(&req.id, "bad_params", "missing id", None);
    };
    let Some(record) = req.params.get("record").cloned() else {
        return err(&req.id, "bad_params", "missing record", None);
    };
    if let Err(failure) = resource::validate(spec, &record, false, false) {
        return err(
            &req.id,
            "validation_failed",
            "record is incomplete or invalid",
            Some(failure.details()),
        );
    }
    match update_record(state, spec, &id, &record) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => e.response(&req.id),
    }
}

fn handle_delete(state: &mut AppState, req: &Request, spec: &ResourceSpec) -> serde_json::Value {
    // Contract: no delete ever reaches the store without an affirmative
    // confirmation from the UI dialog.
    if req.params.get("confirmed").and_then(|v| v.as_bool()) != Some(true) {
        return err(
            &req.id,
            "delete_not_confirmed",
            "delete requires an explicit confirmation",
            None,
        );
    }
    let Some(id) = req.params.get("id").and_then(|v| v.as_str()).map(String::from) else {
        return err(&req.id, "bad_params", "missing id", None);
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let affected = match conn.execute(
        &format!("DELETE FROM {} WHERE id = ?", spec.table),
        [&id],
    ) {
        Ok(n) => n,
        Err(e) => {
            return err(
                &req.id,
                "db_delete_failed",
                e.to_string(),
                Some(json!({ "table": spec.table })),
            )
        }
    };
    if affected == 0 {
        return err(&req.id, "not_found", format!("{} not found", spec.name), None);
    }

    // Known-successful single deletion: drop the cached row, no refetch.
    if let Some(view) = state.views.get_mut(spec.name) {
        view.items.retain(|item| item.get("id").and_then(|v| v.as_str()) != Some(&id));
    }
    ok(&req.id, json!({ "ok": true }))
}

/// Insert then refetch, so ordering always matches the store. Shared with
/// the form submit path.
pub(crate) fn create_record(
    state: &mut AppState,
    spec: &ResourceSpec,
    record: &Value,
) -> Result<String, HandlerErr> {
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };

    let id = Uuid::new_v4().to_string();
    // An explicit stamp is honored so imported rows keep their history.
    let created_at = record
        .get("created_at")
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(now_stamp);

    let mut columns: Vec<&str> = vec!["id"];
    let mut values: Vec<rusqlite::types::Value> =
        vec![rusqlite::types::Value::Text(id.clone())];
    for field in spec.fields {
        columns.push(field.name);
        values.push(resource::to_sql_value(field, record.get(field.name)));
    }
    columns.push("created_at");
    values.push(rusqlite::types::Value::Text(created_at));

    let placeholders = vec!["?"; values.len()].join(", ");
    let sql = format!(
        "INSERT INTO {}({}) VALUES({})",
        spec.table,
        columns.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(values)).map_err(|e| {
        HandlerErr::with_details(
            "db_insert_failed",
            e.to_string(),
            json!({ "table": spec.table }),
        )
    })?;

    let rows = fetch_all(conn, spec)?;
    let view = state
        .views
        .entry(spec.name)
        .or_insert_with(|| ListView::new(spec.page_size));
    view.items = rows;
    Ok(id)
}

/// Update by id, then patch the cached entry in place. Only fields present
/// in the record are written; omitting an optional field leaves the stored
/// value alone instead of clearing it.
pub(crate) fn update_record(
    state: &mut AppState,
    spec: &ResourceSpec,
    id: &str,
    record: &Value,
) -> Result<(), HandlerErr> {
    let Some(conn) = state.db.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };

    let mut sets: Vec<String> = Vec::new();
    let mut values: Vec<rusqlite::types::Value> = Vec::new();
    for field in spec.fields {
        let Some(value) = record.get(field.name) else {
            continue;
        };
        sets.push(format!("{} = ?", field.name));
        values.push(resource::to_sql_value(field, Some(value)));
    }
    if sets.is_empty() {
        return Err(HandlerErr::new("bad_params", "record has no known fields"));
    }
    values.push(rusqlite::types::Value::Text(id.to_string()));

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?",
        spec.table,
        sets.join(", ")
    );
    let affected = conn.execute(&sql, params_from_iter(values)).map_err(|e| {
        HandlerErr::with_details(
            "db_update_failed",
            e.to_string(),
            json!({ "table": spec.table }),
        )
    })?;
    if affected == 0 {
        return Err(HandlerErr::new(
            "not_found",
            format!("{} not found", spec.name),
        ));
    }

    if let Some(view) = state.views.get_mut(spec.name) {
        if let Some(item) = view
            .items
            .iter_mut()
            .find(|item| item.get("id").and_then(|v| v.as_str()) == Some(id))
        {
            for field in spec.fields {
                if let Some(value) = record.get(field.name) {
                    item[field.name] = resource::to_cache_value(field, Some(value));
                }
            }
        }
    }
    Ok(())
}
