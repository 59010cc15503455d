use std::path::PathBuf;

use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::handlers::resources;
use crate::ipc::types::{AppState, FormMode, FormState, Request};
use crate::resource::{self, ResourceSpec};
use crate::storage;
use serde_json::{json, Map, Value};

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(spec) = req
        .params
        .get("resource")
        .and_then(|v| v.as_str())
        .and_then(resource::find)
    else {
        return err(&req.id, "bad_params", "missing or unknown resource", None);
    };
    if spec.read_only {
        return err(
            &req.id,
            "read_only",
            format!("{} records are submitted from the public site", spec.name),
            None,
        );
    }

    let mode = match req.params.get("mode").and_then(|v| v.as_str()) {
        Some("create") => FormMode::Create,
        Some("edit") => FormMode::Edit,
        _ => return err(&req.id, "bad_params", "mode must be create or edit", None),
    };

    let (record_id, fields, existing_image) = match mode {
        FormMode::Create => (None, Map::new(), None),
        FormMode::Edit => {
            let Some(id) = req.params.get("recordId").and_then(|v| v.as_str()) else {
                return err(&req.id, "bad_params", "missing recordId", None);
            };
            let Some(conn) = state.db.as_ref() else {
                return err(&req.id, "no_workspace", "select a workspace first", None);
            };
            let row = match resources::fetch_one(conn, spec, id) {
                Ok(Some(row)) => row,
                Ok(None) => {
                    return err(&req.id, "not_found", format!("{} not found", spec.name), None)
                }
                Err(e) => return e.response(&req.id),
            };
            let mut fields = Map::new();
            for field in spec.fields {
                if let Some(value) = row.get(field.name) {
                    fields.insert(field.name.to_string(), value.clone());
                }
            }
            let existing_image = spec
                .image_field()
                .and_then(|f| row.get(f))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from);
            (Some(id.to_string()), fields, existing_image)
        }
    };

    let form = FormState {
        resource: spec.name,
        mode,
        record_id,
        fields,
        staged_file: None,
        existing_image,
        submitting: false,
    };
    let snapshot = form_snapshot(&form);
    state.form = Some(form);
    ok(&req.id, snapshot)
}

fn handle_set_field(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(form) = state.form.as_mut() else {
        return err(&req.id, "no_form", "no form is open", None);
    };
    let Some(name) = req.params.get("name").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing name", None);
    };
    let spec = spec_of(form);
    if !spec.fields.iter().any(|f| f.name == name) {
        return err(
            &req.id,
            "bad_params",
            format!("unknown field: {}", name),
            None,
        );
    }
    // Staged as-is; validation waits for submit.
    let value = req.params.get("value").cloned().unwrap_or(Value::Null);
    form.fields.insert(name.to_string(), value);
    ok(&req.id, json!({ "ok": true }))
}

fn handle_attach_file(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(form) = state.form.as_mut() else {
        return err(&req.id, "no_form", "no form is open", None);
    };
    let spec = spec_of(form);
    if spec.image_bucket.is_none() {
        return err(
            &req.id,
            "bad_params",
            format!("{} does not take an image", spec.name),
            None,
        );
    }
    let Some(path) = req.params.get("path").and_then(|v| v.as_str()).map(PathBuf::from)
    else {
        return err(&req.id, "bad_params", "missing path", None);
    };

    let size = match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => return err(&req.id, "bad_params", "file not readable", None),
    };
    if size > storage::MAX_UPLOAD_BYTES {
        // Rejected outright; the previous attachment (if any) stays staged.
        return err(
            &req.id,
            "file_too_large",
            "attachments are limited to 100 MiB",
            Some(json!({ "size": size, "max": storage::MAX_UPLOAD_BYTES })),
        );
    }

    // Local preview, no storage round trip.
    let preview = path.to_string_lossy().to_string();
    form.staged_file = Some(path);
    ok(&req.id, json!({ "preview": preview }))
}

fn handle_remove_attachment(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(form) = state.form.as_mut() else {
        return err(&req.id, "no_form", "no form is open", None);
    };
    form.staged_file = None;
    // Preview falls back to the record's stored image in edit mode.
    ok(&req.id, json!({ "preview": form.existing_image }))
}

fn handle_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.form.as_ref() {
        Some(form) => ok(&req.id, form_snapshot(form)),
        None => ok(&req.id, json!({ "open": false })),
    }
}

fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(mut form) = state.form.take() else {
        return err(&req.id, "no_form", "no form is open", None);
    };
    match try_submit(state, &mut form) {
        // Success is the only path that clears the staged fields.
        Ok(result) => ok(&req.id, result),
        Err(e) => {
            form.submitting = false;
            state.form = Some(form);
            e.response(&req.id)
        }
    }
}

fn try_submit(state: &mut AppState, form: &mut FormState) -> Result<Value, HandlerErr> {
    form.submitting = true;
    let spec = spec_of(form);
    let is_create = form.mode == FormMode::Create;

    // Validation first: a missing field must fail before any storage work.
    let record = Value::Object(form.fields.clone());
    resource::validate(spec, &record, is_create, form.staged_file.is_some()).map_err(
        |failure| {
            HandlerErr::with_details(
                "validation_failed",
                "record is incomplete or invalid",
                failure.details(),
            )
        },
    )?;

    if let Some(src) = form.staged_file.clone() {
        let Some(bucket) = spec.image_bucket else {
            return Err(HandlerErr::new(
                "bad_params",
                format!("{} does not take an image", spec.name),
            ));
        };
        let Some(workspace) = state.workspace.clone() else {
            return Err(HandlerErr::new("no_workspace", "select a workspace first"));
        };
        let name = storage::object_name(&src);
        // Upload before the row mutation: a failure here aborts the whole
        // submit, so no record is ever written without its intended image.
        storage::store(&workspace, bucket, &name, &src)
            .map_err(|e| HandlerErr::new("upload_failed", e.to_string()))?;
        if let Some(image_field) = spec.image_field() {
            form.fields.insert(
                image_field.to_string(),
                Value::String(storage::public_url(bucket, &name)),
            );
        }
    }

    let record = Value::Object(form.fields.clone());
    match form.mode {
        FormMode::Create => {
            let id = resources::create_record(state, spec, &record)?;
            Ok(json!({ "id": id }))
        }
        FormMode::Edit => {
            let id = form
                .record_id
                .clone()
                .ok_or_else(|| HandlerErr::new("bad_params", "form has no record id"))?;
            resources::update_record(state, spec, &id, &record)?;
            Ok(json!({ "id": id }))
        }
    }
}

fn spec_of(form: &FormState) -> &'static ResourceSpec {
    // The resource name was resolved through `find` when the form opened.
    resource::find(form.resource).unwrap_or(&resource::RESOURCES[0])
}

fn form_snapshot(form: &FormState) -> Value {
    let preview = form
        .staged_file
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .or_else(|| form.existing_image.clone());
    json!({
        "open": true,
        "resource": form.resource,
        "mode": match form.mode {
            FormMode::Create => "create",
            FormMode::Edit => "edit",
        },
        "recordId": form.record_id,
        "fields": form.fields,
        "preview": preview,
        "submitting": form.submitting,
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "form.open" => Some(handle_open(state, req)),
        "form.setField" => Some(handle_set_field(state, req)),
        "form.attachFile" => Some(handle_attach_file(state, req)),
        "form.removeAttachment" => Some(handle_remove_attachment(state, req)),
        "form.state" => Some(handle_state(state, req)),
        "form.submit" => Some(handle_submit(state, req)),
        _ => None,
    }
}
