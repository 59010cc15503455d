use serde_json::{json, Value};

/// How a resource column is stored and validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    /// Stored INTEGER. `positive` rejects values <= 0 before any db work.
    Integer { positive: bool },
    /// Public URL of an uploaded asset.
    Image,
    /// Ordered list of free-text strings, stored as a JSON array.
    Items,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub searchable: bool,
}

/// One managed collection: schema, list-view parameters, and the rules the
/// form/create paths enforce. Every resource handler is parameterized over
/// this instead of being written out per table.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    /// Method prefix on the wire ("alumni.load" etc.).
    pub name: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    pub page_size: usize,
    /// Field whose value the category dropdown filters on, if any.
    pub category_field: Option<&'static str>,
    /// Collections authored elsewhere: list/delete only here.
    pub read_only: bool,
    /// Asset bucket for the image field, when the resource carries one.
    pub image_bucket: Option<&'static str>,
    /// Create must carry an image; edits may keep the previous one.
    pub image_required_on_create: bool,
}

const fn text(name: &'static str, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
        required,
        searchable: true,
    }
}

pub const RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        name: "alumni",
        table: "alumni",
        fields: &[
            text("nama", true),
            text("jurusan", true),
            text("jalur", true),
            text("universitas", true),
            // Cohort year is free-form in the source data, so it stays text.
            text("angkatan", true),
        ],
        page_size: 10,
        category_field: Some("angkatan"),
        read_only: false,
        image_bucket: None,
        image_required_on_create: false,
    },
    ResourceSpec {
        name: "berita",
        table: "berita",
        fields: &[
            text("judul", true),
            text("isi", true),
            text("penulis", true),
            FieldSpec {
                name: "image_url",
                kind: FieldKind::Image,
                required: false,
                searchable: false,
            },
        ],
        page_size: 7,
        category_field: None,
        read_only: false,
        image_bucket: Some("berita-images"),
        image_required_on_create: false,
    },
    ResourceSpec {
        name: "testimoni",
        table: "testimoni",
        fields: &[
            text("name", true),
            text("posisi", true),
            FieldSpec {
                name: "rating",
                kind: FieldKind::Integer { positive: true },
                required: true,
                searchable: false,
            },
            text("pesan", true),
        ],
        page_size: 7,
        category_field: None,
        // Submitted from the public site; the dashboard only reads and prunes.
        read_only: true,
        image_bucket: None,
        image_required_on_create: false,
    },
    ResourceSpec {
        name: "universitas",
        table: "universitas",
        fields: &[
            text("nama", true),
            FieldSpec {
                name: "logo_url",
                kind: FieldKind::Image,
                required: false,
                searchable: false,
            },
        ],
        page_size: 7,
        category_field: None,
        read_only: false,
        image_bucket: Some("universitas-images"),
        image_required_on_create: false,
    },
    ResourceSpec {
        name: "program",
        table: "program_unggulan",
        fields: &[
            text("nama_program", true),
            text("deskripsi", true),
            FieldSpec {
                name: "foto_url",
                kind: FieldKind::Image,
                required: false,
                searchable: false,
            },
        ],
        page_size: 7,
        category_field: None,
        read_only: false,
        image_bucket: Some("program-images"),
        image_required_on_create: false,
    },
    ResourceSpec {
        name: "biaya",
        table: "biaya_pendidikan",
        fields: &[
            text("title", true),
            FieldSpec {
                name: "price",
                kind: FieldKind::Integer { positive: true },
                required: true,
                searchable: true,
            },
            text("description", true),
            FieldSpec {
                name: "items",
                kind: FieldKind::Items,
                required: false,
                searchable: false,
            },
        ],
        page_size: 7,
        category_field: None,
        read_only: false,
        image_bucket: None,
        image_required_on_create: false,
    },
    ResourceSpec {
        name: "karya_tulis",
        table: "karya_tulis",
        fields: &[
            text("title", true),
            text("description", true),
            text("author", true),
            text("category", true),
            FieldSpec {
                name: "image_url",
                kind: FieldKind::Image,
                required: false,
                searchable: false,
            },
        ],
        page_size: 7,
        category_field: None,
        read_only: false,
        image_bucket: Some("karya-tulis-images"),
        image_required_on_create: true,
    },
];

pub fn find(name: &str) -> Option<&'static ResourceSpec> {
    RESOURCES.iter().find(|r| r.name == name)
}

impl ResourceSpec {
    pub fn searchable_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.searchable)
            .map(|f| f.name)
            .collect()
    }

    pub fn image_field(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| f.kind == FieldKind::Image)
            .map(|f| f.name)
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ValidationFailure {
    pub missing: Vec<&'static str>,
    pub invalid: Vec<(&'static str, String)>,
}

impl ValidationFailure {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    pub fn details(&self) -> Value {
        json!({
            "missing": self.missing,
            "invalid": self.invalid
                .iter()
                .map(|(field, reason)| json!({ "field": field, "reason": reason }))
                .collect::<Vec<_>>(),
        })
    }
}

/// Checked before anything touches the store. `image_pending` marks a staged
/// upload that will fill the image field during submit.
pub fn validate(
    spec: &ResourceSpec,
    record: &Value,
    is_create: bool,
    image_pending: bool,
) -> Result<(), ValidationFailure> {
    let mut failure = ValidationFailure::default();

    for field in spec.fields {
        let value = record.get(field.name);
        match field.kind {
            FieldKind::Text => {
                let present = text_value(value).map(|s| !s.trim().is_empty()).unwrap_or(false);
                if field.required && !present {
                    failure.missing.push(field.name);
                }
            }
            FieldKind::Integer { positive } => match integer_value(value) {
                Some(n) => {
                    if positive && n <= 0 {
                        failure
                            .invalid
                            .push((field.name, "must be a positive integer".to_string()));
                    }
                }
                None => {
                    if field.required {
                        failure.missing.push(field.name);
                    } else if value.map(|v| !v.is_null()).unwrap_or(false) {
                        failure
                            .invalid
                            .push((field.name, "must be an integer".to_string()));
                    }
                }
            },
            FieldKind::Image => {
                let present = value
                    .and_then(|v| v.as_str())
                    .map(|s| !s.trim().is_empty())
                    .unwrap_or(false);
                if is_create && spec.image_required_on_create && !present && !image_pending {
                    failure.missing.push(field.name);
                }
            }
            FieldKind::Items => {
                if let Some(v) = value {
                    if !v.is_null() && items_value(v).is_none() {
                        failure
                            .invalid
                            .push((field.name, "must be a list of strings".to_string()));
                    }
                }
            }
        }
    }

    if failure.is_empty() {
        Ok(())
    } else {
        Err(failure)
    }
}

/// JSON field -> SQLite value, after validation has passed.
pub fn to_sql_value(field: &FieldSpec, value: Option<&Value>) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match field.kind {
        FieldKind::Text | FieldKind::Image => {
            Sql::Text(text_value(value).unwrap_or_default())
        }
        FieldKind::Integer { .. } => match integer_value(value) {
            Some(n) => Sql::Integer(n),
            None => Sql::Null,
        },
        FieldKind::Items => {
            let items = value.and_then(items_value).unwrap_or_default();
            Sql::Text(serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string()))
        }
    }
}

/// JSON field -> the canonical shape cached rows use, matching what a
/// fresh fetch would produce for the same stored value.
pub fn to_cache_value(field: &FieldSpec, value: Option<&Value>) -> Value {
    match field.kind {
        FieldKind::Text | FieldKind::Image => {
            Value::String(text_value(value).unwrap_or_default())
        }
        FieldKind::Integer { .. } => match integer_value(value) {
            Some(n) => Value::from(n),
            None => Value::Null,
        },
        FieldKind::Items => {
            let items = value.and_then(items_value).unwrap_or_default();
            Value::Array(items.into_iter().map(Value::String).collect())
        }
    }
}

/// Numbers are accepted wherever the UI sends free-form text (cohort years).
fn text_value(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn integer_value(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn items_value(value: &Value) -> Option<Vec<String>> {
    let arr = value.as_array()?;
    arr.iter()
        .map(|v| v.as_str().map(|s| s.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tuition_price_must_be_positive() {
        let spec = find("biaya").unwrap();
        let base = |price: i64| {
            json!({ "title": "Gelombang 1", "price": price, "description": "SPP", "items": ["Seragam"] })
        };

        assert!(validate(spec, &base(1), true, false).is_ok());

        let zero = validate(spec, &base(0), true, false).unwrap_err();
        assert!(zero.invalid.iter().any(|(f, _)| *f == "price"));
        let negative = validate(spec, &base(-5), true, false).unwrap_err();
        assert!(negative.invalid.iter().any(|(f, _)| *f == "price"));
    }

    #[test]
    fn missing_required_fields_are_reported_by_name() {
        let spec = find("alumni").unwrap();
        let failure = validate(spec, &json!({ "nama": "Budi" }), true, false).unwrap_err();
        assert_eq!(
            failure.missing,
            vec!["jurusan", "jalur", "universitas", "angkatan"]
        );
    }

    #[test]
    fn written_work_image_required_only_on_create() {
        let spec = find("karya_tulis").unwrap();
        let record = json!({
            "title": "Esai",
            "description": "Tentang sekolah",
            "author": "Siswa A",
            "category": "student",
        });

        let failure = validate(spec, &record, true, false).unwrap_err();
        assert_eq!(failure.missing, vec!["image_url"]);

        // A staged upload satisfies the requirement before the copy happens.
        assert!(validate(spec, &record, true, true).is_ok());
        // Edits may keep the previous image.
        assert!(validate(spec, &record, false, false).is_ok());
    }

    #[test]
    fn numeric_cohort_year_coerces_to_text() {
        let field = text("angkatan", true);
        let value = json!(2023);
        assert_eq!(
            to_sql_value(&field, Some(&value)),
            rusqlite::types::Value::Text("2023".to_string())
        );
    }
}
