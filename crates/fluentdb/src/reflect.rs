//! Model reflection: turns a [`Model`] instance into a [`Table`] description.
//!
//! Field attributes come from the `model` tag mini-language:
//!
//! ```text
//! type:serial,primary;ref:users;cascade:delete;rel:Post;name:created_on;table:users
//! ```
//!
//! `;` separates groups, `:` separates a key from its comma-separated values.

use crate::error::{OrmError, OrmResult};
use crate::model::{Entity, Model, Schema};
use crate::value::{Kind, Value};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const TAG_TYPE: &str = "type";
pub const TAG_REF: &str = "ref";
pub const TAG_CASCADE: &str = "cascade";
pub const TAG_RELATION: &str = "rel";
pub const TAG_NAME: &str = "name";
pub const TAG_TABLE: &str = "table";

const TYPE_PRIMARY: &str = "primary";
const TYPE_SERIAL: &str = "serial";

/// One mapped field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Column {
    /// Rust field identifier.
    pub key: String,
    /// Database column name.
    pub name: String,
    pub primary: bool,
    pub serial: bool,
    /// Type and constraint tokens, e.g. `SERIAL PRIMARY KEY `.
    pub types: String,
    /// Foreign key clause, e.g. `REFERENCES users (id) ON DELETE CASCADE `.
    pub reference: String,
    /// Snake-cased relation target.
    pub relation: String,
    pub is_zero: bool,
    pub has_value: bool,
}

impl Column {
    /// Columns that never carry insertable/updatable data.
    pub fn is_not_data(&self) -> bool {
        !self.has_value || !self.relation.is_empty() || !self.reference.is_empty()
    }

    pub fn is_relation(&self) -> bool {
        !self.relation.is_empty()
    }
}

/// Reflected table description of a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primaries: Vec<Column>,
    pub primary_serial: Option<Column>,
    /// Column name to current value; `Null` when no usable value exists.
    pub values: HashMap<String, Value>,
    pub relation: Vec<Table>,
    pub has_data: bool,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn value(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&Value::Null)
    }

    /// Columns backed by a real table column (relations excluded).
    pub fn data_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_relation())
    }

    /// Primary columns holding a usable, non-zero value.
    pub fn present_primaries(&self) -> impl Iterator<Item = &Column> {
        self.primaries
            .iter()
            .filter(|c| c.has_value && !c.is_zero)
    }

    /// Map a column name back to its Rust field key.
    pub fn key_of(&self, name: &str) -> Option<&str> {
        self.column(name).map(|c| c.key.as_str())
    }
}

/// Reflect a live model instance.
pub fn reflect(model: &dyn Model) -> OrmResult<Table> {
    build_table(model.schema(), &model.values(), Some(model))
}

/// Reflect a model type without an instance; every value is reported unusable.
pub fn reflect_type<E: Entity>() -> OrmResult<Table> {
    build_table(E::descriptor(), &[], None)
}

fn build_table(schema: &Schema, live: &[Value], model: Option<&dyn Model>) -> OrmResult<Table> {
    let mut table = Table {
        name: snake_case(schema.name),
        ..Table::default()
    };

    // A live vector of a different shape than the type cannot be indexed safely.
    let live_matches = live.len() == schema.fields.len();

    for (idx, field) in schema.fields.iter().enumerate() {
        let attrs = read_tags(field.tag);

        if field.kind == Kind::Metadata {
            if let Some(name) = attrs.get(TAG_TABLE).and_then(|v| v.first()) {
                table.name = name.clone();
            }
            continue;
        }

        let types = attrs.get(TAG_TYPE).map(Vec::as_slice).unwrap_or_default();
        let is_primary = types.iter().any(|t| t == TYPE_PRIMARY);
        let is_serial = types.iter().any(|t| t == TYPE_SERIAL);

        let name = attrs
            .get(TAG_NAME)
            .and_then(|v| v.first())
            .cloned()
            .or_else(|| field.column.map(str::to_string))
            .unwrap_or_else(|| snake_case(field.key));

        let live_value = live_matches.then(|| &live[idx]);

        let mut column = Column {
            key: field.key.to_string(),
            name: name.clone(),
            primary: is_primary,
            serial: is_serial,
            types: get_types(types),
            ..Column::default()
        };

        if field.kind == Kind::Relation {
            let nested = match (live_value, model) {
                (Some(_), Some(model)) => model.relations(field.key),
                _ => Vec::new(),
            };
            column.has_value = live_value.is_some();
            column.is_zero = nested.is_empty();
            column.relation = attrs
                .get(TAG_RELATION)
                .and_then(|v| v.first())
                .map(|target| snake_case(target))
                .unwrap_or_else(|| snake_case(field.key));
            for child in nested {
                table.relation.push(reflect(child)?);
            }
            table.values.insert(name, Value::Null);
        } else {
            let usable = live_value.filter(|value| {
                !is_serial || (field.kind.is_integer() && !value.is_zero())
            });
            match usable {
                Some(value) => {
                    column.has_value = true;
                    column.is_zero = value.is_zero();
                    table.values.insert(name.clone(), value.clone());
                }
                None => {
                    column.has_value = false;
                    column.is_zero = true;
                    table.values.insert(name.clone(), Value::Null);
                }
            }

            if let Some(target) = attrs.get(TAG_REF).and_then(|v| v.first()) {
                column.reference = get_references(target, &name);
                if let Some(rules) = attrs.get(TAG_CASCADE) {
                    column.reference.push_str(&get_cascade(rules));
                }
            }

            if column.has_value && !column.is_zero && column.reference.is_empty() {
                table.has_data = true;
            }
        }

        if column.primary {
            if column.serial {
                table.primary_serial = Some(column.clone());
            }
            table.primaries.push(column.clone());
        }
        table.columns.push(column);
    }

    Ok(table)
}

/// Parse the tag mini-language into key → values.
///
/// A group without `:` yields the key with no values.
pub fn read_tags(tag: &str) -> HashMap<String, Vec<String>> {
    let mut attrs = HashMap::new();
    for group in tag.split(';').map(str::trim).filter(|g| !g.is_empty()) {
        let (key, values) = group.split_once(':').unwrap_or((group, ""));
        let values = values
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        attrs.insert(key.trim().to_string(), values);
    }
    attrs
}

fn get_types(types: &[String]) -> String {
    types
        .iter()
        .map(|t| {
            if t == TYPE_PRIMARY {
                "PRIMARY KEY ".to_string()
            } else {
                format!("{} ", t.to_uppercase())
            }
        })
        .collect()
}

fn get_references(target: &str, column: &str) -> String {
    let ref_column = column
        .split_once('_')
        .map(|(_, rest)| rest)
        .unwrap_or(column);
    format!("REFERENCES {} ({ref_column}) ", snake_case(target))
}

/// `delete` cascades deletes; any other rule cascades updates.
fn get_cascade(rules: &[String]) -> String {
    rules
        .iter()
        .map(|rule| {
            if rule == "delete" {
                "ON DELETE CASCADE "
            } else {
                "ON UPDATE CASCADE "
            }
        })
        .collect()
}

fn word_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("(.)([A-Z][a-z]+)").expect("invalid built-in snake case regex"))
}

fn camel_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("([a-z0-9])([A-Z])").expect("invalid built-in snake case regex"))
}

/// `CreatedAt` → `created_at`, `HTTPServer` → `http_server`.
pub fn snake_case(s: &str) -> String {
    let pass = word_start().replace_all(s, "${1}_${2}");
    let pass = camel_boundary().replace_all(&pass, "${1}_${2}");
    pass.to_lowercase()
}

/// Reflect `model` and require at least one real column.
pub(crate) fn reflect_columns(model: &dyn Model) -> OrmResult<Table> {
    let table = reflect(model)?;
    if table.data_columns().next().is_none() {
        return Err(OrmError::shape(format!(
            "{} maps no columns",
            model.schema().name
        )));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDef;
    use proptest::prelude::*;

    /// Hand-written model whose live values can be made shorter than its schema.
    #[derive(Default)]
    struct Partial {
        id: i64,
        name: String,
        truncate: bool,
    }

    static PARTIAL_FIELDS: [FieldDef; 3] = [
        FieldDef::new("meta", Kind::Metadata).tag("table:partials"),
        FieldDef::new("id", Kind::I64).tag("type:serial,primary"),
        FieldDef::new("name", Kind::String).column("display_name"),
    ];

    static PARTIAL: Schema = Schema {
        name: "Partial",
        fields: &PARTIAL_FIELDS,
    };

    impl Model for Partial {
        fn schema(&self) -> &'static Schema {
            &PARTIAL
        }

        fn values(&self) -> Vec<Value> {
            let mut values = vec![
                Value::Null,
                Value::I64(self.id),
                Value::String(self.name.clone()),
            ];
            if self.truncate {
                values.pop();
            }
            values
        }

        fn assign(&mut self, key: &str, value: Value) -> OrmResult<()> {
            use crate::value::FieldType;
            match key {
                "id" => self.id = i64::from_value(value)?,
                "name" => self.name = String::from_value(value)?,
                _ => return Err(OrmError::conversion(key, "unknown field")),
            }
            Ok(())
        }

        fn relations(&self, _: &str) -> Vec<&dyn Model> {
            Vec::new()
        }
    }

    #[test]
    fn reflects_names_and_flags() {
        let model = Partial {
            id: 3,
            name: "Ann".into(),
            truncate: false,
        };
        let table = reflect(&model).unwrap();

        assert_eq!(table.name, "partials");
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.values.len(), table.columns.len());
        assert_eq!(table.columns[0].types, "SERIAL PRIMARY KEY ");
        assert_eq!(table.columns[1].name, "display_name");
        assert_eq!(table.primaries.len(), 1);
        assert_eq!(table.primary_serial.as_ref().map(|c| c.key.as_str()), Some("id"));
        assert_eq!(table.value("id"), &Value::I64(3));
        assert!(table.has_data);
    }

    #[test]
    fn zero_serial_primary_is_unusable() {
        let model = Partial {
            id: 0,
            name: "Ann".into(),
            truncate: false,
        };
        let table = reflect(&model).unwrap();
        let id = table.column("id").unwrap();
        assert!(!id.has_value);
        assert!(id.is_not_data());
        assert_eq!(table.value("id"), &Value::Null);
    }

    #[test]
    fn field_count_mismatch_yields_invalid_values() {
        let model = Partial {
            id: 9,
            name: "Ann".into(),
            truncate: true,
        };
        let table = reflect(&model).unwrap();

        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.values.len(), 2);
        assert!(table.columns.iter().all(|c| !c.has_value && c.is_zero));
        assert!(table.values.values().all(Value::is_null));
        assert!(!table.has_data);
    }

    #[test]
    fn reads_tag_groups() {
        let tags = read_tags("type:varchar(255),not null; ref:users ;cascade:delete;flag");
        assert_eq!(tags["type"], vec!["varchar(255)", "not null"]);
        assert_eq!(tags["ref"], vec!["users"]);
        assert_eq!(tags["cascade"], vec!["delete"]);
        assert!(tags["flag"].is_empty());
        assert!(read_tags("").is_empty());
    }

    #[test]
    fn builds_reference_clauses() {
        assert_eq!(get_references("users", "user_id"), "REFERENCES users (id) ");
        assert_eq!(get_references("users", "owner"), "REFERENCES users (owner) ");
        assert_eq!(
            get_references("UserAccounts", "account_id"),
            "REFERENCES user_accounts (id) "
        );
    }

    #[test]
    fn applies_every_cascade_rule() {
        let rules = |s: &str| read_tags(s).remove("cascade").unwrap_or_default();
        assert_eq!(get_cascade(&rules("cascade:delete")), "ON DELETE CASCADE ");
        assert_eq!(get_cascade(&rules("cascade:update")), "ON UPDATE CASCADE ");
        assert_eq!(
            get_cascade(&rules("cascade:delete,update")),
            "ON DELETE CASCADE ON UPDATE CASCADE "
        );
        assert_eq!(get_cascade(&[]), "");
    }

    #[test]
    fn snake_cases_identifiers() {
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("CreatedAt"), "created_at");
        assert_eq!(snake_case("HTTPServer"), "http_server");
        assert_eq!(snake_case("userID2Name"), "user_id2_name");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    proptest! {
        #[test]
        fn snake_case_is_idempotent(s in "[A-Za-z0-9_]{0,24}") {
            let once = snake_case(&s);
            prop_assert_eq!(snake_case(&once), once);
        }
    }
}
