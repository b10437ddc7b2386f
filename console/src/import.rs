//! Bulk server import parsing (CSV and JSON payloads).
//!
//! Both parsers are lenient per-row: bad rows are collected as human-readable
//! errors and the remaining rows still import.

use serde::Deserialize;
use serde_json::Value;

use crate::database::NewServer;

#[derive(Debug, Default, Deserialize)]
struct ImportedServer {
    #[serde(default)]
    name: String,
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    ip_address: String,
    #[serde(default)]
    description: String,
}

impl ImportedServer {
    fn into_new_server(self) -> Option<NewServer> {
        if self.name.is_empty() || self.hostname.is_empty() || self.ip_address.is_empty() {
            return None;
        }
        Some(NewServer {
            name: self.name,
            hostname: self.hostname,
            ip_address: self.ip_address,
            description: if self.description.is_empty() {
                None
            } else {
                Some(self.description)
            },
        })
    }
}

/// Parse CSV content with a header row naming at least `name`, `hostname`
/// and `ip_address` (plus optional `description`). Row numbers in errors are
/// 1-based including the header, matching what an operator sees in a
/// spreadsheet.
// TODO: handle quoted fields with embedded commas
pub fn parse_csv_servers(content: &str) -> (Vec<NewServer>, Vec<String>) {
    let mut servers = Vec::new();
    let mut errors = Vec::new();

    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let header = match lines.next() {
        Some(header) => header,
        None => {
            errors.push("CSV parsing error: empty file".to_string());
            return (servers, errors);
        }
    };

    let columns: Vec<String> = header
        .split(',')
        .map(|col| col.trim().to_lowercase())
        .collect();
    let column_index = |name: &str| columns.iter().position(|col| col == name);

    let (name_idx, hostname_idx, ip_idx) = match (
        column_index("name"),
        column_index("hostname"),
        column_index("ip_address"),
    ) {
        (Some(n), Some(h), Some(i)) => (n, h, i),
        _ => {
            errors.push(
                "CSV parsing error: header must include name, hostname and ip_address columns"
                    .to_string(),
            );
            return (servers, errors);
        }
    };
    let description_idx = column_index("description");

    for (row_num, line) in lines.enumerate() {
        let row_num = row_num + 2; // header is row 1
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let field = |idx: usize| fields.get(idx).copied().unwrap_or("");

        let imported = ImportedServer {
            name: field(name_idx).to_string(),
            hostname: field(hostname_idx).to_string(),
            ip_address: field(ip_idx).to_string(),
            description: description_idx
                .map(|idx| field(idx).to_string())
                .unwrap_or_default(),
        };

        match imported.into_new_server() {
            Some(server) => servers.push(server),
            None => errors.push(format!(
                "Row {}: missing required fields (name, hostname, ip_address)",
                row_num
            )),
        }
    }

    (servers, errors)
}

/// Parse JSON content: either a single server object or an array of them.
pub fn parse_json_servers(content: &str) -> (Vec<NewServer>, Vec<String>) {
    let mut servers = Vec::new();
    let mut errors = Vec::new();

    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            errors.push(format!("Invalid JSON format: {}", e));
            return (servers, errors);
        }
    };

    let items = match value {
        Value::Object(_) => vec![value],
        Value::Array(items) => items,
        _ => {
            errors.push(
                "JSON must contain an array of server objects or a single server object"
                    .to_string(),
            );
            return (servers, errors);
        }
    };

    for (index, item) in items.into_iter().enumerate() {
        let imported: ImportedServer = match serde_json::from_value(item) {
            Ok(imported) => imported,
            Err(e) => {
                errors.push(format!("Server {}: {}", index + 1, e));
                continue;
            }
        };

        match imported.into_new_server() {
            Some(server) => servers.push(server),
            None => errors.push(format!(
                "Server {}: missing required fields (name, hostname, ip_address)",
                index + 1
            )),
        }
    }

    (servers, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_with_valid_rows_parses() {
        let content = "name,hostname,ip_address,description\n\
                       web1,web1.internal,10.0.0.1,primary web\n\
                       db1,db1.internal,10.0.0.2,\n";
        let (servers, errors) = parse_csv_servers(content);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].name, "web1");
        assert_eq!(servers[0].description.as_deref(), Some("primary web"));
        assert_eq!(servers[1].description, None);
    }

    #[test]
    fn csv_rows_with_missing_fields_are_reported() {
        let content = "name,hostname,ip_address\n\
                       web1,web1.internal,10.0.0.1\n\
                       ,missing-name.internal,10.0.0.2\n";
        let (servers, errors) = parse_csv_servers(content);
        assert_eq!(servers.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Row 3:"));
    }

    #[test]
    fn csv_without_required_header_fails() {
        let content = "server,address\nweb1,10.0.0.1\n";
        let (servers, errors) = parse_csv_servers(content);
        assert!(servers.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn json_accepts_single_object_and_array() {
        let single = r#"{"name": "web1", "hostname": "web1.internal", "ip_address": "10.0.0.1"}"#;
        let (servers, errors) = parse_json_servers(single);
        assert!(errors.is_empty());
        assert_eq!(servers.len(), 1);

        let array = r#"[
            {"name": "web1", "hostname": "web1.internal", "ip_address": "10.0.0.1"},
            {"name": "db1", "hostname": "db1.internal", "ip_address": "10.0.0.2", "description": "database"}
        ]"#;
        let (servers, errors) = parse_json_servers(array);
        assert!(errors.is_empty());
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[1].description.as_deref(), Some("database"));
    }

    #[test]
    fn json_missing_fields_are_reported_per_entry() {
        let array = r#"[
            {"name": "web1", "hostname": "web1.internal", "ip_address": "10.0.0.1"},
            {"name": "db1"}
        ]"#;
        let (servers, errors) = parse_json_servers(array);
        assert_eq!(servers.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Server 2:"));
    }

    #[test]
    fn invalid_json_is_a_single_error() {
        let (servers, errors) = parse_json_servers("not json at all");
        assert!(servers.is_empty());
        assert_eq!(errors.len(), 1);
    }
}
