use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let (Some(fields), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                fields.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print `label: value` rows, padded to the widest label
pub fn output_table(output_format: OutputFormat, title: &str, rows: &[(&str, i64)]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let body: serde_json::Map<String, Value> =
                rows.iter().map(|(label, count)| (label.to_string(), json!(count))).collect();
            println!("{}", serde_json::to_string_pretty(&json!({ title: body }))?);
        }
        OutputFormat::Text => {
            let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
            println!("{}", title);
            println!("{}", "-".repeat(width + 12));
            for (label, count) in rows {
                println!("{:<width$}  {:>8}", label, count, width = width);
            }
        }
    }
    Ok(())
}
