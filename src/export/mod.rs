// src/export/mod.rs
use crate::crawler::types::ServiceRecord;
use crate::enrichment::EnrichedRecord;
use crate::extractor::types::ProviderAnalysis;
use chrono::Utc;
use tracing::info;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

const RECORD_HEADER: &str = "service_name,service_url,Topic,Subtopic";

pub fn records_to_csv(records: &[ServiceRecord]) -> String {
    let mut out = String::from(RECORD_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&format!(
            "{},{},{},{}\n",
            csv_field(&record.service_name),
            csv_field(record.service_url.as_deref().unwrap_or("")),
            csv_field(&record.topic),
            csv_field(&record.subtopic),
        ));
    }
    out
}

pub async fn write_records_csv(records: &[ServiceRecord], path: &str) -> Result<()> {
    ensure_parent_dir(path).await?;
    tokio::fs::write(path, records_to_csv(records)).await?;
    info!("📁 Wrote {} records to {}", records.len(), path);
    Ok(())
}

pub fn parse_records_csv(content: &str) -> Result<Vec<ServiceRecord>> {
    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };
    if header.trim() != RECORD_HEADER {
        return Err(format!("unexpected CSV header: {header}").into());
    }

    let mut records = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = parse_csv_line(line);
        if fields.len() < 4 {
            return Err(format!("short CSV row: {line}").into());
        }
        records.push(ServiceRecord {
            service_name: fields[0].clone(),
            service_url: if fields[1].is_empty() {
                None
            } else {
                Some(fields[1].clone())
            },
            topic: fields[2].clone(),
            subtopic: fields[3].clone(),
        });
    }
    Ok(records)
}

pub async fn read_records_csv(path: &str) -> Result<Vec<ServiceRecord>> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_records_csv(&content)
}

pub async fn write_analysis_json(
    analysis: &ProviderAnalysis,
    path: &str,
    pretty: bool,
) -> Result<()> {
    ensure_parent_dir(path).await?;
    let json = if pretty {
        serde_json::to_string_pretty(analysis)?
    } else {
        serde_json::to_string(analysis)?
    };
    tokio::fs::write(path, json).await?;
    info!("📁 Wrote provider analysis to {}", path);
    Ok(())
}

pub async fn write_enriched_json(rows: &[EnrichedRecord], path: &str, pretty: bool) -> Result<()> {
    ensure_parent_dir(path).await?;
    let json = if pretty {
        serde_json::to_string_pretty(rows)?
    } else {
        serde_json::to_string(rows)?
    };
    tokio::fs::write(path, json).await?;
    info!("📁 Wrote {} enriched records to {}", rows.len(), path);
    Ok(())
}

/// Flattened interim backup; the annotation rides along as a JSON blob
/// column so partial progress survives a crash.
pub async fn write_enriched_csv(rows: &[EnrichedRecord], path: &str) -> Result<()> {
    ensure_parent_dir(path).await?;

    let mut out =
        String::from("service_name,service_url,Topic,Subtopic,provider_url,annotation\n");
    for row in rows {
        let annotation = match &row.annotation {
            Some(annotation) => serde_json::to_string(annotation)?,
            None => String::new(),
        };
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_field(&row.record.service_name),
            csv_field(row.record.service_url.as_deref().unwrap_or("")),
            csv_field(&row.record.topic),
            csv_field(&row.record.subtopic),
            csv_field(row.provider_url.as_deref().unwrap_or("")),
            csv_field(&annotation),
        ));
    }

    tokio::fs::write(path, out).await?;
    Ok(())
}

pub fn timestamped_path(directory: &str, stem: &str, extension: &str) -> String {
    format!(
        "{directory}/{stem}_{}.{extension}",
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field)),
                _ => field.push(c),
            }
        }
    }
    fields.push(field);
    fields
}

async fn ensure_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}
