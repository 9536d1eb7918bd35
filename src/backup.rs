use crate::paths::sibling;
use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DATA_ENTRY: &str = "data/students.json";
pub const BUNDLE_FORMAT_V1: &str = "rosterd-bundle-v1";
pub const PLAIN_JSON_FORMAT: &str = "plain-json";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub record_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub record_count: usize,
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// The payload must at least be a JSON array; record-level checks happen
/// when the roster reloads it.
fn count_records(bytes: &[u8]) -> anyhow::Result<usize> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).context("student data is not valid JSON")?;
    value
        .as_array()
        .map(|a| a.len())
        .ok_or_else(|| anyhow!("student data must be a JSON array"))
}

pub fn export_roster_bundle(data_file: &Path, out_path: &Path) -> anyhow::Result<ExportSummary> {
    if !data_file.is_file() {
        return Err(anyhow!(
            "student data file not found: {}",
            data_file.to_string_lossy()
        ));
    }
    let data = std::fs::read(data_file)
        .with_context(|| format!("failed to read {}", data_file.to_string_lossy()))?;
    let record_count = count_records(&data)?;

    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": chrono::Utc::now().to_rfc3339(),
        "recordCount": record_count,
        "dataSha256": sha256_hex(&data),
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(DATA_ENTRY, opts)
        .context("failed to start student data entry")?;
    zip.write_all(&data)
        .context("failed to write student data entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2,
        record_count,
    })
}

/// Replaces `data_file` with the bundle's contents. A non-zip input is taken
/// to be a bare students JSON file.
pub fn import_roster_bundle(in_path: &Path, data_file: &Path) -> anyhow::Result<ImportSummary> {
    if let Some(parent) = data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let (data, format) = if is_zip_file(in_path)? {
        (read_bundle_data(in_path)?, BUNDLE_FORMAT_V1)
    } else {
        let bytes = std::fs::read(in_path)
            .with_context(|| format!("failed to read {}", in_path.to_string_lossy()))?;
        (bytes, PLAIN_JSON_FORMAT)
    };
    let record_count = count_records(&data)?;

    let tmp_dst = sibling(data_file, ".importing");
    if tmp_dst.exists() {
        let _ = std::fs::remove_file(&tmp_dst);
    }

    {
        let mut out = File::create(&tmp_dst).with_context(|| {
            format!("failed to create temp file {}", tmp_dst.to_string_lossy())
        })?;
        out.write_all(&data)
            .context("failed to write imported student data")?;
        out.flush().context("failed to flush imported student data")?;
    }

    std::fs::rename(&tmp_dst, data_file).with_context(|| {
        format!(
            "failed to move imported data to {}",
            data_file.to_string_lossy()
        )
    })?;

    Ok(ImportSummary {
        bundle_format_detected: format.to_string(),
        record_count,
    })
}

fn read_bundle_data(in_path: &Path) -> anyhow::Result<Vec<u8>> {
    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    let mut data = Vec::new();
    archive
        .by_name(DATA_ENTRY)
        .context("bundle missing data/students.json")?
        .read_to_end(&mut data)
        .context("failed to extract student data entry")?;

    if let Some(expected) = manifest.get("dataSha256").and_then(|v| v.as_str()) {
        let actual = sha256_hex(&data);
        if actual != expected {
            return Err(anyhow!(
                "student data checksum mismatch (expected {}, got {})",
                expected,
                actual
            ));
        }
    }
    Ok(data)
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
